//! Interaction layer of the form designer canvas.
//!
//! The canvas is a rendered form inside an iframe. The editor host measures
//! the rendered elements and forwards pointer input and designer events; this
//! crate answers with selection changes, snap positions and guide lines, and
//! the layout of the ghost decorators. It holds no DOM: element geometry
//! arrives as a [`scene::Scene`] of measured boxes.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`session`] | [`session::DesignerSession`]: event handling and the outgoing queue |
//! | [`scene`] | Measured element boxes in document order |
//! | [`geometry`] | Points, sizes and rectangles |
//! | [`hit`] | Hit-testing and resize anchors |
//! | [`selection`] | Click, toggle and marquee selection |
//! | [`guides`] | Snap-to-edge and equal-distance guides |
//! | [`ghosts`] | Ghost container and ghost layout |
//! | [`consts`] | Guide and ghost measurements and colors |

pub mod consts;
pub mod geometry;
pub mod ghosts;
pub mod guides;
pub mod hit;
pub mod scene;
pub mod selection;
pub mod session;

pub use session::{DesignerSession, Outgoing};
