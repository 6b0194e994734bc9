//! In-memory form structure and the designer edit-batch reconciler.
//!
//! A [`FormCache`] mirrors one server-side form: its parts, the layout
//! containers of a responsive form, components and form components. Nodes
//! live in an arena and refer to each other by [`NodeId`], so parent and
//! child links never form reference cycles. Flat lookup maps (components by
//! name, containers by `svy-id`) sit next to the tree and are kept in step
//! with it by every mutating operation.
//!
//! The [`reconciler`] applies designer edit batches to a cache and reports
//! which visual refreshes the batch needs.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`cache`] | [`FormCache`] arena, lookups, cascade removal, snapshots |
//! | [`node`] | Node kinds: containers, parts, form components |
//! | [`component`] | [`ComponentCache`] and its change-aware model |
//! | [`sort`] | Priority parsing and the two [`SortMode`]s |
//! | [`reconciler`] | [`Reconciler`] and the [`DesignFormCallbacks`] seam |
//! | [`error`] | [`CacheError`] |

pub mod cache;
pub mod component;
pub mod error;
pub mod node;
pub mod reconciler;
pub mod sort;

pub use cache::{FormCache, FormDefinition, PartDefinition};
pub use component::ComponentCache;
pub use error::CacheError;
pub use node::{Dimension, FormComponentCache, FormComponentProperties, Node, NodeId, PartCache, StructureCache};
pub use reconciler::{DesignFormCallbacks, ReconcileReport, Reconciler, ReconcilerOptions};
pub use sort::SortMode;
