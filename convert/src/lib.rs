//! Property value conversion between the wire envelopes and live client values.
//!
//! Values arrive from the server as versioned envelopes (see the `wire`
//! crate) and are turned into [`ClientValue`]s. Arrays and custom objects
//! become change-aware wrappers that record which indices/keys the client
//! mutated, so the reverse conversion can send back only what changed,
//! gated by each slot's [`PushToServer`] policy.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`converter`] | [`Converter`] entry points: `from_server`, `to_server` |
//! | [`registry`] | [`TypesRegistry`] built from component client-side specs |
//! | [`types`] | [`PropertyType`] and [`PropertyDescription`] |
//! | [`policy`] | [`PushToServer`] levels and inheritance |
//! | [`tracker`] | Shared change bookkeeping behind every wrapper |
//! | [`array`] | [`ChangeAwareArray`] |
//! | [`object`] | [`ChangeAwareObject`] |
//! | [`value`] | [`ClientValue`] and [`FunctionRef`] |
//! | [`date`] | Date parsing/formatting |
//! | [`error`] | [`ConvertError`] |

pub mod array;
pub mod converter;
pub mod date;
pub mod error;
pub mod object;
pub mod policy;
pub mod registry;
pub mod tracker;
pub mod types;
pub mod value;

mod custom_array;
mod custom_object;
mod untyped;

pub use array::ChangeAwareArray;
pub use converter::Converter;
pub use error::ConvertError;
pub use object::ChangeAwareObject;
pub use policy::PushToServer;
pub use registry::{ComponentSpecification, CustomObjectDefinition, TypesRegistry};
pub use tracker::{ChangeKey, ChangeListener, ChangeTracker};
pub use types::{PropertyDescription, PropertyType};
pub use value::{ClientValue, FunctionRef};

/// Model key under which the server sends per-instance client-side types.
pub const TYPES_KEY: &str = "svy_types";
