//! Declared property types.

use crate::policy::PushToServer;

/// Client-side type of a property, as declared by a component specification
/// or sent dynamically by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyType {
    /// String/number/bool/JSON passthrough.
    Primitive,
    /// Date sent as ISO text or epoch milliseconds.
    Date,
    /// Untyped `object` (or no type at all): JSON that may embed
    /// `{_T, _V}` typed envelopes.
    Untyped,
    /// Server-side function reference; never sent back.
    Function,
    /// `JSON_arr` with the element description.
    CustomArray(Box<PropertyDescription>),
    /// `JSON_obj` by qualified name (`specName.TypeName`).
    CustomObject(String),
    /// A type name no converter knows.
    Unknown(String),
}

impl PropertyType {
    /// Whether values of this type are wrapped in change-aware containers.
    #[must_use]
    pub fn is_change_aware(&self) -> bool {
        matches!(self, Self::CustomArray(_) | Self::CustomObject(_))
    }
}

/// A type plus the push policy declared next to it (`{t, s}` on the wire).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescription {
    pub ty: PropertyType,
    pub push_to_server: Option<PushToServer>,
}

impl PropertyDescription {
    #[must_use]
    pub fn new(ty: PropertyType, push_to_server: Option<PushToServer>) -> Self {
        Self { ty, push_to_server }
    }

    /// No declared type and no declared policy.
    #[must_use]
    pub fn untyped() -> Self {
        Self::new(PropertyType::Untyped, None)
    }
}
