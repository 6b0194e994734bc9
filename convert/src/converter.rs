//! Conversion entry points.
//!
//! DESIGN
//! ======
//! A [`Converter`] borrows the session's [`TypesRegistry`] and dispatches on
//! the declared [`PropertyType`]:
//!
//! - server to client: [`Converter::from_server`] builds a fresh value or
//!   applies a granular envelope to the previous one, and
//!   [`Converter::update_from_server`] does the same in place so nested
//!   wrappers (and their listeners) survive;
//! - client to server: [`Converter::to_server`] produces the delta since the
//!   last encode, `{n: true}` when nothing changed and always `{n: true}`
//!   when the slot's effective policy is `Reject`.
//!
//! The push policy passed in is the effective policy of the slot being
//! converted (the parent context); wrappers derive their children's
//! policies from it.

#[cfg(test)]
#[path = "converter_test.rs"]
mod converter_test;

use serde_json::Value;
use wire::WireError;
use wire::envelope::no_op;

use crate::date::{format_date, parse_date};
use crate::error::ConvertError;
use crate::policy::PushToServer;
use crate::registry::TypesRegistry;
use crate::types::PropertyType;
use crate::value::ClientValue;
use crate::{custom_array, custom_object, untyped};

pub(crate) static NULL: Value = Value::Null;

#[derive(Debug, Clone, Copy)]
pub struct Converter<'r> {
    registry: &'r TypesRegistry,
}

impl<'r> Converter<'r> {
    #[must_use]
    pub fn new(registry: &'r TypesRegistry) -> Self {
        Self { registry }
    }

    #[must_use]
    pub fn registry(&self) -> &'r TypesRegistry {
        self.registry
    }

    // =========================================================================
    // SERVER TO CLIENT
    // =========================================================================

    /// Convert a wire value, reusing `previous` for granular envelopes.
    ///
    /// # Errors
    ///
    /// [`ConvertError::StaleVersion`] when a granular update targets another
    /// version, [`ConvertError::MissingPrevious`] when it has nothing to apply
    /// to, [`ConvertError::UnknownType`] for unregistered types, and the
    /// envelope and date parse errors.
    pub fn from_server(
        &self,
        wire: &Value,
        ty: &PropertyType,
        previous: Option<ClientValue>,
        ctx: PushToServer,
    ) -> Result<ClientValue, ConvertError> {
        match previous {
            Some(mut slot) => {
                self.update_from_server(&mut slot, wire, ty, ctx)?;
                Ok(slot)
            }
            None => self.decode(wire, ty, ctx),
        }
    }

    /// Apply a wire value to `slot` in place.
    ///
    /// Granular envelopes are validated (version, op bounds) before the
    /// wrapper is touched, so a rejected update leaves `slot` as it was.
    ///
    /// # Errors
    ///
    /// Same as [`Converter::from_server`].
    pub fn update_from_server(
        &self,
        slot: &mut ClientValue,
        wire: &Value,
        ty: &PropertyType,
        ctx: PushToServer,
    ) -> Result<(), ConvertError> {
        match ty {
            PropertyType::CustomArray(element) => custom_array::update(self, slot, wire, element, ctx),
            PropertyType::CustomObject(name) => custom_object::update(self, slot, wire, name, ctx),
            _ => {
                *slot = self.decode(wire, ty, ctx)?;
                Ok(())
            }
        }
    }

    fn decode(&self, wire: &Value, ty: &PropertyType, ctx: PushToServer) -> Result<ClientValue, ConvertError> {
        match ty {
            PropertyType::Primitive => Ok(ClientValue::Plain(wire.clone())),
            PropertyType::Date if wire.is_null() => Ok(ClientValue::default()),
            PropertyType::Date => Ok(ClientValue::Date(parse_date(wire)?)),
            PropertyType::Untyped => untyped::decode(wire),
            PropertyType::Function if wire.is_null() => Ok(ClientValue::default()),
            PropertyType::Function => {
                let function = serde_json::from_value(wire.clone()).map_err(WireError::from)?;
                Ok(ClientValue::Function(function))
            }
            PropertyType::CustomArray(element) => {
                let mut slot = ClientValue::default();
                custom_array::update(self, &mut slot, wire, element, ctx)?;
                Ok(slot)
            }
            PropertyType::CustomObject(name) => {
                let mut slot = ClientValue::default();
                custom_object::update(self, &mut slot, wire, name, ctx)?;
                Ok(slot)
            }
            PropertyType::Unknown(name) => Err(ConvertError::UnknownType(name.clone())),
        }
    }

    // =========================================================================
    // CLIENT TO SERVER
    // =========================================================================

    /// Encode what changed in `value` since the last encode.
    ///
    /// # Errors
    ///
    /// [`ConvertError::UnknownType`] for unregistered types and
    /// [`ConvertError::InvalidDate`] for dates outside the RFC 3339 range.
    pub fn to_server(&self, value: &ClientValue, ty: &PropertyType, ctx: PushToServer) -> Result<Value, ConvertError> {
        if !ctx.records_changes() {
            return Ok(no_op());
        }
        self.encode(value, ty, ctx)
    }

    /// Encode one changed slot of a parent wrapper.
    ///
    /// A wrapper with its own recorded changes sends its own delta; a
    /// wrapper assigned by reference without changes of its own is sent in
    /// full; anything else is sent as its raw value.
    ///
    /// # Errors
    ///
    /// Same as [`Converter::to_server`].
    pub fn slot_delta(&self, value: &ClientValue, ty: &PropertyType, ctx: PushToServer) -> Result<Value, ConvertError> {
        match (value, ty) {
            (ClientValue::Array(array), PropertyType::CustomArray(element)) if !array.state.has_changes() => {
                custom_array::encode_full(self, array, element, ctx, array.state.version())
            }
            (ClientValue::Object(object), PropertyType::CustomObject(name)) if !object.state.has_changes() => {
                custom_object::encode_full(self, object, name, ctx, object.state.version())
            }
            _ => self.encode(value, ty, ctx),
        }
    }

    /// Encode an element of a container that is being resent in full.
    ///
    /// Nested wrappers go out as full values with version 0: the server
    /// treats every element of a full resend as new.
    pub(crate) fn encode_nested_full(
        &self,
        value: &ClientValue,
        ty: &PropertyType,
        ctx: PushToServer,
    ) -> Result<Value, ConvertError> {
        match (value, ty) {
            (ClientValue::Array(array), PropertyType::CustomArray(element)) => {
                custom_array::encode_full(self, array, element, ctx, 0)
            }
            (ClientValue::Object(object), PropertyType::CustomObject(name)) => {
                custom_object::encode_full(self, object, name, ctx, 0)
            }
            _ => encode_plain(value, ty),
        }
    }

    fn encode(&self, value: &ClientValue, ty: &PropertyType, ctx: PushToServer) -> Result<Value, ConvertError> {
        match (value, ty) {
            (ClientValue::Array(array), PropertyType::CustomArray(element)) => {
                custom_array::encode(self, array, element, ctx)
            }
            (ClientValue::Object(object), PropertyType::CustomObject(name)) => {
                custom_object::encode(self, object, name, ctx)
            }
            _ => encode_plain(value, ty),
        }
    }
}

fn encode_plain(value: &ClientValue, ty: &PropertyType) -> Result<Value, ConvertError> {
    if let PropertyType::Unknown(name) = ty {
        return Err(ConvertError::UnknownType(name.clone()));
    }
    match value {
        ClientValue::Plain(v) => Ok(v.clone()),
        ClientValue::Date(_) | ClientValue::List(_) | ClientValue::Map(_) if *ty == PropertyType::Untyped => {
            untyped::encode(value)
        }
        ClientValue::Date(date) => Ok(Value::String(format_date(*date)?)),
        ClientValue::Function(_) => Ok(Value::Null),
        ClientValue::List(_) | ClientValue::Map(_) => untyped::encode(value),
        ClientValue::Array(_) | ClientValue::Object(_) => Ok(value.to_json()),
    }
}

/// Granular updates only apply to the exact version the client holds.
pub(crate) fn check_version(expected: i64, actual: i64) -> Result<(), ConvertError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ConvertError::StaleVersion { expected, actual })
    }
}
