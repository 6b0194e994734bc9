//! Live client-side property values.

#[cfg(test)]
#[path = "value_test.rs"]
mod value_test;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::array::ChangeAwareArray;
use crate::date;
use crate::object::ChangeAwareObject;

/// Reference to a server-side function, as sent for `function` properties.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FunctionRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub functionhash: Option<String>,
}

/// A converted property value.
///
/// `List` and `Map` only come out of untyped (`object`) values that carried
/// nested typed envelopes; `Array` and `Object` are the change-aware wrappers
/// used for `JSON_arr` and `JSON_obj` types.
#[derive(Debug)]
pub enum ClientValue {
    Plain(Value),
    Date(OffsetDateTime),
    Function(FunctionRef),
    List(Vec<ClientValue>),
    Map(BTreeMap<String, ClientValue>),
    Array(ChangeAwareArray),
    Object(ChangeAwareObject),
}

impl Default for ClientValue {
    fn default() -> Self {
        Self::Plain(Value::Null)
    }
}

impl From<Value> for ClientValue {
    fn from(value: Value) -> Self {
        Self::Plain(value)
    }
}

impl From<&str> for ClientValue {
    fn from(value: &str) -> Self {
        Self::Plain(Value::String(value.to_owned()))
    }
}

impl From<ChangeAwareArray> for ClientValue {
    fn from(value: ChangeAwareArray) -> Self {
        Self::Array(value)
    }
}

impl From<ChangeAwareObject> for ClientValue {
    fn from(value: ChangeAwareObject) -> Self {
        Self::Object(value)
    }
}

impl ClientValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Plain(Value::Null))
    }

    #[must_use]
    pub fn as_plain(&self) -> Option<&Value> {
        match self {
            Self::Plain(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.as_plain().and_then(Value::as_str)
    }

    #[must_use]
    pub fn as_date(&self) -> Option<OffsetDateTime> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&ChangeAwareArray> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut ChangeAwareArray> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&ChangeAwareObject> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut ChangeAwareObject> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Whether this value is a change-aware wrapper.
    #[must_use]
    pub fn is_change_aware(&self) -> bool {
        matches!(self, Self::Array(_) | Self::Object(_))
    }

    /// Plain JSON snapshot of the current value, without envelopes.
    ///
    /// Dates render as RFC 3339 text. Used for rendering, logging and tests,
    /// never for sending to the server.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Plain(v) => v.clone(),
            Self::Date(d) => date::format_date(*d).map_or(Value::Null, Value::String),
            Self::Function(f) => serde_json::to_value(f).unwrap_or(Value::Null),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(entries) => {
                Value::Object(entries.iter().map(|(k, v)| (k.clone(), v.to_json())).collect::<Map<_, _>>())
            }
            Self::Array(a) => Value::Array(a.iter().map(Self::to_json).collect()),
            Self::Object(o) => {
                Value::Object(o.iter().map(|(k, v)| (k.clone(), v.to_json())).collect::<Map<_, _>>())
            }
        }
    }
}
