//! Untyped (`object`) values.
//!
//! Plain JSON passes through. When the server finds dates nested inside an
//! untyped value it wraps the affected parts in `{_T, _V}` markers:
//! `{_T: "svy_date", _V: text}` for a date and `{_T: "object", _V: ...}`
//! for an array or object holding such a date somewhere below. The client
//! wraps outgoing values the same way.

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

use crate::date::{format_date, parse_date};
use crate::error::ConvertError;
use crate::value::ClientValue;

const TYPE_KEY: &str = "_T";
const VALUE_KEY: &str = "_V";
const DATE_TYPE: &str = "svy_date";
const OBJECT_TYPE: &str = "object";

pub(crate) fn decode(wire: &Value) -> Result<ClientValue, ConvertError> {
    let marker = wire
        .as_object()
        .and_then(|obj| Some((obj.get(TYPE_KEY)?.as_str()?, obj.get(VALUE_KEY)?)));
    let Some((tag, inner)) = marker else {
        return Ok(ClientValue::Plain(wire.clone()));
    };

    match (tag, inner) {
        (DATE_TYPE, _) => Ok(ClientValue::Date(parse_date(inner)?)),
        (OBJECT_TYPE, Value::Array(items)) => {
            let items = items.iter().map(decode).collect::<Result<Vec<_>, _>>()?;
            Ok(ClientValue::List(items))
        }
        (OBJECT_TYPE, Value::Object(entries)) => {
            let entries = entries
                .iter()
                .map(|(k, v)| decode(v).map(|d| (k.clone(), d)))
                .collect::<Result<BTreeMap<_, _>, ConvertError>>()?;
            Ok(ClientValue::Map(entries))
        }
        (OBJECT_TYPE, other) => decode(other),
        _ => Ok(ClientValue::Plain(wire.clone())),
    }
}

pub(crate) fn encode(value: &ClientValue) -> Result<Value, ConvertError> {
    match value {
        ClientValue::Plain(v) => Ok(v.clone()),
        ClientValue::Date(date) => Ok(json!({ TYPE_KEY: DATE_TYPE, VALUE_KEY: format_date(*date)? })),
        ClientValue::Function(_) => Ok(Value::Null),
        ClientValue::List(items) => {
            let inner = Value::Array(items.iter().map(encode).collect::<Result<Vec<_>, _>>()?);
            Ok(mark_if_typed(value, inner))
        }
        ClientValue::Map(entries) => {
            let inner = entries
                .iter()
                .map(|(k, v)| encode(v).map(|e| (k.clone(), e)))
                .collect::<Result<Map<_, _>, ConvertError>>()?;
            Ok(mark_if_typed(value, Value::Object(inner)))
        }
        ClientValue::Array(_) | ClientValue::Object(_) => Ok(value.to_json()),
    }
}

fn mark_if_typed(value: &ClientValue, inner: Value) -> Value {
    if holds_date(value) {
        json!({ TYPE_KEY: OBJECT_TYPE, VALUE_KEY: inner })
    } else {
        inner
    }
}

fn holds_date(value: &ClientValue) -> bool {
    match value {
        ClientValue::Date(_) => true,
        ClientValue::List(items) => items.iter().any(holds_date),
        ClientValue::Map(entries) => entries.values().any(holds_date),
        _ => false,
    }
}
