//! Versioned value envelopes.
//!
//! DESIGN
//! ======
//! Every structured property value travels wrapped in one of four shapes,
//! told apart by which key is present:
//!
//! - `{v, vEr}`: full value with its content version.
//! - `{g: [{op: [start, end, opcode], d}], vEr}`: granular array ops from
//!   the server, applied strictly in order.
//! - `{u: [{i | k, v}], vEr}`: granular updates by index (arrays sent to the
//!   server) or by key (objects, both directions).
//! - `{n: true}`: nothing changed.
//!
//! Ranges in array ops are inclusive on both ends. Parsing is done by hand
//! from `serde_json::Value` because the variant is decided by key presence,
//! not by a tag.

#[cfg(test)]
#[path = "envelope_test.rs"]
mod envelope_test;

use serde_json::{Map, Value, json};

use crate::WireError;

// =============================================================================
// KEYS
// =============================================================================

pub const VALUE: &str = "v";
pub const CONTENT_VERSION: &str = "vEr";
pub const GRANULAR_UPDATES: &str = "g";
pub const OP_ARRAY_START_END_TYPE: &str = "op";
pub const GRANULAR_UPDATE_DATA: &str = "d";
pub const UPDATES: &str = "u";
pub const INDEX: &str = "i";
pub const KEY: &str = "k";
pub const NO_OP: &str = "n";

// =============================================================================
// TYPES
// =============================================================================

/// Kind of a granular array operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    /// Replace the elements in range with the payload.
    Changed,
    /// Splice the payload in at `start`.
    Insert,
    /// Remove the range; carries no payload.
    Delete,
}

impl OpKind {
    /// Opcode integer used on the wire.
    #[must_use]
    pub fn as_i64(self) -> i64 {
        match self {
            Self::Changed => 0,
            Self::Insert => 1,
            Self::Delete => 2,
        }
    }

    /// Parse an opcode integer.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::UnknownOpcode`] for anything but 0, 1 or 2.
    pub fn from_i64(value: i64) -> Result<Self, WireError> {
        match value {
            0 => Ok(Self::Changed),
            1 => Ok(Self::Insert),
            2 => Ok(Self::Delete),
            other => Err(WireError::UnknownOpcode(other)),
        }
    }
}

/// One granular array operation over the inclusive range `start..=end`.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayOp {
    pub start: usize,
    pub end: usize,
    pub kind: OpKind,
    /// Wire payload elements; empty for deletes.
    pub data: Vec<Value>,
}

impl ArrayOp {
    /// Number of elements the range covers.
    #[must_use]
    pub fn span(&self) -> usize {
        self.end.saturating_sub(self.start) + 1
    }
}

/// Where a granular update lands.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum UpdateTarget {
    Index(usize),
    Key(String),
}

/// One `{i|k, v}` granular update.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub target: UpdateTarget,
    pub value: Value,
}

/// A parsed value envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Full { value: Value, version: i64 },
    ArrayOps { ops: Vec<ArrayOp>, version: i64 },
    Updates { updates: Vec<Update>, version: i64 },
    NoOp,
}

// =============================================================================
// PARSE
// =============================================================================

/// Returns true when `value` is an object carrying one of the envelope keys.
#[must_use]
pub fn is_envelope(value: &Value) -> bool {
    value.as_object().is_some_and(|obj| {
        obj.contains_key(VALUE)
            || obj.contains_key(GRANULAR_UPDATES)
            || obj.contains_key(UPDATES)
            || obj.contains_key(NO_OP)
    })
}

/// Parse a wire value into an [`Envelope`].
///
/// # Errors
///
/// Returns [`WireError::MalformedEnvelope`] when no envelope key is present
/// or an op/update entry has the wrong shape, and
/// [`WireError::UnknownOpcode`] for opcodes outside 0..=2.
pub fn parse_envelope(value: &Value) -> Result<Envelope, WireError> {
    let Some(obj) = value.as_object() else {
        return Err(WireError::MalformedEnvelope(format!("expected object, got {value}")));
    };

    if obj.get(NO_OP).and_then(Value::as_bool) == Some(true) {
        return Ok(Envelope::NoOp);
    }

    let version = match obj.get(CONTENT_VERSION) {
        None | Some(Value::Null) => 0,
        Some(raw) => raw
            .as_i64()
            .ok_or_else(|| WireError::MalformedEnvelope(format!("vEr is not an integer: {raw}")))?,
    };

    if let Some(full) = obj.get(VALUE) {
        return Ok(Envelope::Full { value: full.clone(), version });
    }
    if let Some(raw_ops) = obj.get(GRANULAR_UPDATES) {
        let ops = parse_ops(raw_ops)?;
        return Ok(Envelope::ArrayOps { ops, version });
    }
    if let Some(raw_updates) = obj.get(UPDATES) {
        let updates = parse_updates(raw_updates)?;
        return Ok(Envelope::Updates { updates, version });
    }

    Err(WireError::MalformedEnvelope("none of v, g, u or n present".into()))
}

fn parse_ops(raw: &Value) -> Result<Vec<ArrayOp>, WireError> {
    let Some(items) = raw.as_array() else {
        return Err(WireError::MalformedEnvelope("g must be an array".into()));
    };
    items.iter().map(parse_op).collect()
}

fn parse_op(raw: &Value) -> Result<ArrayOp, WireError> {
    let triple = raw
        .get(OP_ARRAY_START_END_TYPE)
        .and_then(Value::as_array)
        .filter(|t| t.len() == 3)
        .ok_or_else(|| WireError::MalformedEnvelope(format!("op must be [start, end, type]: {raw}")))?;

    let start = as_index(&triple[0])?;
    let end = as_index(&triple[1])?;
    if end < start {
        return Err(WireError::MalformedEnvelope(format!("op range end {end} before start {start}")));
    }
    let opcode = triple[2]
        .as_i64()
        .ok_or_else(|| WireError::MalformedEnvelope(format!("opcode is not an integer: {}", triple[2])))?;
    let kind = OpKind::from_i64(opcode)?;

    let data = match raw.get(GRANULAR_UPDATE_DATA) {
        Some(Value::Array(items)) => items.clone(),
        None | Some(Value::Null) => Vec::new(),
        Some(other) => {
            return Err(WireError::MalformedEnvelope(format!("d must be an array: {other}")));
        }
    };

    Ok(ArrayOp { start, end, kind, data })
}

fn parse_updates(raw: &Value) -> Result<Vec<Update>, WireError> {
    let Some(items) = raw.as_array() else {
        return Err(WireError::MalformedEnvelope("u must be an array".into()));
    };
    items
        .iter()
        .map(|item| {
            let value = item.get(VALUE).cloned().unwrap_or(Value::Null);
            if let Some(key) = item.get(KEY).and_then(Value::as_str) {
                return Ok(Update { target: UpdateTarget::Key(key.to_owned()), value });
            }
            if let Some(index) = item.get(INDEX) {
                return Ok(Update { target: UpdateTarget::Index(as_index(index)?), value });
            }
            Err(WireError::MalformedEnvelope(format!("update without i or k: {item}")))
        })
        .collect()
}

fn as_index(value: &Value) -> Result<usize, WireError> {
    let invalid = || WireError::MalformedEnvelope(format!("not a valid index: {value}"));
    let raw = value.as_u64().ok_or_else(invalid)?;
    usize::try_from(raw).map_err(|_| invalid())
}

// =============================================================================
// BUILD
// =============================================================================

impl Envelope {
    /// Serialize back to the wire shape.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Full { value, version } => full(value.clone(), *version),
            Self::ArrayOps { ops, version } => {
                let ops: Vec<Value> = ops
                    .iter()
                    .map(|op| {
                        let mut entry = Map::new();
                        entry.insert(OP_ARRAY_START_END_TYPE.into(), json!([op.start, op.end, op.kind.as_i64()]));
                        if op.kind != OpKind::Delete {
                            entry.insert(GRANULAR_UPDATE_DATA.into(), Value::Array(op.data.clone()));
                        }
                        Value::Object(entry)
                    })
                    .collect();
                json!({ GRANULAR_UPDATES: ops, CONTENT_VERSION: version })
            }
            Self::Updates { updates, version } => granular(updates.clone(), *version),
            Self::NoOp => no_op(),
        }
    }

    /// Content version carried by the envelope; `None` for no-ops.
    #[must_use]
    pub fn version(&self) -> Option<i64> {
        match self {
            Self::Full { version, .. } | Self::ArrayOps { version, .. } | Self::Updates { version, .. } => {
                Some(*version)
            }
            Self::NoOp => None,
        }
    }
}

/// Build a `{v, vEr}` full value.
#[must_use]
pub fn full(value: Value, version: i64) -> Value {
    json!({ VALUE: value, CONTENT_VERSION: version })
}

/// Build a `{u: [...], vEr}` granular update set.
#[must_use]
pub fn granular(updates: Vec<Update>, version: i64) -> Value {
    let entries: Vec<Value> = updates
        .into_iter()
        .map(|update| match update.target {
            UpdateTarget::Index(i) => json!({ INDEX: i, VALUE: update.value }),
            UpdateTarget::Key(k) => json!({ KEY: k, VALUE: update.value }),
        })
        .collect();
    json!({ UPDATES: entries, CONTENT_VERSION: version })
}

/// Build the `{n: true}` no-op marker.
#[must_use]
pub fn no_op() -> Value {
    json!({ NO_OP: true })
}

/// Returns true for the `{n: true}` marker.
#[must_use]
pub fn is_no_op(value: &Value) -> bool {
    value.get(NO_OP).and_then(Value::as_bool) == Some(true)
}
