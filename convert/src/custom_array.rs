//! `JSON_arr` conversion.

use std::collections::BTreeMap;

use serde_json::Value;
use wire::WireError;
use wire::envelope::{self, ArrayOp, Envelope, OpKind, Update, UpdateTarget};

use crate::array::{ChangeAwareArray, carry_wiring, unlink};
use crate::converter::{Converter, NULL, check_version};
use crate::error::ConvertError;
use crate::policy::PushToServer;
use crate::tracker::ChangeKey;
use crate::types::PropertyDescription;
use crate::value::ClientValue;

// =============================================================================
// DECODE
// =============================================================================

pub(crate) fn update(
    conv: &Converter<'_>,
    slot: &mut ClientValue,
    wire: &Value,
    element: &PropertyDescription,
    ctx: PushToServer,
) -> Result<(), ConvertError> {
    if wire.is_null() {
        *slot = ClientValue::default();
        return Ok(());
    }
    let element_ctx = ctx.combine_with_child(element.push_to_server);

    match envelope::parse_envelope(wire)? {
        Envelope::NoOp => Ok(()),
        Envelope::Full { value, version } => {
            let fresh = decode_full(conv, &value, version, element, element_ctx)?;
            carry_wiring(slot, &fresh);
            *slot = fresh;
            Ok(())
        }
        Envelope::ArrayOps { ops, version } => {
            let array = slot.as_array_mut().ok_or(ConvertError::MissingPrevious("array"))?;
            check_version(array.state.version(), version)?;
            check_bounds(&ops, array.len())?;
            apply_ops(conv, array, &ops, element, element_ctx)
        }
        Envelope::Updates { updates, version } => {
            let array = slot.as_array_mut().ok_or(ConvertError::MissingPrevious("array"))?;
            check_version(array.state.version(), version)?;
            let indices = updates
                .iter()
                .map(|update| match update.target {
                    UpdateTarget::Index(i) if i < array.len() => Ok(i),
                    UpdateTarget::Index(i) => {
                        Err(ConvertError::OpOutOfRange { kind: "update", start: i, end: i, len: array.len() })
                    }
                    UpdateTarget::Key(ref k) => {
                        Err(WireError::MalformedEnvelope(format!("key update {k} sent for an array")).into())
                    }
                })
                .collect::<Result<Vec<_>, ConvertError>>()?;
            for (index, update) in indices.into_iter().zip(&updates) {
                conv.update_from_server(&mut array.items[index], &update.value, &element.ty, element_ctx)?;
            }
            array.relink();
            Ok(())
        }
    }
}

fn decode_full(
    conv: &Converter<'_>,
    value: &Value,
    version: i64,
    element: &PropertyDescription,
    element_ctx: PushToServer,
) -> Result<ClientValue, ConvertError> {
    let items = match value {
        Value::Null => return Ok(ClientValue::default()),
        Value::Array(items) => items,
        other => return Err(WireError::MalformedEnvelope(format!("array value expected, got {other}")).into()),
    };
    let items = items
        .iter()
        .map(|item| conv.from_server(item, &element.ty, None, element_ctx))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ClientValue::Array(ChangeAwareArray::from_server(items, version, element_ctx)))
}

/// Replay the ops against the running length so nothing is applied unless all fit.
fn check_bounds(ops: &[ArrayOp], len: usize) -> Result<(), ConvertError> {
    let mut len = len;
    for op in ops {
        let fits = match op.kind {
            OpKind::Changed | OpKind::Delete => op.end < len,
            OpKind::Insert => op.start <= len,
        };
        if !fits {
            return Err(ConvertError::OpOutOfRange { kind: op_name(op.kind), start: op.start, end: op.end, len });
        }
        match op.kind {
            OpKind::Changed => {}
            OpKind::Insert => len += op.data.len(),
            OpKind::Delete => len -= op.span(),
        }
    }
    Ok(())
}

fn op_name(kind: OpKind) -> &'static str {
    match kind {
        OpKind::Changed => "changed",
        OpKind::Insert => "insert",
        OpKind::Delete => "delete",
    }
}

fn apply_ops(
    conv: &Converter<'_>,
    array: &mut ChangeAwareArray,
    ops: &[ArrayOp],
    element: &PropertyDescription,
    element_ctx: PushToServer,
) -> Result<(), ConvertError> {
    for op in ops {
        match op.kind {
            OpKind::Changed => {
                for index in op.start..=op.end {
                    let wire = op.data.get(index - op.start).unwrap_or(&NULL);
                    conv.update_from_server(&mut array.items[index], wire, &element.ty, element_ctx)?;
                }
            }
            OpKind::Insert => {
                let inserted = op
                    .data
                    .iter()
                    .map(|item| conv.from_server(item, &element.ty, None, element_ctx))
                    .collect::<Result<Vec<_>, _>>()?;
                array.items.splice(op.start..op.start, inserted);
            }
            OpKind::Delete => {
                for removed in array.items.drain(op.start..=op.end) {
                    unlink(&removed);
                }
            }
        }
    }
    array.relink();
    Ok(())
}

// =============================================================================
// ENCODE
// =============================================================================

pub(crate) fn encode(
    conv: &Converter<'_>,
    array: &ChangeAwareArray,
    element: &PropertyDescription,
    ctx: PushToServer,
) -> Result<Value, ConvertError> {
    let state = &array.state;
    if state.is_full_change() {
        return encode_full(conv, array, element, ctx, state.version());
    }
    let changed = state.changed_keys();
    if changed.is_empty() {
        return Ok(envelope::no_op());
    }

    let element_ctx = adopt(array, element, ctx);
    let mut updates = Vec::with_capacity(changed.len());
    for key in changed {
        let ChangeKey::Index(index) = key else { continue };
        let Some(item) = array.get(index) else { continue };
        let value = conv.slot_delta(item, &element.ty, element_ctx)?;
        updates.push(Update { target: UpdateTarget::Index(index), value });
    }
    state.clear_changes();
    if updates.is_empty() {
        return Ok(envelope::no_op());
    }
    Ok(envelope::granular(updates, state.version()))
}

pub(crate) fn encode_full(
    conv: &Converter<'_>,
    array: &ChangeAwareArray,
    element: &PropertyDescription,
    ctx: PushToServer,
    version: i64,
) -> Result<Value, ConvertError> {
    let element_ctx = adopt(array, element, ctx);
    let items = array
        .iter()
        .map(|item| conv.encode_nested_full(item, &element.ty, element_ctx))
        .collect::<Result<Vec<_>, _>>()?;
    array.state.clear_changes();
    Ok(envelope::full(Value::Array(items), version))
}

/// Align the wrapper's element policy with the declared type; client-created
/// arrays only learn it here.
fn adopt(array: &ChangeAwareArray, element: &PropertyDescription, ctx: PushToServer) -> PushToServer {
    let element_ctx = ctx.combine_with_child(element.push_to_server);
    array.state.set_policies(element_ctx, BTreeMap::new());
    element_ctx
}
