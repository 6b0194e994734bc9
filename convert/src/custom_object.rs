//! `JSON_obj` conversion.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use wire::WireError;
use wire::envelope::{self, Envelope, Update, UpdateTarget};

use crate::array::carry_wiring;
use crate::converter::{Converter, check_version};
use crate::error::ConvertError;
use crate::object::ChangeAwareObject;
use crate::policy::PushToServer;
use crate::registry::CustomObjectDefinition;
use crate::tracker::ChangeKey;
use crate::types::PropertyType;
use crate::value::ClientValue;

static UNTYPED: PropertyType = PropertyType::Untyped;

fn definition<'r>(conv: &Converter<'r>, type_name: &str) -> Result<&'r CustomObjectDefinition, ConvertError> {
    conv.registry()
        .custom_object(type_name)
        .ok_or_else(|| ConvertError::UnknownType(type_name.to_owned()))
}

/// Type and effective policy of one sub-property; undeclared keys are
/// untyped and inherit the object's policy.
fn property_context<'d>(
    definition: &'d CustomObjectDefinition,
    key: &str,
    ctx: PushToServer,
) -> (&'d PropertyType, PushToServer) {
    match definition.property(key) {
        Some(desc) => (&desc.ty, ctx.combine_with_child(desc.push_to_server)),
        None => (&UNTYPED, ctx),
    }
}

fn policies(definition: &CustomObjectDefinition, ctx: PushToServer) -> BTreeMap<String, PushToServer> {
    definition
        .properties
        .iter()
        .map(|(key, desc)| (key.clone(), ctx.combine_with_child(desc.push_to_server)))
        .collect()
}

// =============================================================================
// DECODE
// =============================================================================

pub(crate) fn update(
    conv: &Converter<'_>,
    slot: &mut ClientValue,
    wire: &Value,
    type_name: &str,
    ctx: PushToServer,
) -> Result<(), ConvertError> {
    if wire.is_null() {
        *slot = ClientValue::default();
        return Ok(());
    }
    let definition = definition(conv, type_name)?;

    match envelope::parse_envelope(wire)? {
        Envelope::NoOp => Ok(()),
        Envelope::Full { value, version } => {
            let fresh = decode_full(conv, &value, version, definition, ctx)?;
            carry_wiring(slot, &fresh);
            *slot = fresh;
            Ok(())
        }
        Envelope::Updates { updates, version } => {
            let object = slot.as_object_mut().ok_or(ConvertError::MissingPrevious("object"))?;
            check_version(object.state.version(), version)?;
            let keys = updates
                .iter()
                .map(|update| match &update.target {
                    UpdateTarget::Key(k) => Ok(k.as_str()),
                    UpdateTarget::Index(i) => {
                        Err(WireError::MalformedEnvelope(format!("index update {i} sent for object {type_name}")))
                    }
                })
                .collect::<Result<Vec<_>, WireError>>()?;
            for (key, update) in keys.into_iter().zip(&updates) {
                let (ty, child_ctx) = property_context(definition, key, ctx);
                match object.entries.get_mut(key) {
                    Some(existing) => conv.update_from_server(existing, &update.value, ty, child_ctx)?,
                    None => {
                        let value = conv.from_server(&update.value, ty, None, child_ctx)?;
                        object.entries.insert(key.to_owned(), value);
                    }
                }
            }
            object.relink();
            Ok(())
        }
        Envelope::ArrayOps { .. } => {
            Err(WireError::MalformedEnvelope(format!("array ops sent for object {type_name}")).into())
        }
    }
}

fn decode_full(
    conv: &Converter<'_>,
    value: &Value,
    version: i64,
    definition: &CustomObjectDefinition,
    ctx: PushToServer,
) -> Result<ClientValue, ConvertError> {
    let raw = match value {
        Value::Null => return Ok(ClientValue::default()),
        Value::Object(raw) => raw,
        other => return Err(WireError::MalformedEnvelope(format!("object value expected, got {other}")).into()),
    };
    let mut entries = BTreeMap::new();
    for (key, item) in raw {
        let (ty, child_ctx) = property_context(definition, key, ctx);
        entries.insert(key.clone(), conv.from_server(item, ty, None, child_ctx)?);
    }
    let object = ChangeAwareObject::from_server(entries, version, ctx, policies(definition, ctx));
    Ok(ClientValue::Object(object))
}

// =============================================================================
// ENCODE
// =============================================================================

pub(crate) fn encode(
    conv: &Converter<'_>,
    object: &ChangeAwareObject,
    type_name: &str,
    ctx: PushToServer,
) -> Result<Value, ConvertError> {
    let state = &object.state;
    if state.is_full_change() {
        return encode_full(conv, object, type_name, ctx, state.version());
    }
    let changed = state.changed_keys();
    if changed.is_empty() {
        return Ok(envelope::no_op());
    }

    let definition = definition(conv, type_name)?;
    state.set_policies(ctx, policies(definition, ctx));
    let mut updates = Vec::with_capacity(changed.len());
    for key in changed {
        let ChangeKey::Key(key) = key else { continue };
        let (ty, child_ctx) = property_context(definition, &key, ctx);
        let value = match object.get(&key) {
            Some(item) => conv.slot_delta(item, ty, child_ctx)?,
            None => Value::Null,
        };
        updates.push(Update { target: UpdateTarget::Key(key), value });
    }
    state.clear_changes();
    Ok(envelope::granular(updates, state.version()))
}

/// Full value of the object; sub-properties the server rejects are left out.
pub(crate) fn encode_full(
    conv: &Converter<'_>,
    object: &ChangeAwareObject,
    type_name: &str,
    ctx: PushToServer,
    version: i64,
) -> Result<Value, ConvertError> {
    let definition = definition(conv, type_name)?;
    object.state.set_policies(ctx, policies(definition, ctx));
    let mut entries = Map::new();
    for (key, item) in object {
        let (ty, child_ctx) = property_context(definition, key, ctx);
        if !child_ctx.records_changes() {
            continue;
        }
        entries.insert(key.clone(), conv.encode_nested_full(item, ty, child_ctx)?);
    }
    object.state.clear_changes();
    Ok(envelope::full(Value::Object(entries), version))
}
