//! Component cache entries and their models.
//!
//! DESIGN
//! ======
//! A component's model is a [`ChangeAwareObject`] whose per-key push policy
//! comes from the component specification; undeclared keys are `Reject`.
//! Values the server sends are written with `set_from_server` and are never
//! recorded, so only client-side assignments show up in
//! [`ComponentCache::take_outgoing_changes`].
//!
//! Two ways in:
//!
//! - [`ComponentCache::update_properties`] for designer models. Values are
//!   plain JSON; only properties listed in the model's `svy_types` go
//!   through the converters. Properties missing from the new model become
//!   null.
//! - [`ComponentCache::apply_server_properties`] for runtime updates. Every
//!   typed property is a wire envelope, applied in place so nested wrappers
//!   and their listeners survive granular updates.
//!
//! A conversion that fails is logged; a stale update keeps the previous
//! value, any other failure stores null for that property.

#[cfg(test)]
#[path = "component_test.rs"]
mod component_test;

use std::collections::BTreeMap;
use std::mem;

use convert::{
    ChangeAwareObject, ChangeKey, ClientValue, ComponentSpecification, Converter, PropertyType, PushToServer,
    TYPES_KEY, TypesRegistry,
};
use serde_json::{Map, Value};
use tracing::{debug, error, warn};
use wire::{ErrorCode, Layout};

/// Properties whose change moves or resizes the component on screen.
const GEOMETRY_PROPERTIES: [&str; 4] = ["size", "location", "anchors", "cssPosition"];

#[derive(Debug)]
pub struct ComponentCache {
    name: String,
    spec_name: String,
    type_name: String,
    handlers: Vec<String>,
    pub layout: Layout,
    model: ChangeAwareObject,
    dynamic_types: BTreeMap<String, PropertyType>,
}

impl ComponentCache {
    /// New component with an empty model typed by `spec_name`'s specification.
    #[must_use]
    pub fn new(name: &str, spec_name: &str, handlers: Vec<String>, layout: Layout, registry: &TypesRegistry) -> Self {
        let policies = registry
            .component_specification(spec_name)
            .map(|spec| {
                spec.properties()
                    .map(|(prop, _)| (prop.clone(), spec.property_push_to_server(prop)))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            name: name.to_owned(),
            spec_name: spec_name.to_owned(),
            type_name: convert_to_js_name(spec_name),
            handlers,
            layout,
            model: ChangeAwareObject::with_policies(PushToServer::Reject, policies),
            dynamic_types: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Specification name as declared, e.g. `servoydefault-button`.
    #[must_use]
    pub fn spec_name(&self) -> &str {
        &self.spec_name
    }

    /// Camel-cased specification name, e.g. `servoydefaultButton`.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[must_use]
    pub fn handlers(&self) -> &[String] {
        &self.handlers
    }

    #[must_use]
    pub fn model(&self) -> &ChangeAwareObject {
        &self.model
    }

    /// Mutable model; assignments through it are recorded per push policy.
    pub fn model_mut(&mut self) -> &mut ChangeAwareObject {
        &mut self.model
    }

    /// Types the server declared at runtime for this instance.
    #[must_use]
    pub fn dynamic_types(&self) -> &BTreeMap<String, PropertyType> {
        &self.dynamic_types
    }

    #[must_use]
    pub fn specification<'r>(&self, registry: &'r TypesRegistry) -> Option<&'r ComponentSpecification> {
        registry.component_specification(&self.spec_name)
    }

    /// Declared type of `property`, falling back to the runtime type.
    #[must_use]
    pub fn client_side_type(&self, property: &str, registry: &TypesRegistry) -> Option<PropertyType> {
        self.specification(registry)
            .and_then(|spec| spec.property_type(property))
            .or_else(|| self.dynamic_types.get(property))
            .cloned()
    }

    /// Model value as JSON; `Null` when absent.
    #[must_use]
    pub fn property_json(&self, property: &str) -> Value {
        self.model.get(property).map_or(Value::Null, ClientValue::to_json)
    }

    // =========================================================================
    // SERVER TO CLIENT
    // =========================================================================

    /// Replace the model with a designer model.
    ///
    /// Returns `true` when a geometry property (`size`, `location`,
    /// `anchors`, `cssPosition`) changed.
    pub fn update_properties(&mut self, model: &Map<String, Value>, conv: &Converter<'_>) -> bool {
        let bean_types = self.read_dynamic_types(model, conv.registry());
        let mut redraw = false;

        for (property, value) in model {
            if property == TYPES_KEY {
                continue;
            }
            let before = self.property_json(property);
            match bean_types.get(property) {
                Some(ty) => self.convert_property(property, value, ty, conv),
                None => self.model.set_from_server(property, ClientValue::Plain(value.clone())),
            }
            if geometry_changed(property, &before, &self.property_json(property)) {
                redraw = true;
            }
        }

        let stale: Vec<String> = self
            .model
            .keys()
            .filter(|k| model.get(k.as_str()).is_none_or(Value::is_null))
            .cloned()
            .collect();
        for property in stale {
            self.model.set_from_server(&property, ClientValue::default());
        }
        redraw
    }

    /// Apply a runtime property update from the server.
    ///
    /// Typed properties are decoded through the converters, granular
    /// envelopes in place; untyped properties are stored as plain JSON.
    pub fn apply_server_properties(&mut self, properties: &Map<String, Value>, conv: &Converter<'_>) {
        self.read_dynamic_types(properties, conv.registry());
        for (property, value) in properties {
            if property == TYPES_KEY {
                continue;
            }
            match self.client_side_type(property, conv.registry()) {
                Some(ty) => self.convert_property(property, value, &ty, conv),
                None => self.model.set_from_server(property, ClientValue::Plain(value.clone())),
            }
        }
    }

    /// Merge `svy_types` into the dynamic types; returns just the types this model carried.
    fn read_dynamic_types(&mut self, model: &Map<String, Value>, registry: &TypesRegistry) -> BTreeMap<String, PropertyType> {
        let Some(types) = model.get(TYPES_KEY).and_then(Value::as_object) else {
            return BTreeMap::new();
        };
        let parsed: BTreeMap<String, PropertyType> = types
            .iter()
            .map(|(property, desc)| (property.clone(), registry.resolve_type(desc, &self.spec_name)))
            .collect();
        self.dynamic_types.extend(parsed.iter().map(|(k, v)| (k.clone(), v.clone())));
        parsed
    }

    fn convert_property(&mut self, property: &str, wire: &Value, ty: &PropertyType, conv: &Converter<'_>) {
        let ctx = self.model.internal_state().policy_for(&ChangeKey::Key(property.to_owned()));
        let mut slot = self.model.get_mut(property).map(mem::take).unwrap_or_default();
        match conv.update_from_server(&mut slot, wire, ty, ctx) {
            Ok(()) => {}
            Err(e) if e.retryable() => {
                warn!(component = %self.name, property, error = %e, code = e.error_code(), "stale update ignored");
            }
            Err(e) => {
                error!(component = %self.name, property, error = %e, code = e.error_code(), "property conversion failed");
                slot = ClientValue::default();
            }
        }
        self.model.set_from_server(property, slot);
    }

    // =========================================================================
    // CLIENT TO SERVER
    // =========================================================================

    /// Encode every recorded model change and clear the record.
    ///
    /// Properties whose encoding fails are logged and left out.
    pub fn take_outgoing_changes(&mut self, conv: &Converter<'_>) -> Map<String, Value> {
        let state = self.model.internal_state();
        let mut out = Map::new();
        for key in state.changed_keys() {
            let ChangeKey::Key(property) = &key else { continue };
            let ctx = state.policy_for(&key);
            let ty = self.client_side_type(property, conv.registry()).unwrap_or(PropertyType::Untyped);
            let value = match self.model.get(property) {
                Some(value) => conv.slot_delta(value, &ty, ctx),
                None => Ok(Value::Null),
            };
            match value {
                Ok(value) => {
                    out.insert(property.clone(), value);
                }
                Err(e) => {
                    error!(component = %self.name, property = %property, error = %e, "outgoing conversion failed");
                }
            }
        }
        state.clear_changes();
        debug!(component = %self.name, changes = out.len(), "outgoing changes taken");
        out
    }
}

/// `testpackage-myTestService` → `testpackageMyTestService`.
#[must_use]
pub fn convert_to_js_name(spec_name: &str) -> String {
    let mut parts = spec_name.split('-');
    let mut name = parts.next().unwrap_or_default().to_owned();
    for part in parts {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            name.extend(first.to_uppercase());
            name.push_str(chars.as_str());
        }
    }
    name
}

fn geometry_changed(property: &str, before: &Value, after: &Value) -> bool {
    if !GEOMETRY_PROPERTIES.contains(&property) {
        return false;
    }
    let fields: &[&str] = match property {
        "size" => &["width", "height"],
        "location" => &["x", "y"],
        "cssPosition" => &["top", "bottom", "left", "right"],
        _ => return before != after,
    };
    fields.iter().any(|f| before.get(f) != after.get(f))
}
