//! Types registry built from component client-side specifications.
//!
//! DESIGN
//! ======
//! The server describes each component specification as
//! `{ "p": {prop: desc}, "ftd": {"JSON_obj": {TypeName: {prop: desc}}}, "h": {...} }`
//! where a `desc` is a type (`"Date"`, `["JSON_arr", elemDesc]`,
//! `["JSON_obj", "TypeName"]`, null for untyped) or an object
//! `{t: type, s: policy}`.
//! Custom object names are scoped to the specification that declares them
//! and stored as `specName.TypeName`.
//!
//! The registry is an explicit value: build one per session and pass it by
//! reference to whatever converts values.

#[cfg(test)]
#[path = "registry_test.rs"]
mod registry_test;

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;
use tracing::debug;
use wire::WireError;

use crate::error::ConvertError;
use crate::policy::PushToServer;
use crate::types::{PropertyDescription, PropertyType};

pub const CUSTOM_ARRAY_FACTORY: &str = "JSON_arr";
pub const CUSTOM_OBJECT_FACTORY: &str = "JSON_obj";

const PRIMITIVE_TYPE_NAMES: &[&str] = &[
    "string", "int", "long", "double", "float", "boolean", "number", "json", "dimension", "point", "tagstring",
    "dataprovider", "color", "border", "font", "insets", "format", "styleclass", "protected", "visible", "enabled",
];

// =============================================================================
// DEFINITIONS
// =============================================================================

/// A named record type with typed sub-properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomObjectDefinition {
    pub name: String,
    pub properties: BTreeMap<String, PropertyDescription>,
}

impl CustomObjectDefinition {
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&PropertyDescription> {
        self.properties.get(key)
    }
}

/// Client-side view of one component specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentSpecification {
    pub name: String,
    properties: BTreeMap<String, PropertyDescription>,
    handlers: Vec<String>,
}

impl ComponentSpecification {
    #[must_use]
    pub fn property_description(&self, property: &str) -> Option<&PropertyDescription> {
        self.properties.get(property)
    }

    #[must_use]
    pub fn property_type(&self, property: &str) -> Option<&PropertyType> {
        self.properties.get(property).map(|d| &d.ty)
    }

    /// Declared policy of a top-level property; undeclared means `Reject`.
    #[must_use]
    pub fn property_push_to_server(&self, property: &str) -> PushToServer {
        self.properties
            .get(property)
            .and_then(|d| d.push_to_server)
            .unwrap_or_default()
    }

    /// Whether any property is pushed automatically on reference change.
    #[must_use]
    pub fn has_shallow_or_deep(&self) -> bool {
        self.properties
            .values()
            .any(|d| d.push_to_server.is_some_and(|p| p > PushToServer::Allow))
    }

    pub fn properties(&self) -> impl Iterator<Item = (&String, &PropertyDescription)> {
        self.properties.iter()
    }

    #[must_use]
    pub fn handlers(&self) -> &[String] {
        &self.handlers
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct TypesRegistry {
    specs: HashMap<String, ComponentSpecification>,
    custom_objects: HashMap<String, CustomObjectDefinition>,
}

impl TypesRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every specification in a `{specName: spec}` map.
    ///
    /// Returns how many specifications were registered.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Wire`] when `specs` is not a JSON object.
    pub fn add_component_client_side_specs(&mut self, specs: &Value) -> Result<usize, ConvertError> {
        let Some(map) = specs.as_object() else {
            return Err(WireError::MalformedEnvelope(format!("component specs must be an object, got {specs}")).into());
        };
        for (name, spec) in map {
            self.add_component_specification(name, spec);
        }
        Ok(map.len())
    }

    /// Register (or replace) a single specification.
    pub fn add_component_specification(&mut self, name: &str, spec: &Value) {
        if let Some(custom_types) = spec
            .get("ftd")
            .and_then(|ftd| ftd.get(CUSTOM_OBJECT_FACTORY))
            .and_then(Value::as_object)
        {
            for (type_name, props) in custom_types {
                let qualified = qualify(name, type_name);
                let properties = parse_properties(props, name);
                self.custom_objects
                    .insert(qualified.clone(), CustomObjectDefinition { name: qualified, properties });
            }
        }

        let properties = spec.get("p").map(|p| parse_properties(p, name)).unwrap_or_default();
        let handlers = spec
            .get("h")
            .and_then(Value::as_object)
            .map(|h| h.keys().cloned().collect())
            .unwrap_or_default();

        debug!(spec = name, properties = properties.len(), "registered component specification");
        self.specs.insert(
            name.to_owned(),
            ComponentSpecification { name: name.to_owned(), properties, handlers },
        );
    }

    #[must_use]
    pub fn component_specification(&self, name: &str) -> Option<&ComponentSpecification> {
        self.specs.get(name)
    }

    #[must_use]
    pub fn custom_object(&self, qualified_name: &str) -> Option<&CustomObjectDefinition> {
        self.custom_objects.get(qualified_name)
    }

    /// Resolve a type sent at runtime (for example through `svy_types`).
    #[must_use]
    pub fn resolve_type(&self, desc: &Value, scope: &str) -> PropertyType {
        parse_description(desc, scope).ty
    }
}

// =============================================================================
// PARSING
// =============================================================================

fn parse_properties(raw: &Value, scope: &str) -> BTreeMap<String, PropertyDescription> {
    raw.as_object()
        .map(|props| {
            props
                .iter()
                .map(|(k, desc)| (k.clone(), parse_description(desc, scope)))
                .collect()
        })
        .unwrap_or_default()
}

/// Parse a property description: a bare type or `{t, s}`.
#[must_use]
pub fn parse_description(raw: &Value, scope: &str) -> PropertyDescription {
    if let Value::Object(obj) = raw
        && (obj.contains_key("t") || obj.contains_key("s"))
    {
        let ty = obj.get("t").map_or(PropertyType::Untyped, |t| parse_type(t, scope));
        let push_to_server = obj.get("s").and_then(PushToServer::from_server);
        return PropertyDescription::new(ty, push_to_server);
    }
    PropertyDescription::new(parse_type(raw, scope), None)
}

fn parse_type(raw: &Value, scope: &str) -> PropertyType {
    match raw {
        Value::Null => PropertyType::Untyped,
        Value::String(name) => named_type(name),
        Value::Array(pair) => match pair.first().and_then(Value::as_str) {
            Some(CUSTOM_ARRAY_FACTORY) => {
                let element = pair.get(1).map_or_else(PropertyDescription::untyped, |d| parse_description(d, scope));
                PropertyType::CustomArray(Box::new(element))
            }
            Some(CUSTOM_OBJECT_FACTORY) => match pair.get(1).and_then(Value::as_str) {
                Some(type_name) => PropertyType::CustomObject(qualify(scope, type_name)),
                None => PropertyType::Unknown(CUSTOM_OBJECT_FACTORY.to_owned()),
            },
            Some(factory) => PropertyType::Unknown(factory.to_owned()),
            None => PropertyType::Unknown(raw.to_string()),
        },
        Value::Object(obj) => obj
            .get("t")
            .map_or_else(|| PropertyType::Unknown(raw.to_string()), |t| parse_type(t, scope)),
        other => PropertyType::Unknown(other.to_string()),
    }
}

fn named_type(name: &str) -> PropertyType {
    match name {
        "Date" | "date" | "svy_date" => PropertyType::Date,
        "object" => PropertyType::Untyped,
        "clientfunction" | "function" => PropertyType::Function,
        n if PRIMITIVE_TYPE_NAMES.contains(&n) => PropertyType::Primitive,
        other => PropertyType::Unknown(other.to_owned()),
    }
}

fn qualify(scope: &str, type_name: &str) -> String {
    if type_name.contains('.') {
        type_name.to_owned()
    } else {
        format!("{scope}.{type_name}")
    }
}
