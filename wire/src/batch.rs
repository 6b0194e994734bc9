//! Designer edit batch.
//!
//! One batch describes everything that changed in a design session since the
//! previous batch: created or updated containers and components, the parent
//! of every reported child, and the names/ids that were deleted. The
//! reconciler applies a batch as a unit.

#[cfg(test)]
#[path = "batch_test.rs"]
mod batch_test;

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::WireError;

/// Attribute carrying a container's stable id.
pub const SVY_ID: &str = "svy-id";

/// CSS-like layout map (`left`, `top`, `min-height`, ...).
pub type Layout = BTreeMap<String, Value>;

/// A created or updated layout container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDelta {
    #[serde(default)]
    pub tagname: String,
    #[serde(default)]
    pub styleclass: Vec<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub css_position_container: bool,
    #[serde(default)]
    pub position: Layout,
}

impl ContainerDelta {
    /// The container id, taken from its `svy-id` attribute.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.attributes.get(SVY_ID).map(String::as_str)
    }
}

/// A created or updated component (plain or form component).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentDelta {
    pub name: String,
    /// Component specification name, e.g. `servoydefault-button`.
    #[serde(rename = "type", default)]
    pub spec_name: String,
    #[serde(default)]
    pub model: Map<String, Value>,
    #[serde(default)]
    pub handlers: Vec<String>,
    #[serde(default)]
    pub position: Layout,
    #[serde(default)]
    pub responsive: bool,
}

/// Parent reference inside `childParentMap`; `uuid` absent means the form root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    #[serde(default)]
    pub uuid: Option<String>,
}

/// A full edit batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignBatch {
    #[serde(default)]
    pub ng2containers: Option<Vec<ContainerDelta>>,
    #[serde(default)]
    pub ng2components: Option<Vec<ComponentDelta>>,
    #[serde(default)]
    pub child_parent_map: HashMap<String, ParentRef>,
    #[serde(default)]
    pub deleted: Option<Vec<String>>,
    #[serde(default)]
    pub deleted_containers: Option<Vec<String>>,
    #[serde(default)]
    pub updated_form_components_design_id: Option<Vec<String>>,
    #[serde(default)]
    pub form_components_components: Vec<String>,
    #[serde(default)]
    pub render_ghosts: bool,
}

impl DesignBatch {
    /// Parse a batch from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Json`] when the text is not a valid batch.
    pub fn parse(text: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reported parent id of `child`, if the map names one.
    #[must_use]
    pub fn parent_of(&self, child: &str) -> Option<&str> {
        self.child_parent_map.get(child).and_then(|p| p.uuid.as_deref())
    }

    /// Whether `childParentMap` has any entry for `child`.
    #[must_use]
    pub fn has_parent_entry(&self, child: &str) -> bool {
        self.child_parent_map.contains_key(child)
    }

    /// Whether `name` is one of the components that live inside a form component.
    #[must_use]
    pub fn is_form_component_child(&self, name: &str) -> bool {
        self.form_components_components.iter().any(|c| c == name)
    }
}
