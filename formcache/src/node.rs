//! Node kinds stored in the form arena.

#[cfg(test)]
#[path = "node_test.rs"]
mod node_test;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use wire::Layout;
use wire::batch::SVY_ID;

use crate::component::ComponentCache;
use crate::sort::parse_priority;

/// Attribute (containers) or `servoyAttributes` entry (components) holding the sort priority.
pub const PRIORITY_ATTRIBUTE: &str = "svy-priority";

/// Component type that parts and form components never hold.
pub const NAVIGATOR_TYPE: &str = "servoycoreNavigator";

/// Index of a node in its [`crate::FormCache`] arena. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub width: i64,
    pub height: i64,
}

// =============================================================================
// CONTAINERS
// =============================================================================

/// A layout container of a responsive form (or the synthetic main structure).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructureCache {
    pub tagname: Option<String>,
    pub classes: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    pub css_position_container: bool,
    pub layout: Layout,
}

impl StructureCache {
    /// The root every top-level container of a responsive form hangs from.
    #[must_use]
    pub fn main() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_delta(delta: &wire::ContainerDelta) -> Self {
        Self {
            tagname: Some(delta.tagname.clone()),
            classes: delta.styleclass.clone(),
            attributes: delta.attributes.clone(),
            css_position_container: delta.css_position_container,
            layout: delta.position.clone(),
        }
    }

    /// Stable id from the `svy-id` attribute.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.attributes.get(SVY_ID).map(String::as_str)
    }
}

/// A form part (header, body, footer ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartCache {
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub layout: Layout,
}

/// Presentation of a form component inside its parent form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormComponentProperties {
    pub classes: Vec<String>,
    pub layout: Layout,
    pub attributes: BTreeMap<String, String>,
}

/// A component that embeds another form and owns that form's elements.
#[derive(Debug)]
pub struct FormComponentCache {
    pub component: ComponentCache,
    pub responsive: bool,
    pub properties: FormComponentProperties,
    pub has_foundset: bool,
}

// =============================================================================
// NODE
// =============================================================================

#[derive(Debug)]
pub enum Node {
    Structure(StructureCache),
    Component(ComponentCache),
    FormComponent(FormComponentCache),
    Part(PartCache),
}

impl Node {
    /// Whether this node can hold children.
    #[must_use]
    pub fn is_container(&self) -> bool {
        !matches!(self, Self::Component(_))
    }

    /// Whether a container of this kind refuses `child`.
    ///
    /// Parts and form components never hold the navigator pseudo component.
    #[must_use]
    pub fn rejects_child(&self, child: &Node) -> bool {
        matches!(self, Self::Part(_) | Self::FormComponent(_))
            && child.as_component().is_some_and(|c| c.type_name() == NAVIGATOR_TYPE)
    }

    /// The component behind a plain component or a form component.
    #[must_use]
    pub fn as_component(&self) -> Option<&ComponentCache> {
        match self {
            Self::Component(c) => Some(c),
            Self::FormComponent(fc) => Some(&fc.component),
            Self::Structure(_) | Self::Part(_) => None,
        }
    }

    pub fn as_component_mut(&mut self) -> Option<&mut ComponentCache> {
        match self {
            Self::Component(c) => Some(c),
            Self::FormComponent(fc) => Some(&mut fc.component),
            Self::Structure(_) | Self::Part(_) => None,
        }
    }

    #[must_use]
    pub fn as_structure(&self) -> Option<&StructureCache> {
        match self {
            Self::Structure(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_structure_mut(&mut self) -> Option<&mut StructureCache> {
        match self {
            Self::Structure(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_form_component(&self) -> Option<&FormComponentCache> {
        match self {
            Self::FormComponent(fc) => Some(fc),
            _ => None,
        }
    }

    pub fn as_form_component_mut(&mut self) -> Option<&mut FormComponentCache> {
        match self {
            Self::FormComponent(fc) => Some(fc),
            _ => None,
        }
    }

    /// Sort priority: location in a responsive form, form index in an absolute one.
    #[must_use]
    pub fn priority(&self) -> Option<i64> {
        match self {
            Self::Structure(s) => s.attributes.get(PRIORITY_ATTRIBUTE).and_then(|p| parse_priority(p)),
            Self::Component(_) | Self::FormComponent(_) => {
                let attributes = self.as_component()?.model().get("servoyAttributes")?.to_json();
                match attributes.get(PRIORITY_ATTRIBUTE)? {
                    Value::String(p) => parse_priority(p),
                    Value::Number(n) => parse_priority(&n.to_string()),
                    _ => None,
                }
            }
            Self::Part(_) => None,
        }
    }

    /// Short label for logs.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Structure(s) => format!("StructureCache({})", s.id().unwrap_or("-")),
            Self::Component(c) => format!("ComponentCache({}, {})", c.name(), c.type_name()),
            Self::FormComponent(fc) => format!("FormComponentCache({})", fc.component.name()),
            Self::Part(p) => format!("PartCache({})", p.classes.join(" ")),
        }
    }
}

// =============================================================================
// ARENA SLOT
// =============================================================================

#[derive(Debug)]
pub(crate) struct Slot {
    pub(crate) node: Node,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Slot {
    pub(crate) fn new(node: Node) -> Self {
        Self { node, parent: None, children: Vec::new() }
    }
}
