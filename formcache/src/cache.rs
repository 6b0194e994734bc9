//! The form arena and its lookup maps.
//!
//! DESIGN
//! ======
//! Nodes live in a `Vec<Option<Slot>>`; a slot holds the node, its parent
//! id and its ordered child ids. Ids are never reused, so an id kept across
//! a batch either still names the same node or names nothing.
//!
//! Invariants kept by every method here:
//!
//! - a node has at most one parent and appears once in that parent's
//!   children (attaching detaches first);
//! - removing a container from the lookups removes every container,
//!   component and form component below it as well;
//! - discarding a subtree frees its slots and purges any lookup entry that
//!   still pointed into it.

#[cfg(test)]
#[path = "cache_test.rs"]
mod cache_test;

use std::collections::{BTreeMap, HashMap};
use std::mem;

use convert::{ComponentSpecification, PropertyType, TypesRegistry};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::component::ComponentCache;
use crate::error::CacheError;
use crate::node::{Dimension, FormComponentCache, Node, NodeId, PartCache, Slot, StructureCache};
use crate::sort::{SortMode, sort_by_priority};

/// Form as loaded before any design batch: name, size, layout kind, parts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormDefinition {
    pub name: String,
    #[serde(default)]
    pub size: Dimension,
    #[serde(default)]
    pub responsive: bool,
    #[serde(default)]
    pub parts: Vec<PartDefinition>,
}

pub type PartDefinition = PartCache;

#[derive(Debug)]
pub struct FormCache {
    formname: String,
    pub size: Dimension,
    responsive: bool,
    nodes: Vec<Option<Slot>>,
    main_structure: Option<NodeId>,
    parts: Vec<NodeId>,
    part_components: Vec<NodeId>,
    components: HashMap<String, NodeId>,
    layout_containers: HashMap<String, NodeId>,
    form_components: BTreeMap<String, NodeId>,
}

impl FormCache {
    #[must_use]
    pub fn new(formname: &str, size: Dimension, responsive: bool) -> Self {
        Self {
            formname: formname.to_owned(),
            size,
            responsive,
            nodes: Vec::new(),
            main_structure: None,
            parts: Vec::new(),
            part_components: Vec::new(),
            components: HashMap::new(),
            layout_containers: HashMap::new(),
            form_components: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn from_definition(definition: &FormDefinition) -> Self {
        let mut cache = Self::new(&definition.name, definition.size, definition.responsive);
        for part in &definition.parts {
            cache.add_part(part.clone());
        }
        cache
    }

    #[must_use]
    pub fn formname(&self) -> &str {
        &self.formname
    }

    #[must_use]
    pub fn is_responsive(&self) -> bool {
        self.responsive
    }

    /// Anchored (absolute) layout: the opposite of responsive.
    #[must_use]
    pub fn is_absolute(&self) -> bool {
        !self.responsive
    }

    // =========================================================================
    // ARENA ACCESS
    // =========================================================================

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.slot(id).is_some()
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slot(id).map(|s| &s.node)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slot_mut(id).map(|s| &mut s.node)
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).and_then(|s| s.parent)
    }

    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.slot(id).map(|s| s.children.as_slice()).unwrap_or_default()
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ancestors above the node, minus one: a top-level container of the
    /// main structure is at depth 0, the main structure itself at -1.
    #[must_use]
    pub fn depth(&self, id: NodeId) -> i64 {
        let mut level = -1;
        let mut current = self.parent(id);
        while let Some(parent) = current {
            level += 1;
            current = self.parent(parent);
        }
        level
    }

    #[must_use]
    pub fn component(&self, id: NodeId) -> Option<&ComponentCache> {
        self.node(id).and_then(Node::as_component)
    }

    pub fn component_mut(&mut self, id: NodeId) -> Option<&mut ComponentCache> {
        self.node_mut(id).and_then(Node::as_component_mut)
    }

    /// `svy-id` of the node when it is a container.
    #[must_use]
    pub fn container_id(&self, id: NodeId) -> Option<&str> {
        self.node(id).and_then(Node::as_structure).and_then(StructureCache::id)
    }

    fn slot(&self, id: NodeId) -> Option<&Slot> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut Slot> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.nodes.push(Some(Slot::new(node)));
        NodeId(self.nodes.len() - 1)
    }

    // =========================================================================
    // STRUCTURE
    // =========================================================================

    #[must_use]
    pub fn main_structure(&self) -> Option<NodeId> {
        self.main_structure
    }

    /// Install `root` as the main structure and register every container,
    /// component and form component below it.
    pub fn set_main_structure(&mut self, root: NodeId) {
        self.main_structure = Some(root);
        self.find_components(root);
    }

    /// The main structure, created on first use.
    pub fn ensure_main_structure(&mut self) -> NodeId {
        match self.main_structure.filter(|id| self.contains(*id)) {
            Some(id) => id,
            None => {
                let id = self.alloc(Node::Structure(StructureCache::main()));
                self.main_structure = Some(id);
                id
            }
        }
    }

    fn find_components(&mut self, root: NodeId) {
        for child in self.children(root).to_vec() {
            let (container, component, descend) = match self.node(child) {
                Some(Node::Structure(s)) => (s.id().map(str::to_owned), None, true),
                Some(Node::FormComponent(_)) => (None, None, true),
                Some(Node::Component(c)) => (None, Some(c.name().to_owned()), false),
                Some(Node::Part(_)) | None => (None, None, false),
            };
            if let Some(key) = container {
                self.layout_containers.insert(key, child);
            }
            if let Some(name) = component {
                self.components.insert(name, child);
            }
            if descend {
                self.find_components(child);
            }
        }
    }

    /// Attach `child` as the last child of `parent`, detaching it from its
    /// current parent first.
    ///
    /// Returns `Ok(false)` when the parent silently refuses the child (the
    /// navigator under a part or form component).
    ///
    /// # Errors
    ///
    /// [`CacheError::UnknownNode`] for freed ids, [`CacheError::NotAContainer`]
    /// when `parent` is a plain component and [`CacheError::Cycle`] when
    /// `parent` lies inside `child`'s subtree.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<bool, CacheError> {
        let parent_node = self.node(parent).ok_or(CacheError::UnknownNode(parent))?;
        let child_node = self.node(child).ok_or(CacheError::UnknownNode(child))?;
        if !parent_node.is_container() {
            return Err(CacheError::NotAContainer(parent));
        }
        if parent_node.rejects_child(child_node) {
            return Ok(false);
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(CacheError::Cycle { parent, child });
        }
        self.detach(child);
        if let Some(slot) = self.slot_mut(parent) {
            slot.children.push(child);
        }
        if let Some(slot) = self.slot_mut(child) {
            slot.parent = Some(parent);
        }
        Ok(true)
    }

    /// Remove `child` from `parent`'s children; `false` when it was not there.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let Some(slot) = self.slot_mut(parent) else {
            return false;
        };
        let Some(index) = slot.children.iter().position(|c| *c == child) else {
            return false;
        };
        slot.children.remove(index);
        if let Some(slot) = self.slot_mut(child) {
            slot.parent = None;
        }
        true
    }

    /// Detach `child` from whatever parent holds it.
    pub fn detach(&mut self, child: NodeId) -> bool {
        match self.parent(child) {
            Some(parent) => self.remove_child(parent, child),
            None => false,
        }
    }

    /// Attach `child` under the container with `svy-id` `parent`, or under
    /// the form component named `parent`.
    ///
    /// # Errors
    ///
    /// [`CacheError::UnresolvedParent`] when neither exists, plus the
    /// errors of [`FormCache::add_child`].
    pub fn attach_to(&mut self, parent: &str, child: NodeId) -> Result<NodeId, CacheError> {
        let parent_id = self
            .get_layout_container(parent)
            .or_else(|| self.get_form_component(parent))
            .ok_or_else(|| CacheError::UnresolvedParent(parent.to_owned()))?;
        self.add_child(parent_id, child)?;
        Ok(parent_id)
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    // =========================================================================
    // LOOKUPS
    // =========================================================================

    /// Register a container; it is looked up by its `svy-id` when it has one.
    pub fn add_layout_container(&mut self, container: StructureCache) -> NodeId {
        let key = container.id().map(str::to_owned);
        let id = self.alloc(Node::Structure(container));
        if let Some(key) = key {
            self.layout_containers.insert(key, id);
        }
        id
    }

    /// Register a component, optionally attaching it to `parent`.
    ///
    /// A component attached to a part is also listed among the part components.
    ///
    /// # Errors
    ///
    /// Errors of [`FormCache::add_child`]; the component stays registered.
    pub fn add_component(&mut self, component: ComponentCache, parent: Option<NodeId>) -> Result<NodeId, CacheError> {
        let name = component.name().to_owned();
        let id = self.alloc(Node::Component(component));
        self.components.insert(name, id);
        if let Some(parent) = parent {
            let attached = self.add_child(parent, id)?;
            if attached && matches!(self.node(parent), Some(Node::Part(_))) {
                self.part_components.push(id);
            }
        }
        Ok(id)
    }

    /// Register a form component, replacing any previous one of that name.
    pub fn add_form_component(&mut self, form_component: FormComponentCache) -> NodeId {
        let name = form_component.component.name().to_owned();
        let id = self.alloc(Node::FormComponent(form_component));
        if let Some(previous) = self.form_components.insert(name, id) {
            debug!(form = %self.formname, replaced = %previous, "form component replaced");
        }
        id
    }

    pub fn add_part(&mut self, part: PartCache) -> NodeId {
        let id = self.alloc(Node::Part(part));
        self.parts.push(id);
        id
    }

    #[must_use]
    pub fn parts(&self) -> &[NodeId] {
        &self.parts
    }

    /// Top-level elements of an absolute form, in sort order.
    #[must_use]
    pub fn part_components(&self) -> &[NodeId] {
        &self.part_components
    }

    pub fn push_part_component(&mut self, id: NodeId) {
        if !self.part_components.contains(&id) {
            self.part_components.push(id);
        }
    }

    /// Component or form component by name.
    #[must_use]
    pub fn get_component(&self, name: &str) -> Option<NodeId> {
        self.components.get(name).copied().or_else(|| self.get_form_component(name))
    }

    #[must_use]
    pub fn get_form_component(&self, name: &str) -> Option<NodeId> {
        self.form_components.get(name).copied()
    }

    #[must_use]
    pub fn get_layout_container(&self, id: &str) -> Option<NodeId> {
        self.layout_containers.get(id).copied()
    }

    /// Names of the plain components, sorted.
    #[must_use]
    pub fn component_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.components.keys().cloned().collect();
        names.sort();
        names
    }

    /// Drop a plain component from the lookups and the part components.
    pub fn remove_component(&mut self, name: &str) -> Option<NodeId> {
        let id = self.components.remove(name)?;
        self.part_components.retain(|c| *c != id);
        Some(id)
    }

    pub fn remove_form_component(&mut self, name: &str) -> Option<NodeId> {
        self.form_components.remove(name)
    }

    /// Drop a container and everything below it from the lookups.
    pub fn remove_layout_container(&mut self, id: &str) -> Option<NodeId> {
        let node = self.layout_containers.remove(id)?;
        self.part_components.retain(|c| *c != node);
        self.remove_descendants_from_lookups(node);
        Some(node)
    }

    /// Drop every container, component and form component below `parent`
    /// from the lookups; the tree itself is left as it is.
    pub fn remove_descendants_from_lookups(&mut self, parent: NodeId) {
        for child in self.children(parent).to_vec() {
            match self.node(child) {
                Some(Node::Structure(s)) => {
                    if let Some(id) = s.id().map(str::to_owned) {
                        self.layout_containers.remove(&id);
                    }
                    self.remove_descendants_from_lookups(child);
                }
                Some(Node::Component(c)) => {
                    let name = c.name().to_owned();
                    self.remove_component(&name);
                }
                Some(Node::FormComponent(fc)) => {
                    let name = fc.component.name().to_owned();
                    self.form_components.remove(&name);
                    self.remove_descendants_from_lookups(child);
                }
                Some(Node::Part(_)) | None => {}
            }
        }
    }

    /// Detach `id` and free it with its whole subtree.
    ///
    /// Lookup entries that still point into the subtree are purged.
    pub fn discard(&mut self, id: NodeId) {
        self.detach(id);
        let mut freed = Vec::new();
        self.free_subtree(id, &mut freed);
        if freed.is_empty() {
            return;
        }
        self.components.retain(|_, n| !freed.contains(n));
        self.layout_containers.retain(|_, n| !freed.contains(n));
        self.form_components.retain(|_, n| !freed.contains(n));
        self.part_components.retain(|n| !freed.contains(n));
        self.parts.retain(|n| !freed.contains(n));
        if self.main_structure.is_some_and(|m| freed.contains(&m)) {
            self.main_structure = None;
        }
    }

    fn free_subtree(&mut self, id: NodeId, freed: &mut Vec<NodeId>) {
        let Some(slot) = self.nodes.get_mut(id.0).and_then(Option::take) else {
            return;
        };
        freed.push(id);
        for child in slot.children {
            self.free_subtree(child, freed);
        }
    }

    // =========================================================================
    // TYPES
    // =========================================================================

    /// Specification of the named component or form component.
    #[must_use]
    pub fn component_specification<'r>(&self, name: &str, registry: &'r TypesRegistry) -> Option<&'r ComponentSpecification> {
        self.get_component(name)
            .and_then(|id| self.component(id))
            .and_then(|c| c.specification(registry))
    }

    /// Declared type of `property`, or the type the server assigned at runtime.
    #[must_use]
    pub fn client_side_type(&self, name: &str, property: &str, registry: &TypesRegistry) -> Option<PropertyType> {
        self.get_component(name)
            .and_then(|id| self.component(id))
            .and_then(|c| c.client_side_type(property, registry))
    }

    // =========================================================================
    // ORDERING
    // =========================================================================

    /// Re-sort the children of `parent` by priority.
    pub fn sort_children(&mut self, parent: NodeId, mode: SortMode) {
        let Some(mut children) = self.slot_mut(parent).map(|s| mem::take(&mut s.children)) else {
            return;
        };
        sort_by_priority(&mut children, mode, |id| self.node(*id).and_then(Node::priority));
        if let Some(slot) = self.slot_mut(parent) {
            slot.children = children;
        }
    }

    pub fn sort_part_components(&mut self, mode: SortMode) {
        let mut items = mem::take(&mut self.part_components);
        sort_by_priority(&mut items, mode, |id| self.node(*id).and_then(Node::priority));
        self.part_components = items;
    }

    // =========================================================================
    // SNAPSHOT
    // =========================================================================

    /// JSON view of the whole form, for logs and the replay tool.
    #[must_use]
    pub fn snapshot(&self) -> Value {
        json!({
            "formname": self.formname,
            "size": self.size,
            "responsive": self.responsive,
            "mainStructure": self.main_structure.map_or(Value::Null, |id| self.node_snapshot(id)),
            "parts": self.parts.iter().map(|id| self.node_snapshot(*id)).collect::<Vec<_>>(),
            "partComponents": self.part_components.iter().map(|id| self.node_snapshot(*id)).collect::<Vec<_>>(),
        })
    }

    fn node_snapshot(&self, id: NodeId) -> Value {
        let items: Vec<Value> = self.children(id).iter().map(|c| self.node_snapshot(*c)).collect();
        match self.node(id) {
            Some(Node::Structure(s)) => json!({
                "container": s.id(),
                "tagname": s.tagname,
                "classes": s.classes,
                "items": items,
            }),
            Some(Node::Component(c)) => json!({
                "component": c.name(),
                "type": c.type_name(),
                "model": model_snapshot(c),
            }),
            Some(Node::FormComponent(fc)) => json!({
                "formComponent": fc.component.name(),
                "responsive": fc.responsive,
                "layout": fc.properties.layout,
                "model": model_snapshot(&fc.component),
                "items": items,
            }),
            Some(Node::Part(p)) => json!({
                "part": p.classes,
                "items": items,
            }),
            None => Value::Null,
        }
    }
}

fn model_snapshot(component: &ComponentCache) -> Value {
    Value::Object(component.model().iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
}
