//! Applies designer edit batches to a [`FormCache`].
//!
//! DESIGN
//! ======
//! A batch runs to completion synchronously, in phases:
//!
//! 1. containers: update or create, re-parent, queue orphans whose parent
//!    has not been seen yet;
//! 2. components, first pass: update or create components and form
//!    components, re-parent moved components;
//! 3. components, second pass: form components whose embedded form changed
//!    get their children re-attached;
//! 4. deletions: components, form components and containers (with their
//!    whole subtree);
//! 5. part components and every touched container are re-sorted, orphans
//!    are resolved;
//! 6. signals: each of `render_ghosts`, `refresh` and `redraw_decorators`
//!    fires at most once.
//!
//! Nothing here returns an error. A delta that cannot be applied is logged
//! and skipped; an orphan whose parent never shows up is dropped and
//! counted. A failure part-way leaves the earlier deltas applied.

#[cfg(test)]
#[path = "reconciler_test.rs"]
mod reconciler_test;

use std::collections::BTreeMap;

use convert::Converter;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use wire::{ComponentDelta, ContainerDelta, DesignBatch, ErrorCode, Layout};

use crate::cache::FormCache;
use crate::component::ComponentCache;
use crate::error::CacheError;
use crate::node::{Dimension, FormComponentCache, FormComponentProperties, Node, NodeId, StructureCache};
use crate::sort::SortMode;

/// Specifications whose components embed another form.
pub const FORM_COMPONENT_TYPES: [&str; 2] = ["servoycoreFormcomponent", "servoycoreListformcomponent"];

/// Receiver of the visual refresh signals a batch produces.
pub trait DesignFormCallbacks {
    /// Structural decorators (part and invisible-element ghosts) need re-rendering.
    fn render_ghosts(&mut self);
    /// The rendered form needs a full refresh.
    fn refresh(&mut self);
    /// Selection and wireframe overlays need repositioning.
    fn redraw_decorators(&mut self);
    /// The form itself was resized.
    fn update_form(&mut self, width: i64, height: i64);
    /// The whole editor content has to be reloaded.
    fn content_refresh(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerOptions {
    pub sort_mode: SortMode,
    /// Forms the reconciler leaves alone.
    pub ignored_forms: Vec<String>,
}

impl Default for ReconcilerOptions {
    fn default() -> Self {
        Self { sort_mode: SortMode::default(), ignored_forms: vec!["VariantsForm".to_owned()] }
    }
}

/// What one batch did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub render_ghosts: bool,
    pub refresh: bool,
    pub redraw_decorators: bool,
    /// Deltas whose parent never resolved.
    pub orphans_dropped: usize,
    /// Deltas skipped because they could not be applied.
    pub skipped: usize,
}

#[derive(Debug, Default)]
pub struct Reconciler {
    options: ReconcilerOptions,
    orphans_dropped: usize,
}

impl Reconciler {
    #[must_use]
    pub fn new(options: ReconcilerOptions) -> Self {
        Self { options, orphans_dropped: 0 }
    }

    #[must_use]
    pub fn options(&self) -> &ReconcilerOptions {
        &self.options
    }

    /// Orphans dropped over the reconciler's lifetime.
    #[must_use]
    pub fn orphans_dropped(&self) -> usize {
        self.orphans_dropped
    }

    /// Apply one edit batch and fire the resulting signals.
    pub fn update_form_data(
        &mut self,
        cache: &mut FormCache,
        batch: &DesignBatch,
        callbacks: &mut dyn DesignFormCallbacks,
        conv: &Converter<'_>,
    ) -> ReconcileReport {
        if self.options.ignored_forms.iter().any(|f| f == cache.formname()) {
            debug!(form = cache.formname(), "batch ignored");
            return ReconcileReport::default();
        }

        let mut run = BatchRun::new(cache, batch, conv, self.options.sort_mode);
        if let Some(containers) = &batch.ng2containers {
            for delta in containers {
                run.container(delta);
            }
            run.report.refresh = true;
        }
        if let Some(components) = &batch.ng2components {
            for delta in components {
                run.component(delta);
            }
            for delta in components {
                run.form_component(delta);
            }
            run.report.refresh = true;
        }
        run.deletions();
        run.finish();

        let mut report = run.report;
        report.render_ghosts |= batch.render_ghosts;
        self.orphans_dropped += report.orphans_dropped;

        if report.render_ghosts {
            callbacks.render_ghosts();
        }
        if report.refresh {
            callbacks.refresh();
        }
        if report.redraw_decorators {
            callbacks.redraw_decorators();
        }
        info!(
            form = cache.formname(),
            render_ghosts = report.render_ghosts,
            refresh = report.refresh,
            redraw_decorators = report.redraw_decorators,
            orphans_dropped = report.orphans_dropped,
            skipped = report.skipped,
            "design batch applied"
        );
        report
    }

    /// The form was resized in the editor.
    pub fn update_form(&self, cache: &mut FormCache, callbacks: &mut dyn DesignFormCallbacks, width: i64, height: i64) {
        cache.size = Dimension { width, height };
        callbacks.update_form(width, height);
    }

    pub fn content_refresh(&self, callbacks: &mut dyn DesignFormCallbacks) {
        callbacks.content_refresh();
    }
}

// =============================================================================
// BATCH STATE
// =============================================================================

struct BatchRun<'a, 'r> {
    cache: &'a mut FormCache,
    batch: &'a DesignBatch,
    conv: &'a Converter<'r>,
    sort_mode: SortMode,
    reorder: Vec<NodeId>,
    orphans: Vec<NodeId>,
    reorder_parts: bool,
    report: ReconcileReport,
}

impl<'a, 'r> BatchRun<'a, 'r> {
    fn new(cache: &'a mut FormCache, batch: &'a DesignBatch, conv: &'a Converter<'r>, sort_mode: SortMode) -> Self {
        Self {
            cache,
            batch,
            conv,
            sort_mode,
            reorder: Vec::new(),
            orphans: Vec::new(),
            reorder_parts: false,
            report: ReconcileReport::default(),
        }
    }

    fn queue_reorder(&mut self, container: NodeId) {
        if !self.reorder.contains(&container) {
            self.reorder.push(container);
        }
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) -> bool {
        match self.cache.add_child(parent, child) {
            Ok(attached) => attached,
            Err(e) => {
                self.skip(&e);
                false
            }
        }
    }

    fn skip(&mut self, e: &CacheError) {
        warn!(form = self.cache.formname(), error = %e, code = e.error_code(), "delta skipped");
        self.report.skipped += 1;
    }

    fn drop_orphan(&mut self, child: &str, parent: &str) {
        debug!(form = self.cache.formname(), child, parent, "orphan dropped");
        self.report.orphans_dropped += 1;
    }

    // =========================================================================
    // CONTAINERS
    // =========================================================================

    fn container(&mut self, delta: &ContainerDelta) {
        let id = delta.id();
        match id.and_then(|id| self.cache.get_layout_container(id)) {
            Some(node) => self.update_container(node, delta),
            None => self.create_container(delta),
        }
    }

    fn update_container(&mut self, node: NodeId, delta: &ContainerDelta) {
        let batch = self.batch;
        self.report.redraw_decorators = true;
        if let Some(structure) = self.cache.node_mut(node).and_then(Node::as_structure_mut) {
            structure.classes.clone_from(&delta.styleclass);
            structure.attributes.clone_from(&delta.attributes);
            structure.layout.clone_from(&delta.position);
        }
        let Some(current) = self.cache.parent(node) else {
            return;
        };
        let parent_uuid = delta.id().and_then(|id| batch.parent_of(id));
        let new_parent = match parent_uuid {
            Some(uuid) => self.cache.get_layout_container(uuid),
            None => self.cache.main_structure(),
        };
        let Some(new_parent) = new_parent else {
            self.drop_orphan(delta.id().unwrap_or_default(), parent_uuid.unwrap_or_default());
            return;
        };
        if new_parent != current && !self.attach(new_parent, node) {
            return;
        }
        self.queue_reorder(new_parent);
    }

    fn create_container(&mut self, delta: &ContainerDelta) {
        let batch = self.batch;
        let node = self.cache.add_layout_container(StructureCache::from_delta(delta));
        self.report.redraw_decorators = true;

        match delta.id().and_then(|id| batch.parent_of(id)) {
            Some(parent_uuid) => {
                if let Some(parent) = self.cache.get_layout_container(parent_uuid) {
                    if self.attach(parent, node) {
                        self.queue_reorder(parent);
                    }
                } else if let Some(fc) = self.cache.get_form_component(parent_uuid) {
                    self.attach(fc, node);
                } else {
                    self.orphans.push(node);
                }
            }
            None if self.cache.is_absolute() => self.cache.push_part_component(node),
            None => {
                let main = self.cache.ensure_main_structure();
                if self.attach(main, node) {
                    self.queue_reorder(main);
                }
            }
        }
    }

    // =========================================================================
    // COMPONENTS
    // =========================================================================

    fn component(&mut self, delta: &ComponentDelta) {
        match self.cache.get_component(&delta.name) {
            Some(node) => self.update_component(node, delta),
            None if FORM_COMPONENT_TYPES.contains(&delta.spec_name.as_str()) => self.create_form_component(delta),
            None => self.create_component(delta),
        }
    }

    fn update_component(&mut self, node: NodeId, delta: &ComponentDelta) {
        let batch = self.batch;
        if self.update_properties(node, delta) {
            self.report.redraw_decorators = true;
        }
        let current = self.cache.parent(node).filter(|p| matches!(self.cache.node(*p), Some(Node::Structure(_))));
        let Some(mut parent) = current else {
            if self.cache.is_absolute() {
                self.reorder_parts = true;
            }
            return;
        };

        if let Some(reported) = batch.child_parent_map.get(&delta.name) {
            let reported = reported.uuid.as_deref();
            if self.cache.container_id(parent) != reported {
                match reported.and_then(|uuid| self.cache.get_layout_container(uuid)) {
                    Some(target) => {
                        if self.attach(target, node) {
                            parent = target;
                        }
                    }
                    None => {
                        self.drop_orphan(&delta.name, reported.unwrap_or_default());
                        return;
                    }
                }
            }
        }
        self.report.redraw_decorators = true;
        self.queue_reorder(parent);
    }

    fn create_component(&mut self, delta: &ComponentDelta) {
        let batch = self.batch;
        self.report.redraw_decorators = true;
        let mut component = new_component(delta, self.conv);
        component.update_properties(&delta.model, self.conv);

        let node = match self.cache.add_component(component, None) {
            Ok(node) => node,
            Err(e) => {
                self.skip(&e);
                return;
            }
        };
        match batch.parent_of(&delta.name) {
            Some(parent_uuid) => match self.cache.get_layout_container(parent_uuid) {
                Some(parent) => {
                    if self.attach(parent, node) {
                        self.queue_reorder(parent);
                    }
                }
                None => self.drop_orphan(&delta.name, parent_uuid),
            },
            None if !batch.is_form_component_child(&delta.name) => {
                self.cache.push_part_component(node);
                self.reorder_parts = true;
            }
            None => {}
        }
    }

    fn create_form_component(&mut self, delta: &ComponentDelta) {
        let batch = self.batch;
        self.report.redraw_decorators = true;
        let mut component = new_component(delta, self.conv);
        component.update_properties(&delta.model, self.conv);

        let layout = if delta.responsive {
            Layout::new()
        } else {
            form_component_layout(&delta.model, self.cache.is_responsive())
        };
        let properties = FormComponentProperties {
            classes: style_classes(&delta.model),
            layout,
            attributes: servoy_attributes(&delta.model),
        };
        let has_foundset = delta.model.get("foundset").is_some_and(truthy);
        let node = self.cache.add_form_component(FormComponentCache {
            component,
            responsive: delta.responsive,
            properties,
            has_foundset,
        });

        if let Some(parent_uuid) = batch.parent_of(&delta.name) {
            match self.cache.get_layout_container(parent_uuid) {
                Some(parent) => {
                    if self.attach(parent, node) {
                        self.queue_reorder(parent);
                    }
                }
                None => self.drop_orphan(&delta.name, parent_uuid),
            }
        }
    }

    fn form_component(&mut self, delta: &ComponentDelta) {
        let batch = self.batch;
        let Some(node) = self.cache.get_form_component(&delta.name) else {
            return;
        };
        if let Some(updated) = &batch.updated_form_components_design_id {
            let fixed = fix_form_component_name(&delta.name);
            if updated.contains(&fixed) {
                self.report.refresh = true;
                self.rehome_form_component_children(node, &fixed, delta.responsive);
            }
        }

        if self.update_properties(node, delta) {
            self.report.redraw_decorators = true;
        }
        let has_contained_form = self
            .cache
            .component(node)
            .is_some_and(|c| c.model().get("containedForm").is_some_and(|v| !v.is_null()));
        if !has_contained_form && !self.cache.children(node).is_empty() {
            self.cache.remove_descendants_from_lookups(node);
            for child in self.cache.children(node).to_vec() {
                self.cache.discard(child);
            }
            self.report.render_ghosts = true;
        }
    }

    /// The form embedded by a form component changed: drop containers the
    /// batch no longer reports and move the reported children in place.
    fn rehome_form_component_children(&mut self, node: NodeId, fixed: &str, responsive: bool) {
        let batch = self.batch;
        let was_responsive = self.cache.node(node).and_then(Node::as_form_component).is_some_and(|fc| fc.responsive);
        if was_responsive {
            for child in self.cache.children(node).to_vec() {
                let Some(id) = self.cache.container_id(child).map(str::to_owned) else {
                    continue;
                };
                if !batch.has_parent_entry(&id) {
                    self.cache.remove_layout_container(&id);
                    self.cache.discard(child);
                }
            }
        }
        if let Some(fc) = self.cache.node_mut(node).and_then(Node::as_form_component_mut) {
            fc.responsive = responsive;
        }

        let prefix = format!("{fixed}$");
        for child_name in &batch.form_components_components {
            if !child_name.starts_with(&prefix) {
                continue;
            }
            let Some(child) = self.cache.get_component(child_name) else {
                continue;
            };
            if responsive {
                let container =
                    batch.parent_of(child_name).and_then(|uuid| self.cache.get_layout_container(uuid));
                if let Some(container) = container {
                    self.attach(container, child);
                }
            } else {
                self.attach(node, child);
            }
        }
    }

    fn update_properties(&mut self, node: NodeId, delta: &ComponentDelta) -> bool {
        let conv = self.conv;
        let Some(component) = self.cache.component_mut(node) else {
            return false;
        };
        component.layout.clone_from(&delta.position);
        component.update_properties(&delta.model, conv)
    }

    // =========================================================================
    // DELETIONS
    // =========================================================================

    fn deletions(&mut self) {
        let batch = self.batch;
        let mut to_delete: Vec<String> = Vec::new();
        if let Some(updated) = &batch.updated_form_components_design_id {
            for design_id in updated {
                let fc_name = design_id.strip_prefix('_').unwrap_or(design_id).replace('_', "-");
                let fc = self.cache.get_form_component(&fc_name);
                let prefix = format!("{design_id}$");
                let stale: Vec<String> = self
                    .cache
                    .component_names()
                    .into_iter()
                    .filter(|name| name.starts_with(&prefix) && !batch.is_form_component_child(name))
                    .collect();
                if let Some(fc) = fc {
                    for name in &stale {
                        if let Some(child) = self.cache.get_component(name) {
                            self.cache.remove_child(fc, child);
                        }
                    }
                }
                to_delete.extend(stale);
                self.report.render_ghosts = true;
            }
        }
        if let Some(deleted) = &batch.deleted {
            to_delete.extend(deleted.iter().cloned());
        }

        if !to_delete.is_empty() {
            for name in &to_delete {
                let removed = self
                    .cache
                    .remove_component(name)
                    .or_else(|| self.cache.remove_form_component(name));
                match removed {
                    Some(node) => self.cache.discard(node),
                    None => debug!(form = self.cache.formname(), name = %name, "deleted element not in cache"),
                }
            }
            self.report.refresh = true;
            self.report.redraw_decorators = true;
        }

        if let Some(containers) = &batch.deleted_containers {
            for id in containers {
                if let Some(node) = self.cache.remove_layout_container(id) {
                    self.cache.discard(node);
                }
            }
            self.report.refresh = true;
            self.report.redraw_decorators = true;
        }
    }

    // =========================================================================
    // ORDERING
    // =========================================================================

    fn finish(&mut self) {
        let batch = self.batch;
        if self.reorder_parts {
            self.cache.sort_part_components(self.sort_mode);
        }

        for node in std::mem::take(&mut self.orphans) {
            if !self.cache.contains(node) {
                continue;
            }
            let Some(id) = self.cache.container_id(node).map(str::to_owned) else {
                continue;
            };
            let Some(parent_uuid) = batch.parent_of(&id) else {
                continue;
            };
            match self.cache.attach_to(parent_uuid, node) {
                Ok(parent) => self.queue_reorder(parent),
                Err(CacheError::UnresolvedParent(parent)) => self.drop_orphan(&id, &parent),
                Err(e) => self.skip(&e),
            }
        }

        for node in std::mem::take(&mut self.reorder) {
            if self.cache.contains(node) {
                self.cache.sort_children(node, self.sort_mode);
            }
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn new_component(delta: &ComponentDelta, conv: &Converter<'_>) -> ComponentCache {
    ComponentCache::new(&delta.name, &delta.spec_name, delta.handlers.clone(), delta.position.clone(), conv.registry())
}

/// Design id of a form component: `-` becomes `_`, and a leading digit gets a `_` prefix.
#[must_use]
pub fn fix_form_component_name(name: &str) -> String {
    let fixed = name.replace('-', "_");
    if fixed.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{fixed}")
    } else {
        fixed
    }
}

/// Layout of an anchored form component placed in its parent form.
///
/// `minHeight`/`minWidth` win over the deprecated `height`/`width`; without
/// either, the contained form's own size is used. Inside a responsive form
/// an explicit width also floats the component left so several can share a
/// row.
#[must_use]
pub fn form_component_layout(model: &Map<String, Value>, containing_form_responsive: bool) -> Layout {
    let contained = model.get("containedForm").filter(|v| !v.is_null());
    let pick = |preferred: &str, fallback: &str| match model.get(preferred) {
        Some(v) if !v.is_null() => Some(v),
        _ => model.get(fallback),
    };

    let mut min_height = pick("minHeight", "height").filter(|v| truthy(v));
    if min_height.is_none() {
        min_height = contained.and_then(|f| f.get("formHeight"));
    }
    let mut min_width = pick("minWidth", "width").filter(|v| truthy(v));
    let width_explicitly_set = min_width.is_some() || contained.is_none();
    if min_width.is_none() {
        min_width = contained.and_then(|f| f.get("formWidth"));
    }

    let mut layout = Layout::new();
    if let Some(height) = min_height.filter(|v| truthy(v)) {
        layout.insert("min-height".to_owned(), Value::String(px(height)));
        if !containing_form_responsive {
            layout.insert("height".to_owned(), Value::String("100%".to_owned()));
        }
    }
    if let Some(width) = min_width.filter(|v| truthy(v)) {
        layout.insert("min-width".to_owned(), Value::String(px(width)));
        if containing_form_responsive && width_explicitly_set {
            layout.insert("float".to_owned(), Value::String("left".to_owned()));
        }
    }
    layout
}

fn style_classes(model: &Map<String, Value>) -> Vec<String> {
    model
        .get("styleClass")
        .and_then(Value::as_str)
        .map(|s| s.split_whitespace().map(str::to_owned).collect())
        .unwrap_or_default()
}

fn servoy_attributes(model: &Map<String, Value>) -> BTreeMap<String, String> {
    model
        .get("servoyAttributes")
        .and_then(Value::as_object)
        .map(|attrs| {
            attrs
                .iter()
                .map(|(k, v)| (k.clone(), v.as_str().map_or_else(|| v.to_string(), str::to_owned)))
                .collect()
        })
        .unwrap_or_default()
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn px(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{s}px"),
        other => format!("{other}px"),
    }
}
