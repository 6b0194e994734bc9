use convert::TypesRegistry;
use serde_json::json;

use super::*;

const BUTTON: &str = "servoydefault-button";

fn registry() -> TypesRegistry {
    let mut registry = TypesRegistry::new();
    registry.add_component_specification(
        BUTTON,
        &json!({"p": {"text": "string", "size": "dimension", "location": "point"}}),
    );
    registry
}

fn batch(value: Value) -> DesignBatch {
    serde_json::from_value(value).expect("batch")
}

fn model(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("not a model: {other}"),
    }
}

fn responsive() -> FormCache {
    FormCache::new("orders", Dimension { width: 640, height: 480 }, true)
}

fn absolute() -> FormCache {
    FormCache::new("orders", Dimension { width: 640, height: 480 }, false)
}

fn container_ids(cache: &FormCache, parent: NodeId) -> Vec<String> {
    cache
        .children(parent)
        .iter()
        .filter_map(|c| cache.container_id(*c))
        .map(str::to_owned)
        .collect()
}

#[derive(Debug, Default)]
struct Recorder {
    calls: Vec<String>,
}

impl DesignFormCallbacks for Recorder {
    fn render_ghosts(&mut self) {
        self.calls.push("render_ghosts".to_owned());
    }

    fn refresh(&mut self) {
        self.calls.push("refresh".to_owned());
    }

    fn redraw_decorators(&mut self) {
        self.calls.push("redraw_decorators".to_owned());
    }

    fn update_form(&mut self, width: i64, height: i64) {
        self.calls.push(format!("update_form {width}x{height}"));
    }

    fn content_refresh(&mut self) {
        self.calls.push("content_refresh".to_owned());
    }
}

struct Harness {
    registry: TypesRegistry,
    reconciler: Reconciler,
    recorder: Recorder,
}

impl Harness {
    fn new() -> Self {
        Self { registry: registry(), reconciler: Reconciler::default(), recorder: Recorder::default() }
    }

    fn apply(&mut self, cache: &mut FormCache, value: Value) -> ReconcileReport {
        self.recorder.calls.clear();
        let conv = Converter::new(&self.registry);
        self.reconciler.update_form_data(cache, &batch(value), &mut self.recorder, &conv)
    }
}

/// row1 > col1 > btn, all in one batch.
fn responsive_tree(h: &mut Harness, cache: &mut FormCache) {
    h.apply(
        cache,
        json!({
            "ng2containers": [
                {"tagname": "div", "attributes": {"svy-id": "row1"}},
                {"tagname": "div", "attributes": {"svy-id": "col1"}}
            ],
            "ng2components": [{"name": "btn", "type": BUTTON, "model": {"text": "hi"}}],
            "childParentMap": {"row1": {}, "col1": {"uuid": "row1"}, "btn": {"uuid": "col1"}}
        }),
    );
}

// =============================================================================
// Creation
// =============================================================================

#[test]
fn batch_builds_the_responsive_tree() {
    let mut h = Harness::new();
    let mut cache = responsive();
    responsive_tree(&mut h, &mut cache);

    let main = cache.main_structure().expect("main structure");
    let row1 = cache.get_layout_container("row1").expect("row1");
    let col1 = cache.get_layout_container("col1").expect("col1");
    let btn = cache.get_component("btn").expect("btn");

    assert_eq!(cache.children(main), [row1]);
    assert_eq!(cache.children(row1), [col1]);
    assert_eq!(cache.children(col1), [btn]);
    assert_eq!(cache.component(btn).map(|c| c.property_json("text")), Some(json!("hi")));
    assert_eq!(h.recorder.calls, ["refresh", "redraw_decorators"]);
}

#[test]
fn children_arriving_before_their_parent_are_resolved() {
    let mut h = Harness::new();
    let mut cache = responsive();
    let report = h.apply(
        &mut cache,
        json!({
            "ng2containers": [
                {"tagname": "div", "attributes": {"svy-id": "col1"}},
                {"tagname": "div", "attributes": {"svy-id": "row1"}}
            ],
            "childParentMap": {"col1": {"uuid": "row1"}, "row1": {}}
        }),
    );

    let row1 = cache.get_layout_container("row1").expect("row1");
    assert_eq!(container_ids(&cache, row1), ["col1"]);
    assert_eq!(report.orphans_dropped, 0);
}

#[test]
fn resolved_orphans_sort_by_priority() {
    let mut h = Harness::new();
    let mut cache = responsive();
    h.apply(
        &mut cache,
        json!({
            "ng2containers": [
                {"tagname": "div", "attributes": {"svy-id": "c2", "svy-priority": "2"}},
                {"tagname": "div", "attributes": {"svy-id": "c1", "svy-priority": "1"}},
                {"tagname": "div", "attributes": {"svy-id": "row1"}}
            ],
            "childParentMap": {"c1": {"uuid": "row1"}, "c2": {"uuid": "row1"}, "row1": {}}
        }),
    );

    let row1 = cache.get_layout_container("row1").expect("row1");
    assert_eq!(container_ids(&cache, row1), ["c1", "c2"]);
}

#[test]
fn orphans_without_a_parent_are_dropped_and_counted() {
    let mut h = Harness::new();
    let mut cache = responsive();
    let report = h.apply(
        &mut cache,
        json!({
            "ng2containers": [{"tagname": "div", "attributes": {"svy-id": "col1"}}],
            "ng2components": [{"name": "btn", "type": BUTTON}],
            "childParentMap": {"col1": {"uuid": "ghost"}, "btn": {"uuid": "ghost"}}
        }),
    );

    assert_eq!(report.orphans_dropped, 2);
    assert_eq!(h.reconciler.orphans_dropped(), 2);
    let col1 = cache.get_layout_container("col1").expect("col1 stays registered");
    assert_eq!(cache.parent(col1), None);
}

#[test]
fn top_level_components_of_absolute_forms_sort_by_priority() {
    let mut h = Harness::new();
    let mut cache = absolute();
    h.apply(
        &mut cache,
        json!({
            "ng2components": [
                {"name": "b", "type": BUTTON, "model": {"servoyAttributes": {"svy-priority": "2"}}},
                {"name": "a", "type": BUTTON, "model": {"servoyAttributes": {"svy-priority": "1"}}},
                {"name": "n", "type": BUTTON}
            ]
        }),
    );

    let names: Vec<&str> = cache
        .part_components()
        .iter()
        .filter_map(|id| cache.component(*id))
        .map(ComponentCache::name)
        .collect();
    assert_eq!(names, ["a", "b", "n"]);
}

#[test]
fn containers_sort_by_priority() {
    let mut h = Harness::new();
    let mut cache = responsive();
    h.apply(
        &mut cache,
        json!({
            "ng2containers": [
                {"tagname": "div", "attributes": {"svy-id": "second", "svy-priority": "2"}},
                {"tagname": "div", "attributes": {"svy-id": "first", "svy-priority": "1"}}
            ],
            "childParentMap": {"second": {}, "first": {}}
        }),
    );

    let main = cache.main_structure().expect("main structure");
    assert_eq!(container_ids(&cache, main), ["first", "second"]);
}

// =============================================================================
// Updates
// =============================================================================

#[test]
fn moved_container_is_reparented() {
    let mut h = Harness::new();
    let mut cache = responsive();
    responsive_tree(&mut h, &mut cache);
    h.apply(
        &mut cache,
        json!({
            "ng2containers": [{"tagname": "div", "attributes": {"svy-id": "row2"}}],
            "childParentMap": {"row2": {}}
        }),
    );

    h.apply(
        &mut cache,
        json!({
            "ng2containers": [{"tagname": "div", "styleclass": ["col-6"], "attributes": {"svy-id": "col1"}}],
            "childParentMap": {"col1": {"uuid": "row2"}}
        }),
    );

    let row1 = cache.get_layout_container("row1").expect("row1");
    let row2 = cache.get_layout_container("row2").expect("row2");
    let col1 = cache.get_layout_container("col1").expect("col1");
    assert!(cache.children(row1).is_empty());
    assert_eq!(container_ids(&cache, row2), ["col1"]);
    assert_eq!(cache.node(col1).and_then(Node::as_structure).map(|s| s.classes.clone()), Some(vec!["col-6".to_owned()]));
}

#[test]
fn moved_component_follows_the_child_parent_map() {
    let mut h = Harness::new();
    let mut cache = responsive();
    responsive_tree(&mut h, &mut cache);

    let report = h.apply(
        &mut cache,
        json!({
            "ng2components": [{"name": "btn", "type": BUTTON, "model": {"text": "hi"}}],
            "childParentMap": {"btn": {"uuid": "row1"}}
        }),
    );

    let row1 = cache.get_layout_container("row1").expect("row1");
    let col1 = cache.get_layout_container("col1").expect("col1");
    let btn = cache.get_component("btn").expect("btn");
    assert!(cache.children(col1).is_empty());
    assert_eq!(cache.parent(btn), Some(row1));
    assert!(report.redraw_decorators);
}

#[test]
fn only_geometry_changes_redraw_decorators() {
    let mut h = Harness::new();
    let mut cache = absolute();
    let component = |text: &str, width: i64| {
        json!({"ng2components": [{"name": "btn", "type": BUTTON, "model": {"text": text, "size": {"width": width, "height": 20}}}]})
    };
    h.apply(&mut cache, component("a", 80));

    let text_only = h.apply(&mut cache, component("b", 80));
    assert!(text_only.refresh);
    assert!(!text_only.redraw_decorators);
    assert_eq!(h.recorder.calls, ["refresh"]);

    let resized = h.apply(&mut cache, component("b", 120));
    assert!(resized.redraw_decorators);
}

// =============================================================================
// Deletions
// =============================================================================

#[test]
fn signals_fire_once_per_batch() {
    let mut h = Harness::new();
    let mut cache = absolute();
    h.apply(&mut cache, json!({"ng2components": [{"name": "old", "type": BUTTON}]}));

    let report = h.apply(
        &mut cache,
        json!({
            "ng2components": [{"name": "new", "type": BUTTON}],
            "deleted": ["old"]
        }),
    );

    assert_eq!(h.recorder.calls, ["refresh", "redraw_decorators"]);
    assert!(!report.render_ghosts);
    assert_eq!(cache.get_component("old"), None);
    assert!(cache.get_component("new").is_some());
}

#[test]
fn deleting_a_container_deletes_its_subtree() {
    let mut h = Harness::new();
    let mut cache = responsive();
    responsive_tree(&mut h, &mut cache);
    let btn = cache.get_component("btn").expect("btn");

    h.apply(&mut cache, json!({"deletedContainers": ["row1"]}));

    let main = cache.main_structure().expect("main structure");
    assert!(cache.children(main).is_empty());
    assert_eq!(cache.get_layout_container("col1"), None);
    assert_eq!(cache.get_component("btn"), None);
    assert!(!cache.contains(btn));
    assert_eq!(h.recorder.calls, ["refresh", "redraw_decorators"]);
}

#[test]
fn deleting_an_unknown_element_is_harmless() {
    let mut h = Harness::new();
    let mut cache = absolute();
    let report = h.apply(&mut cache, json!({"deleted": ["ghost"]}));
    assert_eq!(report.skipped, 0);
    assert!(cache.is_empty());
}

// =============================================================================
// Form components
// =============================================================================

/// Form component `fc-1` embedding a form with one button.
fn form_component_batch() -> Value {
    json!({
        "ng2components": [
            {
                "name": "fc-1",
                "type": "servoycoreFormcomponent",
                "model": {"containedForm": {"formHeight": 200, "formWidth": 300}, "styleClass": "a b"}
            },
            {"name": "fc_1$btn", "type": BUTTON}
        ],
        "updatedFormComponentsDesignId": ["fc_1"],
        "formComponentsComponents": ["fc_1$btn"]
    })
}

#[test]
fn form_component_takes_the_contained_form_layout() {
    let mut h = Harness::new();
    let mut cache = absolute();
    h.apply(&mut cache, form_component_batch());

    let fc = cache.get_form_component("fc-1").expect("form component");
    let child = cache.get_component("fc_1$btn").expect("child");
    let properties = &cache.node(fc).and_then(Node::as_form_component).expect("fc node").properties;

    assert_eq!(properties.classes, ["a", "b"]);
    assert_eq!(
        serde_json::to_value(&properties.layout).expect("layout"),
        json!({"min-height": "200px", "height": "100%", "min-width": "300px"})
    );
    assert_eq!(cache.children(fc), [child]);
    assert!(!cache.part_components().contains(&child));
}

#[test]
fn stale_form_component_children_are_deleted() {
    let mut h = Harness::new();
    let mut cache = absolute();
    h.apply(&mut cache, form_component_batch());

    let report = h.apply(
        &mut cache,
        json!({"updatedFormComponentsDesignId": ["fc_1"], "formComponentsComponents": []}),
    );

    let fc = cache.get_form_component("fc-1").expect("form component");
    assert!(cache.children(fc).is_empty());
    assert_eq!(cache.get_component("fc_1$btn"), None);
    assert!(report.render_ghosts);
    assert_eq!(h.recorder.calls, ["render_ghosts", "refresh", "redraw_decorators"]);
}

#[test]
fn form_component_without_contained_form_loses_its_children() {
    let mut h = Harness::new();
    let mut cache = absolute();
    h.apply(&mut cache, form_component_batch());

    let report = h.apply(
        &mut cache,
        json!({"ng2components": [{"name": "fc-1", "type": "servoycoreFormcomponent", "model": {}}]}),
    );

    let fc = cache.get_form_component("fc-1").expect("form component");
    assert!(cache.children(fc).is_empty());
    assert_eq!(cache.get_component("fc_1$btn"), None);
    assert!(report.render_ghosts);
}

#[test]
fn form_component_names_become_design_ids() {
    assert_eq!(fix_form_component_name("fc-1"), "fc_1");
    assert_eq!(fix_form_component_name("1-abc"), "_1_abc");
    assert_eq!(fix_form_component_name("plain"), "plain");
}

#[test]
fn responsive_parent_floats_explicitly_sized_form_components() {
    let explicit = form_component_layout(&model(json!({"minWidth": 120, "minHeight": 50})), true);
    assert_eq!(
        serde_json::to_value(&explicit).expect("layout"),
        json!({"min-height": "50px", "min-width": "120px", "float": "left"})
    );

    let from_form = form_component_layout(&model(json!({"containedForm": {"formWidth": 300, "formHeight": 0}})), true);
    assert_eq!(serde_json::to_value(&from_form).expect("layout"), json!({"min-width": "300px"}));
}

#[test]
fn deprecated_size_is_used_when_min_size_is_missing() {
    let layout = form_component_layout(&model(json!({"width": 90, "height": 40})), false);
    assert_eq!(
        serde_json::to_value(&layout).expect("layout"),
        json!({"min-height": "40px", "height": "100%", "min-width": "90px"})
    );
}

// =============================================================================
// Signals and options
// =============================================================================

#[test]
fn ignored_forms_are_left_alone() {
    let mut h = Harness::new();
    let mut cache = FormCache::new("VariantsForm", Dimension::default(), false);
    let report = h.apply(&mut cache, json!({"ng2components": [{"name": "btn", "type": BUTTON}]}));

    assert_eq!(report, ReconcileReport::default());
    assert!(h.recorder.calls.is_empty());
    assert!(cache.is_empty());
}

#[test]
fn render_ghosts_from_the_batch_is_forwarded() {
    let mut h = Harness::new();
    let mut cache = absolute();
    h.apply(&mut cache, json!({"renderGhosts": true}));
    assert_eq!(h.recorder.calls, ["render_ghosts"]);
}

#[test]
fn form_resize_updates_the_cache() {
    let mut h = Harness::new();
    let mut cache = absolute();
    h.reconciler.update_form(&mut cache, &mut h.recorder, 800, 600);
    h.reconciler.content_refresh(&mut h.recorder);

    assert_eq!(cache.size, Dimension { width: 800, height: 600 });
    assert_eq!(h.recorder.calls, ["update_form 800x600", "content_refresh"]);
}
