use serde_json::json;
use wire::Layout;

use super::*;
use crate::node::{FormComponentProperties, PRIORITY_ATTRIBUTE};

fn container(id: &str) -> StructureCache {
    let mut structure = StructureCache { tagname: Some("div".to_owned()), ..StructureCache::default() };
    structure.attributes.insert(wire::batch::SVY_ID.to_owned(), id.to_owned());
    structure
}

fn component(name: &str, spec_name: &str) -> ComponentCache {
    ComponentCache::new(name, spec_name, Vec::new(), Layout::new(), &TypesRegistry::new())
}

fn form_component(name: &str) -> FormComponentCache {
    FormComponentCache {
        component: component(name, "servoycore-formcomponent"),
        responsive: false,
        properties: FormComponentProperties::default(),
        has_foundset: false,
    }
}

/// main > row1 > col1 > btn
struct Tree {
    cache: FormCache,
    main: NodeId,
    row1: NodeId,
    col1: NodeId,
    btn: NodeId,
}

fn tree() -> Tree {
    let mut cache = FormCache::new("orders", Dimension { width: 640, height: 480 }, true);
    let main = cache.ensure_main_structure();
    let row1 = cache.add_layout_container(container("row1"));
    let col1 = cache.add_layout_container(container("col1"));
    cache.add_child(main, row1).expect("row1");
    cache.add_child(row1, col1).expect("col1");
    let btn = cache
        .add_component(component("btn", "servoydefault-button"), Some(col1))
        .expect("btn");
    Tree { cache, main, row1, col1, btn }
}

// =============================================================================
// Structure
// =============================================================================

#[test]
fn depth_counts_from_the_main_structure() {
    let t = tree();
    assert_eq!(t.cache.depth(t.main), -1);
    assert_eq!(t.cache.depth(t.row1), 0);
    assert_eq!(t.cache.depth(t.col1), 1);
    assert_eq!(t.cache.depth(t.btn), 2);
}

#[test]
fn attaching_detaches_from_the_previous_parent() {
    let mut t = tree();
    assert_eq!(t.cache.add_child(t.row1, t.btn), Ok(true));

    assert!(t.cache.children(t.col1).is_empty());
    assert_eq!(t.cache.children(t.row1), [t.col1, t.btn]);
    assert_eq!(t.cache.parent(t.btn), Some(t.row1));
}

#[test]
fn attaching_an_ancestor_below_its_descendant_is_refused() {
    let mut t = tree();
    assert_eq!(t.cache.add_child(t.col1, t.row1), Err(CacheError::Cycle { parent: t.col1, child: t.row1 }));
    assert_eq!(t.cache.add_child(t.row1, t.row1), Err(CacheError::Cycle { parent: t.row1, child: t.row1 }));
    assert_eq!(t.cache.parent(t.row1), Some(t.main));
}

#[test]
fn components_cannot_hold_children() {
    let mut t = tree();
    assert_eq!(t.cache.add_child(t.btn, t.col1), Err(CacheError::NotAContainer(t.btn)));
}

#[test]
fn attach_to_resolves_containers_and_form_components() {
    let mut cache = FormCache::new("orders", Dimension::default(), true);
    let row = cache.add_layout_container(container("row1"));
    let fc = cache.add_form_component(form_component("fc1"));
    let a = cache.add_component(component("a", "servoydefault-label"), None).expect("a");
    let b = cache.add_component(component("b", "servoydefault-label"), None).expect("b");

    assert_eq!(cache.attach_to("row1", a), Ok(row));
    assert_eq!(cache.attach_to("fc1", b), Ok(fc));
    assert_eq!(cache.attach_to("nope", b), Err(CacheError::UnresolvedParent("nope".to_owned())));
    assert_eq!(cache.parent(b), Some(fc));
}

#[test]
fn set_main_structure_registers_the_whole_subtree() {
    let mut t = tree();
    t.cache.remove_descendants_from_lookups(t.main);
    assert_eq!(t.cache.get_component("btn"), None);
    assert_eq!(t.cache.get_layout_container("col1"), None);

    t.cache.set_main_structure(t.main);

    assert_eq!(t.cache.get_component("btn"), Some(t.btn));
    assert_eq!(t.cache.get_layout_container("row1"), Some(t.row1));
    assert_eq!(t.cache.get_layout_container("col1"), Some(t.col1));
}

// =============================================================================
// Parts
// =============================================================================

#[test]
fn part_components_track_what_is_attached_to_parts() {
    let mut cache = FormCache::from_definition(&FormDefinition {
        name: "orders".to_owned(),
        parts: vec![PartDefinition { classes: vec!["body".to_owned()], layout: Layout::new() }],
        ..FormDefinition::default()
    });
    let body = cache.parts()[0];

    let label = cache
        .add_component(component("label", "servoydefault-label"), Some(body))
        .expect("label");
    let nav = cache
        .add_component(component("nav", "servoycore-navigator"), Some(body))
        .expect("nav");

    assert!(cache.is_absolute());
    assert_eq!(cache.part_components(), [label]);
    assert_eq!(cache.children(body), [label]);
    assert_eq!(cache.get_component("nav"), Some(nav));
    assert_eq!(cache.parent(nav), None);
}

// =============================================================================
// Removal
// =============================================================================

#[test]
fn removing_a_container_cascades_through_the_lookups() {
    let mut t = tree();
    let removed = t.cache.remove_layout_container("row1");

    assert_eq!(removed, Some(t.row1));
    assert_eq!(t.cache.get_layout_container("col1"), None);
    assert_eq!(t.cache.get_component("btn"), None);
    assert!(t.cache.contains(t.btn));
}

#[test]
fn discard_frees_the_subtree_and_its_lookups() {
    let mut t = tree();
    t.cache.discard(t.row1);

    assert!(t.cache.children(t.main).is_empty());
    assert!(!t.cache.contains(t.row1));
    assert!(!t.cache.contains(t.col1));
    assert!(!t.cache.contains(t.btn));
    assert_eq!(t.cache.get_component("btn"), None);
    assert_eq!(t.cache.get_layout_container("row1"), None);
    assert_eq!(t.cache.len(), 1);
    assert_eq!(t.cache.add_child(t.main, t.btn), Err(CacheError::UnknownNode(t.btn)));
}

#[test]
fn discarding_the_main_structure_resets_it() {
    let mut t = tree();
    t.cache.discard(t.main);

    assert_eq!(t.cache.main_structure(), None);
    assert!(t.cache.is_empty());
    let fresh = t.cache.ensure_main_structure();
    assert_ne!(fresh, t.main);
}

#[test]
fn form_component_lookup_falls_back_for_components() {
    let mut cache = FormCache::new("orders", Dimension::default(), false);
    let fc = cache.add_form_component(form_component("fc1"));

    assert_eq!(cache.get_component("fc1"), Some(fc));
    assert_eq!(cache.component_names(), Vec::<String>::new());
    assert_eq!(cache.remove_form_component("fc1"), Some(fc));
    assert_eq!(cache.get_component("fc1"), None);
}

// =============================================================================
// Ordering
// =============================================================================

#[test]
fn children_sort_by_priority_attribute() {
    let mut cache = FormCache::new("orders", Dimension::default(), true);
    let main = cache.ensure_main_structure();
    let mut ids = Vec::new();
    for (id, priority) in [("c", "3"), ("a", "1"), ("b", "2")] {
        let mut structure = container(id);
        structure.attributes.insert(PRIORITY_ATTRIBUTE.to_owned(), priority.to_owned());
        let node = cache.add_layout_container(structure);
        cache.add_child(main, node).expect("attach");
        ids.push(node);
    }

    cache.sort_children(main, SortMode::Stable);

    let order: Vec<&str> = cache.children(main).iter().filter_map(|c| cache.container_id(*c)).collect();
    assert_eq!(order, ["a", "b", "c"]);
}

// =============================================================================
// Types and snapshot
// =============================================================================

#[test]
fn client_side_type_goes_through_the_component() {
    let mut registry = TypesRegistry::new();
    registry.add_component_specification("servoydefault-button", &json!({"p": {"text": "string"}}));
    let mut cache = FormCache::new("orders", Dimension::default(), false);
    cache
        .add_component(ComponentCache::new("btn", "servoydefault-button", Vec::new(), Layout::new(), &registry), None)
        .expect("btn");

    assert_eq!(cache.client_side_type("btn", "text", &registry), Some(PropertyType::Primitive));
    assert_eq!(cache.client_side_type("btn", "other", &registry), None);
    assert_eq!(cache.client_side_type("missing", "text", &registry), None);
    assert!(cache.component_specification("btn", &registry).is_some());
}

#[test]
fn snapshot_renders_the_tree() {
    let t = tree();
    let snapshot = t.cache.snapshot();

    assert_eq!(snapshot["formname"], json!("orders"));
    assert_eq!(snapshot["size"], json!({"width": 640, "height": 480}));
    assert_eq!(snapshot["mainStructure"]["items"][0]["container"], json!("row1"));
    assert_eq!(snapshot["mainStructure"]["items"][0]["items"][0]["items"][0]["component"], json!("btn"));
    assert_eq!(
        snapshot["mainStructure"]["items"][0]["items"][0]["items"][0]["type"],
        json!("servoydefaultButton")
    );
}
