#![allow(clippy::float_cmp)]

use super::*;
use crate::scene::ElementBox;

fn thresholds() -> SnapThresholds {
    SnapThresholds { alignment: 5.0, distance: 5.0 }
}

/// Siblings `a` (left 100) and `b` (left 200), and `d` being dragged far below them.
fn two_siblings_with_dragged_at(left: f64) -> Scene {
    let mut scene = Scene::new();
    scene.load_snapshot(vec![
        ElementBox::new("a", Rect::new(100.0, 0.0, 40.0, 20.0)),
        ElementBox::new("b", Rect::new(200.0, 0.0, 40.0, 20.0)),
        ElementBox::new("d", Rect::new(left, 200.0, 100.0, 30.0)),
    ]);
    scene
}

fn snap_dragged_at(left: f64) -> Option<SnapProperties> {
    let scene = two_siblings_with_dragged_at(left);
    let mut guides = DynamicGuides::new(thresholds());
    guides.snap_target(&scene, Point::new(left + 10.0, 210.0), None, None)
}

// =============================================================================
// Thresholds
// =============================================================================

#[test]
fn thresholds_from_wire_values() {
    let t = SnapThresholds::from(SnapThresholdValues { alignment: 7, distance: 12 });
    assert_eq!(t, SnapThresholds { alignment: 7.0, distance: 12.0 });
}

#[test]
fn set_thresholds_replaces_both() {
    let mut guides = DynamicGuides::default();
    guides.set_thresholds(thresholds());
    assert_eq!(guides.thresholds(), thresholds());
}

// =============================================================================
// Edge snapping
// =============================================================================

#[test]
fn left_edge_within_threshold_snaps_to_sibling() {
    for left in [95.0, 97.5, 100.0, 103.0, 105.0] {
        let props = snap_dragged_at(left).expect("snapped");
        assert_eq!(props.left, 100.0, "dragged left {left}");
        assert_eq!(props.css_position["left"], SnapTarget { uuid: "a".into(), prop: None });
        assert_eq!(props.guides.len(), 1);
        assert_eq!(props.guides[0].style, GuideStyle::Snap);
        assert_eq!(props.guides[0].x, 100.0);
    }
}

#[test]
fn left_edge_outside_threshold_produces_no_guide() {
    for left in [94.0, 106.0] {
        assert!(snap_dragged_at(left).is_none(), "dragged left {left}");
    }
}

#[test]
fn snap_guide_spans_from_sibling_to_dragged_bottom() {
    let props = snap_dragged_at(103.0).expect("snapped");
    let guide = props.guides[0];
    assert_eq!((guide.x, guide.y, guide.width, guide.height), (100.0, 0.0, 1.0, 230.0));
}

#[test]
fn guide_runs_down_when_sibling_is_below() {
    let mut scene = Scene::new();
    scene.load_snapshot(vec![
        ElementBox::new("below", Rect::new(100.0, 300.0, 40.0, 20.0)),
        ElementBox::new("d", Rect::new(102.0, 100.0, 30.0, 30.0)),
    ]);
    let mut guides = DynamicGuides::new(thresholds());
    let props = guides.snap_target(&scene, Point::new(110.0, 110.0), None, None).expect("snapped");
    let guide = props.guides[0];
    assert_eq!((guide.x, guide.y, guide.height), (100.0, 100.0, 200.0));
}

#[test]
fn left_edge_snaps_to_sibling_right_edge() {
    let mut scene = Scene::new();
    scene.load_snapshot(vec![
        ElementBox::new("a", Rect::new(0.0, 0.0, 100.0, 20.0)),
        ElementBox::new("d", Rect::new(103.0, 200.0, 50.0, 30.0)),
    ]);
    let mut guides = DynamicGuides::new(thresholds());
    let props = guides.snap_target(&scene, Point::new(110.0, 210.0), None, None).expect("snapped");
    assert_eq!(props.left, 100.0);
    assert_eq!(props.css_position["left"], SnapTarget { uuid: "a".into(), prop: Some("right".into()) });
}

#[test]
fn right_edge_snap_moves_left_by_width() {
    let mut scene = Scene::new();
    scene.load_snapshot(vec![
        ElementBox::new("a", Rect::new(0.0, 0.0, 200.0, 20.0)),
        ElementBox::new("d", Rect::new(148.0, 200.0, 50.0, 30.0)),
    ]);
    let mut guides = DynamicGuides::new(thresholds());
    let props = guides.snap_target(&scene, Point::new(160.0, 210.0), None, None).expect("snapped");
    assert_eq!(props.left, 150.0);
    assert_eq!(props.css_position["right"], SnapTarget { uuid: "a".into(), prop: None });
    assert_eq!(props.guides[0].x, 200.0);
}

#[test]
fn middle_snap_centers_on_sibling() {
    let mut scene = Scene::new();
    scene.load_snapshot(vec![
        ElementBox::new("a", Rect::new(0.0, 0.0, 200.0, 20.0)),
        ElementBox::new("d", Rect::new(77.0, 200.0, 50.0, 30.0)),
    ]);
    let mut guides = DynamicGuides::new(thresholds());
    let props = guides.snap_target(&scene, Point::new(90.0, 210.0), None, None).expect("snapped");
    assert_eq!(props.left, 75.0);
    assert!(props.css_position.contains_key("middleH"));
    assert_eq!(props.guides[0].x, 100.0);
}

#[test]
fn top_edge_snaps_and_draws_horizontal_guide() {
    let mut scene = Scene::new();
    scene.load_snapshot(vec![
        ElementBox::new("a", Rect::new(0.0, 100.0, 40.0, 20.0)),
        ElementBox::new("d", Rect::new(300.0, 97.0, 50.0, 50.0)),
    ]);
    let mut guides = DynamicGuides::new(thresholds());
    let props = guides.snap_target(&scene, Point::new(310.0, 110.0), None, None).expect("snapped");
    assert_eq!(props.top, 100.0);
    assert_eq!(props.css_position["top"], SnapTarget { uuid: "a".into(), prop: None });
    let guide = props.guides[0];
    assert_eq!((guide.x, guide.y, guide.width, guide.height), (0.0, 100.0, 350.0, 1.0));
}

#[test]
fn bottom_edge_snap_moves_top_by_height() {
    let mut scene = Scene::new();
    scene.load_snapshot(vec![
        ElementBox::new("a", Rect::new(0.0, 100.0, 40.0, 100.0)),
        ElementBox::new("d", Rect::new(300.0, 152.0, 50.0, 50.0)),
    ]);
    let mut guides = DynamicGuides::new(thresholds());
    let props = guides.snap_target(&scene, Point::new(310.0, 160.0), None, None).expect("snapped");
    assert_eq!(props.top, 150.0);
    assert!(props.css_position.contains_key("bottom"));
}

// =============================================================================
// Resizing
// =============================================================================

#[test]
fn resizing_east_edge_adjusts_width() {
    let mut scene = Scene::new();
    scene.load_snapshot(vec![
        ElementBox::new("s", Rect::new(150.0, 0.0, 248.0, 20.0)),
        ElementBox::new("d", Rect::new(300.0, 200.0, 100.0, 50.0)),
    ]);
    let mut guides = DynamicGuides::new(thresholds());
    let props = guides
        .snap_target(&scene, Point::new(397.0, 220.0), Some(ResizeAnchor::E), None)
        .expect("snapped");
    assert_eq!(props.left, 300.0);
    assert_eq!(props.width, Some(98.0));
    assert!(props.height.is_none());
    assert_eq!(props.css_position["right"], SnapTarget { uuid: "s".into(), prop: None });
    let guide = props.guides[0];
    assert_eq!((guide.x, guide.y, guide.height), (398.0, 0.0, 250.0));
}

#[test]
fn resizing_west_edge_adjusts_left_and_width() {
    let mut scene = Scene::new();
    scene.load_snapshot(vec![
        ElementBox::new("t", Rect::new(298.0, 0.0, 50.0, 20.0)),
        ElementBox::new("d", Rect::new(300.0, 200.0, 100.0, 50.0)),
    ]);
    let mut guides = DynamicGuides::new(thresholds());
    let props = guides
        .snap_target(&scene, Point::new(302.0, 220.0), Some(ResizeAnchor::W), None)
        .expect("snapped");
    assert_eq!(props.left, 298.0);
    assert_eq!(props.width, Some(102.0));
}

#[test]
fn resizing_south_ignores_horizontal_edges() {
    let mut scene = Scene::new();
    scene.load_snapshot(vec![
        ElementBox::new("t", Rect::new(300.0, 0.0, 50.0, 252.0)),
        ElementBox::new("d", Rect::new(300.0, 200.0, 100.0, 50.0)),
    ]);
    let mut guides = DynamicGuides::new(thresholds());
    let props = guides
        .snap_target(&scene, Point::new(320.0, 249.0), Some(ResizeAnchor::S), None)
        .expect("snapped");
    assert_eq!(props.top, 200.0);
    assert_eq!(props.height, Some(52.0));
    assert!(!props.css_position.contains_key("left"));
    assert_eq!(props.guides.len(), 1);
}

// =============================================================================
// Palette drops
// =============================================================================

#[test]
fn palette_item_uses_its_model_size_at_the_pointer() {
    let mut scene = Scene::new();
    scene.insert(ElementBox::new("a", Rect::new(100.0, 0.0, 40.0, 20.0)));
    let mut guides = DynamicGuides::new(thresholds());
    let props = guides
        .snap_target(&scene, Point::new(103.0, 200.0), None, Some(Size::new(100.0, 30.0)))
        .expect("snapped");
    assert_eq!(props.left, 100.0);
    assert_eq!(props.init_point, wire::WirePoint { x: 103.0, y: 200.0 });
}

#[test]
fn nothing_under_pointer_and_nothing_dragged_returns_the_pointer() {
    let mut scene = Scene::new();
    scene.insert(ElementBox::new("a", Rect::new(100.0, 0.0, 40.0, 20.0)));
    let mut guides = DynamicGuides::new(thresholds());
    let props = guides.snap_target(&scene, Point::new(500.0, 500.0), None, None).expect("plain");
    assert_eq!((props.left, props.top), (500.0, 500.0));
    assert!(props.guides.is_empty());
}

// =============================================================================
// Cache
// =============================================================================

#[test]
fn cache_is_built_lazily_and_cleared() {
    let scene = two_siblings_with_dragged_at(103.0);
    let mut guides = DynamicGuides::new(thresholds());
    assert!(!guides.is_cached());
    guides.snap_target(&scene, Point::new(113.0, 210.0), None, None);
    assert!(guides.is_cached());
    guides.clear();
    assert!(!guides.is_cached());
    assert_eq!(guides.thresholds(), thresholds());
}

#[test]
fn stale_cache_is_used_until_cleared() {
    let mut scene = two_siblings_with_dragged_at(103.0);
    let mut guides = DynamicGuides::new(thresholds());
    guides.snap_target(&scene, Point::new(113.0, 210.0), None, None);

    // `a` moves away, but the cached edge still answers.
    scene.set_rect("a", Rect::new(500.0, 0.0, 40.0, 20.0));
    let props = guides.snap_target(&scene, Point::new(113.0, 210.0), None, None).expect("cached");
    assert_eq!(props.left, 100.0);

    guides.clear();
    let props = guides.snap_target(&scene, Point::new(113.0, 210.0), None, None).expect("rebuilt");
    assert!(!props.css_position.contains_key("left"));
    assert_eq!(props.css_position["right"], SnapTarget { uuid: "b".into(), prop: Some("left".into()) });
}

#[test]
fn containers_and_invisible_elements_are_not_snap_targets() {
    let mut scene = Scene::new();
    let mut hidden = ElementBox::new("hidden", Rect::new(100.0, 0.0, 40.0, 20.0));
    hidden.visible = false;
    scene.load_snapshot(vec![
        ElementBox::container("row", Rect::new(100.0, 500.0, 40.0, 20.0)),
        hidden,
        ElementBox::new("d", Rect::new(102.0, 200.0, 100.0, 30.0)),
    ]);
    let mut guides = DynamicGuides::new(thresholds());
    assert!(guides.snap_target(&scene, Point::new(110.0, 210.0), None, None).is_none());
}

// =============================================================================
// Equal distance
// =============================================================================

fn stacked_scene(dragged_top: f64, extra: Option<ElementBox>) -> Scene {
    let mut elements = vec![
        ElementBox::new("a", Rect::new(0.0, 0.0, 100.0, 20.0)),
        ElementBox::new("b", Rect::new(0.0, 50.0, 100.0, 20.0)),
    ];
    elements.extend(extra);
    elements.push(ElementBox::new("d", Rect::new(0.0, dragged_top, 100.0, 20.0)));
    let mut scene = Scene::new();
    scene.load_snapshot(elements);
    scene
}

#[test]
fn equal_vertical_gap_below_a_pair() {
    let scene = stacked_scene(102.0, None);
    let mut guides = DynamicGuides::new(thresholds());
    let props = guides.snap_target(&scene, Point::new(10.0, 110.0), None, None).expect("snapped");

    assert_eq!(props.top, 100.0);
    assert_eq!(props.left, 0.0);
    let dist: Vec<&Guide> = props.guides.iter().filter(|g| g.style == GuideStyle::Dist).collect();
    assert_eq!(dist.len(), 6);
    // Ticks end 15px past the rightmost edge, measure lines sit 10px beyond it.
    assert_eq!((dist[0].x, dist[0].y, dist[0].width), (100.0, 20.0, 15.0));
    assert_eq!((dist[1].x, dist[1].y, dist[1].height), (110.0, 20.0, 30.0));
    assert_eq!((dist[4].x, dist[4].y, dist[4].height), (110.0, 70.0, 30.0));
    assert_eq!((dist[5].x, dist[5].y), (100.0, 100.0));
}

#[test]
fn equal_gap_outside_distance_threshold_is_ignored() {
    let scene = stacked_scene(110.0, None);
    let mut guides = DynamicGuides::new(thresholds());
    let props = guides.snap_target(&scene, Point::new(10.0, 115.0), None, None).expect("left edge still snaps");
    assert!(props.guides.iter().all(|g| g.style == GuideStyle::Snap));
    assert_eq!(props.top, 115.0);
}

#[test]
fn equal_gap_drops_the_vertical_edge_guide() {
    let extra = ElementBox::new("c", Rect::new(400.0, 100.0, 50.0, 20.0));
    let scene = stacked_scene(102.0, Some(extra));
    let mut guides = DynamicGuides::new(thresholds());
    let props = guides.snap_target(&scene, Point::new(10.0, 110.0), None, None).expect("snapped");

    assert_eq!(props.top, 100.0);
    assert_eq!(props.css_position["top"].uuid, "c");
    let snaps: Vec<&Guide> = props.guides.iter().filter(|g| g.style == GuideStyle::Snap).collect();
    assert_eq!(snaps.len(), 1);
    assert_eq!(snaps[0].width, 1.0);
}

#[test]
fn equal_horizontal_gap_between_a_pair() {
    let mut scene = Scene::new();
    scene.load_snapshot(vec![
        ElementBox::new("l", Rect::new(0.0, 300.0, 50.0, 20.0)),
        ElementBox::new("r", Rect::new(250.0, 300.0, 50.0, 20.0)),
        ElementBox::new("d", Rect::new(143.0, 290.0, 10.0, 20.0)),
    ]);
    let mut guides = DynamicGuides::new(thresholds());
    let props = guides.snap_target(&scene, Point::new(145.0, 295.0), None, None).expect("snapped");
    // Gap between the pair is 200; centered, the dragged box starts at 145.
    assert_eq!(props.left, 145.0);
    assert_eq!(props.guides.iter().filter(|g| g.style == GuideStyle::Dist).count(), 6);
}

#[test]
fn resizing_never_computes_equal_distance() {
    let scene = stacked_scene(102.0, None);
    let mut guides = DynamicGuides::new(thresholds());
    let props = guides.snap_target(&scene, Point::new(2.0, 110.0), Some(ResizeAnchor::W), None);
    let props = props.expect("left edge snaps while resizing");
    assert!(props.guides.iter().all(|g| g.style == GuideStyle::Snap));
}
