#![allow(clippy::float_cmp)]

use super::*;

// =============================================================================
// Point
// =============================================================================

#[test]
fn point_from_wire_and_back() {
    let wire = WirePoint { x: 3.0, y: 4.0 };
    let p = Point::from(wire);
    assert_eq!(p, Point::new(3.0, 4.0));
    assert_eq!(WirePoint::from(p), wire);
}

// =============================================================================
// Rect edges
// =============================================================================

#[test]
fn rect_edges_and_centers() {
    let r = Rect::new(10.0, 20.0, 100.0, 40.0);
    assert_eq!(r.left(), 10.0);
    assert_eq!(r.top(), 20.0);
    assert_eq!(r.right(), 110.0);
    assert_eq!(r.bottom(), 60.0);
    assert_eq!(r.center_x(), 60.0);
    assert_eq!(r.center_y(), 40.0);
}

#[test]
fn spanning_normalizes_corner_order() {
    let r = Rect::spanning(Point::new(50.0, 10.0), Point::new(20.0, 30.0));
    assert_eq!(r, Rect::new(20.0, 10.0, 30.0, 20.0));
}

#[test]
fn corners_are_clockwise_from_top_left_then_bottom() {
    let r = Rect::new(0.0, 0.0, 10.0, 5.0);
    assert_eq!(
        r.corners(),
        [Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(0.0, 5.0), Point::new(10.0, 5.0)]
    );
}

#[test]
fn translate_keeps_size() {
    let r = Rect::new(1.0, 2.0, 3.0, 4.0).translate(10.0, -2.0);
    assert_eq!(r, Rect::new(11.0, 0.0, 3.0, 4.0));
}

// =============================================================================
// Containment
// =============================================================================

#[test]
fn contains_includes_border() {
    let r = Rect::new(0.0, 0.0, 10.0, 10.0);
    assert!(r.contains(Point::new(0.0, 0.0)));
    assert!(r.contains(Point::new(10.0, 10.0)));
    assert!(r.contains(Point::new(5.0, 5.0)));
    assert!(!r.contains(Point::new(10.5, 5.0)));
}

#[test]
fn contains_strictly_excludes_border() {
    let r = Rect::new(0.0, 0.0, 10.0, 10.0);
    assert!(!r.contains_strictly(Point::new(0.0, 5.0)));
    assert!(!r.contains_strictly(Point::new(10.0, 10.0)));
    assert!(r.contains_strictly(Point::new(5.0, 5.0)));
}

// =============================================================================
// Overlap
// =============================================================================

#[test]
fn overlap_on_x_checks_either_edge() {
    let dragged = Rect::new(50.0, 0.0, 20.0, 10.0);
    assert!(dragged.overlaps_on(&Rect::new(40.0, 100.0, 20.0, 10.0), Axis::X));
    assert!(dragged.overlaps_on(&Rect::new(65.0, 100.0, 20.0, 10.0), Axis::X));
    assert!(!dragged.overlaps_on(&Rect::new(100.0, 100.0, 20.0, 10.0), Axis::X));
}

#[test]
fn overlap_misses_a_wider_sibling_only_when_edges_outside() {
    // Both edges of the dragged rect fall inside the sibling.
    let dragged = Rect::new(50.0, 0.0, 20.0, 10.0);
    assert!(dragged.overlaps_on(&Rect::new(0.0, 0.0, 200.0, 10.0), Axis::X));
    // Sibling sits inside the dragged rect: neither dragged edge is inside it.
    let wide = Rect::new(0.0, 0.0, 200.0, 10.0);
    assert!(!wide.overlaps_on(&Rect::new(50.0, 0.0, 20.0, 10.0), Axis::X));
}

#[test]
fn overlap_on_y() {
    let dragged = Rect::new(0.0, 50.0, 10.0, 20.0);
    assert!(dragged.overlaps_on(&Rect::new(100.0, 60.0, 10.0, 30.0), Axis::Y));
    assert!(!dragged.overlaps_on(&Rect::new(100.0, 80.0, 10.0, 30.0), Axis::Y));
}

#[test]
fn rect_at_point_with_size() {
    let r = Rect::at(Point::new(5.0, 6.0), Size::new(7.0, 8.0));
    assert_eq!(r, Rect::new(5.0, 6.0, 7.0, 8.0));
}
