//! Snap guides for dragging and resizing components in an absolute form.
//!
//! DESIGN
//! ======
//! On the first snap query of a gesture the edges of every visible
//! component are read from the scene into six indexes (left, right, top,
//! bottom, horizontal middle, vertical middle), each sorted by coordinate.
//! Later queries reuse them until [`DynamicGuides::clear`] is called; the
//! host sends `clearSnapCache` when the gesture ends.
//!
//! A query snaps at most one horizontal and one vertical edge. For each axis
//! the first indexed sibling edge within the alignment threshold wins, the
//! dragged element itself excluded:
//!
//! - moving: the dragged element's start edge against sibling start then end
//!   edges, then its end edge against sibling end then start edges, then its
//!   middle against sibling middles
//! - resizing: only the edge under the knob, compared at the pointer, and
//!   the width or height is adjusted instead of the position
//!
//! While moving, equal-distance guides are also tried: when the dragged
//! element would leave the same gap to a pair of siblings as the pair
//! leaves between themselves (within the distance threshold), it is placed
//! at exactly that gap and the edge guide of the same axis is dropped.
//!
//! Threshold tests are inclusive: an edge exactly `threshold` pixels away
//! still snaps.

#[cfg(test)]
#[path = "guides_test.rs"]
mod guides_test;

use std::collections::{BTreeMap, HashMap};

use tracing::debug;
use wire::{Guide, GuideStyle, SnapProperties, SnapTarget, SnapThresholdValues};

use crate::consts::{DIST_GUIDE_GAP_PX, GUIDE_OVERHANG_PX, GUIDE_THICKNESS_PX};
use crate::geometry::{Axis, Point, Rect, Size};
use crate::hit::{ResizeAnchor, element_at};
use crate::scene::{ElementKind, Scene};

/// Alignment and equal-distance thresholds in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SnapThresholds {
    pub alignment: f64,
    pub distance: f64,
}

impl From<SnapThresholdValues> for SnapThresholds {
    #[allow(clippy::cast_precision_loss)]
    fn from(values: SnapThresholdValues) -> Self {
        Self { alignment: values.alignment as f64, distance: values.distance as f64 }
    }
}

// =============================================================================
// EDGE INDEX
// =============================================================================

/// One edge coordinate per component, ascending.
#[derive(Debug, Clone, Default)]
struct EdgeIndex {
    entries: Vec<(String, f64)>,
}

impl EdgeIndex {
    fn from_entries(mut entries: Vec<(String, f64)>) -> Self {
        entries.sort_by(|a, b| a.1.total_cmp(&b.1));
        Self { entries }
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First sibling whose edge is within `threshold` of `coordinate`.
    fn first_within(&self, skip: Option<&str>, coordinate: f64, threshold: f64) -> Option<(&str, f64)> {
        self.entries
            .iter()
            .filter(|(id, _)| skip != Some(id.as_str()))
            .find(|(_, value)| within(*value, coordinate, threshold))
            .map(|(id, value)| (id.as_str(), *value))
    }
}

fn within(a: f64, b: f64, threshold: f64) -> bool {
    (a - b).abs() <= threshold
}

fn target(uuid: &str, prop: Option<&str>) -> SnapTarget {
    SnapTarget { uuid: uuid.to_owned(), prop: prop.map(str::to_owned) }
}

fn guide(x: f64, y: f64, width: f64, height: f64, style: GuideStyle) -> Guide {
    Guide { x, y, width, height, style }
}

fn guide_length(max: f64, x: f64) -> f64 {
    max - x + GUIDE_OVERHANG_PX
}

/// Whether `p` is nearer to `start` than to `end`.
fn closer_to_start(p: f64, start: f64, end: f64) -> bool {
    (p - start).abs() < (p - end).abs()
}

/// Answer for a query that has nothing to snap: the pointer position, no guides.
fn unsnapped(point: Point) -> SnapProperties {
    SnapProperties {
        init_point: point.into(),
        top: point.y,
        left: point.x,
        width: None,
        height: None,
        css_position: BTreeMap::new(),
        guides: Vec::new(),
    }
}

// =============================================================================
// DYNAMIC GUIDES
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct DynamicGuides {
    thresholds: SnapThresholds,
    left: EdgeIndex,
    right: EdgeIndex,
    top: EdgeIndex,
    bottom: EdgeIndex,
    middle_h: EdgeIndex,
    middle_v: EdgeIndex,
    bounds: HashMap<String, Rect>,
    /// Sibling rectangles, the dragged element excluded, in document order.
    rectangles: Vec<Rect>,
    /// Element the current gesture drags or resizes.
    element: Option<String>,
}

impl DynamicGuides {
    #[must_use]
    pub fn new(thresholds: SnapThresholds) -> Self {
        Self { thresholds, ..Self::default() }
    }

    #[must_use]
    pub fn thresholds(&self) -> SnapThresholds {
        self.thresholds
    }

    pub fn set_thresholds(&mut self, thresholds: SnapThresholds) {
        self.thresholds = thresholds;
    }

    /// Whether the edge indexes are built.
    #[must_use]
    pub fn is_cached(&self) -> bool {
        !self.left.is_empty()
    }

    /// Drop the edge indexes; the next query rebuilds them.
    pub fn clear(&mut self) {
        let thresholds = self.thresholds;
        *self = Self::new(thresholds);
    }

    fn build(&mut self, scene: &Scene, point: Point) {
        self.element = element_at(scene, point).map(str::to_owned);
        let components: Vec<(String, Rect)> = scene
            .iter()
            .filter(|e| e.kind == ElementKind::Component && e.visible && !e.id.is_empty())
            .map(|e| (e.id.clone(), e.bounds()))
            .collect();

        let index = |edge: fn(&Rect) -> f64| {
            EdgeIndex::from_entries(components.iter().map(|(id, r)| (id.clone(), edge(r))).collect())
        };
        self.left = index(Rect::left);
        self.right = index(Rect::right);
        self.top = index(Rect::top);
        self.bottom = index(Rect::bottom);
        self.middle_h = index(Rect::center_x);
        self.middle_v = index(Rect::center_y);
        self.rectangles = components
            .iter()
            .filter(|(id, _)| self.element.as_deref() != Some(id.as_str()))
            .map(|(_, r)| *r)
            .collect();
        self.bounds = components.into_iter().collect();
        debug!(components = self.bounds.len(), element = ?self.element, "snap cache built");
    }

    /// Answer a `getSnapTarget` query.
    ///
    /// `dragged` is the size of a palette item being dropped; it is used
    /// when no measured element is under the pointer. Returns `None` when
    /// nothing snapped.
    pub fn snap_target(
        &mut self,
        scene: &Scene,
        point: Point,
        resizing: Option<ResizeAnchor>,
        dragged: Option<Size>,
    ) -> Option<SnapProperties> {
        if !self.is_cached() {
            self.build(scene, point);
        }

        let under = element_at(scene, point).map(str::to_owned);
        if dragged.is_none() && resizing.is_none() {
            self.element = under;
        } else if resizing.is_some() && under.is_some() {
            self.element = under;
        }

        let uuid = self.element.clone();
        let rect = match (uuid.as_deref().and_then(|id| scene.get(id)), dragged) {
            (Some(element), _) => element.bounds(),
            (None, Some(size)) => Rect::at(point, size),
            (None, None) => return Some(unsnapped(point)),
        };

        let mut props = unsnapped(point);
        let horizontal = self.horizontal_snap(resizing, point, uuid.as_deref(), rect, &mut props);
        let vertical = self.vertical_snap(resizing, point, uuid.as_deref(), rect, &mut props);
        if resizing.is_none() {
            let vertical_dist = self.equal_distance_vertical(rect, &mut props);
            if vertical_dist && let Some(index) = vertical {
                props.guides.remove(index);
            }
            let horizontal_dist = self.equal_distance_horizontal(rect, &mut props);
            if horizontal_dist && let Some(index) = horizontal {
                props.guides.remove(index);
            }
        }

        if props.guides.is_empty() { None } else { Some(props) }
    }

    // =========================================================================
    // EDGE SNAPS
    // =========================================================================

    /// Snap a left or right edge; returns the index of the pushed guide.
    fn horizontal_snap(
        &self,
        resizing: Option<ResizeAnchor>,
        point: Point,
        uuid: Option<&str>,
        rect: Rect,
        props: &mut SnapProperties,
    ) -> Option<usize> {
        if resizing.is_some_and(|r| !r.is_horizontal()) {
            return None;
        }
        let resizing = resizing.is_some();
        let threshold = self.thresholds.alignment;
        let closer_to_left = closer_to_start(point.x, rect.left(), rect.right());
        let mut snapped: Option<(&str, f64)> = None;

        if !resizing || closer_to_left {
            let edge = if resizing { point.x } else { rect.left() };
            let hit = self
                .left
                .first_within(uuid, edge, threshold)
                .map(|(id, v)| (id, v, None))
                .or_else(|| self.right.first_within(uuid, edge, threshold).map(|(id, v)| (id, v, Some("right"))));
            if let Some((id, value, prop)) = hit {
                props.left = value;
                props.css_position.insert("left".to_owned(), target(id, prop));
                if resizing {
                    props.width = Some(rect.width + rect.left() - value);
                }
                snapped = Some((id, value));
            }
        }

        if snapped.is_none() && (!resizing || !closer_to_left) {
            let edge = if resizing { point.x } else { rect.right() };
            let hit = self
                .right
                .first_within(uuid, edge, threshold)
                .map(|(id, v)| (id, v, None))
                .or_else(|| self.left.first_within(uuid, edge, threshold).map(|(id, v)| (id, v, Some("left"))));
            if let Some((id, value, prop)) = hit {
                props.css_position.insert("right".to_owned(), target(id, prop));
                if resizing {
                    props.left = rect.left();
                    props.width = Some(value - rect.left());
                } else {
                    props.left = value - rect.width;
                }
                snapped = Some((id, value));
            }
        }

        if snapped.is_none() && !resizing {
            if let Some((id, value)) = self.middle_h.first_within(uuid, rect.center_x(), threshold) {
                props.css_position.insert("middleH".to_owned(), target(id, None));
                props.left = value - rect.width / 2.0;
                snapped = Some((id, value));
            }
        }

        let (id, guide_x) = snapped?;
        let sibling_top = self.bounds.get(id).map_or(rect.top(), Rect::top);
        let line = if sibling_top < rect.top() {
            guide(guide_x, sibling_top, GUIDE_THICKNESS_PX, rect.bottom() - sibling_top, GuideStyle::Snap)
        } else {
            guide(guide_x, rect.top(), GUIDE_THICKNESS_PX, sibling_top - rect.top(), GuideStyle::Snap)
        };
        props.guides.push(line);
        Some(props.guides.len() - 1)
    }

    /// Snap a top or bottom edge; returns the index of the pushed guide.
    fn vertical_snap(
        &self,
        resizing: Option<ResizeAnchor>,
        point: Point,
        uuid: Option<&str>,
        rect: Rect,
        props: &mut SnapProperties,
    ) -> Option<usize> {
        if resizing.is_some_and(|r| !r.is_vertical()) {
            return None;
        }
        let resizing = resizing.is_some();
        let threshold = self.thresholds.alignment;
        let closer_to_top = closer_to_start(point.y, rect.top(), rect.bottom());
        let mut snapped: Option<(&str, f64)> = None;

        if !resizing || closer_to_top {
            let edge = if resizing { point.y } else { rect.top() };
            let hit = self
                .top
                .first_within(uuid, edge, threshold)
                .map(|(id, v)| (id, v, None))
                .or_else(|| self.bottom.first_within(uuid, edge, threshold).map(|(id, v)| (id, v, Some("bottom"))));
            if let Some((id, value, prop)) = hit {
                props.top = value;
                props.css_position.insert("top".to_owned(), target(id, prop));
                if resizing {
                    props.height = Some(rect.height + rect.top() - value);
                }
                snapped = Some((id, value));
            }
        }

        if snapped.is_none() && (!resizing || !closer_to_top) {
            let edge = if resizing { point.y } else { rect.bottom() };
            let hit = self
                .bottom
                .first_within(uuid, edge, threshold)
                .map(|(id, v)| (id, v, None))
                .or_else(|| self.top.first_within(uuid, edge, threshold).map(|(id, v)| (id, v, Some("top"))));
            if let Some((id, value, prop)) = hit {
                props.css_position.insert("bottom".to_owned(), target(id, prop));
                if resizing {
                    props.top = rect.top();
                    props.height = Some(value - rect.top());
                } else {
                    props.top = value - rect.height;
                }
                snapped = Some((id, value));
            }
        }

        if snapped.is_none() && !resizing {
            if let Some((id, value)) = self.middle_v.first_within(uuid, rect.center_y(), threshold) {
                props.css_position.insert("middleV".to_owned(), target(id, None));
                props.top = value - rect.height / 2.0;
                snapped = Some((id, value));
            }
        }

        let (id, guide_y) = snapped?;
        let sibling_left = self.bounds.get(id).map_or(rect.left(), Rect::left);
        let line = if sibling_left < rect.left() {
            guide(sibling_left, guide_y, rect.right() - sibling_left, GUIDE_THICKNESS_PX, GuideStyle::Snap)
        } else {
            guide(rect.left(), guide_y, sibling_left - rect.left(), GUIDE_THICKNESS_PX, GuideStyle::Snap)
        };
        props.guides.push(line);
        Some(props.guides.len() - 1)
    }

    // =========================================================================
    // EQUAL DISTANCE
    // =========================================================================

    /// Sibling pairs overlapping `rect` on `axis`, each ordered by its start on the other axis.
    fn overlapping_pairs(&self, rect: Rect, axis: Axis) -> Vec<(Rect, Rect)> {
        let overlaps: Vec<Rect> = self.rectangles.iter().copied().filter(|r| rect.overlaps_on(r, axis)).collect();
        let mut pairs = Vec::new();
        for (i, a) in overlaps.iter().enumerate() {
            for b in &overlaps[i + 1..] {
                let a_first = match axis {
                    Axis::X => a.top() <= b.top(),
                    Axis::Y => a.left() <= b.left(),
                };
                pairs.push(if a_first { (*a, *b) } else { (*b, *a) });
            }
        }
        pairs
    }

    /// Equal vertical gaps between siblings stacked above or below `rect`.
    fn equal_distance_vertical(&self, rect: Rect, props: &mut SnapProperties) -> bool {
        let threshold = self.thresholds.distance;
        for (e1, e2) in self.overlapping_pairs(rect, Axis::X) {
            if e2.top() > e1.bottom() && rect.top() > e2.bottom() {
                let dist = e2.top() - e1.bottom();
                if within(dist, rect.top() - e2.bottom(), threshold) {
                    props.top = e2.bottom() + dist;
                    let r = Rect::new(props.left, props.top, rect.width, rect.height);
                    props.guides.extend(vertical_dist_guides(e1, e2, r, dist));
                    return true;
                }
            }
            if e2.top() > e1.bottom() && e1.top() > rect.bottom() {
                let dist = e2.top() - e1.bottom();
                if within(dist, e1.top() - rect.bottom(), threshold) {
                    props.top = e1.top() - dist - rect.height;
                    let r = Rect::new(props.left, props.top, rect.width, rect.height);
                    props.guides.extend(vertical_dist_guides(r, e1, e2, dist));
                    return true;
                }
            }
            if e2.top() > rect.bottom() && rect.top() > e1.bottom() {
                let dist = (e2.top() - e1.bottom()) / 2.0;
                if within(e1.bottom() + dist, rect.top() + rect.height / 2.0, threshold) {
                    props.top = e1.bottom() + dist - rect.height / 2.0;
                    let r = Rect::new(props.left, props.top, rect.width, rect.height);
                    props.guides.extend(vertical_dist_guides(e1, r, e2, dist - rect.height / 2.0));
                    return true;
                }
            }
        }
        false
    }

    /// Equal horizontal gaps between siblings left or right of `rect`.
    fn equal_distance_horizontal(&self, rect: Rect, props: &mut SnapProperties) -> bool {
        let threshold = self.thresholds.distance;
        for (e1, e2) in self.overlapping_pairs(rect, Axis::Y) {
            if e2.left() > e1.right() && rect.left() > e2.right() {
                let dist = e2.left() - e1.right();
                if within(dist, rect.left() - e2.right(), threshold) {
                    props.left = e2.right() + dist;
                    let r = Rect::new(props.left, props.top, rect.width, rect.height);
                    props.guides.extend(horizontal_dist_guides(e1, e2, r, dist));
                    return true;
                }
            }
            if e1.left() > rect.right() && e2.left() > e1.right() {
                let dist = e2.left() - e1.right();
                if within(dist, e1.left() - rect.right(), threshold) {
                    props.left = e1.left() - dist - rect.width;
                    let r = Rect::new(props.left, props.top, rect.width, rect.height);
                    props.guides.extend(horizontal_dist_guides(r, e1, e2, dist));
                    return true;
                }
            }
            if e2.left() > rect.right() && rect.left() > e1.right() {
                let dist = (e2.left() - e1.right()) / 2.0;
                if within(e1.right() + dist, rect.left() + rect.width / 2.0, threshold) {
                    props.left = e1.right() + dist - rect.width / 2.0;
                    let r = Rect::new(props.left, props.top, rect.width, rect.height);
                    props.guides.extend(horizontal_dist_guides(e1, r, e2, dist - rect.width / 2.0));
                    return true;
                }
            }
        }
        false
    }
}

/// Ticks right of three vertically stacked boxes plus the two gap measures.
fn vertical_dist_guides(e1: Rect, e2: Rect, r: Rect, dist: f64) -> [Guide; 6] {
    let right = r.right().max(e1.right()).max(e2.right());
    let e2_len = guide_length(right, e2.right());
    [
        guide(e1.right(), e1.bottom(), guide_length(right, e1.right()), GUIDE_THICKNESS_PX, GuideStyle::Dist),
        guide(right + DIST_GUIDE_GAP_PX, e1.bottom(), GUIDE_THICKNESS_PX, dist, GuideStyle::Dist),
        guide(e2.right(), e2.top(), e2_len, GUIDE_THICKNESS_PX, GuideStyle::Dist),
        guide(e2.right(), e2.bottom(), e2_len, GUIDE_THICKNESS_PX, GuideStyle::Dist),
        guide(right + DIST_GUIDE_GAP_PX, e2.bottom(), GUIDE_THICKNESS_PX, dist, GuideStyle::Dist),
        guide(r.right(), r.top(), guide_length(right, r.right()), GUIDE_THICKNESS_PX, GuideStyle::Dist),
    ]
}

/// Ticks below three side-by-side boxes plus the two gap measures.
fn horizontal_dist_guides(e1: Rect, e2: Rect, r: Rect, dist: f64) -> [Guide; 6] {
    let bottom = r.bottom().max(e1.bottom()).max(e2.bottom());
    let e2_len = guide_length(bottom, e2.bottom());
    [
        guide(e1.right(), e1.bottom(), GUIDE_THICKNESS_PX, guide_length(bottom, e1.bottom()), GuideStyle::Dist),
        guide(e1.right(), bottom + DIST_GUIDE_GAP_PX, dist, GUIDE_THICKNESS_PX, GuideStyle::Dist),
        guide(e2.left(), e2.bottom(), GUIDE_THICKNESS_PX, e2_len, GuideStyle::Dist),
        guide(e2.right(), e2.bottom(), GUIDE_THICKNESS_PX, e2_len, GuideStyle::Dist),
        guide(e2.right(), bottom + DIST_GUIDE_GAP_PX, dist, GUIDE_THICKNESS_PX, GuideStyle::Dist),
        guide(r.left(), r.bottom(), GUIDE_THICKNESS_PX, guide_length(bottom, r.bottom()), GuideStyle::Dist),
    ]
}
