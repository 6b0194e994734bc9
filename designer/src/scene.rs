//! Rendered layout of the design canvas: element boxes in document order.
//!
//! The host measures every element carrying an `svy-id` attribute and hands
//! the boxes over, either as a full snapshot or one element at a time. The
//! hit-test, marquee and snap-guide code read the boxes from here; nothing
//! in this crate queries a DOM.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};

/// What a measured element is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    #[default]
    Component,
    /// Layout container (`svy-layoutname`).
    Container,
}

/// Geometry of an element's `::before` pseudo element, used for drop indicators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PseudoBox {
    pub width: f64,
    pub height: f64,
    /// Owner's padding.
    pub padding_top: f64,
    pub padding_left: f64,
    /// Pseudo element's own margin.
    pub margin_top: f64,
    pub margin_left: f64,
}

/// One measured element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementBox {
    /// The `svy-id` attribute.
    pub id: String,
    #[serde(default)]
    pub kind: ElementKind,
    /// Bounding client rectangle as measured.
    pub rect: Rect,
    /// False when the element has no offset parent (`display: none` somewhere up).
    #[serde(default = "visible_by_default")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<PseudoBox>,
    /// Offset of an enclosing CSS-position container, added to `rect`.
    #[serde(default)]
    pub container_offset: Point,
}

fn visible_by_default() -> bool {
    true
}

impl ElementBox {
    #[must_use]
    pub fn new(id: &str, rect: Rect) -> Self {
        Self {
            id: id.to_owned(),
            kind: ElementKind::Component,
            rect,
            visible: true,
            before: None,
            container_offset: Point::default(),
        }
    }

    #[must_use]
    pub fn container(id: &str, rect: Rect) -> Self {
        Self { kind: ElementKind::Container, ..Self::new(id, rect) }
    }

    /// Rectangle adjusted by the CSS-position container offset.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.rect.translate(self.container_offset.x, self.container_offset.y)
    }

    /// Box of the `::before` pseudo element, when it has a height.
    #[must_use]
    pub fn before_bounds(&self) -> Option<Rect> {
        let before = self.before.filter(|b| b.height > 0.0)?;
        let bounds = self.bounds();
        Some(Rect::new(
            bounds.left() + before.padding_left + before.margin_left,
            bounds.top() + before.padding_top + before.margin_top,
            before.width,
            before.height,
        ))
    }

    #[must_use]
    pub fn is_container(&self) -> bool {
        self.kind == ElementKind::Container
    }
}

/// Element boxes in document order.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    elements: Vec<ElementBox>,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every box with a fresh measurement.
    pub fn load_snapshot(&mut self, elements: Vec<ElementBox>) {
        self.elements = elements;
    }

    /// Insert a box at the end of the document, or replace the box with the same id in place.
    pub fn insert(&mut self, element: ElementBox) {
        match self.elements.iter_mut().find(|e| e.id == element.id) {
            Some(existing) => *existing = element,
            None => self.elements.push(element),
        }
    }

    /// Remove a box by id, returning it if it was present.
    pub fn remove(&mut self, id: &str) -> Option<ElementBox> {
        let index = self.elements.iter().position(|e| e.id == id)?;
        Some(self.elements.remove(index))
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ElementBox> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// Move or resize a measured element. Returns false if the id is unknown.
    pub fn set_rect(&mut self, id: &str, rect: Rect) -> bool {
        let Some(element) = self.elements.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        element.rect = rect;
        true
    }

    /// Boxes in document order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &ElementBox> {
        self.elements.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
