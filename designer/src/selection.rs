//! Mouse selection: click selection and the lasso (marquee).
//!
//! DESIGN
//! ======
//! A mouse-down over an element selects it: with ctrl or meta held the
//! element is toggled in or out of the selection, otherwise it replaces
//! the selection. A mouse-down over nothing clears the selection and starts
//! a lasso at the pointer.
//!
//! The lasso only completes when the pointer moved on both axes between
//! mouse-down and mouse-up. It then selects every element with at least one
//! corner strictly inside the lasso rectangle. An element that encloses the
//! whole lasso has no corner inside it and stays unselected.
//!
//! While the host reports a drag in progress (a component or ghost being
//! moved) all three handlers ignore the mouse.

#[cfg(test)]
#[path = "selection_test.rs"]
mod selection_test;

use tracing::debug;

use crate::geometry::{Point, Rect};
use crate::hit::hit_test;
use crate::scene::Scene;

/// Modifier keys held during a mouse event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Command on macOS.
    #[must_use]
    pub fn toggles(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Active mouse gesture.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Gesture {
    #[default]
    Idle,
    Lasso {
        origin: Point,
        current: Point,
    },
}

#[derive(Debug, Clone, Default)]
pub struct MouseSelection {
    selection: Vec<String>,
    gesture: Gesture,
    dragging: bool,
}

impl MouseSelection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selected element ids, in selection order.
    #[must_use]
    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    #[must_use]
    pub fn is_selected(&self, id: &str) -> bool {
        self.selection.iter().any(|s| s == id)
    }

    /// Replace the selection from outside (editor session, ghost click).
    pub fn set_selection(&mut self, ids: Vec<String>) {
        self.selection = ids;
    }

    #[must_use]
    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    /// Whether a component or ghost drag owns the mouse.
    pub fn set_dragging(&mut self, dragging: bool) {
        self.dragging = dragging;
    }

    /// Current lasso rectangle, if a lasso is open.
    #[must_use]
    pub fn lasso(&self) -> Option<Rect> {
        match self.gesture {
            Gesture::Lasso { origin, current } => Some(Rect::spanning(origin, current)),
            Gesture::Idle => None,
        }
    }

    /// Returns true when the selection changed.
    pub fn on_mouse_down(&mut self, scene: &Scene, p: Point, modifiers: Modifiers) -> bool {
        if self.dragging {
            return false;
        }
        self.gesture = Gesture::Idle;

        let Some(hit) = hit_test(scene, p) else {
            let changed = !self.selection.is_empty();
            self.selection.clear();
            self.gesture = Gesture::Lasso { origin: p, current: p };
            debug!(x = p.x, y = p.y, "lasso started");
            return changed;
        };

        let id = hit.element.id.clone();
        if modifiers.toggles() {
            match self.selection.iter().position(|s| *s == id) {
                Some(index) => {
                    self.selection.remove(index);
                }
                None => self.selection.push(id),
            }
            true
        } else {
            let changed = self.selection.len() != 1 || self.selection[0] != id;
            self.selection = vec![id];
            changed
        }
    }

    /// Track the pointer; returns the lasso rectangle while one is open.
    pub fn on_mouse_move(&mut self, p: Point) -> Option<Rect> {
        if self.dragging {
            return None;
        }
        if let Gesture::Lasso { current, .. } = &mut self.gesture {
            *current = p;
        }
        self.lasso()
    }

    /// Close the lasso. Returns true when a lasso completed and replaced the selection.
    pub fn on_mouse_up(&mut self, scene: &Scene, p: Point) -> bool {
        if self.dragging {
            return false;
        }
        let gesture = std::mem::take(&mut self.gesture);
        let Gesture::Lasso { origin, .. } = gesture else {
            return false;
        };
        if (origin.x - p.x).abs() <= 0.0 || (origin.y - p.y).abs() <= 0.0 {
            return false;
        }

        let lasso = Rect::spanning(origin, p);
        self.selection = marquee_select(scene, lasso);
        debug!(selected = self.selection.len(), "lasso completed");
        true
    }
}

/// Ids of the visible elements with a corner strictly inside `lasso`, in document order.
#[must_use]
pub fn marquee_select(scene: &Scene, lasso: Rect) -> Vec<String> {
    scene
        .iter()
        .filter(|e| e.visible)
        .filter(|e| e.bounds().corners().iter().any(|c| lasso.contains_strictly(*c)))
        .map(|e| e.id.clone())
        .collect()
}
