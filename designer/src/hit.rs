//! Hit-testing pointer positions against the measured scene.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use std::str::FromStr;

use crate::geometry::Point;
use crate::scene::{ElementBox, Scene};

/// Which part of an element was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    Body,
    /// The `::before` drop indicator.
    Before,
}

/// Resize knob of a selected element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAnchor {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl ResizeAnchor {
    /// Whether dragging this knob moves a left or right edge.
    #[must_use]
    pub fn is_horizontal(self) -> bool {
        !matches!(self, Self::N | Self::S)
    }

    /// Whether dragging this knob moves a top or bottom edge.
    #[must_use]
    pub fn is_vertical(self) -> bool {
        !matches!(self, Self::E | Self::W)
    }
}

impl FromStr for ResizeAnchor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "n" => Ok(Self::N),
            "ne" => Ok(Self::Ne),
            "e" => Ok(Self::E),
            "se" => Ok(Self::Se),
            "s" => Ok(Self::S),
            "sw" => Ok(Self::Sw),
            "w" => Ok(Self::W),
            "nw" => Ok(Self::Nw),
            other => Err(format!("unknown resize knob: {other}")),
        }
    }
}

/// Result of a hit test.
#[derive(Debug, Clone, Copy)]
pub struct Hit<'a> {
    pub element: &'a ElementBox,
    pub part: HitPart,
}

/// Topmost visible element under `p`.
///
/// Walks the scene in reverse document order; the first element whose
/// bounds, or whose `::before` box, contain `p` wins.
#[must_use]
pub fn hit_test(scene: &Scene, p: Point) -> Option<Hit<'_>> {
    scene.iter().rev().filter(|e| e.visible).find_map(|element| {
        if element.bounds().contains(p) {
            return Some(Hit { element, part: HitPart::Body });
        }
        element
            .before_bounds()
            .filter(|before| before.contains(p))
            .map(|_| Hit { element, part: HitPart::Before })
    })
}

/// Id of the topmost element under `p`.
#[must_use]
pub fn element_at(scene: &Scene, p: Point) -> Option<&str> {
    hit_test(scene, p).map(|hit| hit.element.id.as_str())
}
