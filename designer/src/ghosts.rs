//! Ghost layout: placeholders for things the form cannot render in place.
//!
//! Ghosts stand for form parts (the labels right of an absolute form),
//! invisible components, components outside the form bounds, and the
//! configuration objects of a component's custom-object properties. The
//! server groups them in ghost containers, one per owning component and
//! property; this module turns those groups into CSS styles.

#[cfg(test)]
#[path = "ghosts_test.rs"]
mod ghosts_test;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::consts::{
    GHOST_BACKGROUND_CONFIG, GHOST_BACKGROUND_DEFAULT, GHOST_BACKGROUND_INVISIBLE, GHOST_BACKGROUND_PART,
    GHOST_BACKGROUND_SELECTED, GHOST_COLOR_SELECTED, GHOST_CONTAINER_SPACE_PX, GHOST_EMPTY_SPACE_TOP_PX,
    GHOST_OFFSET_PX, PART_GHOST_HEIGHT_PX, PART_GHOST_WIDTH_PX,
};
use crate::geometry::{Point, Rect, Size};
use crate::scene::Scene;

/// CSS property name to value.
pub type Style = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GhostType {
    /// Custom-object configuration entry.
    Config,
    /// Component outside the form bounds.
    Comp,
    Part,
    Form,
    Invisible,
    /// Deprecated; hides its whole container.
    Group,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ghost {
    pub uuid: String,
    #[serde(default)]
    pub text: String,
    #[serde(rename = "type")]
    pub ghost_type: GhostType,
    #[serde(default)]
    pub location: Point,
    #[serde(default)]
    pub size: Size,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GhostContainer {
    /// Owning component.
    pub uuid: String,
    #[serde(default)]
    pub property_name: Option<String>,
    /// Index of this container among the owning component's containers.
    #[serde(default)]
    pub container_position_in_comp: Option<i64>,
    #[serde(default)]
    pub total_ghost_containers_of_comp: i64,
    /// Owning component's bounds, when the server knows them.
    #[serde(default)]
    pub parent_comp_bounds: Option<Rect>,
    #[serde(default)]
    pub ghosts: Vec<Ghost>,
}

/// Form the ghosts are laid out around.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GhostFrame {
    pub absolute: bool,
    pub form_size: Size,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedGhost {
    pub uuid: String,
    pub text: String,
    pub ghost_type: GhostType,
    pub style: Style,
    /// Separator line drawn with part ghosts.
    pub hr_style: Style,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedContainer {
    pub uuid: String,
    pub style: Style,
    pub ghosts: Vec<RenderedGhost>,
}

fn px(value: f64) -> String {
    format!("{value}px")
}

fn style(entries: &[(&str, String)]) -> Style {
    entries.iter().map(|(k, v)| ((*k).to_owned(), v.clone())).collect()
}

/// Lay out every ghost container.
///
/// In a responsive form the owning component's bounds come from the scene;
/// in an absolute form from the container itself, falling back to the whole
/// form when absent. `selection` highlights the selected ghosts.
#[must_use]
pub fn layout_ghosts(
    containers: &[GhostContainer],
    frame: GhostFrame,
    scene: &Scene,
    selection: &[String],
) -> Vec<RenderedContainer> {
    containers.iter().map(|c| layout_container(c, frame, scene, selection)).collect()
}

#[allow(clippy::cast_precision_loss)]
fn layout_container(container: &GhostContainer, frame: GhostFrame, scene: &Scene, selection: &[String]) -> RenderedContainer {
    let mut css = Style::new();
    if let Some(position) = container.container_position_in_comp {
        let odd = position % 2 != 0;
        let (background, color) = if odd {
            ("rgba(150, 150, 150, 0.05)", "rgb(150, 150, 150)")
        } else {
            ("rgba(0, 100, 80, 0.05)", "rgb(0, 100, 80)")
        };
        css.insert("background-color".to_owned(), background.to_owned());
        css.insert("color".to_owned(), color.to_owned());
        if odd {
            css.insert("border-top".to_owned(), "dashed 1px".to_owned());
            css.insert("border-bottom".to_owned(), "dashed 1px".to_owned());
        }
    }

    let bounds = if frame.absolute {
        container.parent_comp_bounds
    } else {
        scene.get(&container.uuid).map(|e| e.bounds()).or(container.parent_comp_bounds)
    };
    if let Some(bounds) = bounds {
        let position = container.container_position_in_comp.unwrap_or_default() as f64;
        let needed = container.total_ghost_containers_of_comp as f64 * GHOST_CONTAINER_SPACE_PX + GHOST_EMPTY_SPACE_TOP_PX;
        let empty_space_top = if bounds.height > needed { GHOST_EMPTY_SPACE_TOP_PX } else { 0.0 };
        css.insert("left".to_owned(), px(bounds.left() + GHOST_OFFSET_PX));
        css.insert(
            "top".to_owned(),
            px(bounds.top() + position * GHOST_CONTAINER_SPACE_PX + empty_space_top + GHOST_OFFSET_PX),
        );
        css.insert("width".to_owned(), px(bounds.width));
        css.insert("height".to_owned(), px(GHOST_CONTAINER_SPACE_PX));
    } else if frame.absolute {
        css.insert("left".to_owned(), px(GHOST_OFFSET_PX));
        css.insert("top".to_owned(), px(GHOST_OFFSET_PX));
        css.insert("width".to_owned(), px(frame.form_size.width));
        css.insert("height".to_owned(), px(frame.form_size.height));
    }

    let mut ghosts = Vec::with_capacity(container.ghosts.len());
    for ghost in &container.ghosts {
        if ghost.ghost_type == GhostType::Group {
            css.insert("display".to_owned(), "none".to_owned());
            continue;
        }
        ghosts.push(layout_ghost(ghost, frame, selection));
    }

    RenderedContainer { uuid: container.uuid.clone(), style: css, ghosts }
}

fn layout_ghost(ghost: &Ghost, frame: GhostFrame, selection: &[String]) -> RenderedGhost {
    let mut hr_style = style(&[("display", "none".to_owned())]);
    let mut css = match ghost.ghost_type {
        GhostType::Part => {
            hr_style = style(&[
                ("margin-top", "-1px".to_owned()),
                ("border-top", "1px dashed #000".to_owned()),
                ("height", "0px".to_owned()),
                ("width", px(frame.form_size.width + PART_GHOST_WIDTH_PX)),
                ("cursor", "ns-resize".to_owned()),
                ("float", "right".to_owned()),
            ]);
            style(&[
                ("background", GHOST_BACKGROUND_PART.to_owned()),
                ("top", px(ghost.location.y)),
                ("right", px(-PART_GHOST_WIDTH_PX)),
                ("width", px(PART_GHOST_WIDTH_PX)),
                ("height", px(PART_GHOST_HEIGHT_PX)),
                ("overflow", "visible".to_owned()),
            ])
        }
        GhostType::Form => style(&[("display", "none".to_owned())]),
        _ => {
            // Out-of-bounds components show at their exact location.
            let offset = if ghost.ghost_type == GhostType::Comp { 0.0 } else { GHOST_OFFSET_PX };
            let background = match ghost.ghost_type {
                GhostType::Invisible => GHOST_BACKGROUND_INVISIBLE,
                GhostType::Config => GHOST_BACKGROUND_CONFIG,
                _ => GHOST_BACKGROUND_DEFAULT,
            };
            style(&[
                ("opacity", "0.7".to_owned()),
                ("padding", "3px".to_owned()),
                ("left", px(ghost.location.x + offset)),
                ("top", px(ghost.location.y + offset)),
                ("width", px(ghost.size.width)),
                ("height", px(ghost.size.height)),
                ("background", background.to_owned()),
            ])
        }
    };
    if selection.iter().any(|s| *s == ghost.uuid) {
        css.insert("background".to_owned(), GHOST_BACKGROUND_SELECTED.to_owned());
        css.insert("color".to_owned(), GHOST_COLOR_SELECTED.to_owned());
    }
    RenderedGhost {
        uuid: ghost.uuid.clone(),
        text: ghost.text.clone(),
        ghost_type: ghost.ghost_type,
        style: css,
        hr_style,
    }
}
