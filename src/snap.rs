//! `formsync snap`: one snap query against a measured scene.

#[cfg(test)]
#[path = "snap_test.rs"]
mod snap_test;

use designer::geometry::Point;
use designer::guides::{DynamicGuides, SnapThresholds};
use designer::hit::ResizeAnchor;
use designer::scene::{ElementBox, Scene};
use serde_json::Value;
use tracing::debug;
use wire::DesignerMessage;

use crate::error::CliError;

/// Answer a `getSnapTarget` for `point`, as the `snap` event the canvas would post.
///
/// # Errors
///
/// Returns [`CliError::Json`] when `elements` is not an array of element boxes.
pub fn snap(
    elements: Value,
    point: Point,
    resizing: Option<ResizeAnchor>,
    thresholds: SnapThresholds,
) -> Result<DesignerMessage, CliError> {
    let elements: Vec<ElementBox> =
        serde_json::from_value(elements).map_err(|source| CliError::Json { path: "elements".to_owned(), source })?;
    let mut scene = Scene::new();
    scene.load_snapshot(elements);
    debug!(elements = scene.len(), x = point.x, y = point.y, "snap query");

    let mut guides = DynamicGuides::new(thresholds);
    let properties = guides.snap_target(&scene, point, resizing, None);
    Ok(DesignerMessage::Snap { properties })
}
