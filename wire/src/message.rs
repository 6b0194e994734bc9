//! Designer postMessage events.
//!
//! The design canvas runs inside an iframe; the editor host and the canvas
//! talk through `postMessage` objects carrying an `id` discriminator. This
//! module types every event either side sends, so the designer session can
//! match on them instead of probing loose JSON.

#[cfg(test)]
#[path = "message_test.rs"]
mod message_test;

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::WireError;

/// A point in canvas client coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WirePoint {
    pub x: f64,
    pub y: f64,
}

/// Snap and equal-distance thresholds in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapThresholdValues {
    #[serde(deserialize_with = "lenient_int")]
    pub alignment: i64,
    #[serde(deserialize_with = "lenient_int")]
    pub distance: i64,
}

/// Visual role of a guide line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuideStyle {
    /// Edge alignment guide.
    Snap,
    /// Equal-distance guide.
    Dist,
}

/// One guide line (1px wide or 1px tall rectangle).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Guide {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(rename = "styleClass")]
    pub style: GuideStyle,
}

/// The sibling an edge snapped to; `prop` names the sibling edge when it
/// differs from the dragged edge (left edge snapped to a right edge, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapTarget {
    pub uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prop: Option<String>,
}

/// Snap result returned to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapProperties {
    pub init_point: WirePoint,
    pub top: f64,
    pub left: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default)]
    pub css_position: BTreeMap<String, SnapTarget>,
    #[serde(default)]
    pub guides: Vec<Guide>,
}

/// Every event crossing the designer iframe boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "id", rename_all = "camelCase")]
pub enum DesignerMessage {
    /// Palette drag started: create a preview element in the canvas.
    CreateElement {
        name: String,
        #[serde(default)]
        model: Map<String, Value>,
        #[serde(rename = "type", default)]
        element_type: Option<String>,
        #[serde(default)]
        attributes: Option<BTreeMap<String, String>>,
        #[serde(default)]
        children: Option<Vec<Value>>,
    },
    /// Palette drag ended or cancelled: drop the preview element.
    DestroyElement,
    /// Move the preview element into a container, optionally before a sibling.
    InsertDraggedComponent {
        #[serde(rename = "dropTarget", default)]
        drop_target: Option<String>,
        #[serde(rename = "insertBefore", default)]
        insert_before: Option<String>,
    },
    RenderGhosts,
    UpdateFormSize {
        width: f64,
        height: f64,
    },
    RedrawDecorators,
    HideGhostContainer,
    SnapThresholds {
        value: SnapThresholdValues,
    },
    GetSnapTarget {
        p1: WirePoint,
        /// Resize knob being dragged (`"n"`, `"se"`, ...); absent when moving.
        #[serde(default)]
        resizing: Option<String>,
    },
    ClearSnapCache,
    /// Reply to `getSnapTarget`; `properties` is null when nothing snapped.
    Snap {
        properties: Option<SnapProperties>,
    },
}

impl DesignerMessage {
    /// Parse a message from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Json`] for unknown ids or malformed payloads.
    pub fn from_value(value: Value) -> Result<Self, WireError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Serialize to the JSON object posted across the frame boundary.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Json`] if a payload cannot be represented as JSON
    /// (non-finite coordinates).
    pub fn to_value(&self) -> Result<Value, WireError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Accepts `5`, `5.7` or `"5px"` the way `parseInt` would.
fn lenient_int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(parse_int_prefix(&raw))
}

#[allow(clippy::cast_possible_truncation)]
fn parse_int_prefix(raw: &Value) -> i64 {
    match raw {
        Value::Number(n) => n.as_i64().unwrap_or_else(|| n.as_f64().map_or(0, |f| f.trunc() as i64)),
        Value::String(s) => {
            let trimmed = s.trim_start();
            let (sign, digits) = match trimmed.strip_prefix('-') {
                Some(rest) => (-1, rest),
                None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
            };
            let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
            digits[..end].parse::<i64>().map_or(0, |v| sign * v)
        }
        _ => 0,
    }
}
