//! Serialized dashboard specification.
//!
//! These types mirror the JSON document a dashboard is loaded from:
//!
//! ```json
//! {
//!   "layouts": [
//!     { "kind": "Grid", "spec": {
//!         "display": { "title": "Overview", "collapse": { "open": true } },
//!         "items": [ { "x": 0, "y": 0, "width": 12, "height": 6,
//!                      "content": { "$ref": "#/spec/panels/cpu" } } ] } }
//!   ],
//!   "panels": { "cpu": { "kind": "LineChart", "display": { "name": "CPU" }, "options": {} } }
//! }
//! ```
//!
//! Validation and id assignment happen in
//! [`DashboardDocument::from_spec`](crate::DashboardDocument::from_spec);
//! this module only describes the wire shape.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::document::{PanelDefinition, Reference};

/// Layout kind emitted for every row.
pub const GRID_LAYOUT_KIND: &str = "Grid";

fn default_layout_kind() -> String {
    GRID_LAYOUT_KIND.to_string()
}

/// Top-level dashboard specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSpec {
    /// Default time range, carried through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default)]
    pub layouts: Vec<LayoutSpec>,
    #[serde(default)]
    pub panels: BTreeMap<String, PanelDefinition>,
}

/// One row of the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSpec {
    #[serde(default = "default_layout_kind")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub spec: GridSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<GridDisplay>,
    #[serde(default)]
    pub items: Vec<GridItemSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDisplay {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapse: Option<GridCollapse>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCollapse {
    pub open: bool,
}

/// A placement as it appears on the wire. Coordinates are signed so that
/// malformed input parses and is rejected by geometry validation instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridItemSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub content: Reference,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_layout() {
        let json = r##"{
            "layouts": [
                { "kind": "Grid", "spec": { "items": [
                    { "x": 0, "y": 0, "width": 12, "height": 6,
                      "content": { "$ref": "#/spec/panels/cpu" } }
                ] } }
            ],
            "panels": {
                "cpu": { "kind": "LineChart", "display": { "name": "CPU" }, "options": { "unit": "%" } }
            }
        }"##;
        let spec: DashboardSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.layouts.len(), 1);
        let item = &spec.layouts[0].spec.items[0];
        assert_eq!(item.id, None);
        assert_eq!(item.content.as_str(), "#/spec/panels/cpu");
        assert_eq!(spec.panels["cpu"].display.name, "CPU");
        assert!(spec.duration.is_none());
    }

    #[test]
    fn kind_defaults_to_grid() {
        let layout: LayoutSpec = serde_json::from_str(r#"{"spec":{"items":[]}}"#).unwrap();
        assert_eq!(layout.kind, GRID_LAYOUT_KIND);
        assert!(layout.spec.display.is_none());
    }

    #[test]
    fn negative_sizes_still_parse() {
        let item: GridItemSpec = serde_json::from_str(
            r##"{"x":0,"y":0,"width":0,"height":-3,"content":{"$ref":"#/spec/panels/a"}}"##,
        )
        .unwrap();
        assert_eq!(item.width, 0);
        assert_eq!(item.height, -3);
    }
}
