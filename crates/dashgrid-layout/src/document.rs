//! Dashboard document model.
//!
//! A [`DashboardDocument`] owns an ordered list of [`Row`]s and the map of
//! panel definitions. Placements reference panels by key only; the document
//! is the single owner of every [`PanelDefinition`].
//!
//! Documents are immutable values. Rows and panels live in persistent
//! collections (`im::Vector`, `im::OrdMap`) so each edit produced by the
//! mutation service shares structure with the version it was derived from,
//! and earlier versions stay valid for inspection and undo.
//!
//! # Invariants
//!
//! 1. Row ids are unique; item ids are unique across the whole document.
//! 2. `version` grows by exactly one per committed mutation.
//! 3. Equality is structural: two documents with the same rows, panels and
//!    duration compare equal regardless of their version counters.

use std::fmt;

use im::{OrdMap, Vector};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_DESIGN_COLUMNS;
use crate::geometry::{self, GeometryError};
use crate::resolver::{self, ResolutionError};
use crate::spec::{
    DashboardSpec, GRID_LAYOUT_KIND, GridCollapse, GridDisplay, GridItemSpec, GridSpec, LayoutSpec,
};

/// Path prefix shared by every panel reference.
pub const PANEL_REF_PREFIX: &str = "#/spec/panels/";

/// Panel key reserved for the "new panel" placeholder.
pub const NEW_PANEL_KEY: &str = "newPanel";

/// Reference token for the "new panel" placeholder.
pub const NEW_PANEL_REF: &str = "#/spec/panels/newPanel";

/// Suffix of synthetic row-header item ids; reserved for headers.
pub const HEADER_ID_SUFFIX: &str = ":header";

/// Row identifier, unique within a document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(String);

impl RowId {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Id of the synthetic header item emitted for this row.
    #[must_use]
    pub fn header_item_id(&self) -> ItemId {
        ItemId(format!("{}{HEADER_ID_SUFFIX}", self.0))
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RowId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Placement identifier, unique within a document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this id lies in the row-header namespace.
    #[must_use]
    pub fn is_reserved(&self) -> bool {
        self.0.ends_with(HEADER_ID_SUFFIX)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Opaque content reference (`{ "$ref": "#/spec/panels/<key>" }`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "$ref")]
    path: String,
}

impl Reference {
    /// Wrap a raw reference string without interpreting it.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Reference to the panel stored under `key`.
    #[must_use]
    pub fn panel(key: &str) -> Self {
        Self::new(format!("{PANEL_REF_PREFIX}{key}"))
    }

    /// The reserved "new panel" placeholder reference.
    #[must_use]
    pub fn new_panel() -> Self {
        Self::new(NEW_PANEL_REF)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn is_new_panel(&self) -> bool {
        self.path == NEW_PANEL_REF
    }

    /// Panel key named by the reference, if it is a well-formed panel path.
    #[must_use]
    pub fn panel_key(&self) -> Option<&str> {
        self.path
            .strip_prefix(PANEL_REF_PREFIX)
            .filter(|key| !key.is_empty() && !key.contains('/'))
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// Display metadata of a panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelDisplay {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A panel definition. `options` are private to the panel kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelDefinition {
    pub kind: String,
    pub display: PanelDisplay,
    #[serde(default)]
    pub options: serde_json::Value,
}

impl PanelDefinition {
    #[must_use]
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            display: PanelDisplay {
                name: name.into(),
                description: None,
            },
            options: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: serde_json::Value) -> Self {
        self.options = options;
        self
    }
}

/// A positioned, sized reference to content, in design-grid units.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemPlacement {
    pub id: ItemId,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub content: Reference,
}

impl ItemPlacement {
    #[must_use]
    pub fn new(
        id: impl Into<ItemId>,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        content: Reference,
    ) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            width,
            height,
            content,
        }
    }

    /// Right edge (exclusive).
    #[must_use]
    pub fn right(&self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }

    /// Bottom edge (exclusive).
    #[must_use]
    pub fn bottom(&self) -> i64 {
        i64::from(self.y) + i64::from(self.height)
    }

    /// Whether the two rectangles share any cell.
    #[must_use]
    pub fn overlaps(&self, other: &ItemPlacement) -> bool {
        i64::from(self.x) < other.right()
            && i64::from(other.x) < self.right()
            && i64::from(self.y) < other.bottom()
            && i64::from(other.y) < self.bottom()
    }
}

impl From<String> for ItemId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Collapse behavior declared by a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowCollapse {
    /// Whether the row starts open.
    pub open: bool,
}

/// A horizontal group of placements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub id: RowId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapse: Option<RowCollapse>,
    #[serde(default)]
    pub items: Vec<ItemPlacement>,
}

impl Row {
    #[must_use]
    pub fn new(id: impl Into<RowId>) -> Self {
        Self {
            id: id.into(),
            title: None,
            collapse: None,
            items: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn collapsible(mut self, open: bool) -> Self {
        self.collapse = Some(RowCollapse { open });
        self
    }

    #[must_use]
    pub fn with_item(mut self, item: ItemPlacement) -> Self {
        self.items.push(item);
        self
    }

    #[must_use]
    pub fn is_collapsible(&self) -> bool {
        self.collapse.is_some()
    }

    /// Declared initial open state; rows without collapse behavior are open.
    #[must_use]
    pub fn default_open(&self) -> bool {
        self.collapse.map_or(true, |collapse| collapse.open)
    }

    #[must_use]
    pub fn position(&self, item: &ItemId) -> Option<usize> {
        self.items.iter().position(|placement| &placement.id == item)
    }
}

/// Location of an item inside a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemLocation {
    pub row_index: usize,
    pub item_index: usize,
}

/// One placement whose reference does not resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityIssue {
    pub row: RowId,
    pub item: ItemId,
    pub error: ResolutionError,
}

/// Immutable, versioned dashboard document.
#[derive(Debug, Clone)]
pub struct DashboardDocument {
    pub(crate) rows: Vector<Row>,
    pub(crate) panels: OrdMap<String, PanelDefinition>,
    pub(crate) duration: Option<String>,
    pub(crate) design_columns: u32,
    pub(crate) version: u64,
}

impl PartialEq for DashboardDocument {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows
            && self.panels == other.panels
            && self.duration == other.duration
            && self.design_columns == other.design_columns
    }
}

impl Eq for DashboardDocument {}

impl Default for DashboardDocument {
    fn default() -> Self {
        Self {
            rows: Vector::new(),
            panels: OrdMap::new(),
            duration: None,
            design_columns: DEFAULT_DESIGN_COLUMNS,
            version: 0,
        }
    }
}

impl DashboardDocument {
    /// Build a document from rows and panels.
    pub fn new(
        rows: impl IntoIterator<Item = Row>,
        panels: impl IntoIterator<Item = (String, PanelDefinition)>,
    ) -> Result<Self, DocumentError> {
        let document = Self {
            rows: rows.into_iter().collect(),
            panels: panels.into_iter().collect(),
            ..Self::default()
        };
        document.check_ids()?;
        Ok(document)
    }

    /// Load a document from its serialized specification.
    ///
    /// Rows without an id become `row-{index}`; items without an id become
    /// `item-{row}-{index}`. Dangling references are kept and reported by
    /// [`integrity_report`](Self::integrity_report).
    pub fn from_spec(spec: DashboardSpec) -> Result<Self, DocumentError> {
        let rows = spec
            .layouts
            .into_iter()
            .enumerate()
            .map(|(row_index, layout)| row_from_spec(row_index, layout));
        let mut document = Self::new(rows, spec.panels)?;
        document.duration = spec.duration;
        Ok(document)
    }

    /// Serialize back to the wire specification.
    #[must_use]
    pub fn to_spec(&self) -> DashboardSpec {
        DashboardSpec {
            duration: self.duration.clone(),
            layouts: self.rows.iter().map(row_to_spec).collect(),
            panels: self
                .panels
                .iter()
                .map(|(key, panel)| (key.clone(), panel.clone()))
                .collect(),
        }
    }

    /// Override the design column count placements are validated against.
    #[must_use]
    pub fn with_design_columns(mut self, columns: u32) -> Self {
        self.design_columns = columns;
        self
    }

    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub const fn design_columns(&self) -> u32 {
        self.design_columns
    }

    #[must_use]
    pub fn duration(&self) -> Option<&str> {
        self.duration.as_deref()
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn row(&self, id: &RowId) -> Option<&Row> {
        self.rows.iter().find(|row| &row.id == id)
    }

    #[must_use]
    pub fn row_index(&self, id: &RowId) -> Option<usize> {
        self.rows.iter().position(|row| &row.id == id)
    }

    pub fn panels(&self) -> impl Iterator<Item = (&str, &PanelDefinition)> {
        self.panels.iter().map(|(key, panel)| (key.as_str(), panel))
    }

    #[must_use]
    pub fn panel(&self, key: &str) -> Option<&PanelDefinition> {
        self.panels.get(key)
    }

    #[must_use]
    pub fn locate(&self, item: &ItemId) -> Option<ItemLocation> {
        self.rows.iter().enumerate().find_map(|(row_index, row)| {
            row.position(item).map(|item_index| ItemLocation {
                row_index,
                item_index,
            })
        })
    }

    #[must_use]
    pub fn item(&self, id: &ItemId) -> Option<&ItemPlacement> {
        let location = self.locate(id)?;
        self.rows
            .get(location.row_index)
            .and_then(|row| row.items.get(location.item_index))
    }

    /// Row that holds `item`.
    #[must_use]
    pub fn row_of(&self, item: &ItemId) -> Option<&Row> {
        let location = self.locate(item)?;
        self.rows.get(location.row_index)
    }

    /// Every placement in document order.
    pub fn items(&self) -> impl Iterator<Item = (&Row, &ItemPlacement)> {
        self.rows
            .iter()
            .flat_map(|row| row.items.iter().map(move |item| (row, item)))
    }

    /// Placements whose reference names `key`.
    #[must_use]
    pub fn items_referencing(&self, key: &str) -> Vec<ItemId> {
        self.items()
            .filter(|(_, item)| {
                !item.content.is_new_panel() && item.content.panel_key() == Some(key)
            })
            .map(|(_, item)| item.id.clone())
            .collect()
    }

    /// Every placement whose reference does not resolve.
    #[must_use]
    pub fn integrity_report(&self) -> Vec<IntegrityIssue> {
        self.items()
            .filter_map(|(row, item)| {
                resolver::resolve(&item.content, self)
                    .err()
                    .map(|error| IntegrityIssue {
                        row: row.id.clone(),
                        item: item.id.clone(),
                        error,
                    })
            })
            .collect()
    }

    /// Validate every placement's geometry and the per-row no-overlap rule.
    pub fn validate_layout(&self) -> Result<(), DocumentError> {
        for row in &self.rows {
            for item in &row.items {
                geometry::validate_placement(item, self.design_columns)?;
            }
            if let Some((first, second)) = geometry::find_overlap(&row.items) {
                return Err(DocumentError::Overlap {
                    row: row.id.clone(),
                    first: first.id.clone(),
                    second: second.id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Deterministic hash of the document content (version excluded).
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        state_hash(self)
    }

    pub(crate) fn check_ids(&self) -> Result<(), DocumentError> {
        let mut rows = FxHashSet::default();
        let mut items = FxHashSet::default();
        for row in &self.rows {
            if !rows.insert(&row.id) {
                return Err(DocumentError::DuplicateRowId { row: row.id.clone() });
            }
            for item in &row.items {
                if item.id.is_reserved() {
                    return Err(DocumentError::ReservedItemId {
                        item: item.id.clone(),
                    });
                }
                if !items.insert(&item.id) {
                    return Err(DocumentError::DuplicateItemId {
                        item: item.id.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

fn row_from_spec(row_index: usize, layout: LayoutSpec) -> Row {
    let id = layout
        .id
        .map_or_else(|| RowId(format!("row-{row_index}")), RowId);
    let (title, collapse) = match layout.spec.display {
        Some(display) => (
            Some(display.title).filter(|title| !title.is_empty()),
            display.collapse.map(|collapse| RowCollapse {
                open: collapse.open,
            }),
        ),
        None => (None, None),
    };
    let items = layout
        .spec
        .items
        .into_iter()
        .enumerate()
        .map(|(item_index, item)| ItemPlacement {
            id: item
                .id
                .map_or_else(|| ItemId(format!("item-{row_index}-{item_index}")), ItemId),
            x: item.x,
            y: item.y,
            width: item.width,
            height: item.height,
            content: item.content,
        })
        .collect();
    Row {
        id,
        title,
        collapse,
        items,
    }
}

fn row_to_spec(row: &Row) -> LayoutSpec {
    let display = if row.title.is_some() || row.collapse.is_some() {
        Some(GridDisplay {
            title: row.title.clone().unwrap_or_default(),
            collapse: row.collapse.map(|collapse| GridCollapse {
                open: collapse.open,
            }),
        })
    } else {
        None
    };
    LayoutSpec {
        kind: GRID_LAYOUT_KIND.to_string(),
        id: Some(row.id.0.clone()),
        spec: GridSpec {
            display,
            items: row
                .items
                .iter()
                .map(|item| GridItemSpec {
                    id: Some(item.id.0.clone()),
                    x: item.x,
                    y: item.y,
                    width: item.width,
                    height: item.height,
                    content: item.content.clone(),
                })
                .collect(),
        },
    }
}

fn state_hash(document: &DashboardDocument) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0001_0000_01b3;

    fn mix(hash: &mut u64, byte: u8) {
        *hash ^= u64::from(byte);
        *hash = hash.wrapping_mul(PRIME);
    }

    fn mix_bytes(hash: &mut u64, bytes: &[u8]) {
        for byte in bytes {
            mix(hash, *byte);
        }
    }

    fn mix_i32(hash: &mut u64, value: i32) {
        mix_bytes(hash, &value.to_le_bytes());
    }

    fn mix_u64(hash: &mut u64, value: u64) {
        mix_bytes(hash, &value.to_le_bytes());
    }

    fn mix_str(hash: &mut u64, value: &str) {
        mix_u64(hash, value.len() as u64);
        mix_bytes(hash, value.as_bytes());
    }

    fn mix_opt_str(hash: &mut u64, value: Option<&str>) {
        match value {
            Some(value) => {
                mix(hash, 1);
                mix_str(hash, value);
            }
            None => mix(hash, 0),
        }
    }

    let mut hash = OFFSET_BASIS;
    mix_u64(&mut hash, u64::from(document.design_columns));
    mix_opt_str(&mut hash, document.duration.as_deref());
    mix_u64(&mut hash, document.rows.len() as u64);
    for row in &document.rows {
        mix_str(&mut hash, row.id.as_str());
        mix_opt_str(&mut hash, row.title.as_deref());
        match row.collapse {
            Some(collapse) => {
                mix(&mut hash, 1);
                mix(&mut hash, u8::from(collapse.open));
            }
            None => mix(&mut hash, 0),
        }
        mix_u64(&mut hash, row.items.len() as u64);
        for item in &row.items {
            mix_str(&mut hash, item.id.as_str());
            mix_i32(&mut hash, item.x);
            mix_i32(&mut hash, item.y);
            mix_i32(&mut hash, item.width);
            mix_i32(&mut hash, item.height);
            mix_str(&mut hash, item.content.as_str());
        }
    }
    mix_u64(&mut hash, document.panels.len() as u64);
    for (key, panel) in &document.panels {
        mix_str(&mut hash, key);
        mix_str(&mut hash, &panel.kind);
        mix_str(&mut hash, &panel.display.name);
        mix_opt_str(&mut hash, panel.display.description.as_deref());
        mix_str(&mut hash, &panel.options.to_string());
    }
    hash
}

/// Structural problems detected while building or validating a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    DuplicateRowId {
        row: RowId,
    },
    DuplicateItemId {
        item: ItemId,
    },
    /// Item ids ending in [`HEADER_ID_SUFFIX`] would collide with row headers.
    ReservedItemId {
        item: ItemId,
    },
    Geometry(GeometryError),
    Overlap {
        row: RowId,
        first: ItemId,
        second: ItemId,
    },
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateRowId { row } => write!(f, "duplicate row id {row}"),
            Self::DuplicateItemId { item } => write!(f, "duplicate item id {item}"),
            Self::ReservedItemId { item } => {
                write!(f, "item id {item} is reserved for row headers")
            }
            Self::Geometry(err) => write!(f, "{err}"),
            Self::Overlap { row, first, second } => {
                write!(f, "items {first} and {second} overlap in row {row}")
            }
        }
    }
}

impl std::error::Error for DocumentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let Self::Geometry(err) = self {
            return Some(err);
        }
        None
    }
}

impl From<GeometryError> for DocumentError {
    fn from(err: GeometryError) -> Self {
        Self::Geometry(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_spec() -> DashboardSpec {
        serde_json::from_str(
            r##"{
                "duration": "6h",
                "layouts": [
                    { "kind": "Grid", "spec": {
                        "display": { "title": "Overview", "collapse": { "open": false } },
                        "items": [
                            { "x": 0, "y": 0, "width": 12, "height": 6, "content": { "$ref": "#/spec/panels/cpu" } },
                            { "id": "mem-item", "x": 12, "y": 0, "width": 12, "height": 6, "content": { "$ref": "#/spec/panels/mem" } }
                        ] } },
                    { "kind": "Grid", "spec": { "items": [
                        { "x": 0, "y": 0, "width": 24, "height": 4, "content": { "$ref": "#/spec/panels/ghost" } }
                    ] } }
                ],
                "panels": {
                    "cpu": { "kind": "LineChart", "display": { "name": "CPU" } },
                    "mem": { "kind": "LineChart", "display": { "name": "Memory" }, "options": {} }
                }
            }"##,
        )
        .unwrap()
    }

    #[test]
    fn from_spec_assigns_missing_ids() {
        let doc = DashboardDocument::from_spec(sample_spec()).unwrap();
        let ids: Vec<&str> = doc.items().map(|(_, item)| item.id.as_str()).collect();
        assert_eq!(ids, ["item-0-0", "mem-item", "item-1-0"]);
        let rows: Vec<&str> = doc.rows().map(|row| row.id.as_str()).collect();
        assert_eq!(rows, ["row-0", "row-1"]);
        assert_eq!(doc.version(), 0);
        assert_eq!(doc.duration(), Some("6h"));
    }

    #[test]
    fn display_maps_to_title_and_collapse() {
        let doc = DashboardDocument::from_spec(sample_spec()).unwrap();
        let first = doc.row(&RowId::from("row-0")).unwrap();
        assert_eq!(first.title.as_deref(), Some("Overview"));
        assert!(first.is_collapsible());
        assert!(!first.default_open());
        let second = doc.row(&RowId::from("row-1")).unwrap();
        assert_eq!(second.title, None);
        assert!(second.default_open());
    }

    #[test]
    fn duplicate_item_ids_are_rejected() {
        let row = Row::new("r")
            .with_item(ItemPlacement::new("a", 0, 0, 4, 4, Reference::new_panel()))
            .with_item(ItemPlacement::new("a", 4, 0, 4, 4, Reference::new_panel()));
        let err = DashboardDocument::new([row], []).unwrap_err();
        assert_eq!(err, DocumentError::DuplicateItemId { item: "a".into() });
    }

    #[test]
    fn header_suffixed_item_ids_are_reserved() {
        let row = Row::new("r0")
            .with_title("T")
            .with_item(ItemPlacement::new("r0:header", 0, 0, 4, 4, Reference::new_panel()));
        let err = DashboardDocument::new([row], []).unwrap_err();
        assert_eq!(
            err,
            DocumentError::ReservedItemId {
                item: "r0:header".into()
            }
        );
        assert!(RowId::from("r0").header_item_id().is_reserved());
        assert!(!ItemId::from("header").is_reserved());
    }

    #[test]
    fn duplicate_row_ids_are_rejected() {
        let err = DashboardDocument::new([Row::new("r"), Row::new("r")], []).unwrap_err();
        assert_eq!(err, DocumentError::DuplicateRowId { row: "r".into() });
    }

    #[test]
    fn integrity_report_lists_dangling_references() {
        let doc = DashboardDocument::from_spec(sample_spec()).unwrap();
        let issues = doc.integrity_report();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].item, ItemId::from("item-1-0"));
        assert_eq!(issues[0].row, RowId::from("row-1"));
        assert!(matches!(
            issues[0].error,
            ResolutionError::UnknownPanel { ref key, .. } if key == "ghost"
        ));
    }

    #[test]
    fn spec_round_trip_preserves_content() {
        let doc = DashboardDocument::from_spec(sample_spec()).unwrap();
        let again = DashboardDocument::from_spec(doc.to_spec()).unwrap();
        assert_eq!(doc, again);
        assert_eq!(doc.state_hash(), again.state_hash());
    }

    #[test]
    fn validate_layout_detects_overlap() {
        let row = Row::new("r")
            .with_item(ItemPlacement::new("a", 0, 0, 12, 4, Reference::new_panel()))
            .with_item(ItemPlacement::new("b", 6, 2, 12, 4, Reference::new_panel()));
        let doc = DashboardDocument::new([row], []).unwrap();
        assert_eq!(
            doc.validate_layout(),
            Err(DocumentError::Overlap {
                row: "r".into(),
                first: "a".into(),
                second: "b".into(),
            })
        );
    }

    #[test]
    fn reference_helpers() {
        assert_eq!(Reference::panel("cpu").panel_key(), Some("cpu"));
        assert!(Reference::new_panel().is_new_panel());
        assert_eq!(Reference::new("#/spec/other/x").panel_key(), None);
        assert_eq!(Reference::new("#/spec/panels/").panel_key(), None);
        assert_eq!(Reference::new("#/spec/panels/a/b").panel_key(), None);
    }

    #[test]
    fn state_hash_ignores_version() {
        let doc = DashboardDocument::from_spec(sample_spec()).unwrap();
        let mut bumped = doc.clone();
        bumped.version = 7;
        assert_eq!(doc.state_hash(), bumped.state_hash());
        assert_eq!(doc, bumped);
    }
}
