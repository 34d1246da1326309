//! Layout mutation service.
//!
//! Every structural edit is a [`LayoutOperation`] applied with
//! [`DashboardDocument::apply`]. Application is transactional: the edit runs
//! against a copy, the touched rows and items are re-validated (geometry,
//! id uniqueness, reference existence, no overlap), and only then does a new
//! document with `version + 1` come back. On rejection the source document
//! is untouched and the error names the operation and the reason.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::document::{
    DashboardDocument, DocumentError, ItemId, ItemPlacement, NEW_PANEL_KEY, PanelDefinition,
    Reference, Row, RowId,
};
use crate::geometry::{self, GeometryError};
use crate::resolver::{self, ResolutionError};

/// Width of the placeholder inserted by "Add Panel".
pub const NEW_PANEL_WIDTH: i32 = 12;

/// Height of the placeholder inserted by "Add Panel".
pub const NEW_PANEL_HEIGHT: i32 = 6;

/// What happens to placements that still reference a panel being removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovePanelPolicy {
    /// Refuse while any placement references the panel.
    #[default]
    Reject,
    /// Remove the referencing placements too.
    RemovePlacements,
    /// Point the referencing placements at the new-panel placeholder.
    RedirectToNewPanel,
}

/// Supported structural layout operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum LayoutOperation {
    InsertItem {
        row: RowId,
        index: usize,
        placement: ItemPlacement,
    },
    RemoveItem {
        item: ItemId,
    },
    /// Move an item to `target_index` of `target_row`, counted after the
    /// item has been taken out of its current row. Coordinates are kept.
    MoveItem {
        item: ItemId,
        target_row: RowId,
        target_index: usize,
    },
    ResizeItem {
        item: ItemId,
        width: i32,
        height: i32,
    },
    RepositionItem {
        item: ItemId,
        x: i32,
        y: i32,
    },
    /// Flip a collapsible row's persisted open flag.
    ToggleRow {
        row: RowId,
    },
    AddPanel {
        key: String,
        panel: PanelDefinition,
    },
    /// Point a placement at `key`, optionally defining the panel in the same step.
    AssignPanel {
        item: ItemId,
        key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        panel: Option<PanelDefinition>,
    },
    RemovePanel {
        key: String,
        #[serde(default)]
        policy: RemovePanelPolicy,
    },
    AddRow {
        index: usize,
        row: Row,
    },
}

impl LayoutOperation {
    #[must_use]
    pub const fn kind(&self) -> LayoutOperationKind {
        match self {
            Self::InsertItem { .. } => LayoutOperationKind::InsertItem,
            Self::RemoveItem { .. } => LayoutOperationKind::RemoveItem,
            Self::MoveItem { .. } => LayoutOperationKind::MoveItem,
            Self::ResizeItem { .. } => LayoutOperationKind::ResizeItem,
            Self::RepositionItem { .. } => LayoutOperationKind::RepositionItem,
            Self::ToggleRow { .. } => LayoutOperationKind::ToggleRow,
            Self::AddPanel { .. } => LayoutOperationKind::AddPanel,
            Self::AssignPanel { .. } => LayoutOperationKind::AssignPanel,
            Self::RemovePanel { .. } => LayoutOperationKind::RemovePanel,
            Self::AddRow { .. } => LayoutOperationKind::AddRow,
        }
    }
}

/// Stable operation discriminator used in logs and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutOperationKind {
    InsertItem,
    RemoveItem,
    MoveItem,
    ResizeItem,
    RepositionItem,
    ToggleRow,
    AddPanel,
    AssignPanel,
    RemovePanel,
    AddRow,
}

/// Successful mutation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationOutcome {
    pub document: DashboardDocument,
    pub kind: LayoutOperationKind,
    pub touched_items: Vec<ItemId>,
    pub before_hash: u64,
    pub after_hash: u64,
}

/// Rejected mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationError {
    pub kind: LayoutOperationKind,
    pub version: u64,
    pub before_hash: u64,
    pub reason: MutationFailure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationFailure {
    MissingRow {
        row: RowId,
    },
    MissingItem {
        item: ItemId,
    },
    DuplicateItemId {
        item: ItemId,
    },
    DuplicateRowId {
        row: RowId,
    },
    ReservedItemId {
        item: ItemId,
    },
    IndexOutOfBounds {
        index: usize,
        len: usize,
    },
    InvalidGeometry(GeometryError),
    Overlap {
        row: RowId,
        first: ItemId,
        second: ItemId,
    },
    UnresolvedReference(ResolutionError),
    UnknownPanel {
        key: String,
    },
    DuplicatePanelKey {
        key: String,
    },
    ReservedPanelKey {
        key: String,
    },
    InvalidPanelKey {
        key: String,
    },
    RowNotCollapsible {
        row: RowId,
    },
    PanelInUse {
        key: String,
        items: Vec<ItemId>,
    },
}

impl fmt::Display for MutationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRow { row } => write!(f, "row {row} not found"),
            Self::MissingItem { item } => write!(f, "item {item} not found"),
            Self::DuplicateItemId { item } => write!(f, "item id {item} is already in use"),
            Self::DuplicateRowId { row } => write!(f, "row id {row} is already in use"),
            Self::ReservedItemId { item } => {
                write!(f, "item id {item} is reserved for row headers")
            }
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "index {index} is out of bounds for length {len}")
            }
            Self::InvalidGeometry(err) => write!(f, "invalid geometry: {err}"),
            Self::Overlap { row, first, second } => {
                write!(f, "items {first} and {second} would overlap in row {row}")
            }
            Self::UnresolvedReference(err) => write!(f, "{err}"),
            Self::UnknownPanel { key } => write!(f, "panel {key} not found"),
            Self::DuplicatePanelKey { key } => write!(f, "panel key {key} is already in use"),
            Self::ReservedPanelKey { key } => {
                write!(f, "panel key {key} is reserved for the new-panel placeholder")
            }
            Self::InvalidPanelKey { key } => {
                write!(f, "panel key {key:?} must be non-empty and contain no '/'")
            }
            Self::RowNotCollapsible { row } => write!(f, "row {row} is not collapsible"),
            Self::PanelInUse { key, items } => write!(
                f,
                "panel {key} is still referenced by {}",
                items
                    .iter()
                    .map(ItemId::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

impl std::error::Error for MutationFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidGeometry(err) => Some(err),
            Self::UnresolvedReference(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GeometryError> for MutationFailure {
    fn from(err: GeometryError) -> Self {
        Self::InvalidGeometry(err)
    }
}

impl From<DocumentError> for MutationFailure {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::DuplicateRowId { row } => Self::DuplicateRowId { row },
            DocumentError::DuplicateItemId { item } => Self::DuplicateItemId { item },
            DocumentError::ReservedItemId { item } => Self::ReservedItemId { item },
            DocumentError::Geometry(err) => Self::InvalidGeometry(err),
            DocumentError::Overlap { row, first, second } => Self::Overlap { row, first, second },
        }
    }
}

impl fmt::Display for MutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "layout op {:?} failed on version {}: {} [before_hash={:#x}]",
            self.kind, self.version, self.reason, self.before_hash
        )
    }
}

impl std::error::Error for MutationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.reason)
    }
}

/// Rows and items an edit touched; only these are re-validated.
#[derive(Default)]
struct Touched {
    rows: Vec<RowId>,
    items: Vec<ItemId>,
}

impl Touched {
    fn row(mut self, row: &RowId) -> Self {
        if !self.rows.contains(row) {
            self.rows.push(row.clone());
        }
        self
    }

    fn item(mut self, item: &ItemId) -> Self {
        self.items.push(item.clone());
        self
    }
}

impl DashboardDocument {
    /// Apply one operation, returning the next version of the document.
    pub fn apply(&self, operation: &LayoutOperation) -> Result<MutationOutcome, MutationError> {
        let kind = operation.kind();
        let before_hash = self.state_hash();
        let mut next = self.clone();
        let result = next
            .apply_in_place(operation)
            .and_then(|touched| next.revalidate(&touched).map(|()| touched));
        match result {
            Ok(touched) => {
                next.version = self.version.saturating_add(1);
                let after_hash = next.state_hash();
                debug!(
                    target: "dashgrid.mutation",
                    ?kind,
                    version = next.version,
                    touched = touched.items.len(),
                    before_hash,
                    after_hash,
                    "layout mutation committed"
                );
                Ok(MutationOutcome {
                    document: next,
                    kind,
                    touched_items: touched.items,
                    before_hash,
                    after_hash,
                })
            }
            Err(reason) => {
                warn!(
                    target: "dashgrid.mutation",
                    ?kind,
                    version = self.version,
                    %reason,
                    "layout mutation rejected"
                );
                Err(MutationError {
                    kind,
                    version: self.version,
                    before_hash,
                    reason,
                })
            }
        }
    }

    pub fn insert_item(
        &self,
        row: &RowId,
        index: usize,
        placement: ItemPlacement,
    ) -> Result<MutationOutcome, MutationError> {
        self.apply(&LayoutOperation::InsertItem {
            row: row.clone(),
            index,
            placement,
        })
    }

    pub fn remove_item(&self, item: &ItemId) -> Result<MutationOutcome, MutationError> {
        self.apply(&LayoutOperation::RemoveItem { item: item.clone() })
    }

    pub fn move_item(
        &self,
        item: &ItemId,
        target_row: &RowId,
        target_index: usize,
    ) -> Result<MutationOutcome, MutationError> {
        self.apply(&LayoutOperation::MoveItem {
            item: item.clone(),
            target_row: target_row.clone(),
            target_index,
        })
    }

    pub fn resize_item(
        &self,
        item: &ItemId,
        width: i32,
        height: i32,
    ) -> Result<MutationOutcome, MutationError> {
        self.apply(&LayoutOperation::ResizeItem {
            item: item.clone(),
            width,
            height,
        })
    }

    pub fn toggle_row(&self, row: &RowId) -> Result<MutationOutcome, MutationError> {
        self.apply(&LayoutOperation::ToggleRow { row: row.clone() })
    }

    /// Insert a 12x6 new-panel placeholder at the first free slot of `row`.
    pub fn insert_new_panel(&self, row: &RowId) -> Result<MutationOutcome, MutationError> {
        self.insert_item(row, 0, self.new_panel_placement(row))
    }

    /// Placeholder placement for "Add Panel": full new-panel size, left
    /// aligned, directly below everything already in `row`.
    #[must_use]
    pub fn new_panel_placement(&self, row: &RowId) -> ItemPlacement {
        let y = self
            .row(row)
            .and_then(|row| row.items.iter().map(ItemPlacement::bottom).max())
            .map_or(0, |bottom| i32::try_from(bottom).unwrap_or(i32::MAX));
        let width = NEW_PANEL_WIDTH.min(i32::try_from(self.design_columns).unwrap_or(i32::MAX));
        ItemPlacement {
            id: self.fresh_item_id(),
            x: 0,
            y,
            width,
            height: NEW_PANEL_HEIGHT,
            content: Reference::new_panel(),
        }
    }

    /// Smallest unused `panel-{n}` key.
    #[must_use]
    pub fn fresh_panel_key(&self) -> String {
        (1u64..)
            .map(|n| format!("panel-{n}"))
            .find(|key| !self.panels.contains_key(key.as_str()))
            .unwrap_or_default()
    }

    /// Smallest unused `new-panel-{n}` item id.
    #[must_use]
    pub fn fresh_item_id(&self) -> ItemId {
        (1u64..)
            .map(|n| ItemId::new(format!("new-panel-{n}")))
            .find(|id| self.locate(id).is_none())
            .unwrap_or_else(|| ItemId::new("new-panel"))
    }

    fn apply_in_place(&mut self, operation: &LayoutOperation) -> Result<Touched, MutationFailure> {
        match operation {
            LayoutOperation::InsertItem {
                row,
                index,
                placement,
            } => {
                if self.locate(&placement.id).is_some() {
                    return Err(MutationFailure::DuplicateItemId {
                        item: placement.id.clone(),
                    });
                }
                let target = self.row_mut(row)?;
                check_index(*index, target.items.len())?;
                target.items.insert(*index, placement.clone());
                Ok(Touched::default().row(row).item(&placement.id))
            }
            LayoutOperation::RemoveItem { item } => {
                let row = self.take_item(item)?.0;
                Ok(Touched::default().row(&row).item(item))
            }
            LayoutOperation::MoveItem {
                item,
                target_row,
                target_index,
            } => {
                if self.row_index(target_row).is_none() {
                    return Err(MutationFailure::MissingRow {
                        row: target_row.clone(),
                    });
                }
                let (source_row, placement) = self.take_item(item)?;
                let target = self.row_mut(target_row)?;
                check_index(*target_index, target.items.len())?;
                target.items.insert(*target_index, placement);
                Ok(Touched::default().row(&source_row).row(target_row).item(item))
            }
            LayoutOperation::ResizeItem {
                item,
                width,
                height,
            } => {
                let (row, placement) = self.item_mut(item)?;
                placement.width = *width;
                placement.height = *height;
                Ok(Touched::default().row(&row).item(item))
            }
            LayoutOperation::RepositionItem { item, x, y } => {
                let (row, placement) = self.item_mut(item)?;
                placement.x = *x;
                placement.y = *y;
                Ok(Touched::default().row(&row).item(item))
            }
            LayoutOperation::ToggleRow { row } => {
                let target = self.row_mut(row)?;
                let Some(collapse) = target.collapse.as_mut() else {
                    return Err(MutationFailure::RowNotCollapsible { row: row.clone() });
                };
                collapse.open = !collapse.open;
                Ok(Touched::default())
            }
            LayoutOperation::AddPanel { key, panel } => {
                self.insert_panel(key, panel.clone())?;
                Ok(Touched::default())
            }
            LayoutOperation::AssignPanel { item, key, panel } => {
                if self.locate(item).is_none() {
                    return Err(MutationFailure::MissingItem { item: item.clone() });
                }
                match panel {
                    Some(panel) => self.insert_panel(key, panel.clone())?,
                    None if !self.panels.contains_key(key.as_str()) => {
                        return Err(MutationFailure::UnknownPanel { key: key.clone() });
                    }
                    None => {}
                }
                let (row, placement) = self.item_mut(item)?;
                placement.content = Reference::panel(key);
                Ok(Touched::default().row(&row).item(item))
            }
            LayoutOperation::RemovePanel { key, policy } => {
                if !self.panels.contains_key(key.as_str()) {
                    return Err(MutationFailure::UnknownPanel { key: key.clone() });
                }
                let referencing = self.items_referencing(key);
                let mut touched = Touched::default();
                match policy {
                    RemovePanelPolicy::Reject if !referencing.is_empty() => {
                        return Err(MutationFailure::PanelInUse {
                            key: key.clone(),
                            items: referencing,
                        });
                    }
                    RemovePanelPolicy::Reject => {}
                    RemovePanelPolicy::RemovePlacements => {
                        for item in &referencing {
                            let (row, _) = self.take_item(item)?;
                            touched = touched.row(&row);
                        }
                    }
                    RemovePanelPolicy::RedirectToNewPanel => {
                        for item in &referencing {
                            let (row, placement) = self.item_mut(item)?;
                            placement.content = Reference::new_panel();
                            touched = touched.row(&row);
                        }
                    }
                }
                self.panels.remove(key.as_str());
                touched.items = referencing;
                Ok(touched)
            }
            LayoutOperation::AddRow { index, row } => {
                if self.row_index(&row.id).is_some() {
                    return Err(MutationFailure::DuplicateRowId { row: row.id.clone() });
                }
                check_index(*index, self.rows.len())?;
                self.rows.insert(*index, row.clone());
                let mut touched = Touched::default().row(&row.id);
                for item in &row.items {
                    touched = touched.item(&item.id);
                }
                Ok(touched)
            }
        }
    }

    fn revalidate(&self, touched: &Touched) -> Result<(), MutationFailure> {
        self.check_ids()?;
        for row_id in &touched.rows {
            let Some(row) = self.row(row_id) else {
                continue;
            };
            for item in &row.items {
                geometry::validate_placement(item, self.design_columns)?;
            }
            if let Some((first, second)) = geometry::find_overlap(&row.items) {
                return Err(MutationFailure::Overlap {
                    row: row.id.clone(),
                    first: first.id.clone(),
                    second: second.id.clone(),
                });
            }
        }
        for item_id in &touched.items {
            if let Some(item) = self.item(item_id) {
                resolver::resolve(&item.content, self)
                    .map_err(MutationFailure::UnresolvedReference)?;
            }
        }
        Ok(())
    }

    fn row_mut(&mut self, id: &RowId) -> Result<&mut Row, MutationFailure> {
        let index = self
            .row_index(id)
            .ok_or_else(|| MutationFailure::MissingRow { row: id.clone() })?;
        self.rows
            .get_mut(index)
            .ok_or_else(|| MutationFailure::MissingRow { row: id.clone() })
    }

    fn item_mut(&mut self, id: &ItemId) -> Result<(RowId, &mut ItemPlacement), MutationFailure> {
        let missing = || MutationFailure::MissingItem { item: id.clone() };
        let location = self.locate(id).ok_or_else(missing)?;
        let row = self.rows.get_mut(location.row_index).ok_or_else(missing)?;
        let row_id = row.id.clone();
        let placement = row.items.get_mut(location.item_index).ok_or_else(missing)?;
        Ok((row_id, placement))
    }

    fn take_item(&mut self, id: &ItemId) -> Result<(RowId, ItemPlacement), MutationFailure> {
        let missing = || MutationFailure::MissingItem { item: id.clone() };
        let location = self.locate(id).ok_or_else(missing)?;
        let row = self.rows.get_mut(location.row_index).ok_or_else(missing)?;
        let placement = row.items.remove(location.item_index);
        Ok((row.id.clone(), placement))
    }

    fn insert_panel(&mut self, key: &str, panel: PanelDefinition) -> Result<(), MutationFailure> {
        if key == NEW_PANEL_KEY {
            return Err(MutationFailure::ReservedPanelKey {
                key: key.to_string(),
            });
        }
        if key.is_empty() || key.contains('/') {
            return Err(MutationFailure::InvalidPanelKey {
                key: key.to_string(),
            });
        }
        if self.panels.contains_key(key) {
            return Err(MutationFailure::DuplicatePanelKey {
                key: key.to_string(),
            });
        }
        self.panels.insert(key.to_string(), panel);
        Ok(())
    }
}

fn check_index(index: usize, len: usize) -> Result<(), MutationFailure> {
    if index > len {
        return Err(MutationFailure::IndexOutOfBounds { index, len });
    }
    Ok(())
}
