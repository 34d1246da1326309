//! Row/section controller.
//!
//! Rows group placements vertically. Each row may show a header band and may
//! be collapsible. The controller flattens rows into a discriminated
//! [`FlatItem`] sequence and stacks them into one grid, offsetting every
//! row's content by the height of everything above it.
//!
//! Collapse state is view state: toggling a row never touches placement
//! coordinates, it only changes which items are emitted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::breakpoint::Breakpoint;
use crate::config::GridConfig;
use crate::document::{ItemPlacement, Row, RowId};
use crate::geometry::{self, GeometryError, GridBox};

/// Open/closed state of a collapsible row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowState {
    Open,
    Closed,
}

impl RowState {
    #[must_use]
    pub const fn from_open(open: bool) -> Self {
        if open { Self::Open } else { Self::Closed }
    }

    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Open => Self::Closed,
            Self::Closed => Self::Open,
        }
    }
}

/// Explicit per-row collapse overrides.
///
/// Rows without an entry use their declared default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollapseState {
    overrides: BTreeMap<RowId, bool>,
}

impl CollapseState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_open(&self, row: &Row) -> bool {
        self.overrides
            .get(&row.id)
            .copied()
            .unwrap_or_else(|| row.default_open())
    }

    #[must_use]
    pub fn state(&self, row: &Row) -> RowState {
        RowState::from_open(self.is_open(row))
    }

    /// New state with `row` flipped.
    #[must_use]
    pub fn toggle(&self, row: &Row) -> Self {
        let mut next = self.clone();
        next.overrides.insert(row.id.clone(), !self.is_open(row));
        next
    }

    /// New state without an override for `row`.
    #[must_use]
    pub fn without(&self, row: &RowId) -> Self {
        let mut next = self.clone();
        next.overrides.remove(row);
        next
    }

    /// Drop overrides for rows that no longer exist.
    #[must_use]
    pub fn retain_rows<'a>(&self, rows: impl IntoIterator<Item = &'a Row>) -> Self {
        let live: Vec<&RowId> = rows.into_iter().map(|row| &row.id).collect();
        Self {
            overrides: self
                .overrides
                .iter()
                .filter(|(id, _)| live.contains(id))
                .map(|(id, open)| (id.clone(), *open))
                .collect(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

/// One entry of the flattened row sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlatItem {
    RowHeader {
        row_id: RowId,
        title: String,
        collapsible: bool,
        is_open: bool,
    },
    Content {
        row_id: RowId,
        placement: ItemPlacement,
    },
    /// Placement that references the new-panel sentinel.
    Placeholder {
        row_id: RowId,
        placement: ItemPlacement,
    },
}

impl FlatItem {
    #[must_use]
    pub fn row_id(&self) -> &RowId {
        match self {
            Self::RowHeader { row_id, .. }
            | Self::Content { row_id, .. }
            | Self::Placeholder { row_id, .. } => row_id,
        }
    }

    #[must_use]
    pub fn placement(&self) -> Option<&ItemPlacement> {
        match self {
            Self::RowHeader { .. } => None,
            Self::Content { placement, .. } | Self::Placeholder { placement, .. } => {
                Some(placement)
            }
        }
    }
}

/// Flatten rows into headers and visible items.
///
/// A header is emitted for every titled row; items only for open rows.
#[must_use]
pub fn expand<'a>(
    rows: impl IntoIterator<Item = &'a Row>,
    collapse: &CollapseState,
) -> Vec<FlatItem> {
    let mut flat = Vec::new();
    for row in rows {
        let is_open = collapse.is_open(row);
        if let Some(title) = &row.title {
            flat.push(FlatItem::RowHeader {
                row_id: row.id.clone(),
                title: title.clone(),
                collapsible: row.is_collapsible(),
                is_open,
            });
        }
        if !is_open {
            continue;
        }
        flat.extend(row.items.iter().map(|placement| {
            let row_id = row.id.clone();
            let placement = placement.clone();
            if placement.content.is_new_panel() {
                FlatItem::Placeholder { row_id, placement }
            } else {
                FlatItem::Content { row_id, placement }
            }
        }));
    }
    flat
}

/// A flat item with its box in the stacked grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedItem {
    pub item: FlatItem,
    pub grid: GridBox,
}

/// Stack rows into one grid for `breakpoint`.
///
/// Each titled row contributes a full-width header band of
/// `config.header_rows`; open rows then contribute their content boxes,
/// shifted by the running cursor. Collapsed rows contribute only the header.
pub fn layout_sections<'a>(
    rows: impl IntoIterator<Item = &'a Row>,
    collapse: &CollapseState,
    breakpoint: Breakpoint,
    config: &GridConfig,
) -> Result<Vec<PlacedItem>, GeometryError> {
    let columns = config
        .columns(breakpoint)
        .ok_or(GeometryError::UnknownBreakpoint { breakpoint })?;
    let mut placed = Vec::new();
    let mut cursor = 0u32;
    for row in rows {
        let row_items = expand(std::iter::once(row), collapse);
        let mut entries = row_items.into_iter().peekable();
        if let Some(header) =
            entries.next_if(|item| matches!(item, FlatItem::RowHeader { .. }))
        {
            placed.push(PlacedItem {
                item: header,
                grid: GridBox {
                    id: row.id.header_item_id(),
                    x: 0,
                    y: cursor,
                    width: columns,
                    height: config.header_rows,
                },
            });
            cursor = cursor.saturating_add(config.header_rows);
        }
        let content: Vec<FlatItem> = entries.collect();
        if content.is_empty() {
            continue;
        }
        let placements: Vec<ItemPlacement> = content
            .iter()
            .filter_map(FlatItem::placement)
            .cloned()
            .collect();
        let boxes = geometry::compute_boxes(&placements, breakpoint, config)?;
        let bottom = boxes.iter().map(GridBox::bottom).max().unwrap_or(0);
        placed.extend(
            content
                .into_iter()
                .zip(boxes)
                .map(|(item, grid)| PlacedItem {
                    item,
                    grid: grid.offset_y(cursor),
                }),
        );
        cursor = cursor.saturating_add(bottom);
    }
    Ok(placed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Reference;

    fn rows() -> Vec<Row> {
        vec![
            Row::new("r0")
                .with_title("Overview")
                .collapsible(true)
                .with_item(ItemPlacement::new("a", 0, 0, 12, 4, Reference::panel("a")))
                .with_item(ItemPlacement::new("b", 12, 0, 12, 6, Reference::panel("b"))),
            Row::new("r1")
                .with_title("Details")
                .collapsible(false)
                .with_item(ItemPlacement::new("c", 0, 0, 24, 3, Reference::panel("c"))),
            Row::new("r2").with_item(ItemPlacement::new("d", 0, 0, 6, 2, Reference::new_panel())),
        ]
    }

    #[test]
    fn expand_respects_declared_defaults() {
        let rows = rows();
        let flat = expand(&rows, &CollapseState::new());
        let kinds: Vec<&str> = flat
            .iter()
            .map(|item| match item {
                FlatItem::RowHeader { .. } => "header",
                FlatItem::Content { .. } => "content",
                FlatItem::Placeholder { .. } => "placeholder",
            })
            .collect();
        assert_eq!(
            kinds,
            ["header", "content", "content", "header", "placeholder"]
        );
    }

    #[test]
    fn toggle_twice_restores_state() {
        let rows = rows();
        let collapse = CollapseState::new();
        let once = collapse.toggle(&rows[0]);
        assert!(!once.is_open(&rows[0]));
        let twice = once.toggle(&rows[0]);
        assert!(twice.is_open(&rows[0]));
        assert_eq!(expand(&rows, &collapse), expand(&rows, &twice));
    }

    #[test]
    fn toggle_is_pure() {
        let rows = rows();
        let collapse = CollapseState::new();
        let _ = collapse.toggle(&rows[1]);
        assert!(collapse.is_empty());
        assert_eq!(collapse.state(&rows[1]), RowState::Closed);
    }

    #[test]
    fn sections_stack_headers_and_content() {
        let rows = rows();
        let config = GridConfig::default();
        let placed = layout_sections(&rows, &CollapseState::new(), Breakpoint::Lg, &config).unwrap();
        let summary: Vec<(&str, u32, u32)> = placed
            .iter()
            .map(|p| (p.grid.id.as_str(), p.grid.y, p.grid.height))
            .collect();
        assert_eq!(
            summary,
            [
                ("r0:header", 0, 2),
                ("a", 2, 4),
                ("b", 2, 6),
                ("r1:header", 8, 2),
                ("d", 10, 2),
            ]
        );
    }

    #[test]
    fn expanding_a_row_shifts_later_rows() {
        let rows = rows();
        let config = GridConfig::default();
        let collapse = CollapseState::new().toggle(&rows[1]);
        let placed = layout_sections(&rows, &collapse, Breakpoint::Lg, &config).unwrap();
        let d = placed.iter().find(|p| p.grid.id.as_str() == "d").unwrap();
        assert_eq!(d.grid.y, 13);
    }

    #[test]
    fn retain_rows_drops_stale_overrides() {
        let rows = rows();
        let collapse = CollapseState::new().toggle(&rows[0]).toggle(&rows[1]);
        let kept = collapse.retain_rows(&rows[1..]);
        assert!(kept.is_open(&rows[0]));
        assert!(kept.is_open(&rows[1]));
    }
}
