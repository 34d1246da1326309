//! Grid geometry: placements to grid boxes to pixel rectangles.
//!
//! Placements are authored against the design column count. On wider
//! breakpoints their coordinates are honored (scaled horizontally when the
//! breakpoint has a different column count, with boxes that collide after
//! rounding pushed down below the earlier box). On the narrowest breakpoint the
//! coordinates are ignored and items stack full-width in document order,
//! with the row span derived from the authored aspect ratio:
//!
//! ```text
//! row_span = max(1, floor(height * columns / width))
//! ```
//!
//! Pixel conversion follows the fluid-width, fixed-row-height convention:
//!
//! ```text
//! col_w  = (container - margin_x * (cols + 1)) / cols
//! left   = margin_x + x * (col_w + margin_x)
//! width  = w * col_w + (w - 1) * margin_x
//! top    = margin_y + y * (row_h + margin_y)
//! height = h * row_h + (h - 1) * margin_y
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::breakpoint::Breakpoint;
use crate::config::GridConfig;
use crate::document::{ItemId, ItemPlacement};

/// An item's box in breakpoint grid units.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridBox {
    pub id: ItemId,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl GridBox {
    /// Right edge (exclusive).
    #[must_use]
    pub const fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[must_use]
    pub const fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    #[must_use]
    pub const fn overlaps(&self, other: &GridBox) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Same box shifted down by `rows`.
    #[must_use]
    pub fn offset_y(mut self, rows: u32) -> Self {
        self.y = self.y.saturating_add(rows);
        self
    }

    /// Pixel rectangle for this box in a container of `container_width_px`.
    #[must_use]
    pub fn to_pixels(&self, container_width_px: u32, columns: u32, config: &GridConfig) -> PixelRect {
        let columns = f64::from(columns.max(1));
        let [margin_x, margin_y] = config.margin_px.map(f64::from);
        let row_height = f64::from(config.row_height_px);
        let column_width =
            ((f64::from(container_width_px) - margin_x * (columns + 1.0)) / columns).max(0.0);
        let x = f64::from(self.x);
        let y = f64::from(self.y);
        let w = f64::from(self.width);
        let h = f64::from(self.height);
        PixelRect {
            left: margin_x + x * (column_width + margin_x),
            top: margin_y + y * (row_height + margin_y),
            width: w * column_width + (w - 1.0).max(0.0) * margin_x,
            height: h * row_height + (h - 1.0).max(0.0) * margin_y,
        }
    }
}

/// Pixel-space rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    #[must_use]
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    /// Inclusive of the top-left edge, exclusive of the bottom-right edge.
    #[must_use]
    pub fn contains(&self, point: (f64, f64)) -> bool {
        let (x, y) = point;
        x >= self.left && x < self.left + self.width && y >= self.top && y < self.top + self.height
    }
}

/// Rejected placement geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    NonPositiveWidth { item: ItemId, width: i32 },
    NonPositiveHeight { item: ItemId, height: i32 },
    NegativeOrigin { item: ItemId, x: i32, y: i32 },
    ExceedsColumns { item: ItemId, right: i64, columns: u32 },
    UnknownBreakpoint { breakpoint: Breakpoint },
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveWidth { item, width } => {
                write!(f, "item {item} has width {width}; width must be >= 1")
            }
            Self::NonPositiveHeight { item, height } => {
                write!(f, "item {item} has height {height}; height must be >= 1")
            }
            Self::NegativeOrigin { item, x, y } => {
                write!(f, "item {item} has negative origin ({x}, {y})")
            }
            Self::ExceedsColumns {
                item,
                right,
                columns,
            } => write!(
                f,
                "item {item} extends to column {right}, past the {columns}-column grid"
            ),
            Self::UnknownBreakpoint { breakpoint } => {
                write!(f, "breakpoint {breakpoint} is not configured")
            }
        }
    }
}

impl std::error::Error for GeometryError {}

/// Check a single placement against the design grid.
pub fn validate_placement(item: &ItemPlacement, design_columns: u32) -> Result<(), GeometryError> {
    if item.width < 1 {
        return Err(GeometryError::NonPositiveWidth {
            item: item.id.clone(),
            width: item.width,
        });
    }
    if item.height < 1 {
        return Err(GeometryError::NonPositiveHeight {
            item: item.id.clone(),
            height: item.height,
        });
    }
    if item.x < 0 || item.y < 0 {
        return Err(GeometryError::NegativeOrigin {
            item: item.id.clone(),
            x: item.x,
            y: item.y,
        });
    }
    if item.right() > i64::from(design_columns) {
        return Err(GeometryError::ExceedsColumns {
            item: item.id.clone(),
            right: item.right(),
            columns: design_columns,
        });
    }
    Ok(())
}

/// First overlapping pair in document order.
#[must_use]
pub fn find_overlap(items: &[ItemPlacement]) -> Option<(&ItemPlacement, &ItemPlacement)> {
    items.iter().enumerate().find_map(|(index, first)| {
        items[index + 1..]
            .iter()
            .find(|second| first.overlaps(second))
            .map(|second| (first, second))
    })
}

/// Narrowest-breakpoint row span for a placement.
#[must_use]
pub fn stacked_row_span(width: u32, height: u32, columns: u32) -> u32 {
    let width = u64::from(width.max(1));
    let span = u64::from(height) * u64::from(columns) / width;
    u32::try_from(span).unwrap_or(u32::MAX).max(1)
}

/// Compute grid boxes for one sequence of placements on `breakpoint`.
///
/// Every placement is validated before any box is produced.
pub fn compute_boxes(
    items: &[ItemPlacement],
    breakpoint: Breakpoint,
    config: &GridConfig,
) -> Result<Vec<GridBox>, GeometryError> {
    let columns = config
        .columns(breakpoint)
        .ok_or(GeometryError::UnknownBreakpoint { breakpoint })?;
    for item in items {
        validate_placement(item, config.design_columns)?;
    }

    if config.breakpoints.is_narrowest(breakpoint) {
        let mut cursor = 0u32;
        return Ok(items
            .iter()
            .map(|item| {
                let height = stacked_row_span(to_unit(item.width), to_unit(item.height), columns);
                let grid = GridBox {
                    id: item.id.clone(),
                    x: 0,
                    y: cursor,
                    width: columns,
                    height,
                };
                cursor = cursor.saturating_add(height);
                grid
            })
            .collect());
    }

    let mut boxes: Vec<GridBox> = items
        .iter()
        .map(|item| scaled_box(item, columns, config.design_columns))
        .collect();
    if columns != config.design_columns {
        settle_collisions(&mut boxes);
    }
    Ok(boxes)
}

/// Push boxes down until none overlaps an earlier one.
///
/// Scaling rounds edges to whole columns, so neighbours that were disjoint
/// on the design grid can land on the same columns. Each box is checked
/// against the boxes before it in document order and moved below the first
/// one it hits; `y` only grows, so the loop ends.
fn settle_collisions(boxes: &mut [GridBox]) {
    for index in 1..boxes.len() {
        let (settled, rest) = boxes.split_at_mut(index);
        let current = &mut rest[0];
        while let Some(bottom) = settled
            .iter()
            .find(|other| other.overlaps(current))
            .map(GridBox::bottom)
        {
            current.y = bottom;
        }
    }
}

fn scaled_box(item: &ItemPlacement, columns: u32, design_columns: u32) -> GridBox {
    let x = to_unit(item.x);
    let width = to_unit(item.width);
    let (x, width) = if columns == design_columns {
        (x, width)
    } else {
        let scale = |edge: u32| {
            let scaled = u64::from(edge) * u64::from(columns) / u64::from(design_columns.max(1));
            u32::try_from(scaled).unwrap_or(u32::MAX)
        };
        let left = scale(x);
        let right = scale(x.saturating_add(width));
        let left = left.min(columns.saturating_sub(1));
        (left, right.saturating_sub(left).max(1))
    };
    GridBox {
        id: item.id.clone(),
        x,
        y: to_unit(item.y),
        width,
        height: to_unit(item.height),
    }
}

// Callers validate first, so negative values never reach here.
fn to_unit(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}
