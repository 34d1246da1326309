//! Grid configuration.
//!
//! [`GridConfig`] is plain data so hosts can load it from any serde format.
//! Missing fields fall back to the reference dashboard defaults: five
//! breakpoints (24 columns, 12 on `xxs`), 36px rows, 10px margins.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::breakpoint::{Breakpoint, BreakpointTable};

/// Column count every placement's coordinates are expressed against.
pub const DEFAULT_DESIGN_COLUMNS: u32 = 24;

/// Pixels per grid row.
pub const DEFAULT_ROW_HEIGHT_PX: u32 = 36;

/// Grid rows occupied by a row header band.
pub const DEFAULT_HEADER_ROWS: u32 = 2;

/// Number of document versions retained for undo.
pub const DEFAULT_HISTORY_DEPTH: usize = 100;

/// Layout engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub breakpoints: BreakpointTable,
    pub design_columns: u32,
    pub row_height_px: u32,
    /// Horizontal and vertical gap between cells, also used as container padding.
    pub margin_px: [u32; 2],
    pub header_rows: u32,
    pub history_depth: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            breakpoints: BreakpointTable::default(),
            design_columns: DEFAULT_DESIGN_COLUMNS,
            row_height_px: DEFAULT_ROW_HEIGHT_PX,
            margin_px: [10, 10],
            header_rows: DEFAULT_HEADER_ROWS,
            history_depth: DEFAULT_HISTORY_DEPTH,
        }
    }
}

impl GridConfig {
    /// Check that the configuration can drive a layout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.breakpoints.is_empty() {
            return Err(ConfigError::NoBreakpoints);
        }
        let mut seen = BTreeSet::new();
        for spec in self.breakpoints.specs() {
            if !seen.insert(spec.breakpoint) {
                return Err(ConfigError::DuplicateBreakpoint {
                    breakpoint: spec.breakpoint,
                });
            }
            if spec.columns == 0 {
                return Err(ConfigError::ZeroColumns {
                    breakpoint: spec.breakpoint,
                });
            }
        }
        if self.design_columns == 0 {
            return Err(ConfigError::ZeroDesignColumns);
        }
        if self.row_height_px == 0 {
            return Err(ConfigError::ZeroRowHeight);
        }
        if self.header_rows == 0 {
            return Err(ConfigError::ZeroHeaderRows);
        }
        if self.history_depth == 0 {
            return Err(ConfigError::ZeroHistoryDepth);
        }
        Ok(())
    }

    /// Column count for a breakpoint.
    #[must_use]
    pub fn columns(&self, breakpoint: Breakpoint) -> Option<u32> {
        self.breakpoints.columns(breakpoint)
    }

    /// Breakpoint for a container width.
    #[must_use]
    pub fn classify_width(&self, width_px: u32) -> Option<Breakpoint> {
        self.breakpoints.classify_width(width_px)
    }
}

/// Rejected configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    NoBreakpoints,
    DuplicateBreakpoint { breakpoint: Breakpoint },
    ZeroColumns { breakpoint: Breakpoint },
    ZeroDesignColumns,
    ZeroRowHeight,
    ZeroHeaderRows,
    ZeroHistoryDepth,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoBreakpoints => write!(f, "at least one breakpoint must be configured"),
            Self::DuplicateBreakpoint { breakpoint } => {
                write!(f, "breakpoint {breakpoint} is configured more than once")
            }
            Self::ZeroColumns { breakpoint } => {
                write!(f, "breakpoint {breakpoint} must have at least one column")
            }
            Self::ZeroDesignColumns => write!(f, "design column count must be > 0"),
            Self::ZeroRowHeight => write!(f, "row height must be > 0 pixels"),
            Self::ZeroHeaderRows => write!(f, "row headers must span at least one grid row"),
            Self::ZeroHistoryDepth => write!(f, "history depth must be > 0"),
        }
    }
}

impl std::error::Error for ConfigError {}
