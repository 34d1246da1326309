//! Viewport breakpoints and their column counts.
//!
//! A [`BreakpointTable`] maps each [`Breakpoint`] tier to a minimum container
//! width (in pixels) and a logical column count. The grid is horizontally
//! fluid: column width is derived from the container width, while row height
//! is a fixed unit owned by [`GridConfig`](crate::GridConfig).
//!
//! | Breakpoint | Default Min Width | Columns |
//! |------------|-------------------|---------|
//! | `Xxs`      | 0px               | 12      |
//! | `Xs`       | 480px             | 24      |
//! | `Sm`       | 768px             | 24      |
//! | `Md`       | 996px             | 24      |
//! | `Lg`       | 1200px            | 24      |
//!
//! # Invariants
//!
//! 1. Classification picks the entry with the largest `min_width_px` that is
//!    `<=` the container width.
//! 2. The narrowest breakpoint is the entry with the smallest `min_width_px`;
//!    it is the only tier that ignores explicit coordinates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Named viewport-width tier, ordered from narrowest to widest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breakpoint {
    Xxs,
    Xs,
    Sm,
    Md,
    Lg,
}

impl Breakpoint {
    /// All breakpoints in ascending order.
    pub const ALL: [Breakpoint; 5] = [
        Breakpoint::Xxs,
        Breakpoint::Xs,
        Breakpoint::Sm,
        Breakpoint::Md,
        Breakpoint::Lg,
    ];

    /// Short label used in configuration files and logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Breakpoint::Xxs => "xxs",
            Breakpoint::Xs => "xs",
            Breakpoint::Sm => "sm",
            Breakpoint::Md => "md",
            Breakpoint::Lg => "lg",
        }
    }
}

impl fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Error returned when parsing an unknown breakpoint label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseBreakpointError {
    pub input: String,
}

impl fmt::Display for ParseBreakpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown breakpoint `{}` (expected one of xxs, xs, sm, md, lg)",
            self.input
        )
    }
}

impl std::error::Error for ParseBreakpointError {}

impl FromStr for Breakpoint {
    type Err = ParseBreakpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Breakpoint::ALL
            .into_iter()
            .find(|bp| bp.label() == normalized)
            .ok_or(ParseBreakpointError {
                input: s.to_string(),
            })
    }
}

/// Threshold and column count for one breakpoint tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakpointSpec {
    #[serde(rename = "name")]
    pub breakpoint: Breakpoint,
    pub min_width_px: u32,
    pub columns: u32,
}

impl BreakpointSpec {
    #[must_use]
    pub const fn new(breakpoint: Breakpoint, min_width_px: u32, columns: u32) -> Self {
        Self {
            breakpoint,
            min_width_px,
            columns,
        }
    }
}

/// Ordered set of breakpoint specs.
///
/// Entries are kept sorted by ascending `min_width_px` so classification and
/// narrowest-tier lookup are simple scans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<BreakpointSpec>", into = "Vec<BreakpointSpec>")]
pub struct BreakpointTable {
    specs: Vec<BreakpointSpec>,
}

impl BreakpointTable {
    /// Build a table from arbitrary-order specs.
    #[must_use]
    pub fn new(specs: impl IntoIterator<Item = BreakpointSpec>) -> Self {
        let mut specs: Vec<BreakpointSpec> = specs.into_iter().collect();
        specs.sort_by_key(|spec| (spec.min_width_px, spec.breakpoint));
        Self { specs }
    }

    /// Specs in ascending width order.
    #[must_use]
    pub fn specs(&self) -> &[BreakpointSpec] {
        &self.specs
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Lookup the spec for a breakpoint.
    #[must_use]
    pub fn get(&self, breakpoint: Breakpoint) -> Option<&BreakpointSpec> {
        self.specs.iter().find(|spec| spec.breakpoint == breakpoint)
    }

    /// Column count for a breakpoint, if configured.
    #[must_use]
    pub fn columns(&self, breakpoint: Breakpoint) -> Option<u32> {
        self.get(breakpoint).map(|spec| spec.columns)
    }

    /// The tier with the smallest minimum width.
    #[must_use]
    pub fn narrowest(&self) -> Option<Breakpoint> {
        self.specs.first().map(|spec| spec.breakpoint)
    }

    #[must_use]
    pub fn is_narrowest(&self, breakpoint: Breakpoint) -> bool {
        self.narrowest() == Some(breakpoint)
    }

    /// Classify a container width into a breakpoint.
    ///
    /// Widths below every threshold fall back to the narrowest tier.
    #[must_use]
    pub fn classify_width(&self, width_px: u32) -> Option<Breakpoint> {
        self.specs
            .iter()
            .rev()
            .find(|spec| spec.min_width_px <= width_px)
            .or_else(|| self.specs.first())
            .map(|spec| spec.breakpoint)
    }
}

impl Default for BreakpointTable {
    fn default() -> Self {
        Self::new([
            BreakpointSpec::new(Breakpoint::Lg, 1200, 24),
            BreakpointSpec::new(Breakpoint::Md, 996, 24),
            BreakpointSpec::new(Breakpoint::Sm, 768, 24),
            BreakpointSpec::new(Breakpoint::Xs, 480, 24),
            BreakpointSpec::new(Breakpoint::Xxs, 0, 12),
        ])
    }
}

impl From<Vec<BreakpointSpec>> for BreakpointTable {
    fn from(specs: Vec<BreakpointSpec>) -> Self {
        Self::new(specs)
    }
}

impl From<BreakpointTable> for Vec<BreakpointSpec> {
    fn from(table: BreakpointTable) -> Self {
        table.specs
    }
}
