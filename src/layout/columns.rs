//! Responsive column resolution.
//!
//! Maps a container width onto a column count through an ascending table of
//! breakpoints, and derives the per-column pixel metrics both placers share.

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};
use crate::geometry::Margins;

/// Width threshold at which the resolved column count changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub min_width: u32,
    pub columns: u32,
}

impl Breakpoint {
    pub const fn new(min_width: u32, columns: u32) -> Self {
        Self { min_width, columns }
    }
}

/// Breakpoints used when the host does not configure its own table.
pub const DEFAULT_BREAKPOINTS: [Breakpoint; 4] = [
    Breakpoint::new(0, 1),
    Breakpoint::new(600, 2),
    Breakpoint::new(1000, 3),
    Breakpoint::new(1500, 4),
];

/// Pure width → column count mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnResolver {
    breakpoints: Vec<Breakpoint>,
}

impl Default for ColumnResolver {
    fn default() -> Self {
        Self {
            breakpoints: DEFAULT_BREAKPOINTS.to_vec(),
        }
    }
}

impl ColumnResolver {
    /// Build a resolver, rejecting empty tables, zero column counts and
    /// thresholds that are not strictly increasing.
    pub fn new(breakpoints: Vec<Breakpoint>) -> Result<Self> {
        if breakpoints.is_empty() {
            return Err(LayoutError::InvalidBreakpoints(
                "at least one breakpoint is required".to_string(),
            ));
        }
        if let Some(bp) = breakpoints.iter().find(|bp| bp.columns == 0) {
            return Err(LayoutError::InvalidBreakpoints(format!(
                "breakpoint at {}px resolves to zero columns",
                bp.min_width
            )));
        }
        if let Some(pair) = breakpoints
            .windows(2)
            .find(|pair| pair[0].min_width >= pair[1].min_width)
        {
            return Err(LayoutError::InvalidBreakpoints(format!(
                "thresholds must be strictly increasing ({}px then {}px)",
                pair[0].min_width, pair[1].min_width
            )));
        }
        Ok(Self { breakpoints })
    }

    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    /// Column count of the last breakpoint whose threshold is ≤ `width`, at least 1.
    pub fn resolve(&self, width: u32) -> u32 {
        self.breakpoints
            .iter()
            .take_while(|bp| bp.min_width <= width)
            .last()
            .map(|bp| bp.columns)
            .unwrap_or(1)
            .max(1)
    }

    pub fn max_columns(&self) -> u32 {
        self.breakpoints
            .iter()
            .map(|bp| bp.columns)
            .max()
            .unwrap_or(1)
    }
}

/// Column metrics for one container width. Recomputed on every resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Container {
    pub columns: u32,
    pub column_width: u32,
    pub spacing: u32,
    pub origin_x: u32,
    pub origin_y: u32,
}

impl Container {
    pub fn measure(width: u32, columns: u32, spacing: u32, margins: Margins) -> Self {
        let columns = columns.max(1);
        let available = width.saturating_sub(margins.horizontal());
        let gaps = spacing.saturating_mul(columns - 1);
        Self {
            columns,
            column_width: available.saturating_sub(gaps) / columns,
            spacing,
            origin_x: margins.left,
            origin_y: margins.top,
        }
    }

    /// Left edge of column `col`.
    pub fn x(&self, col: u32) -> u32 {
        self.origin_x
            .saturating_add(col.saturating_mul(self.column_width.saturating_add(self.spacing)))
    }

    /// Pixel width of an item covering `span` columns, gaps included.
    pub fn span_width(&self, span: u32) -> u32 {
        let span = span.max(1);
        span.saturating_mul(self.column_width)
            .saturating_add((span - 1).saturating_mul(self.spacing))
    }
}
