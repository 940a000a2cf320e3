//! Engine configuration shared by the grid placer and the skyline packer.

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};
use crate::geometry::Margins;
use crate::layout::columns::{Breakpoint, ColumnResolver, DEFAULT_BREAKPOINTS};

pub const DEFAULT_SPACING: u32 = 10;

/// Configuration knobs fixed for the lifetime of a placer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Gap in pixels between adjacent columns and between stacked items.
    pub spacing: u32,
    /// Inset applied around the packed content.
    pub margins: Margins,
    /// Ascending width thresholds used to resolve the column count.
    pub breakpoints: Vec<Breakpoint>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            spacing: DEFAULT_SPACING,
            margins: Margins::default(),
            breakpoints: DEFAULT_BREAKPOINTS.to_vec(),
        }
    }
}

impl EngineConfig {
    /// Parse a JSON document; absent keys fall back to the defaults.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(LayoutError::Config)
    }

    pub fn with_spacing(mut self, spacing: u32) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    pub fn with_breakpoints(mut self, breakpoints: Vec<Breakpoint>) -> Self {
        self.breakpoints = breakpoints;
        self
    }

    /// Validate the breakpoint table and build the resolver for it.
    pub fn resolver(&self) -> Result<ColumnResolver> {
        ColumnResolver::new(self.breakpoints.clone())
    }
}
