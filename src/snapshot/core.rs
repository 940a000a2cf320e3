use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};
use crate::layout::GridPlacer;
use crate::registry::{ItemId, ItemRegistry};

/// Logical grid position of one item. Missing keys load as row 0, col 0, span 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    #[serde(default)]
    pub row: u32,
    #[serde(default)]
    pub col: u32,
    #[serde(default = "default_span")]
    pub span: u32,
}

fn default_span() -> u32 {
    1
}

/// Ordered id → placement mapping; serializes as a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    entries: IndexMap<ItemId, Placement>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Placement> {
        self.entries.get(id)
    }

    pub fn insert(&mut self, id: impl Into<ItemId>, placement: Placement) {
        self.entries.insert(id.into(), placement);
    }

    /// Entries in stored order.
    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, &Placement)> {
        self.entries.iter()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(LayoutError::Snapshot)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(LayoutError::Snapshot)
    }

    /// Parse a flat JSON object. Negative or non-integer values are rejected.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(LayoutError::Snapshot)
    }
}

/// Project every item to its logical position. Pixel geometry is not kept.
pub fn serialize(registry: &ItemRegistry) -> Snapshot {
    Snapshot {
        entries: registry
            .items()
            .map(|item| {
                (
                    item.id.clone(),
                    Placement {
                        row: item.row,
                        col: item.col,
                        span: item.span,
                    },
                )
            })
            .collect(),
    }
}

/// Clear `placer` and re-add each entry in stored order.
pub fn deserialize(snapshot: &Snapshot, placer: &mut GridPlacer) -> Result<()> {
    placer.clear();
    for (id, placement) in snapshot.iter() {
        placer.place(id.clone(), placement.row, placement.col, placement.span)?;
    }
    Ok(())
}
