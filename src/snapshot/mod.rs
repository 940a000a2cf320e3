//! Snapshot module orchestrator.
//!
//! Flat `{id: {row, col, span}}` persistence for grid-mode layouts.

mod core;

pub use self::core::{Placement, Snapshot, deserialize, serialize};
