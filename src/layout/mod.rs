//! Layout module orchestrator.
//!
//! Two placement strategies share the column resolver: the explicit-position
//! [`GridPlacer`] and the greedy [`SkylinePacker`].

pub mod columns;
pub mod grid;
pub mod skyline;

pub use columns::{Breakpoint, ColumnResolver, Container, DEFAULT_BREAKPOINTS};
pub use grid::GridPlacer;
pub use skyline::{ColumnHeights, PackItem, PackOutcome, PackedItem, SkylinePacker};
