//! Panel layout engine.
//!
//! Arranges variable-width panels inside a responsive multi-column container
//! and keeps them from overlapping as the container resizes. The engine works
//! on plain data; hosts translate [`Rect`] output into their own widget API.
//!
//! Two strategies are available:
//! - [`GridPlacer`]: explicit `(row, col, span)` placement with collision
//!   detection and auto-shift, persisted through [`Snapshot`].
//! - [`SkylinePacker`]: masonry packing that drops each panel onto the lowest
//!   column window that fits it.

pub mod config;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod logging;
pub mod metrics;
pub mod registry;
pub mod snapshot;

pub use config::EngineConfig;
pub use error::{LayoutError, Result};
pub use geometry::{Margins, Rect};
pub use layout::{
    Breakpoint, ColumnHeights, ColumnResolver, Container, GridPlacer, PackItem, PackOutcome,
    PackedItem, SkylinePacker,
};
pub use logging::{FileSink, LogEvent, LogLevel, LogSink, Logger, LoggingError, MemorySink};
pub use metrics::{LayoutMetrics, MetricSnapshot};
pub use registry::{Item, ItemId, ItemRegistry};
pub use snapshot::{Placement, Snapshot};
