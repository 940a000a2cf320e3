//! Error module orchestrator.
//!
//! Callers import `LayoutError` and `Result` from here; variants live in `types`.

mod types;

pub use types::{LayoutError, Result, non_negative};
