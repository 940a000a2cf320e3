use thiserror::Error;

/// Unified result type for the panel layout engine.
pub type Result<T> = std::result::Result<T, LayoutError>;

/// Errors surfaced by the layout engine.
///
/// Unknown item ids and out-of-range spans are routine UI states and never
/// show up here; they are answered with `false`/`None` or clamped instead.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("`{field}` must be non-negative, got {value}")]
    NegativeDimension { field: &'static str, value: i64 },
    #[error("invalid breakpoint table: {0}")]
    InvalidBreakpoints(String),
    #[error("no free row left for `{0}` in its column window")]
    RowsExhausted(String),
    #[error("item `{0}` appears more than once in the pack input")]
    DuplicateItem(String),
    #[error("snapshot error: {0}")]
    Snapshot(#[source] serde_json::Error),
    #[error("config error: {0}")]
    Config(#[source] serde_json::Error),
}

/// Validate a host-supplied coordinate or dimension.
pub fn non_negative(field: &'static str, value: i32) -> Result<u32> {
    u32::try_from(value).map_err(|_| LayoutError::NegativeDimension {
        field,
        value: value as i64,
    })
}
