use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;

/// Counters accumulated by a placer over its lifetime.
#[derive(Debug, Default, Clone)]
pub struct LayoutMetrics {
    placements: u64,
    auto_shifts: u64,
    span_clamps: u64,
    reflows: u64,
    pack_passes: u64,
}

impl LayoutMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_placement(&mut self, shifted: bool, clamped: bool) {
        self.placements = self.placements.saturating_add(1);
        if shifted {
            self.auto_shifts = self.auto_shifts.saturating_add(1);
        }
        if clamped {
            self.span_clamps = self.span_clamps.saturating_add(1);
        }
    }

    pub fn record_reflow(&mut self) {
        self.reflows = self.reflows.saturating_add(1);
    }

    pub fn record_pack(&mut self, clamped: usize) {
        self.pack_passes = self.pack_passes.saturating_add(1);
        self.span_clamps = self.span_clamps.saturating_add(clamped as u64);
    }

    pub fn snapshot(&self) -> MetricSnapshot {
        MetricSnapshot {
            placements: self.placements,
            auto_shifts: self.auto_shifts,
            span_clamps: self.span_clamps,
            reflows: self.reflows,
            pack_passes: self.pack_passes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricSnapshot {
    pub placements: u64,
    pub auto_shifts: u64,
    pub span_clamps: u64,
    pub reflows: u64,
    pub pack_passes: u64,
}

impl MetricSnapshot {
    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("placements".to_string(), json!(self.placements));
        map.insert("auto_shifts".to_string(), json!(self.auto_shifts));
        map.insert("span_clamps".to_string(), json!(self.span_clamps));
        map.insert("reflows".to_string(), json!(self.reflows));
        map.insert("pack_passes".to_string(), json!(self.pack_passes));
        map
    }

    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "layout_metrics", self.as_fields())
    }
}
