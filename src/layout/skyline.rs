//! Greedy skyline (masonry) packing.
//!
//! Explicit positions are ignored. Items drop, in arrival order, onto the
//! column window whose tallest column is lowest; ties go to the leftmost
//! window. Column heights are reset at the start of every pass.

use indexmap::IndexMap;
use serde_json::json;

use crate::config::EngineConfig;
use crate::error::{LayoutError, Result, non_negative};
use crate::geometry::Rect;
use crate::layout::columns::{ColumnResolver, Container};
use crate::logging::{LogLevel, Logger, SKYLINE_TARGET, json_kv};
use crate::metrics::LayoutMetrics;
use crate::registry::{ItemId, ItemRegistry};

/// Host-supplied input for one packed item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackItem {
    pub id: ItemId,
    /// Requested column span; values below 1 pack as 1.
    pub span: i32,
    /// Intrinsic content height in pixels.
    pub height: i32,
}

impl PackItem {
    pub fn new(id: impl Into<ItemId>, span: i32, height: i32) -> Self {
        Self {
            id: id.into(),
            span,
            height,
        }
    }
}

/// Lowest free y per column, relative to the content origin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnHeights {
    heights: Vec<u32>,
}

impl ColumnHeights {
    pub fn new(columns: u32) -> Self {
        Self {
            heights: vec![0; columns.max(1) as usize],
        }
    }

    pub fn reset(&mut self, columns: u32) {
        self.heights.clear();
        self.heights.resize(columns.max(1) as usize, 0);
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.heights
    }

    pub fn columns(&self) -> u32 {
        self.heights.len() as u32
    }

    /// Leftmost start column minimizing the tallest column under `span`,
    /// with that height.
    pub fn best_fit(&self, span: u32) -> (u32, u32) {
        let span = (span.max(1) as usize).min(self.heights.len());
        self.heights
            .windows(span)
            .enumerate()
            .map(|(col, window)| (col as u32, window.iter().copied().max().unwrap_or(0)))
            .fold(None, |best: Option<(u32, u32)>, candidate| match best {
                Some(current) if current.1 <= candidate.1 => Some(current),
                _ => Some(candidate),
            })
            .unwrap_or((0, 0))
    }

    /// Raise columns `[col, col + span)` to `height`.
    pub fn raise(&mut self, col: u32, span: u32, height: u32) {
        let start = col as usize;
        let end = (start + span as usize).min(self.heights.len());
        for slot in &mut self.heights[start..end] {
            *slot = height;
        }
    }

    pub fn max(&self) -> u32 {
        self.heights.iter().copied().max().unwrap_or(0)
    }
}

/// Where one item landed during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedItem {
    pub col: u32,
    pub span: u32,
    pub rect: Rect,
}

/// Full result of a pass: per-item placement plus container-level figures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackOutcome {
    pub columns: u32,
    pub items: IndexMap<ItemId, PackedItem>,
    /// Height of the packed content, excluding margins and trailing spacing.
    pub content_height: u32,
}

impl PackOutcome {
    pub fn rect(&self, id: &str) -> Option<Rect> {
        self.items.get(id).map(|packed| packed.rect)
    }

    pub fn rects(&self) -> IndexMap<ItemId, Rect> {
        self.items
            .iter()
            .map(|(id, packed)| (id.clone(), packed.rect))
            .collect()
    }
}

#[derive(Debug)]
pub struct SkylinePacker {
    config: EngineConfig,
    resolver: ColumnResolver,
    skyline: ColumnHeights,
    logger: Option<Logger>,
    metrics: LayoutMetrics,
}

impl SkylinePacker {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let resolver = config.resolver()?;
        let skyline = ColumnHeights::new(resolver.max_columns());
        Ok(Self {
            config,
            resolver,
            skyline,
            logger: None,
            metrics: LayoutMetrics::new(),
        })
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn metrics(&self) -> &LayoutMetrics {
        &self.metrics
    }

    /// Column heights left behind by the most recent pass.
    pub fn skyline(&self) -> &ColumnHeights {
        &self.skyline
    }

    pub fn calculate_columns(&self, width: i32) -> Result<u32> {
        Ok(self.resolver.resolve(non_negative("width", width)?))
    }

    /// Pack `items` into a container `width` pixels wide, returning a rect per id.
    pub fn pack(&mut self, items: &[PackItem], width: i32) -> Result<IndexMap<ItemId, Rect>> {
        self.pack_detailed(items, width).map(|outcome| outcome.rects())
    }

    pub fn pack_detailed(&mut self, items: &[PackItem], width: i32) -> Result<PackOutcome> {
        let width = non_negative("width", width)?;
        let columns = self.resolver.resolve(width);
        let container = Container::measure(
            width,
            columns,
            self.config.spacing,
            self.config.margins,
        );
        self.skyline.reset(columns);

        let mut placed: IndexMap<ItemId, PackedItem> = IndexMap::with_capacity(items.len());
        let mut clamped = 0usize;
        for item in items {
            let height = non_negative("height", item.height)?;
            if placed.contains_key(&item.id) {
                return Err(LayoutError::DuplicateItem(item.id.clone()));
            }

            let requested = u32::try_from(item.span).unwrap_or(0);
            let span = requested.clamp(1, columns);
            if span != requested {
                clamped += 1;
            }

            let (col, top) = self.skyline.best_fit(span);
            self.skyline.raise(
                col,
                span,
                top.saturating_add(height).saturating_add(container.spacing),
            );

            let rect = Rect::new(
                container.x(col),
                container.origin_y.saturating_add(top),
                container.span_width(span),
                height,
            );
            placed.insert(item.id.clone(), PackedItem { col, span, rect });
        }

        let content_height = if placed.is_empty() {
            0
        } else {
            self.skyline.max().saturating_sub(container.spacing)
        };
        self.metrics.record_pack(clamped);

        if let Some(logger) = &self.logger {
            logger.emit(
                LogLevel::Debug,
                SKYLINE_TARGET,
                "pack_completed",
                [
                    json_kv("items", placed.len()),
                    json_kv("columns", columns),
                    json_kv("width", width),
                    json_kv("content_height", content_height),
                    json_kv("skyline", json!(self.skyline.as_slice())),
                ],
            );
        }

        Ok(PackOutcome {
            columns,
            items: placed,
            content_height,
        })
    }

    /// Pack and write the result into `registry`, which afterwards holds
    /// exactly the packed items. Skyline items all report row 0.
    pub fn pack_into(
        &mut self,
        registry: &mut ItemRegistry,
        items: &[PackItem],
        width: i32,
    ) -> Result<PackOutcome> {
        let outcome = self.pack_detailed(items, width)?;
        registry.sync_geometry(&outcome.rects());
        for (id, packed) in &outcome.items {
            if let Some(item) = registry.get_mut(id) {
                item.row = 0;
                item.col = packed.col;
                item.span = packed.span;
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Margins;
    use crate::logging::MemorySink;

    fn packer() -> SkylinePacker {
        SkylinePacker::new(EngineConfig::default()).unwrap()
    }

    fn panels() -> Vec<PackItem> {
        vec![
            PackItem::new("Security", 2, 300),
            PackItem::new("Performance", 1, 180),
            PackItem::new("OpenImageIO", 4, 120),
        ]
    }

    #[test]
    fn best_fit_prefers_lowest_then_leftmost() {
        let mut skyline = ColumnHeights::new(4);
        skyline.raise(0, 2, 50);
        assert_eq!(skyline.best_fit(1), (2, 0));
        assert_eq!(skyline.best_fit(2), (2, 0));
        assert_eq!(skyline.best_fit(3), (0, 50));
        skyline.raise(2, 2, 50);
        assert_eq!(skyline.best_fit(2), (0, 50));
        assert_eq!(skyline.best_fit(9), (0, 50));
    }

    #[test]
    fn wide_item_lands_below_everything_it_spans() {
        let mut packer = packer();
        let rects = packer.pack(&panels(), 1800).unwrap();

        let security = rects["Security"];
        let performance = rects["Performance"];
        let oiio = rects["OpenImageIO"];
        assert_eq!((security.x, security.y), (0, 0));
        assert_eq!((performance.x, performance.y), (904, 0));
        assert!(oiio.y >= security.bottom().max(performance.bottom()));
        assert_eq!(oiio.y, 310);
        assert_eq!(oiio.width, 1798);
    }

    #[test]
    fn repeated_passes_are_identical() {
        let mut packer = packer();
        let first = packer.pack_detailed(&panels(), 1200).unwrap();
        let second = packer.pack_detailed(&panels(), 1200).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.columns, 3);
    }

    #[test]
    fn spans_clamp_to_resolved_columns() {
        let mut packer = packer();
        let outcome = packer
            .pack_detailed(
                &[PackItem::new("wide", 4, 100), PackItem::new("zero", 0, 40)],
                800,
            )
            .unwrap();
        assert_eq!(outcome.columns, 2);
        assert_eq!(outcome.items["wide"].span, 2);
        assert_eq!(outcome.items["zero"].span, 1);
        assert_eq!(outcome.items["zero"].rect.y, 110);
        assert_eq!(outcome.content_height, 150);
        assert_eq!(packer.metrics().snapshot().span_clamps, 2);
    }

    #[test]
    fn shorter_column_receives_next_item() {
        let mut packer = SkylinePacker::new(EngineConfig::default().with_spacing(0)).unwrap();
        let outcome = packer
            .pack_detailed(
                &[
                    PackItem::new("a", 1, 100),
                    PackItem::new("b", 1, 40),
                    PackItem::new("c", 1, 10),
                ],
                700,
            )
            .unwrap();
        assert_eq!(outcome.items["c"].col, 1);
        assert_eq!(outcome.items["c"].rect.y, 40);
        assert_eq!(packer.skyline().as_slice(), &[100, 50]);
    }

    #[test]
    fn margins_offset_the_origin() {
        let config = EngineConfig::default().with_margins(Margins::uniform(20));
        let mut packer = SkylinePacker::new(config).unwrap();
        let rects = packer.pack(&[PackItem::new("only", 1, 50)], 500).unwrap();
        assert_eq!(rects["only"], Rect::new(20, 20, 460, 50));
    }

    #[test]
    fn rejects_negative_input_and_duplicates() {
        let mut packer = packer();
        assert!(matches!(
            packer.pack(&panels(), -1),
            Err(LayoutError::NegativeDimension { field: "width", .. })
        ));
        assert!(matches!(
            packer.pack(&[PackItem::new("a", 1, -3)], 800),
            Err(LayoutError::NegativeDimension { field: "height", .. })
        ));
        assert!(matches!(
            packer.pack(&[PackItem::new("a", 1, 3), PackItem::new("a", 1, 3)], 800),
            Err(LayoutError::DuplicateItem(id)) if id == "a"
        ));
    }

    #[test]
    fn empty_input_packs_to_nothing() {
        let mut packer = packer();
        let outcome = packer.pack_detailed(&[], 1200).unwrap();
        assert!(outcome.items.is_empty());
        assert_eq!(outcome.content_height, 0);
        assert_eq!(packer.skyline().as_slice(), &[0, 0, 0]);
        assert_eq!(packer.skyline().columns(), 3);
    }

    #[test]
    fn pack_into_mirrors_outcome_in_registry() {
        let mut packer = packer();
        let mut registry = ItemRegistry::new();
        registry.insert(crate::registry::Item::new("gone", 5, 0, 1));

        let outcome = packer.pack_into(&mut registry, &panels(), 1800).unwrap();
        assert!(!registry.contains("gone"));
        let security = registry.get("Security").unwrap();
        assert_eq!((security.col, security.span), (0, 2));
        assert_eq!(security.rect, outcome.rect("Security"));
        assert_eq!(registry.take_dirty().len(), 3);
    }

    #[test]
    fn logs_one_event_per_pass() {
        let sink = MemorySink::new();
        let mut packer = packer().with_logger(Logger::new(sink.clone()));
        packer.pack(&panels(), 1800).unwrap();
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].message, "pack_completed");
        assert_eq!(events[0].field("skyline"), Some(&json!([440, 440, 440, 440])));
    }
}
