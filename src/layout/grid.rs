//! Explicit-position grid placement.
//!
//! Items sit at a logical `(row, col)` and cover `span` columns. Rows are
//! unbounded. A placement that would overlap another item slides down to the
//! first row where its whole column window is free, keeping its column:
//!
//! ```
//! use panel_layout::{EngineConfig, GridPlacer};
//!
//! let mut grid = GridPlacer::new(EngineConfig::default())?;
//! grid.add_item("A", 0, 0, 2)?;
//! grid.add_item("B", 0, 2, 2)?;
//! let c = grid.add_item("C", 0, 1, 1)?;
//! assert_eq!((c.row, c.col), (1, 1));
//! # Ok::<(), panel_layout::LayoutError>(())
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

use serde_json::json;

use crate::config::EngineConfig;
use crate::error::{LayoutError, Result, non_negative};
use crate::geometry::Rect;
use crate::layout::columns::{ColumnResolver, Container};
use crate::logging::{GRID_TARGET, LogLevel, Logger, json_kv};
use crate::metrics::LayoutMetrics;
use crate::registry::{Item, ItemId, ItemRegistry};
use crate::snapshot::{self, Snapshot};

/// Grid placer with collision detection and auto-shift.
#[derive(Debug)]
pub struct GridPlacer {
    registry: ItemRegistry,
    resolver: ColumnResolver,
    config: EngineConfig,
    columns: u32,
    logger: Option<Logger>,
    metrics: LayoutMetrics,
}

impl GridPlacer {
    /// Start with the widest column count the breakpoint table allows.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let resolver = config.resolver()?;
        let columns = resolver.max_columns();
        Ok(Self {
            registry: ItemRegistry::new(),
            resolver,
            config,
            columns,
            logger: None,
            metrics: LayoutMetrics::new(),
        })
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &ItemRegistry {
        &self.registry
    }

    pub fn metrics(&self) -> &LayoutMetrics {
        &self.metrics
    }

    /// Items whose pixel geometry changed since the last call.
    pub fn take_dirty(&mut self) -> Vec<Item> {
        self.registry.take_dirty()
    }

    /// Place an item, clamping its span and sliding it down past collisions.
    ///
    /// Re-adding a known id replaces that item in its original order slot.
    pub fn add_item(
        &mut self,
        id: impl Into<ItemId>,
        row: i32,
        col: i32,
        span: i32,
    ) -> Result<Item> {
        let row = non_negative("row", row)?;
        let col = non_negative("col", col)?;
        let span = u32::try_from(span).unwrap_or(0);
        self.place(id.into(), row, col, span)
    }

    /// Move an item, keeping its span. Returns whether its position changed.
    pub fn move_item(&mut self, id: &str, target_row: i32, target_col: i32) -> Result<bool> {
        let target_row = non_negative("row", target_row)?;
        let target_col = non_negative("col", target_col)?;
        let Some(item) = self.registry.get(id) else {
            return Ok(false);
        };
        let (old_row, old_col, span) = (item.row, item.col, item.span);

        let col = target_col.min(self.columns.saturating_sub(span));
        let row = self
            .first_free_row(target_row, col, span, id)
            .ok_or_else(|| LayoutError::RowsExhausted(id.to_string()))?;
        if let Some(item) = self.registry.get_mut(id) {
            item.row = row;
            item.col = col;
        }
        self.metrics.record_placement(row != target_row, false);

        let changed = (row, col) != (old_row, old_col);
        self.emit(
            LogLevel::Debug,
            "item_moved",
            [
                json_kv("id", id),
                json_kv("from", json!([old_row, old_col])),
                json_kv("to", json!([row, col])),
                json_kv("shifted", row != target_row),
            ],
        );
        Ok(changed)
    }

    /// Change an item's span, clamped to the columns right of its current column.
    ///
    /// Returns `false` for unknown ids, and when no row can take the new span
    /// (the item is then left untouched).
    pub fn resize_item(&mut self, id: &str, new_span: i32) -> bool {
        let Some(item) = self.registry.get(id) else {
            return false;
        };
        let (row, col, old_span) = (item.row, item.col, item.span);

        let requested = u32::try_from(new_span).unwrap_or(0).max(1);
        let span = requested.min(self.columns.saturating_sub(col)).max(1);
        let clamped = span != requested || new_span < 1;
        if span == old_span {
            return true;
        }

        let Some(new_row) = self.first_free_row(row, col, span, id) else {
            return false;
        };
        if let Some(item) = self.registry.get_mut(id) {
            item.row = new_row;
            item.span = span;
        }
        self.metrics.record_placement(new_row != row, clamped);

        self.emit(
            LogLevel::Debug,
            "item_resized",
            [
                json_kv("id", id),
                json_kv("from_span", old_span),
                json_kv("to_span", span),
                json_kv("row", new_row),
            ],
        );
        true
    }

    pub fn remove_item(&mut self, id: &str) -> bool {
        let removed = self.registry.remove(id).is_some();
        if removed {
            self.emit(LogLevel::Debug, "item_removed", [json_kv("id", id)]);
        }
        removed
    }

    pub fn clear(&mut self) {
        self.registry.clear();
    }

    pub fn get_item(&self, id: &str) -> Option<&Item> {
        self.registry.get(id)
    }

    /// Every item in insertion order.
    pub fn get_all_items(&self) -> Vec<&Item> {
        self.registry.items().collect()
    }

    /// Column ranges covered on `row`, sorted by starting column.
    pub fn occupied_ranges(&self, row: u32) -> Vec<Range<u32>> {
        let mut ranges: Vec<_> = self
            .registry
            .items()
            .filter(|item| item.row == row)
            .map(|item| item.col..item.end_col())
            .collect();
        ranges.sort_by_key(|range| range.start);
        ranges
    }

    pub fn calculate_columns(&self, width: i32) -> Result<u32> {
        let width = non_negative("width", width)?;
        Ok(self.resolver.resolve(width))
    }

    /// Re-resolve the column count for a new container width.
    pub fn update_columns(&mut self, width: i32) -> Result<bool> {
        let columns = self.calculate_columns(width)?;
        self.set_columns(columns)
    }

    /// Switch to `columns` and re-place every item in insertion order so the
    /// span invariant holds at the new count. Returns whether the count changed.
    ///
    /// On failure the previous column count and items are restored.
    pub fn set_columns(&mut self, columns: u32) -> Result<bool> {
        let columns = columns.max(1);
        if columns == self.columns {
            return Ok(false);
        }
        self.emit(
            LogLevel::Info,
            "columns_changed",
            [json_kv("from", self.columns), json_kv("to", columns)],
        );
        let previous_columns = self.columns;
        let previous = self.registry.clone();
        self.columns = columns;

        let items: Vec<Item> = previous.items().cloned().collect();
        self.registry.clear();
        for item in items {
            if let Err(err) = self.place(item.id, item.row, item.col, item.span) {
                self.columns = previous_columns;
                self.registry = previous;
                return Err(err);
            }
        }
        self.metrics.record_reflow();
        Ok(true)
    }

    /// Resolve columns for `width` and assign pixel rects to every item.
    ///
    /// Occupied rows stack top to bottom, each as tall as its tallest item;
    /// rows nobody occupies take no space. Returns the content height.
    pub fn layout<F>(&mut self, width: i32, height_of: F) -> Result<u32>
    where
        F: Fn(&Item) -> u32,
    {
        self.update_columns(width)?;
        let width = non_negative("width", width)?;
        let container = Container::measure(
            width,
            self.columns,
            self.config.spacing,
            self.config.margins,
        );

        let mut row_heights: BTreeMap<u32, u32> = BTreeMap::new();
        for item in self.registry.items() {
            let tallest = row_heights.entry(item.row).or_default();
            *tallest = (*tallest).max(height_of(item));
        }

        let mut row_tops = BTreeMap::new();
        let mut cursor = container.origin_y;
        for (row, height) in &row_heights {
            row_tops.insert(*row, cursor);
            cursor = cursor.saturating_add(*height).saturating_add(container.spacing);
        }

        let solved: Vec<(ItemId, Rect)> = self
            .registry
            .items()
            .map(|item| {
                let rect = Rect::new(
                    container.x(item.col),
                    row_tops.get(&item.row).copied().unwrap_or(container.origin_y),
                    container.span_width(item.span),
                    height_of(item),
                );
                (item.id.clone(), rect)
            })
            .collect();
        for (id, rect) in &solved {
            self.registry.set_rect(id, *rect);
        }

        let content_height = if row_heights.is_empty() {
            0
        } else {
            cursor
                .saturating_sub(container.spacing)
                .saturating_sub(container.origin_y)
        };
        Ok(content_height)
    }

    pub fn to_snapshot(&self) -> Snapshot {
        snapshot::serialize(&self.registry)
    }

    /// Replace every item with the snapshot's entries, in stored order.
    pub fn load_snapshot(&mut self, snapshot: &Snapshot) -> Result<()> {
        snapshot::deserialize(snapshot, self)
    }

    /// Placement shared by `add_item`, reflows and snapshot loading.
    pub(crate) fn place(
        &mut self,
        id: ItemId,
        row: u32,
        col: u32,
        requested_span: u32,
    ) -> Result<Item> {
        let col = col.min(self.columns - 1);
        let span = requested_span.max(1).min(self.columns - col);
        let clamped = span != requested_span;

        let final_row = self
            .first_free_row(row, col, span, &id)
            .ok_or_else(|| LayoutError::RowsExhausted(id.clone()))?;
        let shifted = final_row != row;

        let mut item = Item::new(id, final_row, col, span);
        item.rect = self.registry.get(&item.id).and_then(|existing| existing.rect);
        self.registry.insert(item.clone());
        self.metrics.record_placement(shifted, clamped);

        if clamped {
            self.emit(
                LogLevel::Debug,
                "span_clamped",
                [
                    json_kv("id", item.id.as_str()),
                    json_kv("requested", requested_span),
                    json_kv("span", span),
                    json_kv("columns", self.columns),
                ],
            );
        }
        self.emit(
            LogLevel::Debug,
            if shifted { "item_shifted" } else { "item_placed" },
            [
                json_kv("id", item.id.as_str()),
                json_kv("requested_row", row),
                json_kv("row", final_row),
                json_kv("col", col),
                json_kv("span", span),
            ],
        );
        Ok(item)
    }

    /// First row at or after `start` whose `[col, col + span)` window is free.
    ///
    /// Only rows holding an item that overlaps the window can block, so the
    /// scan walks the blocked rows instead of every row. When the window is
    /// taken all the way to `u32::MAX`, the lowest free row is used instead.
    /// `None` means every row is taken.
    fn first_free_row(&self, start: u32, col: u32, span: u32, ignore: &str) -> Option<u32> {
        let blocked: BTreeSet<u32> = self
            .registry
            .items()
            .filter(|item| item.id != ignore && item.col < col + span && col < item.end_col())
            .map(|item| item.row)
            .collect();

        let free_from = |from: u32| -> Option<u32> {
            let mut row = from;
            for &taken in blocked.range(from..) {
                if taken != row {
                    break;
                }
                row = row.checked_add(1)?;
            }
            Some(row)
        };
        free_from(start).or_else(|| free_from(0))
    }

    fn emit<const N: usize>(
        &self,
        level: LogLevel,
        message: &str,
        fields: [(String, serde_json::Value); N],
    ) {
        if let Some(logger) = &self.logger {
            logger.emit(level, GRID_TARGET, message, fields);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemorySink;

    fn grid() -> GridPlacer {
        GridPlacer::new(EngineConfig::default()).unwrap()
    }

    fn assert_no_overlap(grid: &GridPlacer) {
        let items = grid.get_all_items();
        for (i, a) in items.iter().enumerate() {
            assert!(a.end_col() <= grid.columns(), "{a:?} exceeds columns");
            for b in &items[i + 1..] {
                assert!(
                    !a.overlaps(b.row, b.col, b.span),
                    "{a:?} overlaps {b:?}"
                );
            }
        }
    }

    #[test]
    fn adds_items_at_requested_cells() {
        let mut grid = grid();
        let security = grid.add_item("Security", 0, 0, 2).unwrap();
        let performance = grid.add_item("Performance", 0, 2, 1).unwrap();
        let oiio = grid.add_item("OpenImageIO", 1, 0, 4).unwrap();

        assert_eq!((security.row, security.col, security.span), (0, 0, 2));
        assert_eq!((performance.row, performance.col, performance.span), (0, 2, 1));
        assert_eq!((oiio.row, oiio.col, oiio.span), (1, 0, 4));
        assert_no_overlap(&grid);
    }

    #[test]
    fn collision_shifts_to_first_free_row() {
        let mut grid = grid();
        grid.add_item("A", 0, 0, 2).unwrap();
        grid.add_item("B", 0, 2, 2).unwrap();
        let c = grid.add_item("C", 0, 1, 1).unwrap();
        assert_eq!((c.row, c.col), (1, 1));

        // Row 1 is blocked at col 1 now, so D lands on row 2.
        let d = grid.add_item("D", 1, 0, 2).unwrap();
        assert_eq!((d.row, d.col), (2, 0));
        assert_no_overlap(&grid);
    }

    #[test]
    fn full_window_at_row_ceiling_wraps_to_lowest_free_row() {
        let snapshot = Snapshot::from_json(
            r#"{"A":{"row":4294967295,"col":0,"span":4},"B":{"row":4294967295,"col":0,"span":4}}"#,
        )
        .unwrap();
        let mut grid = grid();
        grid.load_snapshot(&snapshot).unwrap();

        assert_eq!(grid.get_item("A").unwrap().row, u32::MAX);
        assert_eq!(grid.get_item("B").unwrap().row, 0);
        assert_no_overlap(&grid);

        let c = grid.place("C".to_string(), u32::MAX, 1, 1).unwrap();
        assert_eq!((c.row, c.col), (1, 1));
        assert_no_overlap(&grid);
    }

    #[test]
    fn far_rows_are_reached_without_walking_every_row() {
        let mut grid = grid();
        grid.add_item("A", i32::MAX, 0, 2).unwrap();
        let b = grid.add_item("B", i32::MAX, 1, 2).unwrap();
        assert_eq!(b.row, i32::MAX as u32 + 1);
        assert!(grid.move_item("A", i32::MAX, 1).unwrap());
        assert_eq!(grid.get_item("A").unwrap().row, i32::MAX as u32);
        assert_no_overlap(&grid);
    }

    #[test]
    fn span_is_reduced_to_fit() {
        let mut grid = grid();
        let d = grid.add_item("D", 2, 2, 3).unwrap();
        assert_eq!((d.col, d.span), (2, 2));

        let e = grid.add_item("E", 3, 9, 2).unwrap();
        assert_eq!((e.col, e.span), (3, 1));

        let f = grid.add_item("F", 4, 0, 0).unwrap();
        assert_eq!(f.span, 1);
        assert_eq!(grid.metrics().snapshot().span_clamps, 3);
    }

    #[test]
    fn negative_coordinates_fail_fast() {
        let mut grid = grid();
        assert!(matches!(
            grid.add_item("X", -1, 0, 1),
            Err(LayoutError::NegativeDimension { field: "row", .. })
        ));
        assert!(matches!(
            grid.add_item("X", 0, -2, 1),
            Err(LayoutError::NegativeDimension { field: "col", .. })
        ));
        assert!(grid.get_item("X").is_none());
        assert!(grid.calculate_columns(-10).is_err());
    }

    #[test]
    fn re_adding_replaces_without_self_collision() {
        let mut grid = grid();
        grid.add_item("A", 0, 0, 2).unwrap();
        grid.add_item("B", 0, 2, 1).unwrap();
        let again = grid.add_item("A", 0, 0, 2).unwrap();
        assert_eq!(again.row, 0);
        let ids: Vec<_> = grid.get_all_items().iter().map(|i| i.id.clone()).collect();
        assert_eq!(ids, vec!["A", "B"]);
    }

    #[test]
    fn move_reports_change_and_auto_shifts() {
        let mut grid = grid();
        grid.add_item("Security", 0, 0, 2).unwrap();
        grid.add_item("Performance", 0, 2, 1).unwrap();
        grid.add_item("OpenImageIO", 1, 0, 4).unwrap();

        assert!(grid.move_item("Performance", 1, 0).unwrap());
        let moved = grid.get_item("Performance").unwrap();
        assert_eq!((moved.row, moved.col), (2, 0));

        assert!(!grid.move_item("Performance", 2, 0).unwrap());
        assert!(!grid.move_item("missing", 0, 0).unwrap());
        assert_no_overlap(&grid);
    }

    #[test]
    fn move_keeps_span_by_clamping_column() {
        let mut grid = grid();
        grid.add_item("wide", 0, 0, 3).unwrap();
        assert!(grid.move_item("wide", 0, 3).unwrap());
        let wide = grid.get_item("wide").unwrap();
        assert_eq!((wide.col, wide.span), (1, 3));
    }

    #[test]
    fn item_never_blocks_its_own_move() {
        let mut grid = grid();
        grid.add_item("A", 0, 0, 2).unwrap();
        assert!(grid.move_item("A", 0, 1).unwrap());
        assert_eq!(grid.get_item("A").unwrap().row, 0);
    }

    #[test]
    fn resize_clamps_and_shifts_on_collision() {
        let mut grid = grid();
        grid.add_item("Security", 0, 0, 2).unwrap();
        grid.add_item("Performance", 0, 2, 1).unwrap();

        assert!(grid.resize_item("Security", 3));
        let security = grid.get_item("Security").unwrap();
        assert_eq!((security.row, security.span), (1, 3));

        assert!(grid.resize_item("Performance", 10));
        let performance = grid.get_item("Performance").unwrap();
        assert_eq!((performance.col, performance.span), (2, 2));

        assert!(grid.resize_item("Performance", -4));
        assert_eq!(grid.get_item("Performance").unwrap().span, 1);

        assert!(!grid.resize_item("missing", 2));
        assert_no_overlap(&grid);
    }

    #[test]
    fn occupied_ranges_are_sorted() {
        let mut grid = grid();
        grid.add_item("B", 0, 2, 2).unwrap();
        grid.add_item("A", 0, 0, 1).unwrap();
        assert_eq!(grid.occupied_ranges(0), vec![0..1, 2..4]);
        assert!(grid.occupied_ranges(1).is_empty());
    }

    #[test]
    fn remove_and_clear() {
        let mut grid = grid();
        grid.add_item("A", 0, 0, 4).unwrap();
        assert!(grid.remove_item("A"));
        assert!(!grid.remove_item("A"));
        let b = grid.add_item("B", 0, 0, 1).unwrap();
        assert_eq!(b.row, 0);
        grid.clear();
        assert!(grid.get_all_items().is_empty());
    }

    #[test]
    fn narrowing_reflows_items_inside_new_bounds() {
        let mut grid = grid();
        grid.add_item("A", 0, 0, 2).unwrap();
        grid.add_item("B", 0, 2, 2).unwrap();

        assert!(grid.update_columns(800).unwrap());
        assert_eq!(grid.columns(), 2);
        let a = grid.get_item("A").unwrap();
        assert_eq!((a.row, a.col, a.span), (0, 0, 2));
        // B is pulled into the last column and slides below A.
        let b = grid.get_item("B").unwrap();
        assert_eq!((b.row, b.col, b.span), (1, 1, 1));

        assert_no_overlap(&grid);
        assert!(!grid.update_columns(900).unwrap());
        assert_eq!(grid.metrics().snapshot().reflows, 1);
    }

    #[test]
    fn layout_stacks_rows_by_tallest_item() {
        let mut grid = grid();
        grid.add_item("Security", 0, 0, 2).unwrap();
        grid.add_item("Performance", 0, 2, 1).unwrap();
        grid.add_item("OpenImageIO", 3, 0, 4).unwrap();
        grid.take_dirty();

        assert_eq!(grid.config().spacing, 10);
        let height = grid
            .layout(1800, |item| match item.id.as_str() {
                "Security" => 120,
                "Performance" => 80,
                _ => 200,
            })
            .unwrap();

        // 1800 wide, 3 gaps of 10 → 442px columns.
        let security = grid.get_item("Security").unwrap().rect.unwrap();
        assert_eq!(security, Rect::new(0, 0, 894, 120));
        let performance = grid.get_item("Performance").unwrap().rect.unwrap();
        assert_eq!(performance, Rect::new(904, 0, 442, 80));
        let oiio = grid.get_item("OpenImageIO").unwrap().rect.unwrap();
        assert_eq!(oiio.y, 130);
        assert_eq!(oiio.width, 1800 - 2);
        assert_eq!(height, 330);
        assert_eq!(grid.take_dirty().len(), 3);

        grid.layout(1800, |_| 0).unwrap();
        grid.layout(1800, |_| 0).unwrap();
        assert_eq!(grid.take_dirty().len(), 3);
    }

    #[test]
    fn emits_shift_and_clamp_events() {
        let sink = MemorySink::new();
        let mut grid = grid().with_logger(Logger::new(sink.clone()));
        grid.add_item("A", 0, 0, 4).unwrap();
        grid.add_item("B", 0, 3, 2).unwrap();

        let messages = sink.messages();
        assert_eq!(
            messages,
            vec!["item_placed", "span_clamped", "item_shifted"]
        );
        let shifted = sink.events().pop().unwrap();
        assert_eq!(shifted.field("row"), Some(&json!(1)));
        assert_eq!(shifted.target, GRID_TARGET);
    }
}
