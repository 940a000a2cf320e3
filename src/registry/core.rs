use indexmap::{IndexMap, IndexSet};

use crate::geometry::Rect;

pub type ItemId = String;

/// A placed panel: logical grid position plus last-known pixel geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub row: u32,
    pub col: u32,
    pub span: u32,
    /// Valid only after a layout pass has run.
    pub rect: Option<Rect>,
}

impl Item {
    pub fn new(id: impl Into<ItemId>, row: u32, col: u32, span: u32) -> Self {
        Self {
            id: id.into(),
            row,
            col,
            span,
            rect: None,
        }
    }

    /// One past the last column this item covers.
    pub fn end_col(&self) -> u32 {
        self.col + self.span
    }

    /// True when this item covers any of `[col, col + span)` on `row`.
    pub fn overlaps(&self, row: u32, col: u32, span: u32) -> bool {
        self.row == row && self.col < col + span && col < self.end_col()
    }
}

/// Insertion-ordered owner of every item known to a placer.
#[derive(Debug, Default, Clone)]
pub struct ItemRegistry {
    entries: IndexMap<ItemId, Item>,
    dirty: IndexSet<ItemId>,
}

impl ItemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.entries.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Item> {
        self.entries.get_mut(id)
    }

    /// Items in insertion order.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.entries.values()
    }

    /// Insert or replace. A replaced item keeps its original insertion slot.
    pub fn insert(&mut self, item: Item) -> Option<Item> {
        let id = item.id.clone();
        let previous = self.entries.insert(id.clone(), item);
        let rect_changed = match (&previous, self.entries.get(&id)) {
            (Some(old), Some(new)) => old.rect != new.rect,
            _ => true,
        };
        if rect_changed {
            self.dirty.insert(id);
        }
        previous
    }

    pub fn remove(&mut self, id: &str) -> Option<Item> {
        self.dirty.shift_remove(id);
        self.entries.shift_remove(id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.dirty.clear();
    }

    /// Record new geometry for one item, flagging it dirty if it moved.
    pub fn set_rect(&mut self, id: &str, rect: Rect) -> bool {
        match self.entries.get_mut(id) {
            Some(item) => {
                if item.rect != Some(rect) {
                    item.rect = Some(rect);
                    self.dirty.insert(item.id.clone());
                }
                true
            }
            None => false,
        }
    }

    /// Apply a full pass worth of geometry. Items absent from `solved` are dropped.
    pub fn sync_geometry(&mut self, solved: &IndexMap<ItemId, Rect>) {
        self.entries.retain(|id, _| solved.contains_key(id));
        let entries = &self.entries;
        self.dirty.retain(|id| entries.contains_key(id));

        for (id, rect) in solved {
            if !self.set_rect(id, *rect) {
                let mut item = Item::new(id.clone(), 0, 0, 1);
                item.rect = Some(*rect);
                self.insert(item);
            }
        }
    }

    /// Drain the items whose geometry changed since the previous call.
    pub fn take_dirty(&mut self) -> Vec<Item> {
        let ids: Vec<_> = self.dirty.drain(..).collect();
        ids.into_iter()
            .filter_map(|id| self.entries.get(&id).cloned())
            .collect()
    }

    pub fn has_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }
}
