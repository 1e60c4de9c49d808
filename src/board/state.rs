//! Board State Cache: the client view of which items live in which column,
//! in what order.
//!
//! A `BoardState` is either derived wholesale from a server snapshot
//! ([`BoardState::rebuild`]) or produced from another state by a pure local
//! move ([`BoardState::apply_local_move`]). It is never merged incrementally.
//! Column sequences sit behind `Arc`, so a move only reallocates the columns
//! it touches and every other column stays pointer-equal.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::models::{Column, ColumnId, ItemId, WorkItem};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardState {
    columns: BTreeMap<ColumnId, Arc<Vec<WorkItem>>>,
}

impl BoardState {
    /// Group items by column and sort each group by `order`.
    ///
    /// The sort is stable, so items with equal `order` keep their fetch order.
    pub fn rebuild(items: impl IntoIterator<Item = WorkItem>) -> Self {
        let mut grouped: BTreeMap<ColumnId, Vec<WorkItem>> = BTreeMap::new();
        for item in items {
            grouped.entry(item.column_id.clone()).or_default().push(item);
        }

        let columns = grouped
            .into_iter()
            .map(|(column_id, mut seq)| {
                seq.sort_by(|a, b| a.order.total_cmp(&b.order));
                (column_id, Arc::new(seq))
            })
            .collect();

        Self { columns }
    }

    /// Like [`rebuild`](Self::rebuild), but every known column gets an entry
    /// even when it holds no items.
    pub fn rebuild_with_columns(
        columns: &[Column],
        items: impl IntoIterator<Item = WorkItem>,
    ) -> Self {
        let mut state = Self::rebuild(items);
        for column in columns {
            state
                .columns
                .entry(column.id.clone())
                .or_insert_with(|| Arc::new(Vec::new()));
        }
        state
    }

    /// Move `item_id` to `dest_index` of `dest_column`, returning a new state.
    ///
    /// The index is clamped to `[0, len]` where `len` is the destination length
    /// once the item has been taken out. An unknown item yields an unchanged
    /// copy: a move racing a deletion is not an error.
    ///
    /// The moved item's `column_id` is rewritten and the `order` fields of the
    /// touched columns are renumbered to their new positions.
    pub fn apply_local_move(
        &self,
        item_id: &ItemId,
        dest_column: &ColumnId,
        dest_index: i64,
    ) -> BoardState {
        let Some((source_column, from)) = self.locate(item_id) else {
            return self.clone();
        };
        let source_column = source_column.clone();

        let mut columns = self.columns.clone();
        let mut source_seq: Vec<WorkItem> = self.items(&source_column).to_vec();
        let mut item = source_seq.remove(from);

        if source_column == *dest_column {
            let at = clamp_index(dest_index, source_seq.len());
            source_seq.insert(at, item);
            renumber(&mut source_seq);
            columns.insert(source_column, Arc::new(source_seq));
        } else {
            let mut dest_seq: Vec<WorkItem> = self.items(dest_column).to_vec();
            let at = clamp_index(dest_index, dest_seq.len());
            item.column_id = dest_column.clone();
            dest_seq.insert(at, item);
            renumber(&mut source_seq);
            renumber(&mut dest_seq);
            columns.insert(source_column, Arc::new(source_seq));
            columns.insert(dest_column.clone(), Arc::new(dest_seq));
        }

        Self { columns }
    }

    /// Find which column holds an item and its index there.
    pub fn locate(&self, item_id: &ItemId) -> Option<(&ColumnId, usize)> {
        self.columns.iter().find_map(|(column_id, seq)| {
            seq.iter()
                .position(|item| item.id == *item_id)
                .map(|idx| (column_id, idx))
        })
    }

    pub fn get(&self, item_id: &ItemId) -> Option<&WorkItem> {
        let (column_id, idx) = self.locate(item_id)?;
        self.columns.get(column_id).map(|seq| &seq[idx])
    }

    /// Items of a column in display order; empty for an unknown column.
    pub fn items(&self, column_id: &ColumnId) -> &[WorkItem] {
        self.columns
            .get(column_id)
            .map(|seq| seq.as_slice())
            .unwrap_or(&[])
    }

    /// Shared handle to a column's sequence, for identity comparisons.
    pub fn column(&self, column_id: &ColumnId) -> Option<&Arc<Vec<WorkItem>>> {
        self.columns.get(column_id)
    }

    pub fn column_len(&self, column_id: &ColumnId) -> usize {
        self.items(column_id).len()
    }

    pub fn column_ids(&self) -> impl Iterator<Item = &ColumnId> {
        self.columns.keys()
    }

    pub fn total_items(&self) -> usize {
        self.columns.values().map(|seq| seq.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_items() == 0
    }

    /// Flatten back into a list of items, column by column.
    pub fn snapshot_items(&self) -> Vec<WorkItem> {
        self.columns
            .values()
            .flat_map(|seq| seq.iter().cloned())
            .collect()
    }
}

fn clamp_index(index: i64, len: usize) -> usize {
    if index < 0 {
        0
    } else {
        usize::try_from(index).unwrap_or(usize::MAX).min(len)
    }
}

fn renumber(seq: &mut [WorkItem]) {
    for (position, item) in seq.iter_mut().enumerate() {
        item.order = position as f64;
    }
}
