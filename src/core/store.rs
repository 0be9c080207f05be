//! Snapshot history with a navigation cursor.
//!
//! The store keeps every snapshot of a run in cycle order and a cursor that
//! selects the snapshot currently on display. The cursor is always a valid
//! index while the store is non-empty; navigation past either end is a no-op
//! rather than an error.

use crate::common::StoreError;
use crate::core::pipeline::CycleSnapshot;

/// Ordered snapshot sequence plus cursor.
#[derive(Clone, Debug, Default)]
pub struct SnapshotStore {
    snapshots: Vec<CycleSnapshot>,
    cursor: usize,
}

impl SnapshotStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a completed snapshot. The cursor does not move.
    pub fn append(&mut self, snapshot: CycleSnapshot) {
        self.snapshots.push(snapshot);
    }

    /// Drops every snapshot and rewinds the cursor.
    pub fn reset(&mut self) {
        self.snapshots.clear();
        self.cursor = 0;
    }

    /// Number of snapshots held.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Returns `true` if no snapshot has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Current cursor position.
    ///
    /// Meaningful only while the store is non-empty.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Moves the cursor to `index`.
    ///
    /// # Errors
    ///
    /// `StoreError::Range` if `index` is not in `0..len`; the cursor is left
    /// where it was.
    pub fn jump_to(&mut self, index: usize) -> Result<(), StoreError> {
        if index >= self.snapshots.len() {
            return Err(StoreError::Range {
                index,
                len: self.snapshots.len(),
            });
        }
        self.cursor = index;
        Ok(())
    }

    /// Moves the cursor to the first snapshot, if any.
    pub fn jump_to_first(&mut self) {
        self.cursor = 0;
    }

    /// Moves the cursor to the last snapshot, if any.
    pub fn jump_to_last(&mut self) {
        self.cursor = self.snapshots.len().saturating_sub(1);
    }

    /// Advances the cursor by one; does nothing at the end.
    pub fn next(&mut self) {
        if !self.at_end() {
            self.cursor += 1;
        }
    }

    /// Moves the cursor back by one; does nothing at the start.
    pub fn prev(&mut self) {
        if !self.at_start() {
            self.cursor -= 1;
        }
    }

    /// Returns `true` if `prev` would not move the cursor.
    pub fn at_start(&self) -> bool {
        self.cursor == 0
    }

    /// Returns `true` if `next` would not move the cursor.
    pub fn at_end(&self) -> bool {
        self.cursor + 1 >= self.snapshots.len()
    }

    /// Snapshot under the cursor.
    ///
    /// # Errors
    ///
    /// `StoreError::Empty` if nothing has been appended yet.
    pub fn current(&self) -> Result<&CycleSnapshot, StoreError> {
        self.snapshots.get(self.cursor).ok_or(StoreError::Empty)
    }

    /// Snapshot at `index`, if present.
    pub fn get(&self, index: usize) -> Option<&CycleSnapshot> {
        self.snapshots.get(index)
    }

    /// Most recently appended snapshot.
    pub fn last(&self) -> Option<&CycleSnapshot> {
        self.snapshots.last()
    }

    /// Iterates snapshots in cycle order.
    pub fn iter(&self) -> std::slice::Iter<'_, CycleSnapshot> {
        self.snapshots.iter()
    }

    /// Index of the first snapshot for `cycle`.
    ///
    /// Cycle numbers never decrease along the sequence, so this is a binary
    /// search.
    pub fn position_of_cycle(&self, cycle: u64) -> Option<usize> {
        let index = self.snapshots.partition_point(|s| s.cycle() < cycle);
        self.snapshots
            .get(index)
            .filter(|s| s.cycle() == cycle)
            .map(|_| index)
    }
}

impl<'a> IntoIterator for &'a SnapshotStore {
    type Item = &'a CycleSnapshot;
    type IntoIter = std::slice::Iter<'a, CycleSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
