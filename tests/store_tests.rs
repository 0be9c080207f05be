//! Integration tests for the snapshot store and its cursor.

use pipetrace::common::StoreError;
use pipetrace::core::pipeline::CycleSnapshot;
use pipetrace::core::SnapshotStore;
use rstest::rstest;

/// Builds a store holding one empty snapshot per cycle number.
fn store_with(cycles: &[u64]) -> SnapshotStore {
    let mut store = SnapshotStore::new();
    for &cycle in cycles {
        store.append(CycleSnapshot::new(cycle));
    }
    store
}

/// Tests the empty store.
#[test]
fn test_empty_store() {
    let mut store = SnapshotStore::new();
    assert!(store.is_empty());
    assert!(store.at_start());
    assert!(store.at_end());
    assert_eq!(store.current(), Err(StoreError::Empty));
    assert_eq!(store.jump_to(0), Err(StoreError::Range { index: 0, len: 0 }));

    store.next();
    store.prev();
    store.jump_to_last();
    assert_eq!(store.cursor(), 0);
}

/// Tests that appending does not move the cursor.
#[test]
fn test_append_keeps_cursor() {
    let mut store = store_with(&[1, 2, 3]);
    store.jump_to(1).unwrap();
    store.append(CycleSnapshot::new(4));
    assert_eq!(store.len(), 4);
    assert_eq!(store.cursor(), 1);
    assert_eq!(store.current().unwrap().cycle(), 2);
    assert_eq!(store.last().map(CycleSnapshot::cycle), Some(4));
}

/// Tests jumping back to the first snapshot from anywhere.
#[test]
fn test_jump_to_first() {
    let mut store = store_with(&[4, 5, 6]);
    store.jump_to_last();
    store.jump_to_first();
    assert!(store.at_start());
    assert_eq!(store.current().unwrap().cycle(), 4);

    store.jump_to_first();
    assert_eq!(store.cursor(), 0);

    let mut empty = SnapshotStore::new();
    empty.jump_to_first();
    assert_eq!(empty.current(), Err(StoreError::Empty));
}

/// Tests that an out-of-range jump fails and leaves the cursor alone.
#[rstest]
#[case(3)]
#[case(4)]
#[case(usize::MAX)]
fn test_jump_out_of_range(#[case] index: usize) {
    let mut store = store_with(&[1, 2, 3]);
    store.jump_to(2).unwrap();
    assert_eq!(store.jump_to(index), Err(StoreError::Range { index, len: 3 }));
    assert_eq!(store.cursor(), 2);
}

/// Tests that jumping is idempotent.
#[test]
fn test_jump_idempotent() {
    let mut store = store_with(&[1, 2, 3]);
    store.jump_to(1).unwrap();
    store.jump_to(1).unwrap();
    assert_eq!(store.cursor(), 1);
}

/// Tests stepping to the end and past it.
#[test]
fn test_next_at_end_is_noop() {
    let mut store = store_with(&[1, 2, 3]);
    store.next();
    store.next();
    assert!(store.at_end());
    store.next();
    assert_eq!(store.cursor(), 2);
    assert!(store.at_end());
    assert!(!store.at_start());
}

/// Tests stepping back to the start and past it.
#[test]
fn test_prev_at_start_is_noop() {
    let mut store = store_with(&[1, 2, 3]);
    store.jump_to_last();
    store.prev();
    store.prev();
    store.prev();
    assert_eq!(store.cursor(), 0);
    assert!(store.at_start());
}

/// Tests a single-snapshot store is at both ends.
#[test]
fn test_single_snapshot_bounds() {
    let store = store_with(&[8]);
    assert!(store.at_start());
    assert!(store.at_end());
    assert_eq!(store.current().unwrap().cycle(), 8);
}

/// Tests reset clears data and cursor.
#[test]
fn test_reset() {
    let mut store = store_with(&[1, 2, 3]);
    store.jump_to_last();
    store.reset();
    assert!(store.is_empty());
    assert_eq!(store.cursor(), 0);
    assert_eq!(store.current(), Err(StoreError::Empty));
}

/// Tests cycle lookup with gaps and repeats.
#[test]
fn test_position_of_cycle() {
    let store = store_with(&[1, 2, 2, 5, 9]);
    assert_eq!(store.position_of_cycle(1), Some(0));
    assert_eq!(store.position_of_cycle(2), Some(1));
    assert_eq!(store.position_of_cycle(5), Some(3));
    assert_eq!(store.position_of_cycle(3), None);
    assert_eq!(store.position_of_cycle(10), None);
}

/// Tests iteration order.
#[test]
fn test_iteration_order() {
    let store = store_with(&[3, 4, 6]);
    let cycles: Vec<u64> = (&store).into_iter().map(CycleSnapshot::cycle).collect();
    assert_eq!(cycles, vec![3, 4, 6]);
    assert_eq!(store.get(1).map(CycleSnapshot::cycle), Some(4));
    assert!(store.get(3).is_none());
}
