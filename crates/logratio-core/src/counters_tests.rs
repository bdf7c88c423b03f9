//! Tests for `counters` module

use super::config::StorageMode;
use super::counters::*;
use super::interner::EndpointId;

// =========================================================================
// CounterSlot
// =========================================================================

#[test]
fn test_slot_record_success_and_error() {
    // Arrange
    let mut slot = CounterSlot::default();

    // Act
    assert!(slot.record(false));
    assert!(slot.record(true));
    assert!(slot.record(true));

    // Assert
    assert_eq!(slot.entries(), 3);
    assert_eq!(slot.errors(), 2);
    assert_eq!(slot.successful(), 1);
}

#[test]
fn test_slot_record_refuses_overflow() {
    let mut slot = CounterSlot::new(u32::MAX, 5);

    assert!(!slot.record(true));
    assert_eq!(slot.entries(), u32::MAX);
    assert_eq!(slot.errors(), 5);
}

#[test]
#[should_panic(expected = "invariant violated")]
fn test_slot_new_rejects_more_errors_than_entries() {
    let _ = CounterSlot::new(1, 2);
}

// =========================================================================
// CompactCounterArray
// =========================================================================

#[test]
fn test_array_new_is_zeroed() {
    let array = CompactCounterArray::new(4, 1.0);

    assert_eq!(array.len(), 4);
    assert!(array.iter().all(|(_, slot)| slot.is_empty()));
}

#[test]
fn test_array_exact_fit_growth() {
    // Arrange
    let mut array = CompactCounterArray::new(0, 1.0);

    // Act
    let _ = array.slot_mut(9).record(false);

    // Assert
    assert_eq!(array.len(), 10);
    assert_eq!(array.get(9).entries(), 1);
    assert!(array.get(8).is_empty());
}

#[test]
fn test_array_growth_applies_multiplier() {
    let mut array = CompactCounterArray::new(2, 2.0);

    let _ = array.slot_mut(4).record(true);

    // (4 + 1) * 2.0
    assert_eq!(array.len(), 10);
    assert_eq!(array.get(4).errors(), 1);
}

#[test]
fn test_array_growth_keeps_existing_counts() {
    let mut array = CompactCounterArray::new(1, 1.5);
    let _ = array.slot_mut(0).record(true);

    let _ = array.slot_mut(20).record(false);

    assert_eq!(array.get(0), CounterSlot::new(1, 1));
    assert_eq!(array.get(20), CounterSlot::new(1, 0));
}

#[test]
fn test_array_get_out_of_range_reads_empty_without_growing() {
    let mut array = CompactCounterArray::new(2, 1.0);

    assert!(array.get(100).is_empty());
    assert_eq!(array.len(), 2);

    // growing afterwards yields the same zeroed slot at that index
    let grown = *array.slot_mut(100);
    assert_eq!(grown, array.get(100));
    assert_eq!(array.len(), 101);
}

#[test]
fn test_array_resize_only_grows() {
    let mut array = CompactCounterArray::new(8, 1.0);

    array.resize(4);
    assert_eq!(array.len(), 8);

    array.resize(12);
    assert_eq!(array.len(), 12);
}

#[test]
fn test_array_resize_applies_multiplier() {
    let mut array = CompactCounterArray::new(0, 1.5);

    array.resize(10);

    assert_eq!(array.len(), 15);
}

#[test]
fn test_array_multiplier_below_one_is_clamped() {
    let array = CompactCounterArray::new(0, 0.25);
    assert!((array.growth_multiplier() - 1.0).abs() < f64::EPSILON);
}

// =========================================================================
// SparseCounters
// =========================================================================

#[test]
fn test_sparse_allocates_on_touch_only() {
    let mut sparse = SparseCounters::with_capacity(4);

    let _ = sparse.slot_mut(EndpointId::from_index(3)).record(false);

    assert_eq!(sparse.len(), 1);
    assert!(sparse.get(EndpointId::from_index(0)).is_empty());
    assert_eq!(sparse.get(EndpointId::from_index(3)).entries(), 1);
}

#[test]
fn test_sparse_sorted_by_endpoint_id() {
    let mut sparse = SparseCounters::default();
    for i in [7, 2, 5] {
        let _ = sparse.slot_mut(EndpointId::from_index(i)).record(false);
    }

    let ids: Vec<usize> = sparse.sorted().iter().map(|(id, _)| id.index()).collect();

    assert_eq!(ids, vec![2, 5, 7]);
}

// =========================================================================
// CounterStore
// =========================================================================

#[test]
fn test_store_reserve_only_allocates_dense() {
    let mut dense = CounterStore::new(StorageMode::Dense, 2, 1.0);
    let mut sparse = CounterStore::new(StorageMode::Sparse, 2, 1.0);

    dense.reserve_endpoints(50);
    sparse.reserve_endpoints(50);

    assert_eq!(dense.allocated_slots(), 50);
    assert_eq!(sparse.allocated_slots(), 0);
}

#[test]
fn test_store_layouts_count_identically() {
    let mut dense = CounterStore::new(StorageMode::Dense, 0, 1.0);
    let mut sparse = CounterStore::new(StorageMode::Sparse, 0, 1.0);
    let pattern = [(0, false), (3, true), (0, true), (1, false), (3, true)];

    for (index, is_error) in pattern {
        let id = EndpointId::from_index(index);
        assert!(dense.slot_mut(id).record(is_error));
        assert!(sparse.slot_mut(id).record(is_error));
    }

    assert_eq!(dense.observed(), sparse.observed());
    assert_eq!(
        dense.get(EndpointId::from_index(3)),
        CounterSlot::new(2, 2)
    );
    assert!(dense.get(EndpointId::from_index(2)).is_empty());
}

#[test]
fn test_store_observed_skips_empty_slots() {
    let mut dense = CounterStore::new(StorageMode::Dense, 0, 1.0);
    dense.reserve_endpoints(5);
    let _ = dense.slot_mut(EndpointId::from_index(4)).record(false);

    let observed = dense.observed();

    assert_eq!(observed.len(), 1);
    assert_eq!(observed[0].0.index(), 4);
}
