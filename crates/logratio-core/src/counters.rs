//! Per-user (entries, errors) counter storage.
//!
//! Two layouts are available behind [`CounterStore`]:
//!
//! ```text
//! Dense  -> CompactCounterArray: [slot 0][slot 1][slot 2] ... indexed by EndpointId
//! Sparse -> SparseCounters:      { EndpointId -> slot } only for touched endpoints
//! ```
//!
//! Counters are `u32`. Increments never wrap: [`CounterSlot::record`] refuses
//! the update instead, and the pipeline turns that into a fatal error.

use rustc_hash::FxHashMap;

use crate::config::StorageMode;
use crate::interner::EndpointId;

/// Counters for a single (user, endpoint) pair.
///
/// Invariant: `errors <= entries`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSlot {
    entries: u32,
    errors: u32,
}

impl CounterSlot {
    /// Creates a slot with explicit counts.
    ///
    /// # Panics
    ///
    /// Panics if `errors > entries`.
    #[must_use]
    pub fn new(entries: u32, errors: u32) -> Self {
        assert!(
            errors <= entries,
            "CounterSlot invariant violated: errors {errors} > entries {entries}"
        );
        Self { entries, errors }
    }

    /// Total log lines for this pair.
    #[must_use]
    pub const fn entries(&self) -> u32 {
        self.entries
    }

    /// Lines whose status code does not start with `2`.
    #[must_use]
    pub const fn errors(&self) -> u32 {
        self.errors
    }

    /// `entries - errors`.
    #[must_use]
    pub const fn successful(&self) -> u32 {
        self.entries - self.errors
    }

    /// Returns true if no line was ever recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Records one log line. Returns `false`, leaving the slot untouched, if
    /// `entries` is already at `u32::MAX`.
    #[must_use]
    pub fn record(&mut self, is_error: bool) -> bool {
        let Some(entries) = self.entries.checked_add(1) else {
            return false;
        };
        self.entries = entries;
        if is_error {
            // errors <= entries - 1 before this line, so this cannot overflow
            self.errors += 1;
        }
        true
    }
}

/// Growable array of [`CounterSlot`]s indexed by endpoint id.
///
/// Writing past the end grows the array in place to
/// `ceil((index + 1) * growth_multiplier)` slots. New slots are zeroed.
#[derive(Debug, Clone)]
pub struct CompactCounterArray {
    slots: Vec<CounterSlot>,
    growth_multiplier: f64,
}

impl CompactCounterArray {
    /// Creates an array with `initial_len` zeroed slots.
    ///
    /// A `growth_multiplier` below 1.0 is treated as 1.0 (exact-fit growth).
    #[must_use]
    pub fn new(initial_len: usize, growth_multiplier: f64) -> Self {
        Self {
            slots: vec![CounterSlot::default(); initial_len],
            growth_multiplier: growth_multiplier.max(1.0),
        }
    }

    /// Number of addressable slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if the array has no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Configured growth multiplier.
    #[must_use]
    pub fn growth_multiplier(&self) -> f64 {
        self.growth_multiplier
    }

    /// Reads a slot. Out-of-range indices read as an empty slot.
    ///
    /// Unlike a grow-on-read array, this never resizes: reads take `&self`
    /// and leave `len()` unchanged. The value returned for an out-of-range
    /// index is the same zeroed slot growth would have produced. Use
    /// [`CompactCounterArray::slot_mut`] or [`CompactCounterArray::resize`]
    /// to grow.
    #[must_use]
    pub fn get(&self, index: usize) -> CounterSlot {
        self.slots.get(index).copied().unwrap_or_default()
    }

    /// Mutable access to a slot, growing the array if `index` is out of range.
    pub fn slot_mut(&mut self, index: usize) -> &mut CounterSlot {
        if index >= self.slots.len() {
            self.grow_to(index + 1);
        }
        &mut self.slots[index]
    }

    /// Pre-grows to `target_len * growth_multiplier` slots if currently
    /// shorter than `target_len`. Never shrinks.
    pub fn resize(&mut self, target_len: usize) {
        if self.slots.len() < target_len {
            self.grow_to(target_len);
        }
    }

    /// Iterates all slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, CounterSlot)> + '_ {
        self.slots.iter().copied().enumerate()
    }

    fn grow_to(&mut self, min_len: usize) {
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let scaled = (min_len as f64 * self.growth_multiplier).ceil() as usize;
        let new_len = scaled.max(min_len);
        self.slots.resize(new_len, CounterSlot::default());
    }
}

/// Counters for only the endpoints a user actually touched.
#[derive(Debug, Clone, Default)]
pub struct SparseCounters {
    slots: FxHashMap<EndpointId, CounterSlot>,
}

impl SparseCounters {
    /// Creates an empty map with room for `capacity` endpoints.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Number of endpoints with a slot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if no endpoint has a slot.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Reads a slot. Untouched endpoints read as an empty slot.
    #[must_use]
    pub fn get(&self, id: EndpointId) -> CounterSlot {
        self.slots.get(&id).copied().unwrap_or_default()
    }

    /// Mutable access to a slot, creating a zeroed one on first touch.
    pub fn slot_mut(&mut self, id: EndpointId) -> &mut CounterSlot {
        self.slots.entry(id).or_default()
    }

    /// Touched slots sorted by endpoint id.
    #[must_use]
    pub fn sorted(&self) -> Vec<(EndpointId, CounterSlot)> {
        let mut out: Vec<_> = self.slots.iter().map(|(&id, &slot)| (id, slot)).collect();
        out.sort_unstable_by_key(|(id, _)| *id);
        out
    }
}

/// Per-user counter storage in either layout.
#[derive(Debug, Clone)]
pub enum CounterStore {
    /// Contiguous array indexed by endpoint id.
    Dense(CompactCounterArray),
    /// Map holding touched endpoints only.
    Sparse(SparseCounters),
}

impl CounterStore {
    /// Creates an empty store. `size_hint` is the expected number of endpoints.
    #[must_use]
    pub fn new(mode: StorageMode, size_hint: usize, growth_multiplier: f64) -> Self {
        match mode {
            StorageMode::Dense => Self::Dense(CompactCounterArray::new(size_hint, growth_multiplier)),
            StorageMode::Sparse => Self::Sparse(SparseCounters::with_capacity(size_hint)),
        }
    }

    /// Reads the slot for `id`.
    #[must_use]
    pub fn get(&self, id: EndpointId) -> CounterSlot {
        match self {
            Self::Dense(array) => array.get(id.index()),
            Self::Sparse(map) => map.get(id),
        }
    }

    /// Mutable slot for `id`, allocating it if needed.
    pub fn slot_mut(&mut self, id: EndpointId) -> &mut CounterSlot {
        match self {
            Self::Dense(array) => array.slot_mut(id.index()),
            Self::Sparse(map) => map.slot_mut(id),
        }
    }

    /// Ensures `endpoint_count` endpoints can be addressed without regrowth.
    /// Only the dense layout allocates here.
    pub fn reserve_endpoints(&mut self, endpoint_count: usize) {
        if let Self::Dense(array) = self {
            array.resize(endpoint_count);
        }
    }

    /// Number of allocated slots.
    #[must_use]
    pub fn allocated_slots(&self) -> usize {
        match self {
            Self::Dense(array) => array.len(),
            Self::Sparse(map) => map.len(),
        }
    }

    /// Slots with at least one entry, in endpoint id order.
    #[must_use]
    pub fn observed(&self) -> Vec<(EndpointId, CounterSlot)> {
        match self {
            Self::Dense(array) => array
                .iter()
                .filter(|(_, slot)| !slot.is_empty())
                .map(|(i, slot)| (EndpointId::from_index(i), slot))
                .collect(),
            Self::Sparse(map) => map
                .sorted()
                .into_iter()
                .filter(|(_, slot)| !slot.is_empty())
                .collect(),
        }
    }
}
