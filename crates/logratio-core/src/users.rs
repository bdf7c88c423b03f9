//! User table: user id → counter storage, kept in first-seen order.
//!
//! Iteration order is explicit (an `IndexMap`), so report row order does not
//! depend on hash map internals.

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::config::{PipelineConfig, StorageMode};
use crate::counters::CounterStore;

/// Counters owned by a single user.
#[derive(Debug, Clone)]
pub struct UserRecord {
    counters: CounterStore,
}

impl UserRecord {
    /// Read access to the user's counters.
    #[must_use]
    pub fn counters(&self) -> &CounterStore {
        &self.counters
    }

    /// Mutable access to the user's counters.
    pub fn counters_mut(&mut self) -> &mut CounterStore {
        &mut self.counters
    }
}

/// Get-or-create mapping from user id to [`UserRecord`].
#[derive(Debug)]
pub struct UserTable {
    users: IndexMap<String, UserRecord, FxBuildHasher>,
    storage: StorageMode,
    initial_slots: usize,
    growth_multiplier: f64,
}

impl UserTable {
    /// Creates an empty table.
    ///
    /// `initial_slots` is only a hint for newly created users; the real sizing
    /// happens through [`UserTable::resize_all`].
    #[must_use]
    pub fn new(storage: StorageMode, initial_slots: usize, growth_multiplier: f64) -> Self {
        Self {
            users: IndexMap::default(),
            storage,
            initial_slots,
            growth_multiplier,
        }
    }

    /// Creates an empty table from pipeline settings.
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            config.storage,
            config.initial_slots,
            config.growth_multiplier,
        )
    }

    /// Returns the record for `uid`, creating an empty one on first sight.
    pub fn get_or_create(&mut self, uid: &str) -> &mut UserRecord {
        if let Some(index) = self.users.get_index_of(uid) {
            return &mut self.users[index];
        }
        let record = UserRecord {
            counters: CounterStore::new(self.storage, self.initial_slots, self.growth_multiplier),
        };
        self.users.entry(uid.to_string()).or_insert(record)
    }

    /// Returns the record for `uid` if it exists.
    #[must_use]
    pub fn get(&self, uid: &str) -> Option<&UserRecord> {
        self.users.get(uid)
    }

    /// Returns the mutable record for `uid` if it exists.
    pub fn get_mut(&mut self, uid: &str) -> Option<&mut UserRecord> {
        self.users.get_mut(uid)
    }

    /// Makes every user's counters addressable up to `endpoint_count`.
    pub fn resize_all(&mut self, endpoint_count: usize) {
        for record in self.users.values_mut() {
            record.counters.reserve_endpoints(endpoint_count);
        }
    }

    /// Number of distinct users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Returns true if no user has been seen.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Counter layout used for new users.
    #[must_use]
    pub fn storage(&self) -> StorageMode {
        self.storage
    }

    /// Iterates users in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &UserRecord)> {
        self.users.iter().map(|(uid, record)| (uid.as_str(), record))
    }

    /// Total allocated counter slots across all users.
    #[must_use]
    pub fn allocated_slots(&self) -> usize {
        self.users
            .values()
            .map(|record| record.counters.allocated_slots())
            .sum()
    }
}
