//! Endpoint interning table.
//!
//! Endpoint paths are mapped to dense ids in first-seen order. Ids are never
//! reused or reassigned, so an id handed out during the sizing pass stays valid
//! for the whole run.
//!
//! `EndpointId` wraps a `u32`, limiting the table to ~4 billion endpoints.

use rustc_hash::FxHashMap;

/// Returned by [`EndpointInterner::lookup`] for an id the table never issued.
pub const UNKNOWN_ENDPOINT: &str = "unknown";

/// Dense endpoint identifier, assigned from 0 in first-seen order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EndpointId(pub(crate) u32);

impl EndpointId {
    /// Returns the id as a slot index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Builds an id from a slot index.
    ///
    /// # Panics
    ///
    /// Panics if `index` does not fit in `u32`.
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        let raw = u32::try_from(index).expect("endpoint index exceeds u32::MAX");
        Self(raw)
    }
}

/// Bidirectional endpoint path ↔ [`EndpointId`] mapping. Append-only.
#[derive(Debug, Default)]
pub struct EndpointInterner {
    path_to_id: FxHashMap<String, EndpointId>,
    id_to_path: Vec<String>,
}

impl EndpointInterner {
    /// Creates a new empty interner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id for `path`, assigning the next free id if it is new.
    ///
    /// # Panics
    ///
    /// Panics if the table already holds `u32::MAX` endpoints.
    pub fn intern_or_lookup(&mut self, path: &str) -> EndpointId {
        if let Some(&id) = self.path_to_id.get(path) {
            return id;
        }

        let len = self.id_to_path.len();
        assert!(
            len < u32::MAX as usize,
            "EndpointInterner overflow: cannot intern more than {} endpoints",
            u32::MAX
        );
        #[allow(clippy::cast_possible_truncation)] // Bounds checked above
        let id = EndpointId(len as u32);
        self.id_to_path.push(path.to_string());
        self.path_to_id.insert(path.to_string(), id);
        id
    }

    /// Returns the path for `id`, or [`UNKNOWN_ENDPOINT`] if the id was never issued.
    #[must_use]
    pub fn lookup(&self, id: EndpointId) -> &str {
        self.id_to_path
            .get(id.index())
            .map_or(UNKNOWN_ENDPOINT, String::as_str)
    }

    /// Returns the id for `path` without interning it.
    #[must_use]
    pub fn get_id(&self, path: &str) -> Option<EndpointId> {
        self.path_to_id.get(path).copied()
    }

    /// Returns the number of interned endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.id_to_path.len()
    }

    /// Returns true if no endpoint has been interned yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id_to_path.is_empty()
    }

    /// Iterates `(id, path)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (EndpointId, &str)> {
        self.id_to_path
            .iter()
            .enumerate()
            .map(|(i, path)| (EndpointId::from_index(i), path.as_str()))
    }
}
