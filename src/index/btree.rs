//! BTreeMap-based index structures
//!
//! Indexes map exact field text to the offsets of every record holding it.
//! Offsets are kept sorted ascending, which for an append-only segment is
//! insertion order.

use std::collections::BTreeMap;

use crate::storage::RecordOffset;

/// A single field index using BTreeMap for deterministic ordering.
#[derive(Debug, Default)]
pub struct IndexTree {
    tree: BTreeMap<String, Vec<RecordOffset>>,
}

impl IndexTree {
    /// Creates a new empty index tree
    pub fn new() -> Self {
        Self {
            tree: BTreeMap::new(),
        }
    }

    /// Insert an offset for a key.
    ///
    /// Maintains sorted ascending order. Duplicate keys are kept; the same
    /// offset is only recorded once.
    pub fn insert(&mut self, key: &str, offset: RecordOffset) {
        let offsets = self.tree.entry(key.to_string()).or_default();

        match offsets.binary_search(&offset) {
            Ok(_) => {}
            Err(pos) => offsets.insert(pos, offset),
        }
    }

    /// Lookup all offsets for an exact key match.
    ///
    /// Returns offsets sorted ascending; empty when nothing matches.
    pub fn lookup_eq(&self, key: &str) -> Vec<RecordOffset> {
        self.tree.get(key).cloned().unwrap_or_default()
    }

}
