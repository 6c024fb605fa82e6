//! Index Manager for one collection
//!
//! # API
//!
//! - `check_unique(key)` - Primary key collision test before a write
//! - `apply_insert(record, offset)` - Update indexes after a segment append
//! - `lookup_pk(key)` - Primary key point lookup
//! - `lookup_eq(field, value)` - Secondary index exact match

use std::collections::BTreeMap;

use super::btree::IndexTree;
use crate::schema::CollectionSchema;
use crate::storage::{RecordKey, RecordOffset, StoredRecord};

/// Maintains the primary and secondary indexes of a collection.
#[derive(Debug)]
pub struct IndexManager {
    /// Unique natural key -> offset. Sequence-keyed collections have none.
    pk_index: Option<BTreeMap<String, RecordOffset>>,

    /// Declared secondary indexes (field -> tree)
    field_indexes: BTreeMap<&'static str, IndexTree>,
}

impl IndexManager {
    /// Creates empty indexes for every index the schema declares
    pub fn new(schema: &CollectionSchema) -> Self {
        let pk_index = schema.key_field().map(|_| BTreeMap::new());
        let field_indexes = schema
            .indexes
            .iter()
            .map(|field| (*field, IndexTree::new()))
            .collect();

        Self {
            pk_index,
            field_indexes,
        }
    }

    /// Returns false if a natural key is already taken.
    pub fn check_unique(&self, key: &RecordKey) -> bool {
        match (key, &self.pk_index) {
            (RecordKey::Natural(k), Some(pk)) => !pk.contains_key(k),
            _ => true,
        }
    }

    /// Apply an insert to every index.
    ///
    /// Called AFTER the segment append. Fields absent from the document are
    /// not indexed.
    pub fn apply_insert(&mut self, record: &StoredRecord, offset: RecordOffset) {
        if let (RecordKey::Natural(key), Some(pk)) = (&record.key, self.pk_index.as_mut()) {
            pk.insert(key.clone(), offset);
        }

        for (field, tree) in self.field_indexes.iter_mut() {
            if let Some(value) = record.document.field(field) {
                tree.insert(value, offset);
            }
        }
    }

    /// Lookup the offset holding a natural key.
    pub fn lookup_pk(&self, key: &str) -> Option<RecordOffset> {
        self.pk_index.as_ref().and_then(|pk| pk.get(key).copied())
    }

    /// Lookup all offsets whose `field` equals `value`.
    ///
    /// Returns `None` if `field` is not indexed, otherwise offsets sorted
    /// ascending (possibly empty).
    pub fn lookup_eq(&self, field: &str, value: &str) -> Option<Vec<RecordOffset>> {
        self.field_indexes.get(field).map(|tree| tree.lookup_eq(value))
    }
}
