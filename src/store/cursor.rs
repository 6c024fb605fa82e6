//! Cursor-based collection scans
//!
//! A cursor walks one collection in insertion order. Every advance is a
//! separate storage call that takes the read lock, so nested lookups issued
//! between advances interleave freely with the scan.
//!
//! A cursor is bound to the store generation it was opened in. After a reset
//! it fails with `CursorInvalidated` instead of reading the new contents.

use futures_util::stream::{self, Stream};

use super::errors::{StoreError, StoreResult};
use super::store::Store;
use crate::schema::Collection;
use crate::storage::StoredRecord;

/// A lazy, finite, forward-only scan over one collection.
#[derive(Debug)]
pub struct Cursor {
    store: Store,
    collection: Collection,
    generation: u64,
    position: usize,
}

impl Cursor {
    pub(crate) fn new(store: Store, collection: Collection, generation: u64) -> Self {
        Self {
            store,
            collection,
            generation,
            position: 0,
        }
    }

    /// Advances the cursor. Returns `Ok(None)` once the scan is exhausted.
    pub async fn next(&mut self) -> StoreResult<Option<StoredRecord>> {
        let state = self.store.state.read().await;
        if state.generation != self.generation {
            return Err(StoreError::CursorInvalidated);
        }

        let record = state.collection(self.collection).record_at(self.position)?;
        if record.is_some() {
            self.position += 1;
        }
        Ok(record)
    }

    /// Returns the collection being scanned
    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// Returns the number of records yielded so far
    pub fn position(&self) -> usize {
        self.position
    }

    /// Converts the cursor into a stream. The stream ends after the first
    /// error.
    pub fn into_stream(self) -> impl Stream<Item = StoreResult<StoredRecord>> {
        stream::unfold(Some(self), |cursor| async move {
            let mut cursor = cursor?;
            match cursor.next().await {
                Ok(Some(record)) => Some((Ok(record), Some(cursor))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }
}
