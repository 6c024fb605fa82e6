//! The store handle
//!
//! `Store` is a cheaply cloneable handle over the shared store state. All
//! access goes through a `tokio::sync::RwLock`: writers (reset, insert) hold
//! the write lock for one whole operation, so readers never observe a
//! partially cleared collection or a half-indexed record.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;

use super::cursor::Cursor;
use super::errors::{StoreError, StoreResult};
use crate::config::EngineConfig;
use crate::index::IndexManager;
use crate::model::{ApFlagRule, Course, Document, EnrollmentRequest, Row, Student};
use crate::observability::{log_event_with_fields, Event};
use crate::schema::{Collection, CollectionSchema, KeyKind, SchemaValidator};
use crate::storage::{RecordKey, RecordOffset, Segment, StorageResult, StoredRecord};

/// Options fixed for the lifetime of a store
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    /// Directory for segment files; memory-only when `None`
    pub data_dir: Option<PathBuf>,
    /// Rule evaluating course `is_ap` flags at ingestion
    pub ap_rule: ApFlagRule,
}

impl StoreOptions {
    /// Derives store options from the engine configuration
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
            ap_rule: config.ap_rule(),
        }
    }
}

/// One row rejected during a bulk insert
#[derive(Debug)]
pub struct RowRejection {
    /// Zero-based position of the row in the submitted batch
    pub row: usize,
    pub error: StoreError,
}

/// Outcome of one collection's bulk insert
#[derive(Debug)]
pub struct BulkInsertReport {
    pub collection: Collection,
    pub submitted: usize,
    pub inserted: usize,
    pub rejected: Vec<RowRejection>,
}

/// State of one collection: schema, frames, indexes, key sequence.
#[derive(Debug)]
pub(crate) struct CollectionState {
    schema: CollectionSchema,
    segment: Segment,
    indexes: IndexManager,
    next_sequence: u64,
}

impl CollectionState {
    fn open(collection: Collection, data_dir: Option<&Path>) -> StorageResult<Self> {
        let schema = collection.schema();
        let indexes = IndexManager::new(&schema);
        Ok(Self {
            segment: Segment::open(collection, data_dir)?,
            schema,
            indexes,
            next_sequence: 1,
        })
    }

    /// Validates, types, appends and indexes one row.
    fn insert(&mut self, row: Row, ap_rule: &ApFlagRule) -> StoreResult<RecordKey> {
        SchemaValidator::new(&self.schema).validate_row(&row)?;

        let collection = self.schema.collection;
        let key = match self.schema.key {
            KeyKind::Field(field) => RecordKey::Natural(row.get(field).cloned().unwrap_or_default()),
            KeyKind::Sequence => RecordKey::Sequence(self.next_sequence),
        };

        if !self.indexes.check_unique(&key) {
            return Err(StoreError::DuplicateKey {
                collection,
                key: key.to_string(),
            });
        }

        let document = match collection {
            Collection::Students => Document::Student(Student::from_row(row)),
            Collection::Courses => Document::Course(Course::from_row(row, ap_rule)),
            Collection::EnrollmentRequests => {
                Document::EnrollmentRequest(EnrollmentRequest::from_row(row))
            }
        };

        let record = StoredRecord::new(key, document);
        let offset = self.segment.append(&record).map_err(StoreError::Storage)?;
        self.indexes.apply_insert(&record, offset);

        if let RecordKey::Sequence(_) = record.key {
            self.next_sequence += 1;
        }
        Ok(record.key)
    }

    fn read(&self, offset: RecordOffset) -> StoreResult<StoredRecord> {
        self.segment.read_at(offset).map_err(StoreError::Storage)
    }

    pub(crate) fn record_at(&self, position: usize) -> StoreResult<Option<StoredRecord>> {
        match self.segment.offset_at(position) {
            Some(offset) => self.read(offset).map(Some),
            None => Ok(None),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.segment.len()
    }
}

/// Shared store state. `generation` increases on every reset.
#[derive(Debug)]
pub(crate) struct StoreState {
    pub(crate) generation: u64,
    collections: [CollectionState; 3],
}

impl StoreState {
    /// Opens all three segments, then truncates them.
    ///
    /// No file is truncated unless every file opened.
    fn open(data_dir: Option<&Path>) -> StorageResult<Self> {
        let mut collections = [
            CollectionState::open(Collection::Students, data_dir)?,
            CollectionState::open(Collection::Courses, data_dir)?,
            CollectionState::open(Collection::EnrollmentRequests, data_dir)?,
        ];
        for state in collections.iter_mut() {
            state.segment.truncate()?;
        }

        Ok(Self {
            generation: 0,
            collections,
        })
    }

    pub(crate) fn collection(&self, collection: Collection) -> &CollectionState {
        &self.collections[collection.ordinal()]
    }

    fn collection_mut(&mut self, collection: Collection) -> &mut CollectionState {
        &mut self.collections[collection.ordinal()]
    }
}

/// Handle to an embedded enrollment store.
///
/// Clones share the same collections.
#[derive(Debug, Clone)]
pub struct Store {
    pub(crate) state: Arc<RwLock<StoreState>>,
    options: Arc<StoreOptions>,
}

impl Store {
    /// Opens a store with three empty collections.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the segment files cannot be created.
    pub fn open(options: StoreOptions) -> StoreResult<Self> {
        let state = StoreState::open(options.data_dir.as_deref()).map_err(|e| {
            log_storage_unavailable(&e.to_string());
            StoreError::StorageUnavailable(e)
        })?;

        log_event_with_fields(Event::StoreReset, &[("generation", "0")]);
        Ok(Self {
            state: Arc::new(RwLock::new(state)),
            options: Arc::new(options),
        })
    }

    /// Returns the options the store was opened with
    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Drops and recreates all three collections.
    ///
    /// Fresh collections are built under the write lock and swapped in only
    /// when all three opened. If any segment file fails to open, nothing is
    /// truncated: the previous contents stay readable in memory and on disk,
    /// and `StorageUnavailable` is returned. A failure while truncating keeps
    /// the in-memory contents but may leave earlier files already cleared.
    pub async fn reset(&self) -> StoreResult<()> {
        let mut state = self.state.write().await;

        let fresh = StoreState::open(self.options.data_dir.as_deref()).map_err(|e| {
            log_storage_unavailable(&e.to_string());
            StoreError::StorageUnavailable(e)
        })?;

        let generation = state.generation + 1;
        *state = StoreState { generation, ..fresh };

        let shown = generation.to_string();
        log_event_with_fields(Event::StoreReset, &[("generation", shown.as_str())]);
        Ok(())
    }

    /// Inserts a single row, returning its key.
    pub async fn insert(&self, collection: Collection, row: Row) -> StoreResult<RecordKey> {
        let mut state = self.state.write().await;
        state
            .collection_mut(collection)
            .insert(row, &self.options.ap_rule)
    }

    /// Inserts every row of a batch into one collection.
    ///
    /// Rows are inserted one by one in submission order. Rejected rows
    /// (`DuplicateKey`, `MissingKey`) are collected in the report and do not
    /// stop the batch. Each outcome is awaited before the next row is
    /// submitted, so the report is returned only after the last row's
    /// outcome is known.
    ///
    /// # Errors
    ///
    /// A storage failure while appending aborts the batch.
    pub async fn bulk_insert(
        &self,
        collection: Collection,
        rows: Vec<Row>,
    ) -> StoreResult<BulkInsertReport> {
        let submitted = rows.len();
        let mut report = BulkInsertReport {
            collection,
            submitted,
            inserted: 0,
            rejected: Vec::new(),
        };

        for (position, row) in rows.into_iter().enumerate() {
            match self.insert(collection, row).await {
                Ok(_) => report.inserted += 1,
                Err(error) if error.is_row_rejection() => {
                    let message = error.to_string();
                    let row = position.to_string();
                    log_event_with_fields(
                        Event::RowRejected,
                        &[
                            ("code", error.code()),
                            ("collection", collection.name()),
                            ("error", message.as_str()),
                            ("row", row.as_str()),
                        ],
                    );
                    report.rejected.push(RowRejection {
                        row: position,
                        error,
                    });
                }
                Err(error) => return Err(error),
            }
        }

        let inserted = report.inserted.to_string();
        let rejected = report.rejected.len().to_string();
        log_event_with_fields(
            Event::CollectionLoaded,
            &[
                ("collection", collection.name()),
                ("inserted", inserted.as_str()),
                ("rejected", rejected.as_str()),
            ],
        );
        Ok(report)
    }

    /// Opens a cursor over `collection` in insertion order.
    pub async fn scan(&self, collection: Collection) -> Cursor {
        let generation = self.state.read().await.generation;
        Cursor::new(self.clone(), collection, generation)
    }

    /// Returns every record whose `index` field equals `key`, in insertion
    /// order. No match is an empty result.
    ///
    /// # Errors
    ///
    /// Returns `UnknownIndex` if the collection declares no such index.
    pub async fn lookup_by_index(
        &self,
        collection: Collection,
        index: &str,
        key: &str,
    ) -> StoreResult<Vec<StoredRecord>> {
        let state = self.state.read().await;
        let target = state.collection(collection);

        let offsets = target
            .indexes
            .lookup_eq(index, key)
            .ok_or_else(|| StoreError::UnknownIndex {
                collection,
                index: index.to_string(),
            })?;

        offsets.into_iter().map(|offset| target.read(offset)).collect()
    }

    /// Primary-key point lookup. Always `None` for enrollment requests.
    pub async fn get(&self, collection: Collection, key: &str) -> StoreResult<Option<StoredRecord>> {
        let state = self.state.read().await;
        let target = state.collection(collection);
        match target.indexes.lookup_pk(key) {
            Some(offset) => target.read(offset).map(Some),
            None => Ok(None),
        }
    }

    /// Returns the number of records in `collection`
    pub async fn count(&self, collection: Collection) -> usize {
        self.state.read().await.collection(collection).len()
    }

    /// Returns the current reset generation
    pub async fn generation(&self) -> u64 {
        self.state.read().await.generation
    }

    #[cfg(test)]
    pub(crate) async fn corrupt_byte(&self, collection: Collection, index: usize) {
        let mut state = self.state.write().await;
        state.collection_mut(collection).segment.corrupt_byte(index);
    }
}

fn log_storage_unavailable(error: &str) {
    log_event_with_fields(Event::StorageUnavailable, &[("error", error)]);
}
