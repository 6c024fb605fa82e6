//! Store error types
//!
//! Per-row errors (`DuplicateKey`, `MissingKey`) reject a single row and are
//! collected in the bulk insert report. Everything else fails the operation.

use thiserror::Error;

use crate::schema::{Collection, SchemaError};
use crate::storage::{StorageError, StorageErrorCode};

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Segments could not be created or opened
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[source] StorageError),

    /// A natural key is already taken in the collection
    #[error("Duplicate key in {collection}: {key}")]
    DuplicateKey { collection: Collection, key: String },

    /// A row has no value for its collection's key field
    #[error("Row for {collection} has no value for key field '{field}'")]
    MissingKey {
        collection: Collection,
        field: &'static str,
    },

    /// The collection declares no index with this name
    #[error("Collection {collection} has no index '{index}'")]
    UnknownIndex { collection: Collection, index: String },

    /// The store was reset while a cursor was open
    #[error("Cursor invalidated by store reset")]
    CursorInvalidated,

    /// Reading or writing a stored frame failed
    #[error("Storage error: {0}")]
    Storage(#[source] StorageError),

    /// A load task panicked or was aborted
    #[error("Task failed: {0}")]
    TaskFailed(String),
}

impl StoreError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::StorageUnavailable(_) => "ENROLL_STORAGE_UNAVAILABLE",
            StoreError::DuplicateKey { .. } => "ENROLL_DUPLICATE_KEY",
            StoreError::MissingKey { .. } => "ENROLL_MISSING_KEY",
            StoreError::UnknownIndex { .. } => "ENROLL_UNKNOWN_INDEX",
            StoreError::CursorInvalidated => "ENROLL_CURSOR_INVALIDATED",
            StoreError::Storage(e) => e.code().code(),
            StoreError::TaskFailed(_) => "ENROLL_TASK_FAILED",
        }
    }

    /// Returns true if the store can no longer be used
    pub fn is_fatal(&self) -> bool {
        match self {
            StoreError::StorageUnavailable(_) | StoreError::TaskFailed(_) => true,
            StoreError::Storage(e) => e.is_fatal(),
            _ => false,
        }
    }

    /// Returns true if this error rejects a single row only
    pub fn is_row_rejection(&self) -> bool {
        matches!(
            self,
            StoreError::DuplicateKey { .. } | StoreError::MissingKey { .. }
        )
    }
}

impl From<SchemaError> for StoreError {
    fn from(e: SchemaError) -> Self {
        StoreError::MissingKey {
            collection: e.collection(),
            field: e.field(),
        }
    }
}

impl From<StorageError> for StoreError {
    fn from(e: StorageError) -> Self {
        match e.code() {
            StorageErrorCode::StorageUnavailable => StoreError::StorageUnavailable(e),
            _ => StoreError::Storage(e),
        }
    }
}
