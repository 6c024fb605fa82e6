//! Record storage for enrollcheck
//!
//! Each collection's records live in an append-only segment of checksummed
//! frames. Storage lasts one load cycle: segments are reopened and
//! truncated on reset.
//!
//! # Design Principles
//!
//! - Append-only (no in-place updates, no deletes)
//! - Checksum-verified on every read
//! - Optional write-through to a data directory
//!
//! # Invariants Enforced
//!
//! - Every frame carries a checksum
//! - Corruption is reported, never skipped

mod checksum;
mod errors;
mod record;
mod segment;

pub use checksum::compute_checksum;
pub use errors::{Severity, StorageError, StorageErrorCode, StorageResult};
pub use record::{RecordKey, RecordOffset, StoredRecord};
pub(crate) use segment::Segment;
