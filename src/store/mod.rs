//! Embedded enrollment store
//!
//! Owns the three collections (students, courses, course requests) and
//! exposes reset, bulk insert, cursor scans and secondary-index lookups.
//!
//! # Design Principles
//!
//! - Destructive load cycle: every load starts from a reset
//! - Schema-on-write: rows are validated and typed before they are stored
//! - Single writer during load, many readers during checks
//! - Lookup-not-found is an empty result, never an error
//!
//! # Invariants
//!
//! - Natural keys are unique within a collection
//! - Every stored record is present in every declared index of its collection
//! - A bulk insert reports completion exactly once, after every row settled
//! - Readers never observe a partially reset store
//!
//! # Runtime
//!
//! Store methods are async and need a Tokio runtime. `load` spawns tasks.

mod cursor;
mod errors;
mod loader;
mod store;

pub use cursor::Cursor;
pub use errors::{StoreError, StoreResult};
pub use loader::{Dataset, LoadEvent, LoadReport};
pub use store::{BulkInsertReport, RowRejection, Store, StoreOptions};
