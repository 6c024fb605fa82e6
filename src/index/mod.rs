//! Index subsystem for enrollcheck
//!
//! Indexes are derived, in-memory state over a collection's segment.
//!
//! # Design Principles
//!
//! - Derived state: indexes mirror the segment, never the source of truth
//! - Deterministic: BTreeMap iteration order, sorted offsets
//! - Exact match: keys compare as raw field text
//!
//! # Invariants
//!
//! - Updates occur AFTER segment appends
//! - Every inserted record is indexed, duplicates included
//! - Lookup returns offsets in insertion order

mod btree;
mod manager;

pub use btree::IndexTree;
pub use manager::IndexManager;
