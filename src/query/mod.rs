//! Query engine for enrollcheck
//!
//! Five independent validation checks over a loaded store. Each check scans
//! the students collection and, per student, joins enrollment requests and
//! courses through secondary-index lookups.
//!
//! # Design Principles
//!
//! - Read-only: checks never mutate the store
//! - Streamed: conflicts are produced as joins settle, in scan order
//! - Deterministic joins: a student is evaluated once all of its lookups
//!   completed, never on a timer
//!
//! # Invariants
//!
//! - The cursor advances only after the current student's join is issued
//! - A check is done when its scan is exhausted and every issued join
//!   completed; done fires exactly once
//! - One student yields at most one conflict per check
//! - A failed lookup becomes that student's conflict; the scan continues

mod checks;
mod conflict;
mod engine;
mod stream;
mod tracker;

pub use conflict::{CheckKind, Conflict, ConflictDetail, ConflictReason};
pub use engine::{CheckReport, QueryEngine};
pub use stream::{CheckOutcome, CheckSummary, ConflictStream};
pub use tracker::JoinTracker;
