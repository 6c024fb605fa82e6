//! Typed documents for the three enrollment datasets
//!
//! Rows arrive already parsed as field-name -> string maps. They are typed
//! exactly once, at ingestion, into the documents defined here.
//!
//! # Design Principles
//!
//! - Parse once: numeric and flag fields are typed on the way in
//! - Lossless: the raw text of every field survives, including passthrough
//!   fields no check reads
//! - Tolerant: a missing or unparsable numeric field is a value, not an error

mod course;
mod document;
mod numeric;
mod request;
mod row;
mod student;

pub use course::{ApFlagRule, Course};
pub use document::Document;
pub use numeric::NumericField;
pub use request::EnrollmentRequest;
pub use row::{fields, Row};
pub use student::Student;
