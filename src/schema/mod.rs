//! Collection schemas for enrollcheck
//!
//! Schemas are declared in code and enforced at write time.
//!
//! # Design Principles
//!
//! - Schema-on-write: rows are validated before they reach storage
//! - Fixed catalog: three collections, recreated on every reset
//! - Keys are either unique natural fields or synthetic sequences

mod errors;
mod types;
mod validator;

pub use errors::{SchemaError, SchemaErrorCode, SchemaResult};
pub use types::{catalog, Collection, CollectionSchema, FieldDef, FieldType, KeyKind};
pub use validator::SchemaValidator;
