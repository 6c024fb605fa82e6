//! Schema error types
//!
//! Error codes:
//! - ENROLL_MISSING_KEY (REJECT)

use std::fmt;

use super::types::Collection;

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// A required key field is absent or blank
    MissingKey,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::MissingKey => "ENROLL_MISSING_KEY",
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A row rejected at write time.
///
/// Schema errors reject a single row; they never abort a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    code: SchemaErrorCode,
    collection: Collection,
    field: &'static str,
}

impl SchemaError {
    /// Create a missing key error
    pub fn missing_key(collection: Collection, field: &'static str) -> Self {
        Self {
            code: SchemaErrorCode::MissingKey,
            collection,
            field,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the collection the row was destined for
    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// Returns the offending field
    pub fn field(&self) -> &'static str {
        self.field
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[REJECT] {}: row for '{}' has no value for key field '{}'",
            self.code, self.collection, self.field
        )
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SchemaError::missing_key(Collection::Students, "student_id");
        let display = err.to_string();
        assert!(display.contains("ENROLL_MISSING_KEY"));
        assert!(display.contains("students"));
        assert!(display.contains("student_id"));
    }
}
