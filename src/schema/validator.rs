//! Write-time row validation
//!
//! Validation semantics:
//! - Every required field is present and non-blank
//! - Undeclared fields are allowed and kept as passthrough
//! - Values are not coerced here; typing happens in the model
//!
//! Validation is deterministic and does not mutate rows.

use crate::model::Row;

use super::errors::{SchemaError, SchemaResult};
use super::types::CollectionSchema;

/// Enforces a collection schema on incoming rows.
pub struct SchemaValidator<'a> {
    schema: &'a CollectionSchema,
}

impl<'a> SchemaValidator<'a> {
    /// Creates a validator for the given schema.
    pub fn new(schema: &'a CollectionSchema) -> Self {
        Self { schema }
    }

    /// Validates a row before it is written.
    ///
    /// # Errors
    ///
    /// Returns `ENROLL_MISSING_KEY` if a required field is absent or blank.
    pub fn validate_row(&self, row: &Row) -> SchemaResult<()> {
        for field in self.schema.fields.iter().filter(|f| f.required) {
            let present = row
                .get(field.name)
                .map(|value| !value.trim().is_empty())
                .unwrap_or(false);
            if !present {
                return Err(SchemaError::missing_key(self.schema.collection, field.name));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Collection;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_valid_row_passes() {
        let schema = Collection::Students.schema();
        let validator = SchemaValidator::new(&schema);
        assert!(validator
            .validate_row(&row(&[("student_id", "S1"), ("grade_level", "10")]))
            .is_ok());
    }

    #[test]
    fn test_missing_key_rejected() {
        let schema = Collection::Courses.schema();
        let validator = SchemaValidator::new(&schema);
        let err = validator
            .validate_row(&row(&[("course_name", "Algebra")]))
            .unwrap_err();
        assert_eq!(err.field(), "course_code");
    }

    #[test]
    fn test_blank_key_rejected() {
        let schema = Collection::Students.schema();
        let validator = SchemaValidator::new(&schema);
        assert!(validator.validate_row(&row(&[("student_id", "  ")])).is_err());
    }

    #[test]
    fn test_optional_fields_may_be_missing() {
        let schema = Collection::EnrollmentRequests.schema();
        let validator = SchemaValidator::new(&schema);
        assert!(validator.validate_row(&row(&[])).is_ok());
    }

    #[test]
    fn test_undeclared_fields_allowed() {
        let schema = Collection::Students.schema();
        let validator = SchemaValidator::new(&schema);
        assert!(validator
            .validate_row(&row(&[("student_id", "S1"), ("homeroom", "B2")]))
            .is_ok());
    }
}
