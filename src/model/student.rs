use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::numeric::NumericField;
use super::row::{fields, take, Row};

/// A student row, keyed by `student_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub student_id: String,
    pub grade_level: NumericField,
    /// Passthrough fields not read by any check
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl Student {
    /// Types a parsed row
    pub fn from_row(mut row: Row) -> Self {
        let student_id = take(&mut row, fields::STUDENT_ID);
        let grade_level = NumericField::parse(take(&mut row, fields::GRADE_LEVEL));
        Self {
            student_id,
            grade_level,
            extra: row,
        }
    }

    /// Returns the raw value of a named field
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            fields::STUDENT_ID => Some(&self.student_id),
            fields::GRADE_LEVEL => Some(self.grade_level.raw()),
            other => self.extra.get(other).map(String::as_str),
        }
    }
}
