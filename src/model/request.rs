use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::row::{fields, take, Row};

/// A course enrollment request: one (student, course) pair.
///
/// Neither foreign key is enforced, and duplicate pairs are legal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentRequest {
    pub student_id: String,
    pub course_code: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl EnrollmentRequest {
    /// Types a parsed row
    pub fn from_row(mut row: Row) -> Self {
        let student_id = take(&mut row, fields::STUDENT_ID);
        let course_code = take(&mut row, fields::COURSE_CODE);
        Self {
            student_id,
            course_code,
            extra: row,
        }
    }

    /// Returns the raw value of a named field
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            fields::STUDENT_ID => Some(&self.student_id),
            fields::COURSE_CODE => Some(&self.course_code),
            other => self.extra.get(other).map(String::as_str),
        }
    }
}
