//! Parsed input rows

use std::collections::BTreeMap;

/// A single parsed input row: field name -> raw string value.
pub type Row = BTreeMap<String, String>;

/// Field names shared by the three datasets.
pub mod fields {
    pub const STUDENT_ID: &str = "student_id";
    pub const GRADE_LEVEL: &str = "grade_level";
    pub const COURSE_CODE: &str = "course_code";
    pub const COURSE_NAME: &str = "course_name";
    pub const SUBJECT_AREA: &str = "subject_area";
    pub const CREDITS_OFFERED: &str = "credits_offered";
    pub const IS_AP: &str = "is_ap";
}

/// Removes a field from a row, yielding an empty string when absent.
pub(crate) fn take(row: &mut Row, field: &str) -> String {
    row.remove(field).unwrap_or_default()
}
