use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::numeric::NumericField;
use super::row::{fields, take, Row};

/// Decides which `is_ap` values mark an AP course.
///
/// The uploaded datasets use the literal `TRUE`. Matching is case-sensitive
/// unless configured otherwise, so `true` is a non-AP course by default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApFlagRule {
    literal: String,
    case_sensitive: bool,
}

impl ApFlagRule {
    /// Creates a rule matching `literal`
    pub fn new(literal: impl Into<String>, case_sensitive: bool) -> Self {
        Self {
            literal: literal.into(),
            case_sensitive,
        }
    }

    /// Returns true if `raw` marks an AP course
    pub fn matches(&self, raw: &str) -> bool {
        if self.case_sensitive {
            raw == self.literal
        } else {
            raw.eq_ignore_ascii_case(&self.literal)
        }
    }
}

impl Default for ApFlagRule {
    fn default() -> Self {
        Self::new("TRUE", true)
    }
}

/// A course row, keyed by `course_code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub course_code: String,
    pub course_name: String,
    pub subject_area: String,
    pub credits_offered: NumericField,
    /// Raw `is_ap` text, kept for the `is_ap` index
    pub ap_flag: String,
    /// `ap_flag` evaluated against the ingestion rule
    pub is_ap: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl Course {
    /// Types a parsed row
    pub fn from_row(mut row: Row, ap_rule: &ApFlagRule) -> Self {
        let course_code = take(&mut row, fields::COURSE_CODE);
        let course_name = take(&mut row, fields::COURSE_NAME);
        let subject_area = take(&mut row, fields::SUBJECT_AREA);
        let credits_offered = NumericField::parse(take(&mut row, fields::CREDITS_OFFERED));
        let ap_flag = take(&mut row, fields::IS_AP);
        let is_ap = ap_rule.matches(&ap_flag);
        Self {
            course_code,
            course_name,
            subject_area,
            credits_offered,
            ap_flag,
            is_ap,
            extra: row,
        }
    }

    /// Credits this course contributes to a total; malformed values count as 0
    pub fn credit_value(&self) -> i64 {
        self.credits_offered.value().unwrap_or(0)
    }

    /// Returns the raw value of a named field
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            fields::COURSE_CODE => Some(&self.course_code),
            fields::COURSE_NAME => Some(&self.course_name),
            fields::SUBJECT_AREA => Some(&self.subject_area),
            fields::CREDITS_OFFERED => Some(self.credits_offered.raw()),
            fields::IS_AP => Some(&self.ap_flag),
            other => self.extra.get(other).map(String::as_str),
        }
    }
}
