//! Conflict records
//!
//! A conflict names a student, the check it failed, why, and the
//! check-specific detail. The serialized shape is stable:
//!
//! ```text
//! {"studentId":"S1","check":"credits","reason":"credits_out_of_range",
//!  "error":"Credit Total Outside Range: 8","totalCredits":8}
//! ```

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// The five validation checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Grades,
    Credits,
    Subjects,
    Advisory,
    Ap,
}

impl CheckKind {
    /// All checks, in report order
    pub const ALL: [CheckKind; 5] = [
        CheckKind::Grades,
        CheckKind::Credits,
        CheckKind::Subjects,
        CheckKind::Advisory,
        CheckKind::Ap,
    ];

    /// Returns the check name
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::Grades => "grades",
            CheckKind::Credits => "credits",
            CheckKind::Subjects => "subjects",
            CheckKind::Advisory => "advisory",
            CheckKind::Ap => "ap",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CheckKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown check '{}'", s))
    }
}

/// Why a student was reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictReason {
    /// The student has no enrollment rows
    MissingFromRequests,
    /// Grade is missing, not an integer, or out of range
    InvalidGrade,
    /// Credit total outside the allowed range
    CreditsOutOfRange,
    /// Enrolled courses reference courses with malformed credits
    UnparsableCredits,
    /// Some required subjects are not covered
    MissingSubjects,
    /// The advisory course is not among the enrollments
    MissingAdvisory,
    /// AP courses requested by a student outside the eligible grades
    ApIneligible,
    /// The student's join data could not be read
    LookupFailed,
}

/// Check-specific fields, flattened into the conflict object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ConflictDetail {
    Grade {
        #[serde(rename = "gradeLevel")]
        grade_level: String,
    },
    Credits {
        #[serde(rename = "totalCredits")]
        total_credits: i64,
    },
    UnparsableCredits {
        #[serde(rename = "unparsableCourses")]
        unparsable_courses: Vec<String>,
    },
    Subjects {
        #[serde(rename = "missingSubjects")]
        missing_subjects: Vec<String>,
    },
    Enrolled {
        #[serde(rename = "enrolledCourses")]
        enrolled_courses: Vec<String>,
    },
    ApCourses {
        #[serde(rename = "apCourses")]
        ap_courses: Vec<String>,
    },
}

/// One student failing one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    #[serde(rename = "studentId")]
    pub student_id: String,
    pub check: CheckKind,
    pub reason: ConflictReason,
    pub error: String,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub detail: Option<ConflictDetail>,
}

impl Conflict {
    fn new(
        check: CheckKind,
        student_id: &str,
        reason: ConflictReason,
        error: String,
        detail: Option<ConflictDetail>,
    ) -> Self {
        Self {
            student_id: student_id.to_string(),
            check,
            reason,
            error,
            detail,
        }
    }

    pub fn missing_from_requests(
        check: CheckKind,
        student_id: &str,
        detail: Option<ConflictDetail>,
    ) -> Self {
        Self::new(
            check,
            student_id,
            ConflictReason::MissingFromRequests,
            "Student is not present within course_requests".to_string(),
            detail,
        )
    }

    pub fn invalid_grade(student_id: &str, raw_grade: &str) -> Self {
        Self::new(
            CheckKind::Grades,
            student_id,
            ConflictReason::InvalidGrade,
            format!("Grade Level Invalid: '{}'", raw_grade),
            Some(ConflictDetail::Grade {
                grade_level: raw_grade.to_string(),
            }),
        )
    }

    pub fn credits_out_of_range(student_id: &str, total_credits: i64) -> Self {
        Self::new(
            CheckKind::Credits,
            student_id,
            ConflictReason::CreditsOutOfRange,
            format!("Credit Total Outside Range: {}", total_credits),
            Some(ConflictDetail::Credits { total_credits }),
        )
    }

    pub fn unparsable_credits(student_id: &str, courses: Vec<String>) -> Self {
        Self::new(
            CheckKind::Credits,
            student_id,
            ConflictReason::UnparsableCredits,
            format!("Unparsable Course Credits: {}", courses.join(", ")),
            Some(ConflictDetail::UnparsableCredits {
                unparsable_courses: courses,
            }),
        )
    }

    pub fn missing_subjects(student_id: &str, missing: Vec<String>) -> Self {
        Self::new(
            CheckKind::Subjects,
            student_id,
            ConflictReason::MissingSubjects,
            format!("Missing Required Subjects: {}", missing.join(", ")),
            Some(ConflictDetail::Subjects {
                missing_subjects: missing,
            }),
        )
    }

    pub fn missing_advisory(student_id: &str, advisory_code: &str, enrolled: Vec<String>) -> Self {
        Self::new(
            CheckKind::Advisory,
            student_id,
            ConflictReason::MissingAdvisory,
            format!("Not Enrolled In Advisory Course: {}", advisory_code),
            Some(ConflictDetail::Enrolled {
                enrolled_courses: enrolled,
            }),
        )
    }

    pub fn ap_ineligible(student_id: &str, raw_grade: &str, ap_courses: Vec<String>) -> Self {
        Self::new(
            CheckKind::Ap,
            student_id,
            ConflictReason::ApIneligible,
            format!(
                "Grade '{}' Not Eligible For AP Courses: {}",
                raw_grade,
                ap_courses.join(", ")
            ),
            Some(ConflictDetail::ApCourses { ap_courses }),
        )
    }

    pub fn lookup_failed(check: CheckKind, student_id: &str, cause: &str) -> Self {
        Self::new(
            check,
            student_id,
            ConflictReason::LookupFailed,
            format!("Enrollment Data Unreadable: {}", cause),
            None,
        )
    }
}
