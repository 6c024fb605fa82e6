//! The stored document union

use serde::{Deserialize, Serialize};

use super::course::Course;
use super::request::EnrollmentRequest;
use super::student::Student;

/// A typed document as persisted in a collection segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Document {
    Student(Student),
    Course(Course),
    EnrollmentRequest(EnrollmentRequest),
}

impl Document {
    /// Returns the raw value of a named field, used for index extraction
    pub fn field(&self, name: &str) -> Option<&str> {
        match self {
            Document::Student(s) => s.field(name),
            Document::Course(c) => c.field(name),
            Document::EnrollmentRequest(r) => r.field(name),
        }
    }

    pub fn as_student(&self) -> Option<&Student> {
        match self {
            Document::Student(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_course(&self) -> Option<&Course> {
        match self {
            Document::Course(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_request(&self) -> Option<&EnrollmentRequest> {
        match self {
            Document::EnrollmentRequest(r) => Some(r),
            _ => None,
        }
    }

    pub fn into_student(self) -> Option<Student> {
        match self {
            Document::Student(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_course(self) -> Option<Course> {
        match self {
            Document::Course(c) => Some(c),
            _ => None,
        }
    }
}
