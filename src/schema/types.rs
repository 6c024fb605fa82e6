//! Collection schema definitions
//!
//! Every collection declares:
//! - how records are keyed (a unique natural field or a synthetic sequence)
//! - the fields it expects, with their types
//! - the secondary indexes maintained on insert

use serde::Serialize;
use std::fmt;

use crate::model::fields;

/// The three collections owned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Students,
    Courses,
    EnrollmentRequests,
}

impl Collection {
    /// All collections, in load order
    pub const ALL: [Collection; 3] = [
        Collection::Students,
        Collection::Courses,
        Collection::EnrollmentRequests,
    ];

    /// Stable collection name, also used for segment file names
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Students => "students",
            Collection::Courses => "courses",
            Collection::EnrollmentRequests => "course_requests",
        }
    }

    /// Position of this collection in [`Collection::ALL`]
    pub fn ordinal(&self) -> usize {
        match self {
            Collection::Students => 0,
            Collection::Courses => 1,
            Collection::EnrollmentRequests => 2,
        }
    }

    /// Returns the declared schema for this collection
    pub fn schema(&self) -> CollectionSchema {
        match self {
            Collection::Students => CollectionSchema {
                collection: *self,
                key: KeyKind::Field(fields::STUDENT_ID),
                fields: vec![
                    FieldDef::required(fields::STUDENT_ID, FieldType::String),
                    FieldDef::optional(fields::GRADE_LEVEL, FieldType::Integer),
                ],
                indexes: vec![fields::STUDENT_ID],
            },
            Collection::Courses => CollectionSchema {
                collection: *self,
                key: KeyKind::Field(fields::COURSE_CODE),
                fields: vec![
                    FieldDef::required(fields::COURSE_CODE, FieldType::String),
                    FieldDef::optional(fields::COURSE_NAME, FieldType::String),
                    FieldDef::optional(fields::SUBJECT_AREA, FieldType::String),
                    FieldDef::optional(fields::CREDITS_OFFERED, FieldType::Integer),
                    FieldDef::optional(fields::IS_AP, FieldType::Flag),
                ],
                indexes: vec![
                    fields::COURSE_CODE,
                    fields::COURSE_NAME,
                    fields::SUBJECT_AREA,
                    fields::CREDITS_OFFERED,
                    fields::IS_AP,
                ],
            },
            Collection::EnrollmentRequests => CollectionSchema {
                collection: *self,
                key: KeyKind::Sequence,
                fields: vec![
                    FieldDef::optional(fields::STUDENT_ID, FieldType::String),
                    FieldDef::optional(fields::COURSE_CODE, FieldType::String),
                ],
                indexes: vec![fields::STUDENT_ID, fields::COURSE_CODE],
            },
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How records of a collection are keyed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "field", rename_all = "snake_case")]
pub enum KeyKind {
    /// Unique natural key taken from a field
    Field(&'static str),
    /// Synthetic auto-incrementing key
    Sequence,
}

/// Field types. Values always arrive as text; the type records how
/// ingestion interprets them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text
    String,
    /// Integer, malformed values tolerated
    Integer,
    /// Flag compared against a literal
    Flag,
}

impl FieldType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Flag => "flag",
        }
    }
}

/// A declared field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDef {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether the field must be present and non-blank
    pub required: bool,
}

impl FieldDef {
    /// Create a required field
    pub fn required(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: true,
        }
    }

    /// Create an optional field
    pub fn optional(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: false,
        }
    }
}

/// Complete schema of one collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionSchema {
    pub collection: Collection,
    pub key: KeyKind,
    pub fields: Vec<FieldDef>,
    /// Secondary indexes, by field name
    pub indexes: Vec<&'static str>,
}

impl CollectionSchema {
    /// Returns true if the collection declares an index on `field`
    pub fn has_index(&self, field: &str) -> bool {
        self.indexes.iter().any(|name| *name == field)
    }

    /// Returns the natural key field, if the collection has one
    pub fn key_field(&self) -> Option<&'static str> {
        match self.key {
            KeyKind::Field(name) => Some(name),
            KeyKind::Sequence => None,
        }
    }
}

/// Schemas of every collection, in load order
pub fn catalog() -> Vec<CollectionSchema> {
    Collection::ALL.iter().map(Collection::schema).collect()
}
