//! Store Load Tests
//!
//! Tests for the load protocol:
//! - Every accepted row is stored and reachable by key or index
//! - Rejected rows are reported, never stored
//! - A reload leaves no trace of the previous load
//! - Progress fires once per collection, then once for completion

use enrollcheck::model::{fields, Row};
use enrollcheck::schema::Collection;
use enrollcheck::storage::RecordKey;
use enrollcheck::store::{Dataset, LoadEvent, Store, StoreError, StoreOptions};
use std::collections::HashSet;
use tempfile::TempDir;
use tokio::sync::mpsc;

// =============================================================================
// Helper Functions
// =============================================================================

fn row(pairs: &[(&str, &str)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn student(id: &str, grade: &str) -> Row {
    row(&[("student_id", id), ("grade_level", grade)])
}

fn course(code: &str, subject: &str, credits: &str, is_ap: &str) -> Row {
    row(&[
        ("course_code", code),
        ("subject_area", subject),
        ("credits_offered", credits),
        ("is_ap", is_ap),
    ])
}

fn request(student_id: &str, course_code: &str) -> Row {
    row(&[("student_id", student_id), ("course_code", course_code)])
}

fn sized_dataset(students: usize, courses: usize, requests: usize) -> Dataset {
    Dataset {
        students: (0..students)
            .map(|i| student(&format!("S{}", i), "10"))
            .collect(),
        courses: (0..courses)
            .map(|i| course(&format!("C{}", i), "MATH", "4", "FALSE"))
            .collect(),
        requests: (0..requests)
            .map(|i| request(&format!("S{}", i % students.max(1)), &format!("C{}", i % courses.max(1))))
            .collect(),
    }
}

fn memory_store() -> Store {
    Store::open(StoreOptions::default()).unwrap()
}

// =============================================================================
// Load Round Trip Tests
// =============================================================================

/// N students, M courses and K requests load as exactly N, M and K records.
#[tokio::test]
async fn test_load_counts_match_input() {
    let store = memory_store();
    let report = store.load(sized_dataset(40, 12, 150)).await.unwrap();

    assert_eq!(report.students.inserted, 40);
    assert_eq!(report.courses.inserted, 12);
    assert_eq!(report.requests.inserted, 150);
    assert_eq!(report.total_rejected(), 0);

    assert_eq!(store.count(Collection::Students).await, 40);
    assert_eq!(store.count(Collection::Courses).await, 12);
    assert_eq!(store.count(Collection::EnrollmentRequests).await, 150);
}

/// Every loaded student is reachable by primary key.
#[tokio::test]
async fn test_every_student_reachable_by_key() {
    let store = memory_store();
    store.load(sized_dataset(25, 3, 0)).await.unwrap();

    for i in 0..25 {
        let id = format!("S{}", i);
        let record = store.get(Collection::Students, &id).await.unwrap().unwrap();
        assert_eq!(record.key, RecordKey::Natural(id.clone()));
        assert_eq!(record.document.field(fields::STUDENT_ID), Some(id.as_str()));
    }
}

/// Enrollment requests receive distinct sequence keys in insertion order.
#[tokio::test]
async fn test_requests_keyed_by_sequence() {
    let store = memory_store();
    store.load(sized_dataset(2, 2, 5)).await.unwrap();

    let mut cursor = store.scan(Collection::EnrollmentRequests).await;
    let mut keys = Vec::new();
    while let Some(record) = cursor.next().await.unwrap() {
        keys.push(record.key);
    }

    let expected: Vec<RecordKey> = (1..=5).map(RecordKey::Sequence).collect();
    assert_eq!(keys, expected);
}

/// The student_id index returns every request of a student, duplicates included.
#[tokio::test]
async fn test_request_index_keeps_duplicates() {
    let store = memory_store();
    store
        .load(Dataset {
            students: vec![student("S1", "10")],
            courses: vec![course("C1", "MATH", "4", "FALSE")],
            requests: vec![request("S1", "C1"), request("S2", "C1"), request("S1", "C1")],
        })
        .await
        .unwrap();

    let records = store
        .lookup_by_index(Collection::EnrollmentRequests, fields::STUDENT_ID, "S1")
        .await
        .unwrap();
    assert_eq!(records.len(), 2);

    let none = store
        .lookup_by_index(Collection::EnrollmentRequests, fields::STUDENT_ID, "S9")
        .await
        .unwrap();
    assert!(none.is_empty());
}

// =============================================================================
// Rejection Tests
// =============================================================================

/// Duplicate natural keys are rejected; the first row wins.
#[tokio::test]
async fn test_duplicate_keys_rejected() {
    let store = memory_store();
    let report = store
        .load(Dataset {
            students: vec![student("S1", "10"), student("S1", "12")],
            courses: vec![
                course("C1", "MATH", "4", "FALSE"),
                course("C1", "HISTORY", "2", "FALSE"),
            ],
            requests: vec![],
        })
        .await
        .unwrap();

    assert_eq!(report.students.inserted, 1);
    assert_eq!(report.students.rejected.len(), 1);
    assert_eq!(report.students.rejected[0].row, 1);
    assert!(matches!(
        report.students.rejected[0].error,
        StoreError::DuplicateKey { .. }
    ));
    assert_eq!(report.courses.rejected.len(), 1);

    let kept = store.get(Collection::Students, "S1").await.unwrap().unwrap();
    assert_eq!(kept.document.field(fields::GRADE_LEVEL), Some("10"));
}

/// Rows without their key field are rejected with MissingKey.
#[tokio::test]
async fn test_missing_key_rejected() {
    let store = memory_store();
    let report = store
        .load(Dataset {
            students: vec![row(&[("grade_level", "10")]), student("S1", "10")],
            courses: vec![row(&[("subject_area", "MATH")])],
            requests: vec![row(&[("student_id", "S1")])],
        })
        .await
        .unwrap();

    assert_eq!(report.students.inserted, 1);
    assert_eq!(report.students.rejected[0].error.code(), "ENROLL_MISSING_KEY");
    assert_eq!(report.courses.inserted, 0);
    // Enrollment requests declare no required fields.
    assert_eq!(report.requests.inserted, 1);
}

// =============================================================================
// Reset Tests
// =============================================================================

/// A second load replaces the first completely.
#[tokio::test]
async fn test_reload_leaves_no_trace() {
    let store = memory_store();
    store.load(sized_dataset(10, 10, 10)).await.unwrap();

    store
        .load(Dataset {
            students: vec![student("NEW", "9")],
            courses: vec![],
            requests: vec![],
        })
        .await
        .unwrap();

    assert_eq!(store.count(Collection::Students).await, 1);
    assert_eq!(store.count(Collection::Courses).await, 0);
    assert_eq!(store.count(Collection::EnrollmentRequests).await, 0);
    assert!(store.get(Collection::Students, "S0").await.unwrap().is_none());

    let stale = store
        .lookup_by_index(Collection::EnrollmentRequests, fields::STUDENT_ID, "S0")
        .await
        .unwrap();
    assert!(stale.is_empty());
}

/// Sequence keys restart after a reload.
#[tokio::test]
async fn test_reload_restarts_sequence() {
    let store = memory_store();
    store.load(sized_dataset(1, 1, 3)).await.unwrap();
    store.load(sized_dataset(1, 1, 1)).await.unwrap();

    let mut cursor = store.scan(Collection::EnrollmentRequests).await;
    let first = cursor.next().await.unwrap().unwrap();
    assert_eq!(first.key, RecordKey::Sequence(1));
}

/// A cursor opened before a reload is invalidated by it.
#[tokio::test]
async fn test_cursor_invalidated_by_reload() {
    let store = memory_store();
    store.load(sized_dataset(3, 1, 0)).await.unwrap();

    let mut cursor = store.scan(Collection::Students).await;
    assert!(cursor.next().await.unwrap().is_some());

    store.load(sized_dataset(3, 1, 0)).await.unwrap();

    let err = cursor.next().await.unwrap_err();
    assert!(matches!(err, StoreError::CursorInvalidated));
}

/// Every load advances the generation.
#[tokio::test]
async fn test_generation_advances() {
    let store = memory_store();
    let before = store.generation().await;

    store.load(Dataset::default()).await.unwrap();
    store.load(Dataset::default()).await.unwrap();

    assert_eq!(store.generation().await, before + 2);
}

// =============================================================================
// Disk Segment Tests
// =============================================================================

/// With a data directory, each collection writes its own segment file.
#[tokio::test]
async fn test_data_dir_receives_segments() {
    let tmp = TempDir::new().unwrap();
    let store = Store::open(StoreOptions {
        data_dir: Some(tmp.path().to_path_buf()),
        ..StoreOptions::default()
    })
    .unwrap();

    store.load(sized_dataset(4, 2, 6)).await.unwrap();

    for collection in Collection::ALL {
        let path = tmp.path().join(format!("{}.seg", collection.name()));
        let size = std::fs::metadata(&path).unwrap().len();
        assert!(size > 0, "{} segment is empty", collection);
    }

    let record = store.get(Collection::Courses, "C1").await.unwrap().unwrap();
    assert_eq!(record.document.field(fields::COURSE_CODE), Some("C1"));
}

/// A reset that cannot open every segment file truncates none of them.
#[tokio::test]
async fn test_failed_reset_keeps_previous_segments() {
    let tmp = TempDir::new().unwrap();
    let store = Store::open(StoreOptions {
        data_dir: Some(tmp.path().to_path_buf()),
        ..StoreOptions::default()
    })
    .unwrap();
    store.load(sized_dataset(4, 2, 6)).await.unwrap();

    let students_seg = tmp.path().join("students.seg");
    let written = std::fs::metadata(&students_seg).unwrap().len();
    assert!(written > 0);

    // Students open first; courses can no longer be opened as a file.
    let courses_seg = tmp.path().join("courses.seg");
    std::fs::remove_file(&courses_seg).unwrap();
    std::fs::create_dir(&courses_seg).unwrap();

    let err = store.reset().await.unwrap_err();
    assert!(matches!(err, StoreError::StorageUnavailable(_)));

    assert_eq!(std::fs::metadata(&students_seg).unwrap().len(), written);
    assert_eq!(store.count(Collection::Students).await, 4);
    assert!(store.get(Collection::Students, "S0").await.unwrap().is_some());
}

/// An unusable data directory fails the open.
#[tokio::test]
async fn test_unusable_data_dir_fails_open() {
    let tmp = TempDir::new().unwrap();
    let blocker = tmp.path().join("not_a_dir");
    std::fs::write(&blocker, b"x").unwrap();

    let err = Store::open(StoreOptions {
        data_dir: Some(blocker),
        ..StoreOptions::default()
    })
    .unwrap_err();

    assert!(matches!(err, StoreError::StorageUnavailable(_)));
    assert!(err.is_fatal());
}

// =============================================================================
// Progress Tests
// =============================================================================

/// Each collection reports completion exactly once, then Complete fires.
#[tokio::test]
async fn test_progress_once_per_collection() {
    let store = memory_store();
    let (tx, mut rx) = mpsc::unbounded_channel();

    store
        .load_with_progress(sized_dataset(5, 3, 8), Some(tx))
        .await
        .unwrap();

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    assert_eq!(events.len(), 4);
    assert_eq!(events.last(), Some(&LoadEvent::Complete));

    let loaded: HashSet<Collection> = events
        .iter()
        .filter_map(|event| match event {
            LoadEvent::CollectionLoaded { collection, .. } => Some(*collection),
            LoadEvent::Complete => None,
        })
        .collect();
    assert_eq!(loaded.len(), 3);

    assert!(events.contains(&LoadEvent::CollectionLoaded {
        collection: Collection::EnrollmentRequests,
        inserted: 8,
        rejected: 0,
    }));
}

/// A dropped progress receiver does not disturb the load.
#[tokio::test]
async fn test_dropped_progress_receiver() {
    let store = memory_store();
    let (tx, rx) = mpsc::unbounded_channel();
    drop(rx);

    let report = store
        .load_with_progress(sized_dataset(2, 2, 2), Some(tx))
        .await
        .unwrap();
    assert_eq!(report.requests.inserted, 2);
}
