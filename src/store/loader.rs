//! Three-collection load protocol
//!
//! A load resets the store, then runs the three bulk inserts as independent
//! tasks. Each task reports its own completion; the load is done only after
//! all three have reported, whatever order they finish in.

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use super::errors::{StoreError, StoreResult};
use super::store::{BulkInsertReport, Store};
use crate::model::Row;
use crate::observability::{log_event_with_fields, Event};
use crate::schema::Collection;

/// Parsed rows for the three datasets
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub students: Vec<Row>,
    pub courses: Vec<Row>,
    pub requests: Vec<Row>,
}

impl Dataset {
    fn into_batches(self) -> [(Collection, Vec<Row>); 3] {
        [
            (Collection::Students, self.students),
            (Collection::Courses, self.courses),
            (Collection::EnrollmentRequests, self.requests),
        ]
    }
}

/// Progress notifications emitted while loading
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadEvent {
    /// One collection's bulk insert settled. Fires once per collection.
    CollectionLoaded {
        collection: Collection,
        inserted: usize,
        rejected: usize,
    },
    /// All three collections settled
    Complete,
}

/// Outcome of a full load
#[derive(Debug)]
pub struct LoadReport {
    pub students: BulkInsertReport,
    pub courses: BulkInsertReport,
    pub requests: BulkInsertReport,
}

impl LoadReport {
    /// Returns the report for one collection
    pub fn collection(&self, collection: Collection) -> &BulkInsertReport {
        match collection {
            Collection::Students => &self.students,
            Collection::Courses => &self.courses,
            Collection::EnrollmentRequests => &self.requests,
        }
    }

    /// Returns the reports in load order
    pub fn reports(&self) -> [&BulkInsertReport; 3] {
        [&self.students, &self.courses, &self.requests]
    }

    /// Total rows rejected across all collections
    pub fn total_rejected(&self) -> usize {
        self.reports().iter().map(|r| r.rejected.len()).sum()
    }
}

impl Store {
    /// Replaces the store contents with `dataset`.
    pub async fn load(&self, dataset: Dataset) -> StoreResult<LoadReport> {
        self.load_with_progress(dataset, None).await
    }

    /// Replaces the store contents with `dataset`, reporting each collection's
    /// completion on `progress`.
    ///
    /// Returns only after all three completions fired. A dropped progress
    /// receiver does not affect the load.
    ///
    /// # Errors
    ///
    /// Fails if the reset fails or a bulk insert hits a storage error.
    /// Rejected rows are not errors; they are listed in the report.
    pub async fn load_with_progress(
        &self,
        dataset: Dataset,
        progress: Option<mpsc::UnboundedSender<LoadEvent>>,
    ) -> StoreResult<LoadReport> {
        self.reset().await?;

        let mut tasks = JoinSet::new();
        for (collection, rows) in dataset.into_batches() {
            let store = self.clone();
            tasks.spawn(async move { store.bulk_insert(collection, rows).await });
        }

        let mut remaining = Collection::ALL.len();
        let mut settled: [Option<BulkInsertReport>; 3] = [None, None, None];
        let mut failure: Option<StoreError> = None;

        while remaining > 0 {
            let Some(joined) = tasks.join_next().await else {
                break;
            };
            remaining -= 1;

            match joined {
                Ok(Ok(report)) => {
                    if let Some(tx) = progress.as_ref() {
                        let _ = tx.send(LoadEvent::CollectionLoaded {
                            collection: report.collection,
                            inserted: report.inserted,
                            rejected: report.rejected.len(),
                        });
                    }
                    let slot = report.collection.ordinal();
                    settled[slot] = Some(report);
                }
                Ok(Err(error)) => {
                    failure.get_or_insert(error);
                }
                Err(join_error) => {
                    failure.get_or_insert(StoreError::TaskFailed(join_error.to_string()));
                }
            }
        }

        if let Some(error) = failure {
            return Err(error);
        }

        let [students, courses, requests] = settled;
        let report = match (students, courses, requests) {
            (Some(students), Some(courses), Some(requests)) => LoadReport {
                students,
                courses,
                requests,
            },
            _ => {
                return Err(StoreError::TaskFailed(
                    "a collection load never completed".to_string(),
                ))
            }
        };

        if let Some(tx) = progress.as_ref() {
            let _ = tx.send(LoadEvent::Complete);
        }

        let inserted: usize = report.reports().iter().map(|r| r.inserted).sum();
        let inserted = inserted.to_string();
        let rejected = report.total_rejected().to_string();
        log_event_with_fields(
            Event::LoadComplete,
            &[("inserted", inserted.as_str()), ("rejected", rejected.as_str())],
        );
        Ok(report)
    }
}
