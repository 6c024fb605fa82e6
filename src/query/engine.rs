//! Query engine
//!
//! Runs a check as one spawned driver task:
//!
//! 1. Prepare shared state (the AP course set for the AP check)
//! 2. Advance the student cursor
//! 3. Issue the student's join as its own task and queue it
//! 4. Repeat from 2 until the scan is exhausted
//! 5. Emit settled joins in queue order as they complete
//! 6. Send the summary once the tracker reports done
//!
//! The cursor never advances before the current student's join is issued.
//! At most `max_in_flight_joins` joins are outstanding; when the queue is
//! full the driver settles the oldest join before advancing again.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use futures_util::future::join_all;
use futures_util::stream::{FuturesOrdered, StreamExt};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinHandle};

use super::checks::{evaluate, CheckContext};
use super::conflict::{CheckKind, Conflict};
use super::stream::{CheckOutcome, CheckSummary, ConflictStream};
use super::tracker::JoinTracker;
use crate::config::EngineConfig;
use crate::observability::{log_event_with_fields, Event};
use crate::schema::Collection;
use crate::store::Store;

/// Runs validation checks against a loaded store.
///
/// Checks are read-only and independent; any number may run concurrently.
/// Running a check spawns tasks, so it must happen inside a Tokio runtime.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    store: Store,
    config: Arc<EngineConfig>,
}

impl QueryEngine {
    pub fn new(store: Store, config: Arc<EngineConfig>) -> Self {
        Self { store, config }
    }

    /// Returns the store being checked
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Students whose grade is missing, not an integer, or out of range
    pub fn check_grades(&self) -> ConflictStream {
        self.run(CheckKind::Grades)
    }

    /// Students with no enrollments or a credit total out of range
    pub fn check_credits(&self) -> ConflictStream {
        self.run(CheckKind::Credits)
    }

    /// Students not covering every required subject
    pub fn check_subjects(&self) -> ConflictStream {
        self.run(CheckKind::Subjects)
    }

    /// Students not enrolled in the advisory course
    pub fn check_advisory(&self) -> ConflictStream {
        self.run(CheckKind::Advisory)
    }

    /// Students outside the AP grades enrolled in AP courses
    pub fn check_ap(&self) -> ConflictStream {
        self.run(CheckKind::Ap)
    }

    /// Starts one check, returning its conflict stream.
    pub fn run(&self, kind: CheckKind) -> ConflictStream {
        let capacity = self.config.max_in_flight_joins.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        let (summary_tx, summary_rx) = oneshot::channel();

        let store = self.store.clone();
        let config = Arc::clone(&self.config);
        tokio::spawn(async move {
            let summary = drive(kind, store, config, &tx).await;

            let scanned = summary.scanned.to_string();
            let conflicts = summary.conflicts.to_string();
            log_event_with_fields(
                Event::CheckComplete,
                &[
                    ("check", kind.as_str()),
                    ("conflicts", conflicts.as_str()),
                    ("scanned", scanned.as_str()),
                ],
            );

            // Summary first: the stream ends when `tx` drops.
            let _ = summary_tx.send(summary);
            drop(tx);
        });

        ConflictStream::new(kind, rx, summary_rx)
    }

    /// Runs all five checks concurrently and collects their results.
    pub async fn run_all(&self) -> CheckReport {
        let streams: Vec<ConflictStream> = CheckKind::ALL.iter().map(|kind| self.run(*kind)).collect();
        let outcomes = join_all(streams.into_iter().map(ConflictStream::collect)).await;
        CheckReport::from_outcomes(outcomes)
    }
}

/// Results of several checks, keyed by check
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct CheckReport {
    outcomes: BTreeMap<CheckKind, CheckOutcome>,
}

impl CheckReport {
    /// Builds a report from individually collected outcomes
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = CheckOutcome>) -> Self {
        Self {
            outcomes: outcomes
                .into_iter()
                .map(|outcome| (outcome.summary.check, outcome))
                .collect(),
        }
    }

    pub fn get(&self, kind: CheckKind) -> Option<&CheckOutcome> {
        self.outcomes.get(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CheckKind, &CheckOutcome)> {
        self.outcomes.iter()
    }

    /// Total conflicts across all checks
    pub fn total_conflicts(&self) -> usize {
        self.outcomes.values().map(|o| o.conflicts.len()).sum()
    }
}

/// Per-run driver state
struct CheckRun<'a> {
    kind: CheckKind,
    tracker: JoinTracker,
    /// Joins in issue order; the matching student ids in the same order
    in_flight: FuturesOrdered<JoinHandle<Option<Conflict>>>,
    students: VecDeque<String>,
    tx: &'a mpsc::Sender<Conflict>,
    scanned: usize,
    conflicts: usize,
}

impl<'a> CheckRun<'a> {
    fn new(kind: CheckKind, tx: &'a mpsc::Sender<Conflict>) -> Self {
        Self {
            kind,
            tracker: JoinTracker::new(),
            in_flight: FuturesOrdered::new(),
            students: VecDeque::new(),
            tx,
            scanned: 0,
            conflicts: 0,
        }
    }

    fn issue(&mut self, student_id: String, join: JoinHandle<Option<Conflict>>) {
        self.tracker.issue();
        self.in_flight.push_back(join);
        self.students.push_back(student_id);
    }

    /// Waits for the oldest outstanding join and emits its conflict.
    async fn settle_next(&mut self) -> bool {
        let Some(joined) = self.in_flight.next().await else {
            return false;
        };
        let student_id = self.students.pop_front().unwrap_or_default();
        self.tracker.complete();

        if let Some(conflict) = self.conflict_from(student_id, joined) {
            self.conflicts += 1;
            // A dropped receiver only means nobody is listening.
            let _ = self.tx.send(conflict).await;
        }
        true
    }

    fn conflict_from(
        &self,
        student_id: String,
        joined: Result<Option<Conflict>, JoinError>,
    ) -> Option<Conflict> {
        match joined {
            Ok(conflict) => conflict,
            Err(error) => {
                let message = error.to_string();
                log_event_with_fields(
                    Event::JoinFailed,
                    &[
                        ("check", self.kind.as_str()),
                        ("error", message.as_str()),
                        ("student_id", student_id.as_str()),
                    ],
                );
                Some(Conflict::lookup_failed(self.kind, &student_id, &message))
            }
        }
    }

    fn summary(&self, error: Option<String>) -> CheckSummary {
        CheckSummary {
            check: self.kind,
            scanned: self.scanned,
            conflicts: self.conflicts,
            error,
        }
    }
}

async fn drive(
    kind: CheckKind,
    store: Store,
    config: Arc<EngineConfig>,
    tx: &mpsc::Sender<Conflict>,
) -> CheckSummary {
    log_event_with_fields(Event::CheckStarted, &[("check", kind.as_str())]);

    let max_in_flight = config.max_in_flight_joins.max(1);
    let mut run = CheckRun::new(kind, tx);

    let mut cursor = store.scan(Collection::Students).await;
    let ctx = match CheckContext::prepare(kind, store, config).await {
        Ok(ctx) => Arc::new(ctx),
        Err(error) => return scan_failed(&run, error.to_string()),
    };

    let mut scan_error = None;
    loop {
        while run.tracker.outstanding() >= max_in_flight {
            run.settle_next().await;
        }

        match cursor.next().await {
            Ok(Some(record)) => {
                run.scanned += 1;
                let Some(student) = record.document.into_student() else {
                    continue;
                };
                let student_id = student.student_id.clone();
                let join = tokio::spawn(evaluate(Arc::clone(&ctx), student));
                run.issue(student_id, join);
            }
            Ok(None) => break,
            Err(error) => {
                scan_error = Some(error.to_string());
                break;
            }
        }
    }

    if let Some(error) = scan_error.as_deref() {
        log_scan_failed(kind, error);
    }

    let mut done = run.tracker.finish_scan();
    while !done && run.settle_next().await {
        done = run.tracker.is_done();
    }

    run.summary(scan_error)
}

fn scan_failed(run: &CheckRun<'_>, error: String) -> CheckSummary {
    log_scan_failed(run.kind, &error);
    run.summary(Some(error))
}

fn log_scan_failed(kind: CheckKind, error: &str) {
    log_event_with_fields(Event::ScanFailed, &[("check", kind.as_str()), ("error", error)]);
}
