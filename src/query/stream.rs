//! Conflict streams
//!
//! A check run produces conflicts on a bounded channel and, once done, one
//! `CheckSummary`. The stream ends when the run is done; the summary is sent
//! before the stream ends, so it is always ready after the last item.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::stream::Stream;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use super::conflict::{CheckKind, Conflict};

/// Totals of one finished check run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckSummary {
    pub check: CheckKind,
    /// Students scanned
    pub scanned: usize,
    /// Conflicts produced
    pub conflicts: usize,
    /// Set if the run stopped early
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// All conflicts of a check, with its summary
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub summary: CheckSummary,
    pub conflicts: Vec<Conflict>,
}

/// Async stream of the conflicts of one check, in student scan order.
#[derive(Debug)]
pub struct ConflictStream {
    check: CheckKind,
    conflicts: mpsc::Receiver<Conflict>,
    summary: oneshot::Receiver<CheckSummary>,
}

impl ConflictStream {
    pub(crate) fn new(
        check: CheckKind,
        conflicts: mpsc::Receiver<Conflict>,
        summary: oneshot::Receiver<CheckSummary>,
    ) -> Self {
        Self {
            check,
            conflicts,
            summary,
        }
    }

    /// Returns the check this stream belongs to
    pub fn check(&self) -> CheckKind {
        self.check
    }

    /// Waits for the run summary, discarding unread conflicts.
    pub async fn finish(mut self) -> CheckSummary {
        self.conflicts.close();
        while self.conflicts.recv().await.is_some() {}
        self.await_summary().await
    }

    /// Drains the stream into a list of conflicts plus the run summary.
    pub async fn collect(mut self) -> CheckOutcome {
        let mut conflicts = Vec::new();
        while let Some(conflict) = self.conflicts.recv().await {
            conflicts.push(conflict);
        }
        let summary = self.await_summary().await;
        CheckOutcome { summary, conflicts }
    }

    /// Drains the stream, returning the number of conflicts.
    pub async fn count(mut self) -> usize {
        let mut count = 0;
        while self.conflicts.recv().await.is_some() {
            count += 1;
        }
        count
    }

    async fn await_summary(self) -> CheckSummary {
        let check = self.check;
        self.summary.await.unwrap_or_else(|_| CheckSummary {
            check,
            scanned: 0,
            conflicts: 0,
            error: Some("check task ended without a summary".to_string()),
        })
    }
}

impl Stream for ConflictStream {
    type Item = Conflict;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Conflict>> {
        self.conflicts.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    fn channel(check: CheckKind) -> (mpsc::Sender<Conflict>, oneshot::Sender<CheckSummary>, ConflictStream) {
        let (tx, rx) = mpsc::channel(4);
        let (summary_tx, summary_rx) = oneshot::channel();
        (tx, summary_tx, ConflictStream::new(check, rx, summary_rx))
    }

    #[tokio::test]
    async fn test_collect_returns_items_and_summary() {
        let (tx, summary_tx, stream) = channel(CheckKind::Credits);
        tx.send(Conflict::credits_out_of_range("S1", 8)).await.unwrap();
        summary_tx
            .send(CheckSummary {
                check: CheckKind::Credits,
                scanned: 3,
                conflicts: 1,
                error: None,
            })
            .unwrap();
        drop(tx);

        let outcome = stream.collect().await;
        assert_eq!(outcome.conflicts.len(), 1);
        assert_eq!(outcome.summary.scanned, 3);
    }

    #[tokio::test]
    async fn test_polling_as_stream() {
        let (tx, _summary_tx, mut stream) = channel(CheckKind::Grades);
        tx.send(Conflict::invalid_grade("S1", "13")).await.unwrap();
        drop(tx);

        assert_eq!(stream.next().await.unwrap().student_id, "S1");
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_missing_summary_is_reported() {
        let (tx, summary_tx, stream) = channel(CheckKind::Ap);
        drop(tx);
        drop(summary_tx);

        let summary = stream.finish().await;
        assert!(summary.error.is_some());
    }
}
