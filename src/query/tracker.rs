//! Outstanding-work tracking for a check
//!
//! A check is done when its scan is exhausted AND every join it issued has
//! completed. The done signal fires exactly once, on whichever of those two
//! transitions comes last.

/// Counts issued and completed per-student joins.
#[derive(Debug, Default)]
pub struct JoinTracker {
    issued: usize,
    completed: usize,
    scan_exhausted: bool,
    done: bool,
}

impl JoinTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a newly issued join.
    pub fn issue(&mut self) {
        debug_assert!(!self.scan_exhausted, "join issued after scan end");
        self.issued += 1;
    }

    /// Records a completed join. Returns true if this made the check done.
    pub fn complete(&mut self) -> bool {
        debug_assert!(self.completed < self.issued, "join completed twice");
        self.completed += 1;
        self.fire()
    }

    /// Records that the scan is exhausted. Returns true if this made the
    /// check done.
    pub fn finish_scan(&mut self) -> bool {
        self.scan_exhausted = true;
        self.fire()
    }

    /// Joins issued but not yet completed
    pub fn outstanding(&self) -> usize {
        self.issued - self.completed
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    fn fire(&mut self) -> bool {
        if self.done || !self.scan_exhausted || self.outstanding() > 0 {
            return false;
        }
        self.done = true;
        true
    }
}
