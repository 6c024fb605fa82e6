//! Lifecycle events
//!
//! Events are explicit and typed.

use std::fmt;

use super::logger::Severity;

/// Observable events in enrollcheck
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration loaded and validated
    ConfigLoaded,

    // Store lifecycle
    /// Collections dropped and recreated
    StoreReset,
    /// Segment files could not be opened
    StorageUnavailable,
    /// A row was rejected during bulk insert
    RowRejected,
    /// One collection's bulk insert settled
    CollectionLoaded,
    /// All three collections settled
    LoadComplete,

    // Checks
    /// A check started scanning
    CheckStarted,
    /// A per-student join could not read its data
    JoinFailed,
    /// The student scan stopped on a storage error
    ScanFailed,
    /// A check finished: scan exhausted, all joins settled
    CheckComplete,
}

impl Event {
    /// Returns the event name as logged
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::StoreReset => "STORE_RESET",
            Event::StorageUnavailable => "STORAGE_UNAVAILABLE",
            Event::RowRejected => "ROW_REJECTED",
            Event::CollectionLoaded => "COLLECTION_LOADED",
            Event::LoadComplete => "LOAD_COMPLETE",
            Event::CheckStarted => "CHECK_STARTED",
            Event::JoinFailed => "JOIN_FAILED",
            Event::ScanFailed => "SCAN_FAILED",
            Event::CheckComplete => "CHECK_COMPLETE",
        }
    }

    /// Returns the severity this event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::StorageUnavailable => Severity::Fatal,
            Event::JoinFailed | Event::ScanFailed => Severity::Error,
            Event::RowRejected => Severity::Warn,
            Event::CheckStarted => Severity::Trace,
            _ => Severity::Info,
        }
    }

    /// Returns true if this event means the store cannot be used
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_screaming_snake_case() {
        let events = [
            Event::ConfigLoaded,
            Event::StoreReset,
            Event::StorageUnavailable,
            Event::RowRejected,
            Event::CollectionLoaded,
            Event::LoadComplete,
            Event::CheckStarted,
            Event::JoinFailed,
            Event::ScanFailed,
            Event::CheckComplete,
        ];
        for event in events {
            let name = event.as_str();
            assert!(name.chars().all(|c| c.is_ascii_uppercase() || c == '_'), "{name}");
        }
    }

    #[test]
    fn test_only_storage_unavailable_is_fatal() {
        assert!(Event::StorageUnavailable.is_fatal());
        assert!(!Event::JoinFailed.is_fatal());
        assert!(!Event::RowRejected.is_fatal());
    }
}
