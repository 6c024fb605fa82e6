//! Observability for enrollcheck
//!
//! Structured JSON logging of lifecycle events.
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on loads or checks
//! 3. Deterministic output
//!
//! # Usage
//!
//! ```ignore
//! use enrollcheck::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::CollectionLoaded, &[("collection", "students"), ("inserted", "42")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{LogLevel, Logger, Severity};

/// Log a lifecycle event
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
