//! Structured JSON logger
//!
//! - One log line = one event
//! - `event` first, `severity` second, remaining fields sorted by key
//! - Synchronous, no buffering, written to stderr
//! - Filtered by a process-wide minimum severity

use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Per-record detail
    Trace = 0,
    /// Normal lifecycle events
    Info = 1,
    /// Rejected rows and other recoverable issues
    Warn = 2,
    /// Operation failures
    Error = 3,
    /// Store contents can no longer be trusted
    Fatal = 4,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }

    fn from_u8(level: u8) -> Option<Self> {
        match level {
            0 => Some(Severity::Trace),
            1 => Some(Severity::Info),
            2 => Some(Severity::Warn),
            3 => Some(Severity::Error),
            4 => Some(Severity::Fatal),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configured log level: a minimum severity, or logging switched off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    At(Severity),
    Off,
}

const LEVEL_OFF: u8 = u8::MAX;

impl LogLevel {
    fn encode(self) -> u8 {
        match self {
            LogLevel::At(severity) => severity as u8,
            LogLevel::Off => LEVEL_OFF,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::At(Severity::Trace)),
            "info" => Ok(LogLevel::At(Severity::Info)),
            "warn" => Ok(LogLevel::At(Severity::Warn)),
            "error" => Ok(LogLevel::At(Severity::Error)),
            "fatal" => Ok(LogLevel::At(Severity::Fatal)),
            "off" => Ok(LogLevel::Off),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

static MIN_LEVEL: AtomicU8 = AtomicU8::new(Severity::Info as u8);

/// A structured logger that outputs JSON lines
pub struct Logger;

impl Logger {
    /// Sets the process-wide minimum level
    pub fn set_level(level: LogLevel) {
        MIN_LEVEL.store(level.encode(), Ordering::Relaxed);
    }

    /// Returns the process-wide minimum level
    pub fn level() -> LogLevel {
        match Severity::from_u8(MIN_LEVEL.load(Ordering::Relaxed)) {
            Some(severity) => LogLevel::At(severity),
            None => LogLevel::Off,
        }
    }

    /// Returns true if an event at `severity` would be written
    pub fn enabled(severity: Severity) -> bool {
        match Self::level() {
            LogLevel::At(min) => severity >= min,
            LogLevel::Off => false,
        }
    }

    /// Log an event with the given severity and fields
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        if !Self::enabled(severity) {
            return;
        }
        let line = Self::render(severity, event, fields);
        let mut stderr = io::stderr().lock();
        // Logging must never affect results.
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }

    /// Renders one log line, newline included
    pub(crate) fn render(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
        let mut output = String::with_capacity(128);

        output.push_str("{\"event\":");
        push_json_string(&mut output, event);
        output.push_str(",\"severity\":");
        push_json_string(&mut output, severity.as_str());

        let mut sorted_fields: Vec<_> = fields.iter().collect();
        sorted_fields.sort_by_key(|(k, _)| *k);

        for (key, value) in sorted_fields {
            output.push(',');
            push_json_string(&mut output, key);
            output.push(':');
            push_json_string(&mut output, value);
        }

        output.push_str("}\n");
        output
    }

    /// Log at TRACE level
    pub fn trace(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Trace, event, fields);
    }

    /// Log at INFO level
    pub fn info(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Info, event, fields);
    }

    /// Log at WARN level
    pub fn warn(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Warn, event, fields);
    }

    /// Log at ERROR level
    pub fn error(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Error, event, fields);
    }

    /// Log at FATAL level
    pub fn fatal(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Fatal, event, fields);
    }
}

fn push_json_string(output: &mut String, s: &str) {
    match serde_json::to_string(s) {
        Ok(quoted) => output.push_str(&quoted),
        Err(_) => output.push_str("\"\""),
    }
}
