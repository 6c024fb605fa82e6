//! Storage error types
//!
//! Error codes:
//! - ENROLL_STORAGE_UNAVAILABLE (FATAL) - segment file could not be opened
//! - ENROLL_STORAGE_WRITE_FAILED (ERROR)
//! - ENROLL_STORAGE_ENCODE_FAILED (ERROR)
//! - ENROLL_DATA_CORRUPTION (FATAL)

use std::fmt;
use std::io;

/// Severity levels for storage errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, store continues
    Error,
    /// Store contents can no longer be trusted
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Storage-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorCode {
    /// Segment file could not be created or opened
    StorageUnavailable,
    /// Segment append failed
    WriteFailed,
    /// Record could not be encoded or decoded
    EncodeFailed,
    /// Frame checksum mismatch or truncated frame
    DataCorruption,
}

impl StorageErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            StorageErrorCode::StorageUnavailable => "ENROLL_STORAGE_UNAVAILABLE",
            StorageErrorCode::WriteFailed => "ENROLL_STORAGE_WRITE_FAILED",
            StorageErrorCode::EncodeFailed => "ENROLL_STORAGE_ENCODE_FAILED",
            StorageErrorCode::DataCorruption => "ENROLL_DATA_CORRUPTION",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            StorageErrorCode::StorageUnavailable => Severity::Fatal,
            StorageErrorCode::WriteFailed => Severity::Error,
            StorageErrorCode::EncodeFailed => Severity::Error,
            StorageErrorCode::DataCorruption => Severity::Fatal,
        }
    }
}

impl fmt::Display for StorageErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Storage error type with context
#[derive(Debug)]
pub struct StorageError {
    code: StorageErrorCode,
    message: String,
    /// Byte offset within the segment, if applicable
    offset: Option<u64>,
    source: Option<io::Error>,
}

impl StorageError {
    /// Create a storage unavailable error
    pub fn unavailable(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: StorageErrorCode::StorageUnavailable,
            message: message.into(),
            offset: None,
            source: Some(source),
        }
    }

    /// Create a write failed error
    pub fn write_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: StorageErrorCode::WriteFailed,
            message: message.into(),
            offset: None,
            source: Some(source),
        }
    }

    /// Create an encode failed error
    pub fn encode_failed(message: impl Into<String>) -> Self {
        Self {
            code: StorageErrorCode::EncodeFailed,
            message: message.into(),
            offset: None,
            source: None,
        }
    }

    /// Create a data corruption error at a segment offset (FATAL)
    pub fn corruption_at_offset(offset: u64, reason: impl Into<String>) -> Self {
        Self {
            code: StorageErrorCode::DataCorruption,
            message: reason.into(),
            offset: Some(offset),
            source: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> StorageErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the segment offset, if applicable
    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    /// Returns whether this error is fatal
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity(), self.code, self.message)?;
        if let Some(offset) = self.offset {
            write!(f, " (byte_offset: {})", offset)?;
        }
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            StorageErrorCode::StorageUnavailable.code(),
            "ENROLL_STORAGE_UNAVAILABLE"
        );
        assert_eq!(
            StorageErrorCode::DataCorruption.code(),
            "ENROLL_DATA_CORRUPTION"
        );
    }

    #[test]
    fn test_corruption_is_fatal() {
        let err = StorageError::corruption_at_offset(128, "checksum mismatch");
        assert!(err.is_fatal());
        assert_eq!(err.offset(), Some(128));
        assert!(err.to_string().contains("byte_offset: 128"));
    }

    #[test]
    fn test_encode_failure_not_fatal() {
        let err = StorageError::encode_failed("bad body");
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error;
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = StorageError::unavailable("cannot open segment", io_err);
        assert!(err.source().is_some());
        assert!(err.to_string().contains("denied"));
    }
}
