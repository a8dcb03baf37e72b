//! Key-value store error types
//!
//! Error codes:
//! - COFFER_STORE_INVALID_ARGUMENT: caller precondition violation
//! - COFFER_STORE_IO_FAILED: the database layer failed; the mutation did
//!   not complete
//! - COFFER_STORE_LOCK_POISONED: the write lane was abandoned mid-flight
//!   by a panicking thread

use std::error::Error;
use std::fmt;

/// Store error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorCode {
    /// Empty type, key, or value at the store boundary
    InvalidArgument,
    /// Storage I/O or constraint failure
    IoFailed,
    /// Write lane mutex poisoned
    LockPoisoned,
}

impl StoreErrorCode {
    /// Returns the string code.
    pub fn code(&self) -> &'static str {
        match self {
            StoreErrorCode::InvalidArgument => "COFFER_STORE_INVALID_ARGUMENT",
            StoreErrorCode::IoFailed => "COFFER_STORE_IO_FAILED",
            StoreErrorCode::LockPoisoned => "COFFER_STORE_LOCK_POISONED",
        }
    }
}

impl fmt::Display for StoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Error surfaced by key-value store operations.
///
/// The relation is left at its prior state whenever one of these is
/// returned; no after-image log entry is emitted for a failed mutation.
#[derive(Debug)]
pub struct StoreError {
    code: StoreErrorCode,
    message: String,
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl StoreError {
    /// Caller precondition violation.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self {
            code: StoreErrorCode::InvalidArgument,
            message: message.into(),
            source: None,
        }
    }

    /// Storage layer failure with an underlying cause.
    pub fn io_failed(
        message: impl Into<String>,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code: StoreErrorCode::IoFailed,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Write lane poisoned during the named operation.
    pub fn lock_poisoned(operation: &str) -> Self {
        Self {
            code: StoreErrorCode::LockPoisoned,
            message: format!("write lane poisoned during {operation}"),
            source: None,
        }
    }

    /// Returns the error code.
    pub fn code(&self) -> StoreErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)?;
        if let Some(ref source) = self.source {
            write!(f, ": {source}")?;
        }
        Ok(())
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_deref()
            .map(|source| source as &(dyn Error + 'static))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::io_failed("database operation failed", err)
    }
}

impl From<r2d2::Error> for StoreError {
    fn from(err: r2d2::Error) -> Self {
        Self::io_failed("read pool unavailable", err)
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
