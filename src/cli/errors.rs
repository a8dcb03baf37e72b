//! CLI-specific error types

use std::fmt;

/// CLI error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// Filesystem I/O error
    IoError,
    /// Config file already present on init
    AlreadyInitialized,
    /// Server failed to start
    BootFailed,
}

impl CliErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "COFFER_CLI_CONFIG_ERROR",
            Self::IoError => "COFFER_CLI_IO_ERROR",
            Self::AlreadyInitialized => "COFFER_CLI_ALREADY_INITIALIZED",
            Self::BootFailed => "COFFER_CLI_BOOT_FAILED",
        }
    }
}

/// CLI error surfaced by `main` as one JSON object on stderr.
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, message)
    }

    pub fn io_error(message: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, message)
    }

    pub fn already_initialized(message: impl Into<String>) -> Self {
        Self::new(CliErrorCode::AlreadyInitialized, message)
    }

    pub fn boot_failed(message: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BootFailed, message)
    }

    /// Returns the string error code.
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
