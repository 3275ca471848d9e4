//! Error types for range-relay
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Two families matter to callers of the pagination engine:
//! [`Error::InvalidArgument`] is raised before any query is sent, and
//! [`Error::Upstream`] wraps whatever the store reported, unchanged.

use thiserror::Error;

/// The main error type for range-relay
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Request Validation Errors
    // ============================================================================
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] InvalidArgument),

    // ============================================================================
    // Store Errors
    // ============================================================================
    #[error("Upstream failure: {0}")]
    Upstream(#[from] StoreError),

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Data Processing Errors
    // ============================================================================
    #[error("Failed to decode item: {message}")]
    Decode { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

/// Pagination arguments rejected before any query is issued
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidArgument {
    #[error("FirstMustNotBeNegative")]
    FirstMustNotBeNegative,

    #[error("LastMustNotBeNegative")]
    LastMustNotBeNegative,
}

/// Failures reported by a range store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Throughput exceeded: {message}")]
    Throttled { message: String },

    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Table not found: {table}")]
    TableNotFound { table: String },

    #[error("Access denied: {message}")]
    AccessDenied { message: String },

    #[error("Database error: {0}")]
    Database(#[from] duckdb::Error),

    #[error("Store backend error: {message}")]
    Backend { message: String },
}

impl StoreError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a table-not-found error
    pub fn table_not_found(table: impl Into<String>) -> Self {
        Self::TableNotFound {
            table: table.into(),
        }
    }

    /// Create a generic backend error
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

impl From<duckdb::Error> for Error {
    fn from(err: duckdb::Error) -> Self {
        Self::Upstream(StoreError::Database(err))
    }
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Check if this error was raised by request validation
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument(_))
    }

    /// Check if this error came from the store
    pub fn is_upstream(&self) -> bool {
        matches!(self, Error::Upstream(_))
    }

    /// Check if this error is retryable
    ///
    /// Nothing in this crate retries; callers that wrap the paginator in
    /// their own retry policy can use this to classify failures.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Upstream(StoreError::Throttled { .. } | StoreError::Backend { .. }) => true,
            _ => false,
        }
    }
}

/// Result type alias for range-relay
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::from(InvalidArgument::FirstMustNotBeNegative);
        assert_eq!(err.to_string(), "Invalid argument: FirstMustNotBeNegative");

        let err = Error::from(StoreError::table_not_found("events"));
        assert_eq!(err.to_string(), "Upstream failure: Table not found: events");
    }

    #[test]
    fn test_error_classification() {
        let err = Error::from(InvalidArgument::LastMustNotBeNegative);
        assert!(err.is_invalid_argument());
        assert!(!err.is_upstream());

        let err = Error::from(StoreError::validation("bad key condition"));
        assert!(err.is_upstream());
        assert!(!err.is_invalid_argument());
    }

    #[test]
    fn test_is_retryable() {
        assert!(Error::from(StoreError::Throttled {
            message: "slow down".to_string()
        })
        .is_retryable());
        assert!(Error::from(StoreError::backend("connection reset")).is_retryable());

        assert!(!Error::from(StoreError::validation("bad")).is_retryable());
        assert!(!Error::from(InvalidArgument::FirstMustNotBeNegative).is_retryable());
        assert!(!Error::config("test").is_retryable());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
