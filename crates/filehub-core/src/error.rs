//! Error types module
//!
//! This module provides the core error types used throughout the filehub
//! application. All errors are unified under the `AppError` enum which can
//! represent database, validation, storage-backend, and provider errors.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx`
//! feature so the core builds without a database driver.

use std::fmt;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like unreachable backends
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// A single field-level validation violation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Collected validation violations. Every missing or invalid field is
/// reported, not just the first one found.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ValidationFailures {
    pub violations: Vec<FieldViolation>,
}

impl ValidationFailures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.violations.push(FieldViolation::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// True if any violation names the given field.
    pub fn names_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    /// Convert to a result: `Ok(())` when no violations were collected.
    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for v in &self.violations {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", v.field, v.message)?;
            first = false;
        }
        Ok(())
    }
}

/// Metadata for error responses - defines how an error should be presented.
/// This trait allows errors to self-describe their HTTP response
/// characteristics without the core depending on any HTTP framework.
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "UNSUPPORTED_DRIVER")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation failed: {0}")]
    Validation(ValidationFailures),

    #[error("Unsupported storage driver: {0}")]
    UnsupportedDriver(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("No storage provider selected")]
    NoProviderSelected,

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for a single-field validation failure.
    pub fn validation_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut failures = ValidationFailures::new();
        failures.add(field, message);
        AppError::Validation(failures)
    }
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::validation_field("id", format!("invalid UUID: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut failures = ValidationFailures::new();
        for (field, errors) in err.field_errors() {
            for e in errors {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("invalid value for {}", field));
                failures.add(field.to_string(), message);
            }
        }
        AppError::Validation(failures)
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable,
/// sensitive, log_level). Reduces duplication in the ErrorMetadata impl;
/// client_message stays per-variant for dynamic content.
fn app_error_static_metadata(err: &AppError) -> (u16, &'static str, bool, bool, LogLevel) {
    match err {
        AppError::Database(_) => (500, "DATABASE_ERROR", true, true, LogLevel::Error),
        AppError::Validation(_) => (422, "VALIDATION_ERROR", false, false, LogLevel::Debug),
        AppError::UnsupportedDriver(_) => {
            (422, "UNSUPPORTED_DRIVER", false, false, LogLevel::Debug)
        }
        AppError::NotFound(_) => (404, "NOT_FOUND", false, false, LogLevel::Debug),
        AppError::Connection(_) => (502, "CONNECTION_ERROR", true, false, LogLevel::Warn),
        AppError::Backend(_) => (500, "STORAGE_ERROR", true, true, LogLevel::Error),
        AppError::Unauthorized(_) => (401, "UNAUTHORIZED", false, false, LogLevel::Debug),
        AppError::NoProviderSelected => {
            (409, "NO_PROVIDER_SELECTED", false, false, LogLevel::Debug)
        }
        AppError::Encryption(_) => (500, "ENCRYPTION_ERROR", false, true, LogLevel::Error),
        AppError::Internal(_) => (500, "INTERNAL_ERROR", false, true, LogLevel::Error),
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn client_message(&self) -> String {
        if self.is_sensitive() {
            match self {
                AppError::Database(_) => "A database error occurred".to_string(),
                AppError::Backend(_) => "A storage backend error occurred".to_string(),
                AppError::Encryption(_) => "An internal error occurred".to_string(),
                _ => "An internal error occurred".to_string(),
            }
        } else {
            self.to_string()
        }
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).3
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_failures_report_every_field() {
        let mut failures = ValidationFailures::new();
        failures.add("key", "is required");
        failures.add("secret", "is required");

        assert!(failures.names_field("key"));
        assert!(failures.names_field("secret"));
        assert!(!failures.names_field("region"));

        let err = failures.into_result().unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert_eq!(err.http_status_code(), 422);
    }

    #[test]
    fn empty_failures_are_ok() {
        assert!(ValidationFailures::new().into_result().is_ok());
    }

    #[test]
    fn sensitive_errors_hide_details() {
        let err = AppError::Backend("bucket exploded at s3://secret-bucket".to_string());
        assert!(err.is_sensitive());
        assert!(!err.client_message().contains("secret-bucket"));

        let err = AppError::NotFound("folder1/example.txt".to_string());
        assert!(!err.is_sensitive());
        assert!(err.client_message().contains("folder1/example.txt"));
    }

    #[test]
    fn unsupported_driver_is_not_validation() {
        let err = AppError::UnsupportedDriver("ftp".to_string());
        assert_eq!(err.error_code(), "UNSUPPORTED_DRIVER");
        assert!(!matches!(err, AppError::Validation(_)));
    }
}
