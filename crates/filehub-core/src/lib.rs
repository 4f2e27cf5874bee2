//! Filehub Core Library
//!
//! This crate provides core domain models, error types, configuration,
//! encryption, and driver validation shared across all filehub components.

pub mod config;
pub mod encryption;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use encryption::EncryptionService;
pub use error::{AppError, ErrorMetadata, FieldViolation, LogLevel, ValidationFailures};
pub use storage_types::StorageDriver;
