//! Storage abstraction trait
//!
//! This module defines the StorageAdapter trait that all storage backends
//! must implement, plus the storage-level error type. Backend SDK errors are
//! translated here; they never cross this boundary as their raw types.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use filehub_core::models::Visibility;
use filehub_core::{AppError, StorageDriver};
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Listing failed: {0}")]
    ListFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid object path: {0}")]
    InvalidPath(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A stream of content chunks from a backend read.
pub type ByteStream = Pin<Box<dyn Stream<Item = StorageResult<Bytes>> + Send>>;

/// An async reader feeding an upload.
pub type UploadReader = Pin<Box<dyn AsyncRead + Send + Unpin>>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(path) => AppError::NotFound(path),
            StorageError::InvalidPath(msg) => AppError::validation_field("path", msg),
            StorageError::ConfigError(msg) => AppError::Connection(msg),
            other => AppError::Backend(other.to_string()),
        }
    }
}

/// Classification of a listed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

/// A raw entry as reported by a backend listing, before the facade enriches
/// file entries with mime type and visibility.
#[derive(Debug, Clone)]
pub struct ObjectEntry {
    /// Backend-relative path (prefix already stripped for prefixed backends).
    pub path: String,
    pub kind: EntryKind,
    pub size: Option<u64>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Metadata for a single object.
#[derive(Debug, Clone)]
pub struct ObjectMetadata {
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub visibility: Visibility,
}

/// Storage abstraction trait
///
/// All storage backends (S3-compatible, Google Cloud Storage, local
/// filesystem) implement this trait. One adapter instance is bound to one
/// provider's configuration (bucket, credentials, optional key prefix) for
/// the duration of one request; adapters are rebuilt on provider selection
/// and hold no cross-request state.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// List the entries under `path`. An empty or missing location yields an
    /// empty vec, never an error. Order is whatever the backend returned.
    async fn list(&self, path: &str, recursive: bool) -> StorageResult<Vec<ObjectEntry>>;

    /// Write the reader's content to `path`, consuming it until EOF.
    /// Returns the number of bytes written.
    async fn write_stream(&self, path: &str, reader: UploadReader) -> StorageResult<u64>;

    /// Open a chunked read stream for `path`.
    async fn read_stream(&self, path: &str) -> StorageResult<ByteStream>;

    /// Check whether a file object exists at `path`.
    async fn file_exists(&self, path: &str) -> StorageResult<bool>;

    /// Check whether a directory (or key prefix with descendants) exists.
    async fn dir_exists(&self, path: &str) -> StorageResult<bool>;

    /// Delete the file object at `path`.
    async fn delete_file(&self, path: &str) -> StorageResult<()>;

    /// Recursively delete the directory (or key prefix) at `path`.
    async fn delete_dir(&self, path: &str) -> StorageResult<()>;

    /// Fetch size/mtime/visibility for the object at `path`.
    async fn metadata(&self, path: &str) -> StorageResult<ObjectMetadata>;

    /// The driver this adapter was built for.
    fn driver(&self) -> StorageDriver;
}
