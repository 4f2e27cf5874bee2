//! Transient listing and upload result shapes.
//!
//! None of these are persisted: they are recomputed on every listing or
//! upload call, and the backend object remains the source of truth.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Object visibility as reported by (or requested of) the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    #[default]
    Private,
}

/// A file entry produced by a listing call.
#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    /// Backend-relative path.
    pub path: String,
    pub size: u64,
    /// Best-effort mime type; falls back to `"unknown"` when it cannot be
    /// derived from the file extension.
    pub mime_type: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub visibility: Visibility,
}

/// A folder entry produced by a listing call.
#[derive(Debug, Clone, Serialize)]
pub struct FolderEntry {
    pub path: String,
}

/// Result of listing a location: entries partitioned into files and folders,
/// in backend order. An empty location yields empty sequences, not an error.
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    pub files: Vec<FileEntry>,
    pub folders: Vec<FolderEntry>,
    pub path: String,
}

/// Result of a single upload call.
#[derive(Debug, Clone, Serialize)]
pub struct UploadResult {
    pub path: String,
    pub size: u64,
    pub original_filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub visibility: Visibility,
}

/// Metadata for a single object.
#[derive(Debug, Clone, Serialize)]
pub struct FileMetadata {
    pub mime_type: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub visibility: Visibility,
}
