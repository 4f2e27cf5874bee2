//! File manager facade.
//!
//! One facade instance is bound to at most one storage provider at a time.
//! All file operations go through the provider's adapter; callers never talk
//! to a backend directly. Operations invoked before a provider is selected
//! fail with [`AppError::NoProviderSelected`].

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use filehub_core::models::{
    FileEntry, FileMetadata, FolderEntry, Listing, StorageProvider, UploadResult, Visibility,
};
use filehub_core::AppError;
use filehub_storage::{build_adapter, ByteStream, EntryKind, StorageAdapter, UploadReader};

/// Best-effort mime type from the file extension; "unknown" when it cannot
/// be derived.
fn mime_type_for(path: &str) -> String {
    match mime_guess::from_path(path).first() {
        Some(mime) => mime.to_string(),
        None => "unknown".to_string(),
    }
}

/// Content for an upload: the original filename and the reader the adapter
/// will drain. The size is whatever the backend counts while draining; no
/// size is declared up front.
pub struct UploadSource {
    pub original_filename: String,
    pub reader: UploadReader,
}

impl UploadSource {
    pub fn from_reader(original_filename: impl Into<String>, reader: UploadReader) -> Self {
        Self {
            original_filename: original_filename.into(),
            reader,
        }
    }

    pub fn from_bytes(original_filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            original_filename: original_filename.into(),
            reader: Box::pin(std::io::Cursor::new(bytes)),
        }
    }

    /// Open a local file as an upload source; the filename is taken from the
    /// final path component.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let original_filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| AppError::validation_field("file", "Path has no filename component"))?;

        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| AppError::validation_field("file", format!("Cannot open file: {}", e)))?;

        Ok(Self {
            original_filename,
            reader: Box::pin(file),
        })
    }
}

/// Per-upload options.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    /// Store the object under this filename instead of the source's original.
    pub filename: Option<String>,
    /// Requested visibility; recorded in the result. Backends without an ACL
    /// surface store everything private.
    pub visibility: Visibility,
}

/// An open download: a chunked content stream plus the metadata a caller
/// needs to serve it.
pub struct Download {
    pub stream: ByteStream,
    pub mime_type: String,
    pub size: u64,
}

impl std::fmt::Debug for Download {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Download")
            .field("mime_type", &self.mime_type)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Facade over the currently selected provider's storage adapter.
pub struct FileManager {
    provider: Option<StorageProvider>,
    adapter: Option<Arc<dyn StorageAdapter>>,
}

impl FileManager {
    /// An unbound manager; every operation fails until a provider is set.
    pub fn new() -> Self {
        Self {
            provider: None,
            adapter: None,
        }
    }

    /// A manager bound to `provider` from the start.
    pub async fn for_provider(provider: StorageProvider) -> Result<Self, AppError> {
        let mut manager = Self::new();
        manager.set_provider(provider).await?;
        Ok(manager)
    }

    /// Bind the manager to a provider, building its adapter. On failure the
    /// previous binding is kept untouched.
    pub async fn set_provider(&mut self, provider: StorageProvider) -> Result<(), AppError> {
        let adapter = build_adapter(&provider.configuration).await?;
        tracing::info!(
            provider = %provider.name,
            driver = %provider.configuration.driver(),
            "Selected storage provider"
        );
        self.provider = Some(provider);
        self.adapter = Some(adapter);
        Ok(())
    }

    /// The currently selected provider, if any.
    pub fn current_provider(&self) -> Option<&StorageProvider> {
        self.provider.as_ref()
    }

    fn adapter(&self) -> Result<&Arc<dyn StorageAdapter>, AppError> {
        self.adapter.as_ref().ok_or(AppError::NoProviderSelected)
    }

    /// List `path`, partitioning entries into files and folders. A missing or
    /// empty location is an empty listing, not an error.
    pub async fn list_contents(&self, path: &str, recursive: bool) -> Result<Listing, AppError> {
        let adapter = self.adapter()?;
        let entries = adapter.list(path, recursive).await?;

        let mut files = Vec::new();
        let mut folders = Vec::new();
        for entry in entries {
            match entry.kind {
                EntryKind::File => files.push(FileEntry {
                    mime_type: mime_type_for(&entry.path),
                    size: entry.size.unwrap_or(0),
                    last_modified: entry.last_modified,
                    visibility: Visibility::default(),
                    path: entry.path,
                }),
                EntryKind::Dir => folders.push(FolderEntry { path: entry.path }),
            }
        }

        Ok(Listing {
            files,
            folders,
            path: path.trim_matches('/').to_string(),
        })
    }

    /// Upload `source` into `dest_path`, storing it under the original
    /// filename unless the options override it. Returns where the object
    /// landed and how many bytes the backend accepted.
    pub async fn upload_file(
        &self,
        source: UploadSource,
        dest_path: &str,
        options: UploadOptions,
    ) -> Result<UploadResult, AppError> {
        let adapter = self.adapter()?;

        let filename = options
            .filename
            .unwrap_or_else(|| source.original_filename.clone());
        if filename.is_empty() {
            return Err(AppError::validation_field("file", "Filename must not be empty"));
        }
        if filename.contains('/') {
            return Err(AppError::validation_field(
                "file",
                "Filename must not contain path separators",
            ));
        }

        let dest = dest_path.trim_matches('/');
        let full_path = if dest.is_empty() {
            filename
        } else {
            format!("{}/{}", dest, filename)
        };

        let size = adapter.write_stream(&full_path, source.reader).await?;
        tracing::info!(path = %full_path, size_bytes = size, "Uploaded file");

        Ok(UploadResult {
            path: full_path,
            size,
            original_filename: source.original_filename,
            uploaded_at: Utc::now(),
            visibility: options.visibility,
        })
    }

    /// Open a download stream for `path`. Existence is checked before the
    /// stream is opened so a missing object is a clean not-found.
    pub async fn download_file(&self, path: &str) -> Result<Download, AppError> {
        let adapter = self.adapter()?;

        if !adapter.file_exists(path).await? {
            return Err(AppError::NotFound(path.to_string()));
        }

        let metadata = adapter.metadata(path).await?;
        let stream = adapter.read_stream(path).await?;
        Ok(Download {
            stream,
            mime_type: mime_type_for(path),
            size: metadata.size,
        })
    }

    /// Delete `path`: a file object if one exists there, otherwise a folder
    /// with everything under it. Deleting a path that is neither fails with
    /// not-found.
    pub async fn delete(&self, path: &str) -> Result<(), AppError> {
        let adapter = self.adapter()?;

        if adapter.file_exists(path).await? {
            adapter.delete_file(path).await?;
            tracing::info!(path = %path, "Deleted file");
            return Ok(());
        }
        if adapter.dir_exists(path).await? {
            adapter.delete_dir(path).await?;
            tracing::info!(path = %path, "Deleted folder");
            return Ok(());
        }
        Err(AppError::NotFound(path.to_string()))
    }

    /// Size, mtime, mime type and visibility for a single file object.
    pub async fn get_metadata(&self, path: &str) -> Result<FileMetadata, AppError> {
        let adapter = self.adapter()?;
        let metadata = adapter.metadata(path).await?;
        Ok(FileMetadata {
            mime_type: mime_type_for(path),
            size: metadata.size,
            last_modified: metadata.last_modified,
            visibility: metadata.visibility,
        })
    }
}

impl Default for FileManager {
    fn default() -> Self {
        Self::new()
    }
}
