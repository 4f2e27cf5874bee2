use crate::paths;
use crate::traits::{
    ByteStream, EntryKind, ObjectEntry, ObjectMetadata, StorageAdapter, StorageError,
    StorageResult, UploadReader,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use filehub_core::models::Visibility;
use filehub_core::StorageDriver;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Local filesystem storage adapter
///
/// All paths are resolved under a root directory; traversal outside the root
/// is rejected. Directories are real here, unlike the object-store backends.
#[derive(Clone)]
pub struct LocalAdapter {
    root: PathBuf,
}

impl LocalAdapter {
    /// Create a new LocalAdapter rooted at `root`, creating the directory if
    /// it does not exist yet.
    pub async fn new(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();

        fs::create_dir_all(&root).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage root {}: {}",
                root.display(),
                e
            ))
        })?;

        Ok(LocalAdapter { root })
    }

    /// Resolve a caller path to a filesystem path under the root.
    ///
    /// `paths::normalize` already rejects `..` segments and strips leading
    /// slashes, so the join cannot escape the root.
    fn resolve(&self, path: &str) -> StorageResult<(String, PathBuf)> {
        let normalized = paths::normalize(path)?;
        let full = if normalized.is_empty() {
            self.root.clone()
        } else {
            self.root.join(&normalized)
        };
        Ok((normalized, full))
    }

    fn modified_at(meta: &std::fs::Metadata) -> Option<DateTime<Utc>> {
        meta.modified().ok().map(DateTime::<Utc>::from)
    }

    /// Collect entries under `dir`, where `relative` is the listing-root
    /// relative path of `dir` (empty string for the root itself).
    async fn walk(
        &self,
        dir: &Path,
        relative: &str,
        recursive: bool,
        entries: &mut Vec<ObjectEntry>,
    ) -> StorageResult<()> {
        // Iterative walk; recursion in async fns would require boxing.
        let mut pending = vec![(dir.to_path_buf(), relative.to_string())];

        while let Some((current_dir, current_rel)) = pending.pop() {
            let mut read_dir = fs::read_dir(&current_dir).await.map_err(|e| {
                StorageError::ListFailed(format!("Failed to read {}: {}", current_dir.display(), e))
            })?;

            while let Some(dir_entry) = read_dir
                .next_entry()
                .await
                .map_err(|e| StorageError::ListFailed(e.to_string()))?
            {
                let name = dir_entry.file_name().to_string_lossy().into_owned();
                let entry_rel = if current_rel.is_empty() {
                    name
                } else {
                    format!("{}/{}", current_rel, name)
                };

                let meta = dir_entry
                    .metadata()
                    .await
                    .map_err(|e| StorageError::ListFailed(e.to_string()))?;

                if meta.is_dir() {
                    entries.push(ObjectEntry {
                        path: entry_rel.clone(),
                        kind: EntryKind::Dir,
                        size: None,
                        last_modified: Self::modified_at(&meta),
                    });
                    if recursive {
                        pending.push((dir_entry.path(), entry_rel));
                    }
                } else {
                    entries.push(ObjectEntry {
                        path: entry_rel,
                        kind: EntryKind::File,
                        size: Some(meta.len()),
                        last_modified: Self::modified_at(&meta),
                    });
                }
            }
        }

        Ok(())
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for LocalAdapter {
    async fn list(&self, path: &str, recursive: bool) -> StorageResult<Vec<ObjectEntry>> {
        let (normalized, full) = self.resolve(path)?;

        // A missing or empty directory is an empty listing, not an error.
        if !fs::try_exists(&full).await.unwrap_or(false) {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        self.walk(&full, &normalized, recursive, &mut entries).await?;

        tracing::info!(
            root = %self.root.display(),
            path = %path,
            recursive,
            entry_count = entries.len(),
            "Local list successful"
        );

        Ok(entries)
    }

    async fn write_stream(&self, path: &str, mut reader: UploadReader) -> StorageResult<u64> {
        let (_, full) = self.resolve(path)?;
        let start = std::time::Instant::now();

        self.ensure_parent_dir(&full).await?;

        let mut file = fs::File::create(&full).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", full.display(), e))
        })?;

        let bytes_copied = tokio::io::copy(&mut reader, &mut file).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to write stream to file {}: {}",
                full.display(),
                e
            ))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", full.display(), e))
        })?;

        tracing::info!(
            path = %full.display(),
            size_bytes = bytes_copied,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local upload successful"
        );

        Ok(bytes_copied)
    }

    async fn read_stream(&self, path: &str) -> StorageResult<ByteStream> {
        let (_, full) = self.resolve(path)?;

        if !fs::try_exists(&full).await.unwrap_or(false) {
            return Err(StorageError::NotFound(path.to_string()));
        }

        let file = fs::File::open(&full).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to open file {}: {}", full.display(), e))
        })?;

        let reader = tokio_util::io::ReaderStream::new(file);
        let stream = reader.map(|result| {
            result.map_err(|e| StorageError::DownloadFailed(format!("Failed to read chunk: {}", e)))
        });

        Ok(Box::pin(stream))
    }

    async fn file_exists(&self, path: &str) -> StorageResult<bool> {
        let (_, full) = self.resolve(path)?;
        match fs::metadata(&full).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn dir_exists(&self, path: &str) -> StorageResult<bool> {
        let (_, full) = self.resolve(path)?;
        match fs::metadata(&full).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn delete_file(&self, path: &str) -> StorageResult<()> {
        let (_, full) = self.resolve(path)?;

        if !fs::try_exists(&full).await.unwrap_or(false) {
            return Err(StorageError::NotFound(path.to_string()));
        }

        fs::remove_file(&full).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", full.display(), e))
        })?;

        tracing::info!(path = %full.display(), "Local delete successful");

        Ok(())
    }

    async fn delete_dir(&self, path: &str) -> StorageResult<()> {
        let (_, full) = self.resolve(path)?;

        if !fs::try_exists(&full).await.unwrap_or(false) {
            return Err(StorageError::NotFound(path.to_string()));
        }

        fs::remove_dir_all(&full).await.map_err(|e| {
            StorageError::DeleteFailed(format!(
                "Failed to delete directory {}: {}",
                full.display(),
                e
            ))
        })?;

        tracing::info!(path = %full.display(), "Local directory delete successful");

        Ok(())
    }

    async fn metadata(&self, path: &str) -> StorageResult<ObjectMetadata> {
        let (_, full) = self.resolve(path)?;

        let meta = match fs::metadata(&full).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => return Err(StorageError::BackendError(e.to_string())),
        };

        Ok(ObjectMetadata {
            size: meta.len(),
            last_modified: Self::modified_at(&meta),
            visibility: Visibility::Private,
        })
    }

    fn driver(&self) -> StorageDriver {
        StorageDriver::Local
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::pin::Pin;
    use tempfile::tempdir;

    fn reader_for(data: &[u8]) -> UploadReader {
        Box::pin(std::io::Cursor::new(data.to_vec()))
            as Pin<Box<dyn tokio::io::AsyncRead + Send + Unpin>>
    }

    async fn drain(mut stream: ByteStream) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn test_upload_download_round_trip() {
        let dir = tempdir().unwrap();
        let adapter = LocalAdapter::new(dir.path()).await.unwrap();

        let data = b"File content";
        let written = adapter
            .write_stream("folder1/example.txt", reader_for(data))
            .await
            .unwrap();
        assert_eq!(written, 12);

        let downloaded = drain(adapter.read_stream("folder1/example.txt").await.unwrap()).await;
        assert_eq!(downloaded, data);
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let dir = tempdir().unwrap();
        let adapter = LocalAdapter::new(dir.path()).await.unwrap();

        let result = adapter.read_stream("../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidPath(_))));

        let result = adapter.delete_file("a/../../b").await;
        assert!(matches!(result, Err(StorageError::InvalidPath(_))));
    }

    #[tokio::test]
    async fn test_list_classifies_files_and_dirs() {
        let dir = tempdir().unwrap();
        let adapter = LocalAdapter::new(dir.path()).await.unwrap();

        adapter
            .write_stream("folder1/file1.txt", reader_for(b"File content"))
            .await
            .unwrap();
        fs::create_dir_all(dir.path().join("folder2")).await.unwrap();

        let entries = adapter.list("", false).await.unwrap();
        assert_eq!(entries.len(), 2);

        let folder1 = entries.iter().find(|e| e.path == "folder1").unwrap();
        assert_eq!(folder1.kind, EntryKind::Dir);
        let folder2 = entries.iter().find(|e| e.path == "folder2").unwrap();
        assert_eq!(folder2.kind, EntryKind::Dir);

        let entries = adapter.list("", true).await.unwrap();
        let file = entries
            .iter()
            .find(|e| e.path == "folder1/file1.txt")
            .unwrap();
        assert_eq!(file.kind, EntryKind::File);
        assert_eq!(file.size, Some(12));
    }

    #[tokio::test]
    async fn test_list_missing_location_is_empty() {
        let dir = tempdir().unwrap();
        let adapter = LocalAdapter::new(dir.path()).await.unwrap();

        let entries = adapter.list("does/not/exist", false).await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_delete_dir_is_recursive() {
        let dir = tempdir().unwrap();
        let adapter = LocalAdapter::new(dir.path()).await.unwrap();

        adapter
            .write_stream("folder1/sub/deep.txt", reader_for(b"x"))
            .await
            .unwrap();
        adapter
            .write_stream("folder1/top.txt", reader_for(b"y"))
            .await
            .unwrap();

        assert!(adapter.dir_exists("folder1").await.unwrap());
        adapter.delete_dir("folder1").await.unwrap();
        assert!(!adapter.dir_exists("folder1").await.unwrap());
        assert!(!adapter.file_exists("folder1/sub/deep.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_metadata_reports_size() {
        let dir = tempdir().unwrap();
        let adapter = LocalAdapter::new(dir.path()).await.unwrap();

        adapter
            .write_stream("example.txt", reader_for(b"File content"))
            .await
            .unwrap();

        let meta = adapter.metadata("example.txt").await.unwrap();
        assert_eq!(meta.size, 12);
        assert!(meta.last_modified.is_some());
        assert_eq!(meta.visibility, Visibility::Private);

        let missing = adapter.metadata("absent.txt").await;
        assert!(matches!(missing, Err(StorageError::NotFound(_))));
    }
}
