use crate::traits::{
    ByteStream, EntryKind, ObjectEntry, ObjectMetadata, StorageAdapter, StorageError,
    StorageResult, UploadReader,
};
use crate::{multipart, paths};
use async_trait::async_trait;
use filehub_core::models::Visibility;
use filehub_core::StorageDriver;
use futures::StreamExt;
use object_store::gcp::{GoogleCloudStorage, GoogleCloudStorageBuilder};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStore, ObjectStoreExt, Result as ObjectResult};

/// Google Cloud Storage adapter, bound to one bucket via a service account
/// key file. Optional key prefix semantics match [`crate::s3::S3Adapter`].
#[derive(Clone)]
pub struct GcsAdapter {
    store: GoogleCloudStorage,
    bucket: String,
    prefix: Option<String>,
}

impl GcsAdapter {
    /// Build an adapter from a service account key file path and bucket.
    /// The project id lives inside the key file; it is not needed here.
    pub fn new(key_file: String, bucket: String, prefix: Option<String>) -> StorageResult<Self> {
        let store = GoogleCloudStorageBuilder::new()
            .with_bucket_name(bucket.clone())
            .with_service_account_path(key_file)
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(GcsAdapter {
            store,
            bucket,
            prefix,
        })
    }

    fn location(&self, path: &str) -> StorageResult<Path> {
        let normalized = paths::normalize(path)?;
        Ok(Path::from(paths::join_prefix(
            self.prefix.as_deref(),
            &normalized,
        )))
    }

    fn listing_prefix(&self, path: &str) -> StorageResult<Option<Path>> {
        let normalized = paths::normalize(path)?;
        let full = paths::join_prefix(self.prefix.as_deref(), &normalized);
        if full.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Path::from(full)))
        }
    }

    fn relative(&self, location: &Path) -> String {
        paths::strip_prefix(self.prefix.as_deref(), location.as_ref()).to_string()
    }
}

#[async_trait]
impl StorageAdapter for GcsAdapter {
    async fn list(&self, path: &str, recursive: bool) -> StorageResult<Vec<ObjectEntry>> {
        let prefix = self.listing_prefix(path)?;
        let mut entries = Vec::new();

        if recursive {
            let mut stream = self.store.list(prefix.as_ref());
            let mut file_paths = Vec::new();
            while let Some(meta) = stream.next().await {
                let meta = meta.map_err(|e| StorageError::ListFailed(e.to_string()))?;
                let relative = self.relative(&meta.location);
                file_paths.push(relative.clone());
                entries.push(ObjectEntry {
                    path: relative,
                    kind: EntryKind::File,
                    size: Some(meta.size),
                    last_modified: Some(meta.last_modified),
                });
            }

            let root = paths::normalize(path)?;
            for dir in paths::implied_dirs(&root, &file_paths) {
                entries.push(ObjectEntry {
                    path: dir,
                    kind: EntryKind::Dir,
                    size: None,
                    last_modified: None,
                });
            }
        } else {
            let result: ObjectResult<_> = self.store.list_with_delimiter(prefix.as_ref()).await;
            let result = result.map_err(|e| StorageError::ListFailed(e.to_string()))?;

            for common_prefix in result.common_prefixes {
                entries.push(ObjectEntry {
                    path: self.relative(&common_prefix),
                    kind: EntryKind::Dir,
                    size: None,
                    last_modified: None,
                });
            }
            for meta in result.objects {
                entries.push(ObjectEntry {
                    path: self.relative(&meta.location),
                    kind: EntryKind::File,
                    size: Some(meta.size),
                    last_modified: Some(meta.last_modified),
                });
            }
        }

        tracing::info!(
            bucket = %self.bucket,
            path = %path,
            recursive,
            entry_count = entries.len(),
            "GCS list successful"
        );

        Ok(entries)
    }

    async fn write_stream(&self, path: &str, reader: UploadReader) -> StorageResult<u64> {
        let location = self.location(path)?;

        let upload = self
            .store
            .put_multipart(&location)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        let size = multipart::copy_to_multipart(reader, upload)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %location,
                    "GCS upload failed"
                );
                e
            })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %location,
            size_bytes = size,
            "GCS upload successful"
        );

        Ok(size)
    }

    async fn read_stream(&self, path: &str) -> StorageResult<ByteStream> {
        let location = self.location(path)?;

        let result: ObjectResult<_> = self.store.get(&location).await;
        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(path.to_string()),
            other => StorageError::DownloadFailed(other.to_string()),
        })?;

        let stream = result.into_stream().map(|res| {
            res.map_err(|e| StorageError::DownloadFailed(e.to_string()))
        });

        Ok(Box::pin(stream))
    }

    async fn file_exists(&self, path: &str) -> StorageResult<bool> {
        let location = self.location(path)?;
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn dir_exists(&self, path: &str) -> StorageResult<bool> {
        let normalized = paths::normalize(path)?;
        if normalized.is_empty() {
            return Ok(true);
        }

        let prefix = self.listing_prefix(path)?;
        let result: ObjectResult<_> = self.store.list_with_delimiter(prefix.as_ref()).await;
        let result = result.map_err(|e| StorageError::BackendError(e.to_string()))?;

        Ok(!result.objects.is_empty() || !result.common_prefixes.is_empty())
    }

    async fn delete_file(&self, path: &str) -> StorageResult<()> {
        let location = self.location(path)?;

        let result: ObjectResult<_> = self.store.delete(&location).await;
        result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(path.to_string()),
            other => StorageError::DeleteFailed(other.to_string()),
        })?;

        tracing::info!(bucket = %self.bucket, key = %location, "GCS delete successful");

        Ok(())
    }

    async fn delete_dir(&self, path: &str) -> StorageResult<()> {
        let prefix = self.listing_prefix(path)?;

        let mut stream = self.store.list(prefix.as_ref());
        let mut locations = Vec::new();
        while let Some(meta) = stream.next().await {
            let meta = meta.map_err(|e| StorageError::ListFailed(e.to_string()))?;
            locations.push(meta.location);
        }
        drop(stream);

        for location in locations {
            let result: ObjectResult<_> = self.store.delete(&location).await;
            result.map_err(|e| StorageError::DeleteFailed(e.to_string()))?;
        }

        Ok(())
    }

    async fn metadata(&self, path: &str) -> StorageResult<ObjectMetadata> {
        let location = self.location(path)?;

        let meta = self.store.head(&location).await.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(path.to_string()),
            other => StorageError::BackendError(other.to_string()),
        })?;

        Ok(ObjectMetadata {
            size: meta.size,
            last_modified: Some(meta.last_modified),
            visibility: Visibility::Private,
        })
    }

    fn driver(&self) -> StorageDriver {
        StorageDriver::Google
    }
}
