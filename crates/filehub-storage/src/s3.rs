use crate::traits::{
    ByteStream, EntryKind, ObjectEntry, ObjectMetadata, StorageAdapter, StorageError,
    StorageResult, UploadReader,
};
use crate::{multipart, paths};
use async_trait::async_trait;
use filehub_core::models::Visibility;
use filehub_core::StorageDriver;
use futures::StreamExt;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStore, ObjectStoreExt, Result as ObjectResult};

/// S3-compatible storage adapter
///
/// Bound to one provider's bucket and credentials. When the provider
/// configuration carries a key `prefix`, every object path is rooted under
/// it and listing results come back prefix-relative.
#[derive(Clone)]
pub struct S3Adapter {
    store: AmazonS3,
    bucket: String,
    prefix: Option<String>,
}

impl S3Adapter {
    /// Build an adapter from explicit credentials.
    ///
    /// `endpoint` selects an S3-compatible provider (e.g.
    /// "http://localhost:9000" for MinIO, "https://nyc3.digitaloceanspaces.com"
    /// for DigitalOcean Spaces); plain http endpoints are only honored for
    /// explicitly http URLs.
    pub fn new(
        key: String,
        secret: String,
        region: String,
        bucket: String,
        endpoint: Option<String>,
        prefix: Option<String>,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::new()
            .with_access_key_id(key)
            .with_secret_access_key(secret)
            .with_region(region)
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Adapter {
            store,
            bucket,
            prefix,
        })
    }

    /// Resolve a caller path to the full object location.
    fn location(&self, path: &str) -> StorageResult<Path> {
        let normalized = paths::normalize(path)?;
        Ok(Path::from(paths::join_prefix(
            self.prefix.as_deref(),
            &normalized,
        )))
    }

    /// Resolve a caller path to an optional listing prefix (None for an
    /// unprefixed root, which lists the whole bucket).
    fn listing_prefix(&self, path: &str) -> StorageResult<Option<Path>> {
        let normalized = paths::normalize(path)?;
        let full = paths::join_prefix(self.prefix.as_deref(), &normalized);
        if full.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Path::from(full)))
        }
    }

    /// Strip the key prefix off a backend-reported location.
    fn relative(&self, location: &Path) -> String {
        paths::strip_prefix(self.prefix.as_deref(), location.as_ref()).to_string()
    }
}

#[async_trait]
impl StorageAdapter for S3Adapter {
    async fn list(&self, path: &str, recursive: bool) -> StorageResult<Vec<ObjectEntry>> {
        let prefix = self.listing_prefix(path)?;
        let start = std::time::Instant::now();

        let mut entries = Vec::new();

        if recursive {
            let mut stream = self.store.list(prefix.as_ref());
            let mut file_paths = Vec::new();
            while let Some(meta) = stream.next().await {
                let meta = meta.map_err(|e| {
                    tracing::error!(
                        error = %e,
                        bucket = %self.bucket,
                        path = %path,
                        "S3 list failed"
                    );
                    StorageError::ListFailed(e.to_string())
                })?;
                let relative = self.relative(&meta.location);
                file_paths.push(relative.clone());
                entries.push(ObjectEntry {
                    path: relative,
                    kind: EntryKind::File,
                    size: Some(meta.size),
                    last_modified: Some(meta.last_modified),
                });
            }

            // Object stores report no directories; synthesize them from keys.
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
            let result = result.map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    path = %path,
                    "S3 list_with_delimiter failed"
                );
                StorageError::ListFailed(e.to_string())
            })?;

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
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 list successful"
        );

        Ok(entries)
    }

    async fn write_stream(&self, path: &str, reader: UploadReader) -> StorageResult<u64> {
        let location = self.location(path)?;
        let start = std::time::Instant::now();

        // Stream the reader into a multipart upload; memory stays bounded
        // regardless of the source size.
        let upload = self.store.put_multipart(&location).await.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %location,
                "S3 multipart initiation failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        let size = multipart::copy_to_multipart(reader, upload)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %location,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload failed"
                );
                e
            })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %location,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(size)
    }

    async fn read_stream(&self, path: &str) -> StorageResult<ByteStream> {
        let location = self.location(path)?;
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = self.store.get(&location).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(path.to_string()),
            other => StorageError::DownloadFailed(other.to_string()),
        })?;

        let bucket = self.bucket.clone();
        let key = location.to_string();

        let stream = result.into_stream().map(move |res| match res {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                tracing::error!(
                    bucket = %bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 stream download error"
                );
                Err(StorageError::DownloadFailed(e.to_string()))
            }
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
            // The bucket root always exists as a directory.
            return Ok(true);
        }

        let prefix = self.listing_prefix(path)?;
        let result: ObjectResult<_> = self.store.list_with_delimiter(prefix.as_ref()).await;
        let result = result.map_err(|e| StorageError::BackendError(e.to_string()))?;

        Ok(!result.objects.is_empty() || !result.common_prefixes.is_empty())
    }

    async fn delete_file(&self, path: &str) -> StorageResult<()> {
        let location = self.location(path)?;
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = self.store.delete(&location).await;

        result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(path.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %self.bucket,
                    key = %location,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 delete failed"
                );
                StorageError::DeleteFailed(other.to_string())
            }
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %location,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    async fn delete_dir(&self, path: &str) -> StorageResult<()> {
        let prefix = self.listing_prefix(path)?;
        let start = std::time::Instant::now();

        let mut stream = self.store.list(prefix.as_ref());
        let mut locations = Vec::new();
        while let Some(meta) = stream.next().await {
            let meta = meta.map_err(|e| StorageError::ListFailed(e.to_string()))?;
            locations.push(meta.location);
        }
        drop(stream);

        let count = locations.len();
        for location in locations {
            let result: ObjectResult<_> = self.store.delete(&location).await;
            result.map_err(|e| StorageError::DeleteFailed(e.to_string()))?;
        }

        tracing::info!(
            bucket = %self.bucket,
            path = %path,
            object_count = count,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 directory delete successful"
        );

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
            // object_store exposes no ACL surface; objects written through
            // this adapter are private.
            visibility: Visibility::Private,
        })
    }

    fn driver(&self) -> StorageDriver {
        StorageDriver::S3
    }
}
