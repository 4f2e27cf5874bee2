//! Connection testing for provider configurations.
//!
//! A test builds a throwaway adapter from the decrypted configuration and
//! performs a write/delete round trip with a uniquely named marker object, so
//! that credentials, bucket reachability, and write permission are all
//! exercised before a configuration is ever persisted or used.

use filehub_core::models::ProviderConfiguration;
use filehub_core::AppError;
use filehub_storage::{build_adapter, StorageAdapter};
use uuid::Uuid;

/// Tests connectivity for a provider configuration.
pub struct ConnectionTester;

impl ConnectionTester {
    /// Run a full write/delete round trip against the configured backend.
    ///
    /// Any failure is reported as a connection error carrying the backend
    /// message. If the marker write succeeded but a later step failed, a
    /// best-effort delete is attempted so the marker is not left behind; the
    /// test still fails.
    pub async fn test(configuration: &ProviderConfiguration) -> Result<(), AppError> {
        let adapter = build_adapter(configuration)
            .await
            .map_err(|e| AppError::Connection(e.to_string()))?;

        tracing::debug!(driver = %configuration.driver(), "Testing provider connection");
        Self::round_trip(adapter.as_ref()).await?;
        tracing::debug!(driver = %configuration.driver(), "Provider connection test passed");
        Ok(())
    }

    async fn round_trip(adapter: &dyn StorageAdapter) -> Result<(), AppError> {
        let marker = format!(".connection-test-{}", Uuid::new_v4());

        let payload: &[u8] = b"connection test";
        adapter
            .write_stream(&marker, Box::pin(payload))
            .await
            .map_err(|e| AppError::Connection(format!("Write check failed: {}", e)))?;

        let exists = match adapter.file_exists(&marker).await {
            Ok(exists) => exists,
            Err(e) => {
                // Marker is on the backend; try not to leave it behind.
                let _ = adapter.delete_file(&marker).await;
                return Err(AppError::Connection(format!("Read check failed: {}", e)));
            }
        };
        if !exists {
            let _ = adapter.delete_file(&marker).await;
            return Err(AppError::Connection(
                "Write check succeeded but the marker object is not visible".to_string(),
            ));
        }

        adapter
            .delete_file(&marker)
            .await
            .map_err(|e| AppError::Connection(format!("Delete check failed: {}", e)))?;

        Ok(())
    }

    /// Verify that the backend is reachable and listable without writing
    /// anything. Suitable for read-only credentials.
    pub async fn test_read_only(configuration: &ProviderConfiguration) -> Result<(), AppError> {
        let adapter = build_adapter(configuration)
            .await
            .map_err(|e| AppError::Connection(e.to_string()))?;

        adapter
            .list("", false)
            .await
            .map_err(|e| AppError::Connection(format!("List check failed: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use filehub_core::StorageDriver;
    use filehub_storage::{
        ByteStream, LocalAdapter, ObjectEntry, ObjectMetadata, StorageError, StorageResult,
        UploadReader,
    };
    use tempfile::tempdir;

    fn local_config(root: &std::path::Path) -> ProviderConfiguration {
        ProviderConfiguration::Local {
            root: root.to_string_lossy().to_string(),
        }
    }

    /// Writes land normally but every existence probe errors, as a backend
    /// with head/stat permission revoked would behave.
    struct HeadlessAdapter {
        inner: LocalAdapter,
    }

    #[async_trait]
    impl filehub_storage::StorageAdapter for HeadlessAdapter {
        async fn list(&self, path: &str, recursive: bool) -> StorageResult<Vec<ObjectEntry>> {
            self.inner.list(path, recursive).await
        }

        async fn write_stream(&self, path: &str, reader: UploadReader) -> StorageResult<u64> {
            self.inner.write_stream(path, reader).await
        }

        async fn read_stream(&self, path: &str) -> StorageResult<ByteStream> {
            self.inner.read_stream(path).await
        }

        async fn file_exists(&self, _path: &str) -> StorageResult<bool> {
            Err(StorageError::BackendError("head not permitted".to_string()))
        }

        async fn dir_exists(&self, path: &str) -> StorageResult<bool> {
            self.inner.dir_exists(path).await
        }

        async fn delete_file(&self, path: &str) -> StorageResult<()> {
            self.inner.delete_file(path).await
        }

        async fn delete_dir(&self, path: &str) -> StorageResult<()> {
            self.inner.delete_dir(path).await
        }

        async fn metadata(&self, path: &str) -> StorageResult<ObjectMetadata> {
            self.inner.metadata(path).await
        }

        fn driver(&self) -> StorageDriver {
            StorageDriver::Local
        }
    }

    #[tokio::test]
    async fn round_trip_passes_and_leaves_no_marker() {
        let dir = tempdir().unwrap();
        let config = local_config(dir.path());

        ConnectionTester::test(&config).await.unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert!(leftovers.is_empty(), "marker object was left behind");
    }

    #[tokio::test]
    async fn unreachable_backend_reports_connection_error() {
        let dir = tempdir().unwrap();
        // A file where the root directory should be makes the adapter build fail.
        let blocker = dir.path().join("not-a-directory");
        std::fs::write(&blocker, b"occupied").unwrap();

        let config = local_config(&blocker);
        let err = ConnectionTester::test(&config).await.unwrap_err();
        assert!(matches!(err, AppError::Connection(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn marker_is_cleaned_up_when_verification_fails() {
        let dir = tempdir().unwrap();
        let adapter = HeadlessAdapter {
            inner: LocalAdapter::new(dir.path()).await.unwrap(),
        };

        let err = ConnectionTester::round_trip(&adapter).await.unwrap_err();
        assert!(matches!(err, AppError::Connection(_)), "got {:?}", err);

        // The marker written before the failing check must not survive.
        let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert!(leftovers.is_empty(), "marker object was left behind");
    }

    #[tokio::test]
    async fn read_only_test_lists_without_writing() {
        let dir = tempdir().unwrap();
        let config = local_config(dir.path());

        ConnectionTester::test_read_only(&config).await.unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert!(leftovers.is_empty());
    }
}
