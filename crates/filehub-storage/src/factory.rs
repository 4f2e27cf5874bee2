#[cfg(feature = "storage-google")]
use crate::GcsAdapter;
#[cfg(feature = "storage-local")]
use crate::LocalAdapter;
#[cfg(feature = "storage-s3")]
use crate::S3Adapter;
use crate::{StorageAdapter, StorageError, StorageResult};
use filehub_core::models::ProviderConfiguration;
use std::sync::Arc;

/// Build a storage adapter bound to a provider's decrypted configuration.
///
/// Client construction failures (malformed region, unreadable key file) come
/// back as `ConfigError`; the underlying SDK error type never leaks out. A
/// driver compiled out of this build is a `ConfigError` too — an unknown
/// driver string never reaches this function, the validation registry
/// rejects it earlier.
pub async fn build_adapter(
    configuration: &ProviderConfiguration,
) -> StorageResult<Arc<dyn StorageAdapter>> {
    match configuration {
        #[cfg(feature = "storage-s3")]
        ProviderConfiguration::S3 {
            key,
            secret,
            region,
            bucket,
            prefix,
            endpoint,
        } => {
            let adapter = S3Adapter::new(
                key.clone(),
                secret.clone(),
                region.clone(),
                bucket.clone(),
                endpoint.clone(),
                prefix.clone(),
            )?;
            Ok(Arc::new(adapter))
        }

        #[cfg(not(feature = "storage-s3"))]
        ProviderConfiguration::S3 { .. } => Err(StorageError::ConfigError(
            "S3 backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-google")]
        ProviderConfiguration::Google {
            key_file,
            bucket,
            prefix,
            ..
        } => {
            let adapter = GcsAdapter::new(key_file.clone(), bucket.clone(), prefix.clone())?;
            Ok(Arc::new(adapter))
        }

        #[cfg(not(feature = "storage-google"))]
        ProviderConfiguration::Google { .. } => Err(StorageError::ConfigError(
            "Google Cloud Storage backend not available (storage-google feature not enabled)"
                .to_string(),
        )),

        #[cfg(feature = "storage-local")]
        ProviderConfiguration::Local { root } => {
            let adapter = LocalAdapter::new(root.clone()).await?;
            Ok(Arc::new(adapter))
        }

        #[cfg(not(feature = "storage-local"))]
        ProviderConfiguration::Local { .. } => Err(StorageError::ConfigError(
            "Local backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}
