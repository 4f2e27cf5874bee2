//! Storage provider models: the persisted record (configuration encrypted at
//! rest) and the decrypted in-memory form handed to the adapter factory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::storage_types::StorageDriver;

/// A storage provider as persisted: the configuration field holds ciphertext
/// produced by the encryption service, never a plaintext blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRecord {
    pub id: Uuid,
    pub label: String,
    pub name: String,
    pub driver: StorageDriver,
    /// Encrypted configuration (base64 nonce + AES-256-GCM ciphertext).
    pub configuration: String,
    pub owner_id: Uuid,
    pub team_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A storage provider with its configuration decrypted. Exists only
/// transiently in memory while an adapter is being built or a connection
/// tested; it is never persisted in this form.
#[derive(Debug, Clone)]
pub struct StorageProvider {
    pub id: Uuid,
    pub label: String,
    pub name: String,
    pub owner_id: Uuid,
    pub team_id: Option<Uuid>,
    pub configuration: ProviderConfiguration,
}

/// Driver-specific provider configuration, internally tagged on `driver`.
///
/// Stored at rest as ciphertext and decoded through this type on read, so a
/// corrupted or tampered blob fails the typed decode instead of producing an
/// arbitrary object graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "driver", rename_all = "lowercase")]
pub enum ProviderConfiguration {
    S3 {
        key: String,
        secret: String,
        region: String,
        bucket: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        prefix: Option<String>,
        /// Custom endpoint for S3-compatible providers (MinIO, Spaces, R2).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        endpoint: Option<String>,
    },
    Google {
        project_id: String,
        key_file: String,
        bucket: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        prefix: Option<String>,
    },
    Local {
        root: String,
    },
}

impl ProviderConfiguration {
    pub fn driver(&self) -> StorageDriver {
        match self {
            ProviderConfiguration::S3 { .. } => StorageDriver::S3,
            ProviderConfiguration::Google { .. } => StorageDriver::Google,
            ProviderConfiguration::Local { .. } => StorageDriver::Local,
        }
    }

    /// Typed decode from a loose JSON object. Callers are expected to run the
    /// driver registry validation first so that missing fields surface as
    /// field-level violations rather than a serde error.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, AppError> {
        serde_json::from_value(value.clone())
            .map_err(|e| AppError::Internal(format!("Failed to decode provider configuration: {}", e)))
    }

    pub fn to_value(&self) -> Result<serde_json::Value, AppError> {
        serde_json::to_value(self)
            .map_err(|e| AppError::Internal(format!("Failed to encode provider configuration: {}", e)))
    }
}

/// Request DTO for creating a new storage provider.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProviderRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "label must be between 1 and 255 characters"
    ))]
    pub label: String,
    #[validate(length(
        min = 1,
        max = 255,
        message = "name must be between 1 and 255 characters"
    ))]
    pub name: String,
    /// Loose driver configuration; validated against the driver registry and
    /// then decoded into [`ProviderConfiguration`].
    pub configuration: serde_json::Value,
}

/// Request DTO for updating a storage provider. All fields optional; the
/// configuration patch is merged over the decrypted existing configuration
/// and the merged result is re-validated before persisting.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProviderRequest {
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 255,
        message = "label must be between 1 and 255 characters"
    ))]
    pub label: Option<String>,
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 255,
        message = "name must be between 1 and 255 characters"
    ))]
    pub name: Option<String>,
    #[serde(default)]
    pub configuration: Option<serde_json::Value>,
}

/// Authenticated caller context supplied by the (external) auth layer.
#[derive(Debug, Clone, Copy)]
pub struct OwnerContext {
    pub user_id: Uuid,
    pub team_id: Option<Uuid>,
}

/// Scope for listing providers: a user's own providers or a team's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerScope {
    User(Uuid),
    Team(Uuid),
}
