//! Storage provider service.
//!
//! Orchestrates the provider lifecycle: registry validation, a live
//! connection test, encryption, and persistence. A configuration is only
//! ever written to the database after it has passed full validation and a
//! successful connection test, and only as ciphertext.

use std::sync::Arc;

use filehub_core::models::{
    CreateProviderRequest, OwnerContext, OwnerScope, ProviderConfiguration, ProviderRecord,
    StorageProvider, UpdateProviderRequest,
};
use filehub_core::validation::validate_configuration;
use filehub_core::{AppError, EncryptionService};
use filehub_db::{NewProvider, ProviderChanges, ProviderRepository};
use uuid::Uuid;
use validator::Validate;

use crate::connection::ConnectionTester;

/// Shallow-merge a configuration patch over the current configuration:
/// patch keys replace current keys, everything else is preserved.
fn merge_configuration(
    current: serde_json::Value,
    patch: &serde_json::Value,
) -> Result<serde_json::Value, AppError> {
    let Some(patch_object) = patch.as_object() else {
        return Err(AppError::validation_field(
            "configuration",
            "Configuration must be a JSON object",
        ));
    };

    let mut merged = current;
    let target = merged
        .as_object_mut()
        .ok_or_else(|| AppError::Internal("Stored configuration is not an object".to_string()))?;
    for (key, value) in patch_object {
        target.insert(key.clone(), value.clone());
    }
    Ok(merged)
}

/// Service for managing storage provider records.
pub struct ProviderService {
    repository: Arc<dyn ProviderRepository>,
    encryption: EncryptionService,
}

impl ProviderService {
    pub fn new(repository: Arc<dyn ProviderRepository>, encryption: EncryptionService) -> Self {
        Self {
            repository,
            encryption,
        }
    }

    /// Create a provider: validate the configuration against the driver
    /// registry, test the connection, then encrypt and persist.
    #[tracing::instrument(skip(self, request), fields(provider.name = %request.name))]
    pub async fn create(
        &self,
        owner: &OwnerContext,
        request: CreateProviderRequest,
    ) -> Result<ProviderRecord, AppError> {
        request.validate()?;
        let driver = validate_configuration(&request.configuration)?;

        if self.repository.find_by_name(&request.name).await?.is_some() {
            return Err(AppError::validation_field("name", "Name is already in use"));
        }

        let configuration = ProviderConfiguration::from_value(&request.configuration)?;
        ConnectionTester::test(&configuration).await?;

        let ciphertext = self.encryption.encrypt_configuration(&configuration)?;
        let record = self
            .repository
            .insert(NewProvider {
                label: request.label,
                name: request.name,
                driver,
                configuration: ciphertext,
                owner_id: owner.user_id,
                team_id: owner.team_id,
            })
            .await?;

        tracing::info!(provider.id = %record.id, driver = %driver, "Created storage provider");
        Ok(record)
    }

    /// Update a provider. A configuration patch is merged over the decrypted
    /// current configuration; the merged result goes through the same
    /// validation and connection test as a create before anything is
    /// persisted.
    #[tracing::instrument(skip(self, request), fields(provider.id = %id))]
    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateProviderRequest,
    ) -> Result<ProviderRecord, AppError> {
        request.validate()?;

        let existing = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("storage provider {}", id)))?;

        if let Some(name) = &request.name {
            if name != &existing.name {
                if self.repository.find_by_name(name).await?.is_some() {
                    return Err(AppError::validation_field("name", "Name is already in use"));
                }
            }
        }

        let current = self.encryption.decrypt_configuration(&existing.configuration)?;

        let (driver, configuration) = match &request.configuration {
            Some(patch) => {
                let merged = merge_configuration(current.to_value()?, patch)?;
                let driver = validate_configuration(&merged)?;
                let configuration = ProviderConfiguration::from_value(&merged)?;
                ConnectionTester::test(&configuration).await?;
                (driver, configuration)
            }
            None => (current.driver(), current),
        };

        let ciphertext = self.encryption.encrypt_configuration(&configuration)?;
        let record = self
            .repository
            .update(
                id,
                ProviderChanges {
                    label: request.label.unwrap_or(existing.label),
                    name: request.name.unwrap_or(existing.name),
                    driver,
                    configuration: ciphertext,
                },
            )
            .await?;

        tracing::info!(driver = %driver, "Updated storage provider");
        Ok(record)
    }

    pub async fn get(&self, id: Uuid) -> Result<ProviderRecord, AppError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("storage provider {}", id)))
    }

    pub async fn list(&self, scope: OwnerScope) -> Result<Vec<ProviderRecord>, AppError> {
        self.repository.list_for_owner(scope).await
    }

    /// Soft-delete a provider; the row is tombstoned, not removed.
    #[tracing::instrument(skip(self), fields(provider.id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.repository.soft_delete(id).await? {
            return Err(AppError::NotFound(format!("storage provider {}", id)));
        }
        tracing::info!("Deleted storage provider");
        Ok(())
    }

    /// Run a connection test against a saved provider's configuration.
    pub async fn test(&self, id: Uuid) -> Result<(), AppError> {
        let record = self.get(id).await?;
        let configuration = self.encryption.decrypt_configuration(&record.configuration)?;
        ConnectionTester::test(&configuration).await
    }

    /// Decrypt a record into the in-memory form the adapter factory takes.
    pub fn decrypt_provider(&self, record: &ProviderRecord) -> Result<StorageProvider, AppError> {
        let configuration = self.encryption.decrypt_configuration(&record.configuration)?;
        Ok(StorageProvider {
            id: record.id,
            label: record.label.clone(),
            name: record.name.clone(),
            owner_id: record.owner_id,
            team_id: record.team_id,
            configuration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MockProviderRepository;
    use filehub_core::StorageDriver;
    use serde_json::json;
    use tempfile::tempdir;

    fn service() -> (ProviderService, Arc<MockProviderRepository>) {
        let repository = Arc::new(MockProviderRepository::new());
        let encryption = EncryptionService::from_key_bytes(&[7u8; 32]).unwrap();
        (
            ProviderService::new(repository.clone(), encryption),
            repository,
        )
    }

    fn owner() -> OwnerContext {
        OwnerContext {
            user_id: Uuid::new_v4(),
            team_id: None,
        }
    }

    fn local_request(name: &str, root: &std::path::Path) -> CreateProviderRequest {
        CreateProviderRequest {
            label: format!("{} label", name),
            name: name.to_string(),
            configuration: json!({
                "driver": "local",
                "root": root.to_string_lossy(),
            }),
        }
    }

    #[tokio::test]
    async fn create_persists_ciphertext_with_owner() {
        let dir = tempdir().unwrap();
        let (service, _) = service();
        let owner = owner();

        let record = service.create(&owner, local_request("disk-a", dir.path())).await.unwrap();

        assert_eq!(record.name, "disk-a");
        assert_eq!(record.driver, StorageDriver::Local);
        assert_eq!(record.owner_id, owner.user_id);
        // Stored as ciphertext, not as the JSON we sent in.
        assert!(!record.configuration.contains("root"));
        assert!(!record.configuration.contains(&*dir.path().to_string_lossy()));

        let provider = service.decrypt_provider(&record).unwrap();
        match provider.configuration {
            ProviderConfiguration::Local { root } => {
                assert_eq!(root, dir.path().to_string_lossy());
            }
            other => panic!("expected local configuration, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn create_reports_every_missing_field() {
        let (service, _) = service();

        let request = CreateProviderRequest {
            label: "Broken".to_string(),
            name: "broken".to_string(),
            configuration: json!({ "driver": "s3", "bucket": "b" }),
        };
        let err = service.create(&owner(), request).await.unwrap_err();

        match err {
            AppError::Validation(failures) => {
                assert!(failures.names_field("key"));
                assert!(failures.names_field("secret"));
                assert!(failures.names_field("region"));
                assert!(!failures.names_field("bucket"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn create_with_unknown_driver_is_unsupported() {
        let (service, _) = service();

        let request = CreateProviderRequest {
            label: "Mystery".to_string(),
            name: "mystery".to_string(),
            configuration: json!({ "driver": "dropbox", "token": "t" }),
        };
        let err = service.create(&owner(), request).await.unwrap_err();
        assert!(matches!(err, AppError::UnsupportedDriver(driver) if driver == "dropbox"));
    }

    #[tokio::test]
    async fn create_rejects_duplicate_name() {
        let dir = tempdir().unwrap();
        let (service, _) = service();
        let owner = owner();

        service.create(&owner, local_request("dup", dir.path())).await.unwrap();
        let err = service
            .create(&owner, local_request("dup", dir.path()))
            .await
            .unwrap_err();

        match err {
            AppError::Validation(failures) => assert!(failures.names_field("name")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn create_rejects_unreachable_backend_before_persisting() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"occupied").unwrap();
        let (service, repository) = service();

        let err = service
            .create(&owner(), local_request("unreachable", &blocker))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Connection(_)));
        assert!(repository.find_by_name("unreachable").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_merges_configuration_patch() {
        let dir = tempdir().unwrap();
        let other = tempdir().unwrap();
        let (service, _) = service();

        let record = service.create(&owner(), local_request("movable", dir.path())).await.unwrap();

        let updated = service
            .update(
                record.id,
                UpdateProviderRequest {
                    configuration: Some(json!({ "root": other.path().to_string_lossy() })),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let provider = service.decrypt_provider(&updated).unwrap();
        match provider.configuration {
            ProviderConfiguration::Local { root } => {
                assert_eq!(root, other.path().to_string_lossy());
            }
            other => panic!("expected local configuration, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn update_revalidates_merged_configuration() {
        let dir = tempdir().unwrap();
        let (service, _) = service();

        let record = service.create(&owner(), local_request("guarded", dir.path())).await.unwrap();

        let err = service
            .update(
                record.id,
                UpdateProviderRequest {
                    configuration: Some(json!({ "root": "" })),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        match err {
            AppError::Validation(failures) => assert!(failures.names_field("root")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn update_without_configuration_keeps_it() {
        let dir = tempdir().unwrap();
        let (service, _) = service();

        let record = service.create(&owner(), local_request("renamed", dir.path())).await.unwrap();
        let updated = service
            .update(
                record.id,
                UpdateProviderRequest {
                    label: Some("New label".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.label, "New label");
        assert_eq!(updated.name, "renamed");
        let provider = service.decrypt_provider(&updated).unwrap();
        assert!(matches!(provider.configuration, ProviderConfiguration::Local { .. }));
    }

    #[tokio::test]
    async fn update_missing_provider_is_not_found() {
        let (service, _) = service();
        let err = service
            .update(Uuid::new_v4(), UpdateProviderRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_hides_record_and_frees_name() {
        let dir = tempdir().unwrap();
        let (service, _) = service();
        let owner = owner();

        let record = service.create(&owner, local_request("ephemeral", dir.path())).await.unwrap();
        service.delete(record.id).await.unwrap();

        let err = service.get(record.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = service.delete(record.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        // Name is reusable once the old record is tombstoned.
        service.create(&owner, local_request("ephemeral", dir.path())).await.unwrap();
    }

    #[tokio::test]
    async fn list_is_scoped_to_owner() {
        let dir = tempdir().unwrap();
        let (service, _) = service();
        let first = owner();
        let second = owner();

        service.create(&first, local_request("mine", dir.path())).await.unwrap();
        service.create(&second, local_request("theirs", dir.path())).await.unwrap();

        let records = service.list(OwnerScope::User(first.user_id)).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "mine");
    }

    #[tokio::test]
    async fn test_runs_against_saved_configuration() {
        let dir = tempdir().unwrap();
        let (service, _) = service();

        let record = service.create(&owner(), local_request("testable", dir.path())).await.unwrap();
        service.test(record.id).await.unwrap();
    }
}
