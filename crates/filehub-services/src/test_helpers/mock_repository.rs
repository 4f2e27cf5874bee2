//! In-memory provider repository backed by a HashMap.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use filehub_core::models::{OwnerScope, ProviderRecord};
use filehub_core::AppError;
use filehub_db::{NewProvider, ProviderChanges, ProviderRepository};
use uuid::Uuid;

/// In-memory [`ProviderRepository`] with the same soft-delete semantics as
/// the Postgres repository.
#[derive(Default)]
pub struct MockProviderRepository {
    records: Arc<Mutex<HashMap<Uuid, ProviderRecord>>>,
}

impl MockProviderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, ProviderRecord>> {
        self.records.lock().unwrap()
    }
}

#[async_trait]
impl ProviderRepository for MockProviderRepository {
    async fn insert(&self, provider: NewProvider) -> Result<ProviderRecord, AppError> {
        let now = Utc::now();
        let record = ProviderRecord {
            id: Uuid::new_v4(),
            label: provider.label,
            name: provider.name,
            driver: provider.driver,
            configuration: provider.configuration,
            owner_id: provider.owner_id,
            team_id: provider.team_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.lock().insert(record.id, record.clone());
        Ok(record)
    }

    async fn update(&self, id: Uuid, changes: ProviderChanges) -> Result<ProviderRecord, AppError> {
        let mut records = self.lock();
        let record = records
            .get_mut(&id)
            .filter(|r| r.deleted_at.is_none())
            .ok_or_else(|| AppError::NotFound(format!("storage provider {}", id)))?;
        record.label = changes.label;
        record.name = changes.name;
        record.driver = changes.driver;
        record.configuration = changes.configuration;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ProviderRecord>, AppError> {
        Ok(self
            .lock()
            .get(&id)
            .filter(|r| r.deleted_at.is_none())
            .cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<ProviderRecord>, AppError> {
        Ok(self
            .lock()
            .values()
            .find(|r| r.name == name && r.deleted_at.is_none())
            .cloned())
    }

    async fn list_for_owner(&self, scope: OwnerScope) -> Result<Vec<ProviderRecord>, AppError> {
        let mut records: Vec<ProviderRecord> = self
            .lock()
            .values()
            .filter(|r| r.deleted_at.is_none())
            .filter(|r| match scope {
                OwnerScope::User(user_id) => r.owner_id == user_id,
                OwnerScope::Team(team_id) => r.team_id == Some(team_id),
            })
            .cloned()
            .collect();
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }

    async fn soft_delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut records = self.lock();
        match records.get_mut(&id).filter(|r| r.deleted_at.is_none()) {
            Some(record) => {
                let now = Utc::now();
                record.deleted_at = Some(now);
                record.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
