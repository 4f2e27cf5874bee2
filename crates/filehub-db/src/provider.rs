//! Storage provider repository: CRUD for the storage_providers table.
//!
//! Provider configurations are stored encrypted; this layer only ever sees
//! ciphertext. Deletes are soft: `deleted_at` is set and every read excludes
//! tombstoned rows, preserving referential history for files created against
//! a provider.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use filehub_core::models::{OwnerScope, ProviderRecord};
use filehub_core::{AppError, StorageDriver};
use sqlx::PgPool;
use uuid::Uuid;

/// Fields for inserting a new provider row.
#[derive(Debug, Clone)]
pub struct NewProvider {
    pub label: String,
    pub name: String,
    pub driver: StorageDriver,
    /// Encrypted configuration blob.
    pub configuration: String,
    pub owner_id: Uuid,
    pub team_id: Option<Uuid>,
}

/// Fields for updating an existing provider row. The driver and the
/// encrypted configuration always travel together: a configuration change
/// may change the driver, and a stale pairing must never be persisted.
#[derive(Debug, Clone)]
pub struct ProviderChanges {
    pub label: String,
    pub name: String,
    pub driver: StorageDriver,
    pub configuration: String,
}

/// Repository seam for provider records; implemented by the Postgres
/// repository and by in-memory mocks in tests.
#[async_trait]
pub trait ProviderRepository: Send + Sync {
    async fn insert(&self, provider: NewProvider) -> Result<ProviderRecord, AppError>;
    async fn update(&self, id: Uuid, changes: ProviderChanges) -> Result<ProviderRecord, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ProviderRecord>, AppError>;
    async fn find_by_name(&self, name: &str) -> Result<Option<ProviderRecord>, AppError>;
    async fn list_for_owner(&self, scope: OwnerScope) -> Result<Vec<ProviderRecord>, AppError>;
    /// Soft-delete; returns false when no live row matched.
    async fn soft_delete(&self, id: Uuid) -> Result<bool, AppError>;
}

/// Row type for the storage_providers table (for FromRow).
#[derive(Debug, sqlx::FromRow)]
pub struct ProviderRow {
    pub id: Uuid,
    pub label: String,
    pub name: String,
    pub driver: StorageDriver,
    pub configuration: String,
    pub owner_id: Uuid,
    pub team_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ProviderRow {
    pub fn to_record(self) -> ProviderRecord {
        ProviderRecord {
            id: self.id,
            label: self.label,
            name: self.name,
            driver: self.driver,
            configuration: self.configuration,
            owner_id: self.owner_id,
            team_id: self.team_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        }
    }
}

const SELECT_COLUMNS: &str = "id, label, name, driver, configuration, owner_id, team_id, \
     created_at, updated_at, deleted_at";

/// Postgres repository for storage provider records.
#[derive(Clone)]
pub struct PgProviderRepository {
    pool: PgPool,
}

impl PgProviderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProviderRepository for PgProviderRepository {
    #[tracing::instrument(skip(self, provider), fields(db.table = "storage_providers", provider.name = %provider.name))]
    async fn insert(&self, provider: NewProvider) -> Result<ProviderRecord, AppError> {
        let row: ProviderRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO storage_providers (label, name, driver, configuration, owner_id, team_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            SELECT_COLUMNS
        ))
        .bind(&provider.label)
        .bind(&provider.name)
        .bind(provider.driver)
        .bind(&provider.configuration)
        .bind(provider.owner_id)
        .bind(provider.team_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.to_record())
    }

    #[tracing::instrument(skip(self, changes), fields(db.table = "storage_providers", db.record_id = %id))]
    async fn update(&self, id: Uuid, changes: ProviderChanges) -> Result<ProviderRecord, AppError> {
        let row: Option<ProviderRow> = sqlx::query_as(&format!(
            r#"
            UPDATE storage_providers
            SET label = $2, name = $3, driver = $4, configuration = $5, updated_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {}
            "#,
            SELECT_COLUMNS
        ))
        .bind(id)
        .bind(&changes.label)
        .bind(&changes.name)
        .bind(changes.driver)
        .bind(&changes.configuration)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ProviderRow::to_record)
            .ok_or_else(|| AppError::NotFound(format!("storage provider {}", id)))
    }

    #[tracing::instrument(skip(self), fields(db.table = "storage_providers", db.record_id = %id))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ProviderRecord>, AppError> {
        let row: Option<ProviderRow> = sqlx::query_as(&format!(
            "SELECT {} FROM storage_providers WHERE id = $1 AND deleted_at IS NULL",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ProviderRow::to_record))
    }

    #[tracing::instrument(skip(self), fields(db.table = "storage_providers"))]
    async fn find_by_name(&self, name: &str) -> Result<Option<ProviderRecord>, AppError> {
        let row: Option<ProviderRow> = sqlx::query_as(&format!(
            "SELECT {} FROM storage_providers WHERE name = $1 AND deleted_at IS NULL",
            SELECT_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ProviderRow::to_record))
    }

    #[tracing::instrument(skip(self), fields(db.table = "storage_providers"))]
    async fn list_for_owner(&self, scope: OwnerScope) -> Result<Vec<ProviderRecord>, AppError> {
        let rows: Vec<ProviderRow> = match scope {
            OwnerScope::User(user_id) => {
                sqlx::query_as(&format!(
                    "SELECT {} FROM storage_providers \
                     WHERE owner_id = $1 AND deleted_at IS NULL ORDER BY created_at",
                    SELECT_COLUMNS
                ))
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
            OwnerScope::Team(team_id) => {
                sqlx::query_as(&format!(
                    "SELECT {} FROM storage_providers \
                     WHERE team_id = $1 AND deleted_at IS NULL ORDER BY created_at",
                    SELECT_COLUMNS
                ))
                .bind(team_id)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows.into_iter().map(ProviderRow::to_record).collect())
    }

    #[tracing::instrument(skip(self), fields(db.table = "storage_providers", db.record_id = %id))]
    async fn soft_delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE storage_providers SET deleted_at = now(), updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
