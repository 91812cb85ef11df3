use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use super::TenantRecord;

#[derive(Debug, Error)]
pub enum TenantStoreError {
    // The insert-once guard fired. Should not happen with fresh v4 ids,
    // but must never be swallowed when it does
    #[error("tenant {0} already exists")]
    Conflict(Uuid),
    #[error("tenant store failure: {0}")]
    Write(#[from] sqlx::Error),
}

/// Durable tenant metadata with create-if-absent semantics.
#[async_trait]
pub trait TenantStore: Send + Sync {
    async fn create(&self, record: &TenantRecord) -> Result<(), TenantStoreError>;
    async fn get(&self, tenant_id: Uuid) -> Result<Option<TenantRecord>, TenantStoreError>;
}

pub struct PostgresTenantStore {
    pool: PgPool,
}

impl PostgresTenantStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantStore for PostgresTenantStore {
    async fn create(&self, record: &TenantRecord) -> Result<(), TenantStoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO tenants (tenant_id, tenant_name, tenant_tier, fullname)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(record.tenant_id)
        .bind(&record.tenant_name)
        .bind(&record.tenant_tier)
        .bind(&record.fullname)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => {
                Err(TenantStoreError::Conflict(record.tenant_id))
            }
            Err(err) => Err(TenantStoreError::Write(err)),
        }
    }

    async fn get(&self, tenant_id: Uuid) -> Result<Option<TenantRecord>, TenantStoreError> {
        let record: Option<TenantRecord> = sqlx::query_as(
            r#"
            SELECT tenant_id, tenant_name, tenant_tier, fullname
            FROM tenants
            WHERE tenant_id = $1
            "#,
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .map_or(false, |code| code == "23505")
}
