use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

use super::errors::StorageError;
use super::store::KeyValueStore;

/// PostgreSQL-backed store using a single `kv_store` table
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPool::connect(database_url).await.map_err(|e| {
            warn!(error = %e, "Failed to connect to database");
            StorageError::from(e)
        })?;
        Ok(Self::new(pool))
    }

    /// Creates the table if it does not exist yet
    #[instrument(skip(self))]
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        sqlx::query("CREATE TABLE IF NOT EXISTS kv_store (key TEXT PRIMARY KEY, value TEXT NOT NULL)")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to create kv_store table");
                StorageError::from(e)
            })?;

        debug!("kv_store table ready");
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for PostgresStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        debug!(key = %key, "Fetching key from database");

        let row = sqlx::query("SELECT value FROM kv_store WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, key = %key, "Failed to fetch key from database");
                StorageError::from(e)
            })?;

        Ok(row.map(|row| row.get("value")))
    }

    #[instrument(skip(self, value))]
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        debug!(key = %key, bytes = value.len(), "Writing key to database");

        sqlx::query(
            "INSERT INTO kv_store (key, value) VALUES ($1, $2) ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, key = %key, "Failed to write key to database");
            StorageError::from(e)
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        debug!(key = %key, "Removing key from database");

        sqlx::query("DELETE FROM kv_store WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, key = %key, "Failed to remove key from database");
                StorageError::from(e)
            })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let rows = sqlx::query("SELECT key FROM kv_store ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to list keys");
                StorageError::from(e)
            })?;

        Ok(rows.iter().map(|row| row.get("key")).collect())
    }

    #[instrument(skip(self, records))]
    async fn replace_namespace(
        &self,
        prefix: &str,
        records: &BTreeMap<String, String>,
    ) -> Result<(), StorageError> {
        debug!(prefix = %prefix, records = records.len(), "Replacing namespace in database");

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM kv_store WHERE starts_with(key, $1)")
            .bind(prefix)
            .execute(&mut *tx)
            .await?;

        for (key, value) in records {
            sqlx::query("INSERT INTO kv_store (key, value) VALUES ($1, $2)")
                .bind(key)
                .bind(value)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await.map_err(|e| {
            warn!(error = %e, "Failed to commit namespace replacement");
            StorageError::from(e)
        })?;

        debug!(prefix = %prefix, "Namespace replaced in database");
        Ok(())
    }
}
