//! PostgreSQL Key-Value Store

use chrono::{DateTime, Utc};
use platform::kv::{KeyValueStore, StoreError};
use platform::rate_limit::WINDOW_KEY_PREFIX;
use sqlx::PgPool;

/// PostgreSQL-backed key-value store over the `kv_entries` table
#[derive(Clone)]
pub struct PgKeyValueStore {
    pool: PgPool,
}

impl PgKeyValueStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Delete rate windows not written since `before`
    ///
    /// Expired windows are replaced lazily on the next request, so rows of
    /// clients that never come back would otherwise stay forever.
    pub async fn cleanup_stale_windows(&self, before: DateTime<Utc>) -> Result<u64, StoreError> {
        let deleted = sqlx::query("DELETE FROM kv_entries WHERE starts_with(key, $1) AND updated_at < $2")
            .bind(WINDOW_KEY_PREFIX)
            .bind(before)
            .execute(&self.pool)
            .await
            .map_err(StoreError::backend)?
            .rows_affected();

        tracing::info!(rate_windows = deleted, "Cleaned up stale rate windows");
        Ok(deleted)
    }
}

impl KeyValueStore for PgKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        sqlx::query_scalar::<_, String>("SELECT value FROM kv_entries WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::backend)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO kv_entries (key, value, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (key)
            DO UPDATE SET value = EXCLUDED.value, updated_at = now()
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM kv_entries WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(StoreError::backend)?;
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        sqlx::query_scalar::<_, String>(
            "SELECT key FROM kv_entries WHERE starts_with(key, $1) ORDER BY key",
        )
        .bind(prefix)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)
    }
}
