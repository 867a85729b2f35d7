use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use tracing::debug;

use hakata_core::storage::{StateStorage, StorageError, StoredState};

use crate::DbPool;

/// `StateStorage` over the `app_state` table.
///
/// Revisions live in the row, so handles opened by separate processes on the
/// same database file see each other's writes and conflict through
/// `compare_and_swap`.
#[derive(Clone)]
pub struct SqlStateStorage {
    pool: DbPool,
}

impl SqlStateStorage {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn backend(error: sqlx::Error) -> StorageError {
    StorageError::Backend(error.to_string())
}

fn revision_from_row(key: &str, revision: i64) -> Result<u64, StorageError> {
    u64::try_from(revision).map_err(|_| StorageError::Revision { key: key.to_owned() })
}

#[async_trait]
impl StateStorage for SqlStateStorage {
    async fn load(&self, key: &str) -> Result<Option<StoredState>, StorageError> {
        let row = sqlx::query("SELECT value, revision FROM app_state WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        row.map(|row| {
            Ok(StoredState {
                value: row.try_get("value").map_err(backend)?,
                revision: revision_from_row(key, row.try_get("revision").map_err(backend)?)?,
            })
        })
        .transpose()
    }

    async fn store(&self, key: &str, value: &str) -> Result<u64, StorageError> {
        let revision: i64 = sqlx::query_scalar(
            "INSERT INTO app_state (key, value, revision, updated_at)
             VALUES (?, ?, 1, ?)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                revision = app_state.revision + 1,
                updated_at = excluded.updated_at
             RETURNING revision",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;

        revision_from_row(key, revision)
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<u64>,
        value: &str,
    ) -> Result<Option<u64>, StorageError> {
        let updated_at = Utc::now().to_rfc3339();

        let revision: Option<i64> = match expected {
            None => sqlx::query_scalar(
                "INSERT INTO app_state (key, value, revision, updated_at)
                 VALUES (?, ?, 1, ?)
                 ON CONFLICT(key) DO NOTHING
                 RETURNING revision",
            )
            .bind(key)
            .bind(value)
            .bind(updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?,
            Some(expected) => {
                let expected = i64::try_from(expected)
                    .map_err(|_| StorageError::Revision { key: key.to_owned() })?;
                sqlx::query_scalar(
                    "UPDATE app_state
                     SET value = ?, revision = revision + 1, updated_at = ?
                     WHERE key = ? AND revision = ?
                     RETURNING revision",
                )
                .bind(value)
                .bind(updated_at)
                .bind(key)
                .bind(expected)
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?
            }
        };

        if revision.is_none() {
            debug!(
                event_name = "state.revision_conflict",
                correlation_id = "storage",
                key,
                expected = ?expected,
                "compare-and-swap lost to a concurrent writer"
            );
        }
        revision.map(|revision| revision_from_row(key, revision)).transpose()
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM app_state WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }
}
