use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use tracing::debug;

use super::SqliteRepository;
use crate::repository::{ProgressRecord, ProgressRepository, StorageError};

/// Row key of the single snapshot this device keeps.
const PROGRESS_KEY: &str = "learning_progress";

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn load_progress(&self) -> Result<Option<ProgressRecord>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT payload, updated_at
            FROM progress_state
            WHERE key = ?1
            ",
        )
        .bind(PROGRESS_KEY)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let payload: String = row.try_get("payload").map_err(ser)?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(ser)?;
        Ok(Some(ProgressRecord {
            payload,
            updated_at,
        }))
    }

    async fn save_progress(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO progress_state (key, payload, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
            ",
        )
        .bind(PROGRESS_KEY)
        .bind(record.payload.as_str())
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        debug!(bytes = record.payload.len(), "progress saved");
        Ok(())
    }

    async fn clear_progress(&self) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM progress_state WHERE key = ?1")
            .bind(PROGRESS_KEY)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        debug!(rows = result.rows_affected(), "progress cleared");
        Ok(())
    }
}
