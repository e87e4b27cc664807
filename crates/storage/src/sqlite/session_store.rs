use chrono::Utc;
use exam_core::model::{LedgerSnapshot, TestId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, ser};
use crate::record::LedgerRecord;
use crate::repository::{LocalSessionStore, StorageError};

#[async_trait::async_trait]
impl LocalSessionStore for SqliteRepository {
    async fn save(&self, test_id: &TestId, snapshot: &LedgerSnapshot) -> Result<(), StorageError> {
        let answers = LedgerRecord::from_snapshot(snapshot).to_json()?;

        sqlx::query(
            r"
                INSERT INTO local_sessions (test_id, answers, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(test_id) DO UPDATE SET
                    answers = excluded.answers,
                    updated_at = excluded.updated_at
            ",
        )
        .bind(test_id.as_str())
        .bind(answers)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn load(&self, test_id: &TestId) -> Result<Option<LedgerSnapshot>, StorageError> {
        let row = sqlx::query("SELECT answers FROM local_sessions WHERE test_id = ?1")
            .bind(test_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let answers: String = row.try_get("answers").map_err(ser)?;
        LedgerRecord::from_json(&answers)?.into_snapshot().map(Some)
    }

    async fn clear(&self, test_id: &TestId) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM local_sessions WHERE test_id = ?1")
            .bind(test_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }
}
