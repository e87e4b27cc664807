use exam_core::model::{Test, TestId};

use super::SqliteRepository;
use super::mapping::{conn, map_test_row, ser, u64_from_i64};
use crate::record::TestRecord;
use crate::repository::{StorageError, TestRepository};

#[async_trait::async_trait]
impl TestRepository for SqliteRepository {
    async fn get_test(&self, id: &TestId) -> Result<Option<Test>, StorageError> {
        let row = sqlx::query("SELECT document FROM tests WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(map_test_row).transpose()
    }

    async fn list_tests(&self) -> Result<Vec<Test>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT document
                FROM tests
                ORDER BY created_at DESC, id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_test_row).collect()
    }

    async fn upsert_test(&self, test: &Test) -> Result<(), StorageError> {
        let document = serde_json::to_string(&TestRecord::from_test(test)).map_err(ser)?;

        sqlx::query(
            r"
                INSERT INTO tests (id, category, created_at, document)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(id) DO UPDATE SET
                    category = excluded.category,
                    created_at = excluded.created_at,
                    document = excluded.document
            ",
        )
        .bind(test.id().as_str())
        .bind(test.category().as_str())
        .bind(test.created_at())
        .bind(document)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn count_tests(&self) -> Result<u64, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tests")
            .fetch_one(&self.pool)
            .await
            .map_err(conn)?;
        u64_from_i64("count", count)
    }
}
