use exam_core::model::{ResultId, TestResult, UserId};

use super::SqliteRepository;
use super::mapping::{conn, i64_from_u64, map_result_row, result_id_from_i64, ser};
use crate::record::ResultRecord;
use crate::repository::{ResultRepository, StorageError};

#[async_trait::async_trait]
impl ResultRepository for SqliteRepository {
    async fn create_result(&self, result: &TestResult) -> Result<ResultId, StorageError> {
        let record = ResultRecord::from_result(result);
        let answers = serde_json::to_string(&record.answers).map_err(ser)?;

        let res = sqlx::query(
            r"
                INSERT INTO results (
                    user_id, test_id, score, total_questions,
                    correct_answers, wrong_answers, skipped_answers,
                    time_taken, answers, submitted_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ",
        )
        .bind(record.user_id.as_str())
        .bind(record.test_id.as_str())
        .bind(record.score)
        .bind(i64::from(record.total_questions))
        .bind(i64::from(record.correct_answers))
        .bind(i64::from(record.wrong_answers))
        .bind(i64::from(record.skipped_answers))
        .bind(i64_from_u64("time_taken", record.time_taken)?)
        .bind(answers)
        .bind(record.timestamp)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        result_id_from_i64(res.last_insert_rowid())
    }

    async fn list_results_for_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<TestResult>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, user_id, test_id, score, total_questions,
                    correct_answers, wrong_answers, skipped_answers,
                    time_taken, answers, submitted_at
                FROM results
                WHERE user_id = ?1
                ORDER BY submitted_at DESC, id DESC
                LIMIT ?2
            ",
        )
        .bind(user_id.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_result_row).collect()
    }
}
