use exam_core::model::{ResultId, Test, TestResult};
use sqlx::Row;
use std::collections::BTreeMap;

use crate::record::{ResultRecord, TestRecord};
use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn u64_from_i64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn i64_from_u64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn map_test_row(row: &sqlx::sqlite::SqliteRow) -> Result<Test, StorageError> {
    let document: String = row.try_get("document").map_err(ser)?;
    let record: TestRecord = serde_json::from_str(&document).map_err(ser)?;
    record.into_test().map_err(ser)
}

pub(crate) fn map_result_row(row: &sqlx::sqlite::SqliteRow) -> Result<TestResult, StorageError> {
    let id = u64_from_i64("id", row.try_get::<i64, _>("id").map_err(ser)?)?;
    let answers_json: String = row.try_get("answers").map_err(ser)?;
    let answers: BTreeMap<String, i64> = serde_json::from_str(&answers_json).map_err(ser)?;

    let record = ResultRecord {
        id: Some(id),
        user_id: row.try_get("user_id").map_err(ser)?,
        test_id: row.try_get("test_id").map_err(ser)?,
        score: row.try_get("score").map_err(ser)?,
        total_questions: u32_from_i64(
            "total_questions",
            row.try_get::<i64, _>("total_questions").map_err(ser)?,
        )?,
        correct_answers: u32_from_i64(
            "correct_answers",
            row.try_get::<i64, _>("correct_answers").map_err(ser)?,
        )?,
        wrong_answers: u32_from_i64(
            "wrong_answers",
            row.try_get::<i64, _>("wrong_answers").map_err(ser)?,
        )?,
        skipped_answers: u32_from_i64(
            "skipped_answers",
            row.try_get::<i64, _>("skipped_answers").map_err(ser)?,
        )?,
        time_taken: u64_from_i64("time_taken", row.try_get::<i64, _>("time_taken").map_err(ser)?)?,
        answers,
        timestamp: row.try_get("submitted_at").map_err(ser)?,
    };
    record.into_result()
}

pub(crate) fn result_id_from_i64(v: i64) -> Result<ResultId, StorageError> {
    Ok(ResultId::new(u64_from_i64("result id", v)?))
}
