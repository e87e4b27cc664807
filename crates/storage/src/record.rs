//! Document shapes shared by the SQLite store and the built-in catalog.
//!
//! Field names follow the document layout the catalog JSON uses (camelCase,
//! stringified question indices, `-1` for "no selection"), so a record
//! written by one backend can be read by another.

use chrono::{DateTime, Utc};
use exam_core::model::{
    ExamCategory, LedgerSnapshot, Question, QuestionId, ResultId, Test, TestId, TestResult,
    UserAnswer, UserId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn index_from_key(key: &str) -> Result<usize, StorageError> {
    key.parse::<usize>()
        .map_err(|_| StorageError::Serialization(format!("invalid question index key: {key}")))
}

//
// ─── TESTS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub chapter: String,
}

impl QuestionRecord {
    #[must_use]
    pub fn from_question(question: &Question) -> Self {
        Self {
            id: question.id().as_str().to_owned(),
            text: question.text().to_owned(),
            options: question.options().to_vec(),
            correct_answer: question.correct_option(),
            explanation: question.explanation().to_owned(),
            subject: question.subject().to_owned(),
            chapter: question.chapter().to_owned(),
        }
    }

    /// # Errors
    ///
    /// Returns `QuestionError` if the stored question no longer validates.
    pub fn into_question(self) -> Result<Question, exam_core::Error> {
        Ok(Question::new(
            QuestionId::new(self.id),
            self.text,
            self.options,
            self.correct_answer,
            self.explanation,
            self.subject,
            self.chapter,
        )?)
    }
}

/// Persisted shape of a test. `subject` holds the exam category code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRecord {
    pub id: String,
    pub title: String,
    pub subject: String,
    pub chapter: String,
    pub questions: Vec<QuestionRecord>,
    /// Minutes.
    pub duration: u32,
    pub total_marks: u32,
    pub negative_marking: bool,
    pub created_at: DateTime<Utc>,
}

impl TestRecord {
    #[must_use]
    pub fn from_test(test: &Test) -> Self {
        Self {
            id: test.id().as_str().to_owned(),
            title: test.title().to_owned(),
            subject: test.category().as_str().to_owned(),
            chapter: test.chapter().to_owned(),
            questions: test
                .questions()
                .iter()
                .map(QuestionRecord::from_question)
                .collect(),
            duration: test.duration_minutes(),
            total_marks: test.total_marks(),
            negative_marking: test.negative_marking(),
            created_at: test.created_at(),
        }
    }

    /// Convert the record back into a validated `Test`.
    ///
    /// # Errors
    ///
    /// Returns an error if the category is unknown or any question or the test
    /// itself fails validation.
    pub fn into_test(self) -> Result<Test, exam_core::Error> {
        let category: ExamCategory = self.subject.parse()?;
        let questions = self
            .questions
            .into_iter()
            .map(QuestionRecord::into_question)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Test::new(
            TestId::new(self.id),
            self.title,
            category,
            self.chapter,
            questions,
            self.duration,
            self.total_marks,
            self.negative_marking,
            self.created_at,
        )?)
    }
}

//
// ─── RESULTS ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub user_id: String,
    pub test_id: String,
    pub score: f64,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub wrong_answers: u32,
    pub skipped_answers: u32,
    /// Whole seconds.
    pub time_taken: u64,
    /// Question index (as a string) to chosen option, `-1` for none.
    pub answers: BTreeMap<String, i64>,
    pub timestamp: DateTime<Utc>,
}

impl ResultRecord {
    #[must_use]
    pub fn from_result(result: &TestResult) -> Self {
        Self {
            id: result.id().map(|id| id.value()),
            user_id: result.user_id().as_str().to_owned(),
            test_id: result.test_id().as_str().to_owned(),
            score: result.score(),
            total_questions: result.total_questions(),
            correct_answers: result.correct(),
            wrong_answers: result.wrong(),
            skipped_answers: result.skipped(),
            time_taken: result.time_taken_secs(),
            answers: result
                .answers_raw()
                .map(|(index, raw)| (index.to_string(), raw))
                .collect(),
            timestamp: result.submitted_at(),
        }
    }

    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for malformed answer keys or
    /// selections, or counts that do not add up.
    pub fn into_result(self) -> Result<TestResult, StorageError> {
        let answers = self
            .answers
            .iter()
            .map(|(key, raw)| {
                let index = index_from_key(key)?;
                let answer = UserAnswer::from_raw(*raw, false).map_err(ser)?;
                Ok((index, answer.selected()))
            })
            .collect::<Result<BTreeMap<_, _>, StorageError>>()?;

        TestResult::from_persisted(
            self.id.map(ResultId::new),
            UserId::new(self.user_id),
            TestId::new(self.test_id),
            self.score,
            self.total_questions,
            self.correct_answers,
            self.wrong_answers,
            self.skipped_answers,
            self.time_taken,
            answers,
            self.timestamp,
        )
        .map_err(ser)
    }
}

//
// ─── LOCAL SESSIONS ───────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub selected_option: i64,
    #[serde(default)]
    pub is_bookmarked: bool,
}

/// In-progress answers for one test, keyed by stringified question index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerRecord {
    pub answers: BTreeMap<String, AnswerRecord>,
}

impl LedgerRecord {
    #[must_use]
    pub fn from_snapshot(snapshot: &LedgerSnapshot) -> Self {
        Self {
            answers: snapshot
                .iter()
                .map(|(index, answer)| {
                    let record = AnswerRecord {
                        selected_option: answer.selected_raw(),
                        is_bookmarked: answer.is_bookmarked(),
                    };
                    (index.to_string(), record)
                })
                .collect(),
        }
    }

    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for malformed keys or selections.
    pub fn into_snapshot(self) -> Result<LedgerSnapshot, StorageError> {
        self.answers
            .iter()
            .map(|(key, record)| {
                let index = index_from_key(key)?;
                let answer = UserAnswer::from_raw(record.selected_option, record.is_bookmarked)
                    .map_err(ser)?;
                Ok((index, answer))
            })
            .collect()
    }

    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if encoding fails.
    pub fn to_json(&self) -> Result<String, StorageError> {
        serde_json::to_string(self).map_err(ser)
    }

    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for invalid JSON.
    pub fn from_json(json: &str) -> Result<Self, StorageError> {
        serde_json::from_str(json).map_err(ser)
    }
}
