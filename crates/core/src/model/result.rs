use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::ids::{ResultId, TestId, UserId};
use crate::model::ledger::{AnswerLedger, UNANSWERED_SENTINEL};
use crate::scoring::ScoreBreakdown;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ResultError {
    #[error("total questions ({total}) does not match answer counts ({sum})")]
    CountMismatch { total: u32, sum: u32 },

    #[error("score must be a finite, non-negative percentage, got {0}")]
    InvalidScore(f64),
}

/// Finalised outcome of one test attempt.
///
/// Built exactly once at submission. The only later change is the result store
/// assigning an id, which yields a new value via [`TestResult::with_id`].
#[derive(Debug, Clone, PartialEq)]
pub struct TestResult {
    id: Option<ResultId>,
    user_id: UserId,
    test_id: TestId,
    score: f64,
    total_questions: u32,
    correct: u32,
    wrong: u32,
    skipped: u32,
    time_taken_secs: u64,
    answers: BTreeMap<usize, Option<usize>>,
    submitted_at: DateTime<Utc>,
}

impl TestResult {
    /// Assemble a result from a fresh score and the ledger it was computed from.
    ///
    /// Every ledger entry is recorded, including bookmark-only entries without a
    /// selection; questions never touched are omitted.
    #[must_use]
    pub fn from_score(
        user_id: UserId,
        test_id: TestId,
        score: &ScoreBreakdown,
        ledger: &AnswerLedger,
        time_taken_secs: u64,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            user_id,
            test_id,
            score: score.score,
            total_questions: score.total(),
            correct: score.correct,
            wrong: score.wrong,
            skipped: score.skipped,
            time_taken_secs,
            answers: ledger.iter().map(|(i, a)| (i, a.selected())).collect(),
            submitted_at,
        }
    }

    /// Rehydrate a result from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ResultError::CountMismatch` if the counts do not add up, or
    /// `ResultError::InvalidScore` for a negative or non-finite score.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: Option<ResultId>,
        user_id: UserId,
        test_id: TestId,
        score: f64,
        total_questions: u32,
        correct: u32,
        wrong: u32,
        skipped: u32,
        time_taken_secs: u64,
        answers: BTreeMap<usize, Option<usize>>,
        submitted_at: DateTime<Utc>,
    ) -> Result<Self, ResultError> {
        if !score.is_finite() || score < 0.0 {
            return Err(ResultError::InvalidScore(score));
        }
        let sum = correct.saturating_add(wrong).saturating_add(skipped);
        if sum != total_questions {
            return Err(ResultError::CountMismatch {
                total: total_questions,
                sum,
            });
        }

        Ok(Self {
            id,
            user_id,
            test_id,
            score,
            total_questions,
            correct,
            wrong,
            skipped,
            time_taken_secs,
            answers,
            submitted_at,
        })
    }

    /// Same result, carrying the identifier assigned by the result store.
    #[must_use]
    pub fn with_id(self, id: ResultId) -> Self {
        Self {
            id: Some(id),
            ..self
        }
    }

    #[must_use]
    pub fn id(&self) -> Option<ResultId> {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn test_id(&self) -> &TestId {
        &self.test_id
    }

    /// Percentage score in `0.0..=100.0`.
    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn wrong(&self) -> u32 {
        self.wrong
    }

    #[must_use]
    pub fn skipped(&self) -> u32 {
        self.skipped
    }

    #[must_use]
    pub fn time_taken_secs(&self) -> u64 {
        self.time_taken_secs
    }

    #[must_use]
    pub fn answers(&self) -> &BTreeMap<usize, Option<usize>> {
        &self.answers
    }

    /// Answers in flat form, `-1` standing for "no selection".
    pub fn answers_raw(&self) -> impl Iterator<Item = (usize, i64)> + '_ {
        self.answers.iter().map(|(i, sel)| {
            let raw = sel
                .and_then(|v| i64::try_from(v).ok())
                .unwrap_or(UNANSWERED_SENTINEL);
            (*i, raw)
        })
    }

    #[must_use]
    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn from_score_records_every_ledger_entry() {
        let mut ledger = AnswerLedger::new(4);
        ledger.record_answer(0, 2).unwrap();
        ledger.toggle_bookmark(3).unwrap();
        let score = ScoreBreakdown {
            score: 25.0,
            raw_marks: 4,
            correct: 1,
            wrong: 0,
            skipped: 3,
        };

        let result = TestResult::from_score(
            UserId::new("u1"),
            TestId::new("t1"),
            &score,
            &ledger,
            42,
            fixed_now(),
        );

        assert_eq!(result.id(), None);
        assert_eq!(result.total_questions(), 4);
        assert_eq!(result.answers().len(), 2);
        let raw: Vec<_> = result.answers_raw().collect();
        assert_eq!(raw, vec![(0, 2), (3, -1)]);
    }

    #[test]
    fn with_id_keeps_everything_else() {
        let result = TestResult::from_persisted(
            None,
            UserId::new("u"),
            TestId::new("t"),
            40.0,
            5,
            2,
            0,
            3,
            10,
            BTreeMap::new(),
            fixed_now(),
        )
        .unwrap();
        let stored = result.clone().with_id(ResultId::new(9));
        assert_eq!(stored.id(), Some(ResultId::new(9)));
        assert_eq!(stored.score(), result.score());
        assert_eq!(stored.submitted_at(), result.submitted_at());
    }

    #[test]
    fn persisted_counts_must_add_up() {
        let err = TestResult::from_persisted(
            None,
            UserId::new("u"),
            TestId::new("t"),
            40.0,
            5,
            2,
            1,
            1,
            10,
            BTreeMap::new(),
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, ResultError::CountMismatch { total: 5, sum: 4 });
    }

    #[test]
    fn persisted_score_cannot_be_negative() {
        let err = TestResult::from_persisted(
            None,
            UserId::new("u"),
            TestId::new("t"),
            -1.0,
            1,
            0,
            1,
            0,
            10,
            BTreeMap::new(),
            fixed_now(),
        )
        .unwrap_err();
        assert!(matches!(err, ResultError::InvalidScore(_)));
    }
}
