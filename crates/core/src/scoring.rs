//! Scoring for a finished attempt.
//!
//! Each correct answer is worth [`MARKS_PER_CORRECT`]; with negative marking
//! each wrong answer costs [`PENALTY_PER_WRONG`]. Skipped questions never cost
//! marks. The percentage is taken over the maximum attainable marks and is
//! clamped at zero from below only.

use crate::model::{AnswerLedger, Question};

pub const MARKS_PER_CORRECT: i64 = 4;
pub const PENALTY_PER_WRONG: i64 = 1;

/// Outcome of scoring one attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    /// Percentage in `0.0..=100.0`.
    pub score: f64,
    /// Marks before normalisation; negative when penalties outweigh credit.
    pub raw_marks: i64,
    pub correct: u32,
    pub wrong: u32,
    pub skipped: u32,
}

impl ScoreBreakdown {
    /// Number of questions scored.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.correct + self.wrong + self.skipped
    }
}

/// Score an attempt.
///
/// Question `i` is looked up in the ledger at index `i`. A missing entry and an
/// entry without a selection both count as skipped.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn score_attempt(
    questions: &[Question],
    ledger: &AnswerLedger,
    negative_marking: bool,
) -> ScoreBreakdown {
    let mut correct = 0_u32;
    let mut wrong = 0_u32;
    let mut skipped = 0_u32;

    for (index, question) in questions.iter().enumerate() {
        match ledger.answer(index).selected() {
            None => skipped += 1,
            Some(option) if question.is_correct(option) => correct += 1,
            Some(_) => wrong += 1,
        }
    }

    let credit = i64::from(correct) * MARKS_PER_CORRECT;
    let raw_marks = if negative_marking {
        credit - i64::from(wrong) * PENALTY_PER_WRONG
    } else {
        credit
    };

    let max_marks = questions.len() as f64 * MARKS_PER_CORRECT as f64;
    let score = if max_marks > 0.0 {
        (raw_marks as f64 / max_marks * 100.0).max(0.0)
    } else {
        0.0
    };

    ScoreBreakdown {
        score,
        raw_marks,
        correct,
        wrong,
        skipped,
    }
}
