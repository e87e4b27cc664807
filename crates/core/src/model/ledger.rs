use std::collections::BTreeMap;
use thiserror::Error;

/// Flat-representation marker for "no option selected".
pub const UNANSWERED_SENTINEL: i64 = -1;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LedgerError {
    #[error("question index {index} is out of range for {count} questions")]
    QuestionOutOfRange { index: usize, count: usize },

    #[error("invalid stored selection: {0}")]
    InvalidSelection(i64),
}

//
// ─── USER ANSWER ──────────────────────────────────────────────────────────────
//

/// A learner's response state for one question.
///
/// The selection and the bookmark flag are independent of each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UserAnswer {
    selected: Option<usize>,
    bookmarked: bool,
}

impl UserAnswer {
    #[must_use]
    pub fn new(selected: Option<usize>, bookmarked: bool) -> Self {
        Self {
            selected,
            bookmarked,
        }
    }

    /// Rebuild an answer from its flat form, where `-1` means no selection.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidSelection` for negative values other than the sentinel.
    pub fn from_raw(selected: i64, bookmarked: bool) -> Result<Self, LedgerError> {
        let selected = match selected {
            UNANSWERED_SENTINEL => None,
            v => Some(usize::try_from(v).map_err(|_| LedgerError::InvalidSelection(v))?),
        };
        Ok(Self::new(selected, bookmarked))
    }

    #[must_use]
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Selection in flat form (`-1` when nothing is selected).
    #[must_use]
    pub fn selected_raw(&self) -> i64 {
        self.selected
            .and_then(|v| i64::try_from(v).ok())
            .unwrap_or(UNANSWERED_SENTINEL)
    }

    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.selected.is_some()
    }

    #[must_use]
    pub fn is_bookmarked(&self) -> bool {
        self.bookmarked
    }

    #[must_use]
    pub fn status(&self) -> QuestionStatus {
        match (self.is_answered(), self.bookmarked) {
            (true, true) => QuestionStatus::AnsweredBookmarked,
            (true, false) => QuestionStatus::Answered,
            (false, true) => QuestionStatus::Bookmarked,
            (false, false) => QuestionStatus::Unanswered,
        }
    }
}

/// Navigation status of a question; the four states are disjoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionStatus {
    Unanswered,
    Answered,
    Bookmarked,
    AnsweredBookmarked,
}

/// Per-status question counts. Always sums to the ledger's question count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusCounts {
    pub answered: usize,
    pub bookmarked: usize,
    pub answered_bookmarked: usize,
    pub unanswered: usize,
}

impl StatusCounts {
    fn all_unanswered(question_count: usize) -> Self {
        Self {
            unanswered: question_count,
            ..Self::default()
        }
    }

    fn slot(&mut self, status: QuestionStatus) -> &mut usize {
        match status {
            QuestionStatus::Unanswered => &mut self.unanswered,
            QuestionStatus::Answered => &mut self.answered,
            QuestionStatus::Bookmarked => &mut self.bookmarked,
            QuestionStatus::AnsweredBookmarked => &mut self.answered_bookmarked,
        }
    }

    fn shift(&mut self, from: QuestionStatus, to: QuestionStatus) {
        if from == to {
            return;
        }
        let from_slot = self.slot(from);
        *from_slot = from_slot.saturating_sub(1);
        *self.slot(to) += 1;
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.answered + self.bookmarked + self.answered_bookmarked + self.unanswered
    }

    /// Questions with a selection, bookmarked or not.
    #[must_use]
    pub fn with_selection(&self) -> usize {
        self.answered + self.answered_bookmarked
    }
}

//
// ─── SNAPSHOT ─────────────────────────────────────────────────────────────────
//

/// Flat, storage-agnostic copy of a ledger's entries keyed by question index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LedgerSnapshot {
    answers: BTreeMap<usize, UserAnswer>,
}

impl LedgerSnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, index: usize, answer: UserAnswer) {
        self.answers.insert(index, answer);
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&UserAnswer> {
        self.answers.get(&index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &UserAnswer)> {
        self.answers.iter().map(|(k, v)| (*k, v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

impl FromIterator<(usize, UserAnswer)> for LedgerSnapshot {
    fn from_iter<T: IntoIterator<Item = (usize, UserAnswer)>>(iter: T) -> Self {
        Self {
            answers: iter.into_iter().collect(),
        }
    }
}

//
// ─── LEDGER ───────────────────────────────────────────────────────────────────
//

/// Answer and bookmark state for one attempt at a test.
///
/// Entries are created lazily on first interaction. A missing entry and an
/// entry without a selection are treated the same everywhere. Status counts
/// are maintained on every mutation so the navigation panel never rescans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerLedger {
    question_count: usize,
    entries: BTreeMap<usize, UserAnswer>,
    counts: StatusCounts,
}

impl AnswerLedger {
    #[must_use]
    pub fn new(question_count: usize) -> Self {
        Self {
            question_count,
            entries: BTreeMap::new(),
            counts: StatusCounts::all_unanswered(question_count),
        }
    }

    /// Rebuild a ledger from a persisted snapshot.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::QuestionOutOfRange` if the snapshot references a
    /// question the test does not have (e.g. the test definition changed).
    pub fn restore(question_count: usize, snapshot: &LedgerSnapshot) -> Result<Self, LedgerError> {
        let mut ledger = Self::new(question_count);
        for (index, answer) in snapshot.iter() {
            ledger.update(index, |_| *answer)?;
        }
        Ok(ledger)
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.question_count
    }

    /// Answer for a question, or the unanswered/not-bookmarked default.
    #[must_use]
    pub fn answer(&self, index: usize) -> UserAnswer {
        self.entries.get(&index).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn status(&self, index: usize) -> QuestionStatus {
        self.answer(index).status()
    }

    /// Select an option, keeping the bookmark flag.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::QuestionOutOfRange` for an invalid question index.
    pub fn record_answer(&mut self, index: usize, option: usize) -> Result<UserAnswer, LedgerError> {
        self.update(index, |prev| UserAnswer::new(Some(option), prev.bookmarked))
    }

    /// Drop the selection, keeping the bookmark flag.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::QuestionOutOfRange` for an invalid question index.
    pub fn clear_answer(&mut self, index: usize) -> Result<UserAnswer, LedgerError> {
        self.update(index, |prev| UserAnswer::new(None, prev.bookmarked))
    }

    /// Flip the bookmark flag, keeping the selection.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::QuestionOutOfRange` for an invalid question index.
    pub fn toggle_bookmark(&mut self, index: usize) -> Result<UserAnswer, LedgerError> {
        self.update(index, |prev| UserAnswer::new(prev.selected, !prev.bookmarked))
    }

    #[must_use]
    pub fn counts(&self) -> StatusCounts {
        self.counts
    }

    /// Questions that have a selection.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.counts.with_selection()
    }

    /// Questions still lacking a selection, bookmarked or not.
    #[must_use]
    pub fn remaining_count(&self) -> usize {
        self.question_count.saturating_sub(self.answered_count())
    }

    /// Recorded entries in question order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &UserAnswer)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.iter().map(|(i, a)| (i, *a)).collect()
    }

    fn update(
        &mut self,
        index: usize,
        f: impl FnOnce(UserAnswer) -> UserAnswer,
    ) -> Result<UserAnswer, LedgerError> {
        if index >= self.question_count {
            return Err(LedgerError::QuestionOutOfRange {
                index,
                count: self.question_count,
            });
        }
        let prev = self.answer(index);
        let next = f(prev);
        self.counts.shift(prev.status(), next.status());
        self.entries.insert(index, next);
        Ok(next)
    }
}
