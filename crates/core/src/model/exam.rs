use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::TestId;
use crate::model::question::Question;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TestError {
    #[error("test title is empty")]
    EmptyTitle,

    #[error("test has no questions")]
    NoQuestions,

    #[error("test duration must be at least one minute")]
    ZeroDuration,

    #[error("unknown exam category: {0}")]
    UnknownCategory(String),
}

//
// ─── CATEGORY ─────────────────────────────────────────────────────────────────
//

/// Competitive exam a test prepares for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExamCategory {
    Neet,
    Jee,
    Upsc,
}

impl ExamCategory {
    /// Stable storage/display code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ExamCategory::Neet => "NEET",
            ExamCategory::Jee => "JEE",
            ExamCategory::Upsc => "UPSC",
        }
    }
}

impl fmt::Display for ExamCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExamCategory {
    type Err = TestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NEET" => Ok(Self::Neet),
            "JEE" => Ok(Self::Jee),
            "UPSC" => Ok(Self::Upsc),
            _ => Err(TestError::UnknownCategory(s.to_owned())),
        }
    }
}

//
// ─── TEST ─────────────────────────────────────────────────────────────────────
//

/// Immutable definition of a timed multiple-choice test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Test {
    id: TestId,
    title: String,
    category: ExamCategory,
    chapter: String,
    questions: Vec<Question>,
    duration_minutes: u32,
    total_marks: u32,
    negative_marking: bool,
    created_at: DateTime<Utc>,
}

impl Test {
    /// Build a validated test definition.
    ///
    /// # Errors
    ///
    /// Returns `TestError` if the title is blank, there are no questions, or the
    /// duration is zero.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: TestId,
        title: impl Into<String>,
        category: ExamCategory,
        chapter: impl Into<String>,
        questions: Vec<Question>,
        duration_minutes: u32,
        total_marks: u32,
        negative_marking: bool,
        created_at: DateTime<Utc>,
    ) -> Result<Self, TestError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(TestError::EmptyTitle);
        }
        if questions.is_empty() {
            return Err(TestError::NoQuestions);
        }
        if duration_minutes == 0 {
            return Err(TestError::ZeroDuration);
        }

        Ok(Self {
            id,
            title,
            category,
            chapter: chapter.into(),
            questions,
            duration_minutes,
            total_marks,
            negative_marking,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> &TestId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn category(&self) -> ExamCategory {
        self.category
    }

    #[must_use]
    pub fn chapter(&self) -> &str {
        &self.chapter
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    /// Number of questions; never zero.
    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    /// Countdown length in whole seconds.
    #[must_use]
    pub fn duration_secs(&self) -> u64 {
        u64::from(self.duration_minutes) * 60
    }

    #[must_use]
    pub fn total_marks(&self) -> u32 {
        self.total_marks
    }

    #[must_use]
    pub fn negative_marking(&self) -> bool {
        self.negative_marking
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionId;
    use crate::time::fixed_now;

    fn question() -> Question {
        Question::new(
            QuestionId::new("q1"),
            "Q",
            vec!["a".into(), "b".into()],
            0,
            "",
            "NEET",
            "Genetics",
        )
        .unwrap()
    }

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("neet".parse::<ExamCategory>().unwrap(), ExamCategory::Neet);
        assert_eq!("JEE".parse::<ExamCategory>().unwrap(), ExamCategory::Jee);
        assert_eq!(ExamCategory::Upsc.to_string(), "UPSC");
        assert!(matches!(
            "GRE".parse::<ExamCategory>(),
            Err(TestError::UnknownCategory(_))
        ));
    }

    #[test]
    fn duration_is_reported_in_seconds() {
        let test = Test::new(
            TestId::new("t"),
            "Genetics",
            ExamCategory::Neet,
            "Genetics",
            vec![question()],
            45,
            100,
            true,
            fixed_now(),
        )
        .unwrap();
        assert_eq!(test.duration_secs(), 2700);
        assert_eq!(test.question_count(), 1);
    }

    #[test]
    fn rejects_empty_tests() {
        let err = Test::new(
            TestId::new("t"),
            "Empty",
            ExamCategory::Jee,
            "",
            Vec::new(),
            10,
            100,
            false,
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, TestError::NoQuestions);

        let err = Test::new(
            TestId::new("t"),
            "No time",
            ExamCategory::Jee,
            "",
            vec![question()],
            0,
            100,
            false,
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, TestError::ZeroDuration);
    }
}
