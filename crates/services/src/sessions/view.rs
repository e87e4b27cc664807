use exam_core::model::{Question, QuestionStatus, UserAnswer};

/// The question at one index together with the learner's response to it.
///
/// Presentation-agnostic: no formatting, `number` is the 1-based label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView<'a> {
    pub index: usize,
    pub number: usize,
    pub question: &'a Question,
    pub answer: UserAnswer,
    pub status: QuestionStatus,
}

/// Counts shown before the learner confirms a manual submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionPreview {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub bookmarked: usize,
}
