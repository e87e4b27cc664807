mod exam;
mod ids;
mod ledger;
mod question;
mod result;

pub use ids::{ParseIdError, QuestionId, ResultId, TestId, UserId};

pub use exam::{ExamCategory, Test, TestError};
pub use ledger::{
    AnswerLedger, LedgerError, LedgerSnapshot, QuestionStatus, StatusCounts,
    UNANSWERED_SENTINEL, UserAnswer,
};
pub use question::{MIN_OPTIONS, Question, QuestionError};
pub use result::{ResultError, TestResult};
