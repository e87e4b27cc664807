use exam_core::model::UserId;

/// Lifecycle of one test attempt.
///
/// `Loading → InProgress → Submitting → Completed`, or `Loading → NotFound`
/// when the test cannot be resolved from any source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Loading,
    InProgress,
    Submitting,
    Completed,
    NotFound,
}

impl SessionPhase {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionPhase::Completed | SessionPhase::NotFound)
    }
}

/// Why a submission started. Timer-driven submissions skip confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    Manual,
    TimerExpired,
}

/// Who is taking the test. Passed in explicitly by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    user_id: UserId,
}

impl SessionContext {
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }
}
