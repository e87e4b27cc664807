use chrono::{DateTime, Utc};
use std::sync::Arc;

use exam_core::model::{
    AnswerLedger, LedgerError, LedgerSnapshot, QuestionStatus, Test, TestId, TestResult,
    UserAnswer,
};
use exam_core::scoring::score_attempt;
use exam_core::time::elapsed_whole_secs;
use exam_core::timer::{Countdown, Tick, Urgency};
use storage::repository::LocalSessionStore;
use tracing::{debug, info, warn};

use super::phase::{SessionContext, SessionPhase, SubmitTrigger};
use super::progress::SessionProgress;
use super::view::{QuestionView, SubmissionPreview};
use super::writer::SnapshotWriter;
use crate::Clock;
use crate::catalog::TestCatalog;
use crate::error::SessionError;
use crate::submission::{PendingSubmission, ResultSubmitter, SubmissionOutcome};

//
// ─── ATTEMPT ──────────────────────────────────────────────────────────────────
//

struct Attempt {
    test: Test,
    ledger: AnswerLedger,
    current: usize,
    countdown: Countdown,
    started_at: DateTime<Utc>,
}

impl Attempt {
    fn last_index(&self) -> usize {
        self.test.question_count().saturating_sub(1)
    }
}

/// A snapshot fits a test when every entry names an existing question and,
/// where it has a selection, an existing option of that question.
fn snapshot_fits(test: &Test, snapshot: &LedgerSnapshot) -> bool {
    snapshot.iter().all(|(index, answer)| {
        test.question(index).is_some_and(|q| {
            answer
                .selected()
                .is_none_or(|option| option < q.option_count())
        })
    })
}

//
// ─── CONTROLLER ───────────────────────────────────────────────────────────────
//

/// Drives one timed attempt at a test.
///
/// Owns the answer ledger, the current-question pointer and the countdown.
/// Every answer or bookmark change is published to a write-through snapshot
/// cache so an interrupted attempt can resume from the local session store.
pub struct SessionController {
    context: SessionContext,
    catalog: TestCatalog,
    local_sessions: Arc<dyn LocalSessionStore>,
    submitter: ResultSubmitter,
    clock: Clock,
    phase: SessionPhase,
    attempt: Option<Attempt>,
    writer: Option<SnapshotWriter>,
    finalised: Option<TestResult>,
    outcome: Option<SubmissionOutcome>,
}

impl SessionController {
    #[must_use]
    pub fn new(
        context: SessionContext,
        catalog: TestCatalog,
        local_sessions: Arc<dyn LocalSessionStore>,
        submitter: ResultSubmitter,
        clock: Clock,
    ) -> Self {
        Self {
            context,
            catalog,
            local_sessions,
            submitter,
            clock,
            phase: SessionPhase::Loading,
            attempt: None,
            writer: None,
            finalised: None,
            outcome: None,
        }
    }

    /// Resolve the test, restore any saved answers and start the countdown.
    ///
    /// Must be called from within a tokio runtime; it spawns the snapshot writer.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFound` (and enters `SessionPhase::NotFound`)
    /// when no source has the test, or `SessionError::AlreadyLoaded` if this
    /// controller already left `Loading`.
    pub async fn load(&mut self, test_id: &TestId) -> Result<SessionPhase, SessionError> {
        if self.phase != SessionPhase::Loading {
            return Err(SessionError::AlreadyLoaded);
        }

        let test = match self.catalog.resolve(test_id).await {
            Ok(test) => test,
            Err(err) => {
                warn!(test_id = %test_id, error = %err, "cannot start test");
                self.phase = SessionPhase::NotFound;
                return Err(err.into());
            }
        };

        let ledger = self.restore_ledger(&test).await;
        let countdown = Countdown::new(test.duration_secs()).on_expire({
            let id = test.id().clone();
            move || info!(test_id = %id, "time is up")
        });
        self.writer = Some(SnapshotWriter::spawn(
            Arc::clone(&self.local_sessions),
            test.id().clone(),
            ledger.snapshot(),
        ));

        info!(
            test_id = %test.id(),
            user_id = %self.context.user_id(),
            questions = test.question_count(),
            answered = ledger.answered_count(),
            "test started"
        );
        self.attempt = Some(Attempt {
            test,
            ledger,
            current: 0,
            countdown,
            started_at: self.clock.now(),
        });
        self.phase = SessionPhase::InProgress;
        Ok(self.phase)
    }

    async fn restore_ledger(&self, test: &Test) -> AnswerLedger {
        let count = test.question_count();
        let snapshot = match self.local_sessions.load(test.id()).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return AnswerLedger::new(count),
            Err(err) => {
                warn!(test_id = %test.id(), error = %err, "cannot read saved answers");
                return AnswerLedger::new(count);
            }
        };

        if !snapshot_fits(test, &snapshot) {
            warn!(test_id = %test.id(), "saved answers do not match the test; discarding");
            self.discard_saved(test.id()).await;
            return AnswerLedger::new(count);
        }
        match AnswerLedger::restore(count, &snapshot) {
            Ok(ledger) => {
                debug!(test_id = %test.id(), entries = snapshot.len(), "restored saved answers");
                ledger
            }
            Err(err) => {
                warn!(test_id = %test.id(), error = %err, "discarding saved answers");
                self.discard_saved(test.id()).await;
                AnswerLedger::new(count)
            }
        }
    }

    async fn discard_saved(&self, test_id: &TestId) {
        if let Err(err) = self.local_sessions.clear(test_id).await {
            warn!(test_id = %test_id, error = %err, "clearing discarded answers failed");
        }
    }

    // ─── Queries ───────────────────────────────────────────────────────────

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    #[must_use]
    pub fn test(&self) -> Option<&Test> {
        self.attempt.as_ref().map(|a| &a.test)
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.attempt.as_ref().map_or(0, |a| a.current)
    }

    #[must_use]
    pub fn question_view(&self, index: usize) -> Option<QuestionView<'_>> {
        let attempt = self.attempt.as_ref()?;
        let question = attempt.test.question(index)?;
        let answer = attempt.ledger.answer(index);
        Some(QuestionView {
            index,
            number: index + 1,
            question,
            answer,
            status: answer.status(),
        })
    }

    #[must_use]
    pub fn current_question(&self) -> Option<QuestionView<'_>> {
        self.question_view(self.current_index())
    }

    /// Status of every question in order, for the navigation panel.
    #[must_use]
    pub fn statuses(&self) -> Vec<QuestionStatus> {
        self.attempt.as_ref().map_or_else(Vec::new, |a| {
            (0..a.test.question_count())
                .map(|i| a.ledger.status(i))
                .collect()
        })
    }

    #[must_use]
    pub fn progress(&self) -> Option<SessionProgress> {
        let attempt = self.attempt.as_ref()?;
        Some(SessionProgress {
            total: attempt.test.question_count(),
            answered: attempt.ledger.answered_count(),
            remaining: attempt.ledger.remaining_count(),
            counts: attempt.ledger.counts(),
            current: attempt.current,
            is_complete: self.phase == SessionPhase::Completed,
        })
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u64 {
        self.attempt
            .as_ref()
            .map_or(0, |a| a.countdown.remaining_secs())
    }

    #[must_use]
    pub fn urgency(&self) -> Urgency {
        self.attempt
            .as_ref()
            .map_or(Urgency::Normal, |a| a.countdown.urgency())
    }

    /// Remaining time as `m:ss` or `h:mm:ss`.
    #[must_use]
    pub fn timer_display(&self) -> String {
        self.attempt
            .as_ref()
            .map_or_else(|| "0:00".to_owned(), |a| a.countdown.display())
    }

    /// The finalised result, once submission has started. After completion
    /// it carries the store-assigned id if persisting succeeded.
    #[must_use]
    pub fn result(&self) -> Option<&TestResult> {
        self.outcome
            .as_ref()
            .map(|o| &o.result)
            .or(self.finalised.as_ref())
    }

    #[must_use]
    pub fn outcome(&self) -> Option<&SubmissionOutcome> {
        self.outcome.as_ref()
    }

    // ─── Navigation ────────────────────────────────────────────────────────

    /// Jump to a question; out-of-range indices clamp to the last question.
    /// Returns the new current index.
    pub fn select_question(&mut self, index: usize) -> usize {
        let Some(attempt) = self.attempt.as_mut() else {
            return 0;
        };
        let last = attempt.last_index();
        if index > last {
            debug!(index, last, "clamping question index");
        }
        attempt.current = index.min(last);
        attempt.current
    }

    pub fn next(&mut self) -> usize {
        self.select_question(self.current_index().saturating_add(1))
    }

    pub fn previous(&mut self) -> usize {
        self.select_question(self.current_index().saturating_sub(1))
    }

    // ─── Answers ───────────────────────────────────────────────────────────

    fn accepts_answers(&self) -> bool {
        matches!(
            self.phase,
            SessionPhase::InProgress | SessionPhase::Submitting
        )
    }

    /// Select an option for the current question. Returns `None` when the
    /// change was ignored (invalid option or no active attempt).
    pub fn answer(&mut self, option: usize) -> Option<UserAnswer> {
        if !self.accepts_answers() {
            debug!(phase = ?self.phase, "ignoring answer");
            return None;
        }
        let attempt = self.attempt.as_mut()?;
        let index = attempt.current;
        let option_count = attempt.test.question(index)?.option_count();
        if option >= option_count {
            warn!(index, option, option_count, "ignoring invalid option");
            return None;
        }
        let updated = attempt.ledger.record_answer(index, option);
        self.after_mutation(updated)
    }

    /// Remove the selection on the current question, keeping its bookmark.
    pub fn clear_answer(&mut self) -> Option<UserAnswer> {
        if !self.accepts_answers() {
            debug!(phase = ?self.phase, "ignoring clear");
            return None;
        }
        let attempt = self.attempt.as_mut()?;
        let updated = attempt.ledger.clear_answer(attempt.current);
        self.after_mutation(updated)
    }

    /// Flip the bookmark on the current question, keeping its selection.
    pub fn toggle_bookmark(&mut self) -> Option<UserAnswer> {
        if !self.accepts_answers() {
            debug!(phase = ?self.phase, "ignoring bookmark");
            return None;
        }
        let attempt = self.attempt.as_mut()?;
        let updated = attempt.ledger.toggle_bookmark(attempt.current);
        self.after_mutation(updated)
    }

    fn after_mutation(&mut self, updated: Result<UserAnswer, LedgerError>) -> Option<UserAnswer> {
        match updated {
            Ok(answer) => {
                self.publish_snapshot();
                Some(answer)
            }
            Err(err) => {
                warn!(error = %err, "ledger rejected update");
                None
            }
        }
    }

    fn publish_snapshot(&self) {
        if let (Some(attempt), Some(writer)) = (&self.attempt, &self.writer) {
            writer.publish(attempt.ledger.snapshot());
        }
    }

    // ─── Timer ─────────────────────────────────────────────────────────────

    /// Advance the countdown by one second. On expiry the attempt is
    /// submitted immediately, without confirmation.
    pub async fn tick(&mut self) -> Tick {
        let Some(attempt) = self.attempt.as_mut() else {
            return Tick::Stopped;
        };
        let tick = attempt.countdown.tick();
        if tick == Tick::Expired {
            self.submit_with(SubmitTrigger::TimerExpired).await;
        }
        tick
    }

    // ─── Submission ────────────────────────────────────────────────────────

    /// Counts for the confirmation step.
    #[must_use]
    pub fn submission_preview(&self) -> Option<SubmissionPreview> {
        let attempt = self.attempt.as_ref()?;
        let counts = attempt.ledger.counts();
        Some(SubmissionPreview {
            total: attempt.test.question_count(),
            answered: attempt.ledger.answered_count(),
            remaining: attempt.ledger.remaining_count(),
            bookmarked: counts.bookmarked + counts.answered_bookmarked,
        })
    }

    /// Score the attempt and move to `Submitting`.
    ///
    /// Only the first call while `InProgress` does anything; later calls
    /// return `None`. The countdown is cancelled here.
    pub fn begin_submission(&mut self, trigger: SubmitTrigger) -> Option<PendingSubmission> {
        if self.phase != SessionPhase::InProgress {
            debug!(phase = ?self.phase, ?trigger, "submission already handled");
            return None;
        }
        let attempt = self.attempt.as_mut()?;
        attempt.countdown.cancel();

        let breakdown = score_attempt(
            attempt.test.questions(),
            &attempt.ledger,
            attempt.test.negative_marking(),
        );
        let submitted_at = self.clock.now();
        let result = TestResult::from_score(
            self.context.user_id().clone(),
            attempt.test.id().clone(),
            &breakdown,
            &attempt.ledger,
            elapsed_whole_secs(attempt.started_at, submitted_at),
            submitted_at,
        );

        info!(
            test_id = %attempt.test.id(),
            ?trigger,
            score = breakdown.score,
            correct = breakdown.correct,
            wrong = breakdown.wrong,
            skipped = breakdown.skipped,
            "submitting test"
        );
        self.phase = SessionPhase::Submitting;
        self.finalised = Some(result.clone());
        Some(PendingSubmission::new(result, self.submitter.clone()))
    }

    /// Record the persistence outcome and move to `Completed`.
    ///
    /// The outcome never blocks completion. Saved answers are flushed, then
    /// removed from the local session store only if the result was persisted.
    pub async fn complete(&mut self, outcome: SubmissionOutcome) -> SessionPhase {
        if self.phase != SessionPhase::Submitting {
            warn!(phase = ?self.phase, "no submission in flight");
            return self.phase;
        }

        if let Some(writer) = self.writer.take() {
            writer.close().await;
        }
        if outcome.persisted {
            if let Some(attempt) = &self.attempt {
                if let Err(err) = self.local_sessions.clear(attempt.test.id()).await {
                    warn!(test_id = %attempt.test.id(), error = %err, "clearing saved answers failed");
                }
            }
        }

        self.outcome = Some(outcome);
        self.phase = SessionPhase::Completed;
        self.phase
    }

    /// Submit on the learner's request, after confirmation.
    pub async fn submit(&mut self) -> SessionPhase {
        self.submit_with(SubmitTrigger::Manual).await
    }

    async fn submit_with(&mut self, trigger: SubmitTrigger) -> SessionPhase {
        let Some(pending) = self.begin_submission(trigger) else {
            return self.phase;
        };
        let outcome = pending.persist().await;
        self.complete(outcome).await
    }

    /// Leave the attempt without submitting.
    ///
    /// Stops the countdown and waits for the latest answers to be saved, so
    /// the next `load` of the same test resumes them.
    pub async fn abandon(mut self) {
        if let Some(attempt) = self.attempt.as_mut() {
            attempt.countdown.cancel();
            info!(test_id = %attempt.test.id(), "test abandoned");
        }
        if let Some(writer) = self.writer.take() {
            writer.close().await;
        }
    }
}
