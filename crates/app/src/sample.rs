use chrono::{DateTime, Duration, Utc};
use exam_core::model::{AnswerLedger, LedgerError, Test, TestResult, UserId};
use exam_core::score_attempt;
use services::AppServices;
use tracing::info;

/// A finished attempt at `test` answering the first `seq % n + 1` questions,
/// alternating correct and wrong picks.
fn sample_result(
    test: &Test,
    user_id: &UserId,
    seq: usize,
    submitted_at: DateTime<Utc>,
) -> Result<TestResult, LedgerError> {
    let mut ledger = AnswerLedger::new(test.question_count());
    let attempted = seq % test.question_count().max(1) + 1;
    for (index, question) in test.questions().iter().enumerate().take(attempted) {
        let correct = question.correct_option();
        let option = if index % 2 == 0 {
            correct
        } else {
            (correct + 1) % question.option_count()
        };
        ledger.record_answer(index, option)?;
    }
    let score = score_attempt(test.questions(), &ledger, test.negative_marking());
    Ok(TestResult::from_score(
        user_id.clone(),
        test.id().clone(),
        &score,
        &ledger,
        test.duration_secs() / 2,
        submitted_at,
    ))
}

/// Store `count` sample results for `user_id`, one day apart, cycling
/// through the available tests. Returns how many were persisted.
pub async fn add_sample_results(
    services: &AppServices,
    user_id: &UserId,
    count: usize,
) -> anyhow::Result<usize> {
    let tests = services.catalog().list_tests().await;
    let now = services.clock().now();
    let mut persisted = 0;

    for (seq, test) in tests.iter().cycle().take(count).enumerate() {
        let days_ago = i64::try_from(seq)?;
        let submitted_at = now - Duration::days(days_ago) - Duration::hours(1);
        let result = sample_result(test, user_id, seq, submitted_at)?;
        if services.submitter().submit(result).await.persisted {
            persisted += 1;
        }
    }
    info!(requested = count, persisted, user_id = %user_id, "added sample results");
    Ok(persisted)
}
