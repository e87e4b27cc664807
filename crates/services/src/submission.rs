use std::sync::Arc;

use exam_core::model::TestResult;
use storage::repository::ResultRepository;
use tracing::{info, warn};

/// What happened to a finalised result on its way to the result store.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionOutcome {
    /// Carries the assigned id when `persisted` is true.
    pub result: TestResult,
    pub persisted: bool,
}

/// Hands finalised results to the result store, at most once and without retry.
#[derive(Clone)]
pub struct ResultSubmitter {
    results: Arc<dyn ResultRepository>,
}

impl ResultSubmitter {
    #[must_use]
    pub fn new(results: Arc<dyn ResultRepository>) -> Self {
        Self { results }
    }

    /// Persist a result. A store failure is logged and reported through
    /// `SubmissionOutcome::persisted`, never as an error.
    pub async fn submit(&self, result: TestResult) -> SubmissionOutcome {
        match self.results.create_result(&result).await {
            Ok(id) => {
                info!(result_id = %id, test_id = %result.test_id(), "result saved");
                SubmissionOutcome {
                    result: result.with_id(id),
                    persisted: true,
                }
            }
            Err(err) => {
                warn!(test_id = %result.test_id(), error = %err, "saving result failed");
                SubmissionOutcome {
                    result,
                    persisted: false,
                }
            }
        }
    }
}

/// A scored result waiting to be persisted.
///
/// Produced when a session starts submitting; persisting it does not borrow
/// the session, so the caller decides where the storage round trip runs.
#[must_use]
pub struct PendingSubmission {
    result: TestResult,
    submitter: ResultSubmitter,
}

impl PendingSubmission {
    pub(crate) fn new(result: TestResult, submitter: ResultSubmitter) -> Self {
        Self { result, submitter }
    }

    pub fn result(&self) -> &TestResult {
        &self.result
    }

    pub async fn persist(self) -> SubmissionOutcome {
        self.submitter.submit(self.result).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use exam_core::model::{ResultId, TestId, UserId};
    use exam_core::time::fixed_now;
    use std::collections::BTreeMap;
    use storage::repository::{InMemoryRepository, StorageError};

    struct RejectingStore;

    #[async_trait]
    impl ResultRepository for RejectingStore {
        async fn create_result(&self, _result: &TestResult) -> Result<ResultId, StorageError> {
            Err(StorageError::Connection("quota exceeded".into()))
        }
        async fn list_results_for_user(
            &self,
            _user_id: &UserId,
            _limit: u32,
        ) -> Result<Vec<TestResult>, StorageError> {
            Ok(Vec::new())
        }
    }

    fn result() -> TestResult {
        TestResult::from_persisted(
            None,
            UserId::new("u"),
            TestId::new("t"),
            40.0,
            5,
            2,
            0,
            3,
            30,
            BTreeMap::new(),
            fixed_now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn successful_submit_assigns_id() {
        let submitter = ResultSubmitter::new(Arc::new(InMemoryRepository::new()));
        let outcome = submitter.submit(result()).await;
        assert!(outcome.persisted);
        assert_eq!(outcome.result.id(), Some(ResultId::new(1)));
    }

    #[tokio::test]
    async fn failed_submit_keeps_result_without_id() {
        let submitter = ResultSubmitter::new(Arc::new(RejectingStore));
        let outcome = submitter.submit(result()).await;
        assert!(!outcome.persisted);
        assert_eq!(outcome.result, result());
    }
}
