use async_trait::async_trait;
use exam_core::model::{LedgerSnapshot, ResultId, Test, TestId, TestResult, UserId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub use crate::record::{AnswerRecord, LedgerRecord, QuestionRecord, ResultRecord, TestRecord};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Source of test definitions.
#[async_trait]
pub trait TestRepository: Send + Sync {
    /// Fetch a test by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read. A missing test is
    /// `Ok(None)`.
    async fn get_test(&self, id: &TestId) -> Result<Option<Test>, StorageError>;

    /// All tests, newest first by creation time.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn list_tests(&self) -> Result<Vec<Test>, StorageError>;

    /// Persist or replace a test.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the test cannot be stored, or
    /// `StorageError::Conflict` for read-only sources.
    async fn upsert_test(&self, test: &Test) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn count_tests(&self) -> Result<u64, StorageError>;
}

/// Store of finalised attempts.
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// Append a result and return the identifier assigned to it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the result cannot be stored.
    async fn create_result(&self, result: &TestResult) -> Result<ResultId, StorageError>;

    /// Most recent results for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if results cannot be read.
    async fn list_results_for_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<TestResult>, StorageError>;
}

/// Device-local store of in-progress answers, one snapshot per test.
#[async_trait]
pub trait LocalSessionStore: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be written.
    async fn save(&self, test_id: &TestId, snapshot: &LedgerSnapshot) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the stored snapshot cannot be read or decoded.
    async fn load(&self, test_id: &TestId) -> Result<Option<LedgerSnapshot>, StorageError>;

    /// Remove the snapshot for a test. Clearing a missing snapshot is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be written.
    async fn clear(&self, test_id: &TestId) -> Result<(), StorageError>;
}

pub(crate) fn newest_first(tests: &mut [Test]) {
    tests.sort_by(|a, b| {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| a.id().cmp(b.id()))
    });
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    tests: Arc<Mutex<HashMap<TestId, Test>>>,
    results: Arc<Mutex<Vec<TestResult>>>,
    sessions: Arc<Mutex<HashMap<TestId, LedgerSnapshot>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl TestRepository for InMemoryRepository {
    async fn get_test(&self, id: &TestId) -> Result<Option<Test>, StorageError> {
        let guard = self.tests.lock().map_err(poisoned)?;
        Ok(guard.get(id).cloned())
    }

    async fn list_tests(&self) -> Result<Vec<Test>, StorageError> {
        let guard = self.tests.lock().map_err(poisoned)?;
        let mut tests: Vec<Test> = guard.values().cloned().collect();
        newest_first(&mut tests);
        Ok(tests)
    }

    async fn upsert_test(&self, test: &Test) -> Result<(), StorageError> {
        let mut guard = self.tests.lock().map_err(poisoned)?;
        guard.insert(test.id().clone(), test.clone());
        Ok(())
    }

    async fn count_tests(&self) -> Result<u64, StorageError> {
        let guard = self.tests.lock().map_err(poisoned)?;
        Ok(guard.len() as u64)
    }
}

#[async_trait]
impl ResultRepository for InMemoryRepository {
    async fn create_result(&self, result: &TestResult) -> Result<ResultId, StorageError> {
        let mut guard = self.results.lock().map_err(poisoned)?;
        let id = ResultId::new(guard.len() as u64 + 1);
        guard.push(result.clone().with_id(id));
        Ok(id)
    }

    async fn list_results_for_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<TestResult>, StorageError> {
        let guard = self.results.lock().map_err(poisoned)?;
        let mut found: Vec<TestResult> = guard
            .iter()
            .filter(|r| r.user_id() == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.submitted_at()
                .cmp(&a.submitted_at())
                .then_with(|| b.id().cmp(&a.id()))
        });
        found.truncate(limit as usize);
        Ok(found)
    }
}

#[async_trait]
impl LocalSessionStore for InMemoryRepository {
    async fn save(&self, test_id: &TestId, snapshot: &LedgerSnapshot) -> Result<(), StorageError> {
        let mut guard = self.sessions.lock().map_err(poisoned)?;
        guard.insert(test_id.clone(), snapshot.clone());
        Ok(())
    }

    async fn load(&self, test_id: &TestId) -> Result<Option<LedgerSnapshot>, StorageError> {
        let guard = self.sessions.lock().map_err(poisoned)?;
        Ok(guard.get(test_id).cloned())
    }

    async fn clear(&self, test_id: &TestId) -> Result<(), StorageError> {
        let mut guard = self.sessions.lock().map_err(poisoned)?;
        guard.remove(test_id);
        Ok(())
    }
}

/// Aggregates the stores behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub tests: Arc<dyn TestRepository>,
    pub results: Arc<dyn ResultRepository>,
    pub local_sessions: Arc<dyn LocalSessionStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let tests: Arc<dyn TestRepository> = Arc::new(repo.clone());
        let results: Arc<dyn ResultRepository> = Arc::new(repo.clone());
        let local_sessions: Arc<dyn LocalSessionStore> = Arc::new(repo);
        Self {
            tests,
            results,
            local_sessions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use exam_core::model::{AnswerLedger, ExamCategory, Question, QuestionId};
    use exam_core::scoring::score_attempt;
    use exam_core::time::fixed_now;

    fn build_test(id: &str, age_days: i64) -> Test {
        let q = Question::new(
            QuestionId::new(format!("{id}-q1")),
            "Q",
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            2,
            "",
            "NEET",
            "Genetics",
        )
        .unwrap();
        Test::new(
            TestId::new(id),
            format!("Test {id}"),
            ExamCategory::Neet,
            "Genetics",
            vec![q],
            30,
            100,
            true,
            fixed_now() - Duration::days(age_days),
        )
        .unwrap()
    }

    fn build_result(user: &str, test: &Test, minutes_ago: i64) -> TestResult {
        let mut ledger = AnswerLedger::new(test.question_count());
        ledger.record_answer(0, 2).unwrap();
        let score = score_attempt(test.questions(), &ledger, test.negative_marking());
        TestResult::from_score(
            UserId::new(user),
            test.id().clone(),
            &score,
            &ledger,
            60,
            fixed_now() - Duration::minutes(minutes_ago),
        )
    }

    #[tokio::test]
    async fn lists_tests_newest_first() {
        let repo = InMemoryRepository::new();
        repo.upsert_test(&build_test("old", 10)).await.unwrap();
        repo.upsert_test(&build_test("new", 1)).await.unwrap();
        repo.upsert_test(&build_test("mid", 5)).await.unwrap();

        let ids: Vec<String> = repo
            .list_tests()
            .await
            .unwrap()
            .iter()
            .map(|t| t.id().to_string())
            .collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
        assert_eq!(repo.count_tests().await.unwrap(), 3);
        assert!(repo.get_test(&TestId::new("nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn assigns_result_ids_and_filters_by_user() {
        let repo = InMemoryRepository::new();
        let test = build_test("t", 0);
        let first = repo.create_result(&build_result("u1", &test, 30)).await.unwrap();
        let second = repo.create_result(&build_result("u1", &test, 5)).await.unwrap();
        repo.create_result(&build_result("u2", &test, 1)).await.unwrap();
        assert_ne!(first, second);

        let results = repo
            .list_results_for_user(&UserId::new("u1"), 5)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id(), Some(second));
        assert_eq!(results[1].id(), Some(first));

        let limited = repo
            .list_results_for_user(&UserId::new("u1"), 1)
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn local_sessions_save_load_clear() {
        let repo = InMemoryRepository::new();
        let id = TestId::new("t");
        let mut ledger = AnswerLedger::new(2);
        ledger.toggle_bookmark(1).unwrap();

        repo.save(&id, &ledger.snapshot()).await.unwrap();
        assert_eq!(repo.load(&id).await.unwrap(), Some(ledger.snapshot()));

        repo.clear(&id).await.unwrap();
        assert_eq!(repo.load(&id).await.unwrap(), None);
        repo.clear(&id).await.unwrap();
    }

    #[tokio::test]
    async fn storage_aggregate_shares_one_backend() {
        let storage = Storage::in_memory();
        storage.tests.upsert_test(&build_test("t", 0)).await.unwrap();
        assert_eq!(storage.tests.count_tests().await.unwrap(), 1);

        let snapshot = LedgerSnapshot::new();
        storage
            .local_sessions
            .save(&TestId::new("t"), &snapshot)
            .await
            .unwrap();
        assert!(
            storage
                .local_sessions
                .load(&TestId::new("t"))
                .await
                .unwrap()
                .is_some()
        );
    }
}
