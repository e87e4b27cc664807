use std::sync::Arc;

use exam_core::model::{Test, TestId};
use storage::BuiltinCatalog;
use storage::repository::TestRepository;
use tracing::{debug, info, warn};

use crate::error::CatalogError;

/// Resolves tests from the primary store, falling back to the built-in catalog.
#[derive(Clone)]
pub struct TestCatalog {
    primary: Arc<dyn TestRepository>,
    builtin: Arc<BuiltinCatalog>,
}

impl TestCatalog {
    #[must_use]
    pub fn new(primary: Arc<dyn TestRepository>, builtin: Arc<BuiltinCatalog>) -> Self {
        Self { primary, builtin }
    }

    /// Look a test up by id.
    ///
    /// A store error is logged and treated like a miss, so the built-in
    /// catalog is always consulted before giving up.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` when neither source has the test.
    pub async fn resolve(&self, id: &TestId) -> Result<Test, CatalogError> {
        match self.primary.get_test(id).await {
            Ok(Some(test)) => return Ok(test),
            Ok(None) => debug!(test_id = %id, "test not in primary store"),
            Err(err) => warn!(test_id = %id, error = %err, "primary test store unavailable"),
        }

        self.builtin
            .find(id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.clone()))
    }

    /// Available tests, newest first.
    ///
    /// Falls back to the built-in catalog when the store fails or is empty.
    pub async fn list_tests(&self) -> Vec<Test> {
        match self.primary.list_tests().await {
            Ok(tests) if !tests.is_empty() => tests,
            Ok(_) => self.builtin.tests().to_vec(),
            Err(err) => {
                warn!(error = %err, "listing tests failed; using built-in catalog");
                self.builtin.tests().to_vec()
            }
        }
    }

    /// Copy the built-in catalog into the primary store if it has no tests.
    ///
    /// Returns the number of tests inserted.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if the store cannot be counted or written.
    pub async fn seed_if_empty(&self) -> Result<usize, CatalogError> {
        if self.primary.count_tests().await? > 0 {
            return Ok(0);
        }
        for test in self.builtin.tests() {
            self.primary.upsert_test(test).await?;
        }
        let inserted = self.builtin.tests().len();
        info!(inserted, "seeded primary store with built-in tests");
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use storage::repository::{InMemoryRepository, StorageError};

    struct UnreachableStore;

    #[async_trait]
    impl TestRepository for UnreachableStore {
        async fn get_test(&self, _id: &TestId) -> Result<Option<Test>, StorageError> {
            Err(StorageError::Connection("offline".into()))
        }
        async fn list_tests(&self) -> Result<Vec<Test>, StorageError> {
            Err(StorageError::Connection("offline".into()))
        }
        async fn upsert_test(&self, _test: &Test) -> Result<(), StorageError> {
            Err(StorageError::Connection("offline".into()))
        }
        async fn count_tests(&self) -> Result<u64, StorageError> {
            Err(StorageError::Connection("offline".into()))
        }
    }

    fn builtin() -> Arc<BuiltinCatalog> {
        Arc::new(BuiltinCatalog::load().unwrap())
    }

    #[tokio::test]
    async fn falls_back_to_builtin_when_store_fails() {
        let catalog = TestCatalog::new(Arc::new(UnreachableStore), builtin());
        let test = catalog
            .resolve(&TestId::new("upsc-history-ancient-1"))
            .await
            .unwrap();
        assert_eq!(test.duration_minutes(), 90);
        assert_eq!(catalog.list_tests().await.len(), 6);
    }

    #[tokio::test]
    async fn unknown_test_is_not_found() {
        let catalog = TestCatalog::new(Arc::new(InMemoryRepository::new()), builtin());
        let err = catalog.resolve(&TestId::new("nope")).await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(id) if id.as_str() == "nope"));
    }

    #[tokio::test]
    async fn primary_store_wins_once_seeded() {
        let repo = InMemoryRepository::new();
        let catalog = TestCatalog::new(Arc::new(repo.clone()), builtin());

        assert_eq!(catalog.list_tests().await.len(), 6);
        assert_eq!(catalog.seed_if_empty().await.unwrap(), 6);
        assert_eq!(catalog.seed_if_empty().await.unwrap(), 0);
        assert_eq!(repo.count_tests().await.unwrap(), 6);

        let listed = catalog.list_tests().await;
        assert_eq!(listed[0].id().as_str(), "jee-physics-mechanics-1");
    }

    #[tokio::test]
    async fn seeding_surfaces_store_errors() {
        let catalog = TestCatalog::new(Arc::new(UnreachableStore), builtin());
        assert!(matches!(
            catalog.seed_if_empty().await,
            Err(CatalogError::Storage(_))
        ));
    }
}
