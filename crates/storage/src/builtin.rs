use async_trait::async_trait;
use exam_core::model::{Test, TestId};

use crate::record::TestRecord;
use crate::repository::{StorageError, TestRepository, newest_first};

const BUILTIN_TESTS_JSON: &str = include_str!("../data/builtin_tests.json");

/// Read-only catalog of practice tests shipped with the binary.
///
/// Used as the fallback source when the primary store is unreachable or has
/// no tests, and as the seed set for an empty store.
#[derive(Debug, Clone)]
pub struct BuiltinCatalog {
    tests: Vec<Test>,
}

impl BuiltinCatalog {
    /// Parse the embedded catalog.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the embedded JSON is malformed
    /// or any test fails validation.
    pub fn load() -> Result<Self, StorageError> {
        Self::from_json(BUILTIN_TESTS_JSON)
    }

    /// Parse a catalog from a JSON array of test documents.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` on malformed or invalid input.
    pub fn from_json(json: &str) -> Result<Self, StorageError> {
        let records: Vec<TestRecord> = serde_json::from_str(json)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let mut tests = records
            .into_iter()
            .map(|r| {
                let id = r.id.clone();
                r.into_test()
                    .map_err(|e| StorageError::Serialization(format!("test {id}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        newest_first(&mut tests);
        Ok(Self { tests })
    }

    /// Tests newest first.
    #[must_use]
    pub fn tests(&self) -> &[Test] {
        &self.tests
    }

    #[must_use]
    pub fn find(&self, id: &TestId) -> Option<&Test> {
        self.tests.iter().find(|t| t.id() == id)
    }
}

#[async_trait]
impl TestRepository for BuiltinCatalog {
    async fn get_test(&self, id: &TestId) -> Result<Option<Test>, StorageError> {
        Ok(self.find(id).cloned())
    }

    async fn list_tests(&self) -> Result<Vec<Test>, StorageError> {
        Ok(self.tests.clone())
    }

    async fn upsert_test(&self, _test: &Test) -> Result<(), StorageError> {
        Err(StorageError::Conflict)
    }

    async fn count_tests(&self) -> Result<u64, StorageError> {
        Ok(self.tests.len() as u64)
    }
}
