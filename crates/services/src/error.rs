//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::TestId;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `TestCatalog`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("test {0} not found")]
    NotFound(TestId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the session controller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("test {0} not found")]
    NotFound(TestId),
    #[error("a test is already loaded in this session")]
    AlreadyLoaded,
    #[error(transparent)]
    Catalog(CatalogError),
}

impl From<CatalogError> for SessionError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(id) => SessionError::NotFound(id),
            other => SessionError::Catalog(other),
        }
    }
}

/// Errors emitted by `ResultHistoryService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HistoryError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
