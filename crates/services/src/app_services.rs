use std::sync::Arc;

use exam_core::model::UserId;
use storage::BuiltinCatalog;
use storage::repository::{LocalSessionStore, Storage};

use crate::Clock;
use crate::catalog::TestCatalog;
use crate::error::AppServicesError;
use crate::history::ResultHistoryService;
use crate::sessions::{SessionContext, SessionController};
use crate::submission::ResultSubmitter;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    catalog: TestCatalog,
    history: ResultHistoryService,
    submitter: ResultSubmitter,
    local_sessions: Arc<dyn LocalSessionStore>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialisation fails or the
    /// built-in catalog cannot be parsed.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::from_storage(storage, clock)
    }

    /// # Errors
    ///
    /// Returns `AppServicesError::Storage` if the built-in catalog cannot be parsed.
    pub fn in_memory(clock: Clock) -> Result<Self, AppServicesError> {
        Self::from_storage(Storage::in_memory(), clock)
    }

    /// # Errors
    ///
    /// Returns `AppServicesError::Storage` if the built-in catalog cannot be parsed.
    pub fn from_storage(storage: Storage, clock: Clock) -> Result<Self, AppServicesError> {
        let builtin = Arc::new(BuiltinCatalog::load()?);
        Ok(Self {
            clock,
            catalog: TestCatalog::new(Arc::clone(&storage.tests), builtin),
            history: ResultHistoryService::new(clock, Arc::clone(&storage.results)),
            submitter: ResultSubmitter::new(Arc::clone(&storage.results)),
            local_sessions: Arc::clone(&storage.local_sessions),
        })
    }

    #[must_use]
    pub fn catalog(&self) -> &TestCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn history(&self) -> &ResultHistoryService {
        &self.history
    }

    #[must_use]
    pub fn submitter(&self) -> &ResultSubmitter {
        &self.submitter
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// A fresh controller in `Loading` for the given user.
    #[must_use]
    pub fn new_session(&self, user_id: UserId) -> SessionController {
        SessionController::new(
            SessionContext::new(user_id),
            self.catalog.clone(),
            Arc::clone(&self.local_sessions),
            self.submitter.clone(),
            self.clock,
        )
    }
}
