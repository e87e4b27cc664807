#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog;
pub mod error;
pub mod history;
pub mod sessions;
pub mod submission;

pub use exam_core::Clock;

pub use app_services::AppServices;
pub use catalog::TestCatalog;
pub use error::{AppServicesError, CatalogError, HistoryError, SessionError};
pub use history::{DashboardStats, RECENT_WINDOW, ResultHistoryService};
pub use sessions::{
    QuestionView, SessionContext, SessionController, SessionPhase, SessionProgress,
    SubmissionPreview, SubmitTrigger,
};
pub use submission::{PendingSubmission, ResultSubmitter, SubmissionOutcome};
