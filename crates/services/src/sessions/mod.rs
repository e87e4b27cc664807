mod controller;
mod phase;
mod progress;
mod view;
mod writer;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use controller::SessionController;
pub use phase::{SessionContext, SessionPhase, SubmitTrigger};
pub use progress::SessionProgress;
pub use view::{QuestionView, SubmissionPreview};
