#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod scoring;
pub mod time;
pub mod timer;

pub use error::Error;
pub use scoring::{ScoreBreakdown, score_attempt};
pub use time::Clock;
pub use timer::{Countdown, Tick, Urgency};
