//! sqljudge - automated grading of stored SQL submissions.
//!
//! Pending submissions are polled from the main database, screened by the
//! restriction checker, compared against a reference query by the selection
//! checker, and their verdicts written back.

pub mod checkers;
pub mod config;
pub mod engine;
pub mod errors;
pub mod model;
pub mod storage;

pub use config::{load_config, Config};
pub use engine::{Pipeline, RunSummary, StopHandle};
pub use model::{Submission, Verdict};
