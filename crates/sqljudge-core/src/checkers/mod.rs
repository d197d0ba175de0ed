//! Stage-specific checks applied to not-yet-checked submissions.

pub mod normalize;
pub mod restriction;
pub mod selection;

use crate::model::Submission;

pub use normalize::normalize_query;
pub use restriction::RestrictionChecker;
pub use selection::SelectionChecker;

/// A check run by one pipeline stage.
///
/// Implementations never fail: errors are logged and reflected in the
/// returned submission (left pending or marked `ExecutionError`).
pub trait Checker: Send + Sync + 'static {
    /// Stage name used in logs.
    fn kind(&self) -> &'static str;

    /// Called only with submissions whose status is `PendingCheck`.
    fn check(&self, submission: Submission) -> Submission;
}
