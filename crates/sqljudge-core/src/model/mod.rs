//! Submission model and verdict vocabulary.

pub mod restriction;
pub mod selection;
pub mod submission;

pub use restriction::{Restriction, RestrictionKind};
pub use selection::SelectionInfo;
pub use submission::{CheckerContext, Submission, Verdict};
