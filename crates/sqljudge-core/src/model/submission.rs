use super::restriction::Restriction;
use super::selection::SelectionInfo;
use crate::errors::CheckerError;
use std::fmt;

/// Outcome of checking a submission.
///
/// The discriminants are the persisted `status_id` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Verdict {
    Unknown = 0,
    PendingCheck = 1,
    Accepted = 2,
    ExecutionError = 3,
    RestrictionViolated = 4,
    IncorrectColumnCount = 5,
    IncorrectColumnNames = 6,
    IncorrectContent = 7,
    IncorrectOrder = 8,
}

impl Verdict {
    pub const ALL: [Verdict; 9] = [
        Verdict::Unknown,
        Verdict::PendingCheck,
        Verdict::Accepted,
        Verdict::ExecutionError,
        Verdict::RestrictionViolated,
        Verdict::IncorrectColumnCount,
        Verdict::IncorrectColumnNames,
        Verdict::IncorrectContent,
        Verdict::IncorrectOrder,
    ];

    pub fn id(self) -> i64 {
        self as i64
    }

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.id() == id)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Unknown => "unknown",
            Verdict::PendingCheck => "pending_check",
            Verdict::Accepted => "accepted",
            Verdict::ExecutionError => "execution_error",
            Verdict::RestrictionViolated => "restriction_violated",
            Verdict::IncorrectColumnCount => "incorrect_column_count",
            Verdict::IncorrectColumnNames => "incorrect_column_names",
            Verdict::IncorrectContent => "incorrect_content",
            Verdict::IncorrectOrder => "incorrect_order",
        }
    }

    /// Every value except `PendingCheck` is final.
    pub fn is_terminal(self) -> bool {
        self != Verdict::PendingCheck
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage-private payload attached while a checker works on a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CheckerContext {
    #[default]
    None,
    Restrictions(Vec<Restriction>),
    Selection(SelectionInfo),
}

impl CheckerContext {
    pub fn name(&self) -> &'static str {
        match self {
            CheckerContext::None => "none",
            CheckerContext::Restrictions(_) => "restrictions",
            CheckerContext::Selection(_) => "selection",
        }
    }

    pub fn restrictions(&self) -> Result<&[Restriction], CheckerError> {
        match self {
            CheckerContext::Restrictions(rules) => Ok(rules),
            other => Err(CheckerError::ContextMismatch {
                expected: "restrictions",
                found: other.name(),
            }),
        }
    }

    pub fn selection(&self) -> Result<&SelectionInfo, CheckerError> {
        match self {
            CheckerContext::Selection(info) => Ok(info),
            other => Err(CheckerError::ContextMismatch {
                expected: "selection",
                found: other.name(),
            }),
        }
    }
}

/// One stored SQL answer travelling through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub id: i64,
    pub status: Verdict,
    pub solution: String,
    pub checker_message: String,
    pub context: CheckerContext,
}

impl Submission {
    pub fn pending(id: i64, solution: impl Into<String>) -> Self {
        Self {
            id,
            status: Verdict::PendingCheck,
            solution: solution.into(),
            checker_message: String::new(),
            context: CheckerContext::None,
        }
    }

    pub fn is_checked(&self) -> bool {
        self.status.is_terminal()
    }

    /// Marks the submission as failed by the checker itself.
    pub fn put_checker_error(&mut self, err: &dyn std::error::Error) {
        self.status = Verdict::ExecutionError;
        self.checker_message = format!("checker error: {}", err);
    }
}
