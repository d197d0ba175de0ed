use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors. All of them are fatal at construction time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unsupported configuration file format: {0:?}")]
    UnsupportedFormat(String),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {field}: {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by the database layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] rusqlite::Error),

    #[error("invalid row: {0}")]
    Decode(String),

    #[error("statement is not a query")]
    NotAQuery,

    #[error("submission {0} not found")]
    MissingSubmission(i64),

    #[error("connection lock poisoned")]
    Poisoned,
}

/// Errors raised while a checker processes one submission.
///
/// None of these stop the pipeline; the stage decides whether the error
/// leaves the submission pending or turns it into `ExecutionError`.
#[derive(Debug, Error)]
pub enum CheckerError {
    #[error("failed to fetch {what}: {source}")]
    Fetch {
        what: &'static str,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Execution(#[from] StoreError),

    #[error("unsupported restriction kind \"{kind}\"")]
    UnsupportedRestriction { kind: String },

    #[error("invalid restriction pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid checker context: expected {expected}, found {found}")]
    ContextMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("unknown selection schema \"{0}\"")]
    UnknownSchema(String),
}

impl CheckerError {
    pub fn fetch(what: &'static str, source: StoreError) -> Self {
        Self::Fetch { what, source }
    }
}
