use super::normalize::normalize_query;
use super::Checker;
use crate::errors::CheckerError;
use crate::model::{CheckerContext, SelectionInfo, Submission, Verdict};
use crate::storage::{JudgeStore, QueryCatalog, SelectionRunner};
use std::sync::Arc;
use tracing::{debug, error};

/// Compares the result of a submitted query with the reference solution.
///
/// Column shape is checked first (when enabled) and a mismatch there
/// suppresses the content comparison.
pub struct SelectionChecker {
    store: Arc<dyn JudgeStore>,
    runner: Arc<dyn SelectionRunner>,
    catalog: Arc<QueryCatalog>,
}

/// Outcome of one comparison: verdict plus an optional diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Judgement {
    pub verdict: Verdict,
    pub message: Option<String>,
}

impl Judgement {
    fn of(verdict: Verdict) -> Self {
        Self {
            verdict,
            message: None,
        }
    }

    fn with_message(verdict: Verdict, message: String) -> Self {
        Self {
            verdict,
            message: Some(message),
        }
    }
}

impl SelectionChecker {
    pub fn new(
        store: Arc<dyn JudgeStore>,
        runner: Arc<dyn SelectionRunner>,
        catalog: Arc<QueryCatalog>,
    ) -> Self {
        Self {
            store,
            runner,
            catalog,
        }
    }

    /// Fetch metadata and schema list; the reference comes back normalized.
    pub fn fetch_info(&self, submission_id: i64) -> Result<SelectionInfo, CheckerError> {
        let mut info = self
            .store
            .fetch_selection_info(submission_id)
            .map_err(|e| CheckerError::fetch("selection info", e))?;
        info.schemas = self
            .store
            .fetch_selection_schemas(submission_id)
            .map_err(|e| CheckerError::fetch("selection schemas", e))?;
        info.reference_solution = normalize_query(&info.reference_solution);
        Ok(info)
    }

    /// `None` when the column shapes agree.
    pub fn check_columns(
        &self,
        info: &SelectionInfo,
        solution: &str,
    ) -> Result<Option<Judgement>, CheckerError> {
        let got = self.runner.column_names(&info.default_schema, solution)?;
        let expected = self
            .runner
            .column_names(&info.default_schema, &info.reference_solution)?;

        if got.len() != expected.len() {
            return Ok(Some(Judgement::with_message(
                Verdict::IncorrectColumnCount,
                format!("expected {} columns, got {}", expected.len(), got.len()),
            )));
        }

        let mismatch = got
            .iter()
            .zip(expected.iter())
            .enumerate()
            .find(|(_, (g, e))| g != e);
        if let Some((pos, (g, e))) = mismatch {
            return Ok(Some(Judgement::with_message(
                Verdict::IncorrectColumnNames,
                format!("column {}: expected {:?}, got {:?}", pos + 1, e, g),
            )));
        }

        Ok(None)
    }

    pub fn check_content(&self, info: &SelectionInfo, solution: &str) -> Result<Judgement, CheckerError> {
        let query = self
            .catalog
            .difference(info.check_order, solution, &info.reference_solution);
        if !self.runner.has_rows(&info.default_schema, &query)? {
            return Ok(Judgement::of(Verdict::Accepted));
        }
        Ok(Judgement::of(if info.check_order {
            Verdict::IncorrectOrder
        } else {
            Verdict::IncorrectContent
        }))
    }

    /// Compare a normalized solution against `info`'s reference.
    pub fn judge(&self, info: &SelectionInfo, solution: &str) -> Result<Judgement, CheckerError> {
        if info.check_column_names {
            if let Some(judgement) = self.check_columns(info, solution)? {
                return Ok(judgement);
            }
        }
        self.check_content(info, solution)
    }
}

impl Checker for SelectionChecker {
    fn kind(&self) -> &'static str {
        "selection"
    }

    fn check(&self, mut submission: Submission) -> Submission {
        match self.fetch_info(submission.id) {
            Ok(info) => {
                debug!(
                    submission_id = submission.id,
                    schema = %info.default_schema,
                    schemas = ?info.schemas,
                    check_order = info.check_order,
                    check_column_names = info.check_column_names,
                    "fetched selection info"
                );
                submission.context = CheckerContext::Selection(info);
            }
            Err(err) => {
                submission.put_checker_error(&err);
                error!(submission_id = submission.id, error = %err, "failed to fetch selection checker info");
                return submission;
            }
        }

        let solution = normalize_query(&submission.solution);
        let outcome = submission
            .context
            .selection()
            .and_then(|info| self.judge(info, &solution));

        match outcome {
            Ok(judgement) => {
                submission.status = judgement.verdict;
                if let Some(message) = judgement.message {
                    submission.checker_message = message;
                }
            }
            Err(err) => {
                submission.put_checker_error(&err);
                error!(submission_id = submission.id, error = %err, "failed to check selection solution");
            }
        }

        submission
    }
}
