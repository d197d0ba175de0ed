use super::Checker;
use crate::errors::CheckerError;
use crate::model::{CheckerContext, Restriction, RestrictionKind, Submission, Verdict};
use crate::storage::JudgeStore;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, error};

/// Rejects solutions that contain forbidden keywords or match forbidden
/// patterns. Never accepts anything on its own.
pub struct RestrictionChecker {
    store: Arc<dyn JudgeStore>,
}

impl RestrictionChecker {
    pub fn new(store: Arc<dyn JudgeStore>) -> Self {
        Self { store }
    }
}

/// Whether `solution` violates a single rule.
pub fn is_violated(rule: &Restriction, solution: &str) -> Result<bool, CheckerError> {
    match RestrictionKind::parse(&rule.kind) {
        Some(RestrictionKind::Keyword) => Ok(solution.contains(rule.definition.as_str())),
        Some(RestrictionKind::Regexp) => {
            let re = Regex::new(&rule.definition).map_err(|source| CheckerError::InvalidPattern {
                pattern: rule.definition.clone(),
                source,
            })?;
            Ok(re.is_match(solution))
        }
        None => Err(CheckerError::UnsupportedRestriction {
            kind: rule.kind.clone(),
        }),
    }
}

/// First rule `solution` violates, in order. Rules after it are not
/// evaluated.
pub fn first_violation<'a>(
    rules: &'a [Restriction],
    solution: &str,
) -> Result<Option<&'a Restriction>, CheckerError> {
    for rule in rules {
        if is_violated(rule, solution)? {
            return Ok(Some(rule));
        }
    }
    Ok(None)
}

/// Evaluate the restrictions stored in the submission's context.
pub fn apply_restrictions(submission: &mut Submission) -> Result<(), CheckerError> {
    let rules = submission.context.restrictions()?;
    if let Some(rule) = first_violation(rules, &submission.solution)? {
        let message = format!("restriction violated: {}", rule);
        submission.status = Verdict::RestrictionViolated;
        submission.checker_message = message;
    }
    Ok(())
}

impl Checker for RestrictionChecker {
    fn kind(&self) -> &'static str {
        "restriction"
    }

    fn check(&self, mut submission: Submission) -> Submission {
        match self.store.fetch_restrictions(submission.id) {
            Ok(rules) => {
                debug!(submission_id = submission.id, rules = rules.len(), "fetched restrictions");
                submission.context = CheckerContext::Restrictions(rules);
            }
            Err(e) => {
                let err = CheckerError::fetch("restrictions", e);
                error!(submission_id = submission.id, error = %err, "failed to fetch restrictions");
                return submission;
            }
        }

        if let Err(err) = apply_restrictions(&mut submission) {
            error!(submission_id = submission.id, error = %err, "failed to check restrictions");
        }

        submission
    }
}
