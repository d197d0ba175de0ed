//! Named SQL the pipeline invokes without owning its text.
//!
//! Defaults target the bundled SQLite schema (see [`super::schema::DDL`]).
//! Every entry can be replaced from the `catalog` section of the config file.

use serde::{Deserialize, Serialize};

pub const SOLUTION_PLACEHOLDER: &str = "{solution}";
pub const REFERENCE_PLACEHOLDER: &str = "{reference}";

const FETCH_PENDING_SUBMISSIONS: &str = "SELECT id, status_id, solution, checker_message
 FROM submissions
 WHERE status_id = 1
 ORDER BY id ASC";

const FETCH_RESTRICTIONS: &str = "SELECT r.restriction_type, r.definition
 FROM restrictions r
 JOIN submissions s ON s.task_id = r.task_id
 WHERE s.id = ?1
 ORDER BY r.position ASC, r.id ASC";

const FETCH_SELECTION_INFO: &str =
    "SELECT t.reference_solution, t.default_schema, t.check_order, t.check_column_names
 FROM selection_tasks t
 JOIN submissions s ON s.task_id = t.task_id
 WHERE s.id = ?1";

const FETCH_SELECTION_SCHEMAS: &str = "SELECT ts.schema_name
 FROM selection_task_schemas ts
 JOIN submissions s ON s.task_id = ts.task_id
 WHERE s.id = ?1
 ORDER BY ts.schema_name ASC";

const UPDATE_SUBMISSION: &str =
    "UPDATE submissions SET status_id = ?1, checker_message = ?2 WHERE id = ?3";

// Row numbers are attached before EXCEPT so equal rows at different
// positions still count as a difference.
const ORDERED_DIFFERENCE: &str = "SELECT * FROM (
  SELECT ROW_NUMBER() OVER () AS judge_row_no, sol.* FROM ({solution}) sol
  EXCEPT
  SELECT ROW_NUMBER() OVER () AS judge_row_no, ref.* FROM ({reference}) ref
)
UNION ALL
SELECT * FROM (
  SELECT ROW_NUMBER() OVER () AS judge_row_no, ref.* FROM ({reference}) ref
  EXCEPT
  SELECT ROW_NUMBER() OVER () AS judge_row_no, sol.* FROM ({solution}) sol
)";

const UNORDERED_DIFFERENCE: &str = "SELECT * FROM (
  SELECT * FROM ({solution})
  EXCEPT
  SELECT * FROM ({reference})
)
UNION ALL
SELECT * FROM (
  SELECT * FROM ({reference})
  EXCEPT
  SELECT * FROM ({solution})
)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueryCatalog {
    pub fetch_pending_submissions: String,
    pub fetch_restrictions: String,
    pub fetch_selection_info: String,
    pub fetch_selection_schemas: String,
    pub update_submission: String,
    pub ordered_difference: String,
    pub unordered_difference: String,
}

impl Default for QueryCatalog {
    fn default() -> Self {
        Self {
            fetch_pending_submissions: FETCH_PENDING_SUBMISSIONS.to_string(),
            fetch_restrictions: FETCH_RESTRICTIONS.to_string(),
            fetch_selection_info: FETCH_SELECTION_INFO.to_string(),
            fetch_selection_schemas: FETCH_SELECTION_SCHEMAS.to_string(),
            update_submission: UPDATE_SUBMISSION.to_string(),
            ordered_difference: ORDERED_DIFFERENCE.to_string(),
            unordered_difference: UNORDERED_DIFFERENCE.to_string(),
        }
    }
}

impl QueryCatalog {
    /// Build the query whose result is empty iff both queries agree.
    pub fn difference(&self, check_order: bool, solution: &str, reference: &str) -> String {
        let template = if check_order {
            &self.ordered_difference
        } else {
            &self.unordered_difference
        };
        render(template, solution, reference)
    }
}

/// Single-pass substitution: text inserted for one placeholder is never
/// scanned again.
fn render(template: &str, solution: &str, reference: &str) -> String {
    let mut out = String::with_capacity(template.len() + solution.len() * 2 + reference.len() * 2);
    let mut rest = template;
    while let Some(pos) = rest.find('{') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if let Some(after) = tail.strip_prefix(SOLUTION_PLACEHOLDER) {
            out.push_str(solution);
            rest = after;
        } else if let Some(after) = tail.strip_prefix(REFERENCE_PLACEHOLDER) {
            out.push_str(reference);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}
