use super::catalog::QueryCatalog;
use super::database::Database;
use super::schema::DDL;
use crate::errors::StoreError;
use crate::model::selection::parse_flag;
use crate::model::{CheckerContext, Restriction, SelectionInfo, Submission, Verdict};
use rusqlite::params;
use std::sync::Arc;

/// Result of one pending-submissions fetch. Each row decodes independently
/// so a bad row does not discard the rest of the batch.
pub type PendingBatch = Vec<Result<Submission, StoreError>>;

/// Main-database operations the pipeline needs.
pub trait JudgeStore: Send + Sync {
    fn fetch_pending_submissions(&self) -> Result<PendingBatch, StoreError>;

    fn fetch_restrictions(&self, submission_id: i64) -> Result<Vec<Restriction>, StoreError>;

    /// Scalar selection metadata; `schemas` is left empty.
    fn fetch_selection_info(&self, submission_id: i64) -> Result<SelectionInfo, StoreError>;

    fn fetch_selection_schemas(&self, submission_id: i64) -> Result<Vec<String>, StoreError>;

    fn update_submission(&self, submission: &Submission) -> Result<(), StoreError>;
}

/// [`JudgeStore`] backed by the main SQLite connection and the query catalog.
#[derive(Clone)]
pub struct SqliteJudgeStore {
    db: Database,
    catalog: Arc<QueryCatalog>,
}

impl SqliteJudgeStore {
    pub fn new(db: Database, catalog: Arc<QueryCatalog>) -> Self {
        Self { db, catalog }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Create the bundled judge tables if they do not exist yet.
    pub fn init_schema(&self) -> Result<(), StoreError> {
        self.db.execute_batch(DDL)
    }
}

fn decode_submission(
    (id, status_id, solution, checker_message): (i64, i64, String, Option<String>),
) -> Result<Submission, StoreError> {
    let status = Verdict::from_id(status_id).ok_or_else(|| {
        StoreError::Decode(format!("submission {}: unknown status id {}", id, status_id))
    })?;
    Ok(Submission {
        id,
        status,
        solution,
        checker_message: checker_message.unwrap_or_default(),
        context: CheckerContext::None,
    })
}

impl JudgeStore for SqliteJudgeStore {
    fn fetch_pending_submissions(&self) -> Result<PendingBatch, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&self.catalog.fetch_pending_submissions)?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            })?;
            let batch: PendingBatch = rows
                .map(|r| r.map_err(StoreError::from).and_then(decode_submission))
                .collect();
            Ok(batch)
        })
    }

    fn fetch_restrictions(&self, submission_id: i64) -> Result<Vec<Restriction>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&self.catalog.fetch_restrictions)?;
            let rows = stmt.query_map(params![submission_id], |row| {
                Ok(Restriction {
                    kind: row.get(0)?,
                    definition: row.get(1)?,
                })
            })?;
            let restrictions = rows.collect::<Result<Vec<_>, _>>()?;
            Ok(restrictions)
        })
    }

    fn fetch_selection_info(&self, submission_id: i64) -> Result<SelectionInfo, StoreError> {
        self.db.with_conn(|conn| {
            let (reference_solution, default_schema, check_order, check_column_names) = conn
                .query_row(
                    &self.catalog.fetch_selection_info,
                    params![submission_id],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                        ))
                    },
                )?;
            Ok(SelectionInfo {
                reference_solution,
                default_schema,
                check_order: parse_flag(&check_order),
                check_column_names: parse_flag(&check_column_names),
                schemas: Vec::new(),
            })
        })
    }

    fn fetch_selection_schemas(&self, submission_id: i64) -> Result<Vec<String>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&self.catalog.fetch_selection_schemas)?;
            let rows = stmt.query_map(params![submission_id], |row| row.get::<_, String>(0))?;
            let schemas = rows.collect::<Result<Vec<_>, _>>()?;
            Ok(schemas)
        })
    }

    fn update_submission(&self, submission: &Submission) -> Result<(), StoreError> {
        let message = Some(submission.checker_message.as_str()).filter(|m| !m.is_empty());
        let changed = self.db.with_conn(|conn| {
            Ok(conn.execute(
                &self.catalog.update_submission,
                params![submission.status.id(), message, submission.id],
            )?)
        })?;
        if changed == 0 {
            return Err(StoreError::MissingSubmission(submission.id));
        }
        Ok(())
    }
}
