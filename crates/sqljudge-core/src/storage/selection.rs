use super::database::Database;
use crate::errors::{CheckerError, StoreError};
use rusqlite::{Connection, Statement};
use std::collections::BTreeMap;

/// Runs solution and reference queries against named selection schemas.
///
/// Only read-only statements are executed. Cursors never outlive a call;
/// every exit path releases them.
pub trait SelectionRunner: Send + Sync {
    /// Execute `sql` and return its column identifiers in result order.
    fn column_names(&self, schema: &str, sql: &str) -> Result<Vec<String>, CheckerError>;

    /// Execute `sql` and report whether it produced at least one row.
    fn has_rows(&self, schema: &str, sql: &str) -> Result<bool, CheckerError>;
}

/// One connection per configured selection schema.
#[derive(Clone, Debug, Default)]
pub struct SelectionPool {
    dbs: BTreeMap<String, Database>,
}

impl SelectionPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, db: Database) {
        self.dbs.insert(db.name().to_string(), db);
    }

    pub fn get(&self, schema: &str) -> Result<&Database, CheckerError> {
        self.dbs
            .get(schema)
            .ok_or_else(|| CheckerError::UnknownSchema(schema.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.dbs.keys().map(String::as_str)
    }
}

impl FromIterator<Database> for SelectionPool {
    fn from_iter<I: IntoIterator<Item = Database>>(iter: I) -> Self {
        let mut pool = Self::new();
        for db in iter {
            pool.insert(db);
        }
        pool
    }
}

/// Prepare `sql`, refusing anything that could write to the schema.
fn prepare_query<'c>(conn: &'c Connection, sql: &str) -> Result<Statement<'c>, StoreError> {
    let stmt = conn.prepare(sql)?;
    if !stmt.readonly() {
        return Err(StoreError::NotAQuery);
    }
    Ok(stmt)
}

impl SelectionRunner for SelectionPool {
    fn column_names(&self, schema: &str, sql: &str) -> Result<Vec<String>, CheckerError> {
        let names = self.get(schema)?.with_conn(|conn| {
            let mut stmt = prepare_query(conn, sql)?;
            let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
            // Step once so runtime errors surface here, not in the content check.
            let mut rows = stmt.query([])?;
            rows.next()?;
            Ok::<_, StoreError>(names)
        })?;
        Ok(names)
    }

    fn has_rows(&self, schema: &str, sql: &str) -> Result<bool, CheckerError> {
        let found = self.get(schema)?.with_conn(|conn| {
            let mut stmt = prepare_query(conn, sql)?;
            let mut rows = stmt.query([])?;
            let found = rows.next()?.is_some();
            Ok::<_, StoreError>(found)
        })?;
        Ok(found)
    }
}
