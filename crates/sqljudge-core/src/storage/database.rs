use crate::config::DbConfig;
use crate::errors::StoreError;
use anyhow::Context;
use rusqlite::{Connection, OpenFlags};
use std::sync::{Arc, Mutex};

/// A named SQLite connection shared by every pipeline stage.
///
/// Statements are serialized by the mutex; nothing spans more than one
/// statement, so no transaction is ever held across a lock release.
#[derive(Clone)]
pub struct Database {
    name: String,
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open an existing file-backed database. A missing file is an error.
    pub fn open(name: impl Into<String>, cfg: &DbConfig) -> anyhow::Result<Self> {
        let flags = if cfg.read_only {
            OpenFlags::SQLITE_OPEN_READ_ONLY
        } else {
            OpenFlags::SQLITE_OPEN_READ_WRITE
        };
        Self::open_with(name.into(), cfg, flags | OpenFlags::SQLITE_OPEN_NO_MUTEX)
    }

    /// Open a read-write database, creating the file if it does not exist.
    pub fn create(name: impl Into<String>, cfg: &DbConfig) -> anyhow::Result<Self> {
        let name = name.into();
        if cfg.read_only {
            anyhow::bail!("database {:?} is configured read-only", name);
        }
        Self::open_with(name, cfg, OpenFlags::default())
    }

    fn open_with(name: String, cfg: &DbConfig, flags: OpenFlags) -> anyhow::Result<Self> {
        let conn = Connection::open_with_flags(&cfg.path, flags).with_context(|| {
            format!(
                "failed to open database {:?} at {}",
                name,
                cfg.path.display()
            )
        })?;
        Ok(Self::from_connection(name, conn))
    }

    /// Create an in-memory database (for testing).
    pub fn memory(name: impl Into<String>) -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory sqlite db")?;
        Ok(Self::from_connection(name, conn))
    }

    pub fn from_connection(name: impl Into<String>, conn: Connection) -> Self {
        Self {
            name: name.into(),
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run `f` with exclusive access to the connection.
    pub fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        f(&conn)
    }

    pub fn execute_batch(&self, sql: &str) -> Result<(), StoreError> {
        self.with_conn(|conn| Ok(conn.execute_batch(sql)?))
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").field("name", &self.name).finish()
    }
}
