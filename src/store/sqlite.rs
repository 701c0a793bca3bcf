use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection};
use tracing::{debug, info};

use super::CleanupStore;
use crate::cleanup::DeleteCommand;
use crate::error::{CleanupError, Result};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS dashboard_snapshot (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        key TEXT NOT NULL UNIQUE,
        dashboard_id INTEGER NOT NULL,
        created INTEGER NOT NULL,
        expires INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS dashboard_version (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        dashboard_id INTEGER NOT NULL,
        version INTEGER NOT NULL,
        created INTEGER NOT NULL,
        UNIQUE (dashboard_id, version)
    );
    CREATE TABLE IF NOT EXISTS login_attempt (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL,
        ip_address TEXT NOT NULL,
        created INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_login_attempt_created ON login_attempt(created);
    CREATE TABLE IF NOT EXISTS temp_user (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL,
        status TEXT NOT NULL,
        created_at INTEGER NOT NULL
    );
";

const DELETE_EXPIRED_VERSIONS: &str = "
    DELETE FROM dashboard_version WHERE id IN (
        SELECT id FROM (
            SELECT id, ROW_NUMBER() OVER (
                PARTITION BY dashboard_id ORDER BY version DESC
            ) AS rn
            FROM dashboard_version
        ) WHERE rn > ?1
    )";

/// SQLite-backed [`CleanupStore`]. Timestamps are stored as unix seconds.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) the database at `db_path` and ensures the tables exist.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        info!("Opening cleanup database at {:?}", path);
        Self::from_connection(Connection::open(path)?)
    }

    /// Private in-memory database, mostly useful in tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` with exclusive access to the underlying connection.
    pub fn with_session<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| CleanupError::Internal("database connection poisoned".to_string()))?;
        Ok(f(&conn)?)
    }
}

impl CleanupStore for SqliteStore {
    fn execute(&self, command: &DeleteCommand) -> Result<u64> {
        debug!(resource = command.resource(), "{}", command);

        let affected = self.with_session(|conn| match command {
            DeleteCommand::ExpiredSnapshots { now } => conn.execute(
                "DELETE FROM dashboard_snapshot WHERE expires < ?1",
                params![now.timestamp()],
            ),
            DeleteCommand::ExpiredDashboardVersions { versions_to_keep } => {
                conn.execute(DELETE_EXPIRED_VERSIONS, params![*versions_to_keep])
            }
            DeleteCommand::OldLoginAttempts { older_than } => conn.execute(
                "DELETE FROM login_attempt WHERE created < ?1",
                params![older_than.timestamp()],
            ),
            DeleteCommand::ExpiredUserInvites { created_before } => conn.execute(
                "DELETE FROM temp_user WHERE created_at <= ?1",
                params![created_before.timestamp()],
            ),
        })?;

        Ok(affected as u64)
    }
}
