use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, TransactionBehavior};
use tracing::debug;

use super::{denied, lease_expired, LockLease, ServerLock};
use crate::error::{CleanupError, Result};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS server_lock (
        operation_uid TEXT PRIMARY KEY NOT NULL,
        version INTEGER NOT NULL,
        last_execution INTEGER NOT NULL
    );
";

/// [`ServerLock`] shared by every instance pointing at the same database.
///
/// Each row records the last execution of an operation; an instance may claim
/// the operation once `last_execution + lease` has passed. Claims bump the
/// row's version and only succeed against the version that was read, so two
/// instances racing for the same row can't both win.
pub struct SqliteServerLock {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteServerLock {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

impl ServerLock for SqliteServerLock {
    fn try_acquire(&self, name: &str, lease: Duration, now: DateTime<Utc>) -> Result<LockLease> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| CleanupError::Lock("lock connection poisoned".to_string()))?;

        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let row: Option<(i64, i64)> = tx
            .query_row(
                "SELECT version, last_execution FROM server_lock WHERE operation_uid = ?1",
                params![name],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let claimed = match row {
            None => match tx.execute(
                "INSERT INTO server_lock (operation_uid, version, last_execution)
                 VALUES (?1, 1, ?2)",
                params![name, now.timestamp()],
            ) {
                Ok(_) => true,
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == ErrorCode::ConstraintViolation =>
                {
                    false
                }
                Err(e) => return Err(e.into()),
            },
            Some((version, last_execution)) => {
                let lease_secs = i64::try_from(lease.as_secs()).unwrap_or(i64::MAX);
                if !lease_expired(last_execution.saturating_add(lease_secs), now) {
                    false
                } else {
                    let updated = tx.execute(
                        "UPDATE server_lock SET version = ?1, last_execution = ?2
                         WHERE operation_uid = ?3 AND version = ?4",
                        params![version + 1, now.timestamp(), name, version],
                    )?;
                    updated == 1
                }
            }
        };

        if !claimed {
            debug!(lock = name, "Lease still held by another instance");
            return Err(denied(name));
        }

        tx.commit()?;
        Ok(LockLease::new(name, now, lease))
    }
}
