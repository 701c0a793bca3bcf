//! Lock Module
//!
//! Lease-based advisory locks making sure a named operation runs on at most
//! one instance per lease window. A lease is never released early: it stays
//! held until it expires, which is what turns "one at a time" into "once per
//! window" for periodic work.

mod memory;
mod sqlite;

pub use memory::InMemoryServerLock;
pub use sqlite::SqliteServerLock;

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use crate::error::{CleanupError, Result};

// == Lock Lease ==
/// Proof that this instance holds the named lock until `expires_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockLease {
    pub name: String,
    pub acquired_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl LockLease {
    pub(crate) fn new(name: &str, acquired_at: DateTime<Utc>, lease: Duration) -> Self {
        let expires_at = TimeDelta::from_std(lease)
            .ok()
            .and_then(|lease| acquired_at.checked_add_signed(lease))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            name: name.to_string(),
            acquired_at,
            expires_at,
        }
    }
}

/// Slack granted when checking whether a lease has run out.
///
/// Leases are compared in whole seconds, and a lease counts as expired during
/// its final second, so a holder renewing every `lease` is never refused
/// because this tick started a few milliseconds earlier than the last one.
pub const LEASE_TOLERANCE: Duration = Duration::from_secs(1);

/// Whether a lease ending at `expires_at_secs` (unix seconds) is free at `now`.
pub(crate) fn lease_expired(expires_at_secs: i64, now: DateTime<Utc>) -> bool {
    now.timestamp()
        .saturating_add(LEASE_TOLERANCE.as_secs() as i64)
        >= expires_at_secs
}

// == Server Lock ==
/// Distributed lock coordinator.
pub trait ServerLock: Send + Sync {
    /// Claims `name` for `lease`, starting at `now`.
    ///
    /// # Errors
    /// [`CleanupError::LockDenied`] when another holder's lease is still live,
    /// or another error if the coordinator itself failed.
    fn try_acquire(
        &self,
        name: &str,
        lease: Duration,
        now: DateTime<Utc>,
    ) -> Result<LockLease>;
}

// == Lock And Execute ==
/// Runs `body` only if the lease on `name` can be acquired.
///
/// The body is not invoked at all when acquisition fails.
pub fn lock_and_execute<T, F>(
    lock: &dyn ServerLock,
    name: &str,
    lease: Duration,
    now: DateTime<Utc>,
    body: F,
) -> Result<T>
where
    F: FnOnce() -> T,
{
    let held = lock.try_acquire(name, lease, now)?;
    debug!(lock = %held.name, expires_at = %held.expires_at, "Acquired lock lease");
    Ok(body())
}

pub(crate) fn denied(name: &str) -> CleanupError {
    CleanupError::LockDenied {
        name: name.to_string(),
    }
}
