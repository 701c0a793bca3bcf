use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::{denied, lease_expired, LockLease, ServerLock};
use crate::error::{CleanupError, Result};

/// Process-local [`ServerLock`]. Enough for single-instance deployments, and
/// for several services sharing one process through an `Arc`.
#[derive(Debug, Default)]
pub struct InMemoryServerLock {
    leases: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl InMemoryServerLock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ServerLock for InMemoryServerLock {
    fn try_acquire(&self, name: &str, lease: Duration, now: DateTime<Utc>) -> Result<LockLease> {
        let mut leases = self
            .leases
            .lock()
            .map_err(|_| CleanupError::Lock("lease table poisoned".to_string()))?;

        if let Some(expires_at) = leases.get(name) {
            if !lease_expired(expires_at.timestamp(), now) {
                return Err(denied(name));
            }
        }

        let held = LockLease::new(name, now, lease);
        leases.insert(name.to_string(), held.expires_at);
        Ok(held)
    }
}
