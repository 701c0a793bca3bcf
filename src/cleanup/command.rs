//! Delete Command Module
//!
//! Value objects describing one bulk deletion handed to the store.

use std::fmt;

use chrono::{DateTime, Utc};

/// A bulk deletion against the backing store. Built fresh for every tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteCommand {
    /// Snapshots whose `expires` timestamp is before `now`
    ExpiredSnapshots { now: DateTime<Utc> },
    /// Dashboard versions beyond the newest `versions_to_keep` per dashboard
    ExpiredDashboardVersions { versions_to_keep: u32 },
    /// Login attempts created strictly before `older_than`
    OldLoginAttempts { older_than: DateTime<Utc> },
    /// Pending invites created at or before `created_before`
    ExpiredUserInvites { created_before: DateTime<Utc> },
}

impl DeleteCommand {
    /// Short label used in log fields.
    pub fn resource(&self) -> &'static str {
        match self {
            DeleteCommand::ExpiredSnapshots { .. } => "snapshots",
            DeleteCommand::ExpiredDashboardVersions { .. } => "dashboard_versions",
            DeleteCommand::OldLoginAttempts { .. } => "login_attempts",
            DeleteCommand::ExpiredUserInvites { .. } => "user_invites",
        }
    }
}

impl fmt::Display for DeleteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteCommand::ExpiredSnapshots { now } => {
                write!(f, "delete snapshots expired before {}", now)
            }
            DeleteCommand::ExpiredDashboardVersions { versions_to_keep } => {
                write!(
                    f,
                    "delete dashboard versions beyond newest {}",
                    versions_to_keep
                )
            }
            DeleteCommand::OldLoginAttempts { older_than } => {
                write!(f, "delete login attempts older than {}", older_than)
            }
            DeleteCommand::ExpiredUserInvites { created_before } => {
                write!(f, "delete user invites created before {}", created_before)
            }
        }
    }
}
