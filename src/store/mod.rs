//! Store Module
//!
//! Persistence collaborator executing the bulk deletions issued each tick.

mod sqlite;

pub use sqlite::SqliteStore;

use crate::cleanup::DeleteCommand;
use crate::error::Result;

/// Backing store for the expired-record deletions.
///
/// Calls are blocking; the scheduler runs them off the async executor.
pub trait CleanupStore: Send + Sync {
    /// Executes `command` and returns the number of affected rows.
    fn execute(&self, command: &DeleteCommand) -> Result<u64>;
}
