//! Cleanup Module
//!
//! Expiration policy, the temp-file sweep and the value objects passed to
//! the store for each bulk deletion.

mod command;
mod policy;
mod report;
mod temp_files;


// Re-export public types
pub use command::DeleteCommand;
pub use policy::{cutoff, should_cleanup_temp_file};
pub use report::{StepOutcome, TempFileSweep, TickReport};
pub use temp_files::{clean_up_temp_files, FileEntry, FileSystem, LocalFileSystem};

use std::time::Duration;

// == Public Constants ==
/// Time between two ticks of the scheduler loop
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Login attempts older than this no longer count towards brute-force lockout
pub const LOGIN_ATTEMPT_WINDOW: Duration = Duration::from_secs(10 * 60);

/// Lock name guarding the login-attempt purge across instances
pub const LOGIN_ATTEMPTS_LOCK: &str = "delete old login attempts";
