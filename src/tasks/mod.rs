//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Cleanup: Purges stale temp files and expired records every interval

mod cleanup;

pub use cleanup::{spawn_cleanup_task, CleanupService, StopReason};
