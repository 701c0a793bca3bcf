//! Grafana Cleanup - periodic maintenance for a Grafana-style server
//!
//! Removes stale rendered images and expired snapshots, dashboard versions,
//! user invites and login attempts on a fixed interval.

pub mod cleanup;
pub mod config;
pub mod error;
pub mod lock;
pub mod store;
pub mod tasks;

pub use config::Config;
pub use error::{CleanupError, Result};
pub use tasks::{spawn_cleanup_task, CleanupService, StopReason};
