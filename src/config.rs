//! Configuration Module
//!
//! Handles loading the cleanup settings from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cleanup::CLEANUP_INTERVAL;

/// Cleanup service configuration.
///
/// All values can be configured via environment variables with sensible defaults.
/// Read once at startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding rendered images and other temp data
    pub images_dir: PathBuf,
    /// Age after which temp files are removed, zero disables the sweep
    pub temp_data_lifetime: Duration,
    /// Days a pending user invite stays valid
    pub user_invite_max_lifetime_days: u64,
    /// When set, login attempts are never recorded so there is nothing to purge
    pub disable_brute_force_login_protection: bool,
    /// Whether expired dashboard snapshots are deleted
    pub snapshot_remove_expired: bool,
    /// Number of versions kept per dashboard
    pub dashboard_versions_to_keep: u32,
    /// Time between cleanup ticks
    pub cleanup_interval: Duration,
    /// SQLite database shared with the rest of the server
    pub database_path: PathBuf,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `IMAGES_DIR` - Temp image directory (default: data/png)
    /// - `TEMP_DATA_LIFETIME` - Temp file lifetime in seconds, 0 disables (default: 86400)
    /// - `USER_INVITE_MAX_LIFETIME_DAYS` - Invite lifetime in days (default: 1)
    /// - `DISABLE_BRUTE_FORCE_LOGIN_PROTECTION` - true/false (default: false)
    /// - `SNAPSHOT_REMOVE_EXPIRED` - true/false (default: true)
    /// - `DASHBOARD_VERSIONS_TO_KEEP` - Versions kept per dashboard, min 1 (default: 20)
    /// - `CLEANUP_INTERVAL` - Seconds between ticks (default: 600)
    /// - `DATABASE_PATH` - SQLite database file (default: data/grafana.db)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            images_dir: env::var("IMAGES_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.images_dir),
            temp_data_lifetime: env_parse::<u64>("TEMP_DATA_LIFETIME")
                .map(Duration::from_secs)
                .unwrap_or(defaults.temp_data_lifetime),
            user_invite_max_lifetime_days: env_parse("USER_INVITE_MAX_LIFETIME_DAYS")
                .unwrap_or(defaults.user_invite_max_lifetime_days),
            disable_brute_force_login_protection: env_parse(
                "DISABLE_BRUTE_FORCE_LOGIN_PROTECTION",
            )
            .unwrap_or(defaults.disable_brute_force_login_protection),
            snapshot_remove_expired: env_parse("SNAPSHOT_REMOVE_EXPIRED")
                .unwrap_or(defaults.snapshot_remove_expired),
            dashboard_versions_to_keep: env_parse::<u32>("DASHBOARD_VERSIONS_TO_KEEP")
                .map(|n| n.max(1))
                .unwrap_or(defaults.dashboard_versions_to_keep),
            cleanup_interval: env_parse::<u64>("CLEANUP_INTERVAL")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.cleanup_interval),
            database_path: env::var("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
        }
    }

    /// Maximum age of a pending user invite.
    pub fn user_invite_max_lifetime(&self) -> Duration {
        Duration::from_secs(self.user_invite_max_lifetime_days.saturating_mul(24 * 60 * 60))
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            images_dir: PathBuf::from("data/png"),
            temp_data_lifetime: Duration::from_secs(24 * 60 * 60),
            user_invite_max_lifetime_days: 1,
            disable_brute_force_login_protection: false,
            snapshot_remove_expired: true,
            dashboard_versions_to_keep: 20,
            cleanup_interval: CLEANUP_INTERVAL,
            database_path: PathBuf::from("data/grafana.db"),
        }
    }
}
