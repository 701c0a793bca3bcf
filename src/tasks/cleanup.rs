//! Cleanup Task
//!
//! Background task that purges stale temp files and expired database records
//! on a fixed interval until told to stop.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::cleanup::{
    clean_up_temp_files, cutoff, DeleteCommand, FileSystem, LocalFileSystem, StepOutcome,
    TempFileSweep, TickReport, LOGIN_ATTEMPTS_LOCK, LOGIN_ATTEMPT_WINDOW,
};
use crate::config::Config;
use crate::error::{CleanupError, Result};
use crate::lock::{lock_and_execute, ServerLock};
use crate::store::CleanupStore;

// == Stop Reason ==
/// Why the cleanup loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The shutdown token was cancelled
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Cancelled => write!(f, "cleanup cancelled"),
        }
    }
}

// == Cleanup Service ==
/// Runs the fixed sequence of maintenance passes.
///
/// Every pass is best effort: failures are logged and reported, never
/// propagated, and never stop the remaining passes.
pub struct CleanupService {
    config: Config,
    store: Arc<dyn CleanupStore>,
    lock: Arc<dyn ServerLock>,
    fs: Arc<dyn FileSystem>,
}

impl CleanupService {
    /// Creates a service sweeping the local filesystem.
    pub fn new(config: Config, store: Arc<dyn CleanupStore>, lock: Arc<dyn ServerLock>) -> Self {
        Self {
            config,
            store,
            lock,
            fs: Arc::new(LocalFileSystem),
        }
    }

    /// Replaces the filesystem used for the temp-file sweep.
    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    // == Tick ==
    /// Runs one full maintenance tick as if the time were `now`.
    ///
    /// Steps run strictly in order; a failing step doesn't affect the others.
    pub fn run_tick_at(&self, now: DateTime<Utc>) -> TickReport {
        let temp_files = self.log_sweep(self.clean_up_tmp_files(now));

        let snapshots = if self.config.snapshot_remove_expired {
            record("snapshots", self.delete_expired_snapshots(now))
        } else {
            StepOutcome::Skipped
        };

        let dashboard_versions = record(
            "dashboard_versions",
            self.delete_expired_dashboard_versions(),
        );

        let user_invites = record("user_invites", self.delete_expired_user_invites(now));

        let login_attempts = self.delete_old_login_attempts_locked(now);

        let report = TickReport {
            temp_files,
            snapshots,
            dashboard_versions,
            user_invites,
            login_attempts,
        };

        debug!(
            deleted_rows = report.total_deleted_rows(),
            failed_steps = report.failed_steps(),
            deleted_files = report.temp_files.deleted,
            "Cleanup tick finished"
        );

        report
    }

    // == Delete Operations ==
    /// Removes stale files from the images directory.
    pub fn clean_up_tmp_files(&self, now: DateTime<Utc>) -> Result<TempFileSweep> {
        clean_up_temp_files(
            self.fs.as_ref(),
            &self.config.images_dir,
            self.config.temp_data_lifetime,
            now,
        )
    }

    pub fn delete_expired_snapshots(&self, now: DateTime<Utc>) -> Result<u64> {
        self.store.execute(&DeleteCommand::ExpiredSnapshots { now })
    }

    pub fn delete_expired_dashboard_versions(&self) -> Result<u64> {
        self.store.execute(&DeleteCommand::ExpiredDashboardVersions {
            versions_to_keep: self.config.dashboard_versions_to_keep,
        })
    }

    pub fn delete_expired_user_invites(&self, now: DateTime<Utc>) -> Result<u64> {
        let created_before = cutoff(now, self.config.user_invite_max_lifetime());
        debug!(%created_before, "Starting cleanup of expired user invites");
        self.store
            .execute(&DeleteCommand::ExpiredUserInvites { created_before })
    }

    pub fn delete_old_login_attempts(&self, now: DateTime<Utc>) -> Result<u64> {
        self.store.execute(&DeleteCommand::OldLoginAttempts {
            older_than: cutoff(now, LOGIN_ATTEMPT_WINDOW),
        })
    }

    /// Login-attempt purge, run by at most one instance per tick interval.
    fn delete_old_login_attempts_locked(&self, now: DateTime<Utc>) -> StepOutcome {
        if self.config.disable_brute_force_login_protection {
            return StepOutcome::Skipped;
        }

        let result = lock_and_execute(
            self.lock.as_ref(),
            LOGIN_ATTEMPTS_LOCK,
            self.config.cleanup_interval,
            now,
            || self.delete_old_login_attempts(now),
        );

        match result {
            Ok(deleted) => record("login_attempts", deleted),
            Err(e @ CleanupError::LockDenied { .. }) => {
                error!(error = %e, "Failed to lock and execute cleanup of old login attempts");
                StepOutcome::Skipped
            }
            Err(e) => {
                error!(error = %e, "Failed to lock and execute cleanup of old login attempts");
                StepOutcome::Failed(e.to_string())
            }
        }
    }

    fn log_sweep(&self, result: Result<TempFileSweep>) -> TempFileSweep {
        match result {
            Ok(sweep) => {
                if sweep.deleted > 0 {
                    info!(
                        deleted = sweep.deleted,
                        kept = sweep.kept,
                        "Removed old temp files"
                    );
                }
                sweep
            }
            Err(e) => {
                error!(dir = %self.config.images_dir.display(), error = %e, "Problem reading image dir");
                TempFileSweep::new()
            }
        }
    }

    // == Run Loop ==
    /// Runs until `shutdown` is cancelled.
    ///
    /// Does one temp-file sweep straight away, to catch up on intervals missed
    /// while the process was down, then a full tick every `cleanup_interval`.
    /// Ticks execute on the blocking pool and always run to completion;
    /// cancellation is only observed between ticks.
    ///
    /// Tick times are read from the monotonic clock, anchored to the wall
    /// clock at startup, so consecutive ticks are exactly one interval apart
    /// as far as lock leases are concerned.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) -> StopReason {
        let interval = self.config.cleanup_interval;
        info!(?interval, "Starting cleanup service");

        let started_at = Utc::now();
        let started = Instant::now();
        let clock = move || {
            started_at + TimeDelta::from_std(started.elapsed()).unwrap_or(TimeDelta::zero())
        };

        let service = Arc::clone(&self);
        let startup = tokio::task::spawn_blocking(move || {
            let sweep = service.clean_up_tmp_files(started_at);
            service.log_sweep(sweep);
        });
        if let Err(e) = startup.await {
            warn!(error = %e, "Startup temp file sweep did not complete");
        }

        let mut ticker = interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Cleanup service received shutdown signal");
                    return StopReason::Cancelled;
                }
                _ = ticker.tick() => {
                    let service = Arc::clone(&self);
                    let now = clock();
                    let tick = tokio::task::spawn_blocking(move || service.run_tick_at(now));
                    if let Err(e) = tick.await {
                        error!(error = %e, "Cleanup tick did not complete");
                    }
                }
            }
        }
    }
}

/// Logs a delete step's result and turns it into a report entry.
fn record(resource: &'static str, result: Result<u64>) -> StepOutcome {
    match result {
        Ok(rows) if rows > 0 => {
            info!(resource, rows_affected = rows, "Deleted expired rows");
            StepOutcome::Deleted(rows)
        }
        Ok(rows) => {
            debug!(resource, rows_affected = rows, "Nothing to delete");
            StepOutcome::Deleted(rows)
        }
        Err(e) => {
            error!(resource, error = %e, "Failed to delete expired rows");
            StepOutcome::Failed(e.to_string())
        }
    }
}

/// Spawns the cleanup loop on the tokio runtime.
///
/// # Returns
/// A JoinHandle resolving to the loop's [`StopReason`] once `shutdown` is
/// cancelled and any in-flight tick has finished.
///
/// # Example
/// ```ignore
/// let shutdown = CancellationToken::new();
/// let handle = spawn_cleanup_task(Arc::new(service), shutdown.clone());
/// // Later, during shutdown:
/// shutdown.cancel();
/// assert_eq!(handle.await?, StopReason::Cancelled);
/// ```
pub fn spawn_cleanup_task(
    service: Arc<CleanupService>,
    shutdown: CancellationToken,
) -> JoinHandle<StopReason> {
    tokio::spawn(service.run(shutdown))
}
