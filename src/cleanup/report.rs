//! Cleanup Report Module
//!
//! Per-tick results of the maintenance passes, kept for logging and tests.

use std::fmt;

// == Temp File Sweep ==
/// Counters produced by one pass over the images directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TempFileSweep {
    /// Entries found in the directory
    pub scanned: usize,
    /// Stale entries removed
    pub deleted: usize,
    /// Entries left in place because they are still fresh
    pub kept: usize,
    /// Stale entries whose removal failed
    pub failed: usize,
}

impl TempFileSweep {
    // == Constructor ==
    /// Creates an empty sweep with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Deleted ==
    pub fn record_deleted(&mut self) {
        self.deleted += 1;
    }

    // == Record Kept ==
    pub fn record_kept(&mut self) {
        self.kept += 1;
    }

    // == Record Failure ==
    pub fn record_failure(&mut self) {
        self.failed += 1;
    }
}

// == Step Outcome ==
/// Result of a single delete step within a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step ran and removed this many rows
    Deleted(u64),
    /// The step was disabled by configuration or its lease was held elsewhere
    Skipped,
    /// The step failed; the message is the logged error
    Failed(String),
}

impl StepOutcome {
    /// Rows removed, zero for skipped or failed steps.
    pub fn deleted_rows(&self) -> u64 {
        match self {
            StepOutcome::Deleted(rows) => *rows,
            _ => 0,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed(_))
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepOutcome::Deleted(rows) => write!(f, "deleted {} rows", rows),
            StepOutcome::Skipped => write!(f, "skipped"),
            StepOutcome::Failed(msg) => write!(f, "failed: {}", msg),
        }
    }
}

// == Tick Report ==
/// Everything one tick did, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub temp_files: TempFileSweep,
    pub snapshots: StepOutcome,
    pub dashboard_versions: StepOutcome,
    pub user_invites: StepOutcome,
    pub login_attempts: StepOutcome,
}

impl TickReport {
    /// Total database rows removed during the tick.
    pub fn total_deleted_rows(&self) -> u64 {
        self.steps().map(StepOutcome::deleted_rows).sum()
    }

    /// Number of delete steps that failed.
    pub fn failed_steps(&self) -> usize {
        self.steps().filter(|step| step.is_failed()).count()
    }

    fn steps(&self) -> impl Iterator<Item = &StepOutcome> {
        [
            &self.snapshots,
            &self.dashboard_versions,
            &self.user_invites,
            &self.login_attempts,
        ]
        .into_iter()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_new() {
        let sweep = TempFileSweep::new();
        assert_eq!(sweep.scanned, 0);
        assert_eq!(sweep.deleted, 0);
        assert_eq!(sweep.kept, 0);
        assert_eq!(sweep.failed, 0);
    }

    #[test]
    fn test_sweep_counters() {
        let mut sweep = TempFileSweep::new();
        sweep.record_deleted();
        sweep.record_deleted();
        sweep.record_kept();
        sweep.record_failure();
        assert_eq!(sweep.deleted, 2);
        assert_eq!(sweep.kept, 1);
        assert_eq!(sweep.failed, 1);
    }

    #[test]
    fn test_step_outcome_rows() {
        assert_eq!(StepOutcome::Deleted(7).deleted_rows(), 7);
        assert_eq!(StepOutcome::Skipped.deleted_rows(), 0);
        assert_eq!(StepOutcome::Failed("boom".into()).deleted_rows(), 0);
    }

    #[test]
    fn test_tick_report_totals() {
        let report = TickReport {
            temp_files: TempFileSweep::new(),
            snapshots: StepOutcome::Deleted(2),
            dashboard_versions: StepOutcome::Failed("locked".into()),
            user_invites: StepOutcome::Deleted(3),
            login_attempts: StepOutcome::Skipped,
        };
        assert_eq!(report.total_deleted_rows(), 5);
        assert_eq!(report.failed_steps(), 1);
    }

    #[test]
    fn test_step_outcome_display() {
        assert_eq!(StepOutcome::Deleted(4).to_string(), "deleted 4 rows");
        assert_eq!(StepOutcome::Skipped.to_string(), "skipped");
    }
}
