//! Expiration Policy Module
//!
//! Pure age checks deciding whether a temp file or record is stale.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

// == Should Cleanup Temp File ==
/// Decides whether a temp file last modified at `mod_time` is stale at `now`.
///
/// Boundary condition: a file is stale once its age is greater than or equal
/// to `lifetime`, so a file becomes eligible the instant the lifetime has fully
/// elapsed. A zero lifetime disables the sweep entirely.
///
/// # Returns
/// - `false` if `lifetime` is zero, whatever the file's age
/// - `false` if the file's timestamp lies in the future
/// - `true` if `now - mod_time >= lifetime`
pub fn should_cleanup_temp_file(
    mod_time: DateTime<Utc>,
    now: DateTime<Utc>,
    lifetime: Duration,
) -> bool {
    if lifetime.is_zero() {
        return false;
    }

    // Lifetimes too large for chrono can never elapse
    match TimeDelta::from_std(lifetime) {
        Ok(lifetime) => now.signed_duration_since(mod_time) >= lifetime,
        Err(_) => false,
    }
}

// == Cutoff ==
/// Returns the timestamp below which records older than `max_age` are expired.
///
/// Saturates at the minimum representable time instead of overflowing.
pub fn cutoff(now: DateTime<Utc>, max_age: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(max_age)
        .ok()
        .and_then(|age| now.checked_sub_signed(age))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(60 * 60);

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_zero_lifetime_never_expires() {
        let now = at(1_700_000_000);
        let ancient = at(0);
        assert!(!should_cleanup_temp_file(ancient, now, Duration::ZERO));
    }

    #[test]
    fn test_old_file_is_stale() {
        let now = at(1_700_000_000);
        let two_hours_ago = at(1_700_000_000 - 2 * 3600);
        assert!(should_cleanup_temp_file(two_hours_ago, now, HOUR));
    }

    #[test]
    fn test_young_file_is_kept() {
        let now = at(1_700_000_000);
        let half_hour_ago = at(1_700_000_000 - 1800);
        assert!(!should_cleanup_temp_file(half_hour_ago, now, HOUR));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = at(1_700_000_000);
        let exactly_one_hour = at(1_700_000_000 - 3600);
        assert!(
            should_cleanup_temp_file(exactly_one_hour, now, HOUR),
            "File should be stale once the lifetime has fully elapsed"
        );
    }

    #[test]
    fn test_future_mod_time_is_kept() {
        let now = at(1_700_000_000);
        let future = at(1_700_000_000 + 3600);
        assert!(!should_cleanup_temp_file(future, now, HOUR));
    }

    #[test]
    fn test_huge_lifetime_never_expires() {
        let now = at(1_700_000_000);
        assert!(!should_cleanup_temp_file(at(0), now, Duration::MAX));
    }

    #[test]
    fn test_cutoff_three_days() {
        let now = at(1_700_000_000);
        let cut = cutoff(now, Duration::from_secs(3 * 24 * 3600));
        assert_eq!(cut, at(1_700_000_000 - 3 * 24 * 3600));
    }

    #[test]
    fn test_cutoff_saturates() {
        let now = at(1_700_000_000);
        assert_eq!(cutoff(now, Duration::MAX), DateTime::<Utc>::MIN_UTC);
    }
}
