/// Location fix staleness detection.
///
/// Location providers may hand back a cached fix taken minutes ago (last
/// known position). Ranking against such a fix would tell the user they
/// are near a station they have already left, so the tracker drops fixes
/// older than a few seconds.
///
/// # Clock injection
/// `is_fix_stale_at` accepts a `now: DateTime<Utc>` parameter rather than
/// calling `Utc::now()` internally. This keeps staleness deterministic in
/// tests without mocking or time manipulation.

use chrono::{DateTime, Duration, Utc};

use crate::model::Fix;

/// Default bound on fix age, in seconds.
pub const DEFAULT_MAX_FIX_AGE_SECS: i64 = 5;

/// Returns `true` if the fix is older than `max_age` relative to `now`.
///
/// Staleness is strictly greater than the threshold:
///   age > max_age  →  stale
///   age == max_age →  not stale
///
/// Fixes stamped in the future (provider clock skew) are not stale.
pub fn is_fix_stale_at(fix: &Fix, max_age: Duration, now: DateTime<Utc>) -> bool {
    now - fix.timestamp > max_age
}

/// Convenience wrapper that uses the real current time.
/// Use `is_fix_stale_at` in tests to keep them deterministic.
pub fn is_fix_stale(fix: &Fix, max_age: Duration) -> bool {
    is_fix_stale_at(fix, max_age, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Coordinate;
    use chrono::TimeZone;

    fn fix_at(timestamp: DateTime<Utc>) -> Fix {
        Fix {
            coordinate: Coordinate::new(18.5204, 73.8567).unwrap(),
            accuracy_m: Some(12.0),
            timestamp,
        }
    }

    /// A fixed "now" used across all tests: 2024-07-01 10:00:00 UTC.
    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_fresh_fix_is_not_stale() {
        let fix = fix_at(fixed_now() - Duration::seconds(2));
        assert!(!is_fix_stale_at(&fix, Duration::seconds(5), fixed_now()));
    }

    #[test]
    fn test_fix_exactly_at_threshold_is_not_stale() {
        let fix = fix_at(fixed_now() - Duration::seconds(5));
        assert!(
            !is_fix_stale_at(&fix, Duration::seconds(5), fixed_now()),
            "staleness is strictly greater than, not >="
        );
    }

    #[test]
    fn test_fix_past_threshold_is_stale() {
        let fix = fix_at(fixed_now() - Duration::milliseconds(5_001));
        assert!(is_fix_stale_at(&fix, Duration::seconds(5), fixed_now()));
    }

    #[test]
    fn test_cached_fix_from_minutes_ago_is_stale() {
        let fix = fix_at(fixed_now() - Duration::minutes(10));
        assert!(is_fix_stale_at(&fix, Duration::seconds(DEFAULT_MAX_FIX_AGE_SECS), fixed_now()));
    }

    #[test]
    fn test_future_fix_is_not_stale() {
        let fix = fix_at(fixed_now() + Duration::seconds(30));
        assert!(!is_fix_stale_at(&fix, Duration::seconds(5), fixed_now()));
    }

    #[test]
    fn test_just_taken_fix_is_not_stale_against_real_clock() {
        let fix = fix_at(Utc::now());
        assert!(!is_fix_stale(&fix, Duration::seconds(5)));
    }
}
