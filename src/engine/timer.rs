//! Timer authority for timed auction phases.
//!
//! The server-side expiry instant is the single source of truth. Clients
//! render countdowns from the broadcast `expires_at` but never decide
//! expiry themselves, so clock skew cannot be used to win an auction on a
//! dead timer. All functions take `now` explicitly; callers pass
//! `Utc::now()` in production and fixed instants in tests.

use chrono::{DateTime, Duration, Utc};

/// Compute the expiry instant for a phase starting now.
pub fn start(duration_seconds: i64, now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::seconds(duration_seconds.max(0))
}

/// Restart the window. Every accepted bid grants a full fresh window
/// rather than extending to a minimum floor.
pub fn reset(duration_seconds: i64, now: DateTime<Utc>) -> DateTime<Utc> {
    start(duration_seconds, now)
}

/// Whole seconds remaining, clamped to zero.
pub fn remaining_seconds(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (expires_at - now).num_seconds().max(0)
}

pub fn is_expired(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now >= expires_at
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 20, 21, 0, 0).unwrap()
    }

    #[test]
    fn test_start_adds_duration() {
        let expires = start(30, t0());
        assert_eq!(remaining_seconds(expires, t0()), 30);
        assert!(!is_expired(expires, t0()));
    }

    #[test]
    fn test_remaining_clamps_to_zero() {
        let expires = start(10, t0());
        let late = t0() + Duration::seconds(25);
        assert_eq!(remaining_seconds(expires, late), 0);
    }

    #[test]
    fn test_expiry_is_monotonic() {
        let expires = start(10, t0());
        let mut now = t0();
        let mut seen_expired = false;
        for _ in 0..30 {
            let expired = is_expired(expires, now);
            if seen_expired {
                // once expired, stays expired
                assert!(expired);
            }
            seen_expired = expired;
            now = now + Duration::seconds(1);
        }
        assert!(seen_expired);
    }

    #[test]
    fn test_reset_grants_full_window() {
        let first = start(30, t0());
        let later = t0() + Duration::seconds(28);
        let second = reset(30, later);
        assert!(second > first);
        assert_eq!(remaining_seconds(second, later), 30);
    }

    #[test]
    fn test_negative_duration_expires_immediately() {
        let expires = start(-5, t0());
        assert!(is_expired(expires, t0()));
    }
}
