//! Wall-clock helpers.
//!
//! Expiration records store absolute epoch milliseconds, so everything that
//! writes or compares them goes through here.

use chrono::Utc;

/// Current time as epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Absolute expiry `seconds` from `now`, saturating on overflow.
pub fn expires_at(now: i64, seconds: u64) -> i64 {
    let millis = i64::try_from(seconds).unwrap_or(i64::MAX).saturating_mul(1000);
    now.saturating_add(millis)
}
