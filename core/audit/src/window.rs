//! Start of the audited time window.

use chrono::{DateTime, Duration, Utc};

/// Length of the audited window: exactly 24 hours, not a calendar day.
pub fn window_length() -> Duration {
    Duration::hours(24)
}

/// Epoch milliseconds of `now` minus 24 hours, rounded to the nearest
/// millisecond.
pub fn window_start_millis(now: DateTime<Utc>) -> i64 {
    let start = now - window_length();
    let millis = start.timestamp_millis();
    if start.timestamp_subsec_nanos() % 1_000_000 >= 500_000 {
        millis + 1
    } else {
        millis
    }
}

/// Window start relative to the current wall clock.
pub fn yesterday_millis() -> i64 {
    window_start_millis(Utc::now())
}
