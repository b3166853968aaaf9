//! Wall-clock helpers. All scheduling arithmetic is done in UTC.

use chrono::{DateTime, TimeDelta, Utc};

/// Current wall-clock time.
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Milliseconds since the Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert the gap between `now` and `until` into a sleep duration.
///
/// Returns `Duration::ZERO` when `until` is not in the future.
#[must_use]
pub fn duration_until(now: DateTime<Utc>, until: DateTime<Utc>) -> std::time::Duration {
    (until - now).to_std().unwrap_or(std::time::Duration::ZERO)
}

/// Smallest representable step, used to make a lower bound exclusive.
pub(crate) fn tick() -> TimeDelta {
    TimeDelta::nanoseconds(1)
}
