//! Microsecond timestamps ("mics").

use std::time::{SystemTime, UNIX_EPOCH};

pub const MICS_PER_SECOND: i64 = 1_000_000;
pub const MICS_PER_MINUTE: i64 = 60 * MICS_PER_SECOND;
pub const MICS_PER_HOUR: i64 = 60 * MICS_PER_MINUTE;
pub const MICS_PER_DAY: i64 = 24 * MICS_PER_HOUR;

/// Current time in microseconds since the Unix epoch.
///
/// A clock set before the epoch reads as 0.
pub fn now_mics() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as i64)
        .unwrap_or(0)
}

/// Round down to the start of the (UTC) day.
pub fn truncate_to_day(mics: i64) -> i64 {
    mics - mics.rem_euclid(MICS_PER_DAY)
}
