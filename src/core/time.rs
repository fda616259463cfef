//! Time amounts and calendar-day bucketing.
//!
//! Everything works on epoch milliseconds. Calendar days are resolved in an
//! explicit timezone so results never depend on the host's local time.

use chrono::{DateTime, Datelike};
use chrono_tz::Tz;

pub const SECOND_MS: i64 = 1_000;
pub const MINUTE_MS: i64 = 60 * SECOND_MS;
pub const HOUR_MS: i64 = 60 * MINUTE_MS;
pub const DAY_MS: i64 = 24 * HOUR_MS;
pub const WEEK_MS: i64 = 7 * DAY_MS;
/// A month is always 30 days.
pub const MONTH_MS: i64 = 30 * DAY_MS;

/// Maps timestamps to the day of the year in a fixed timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayBucketer {
    timezone: Tz,
}

impl DayBucketer {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Ordinal day of the year (1-366). Out-of-range timestamps map to 0.
    pub fn day_of_year(&self, epoch_ms: i64) -> u32 {
        DateTime::from_timestamp_millis(epoch_ms)
            .map(|utc| utc.with_timezone(&self.timezone).ordinal())
            .unwrap_or(0)
    }
}

impl Default for DayBucketer {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}
