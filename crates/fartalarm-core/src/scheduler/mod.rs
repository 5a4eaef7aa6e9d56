//! Single-threaded scheduling primitives.
//!
//! Every wait in the engine is expressed as an entry in a [`TimerQueue`]
//! checked against an injectable [`Clock`]. Nothing sleeps: the host polls
//! the queue, and tests drive time forward with a [`ManualClock`].

mod clock;
mod queue;

pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use queue::{TimerId, TimerQueue};

use chrono::{Datelike, Duration, Timelike};

/// Zero-padded `HH:MM` of the local wall time.
pub fn hhmm(at: &Timestamp) -> String {
    format!("{:02}:{:02}", at.hour(), at.minute())
}

/// Calendar-day string (`YYYY-MM-DD`) of the local wall time.
pub fn day_string(at: &Timestamp) -> String {
    at.date_naive().format("%Y-%m-%d").to_string()
}

/// Calendar-day string of `at - 24h`.
pub fn yesterday_string(at: &Timestamp) -> String {
    day_string(&(*at - Duration::hours(24)))
}

/// Day of week, 0 = Sunday .. 6 = Saturday.
pub fn day_index(at: &Timestamp) -> u32 {
    at.weekday().num_days_from_sunday()
}

/// Truncate to the start of the current minute.
pub fn floor_minute(at: &Timestamp) -> Timestamp {
    at.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(*at)
}

/// Human clock time such as `7:05 AM`, used in notification bodies.
pub fn display_time(at: &Timestamp) -> String {
    at.format("%-I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> Timestamp {
        FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(y, mo, d, h, mi, s)
            .unwrap()
    }

    #[test]
    fn formats_local_wall_time() {
        let t = at(2026, 10, 12, 7, 5, 42);
        assert_eq!(hhmm(&t), "07:05");
        assert_eq!(day_string(&t), "2026-10-12");
        assert_eq!(yesterday_string(&t), "2026-10-11");
        assert_eq!(display_time(&t), "7:05 AM");
    }

    #[test]
    fn day_index_starts_on_sunday() {
        assert_eq!(day_index(&at(2026, 10, 18, 9, 0, 0)), 0);
        assert_eq!(day_index(&at(2026, 10, 12, 9, 0, 0)), 1);
        assert_eq!(day_index(&at(2026, 10, 17, 9, 0, 0)), 6);
    }

    #[test]
    fn floor_minute_drops_seconds() {
        let t = at(2026, 10, 12, 7, 5, 42) + Duration::milliseconds(250);
        let floored = floor_minute(&t);
        assert_eq!(floored, at(2026, 10, 12, 7, 5, 0));
        assert_eq!(floored.nanosecond(), 0);
    }
}
