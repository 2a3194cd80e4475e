//! Time primitives.
//!
//! Provides the leaf data types every other module builds on: half-open
//! intervals, ascending interval lists, weekly working hours, and the
//! fixed-resolution scoreboard.
//!
//! # Time Representation
//! All times are seconds since the Unix epoch (UTC). Durations are
//! seconds. `chrono` is only used to derive weekdays and times of day and
//! to render dates in messages.

mod calendar;
mod interval;
mod scoreboard;

pub use calendar::{on_vacation, TimeWindow, WorkingHours};
pub use interval::{Interval, IntervalList};
pub use scoreboard::{Scoreboard, Slot};

use chrono::DateTime;

/// Seconds since the Unix epoch (UTC).
pub type Timestamp = i64;

/// A span of time in seconds.
pub type Duration = i64;

/// Renders a timestamp as `YYYY-MM-DD-HH:MM`.
pub fn format_timestamp(time: Timestamp) -> String {
    match DateTime::from_timestamp(time, 0) {
        Some(dt) => dt.format("%Y-%m-%d-%H:%M").to_string(),
        None => time.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(1_767_571_200), "2026-01-05-00:00");
        assert_eq!(format_timestamp(1_767_571_200 + 9 * 3600), "2026-01-05-09:00");
    }
}
