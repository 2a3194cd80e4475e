//! Weekly working hours.
//!
//! Defines when a project, resource, or shift is on duty: one list of
//! daily time windows per weekday. Vacations are modelled separately as
//! plain [`Interval`]s and override working hours wherever they apply.
//!
//! # Time Model
//! Timestamps are seconds since the Unix epoch, interpreted in UTC.
//! Daily windows are seconds after midnight, half-open.

use chrono::{DateTime, Datelike, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use super::{Duration, Interval, Timestamp};

const SECONDS_PER_DAY: i64 = 86_400;

/// A daily time window `[start_secs, end_secs)` in seconds after midnight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeWindow {
    /// Window start (seconds after midnight, inclusive).
    pub start_secs: u32,
    /// Window end (seconds after midnight, exclusive; at most 86400).
    pub end_secs: u32,
}

impl TimeWindow {
    /// Creates a new window.
    pub fn new(start_secs: u32, end_secs: u32) -> Self {
        Self {
            start_secs,
            end_secs: end_secs.min(SECONDS_PER_DAY as u32),
        }
    }

    /// Creates a window from whole hours, e.g. `hours(9, 17)`.
    pub fn hours(start_hour: u32, end_hour: u32) -> Self {
        Self::new(start_hour * 3600, end_hour * 3600)
    }

    /// Duration of this window (seconds).
    #[inline]
    pub fn duration(&self) -> Duration {
        i64::from(self.end_secs.saturating_sub(self.start_secs))
    }

    /// Whether a time of day falls within this window.
    #[inline]
    pub fn contains(&self, secs_of_day: u32) -> bool {
        secs_of_day >= self.start_secs && secs_of_day < self.end_secs
    }
}

/// Weekly working-hours pattern.
///
/// `days[0]` is Monday, `days[6]` is Sunday. A day without windows is a
/// day off.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkingHours {
    days: [Vec<TimeWindow>; 7],
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self::office()
    }
}

impl WorkingHours {
    /// Creates a pattern without any working time.
    pub fn none() -> Self {
        Self {
            days: Default::default(),
        }
    }

    /// Creates a pattern that is on duty around the clock.
    pub fn always() -> Self {
        let mut wh = Self::none();
        for day in wh.days.iter_mut() {
            day.push(TimeWindow::new(0, SECONDS_PER_DAY as u32));
        }
        wh
    }

    /// Monday to Friday, 09:00-12:00 and 13:00-18:00.
    pub fn office() -> Self {
        let mut wh = Self::none();
        for day in [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ] {
            wh.set_day(day, vec![TimeWindow::hours(9, 12), TimeWindow::hours(13, 18)]);
        }
        wh
    }

    /// Replaces the windows of one weekday.
    pub fn set_day(&mut self, weekday: Weekday, mut windows: Vec<TimeWindow>) {
        windows.sort_by_key(|w| w.start_secs);
        self.days[weekday.num_days_from_monday() as usize] = windows;
    }

    /// Builder form of [`set_day`](Self::set_day).
    pub fn with_day(mut self, weekday: Weekday, windows: Vec<TimeWindow>) -> Self {
        self.set_day(weekday, windows);
        self
    }

    /// Windows of one weekday.
    pub fn windows(&self, weekday: Weekday) -> &[TimeWindow] {
        &self.days[weekday.num_days_from_monday() as usize]
    }

    /// Whether `time` falls within working hours.
    pub fn on_shift(&self, time: Timestamp) -> bool {
        match DateTime::from_timestamp(time, 0) {
            Some(dt) => self
                .windows(dt.weekday())
                .iter()
                .any(|w| w.contains(dt.num_seconds_from_midnight())),
            None => false,
        }
    }

    /// Whether the day containing `time` has any working hours.
    pub fn is_working_day(&self, time: Timestamp) -> bool {
        DateTime::from_timestamp(time, 0)
            .map(|dt| !self.windows(dt.weekday()).is_empty())
            .unwrap_or(false)
    }

    /// Working seconds per week.
    pub fn weekly_working_seconds(&self) -> Duration {
        self.days
            .iter()
            .flat_map(|d| d.iter())
            .map(TimeWindow::duration)
            .sum()
    }

    /// Working seconds within `period`.
    pub fn working_seconds_in(&self, period: &Interval) -> Duration {
        let mut total = 0;
        let mut day_start = period.start().div_euclid(SECONDS_PER_DAY) * SECONDS_PER_DAY;

        while day_start < period.end() {
            if let Some(dt) = DateTime::from_timestamp(day_start, 0) {
                for w in self.windows(dt.weekday()) {
                    let start = (day_start + i64::from(w.start_secs)).max(period.start());
                    let end = (day_start + i64::from(w.end_secs)).min(period.end());
                    if end > start {
                        total += end - start;
                    }
                }
            }
            day_start += SECONDS_PER_DAY;
        }

        total
    }
}

/// Whether any vacation interval contains `time`.
pub fn on_vacation(vacations: &[Interval], time: Timestamp) -> bool {
    vacations.iter().any(|v| v.contains(time))
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2026-01-05 00:00:00 UTC, a Monday.
    const MONDAY: i64 = 1_767_571_200;
    const HOUR: i64 = 3600;

    #[test]
    fn test_time_window() {
        let w = TimeWindow::hours(9, 17);
        assert_eq!(w.duration(), 8 * HOUR);
        assert!(w.contains(9 * 3600));
        assert!(!w.contains(17 * 3600)); // exclusive end
    }

    #[test]
    fn test_office_hours() {
        let wh = WorkingHours::office();
        assert!(wh.on_shift(MONDAY + 9 * HOUR));
        assert!(!wh.on_shift(MONDAY + 12 * HOUR)); // lunch
        assert!(wh.on_shift(MONDAY + 13 * HOUR));
        assert!(!wh.on_shift(MONDAY + 18 * HOUR));
        // Saturday
        assert!(!wh.on_shift(MONDAY + 5 * 24 * HOUR + 10 * HOUR));
        assert!(!wh.is_working_day(MONDAY + 5 * 24 * HOUR));
        assert_eq!(wh.weekly_working_seconds(), 5 * 8 * HOUR);
    }

    #[test]
    fn test_custom_day() {
        let wh = WorkingHours::none().with_day(Weekday::Mon, vec![TimeWindow::hours(9, 17)]);
        assert!(wh.on_shift(MONDAY + 16 * HOUR));
        assert!(!wh.on_shift(MONDAY + 24 * HOUR + 10 * HOUR)); // Tuesday
    }

    #[test]
    fn test_always() {
        let wh = WorkingHours::always();
        assert!(wh.on_shift(MONDAY + 3 * HOUR));
        assert_eq!(wh.weekly_working_seconds(), 7 * 24 * HOUR);
    }

    #[test]
    fn test_working_seconds_in() {
        let wh = WorkingHours::office();
        let week = Interval::new(MONDAY, MONDAY + 7 * 24 * HOUR).unwrap();
        assert_eq!(wh.working_seconds_in(&week), 40 * HOUR);

        let morning = Interval::new(MONDAY + 10 * HOUR, MONDAY + 14 * HOUR).unwrap();
        assert_eq!(wh.working_seconds_in(&morning), 3 * HOUR);
    }

    #[test]
    fn test_on_vacation() {
        let vac = vec![Interval::new(100, 200).unwrap()];
        assert!(on_vacation(&vac, 150));
        assert!(!on_vacation(&vac, 200));
    }
}
