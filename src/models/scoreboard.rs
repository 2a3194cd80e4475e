//! Fixed-resolution time discretization.
//!
//! A scoreboard splits a date range into equally sized slots and stores
//! one value per slot. The scheduler uses it to track per-resource
//! availability (free, off duty, on vacation, booked).
//!
//! # Geometry
//! `size = ceil((end - start) / resolution) + 1`. Slot `i` starts at
//! `start + i * resolution`; index 0 corresponds to `start`.

use std::ops::{Index, IndexMut};

use super::{Duration, Interval, Timestamp};
use crate::error::ScoreboardError;

/// Slot values of a resource scoreboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Working time, not booked.
    Free,
    /// Outside of working hours.
    OffDuty,
    /// Inside a vacation.
    Vacation,
    /// Booked by the task with this index.
    Booked(usize),
}

impl Slot {
    /// Whether the slot is not working time.
    #[inline]
    pub fn is_time_off(&self) -> bool {
        matches!(self, Slot::OffDuty | Slot::Vacation)
    }
}

/// A date range discretized into slots of `resolution` seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Scoreboard<T> {
    start: Timestamp,
    end: Timestamp,
    resolution: Duration,
    slots: Vec<T>,
}

impl<T: Clone> Scoreboard<T> {
    /// Creates a scoreboard with every slot set to `init`.
    ///
    /// # Errors
    /// [`ScoreboardError::InvalidGeometry`] if `resolution <= 0` or
    /// `end < start`.
    pub fn new(
        start: Timestamp,
        end: Timestamp,
        resolution: Duration,
        init: T,
    ) -> Result<Self, ScoreboardError> {
        if resolution <= 0 {
            return Err(ScoreboardError::InvalidGeometry(format!(
                "resolution must be positive, got {resolution}"
            )));
        }
        if end < start {
            return Err(ScoreboardError::InvalidGeometry(format!(
                "end {end} is before start {start}"
            )));
        }
        let span = end - start;
        let size = (span + resolution - 1) / resolution + 1;
        Ok(Self {
            start,
            end,
            resolution,
            slots: vec![init; size as usize],
        })
    }

    /// Sets every slot to `value`.
    pub fn fill(&mut self, value: T) {
        self.slots.iter_mut().for_each(|s| *s = value.clone());
    }
}

impl<T> Scoreboard<T> {
    /// Start of the covered range.
    pub fn start_date(&self) -> Timestamp {
        self.start
    }

    /// End of the covered range.
    pub fn end_date(&self) -> Timestamp {
        self.end
    }

    /// Slot length in seconds.
    pub fn resolution(&self) -> Duration {
        self.resolution
    }

    /// Number of slots.
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Converts a date into a slot index.
    ///
    /// With `clamp`, dates outside the range saturate to the first or last
    /// slot.
    ///
    /// # Errors
    /// [`ScoreboardError::DateOutOfRange`] if the date is outside the range
    /// and `clamp` is not set.
    pub fn date_to_idx(&self, date: Timestamp, clamp: bool) -> Result<usize, ScoreboardError> {
        let idx = (date - self.start).div_euclid(self.resolution);
        if idx < 0 {
            return if clamp { Ok(0) } else { Err(self.out_of_range(date)) };
        }
        if idx as usize >= self.slots.len() {
            return if clamp {
                Ok(self.slots.len() - 1)
            } else {
                Err(self.out_of_range(date))
            };
        }
        Ok(idx as usize)
    }

    /// Converts a slot index into the start date of that slot.
    ///
    /// With `clamp`, indices outside the scoreboard saturate.
    ///
    /// # Errors
    /// [`ScoreboardError::IndexOutOfRange`] if `idx` is outside the
    /// scoreboard and `clamp` is not set.
    pub fn idx_to_date(&self, idx: i64, clamp: bool) -> Result<Timestamp, ScoreboardError> {
        let last = self.slots.len() as i64 - 1;
        let idx = if (0..=last).contains(&idx) {
            idx
        } else if clamp {
            idx.clamp(0, last)
        } else {
            return Err(ScoreboardError::IndexOutOfRange {
                index: idx,
                size: self.slots.len(),
            });
        };
        Ok(self.start + idx * self.resolution)
    }

    fn out_of_range(&self, date: Timestamp) -> ScoreboardError {
        ScoreboardError::DateOutOfRange {
            date,
            start: self.start,
            end: self.end,
        }
    }

    /// Start date of slot `idx` without range checks.
    #[inline]
    pub(crate) fn slot_start(&self, idx: usize) -> Timestamp {
        self.start + idx as i64 * self.resolution
    }

    /// Value of the slot containing `date`.
    pub fn get(&self, date: Timestamp) -> Result<&T, ScoreboardError> {
        let idx = self.date_to_idx(date, false)?;
        Ok(&self.slots[idx])
    }

    /// Sets the slot containing `date`.
    pub fn set(&mut self, date: Timestamp, value: T) -> Result<(), ScoreboardError> {
        let idx = self.date_to_idx(date, false)?;
        self.slots[idx] = value;
        Ok(())
    }

    /// Value at `idx`, if in range.
    pub fn get_idx(&self, idx: usize) -> Option<&T> {
        self.slots.get(idx)
    }

    /// Iterates all slot values.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.slots.iter()
    }

    /// Collects all maximal runs of slots matching `pred` within `period`.
    ///
    /// The period is clamped to the scoreboard range. A run qualifies when
    /// `run_length * resolution >= min_duration`; at least one slot is
    /// always required.
    pub fn collect_intervals<F>(
        &self,
        period: &Interval,
        min_duration: Duration,
        mut pred: F,
    ) -> Vec<Interval>
    where
        F: FnMut(&T) -> bool,
    {
        let mut intervals = Vec::new();
        let (Ok(start_idx), Ok(end_idx)) = (
            self.date_to_idx(period.start(), true),
            self.date_to_idx(period.end(), true),
        ) else {
            return intervals;
        };

        let min_slots = ((min_duration + self.resolution - 1) / self.resolution).max(1) as usize;
        let mut run: Option<(usize, usize)> = None;

        for idx in start_idx..end_idx {
            if pred(&self.slots[idx]) {
                run = Some(match run {
                    Some((first, len)) => (first, len + 1),
                    None => (idx, 1),
                });
            } else if let Some((first, len)) = run.take() {
                if len >= min_slots {
                    intervals.push(Interval::from_ordered(
                        self.slot_start(first),
                        self.slot_start(idx),
                    ));
                }
            }
        }
        if let Some((first, len)) = run {
            if len >= min_slots {
                intervals.push(Interval::from_ordered(
                    self.slot_start(first),
                    self.slot_start(end_idx),
                ));
            }
        }

        intervals
    }
}

impl<T: PartialEq> Scoreboard<T> {
    /// Collects runs of slots whose value is one of `targets`.
    ///
    /// See [`collect_intervals`](Self::collect_intervals).
    pub fn collect_time_off_intervals(
        &self,
        period: &Interval,
        min_duration: Duration,
        targets: &[T],
    ) -> Vec<Interval> {
        self.collect_intervals(period, min_duration, |v| targets.contains(v))
    }
}

impl<T> Index<usize> for Scoreboard<T> {
    type Output = T;

    fn index(&self, idx: usize) -> &T {
        &self.slots[idx]
    }
}

impl<T> IndexMut<usize> for Scoreboard<T> {
    fn index_mut(&mut self, idx: usize) -> &mut T {
        &mut self.slots[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: i64 = 3600;

    fn board() -> Scoreboard<Slot> {
        Scoreboard::new(0, 24 * HOUR, HOUR, Slot::Free).unwrap()
    }

    #[test]
    fn test_geometry() {
        let sb = board();
        assert_eq!(sb.size(), 25);
        let sb = Scoreboard::new(0, 90, 60, 0u8).unwrap();
        assert_eq!(sb.size(), 3); // ceil(1.5) + 1
        assert!(Scoreboard::new(0, 10, 0, 0u8).is_err());
        assert!(Scoreboard::new(10, 0, 1, 0u8).is_err());
    }

    #[test]
    fn test_date_idx_round_trip() {
        let sb = board();
        for d in [0, 1, HOUR - 1, HOUR, 5 * HOUR + 1234, 24 * HOUR] {
            let idx = sb.date_to_idx(d, false).unwrap();
            let back = sb.idx_to_date(idx as i64, false).unwrap();
            assert_eq!(back, d - d % HOUR);
        }
    }

    #[test]
    fn test_out_of_range() {
        let sb = board();
        assert!(matches!(
            sb.date_to_idx(-1, false),
            Err(ScoreboardError::DateOutOfRange { .. })
        ));
        assert_eq!(sb.date_to_idx(-1, true), Ok(0));
        assert_eq!(sb.date_to_idx(100 * HOUR, true), Ok(24));
        assert!(sb.idx_to_date(25, false).is_err());
        assert_eq!(sb.idx_to_date(99, true), Ok(24 * HOUR));
        assert_eq!(sb.idx_to_date(-3, true), Ok(0));
    }

    #[test]
    fn test_get_set() {
        let mut sb = board();
        sb.set(2 * HOUR + 10, Slot::Booked(3)).unwrap();
        assert_eq!(sb.get(2 * HOUR).unwrap(), &Slot::Booked(3));
        assert_eq!(sb[2], Slot::Booked(3));
        sb[3] = Slot::Vacation;
        assert!(sb[3].is_time_off());
        assert!(sb.set(-5, Slot::Free).is_err());
    }

    #[test]
    fn test_collect_single_run() {
        let mut sb = board();
        for idx in 5..=9 {
            sb[idx] = Slot::OffDuty;
        }
        let period = Interval::new(0, 24 * HOUR).unwrap();
        let runs = sb.collect_time_off_intervals(&period, HOUR, &[Slot::OffDuty]);
        assert_eq!(runs, vec![Interval::new(5 * HOUR, 10 * HOUR).unwrap()]);
    }

    #[test]
    fn test_collect_min_duration_filters() {
        let mut sb = board();
        sb[2] = Slot::Vacation;
        for idx in 10..14 {
            sb[idx] = Slot::OffDuty;
        }
        let period = Interval::new(0, 24 * HOUR).unwrap();
        let runs = sb.collect_intervals(&period, 3 * HOUR, Slot::is_time_off);
        assert_eq!(runs, vec![Interval::new(10 * HOUR, 14 * HOUR).unwrap()]);

        // A zero minimum still requires one slot.
        let runs = sb.collect_time_off_intervals(&period, 0, &[Slot::Vacation]);
        assert_eq!(runs, vec![Interval::new(2 * HOUR, 3 * HOUR).unwrap()]);
    }

    #[test]
    fn test_collect_run_reaching_period_end() {
        let mut sb = board();
        for idx in 20..25 {
            sb[idx] = Slot::OffDuty;
        }
        let period = Interval::new(18 * HOUR, 22 * HOUR).unwrap();
        let runs = sb.collect_time_off_intervals(&period, HOUR, &[Slot::OffDuty]);
        assert_eq!(runs, vec![Interval::new(20 * HOUR, 22 * HOUR).unwrap()]);
    }
}
