//! Time intervals and interval lists.
//!
//! # Time Model
//! All times are seconds since the Unix epoch (UTC). Intervals are
//! half-open: `[start, end)` includes `start` and excludes `end`.
//!
//! # Ordering
//! Intervals are only ordered when they do not overlap. Two identical
//! intervals compare `Equal`; two overlapping, non-identical intervals are
//! incomparable (`partial_cmp` returns `None`, [`Interval::compare`] returns
//! an error). Sorting is therefore only valid for pairwise-disjoint sets.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::BitAnd;

use super::{format_timestamp, Duration, Timestamp};
use crate::error::IntervalError;

/// An immutable time interval `[start, end)`.
///
/// # Invariants
/// `start <= end`. Construction with `end < start` fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "(Timestamp, Timestamp)", into = "(Timestamp, Timestamp)")]
pub struct Interval {
    start: Timestamp,
    end: Timestamp,
}

impl Interval {
    /// Creates a new interval.
    ///
    /// # Errors
    /// [`IntervalError::InvalidInterval`] if `end < start`.
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self, IntervalError> {
        if end < start {
            return Err(IntervalError::InvalidInterval { start, end });
        }
        Ok(Self { start, end })
    }

    /// Creates an interval from bounds already known to be ordered.
    pub(crate) fn from_ordered(start: Timestamp, end: Timestamp) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// Interval start (inclusive).
    #[inline]
    pub fn start(&self) -> Timestamp {
        self.start
    }

    /// Interval end (exclusive).
    #[inline]
    pub fn end(&self) -> Timestamp {
        self.end
    }

    /// Length of the interval in seconds.
    #[inline]
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Whether a point in time falls within this interval.
    #[inline]
    pub fn contains(&self, time: Timestamp) -> bool {
        time >= self.start && time < self.end
    }

    /// Whether `other` lies completely within this interval.
    pub fn contains_interval(&self, other: &Self) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    /// Whether two intervals share at least one instant.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Returns the overlapping part of two intervals, if any.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start >= end {
            None
        } else {
            Some(Self { start, end })
        }
    }

    /// Merges two exactly adjacent intervals.
    ///
    /// Only adjacency is merged. For any other pair, `self` is returned
    /// unchanged; this is not a general union.
    pub fn combine(&self, other: &Self) -> Self {
        if other.end == self.start {
            Self {
                start: other.start,
                end: self.end,
            }
        } else if self.end == other.start {
            Self {
                start: self.start,
                end: other.end,
            }
        } else {
            *self
        }
    }

    /// Orders two intervals.
    ///
    /// # Errors
    /// [`IntervalError::Incomparable`] if the intervals overlap but are not
    /// identical.
    pub fn compare(&self, other: &Self) -> Result<Ordering, IntervalError> {
        if self == other {
            Ok(Ordering::Equal)
        } else if self.end <= other.start {
            Ok(Ordering::Less)
        } else if other.end <= self.start {
            Ok(Ordering::Greater)
        } else {
            Err(IntervalError::Incomparable(
                self.start,
                self.end,
                other.start,
                other.end,
            ))
        }
    }
}

impl PartialOrd for Interval {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(other).ok()
    }
}

impl TryFrom<(Timestamp, Timestamp)> for Interval {
    type Error = IntervalError;

    fn try_from((start, end): (Timestamp, Timestamp)) -> Result<Self, Self::Error> {
        Self::new(start, end)
    }
}

impl From<Interval> for (Timestamp, Timestamp) {
    fn from(iv: Interval) -> Self {
        (iv.start, iv.end)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {})",
            format_timestamp(self.start),
            format_timestamp(self.end)
        )
    }
}

/// A sorted list of pairwise non-overlapping intervals.
///
/// Intervals can only be appended in ascending order. An interval that
/// starts exactly where the last one ends is merged into it, so the list
/// never holds two adjacent entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalList {
    intervals: Vec<Interval>,
}

impl IntervalList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an interval at the end of the list.
    ///
    /// # Errors
    /// [`IntervalError::OverlapError`] if `iv` starts before the end of the
    /// last interval.
    pub fn append(&mut self, iv: Interval) -> Result<(), IntervalError> {
        if let Some(last) = self.intervals.last_mut() {
            if iv.start < last.end {
                return Err(IntervalError::OverlapError {
                    start: iv.start,
                    end: iv.end,
                    last_end: last.end,
                });
            }
            if iv.start == last.end {
                *last = Interval {
                    start: last.start,
                    end: iv.end,
                };
                return Ok(());
            }
        }
        self.intervals.push(iv);
        Ok(())
    }

    /// Computes the set intersection of two lists.
    ///
    /// Two-pointer sweep over both ascending lists, O(n + m). The result is
    /// ascending and non-overlapping.
    pub fn intersect(&self, other: &Self) -> Self {
        let mut result = Self::new();
        let (mut i, mut j) = (0, 0);

        while i < self.intervals.len() && j < other.intervals.len() {
            let a = &self.intervals[i];
            let b = &other.intervals[j];

            if let Some(overlap) = a.intersection(b) {
                // Inputs hold no adjacent entries, so neither does the output.
                result.intervals.push(overlap);
            }

            match a.end.cmp(&b.end) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
            }
        }

        result
    }

    /// Total covered time in seconds.
    pub fn total_duration(&self) -> Duration {
        self.intervals.iter().map(Interval::duration).sum()
    }

    /// Covered time within `period` in seconds.
    pub fn duration_within(&self, period: &Interval) -> Duration {
        self.intervals
            .iter()
            .filter_map(|iv| iv.intersection(period))
            .map(|iv| iv.duration())
            .sum()
    }

    /// Whether any interval of the list overlaps `period`.
    pub fn overlaps(&self, period: &Interval) -> bool {
        self.intervals.iter().any(|iv| iv.overlaps(period))
    }

    /// Whether a point in time is covered by the list.
    pub fn contains(&self, time: Timestamp) -> bool {
        self.intervals.iter().any(|iv| iv.contains(time))
    }

    /// Number of intervals.
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// First interval.
    pub fn first(&self) -> Option<&Interval> {
        self.intervals.first()
    }

    /// Last interval.
    pub fn last(&self) -> Option<&Interval> {
        self.intervals.last()
    }

    /// Iterates the intervals in ascending order.
    pub fn iter(&self) -> std::slice::Iter<'_, Interval> {
        self.intervals.iter()
    }

    /// Removes all intervals.
    pub fn clear(&mut self) {
        self.intervals.clear();
    }
}

impl BitAnd for &IntervalList {
    type Output = IntervalList;

    fn bitand(self, rhs: Self) -> IntervalList {
        self.intersect(rhs)
    }
}

impl<'a> IntoIterator for &'a IntervalList {
    type Item = &'a Interval;
    type IntoIter = std::slice::Iter<'a, Interval>;

    fn into_iter(self) -> Self::IntoIter {
        self.intervals.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iv(start: i64, end: i64) -> Interval {
        Interval::new(start, end).unwrap()
    }

    fn list(ivs: &[(i64, i64)]) -> IntervalList {
        let mut l = IntervalList::new();
        for &(s, e) in ivs {
            l.append(iv(s, e)).unwrap();
        }
        l
    }

    #[test]
    fn test_interval_basics() {
        let w = iv(100, 200);
        assert_eq!(w.duration(), 100);
        assert!(w.contains(100));
        assert!(w.contains(199));
        assert!(!w.contains(200)); // exclusive end
        assert!(!w.contains(50));
        assert!(w.contains_interval(&iv(120, 200)));
        assert!(!w.contains_interval(&iv(120, 201)));
    }

    #[test]
    fn test_invalid_interval() {
        assert_eq!(
            Interval::new(10, 5),
            Err(IntervalError::InvalidInterval { start: 10, end: 5 })
        );
        assert!(Interval::new(5, 5).is_ok());
    }

    #[test]
    fn test_overlap_symmetry() {
        let a = iv(0, 100);
        let b = iv(50, 150);
        let c = iv(100, 200); // touching but not overlapping
        for (x, y) in [(a, b), (a, c), (b, c)] {
            assert_eq!(x.overlaps(&y), y.overlaps(&x));
        }
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_intersection() {
        assert_eq!(iv(0, 100).intersection(&iv(50, 150)), Some(iv(50, 100)));
        assert_eq!(iv(0, 100).intersection(&iv(100, 150)), None);
    }

    #[test]
    fn test_combine_adjacent_only() {
        let a = iv(0, 10);
        assert_eq!(a.combine(&iv(10, 20)), iv(0, 20));
        assert_eq!(a.combine(&iv(-5, 0)), iv(-5, 10));
        // Overlapping or distant intervals leave self unchanged.
        assert_eq!(a.combine(&iv(5, 20)), a);
        assert_eq!(a.combine(&iv(30, 40)), a);
    }

    #[test]
    fn test_ordering() {
        assert_eq!(iv(0, 10).compare(&iv(10, 20)), Ok(Ordering::Less));
        assert_eq!(iv(10, 20).compare(&iv(0, 10)), Ok(Ordering::Greater));
        assert_eq!(iv(0, 10).compare(&iv(0, 10)), Ok(Ordering::Equal));
        assert!(iv(0, 10).compare(&iv(5, 15)).is_err());
        assert_eq!(iv(0, 10).partial_cmp(&iv(5, 15)), None);
        assert!(iv(0, 10) < iv(20, 30));
    }

    #[test]
    fn test_append_merges_adjacent() {
        let l = list(&[(0, 10), (10, 20)]);
        assert_eq!(l.len(), 1);
        assert_eq!(l.first(), Some(&iv(0, 20)));

        let l = list(&[(0, 10), (15, 20), (20, 30)]);
        assert_eq!(l.iter().copied().collect::<Vec<_>>(), vec![iv(0, 10), iv(15, 30)]);
    }

    #[test]
    fn test_append_out_of_order() {
        let mut l = list(&[(0, 10)]);
        let err = l.append(iv(5, 15)).unwrap_err();
        assert!(matches!(err, IntervalError::OverlapError { last_end: 10, .. }));
        assert!(l.append(iv(-10, -5)).is_err());
        assert_eq!(l.len(), 1);
    }

    #[test]
    fn test_intersect() {
        let a = list(&[(0, 10), (20, 30), (40, 50)]);
        let b = list(&[(5, 25), (28, 45)]);
        let expected = list(&[(5, 10), (20, 25), (28, 30), (40, 45)]);

        assert_eq!(a.intersect(&b), expected);
        assert_eq!(&b & &a, expected); // commutative
        assert_eq!(&a & &a, a); // idempotent
        assert!(a.intersect(&IntervalList::new()).is_empty());
    }

    #[test]
    fn test_duration_within() {
        let l = list(&[(0, 10), (20, 30)]);
        assert_eq!(l.total_duration(), 20);
        assert_eq!(l.duration_within(&iv(5, 25)), 10);
        assert!(l.overlaps(&iv(9, 11)));
        assert!(!l.overlaps(&iv(10, 20)));
    }

    #[test]
    fn test_serde_rejects_inverted() {
        let ok: Interval = serde_json::from_str("[0, 10]").unwrap();
        assert_eq!(ok, iv(0, 10));
        assert!(serde_json::from_str::<Interval>("[10, 0]").is_err());
    }
}
