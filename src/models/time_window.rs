//! Time intervals and maintenance windows.
//!
//! # Time Model
//! All times are in milliseconds relative to a planning epoch.
//! The consumer defines what the epoch means (e.g., shift start, midnight UTC).

use serde::{Deserialize, Serialize};

/// Milliseconds in one hour.
pub const HOUR_MS: i64 = 3_600_000;

/// Milliseconds in one day.
pub const DAY_MS: i64 = 24 * HOUR_MS;

/// Largest instant or duration magnitude accepted as input (ms), 100 years.
///
/// Keeps every sum of two accepted times far from `i64` overflow.
pub const MAX_TIME_MS: i64 = 36_600 * DAY_MS;

/// A time interval [start, end).
///
/// Half-open interval: includes start, excludes end.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    /// Interval start (ms, inclusive).
    pub start_ms: i64,
    /// Interval end (ms, exclusive).
    pub end_ms: i64,
}

impl TimeWindow {
    /// Creates a new time window.
    pub fn new(start_ms: i64, end_ms: i64) -> Self {
        Self { start_ms, end_ms }
    }

    /// Duration of this window (ms).
    #[inline]
    pub fn duration_ms(&self) -> i64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    /// Whether a timestamp falls within this window.
    #[inline]
    pub fn contains(&self, time_ms: i64) -> bool {
        time_ms >= self.start_ms && time_ms < self.end_ms
    }

    /// Whether two windows overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start_ms < other.end_ms && other.start_ms < self.end_ms
    }

    /// Length of the intersection with another window (ms, 0 if disjoint).
    pub fn overlap_ms(&self, other: &Self) -> i64 {
        let start = self.start_ms.max(other.start_ms);
        let end = self.end_ms.min(other.end_ms);
        end.saturating_sub(start).max(0)
    }
}

/// Earliest start at or after `from_ms` such that `[start, start + duration_ms)`
/// does not intersect any blocked window.
///
/// Windows may be unsorted and may overlap each other.
pub fn earliest_clear_start(blocked: &[TimeWindow], from_ms: i64, duration_ms: i64) -> i64 {
    if blocked.is_empty() {
        return from_ms;
    }
    let mut start = from_ms;
    // Each pass either returns or moves start to the end of a blocking
    // window, so the loop is bounded by the number of windows.
    for _ in 0..=blocked.len() {
        let job = TimeWindow::new(start, start.saturating_add(duration_ms.max(1)));
        match blocked
            .iter()
            .filter(|w| w.duration_ms() > 0 && w.overlaps(&job))
            .map(|w| w.end_ms)
            .max()
        {
            Some(end) => start = end,
            None => return start,
        }
    }
    start
}

/// Total blocked time inside `range` (ms), counting overlapping windows once.
pub fn blocked_ms_in_range(blocked: &[TimeWindow], range: &TimeWindow) -> i64 {
    let mut clipped: Vec<TimeWindow> = blocked
        .iter()
        .filter(|w| w.overlaps(range))
        .map(|w| TimeWindow::new(w.start_ms.max(range.start_ms), w.end_ms.min(range.end_ms)))
        .collect();
    clipped.sort_by_key(|w| w.start_ms);

    let mut total: i64 = 0;
    let mut cursor = range.start_ms;
    for w in clipped {
        let start = w.start_ms.max(cursor);
        if w.end_ms > start {
            total = total.saturating_add(w.end_ms.saturating_sub(start));
            cursor = w.end_ms;
        }
    }
    total
}
