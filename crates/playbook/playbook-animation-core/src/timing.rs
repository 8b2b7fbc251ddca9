//! Time windows and the setup/action/settle split shared by paths, keyframes and frames.
//!
//! A timeline of `duration` ms is carved as:
//! - `[0, setup)` setup time (`setup_fraction * duration`)
//! - `[setup, setup + action)` action time, divided evenly among actions in order
//! - the remainder is settle time where nothing new starts.

use serde::{Deserialize, Serialize};

use crate::config::Pacing;

/// Closed time interval in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    pub start_ms: f64,
    pub end_ms: f64,
}

impl TimeWindow {
    #[inline]
    pub fn new(start_ms: f64, end_ms: f64) -> Self {
        Self { start_ms, end_ms }
    }

    #[inline]
    pub fn duration_ms(&self) -> f64 {
        self.end_ms - self.start_ms
    }

    /// Inclusive on both ends.
    #[inline]
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start_ms && t <= self.end_ms
    }

    /// Position of `t` inside the window, clamped to [0, 1].
    /// A zero-width window reports 1 once reached and 0 before.
    #[inline]
    pub fn progress(&self, t: f64) -> f64 {
        let span = self.duration_ms();
        if span <= 0.0 {
            return if t >= self.end_ms { 1.0 } else { 0.0 };
        }
        ((t - self.start_ms) / span).clamp(0.0, 1.0)
    }

    #[inline]
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start_ms < other.end_ms && other.start_ms < self.end_ms
    }
}

/// One window per action, in action order. Empty when there are no actions.
pub fn action_windows(action_count: usize, duration_ms: f64, pacing: &Pacing) -> Vec<TimeWindow> {
    if action_count == 0 {
        return Vec::new();
    }
    let setup = duration_ms * pacing.setup_fraction;
    let width = duration_ms * pacing.action_fraction / action_count as f64;
    (0..action_count)
        .map(|i| {
            let start = setup + i as f64 * width;
            TimeWindow::new(start, start + width)
        })
        .collect()
}

/// Index of the item whose stamp is closest to `t`; ties go to the earlier item.
///
/// `items` must be sorted by `stamp` ascending.
pub fn nearest_index<T>(items: &[T], t: f64, stamp: impl Fn(&T) -> f64) -> Option<usize> {
    if items.is_empty() {
        return None;
    }
    let after = items.partition_point(|it| stamp(it) < t);
    if after == 0 {
        return Some(0);
    }
    if after == items.len() {
        return Some(items.len() - 1);
    }
    let before = after - 1;
    if (t - stamp(&items[before])) <= (stamp(&items[after]) - t) {
        Some(before)
    } else {
        Some(after)
    }
}
