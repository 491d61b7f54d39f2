//! Global time bounds accumulated over every inserted interval.

use dynnet_types::time::Time;
use serde::{Deserialize, Serialize};

/// Running extremes of finite start and end times.
///
/// Infinite endpoints are ignored. Bounds only ever widen; removing an
/// interval does not shrink them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeBounds {
    min_start: Option<Time>,
    max_start: Option<Time>,
    min_end: Option<Time>,
    max_end: Option<Time>,
}

fn widen_min(slot: &mut Option<Time>, t: Time) {
    *slot = Some(slot.map_or(t, |cur| cur.min(t)));
}

fn widen_max(slot: &mut Option<Time>, t: Time) {
    *slot = Some(slot.map_or(t, |cur| cur.max(t)));
}

impl TimeBounds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one `(start, end)` range into the bounds.
    pub fn observe(&mut self, (start, end): (Time, Time)) {
        if start.is_finite() {
            widen_min(&mut self.min_start, start);
            widen_max(&mut self.max_start, start);
        }
        if end.is_finite() {
            widen_min(&mut self.min_end, end);
            widen_max(&mut self.max_end, end);
        }
    }

    /// Combine with another set of bounds.
    pub fn merge(&self, other: &TimeBounds) -> TimeBounds {
        let mut out = *self;
        for t in [other.min_start, other.max_start].into_iter().flatten() {
            widen_min(&mut out.min_start, t);
            widen_max(&mut out.max_start, t);
        }
        for t in [other.min_end, other.max_end].into_iter().flatten() {
            widen_min(&mut out.min_end, t);
            widen_max(&mut out.max_end, t);
        }
        out
    }

    /// Earliest finite start, else earliest finite end, else `fallback`.
    pub fn min_time(&self, fallback: f64) -> f64 {
        self.min_start
            .or(self.min_end)
            .map_or(fallback, Time::value)
    }

    /// Latest finite end, else latest finite start, else `fallback`.
    pub fn max_time(&self, fallback: f64) -> f64 {
        self.max_end
            .or(self.max_start)
            .map_or(fallback, Time::value)
    }

    pub fn is_empty(&self) -> bool {
        self.min_start.is_none() && self.min_end.is_none()
    }
}
