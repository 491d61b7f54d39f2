//! Time intervals, query windows, and the arena that owns them.
//!
//! An [`Interval`] is a `[start, end)` range carrying one typed value. An
//! interval with `start == end` is an instant and behaves as the single
//! point `{start}`. Stored intervals live in an [`IntervalArena`] and are
//! addressed everywhere else by [`IntervalId`], so a trim made through the
//! arena is seen by every index that refers to the same handle.

use crate::error::{DynError, Result};
use dynnet_types::key::AttributeKey;
use dynnet_types::time::Time;
use dynnet_types::value::{AttrValue, ValueType};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Stable opaque handle to an interval stored in an [`IntervalArena`].
///
/// Handles are never reused, so two handles are equal only when they name
/// the same stored interval, even if the intervals carry equal values.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct IntervalId(pub u64);

impl fmt::Display for IntervalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

fn checked_time(value: f64) -> Result<Time> {
    Time::new(value).ok_or(DynError::NanEndpoint)
}

/// `start` lies strictly before `end`, where an infinite endpoint on the
/// outside always satisfies the test.
#[inline]
fn strictly_before(start: Time, end: Time) -> bool {
    start.is_neg_infinity() || end.is_pos_infinity() || start < end
}

/// Whether two ranges share at least one instant.
///
/// Non-degenerate ranges are half-open; a degenerate range `[t, t]` is the
/// point `{t}`.
pub fn ranges_intersect(a: (Time, Time), b: (Time, Time)) -> bool {
    let a_point = a.0 == a.1;
    let b_point = b.0 == b.1;
    match (a_point, b_point) {
        (false, false) => strictly_before(a.0, b.1) && strictly_before(b.0, a.1),
        (true, false) => b.0 <= a.0 && strictly_before(a.0, b.1),
        (false, true) => a.0 <= b.0 && strictly_before(b.0, a.1),
        (true, true) => a.0 == b.0,
    }
}

/// A time range carrying one typed attribute value.
///
/// Endpoints can be narrowed after construction; the overwrite policy of
/// attribute records relies on this.
///
/// # Examples
///
/// ```rust
/// use dynnet::{Interval, Window};
///
/// let iv = Interval::new(0.0, 10.0, "red")?;
/// assert!(iv.overlaps(&Window::new(2.0, 3.0)?));
/// assert!(!iv.overlaps(&Window::new(10.0, 12.0)?));
/// assert!(Interval::new(5.0, 1.0, 1).is_err());
/// # Ok::<(), dynnet::DynError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct Interval {
    start: Time,
    end: Time,
    value: AttrValue,
}

/// Unchecked wire form of [`Interval`].
#[derive(Deserialize)]
struct RawInterval {
    start: Time,
    end: Time,
    value: AttrValue,
}

impl TryFrom<RawInterval> for Interval {
    type Error = DynError;

    fn try_from(raw: RawInterval) -> Result<Self> {
        Interval::from_times(raw.start, raw.end, raw.value)
    }
}

impl Interval {
    /// Create an interval, rejecting `start > end`, NaN endpoints, and
    /// non-finite double payloads.
    pub fn new(start: f64, end: f64, value: impl Into<AttrValue>) -> Result<Self> {
        let start = checked_time(start)?;
        let end = checked_time(end)?;
        Self::from_times(start, end, value.into())
    }

    /// Create an instantaneous interval `[at, at]`.
    pub fn instant(at: f64, value: impl Into<AttrValue>) -> Result<Self> {
        Self::new(at, at, value)
    }

    /// Create an interval covering the whole time line.
    pub fn unbounded(value: impl Into<AttrValue>) -> Result<Self> {
        Self::new(f64::NEG_INFINITY, f64::INFINITY, value)
    }

    pub fn from_times(start: Time, end: Time, value: AttrValue) -> Result<Self> {
        if start > end {
            return Err(DynError::MalformedInterval {
                start: start.value(),
                end: end.value(),
            });
        }
        if let AttrValue::Double(v) = &value
            && !v.is_finite()
        {
            return Err(DynError::NonFiniteValue(*v));
        }
        Ok(Self { start, end, value })
    }

    #[inline]
    pub fn start(&self) -> Time {
        self.start
    }

    #[inline]
    pub fn end(&self) -> Time {
        self.end
    }

    #[inline]
    pub fn range(&self) -> (Time, Time) {
        (self.start, self.end)
    }

    pub fn value(&self) -> &AttrValue {
        &self.value
    }

    pub fn value_type(&self) -> ValueType {
        self.value.value_type()
    }

    pub fn is_instant(&self) -> bool {
        self.start == self.end
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_neg_infinity() && self.end.is_pos_infinity()
    }

    /// Move the start endpoint. Fails if it would pass the end.
    pub fn set_start(&mut self, start: Time) -> Result<()> {
        if start > self.end {
            return Err(DynError::MalformedInterval {
                start: start.value(),
                end: self.end.value(),
            });
        }
        self.start = start;
        Ok(())
    }

    /// Move the end endpoint. Fails if it would precede the start.
    pub fn set_end(&mut self, end: Time) -> Result<()> {
        if self.start > end {
            return Err(DynError::MalformedInterval {
                start: self.start.value(),
                end: end.value(),
            });
        }
        self.end = end;
        Ok(())
    }

    pub fn overlaps(&self, window: &Window) -> bool {
        ranges_intersect(self.range(), window.range())
    }

    pub fn intersects(&self, other: &Interval) -> bool {
        ranges_intersect(self.range(), other.range())
    }

    /// Total order on `(start, end)`; a fully unbounded interval sorts
    /// before everything else since it contains every other range.
    pub fn order(&self, other: &Interval) -> Ordering {
        match (self.is_unbounded(), other.is_unbounded()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self
                .start
                .cmp(&other.start)
                .then_with(|| self.end.cmp(&other.end)),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}) = {}", self.start, self.end, self.value)
    }
}

/// A query window over the time line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawWindow")]
pub struct Window {
    start: Time,
    end: Time,
}

#[derive(Deserialize)]
struct RawWindow {
    start: Time,
    end: Time,
}

impl TryFrom<RawWindow> for Window {
    type Error = DynError;

    fn try_from(raw: RawWindow) -> Result<Self> {
        Window::from_times(raw.start, raw.end)
    }
}

impl Window {
    /// Window `[low, high)`; `low == high` queries a single instant.
    pub fn new(low: f64, high: f64) -> Result<Self> {
        Self::from_times(checked_time(low)?, checked_time(high)?)
    }

    pub fn from_times(start: Time, end: Time) -> Result<Self> {
        if start > end {
            return Err(DynError::MalformedInterval {
                start: start.value(),
                end: end.value(),
            });
        }
        Ok(Self { start, end })
    }

    /// Window covering the single instant `t`.
    pub fn at(t: f64) -> Result<Self> {
        Self::new(t, t)
    }

    pub fn unbounded() -> Self {
        Self {
            start: Time::NEG_INFINITY,
            end: Time::INFINITY,
        }
    }

    #[inline]
    pub fn start(&self) -> Time {
        self.start
    }

    #[inline]
    pub fn end(&self) -> Time {
        self.end
    }

    #[inline]
    pub fn range(&self) -> (Time, Time) {
        (self.start, self.end)
    }
}

impl From<&Interval> for Window {
    fn from(interval: &Interval) -> Self {
        Self {
            start: interval.start,
            end: interval.end,
        }
    }
}

/// An interval together with the attribute record that owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnedInterval {
    pub interval: Interval,
    pub owner: AttributeKey,
}

/// Single owner of every stored interval of a store.
///
/// Handles come from a counter that only moves forward, so a handle from a
/// removed or cleared interval never aliases a new one. Removal frees the
/// entry.
#[derive(Debug, Default)]
pub struct IntervalArena {
    next: u64,
    entries: FxHashMap<u64, OwnedInterval>,
}

impl IntervalArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, interval: Interval, owner: AttributeKey) -> IntervalId {
        let id = IntervalId(self.next);
        self.next += 1;
        self.entries.insert(id.0, OwnedInterval { interval, owner });
        id
    }

    pub fn get(&self, id: IntervalId) -> Option<&OwnedInterval> {
        self.entries.get(&id.0)
    }

    pub fn get_mut(&mut self, id: IntervalId) -> Option<&mut OwnedInterval> {
        self.entries.get_mut(&id.0)
    }

    pub fn interval(&self, id: IntervalId) -> Option<&Interval> {
        self.get(id).map(|owned| &owned.interval)
    }

    pub fn remove(&mut self, id: IntervalId) -> Option<OwnedInterval> {
        self.entries.remove(&id.0)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored intervals in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (IntervalId, &OwnedInterval)> + '_ {
        let mut ids: Vec<u64> = self.entries.keys().copied().collect();
        ids.sort_unstable();
        ids.into_iter()
            .filter_map(move |id| self.entries.get(&id).map(|o| (IntervalId(id), o)))
    }

    /// Allocated entry capacity, which tracks live intervals rather than
    /// every handle ever issued.
    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }
}
