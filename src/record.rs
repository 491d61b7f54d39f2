//! Attribute records and the overwrite policy for overlapping intervals.
//!
//! An [`AttributeRecord`] holds the interval sequence of one
//! `(column, entity)` key. Adding an interval that intersects intervals
//! already in the record trims one side of each conflicting pair so the
//! record stays free of overlaps; pairs the policy cannot resolve are left
//! untouched and reported back to the caller.

use crate::error::{DynError, Result};
use crate::interval::{Interval, IntervalArena, IntervalId, Window, ranges_intersect};
use dynnet_types::key::{AttributeKey, EntityId};
use dynnet_types::time::Time;
use dynnet_types::value::{AttrValue, ValueType, compare_max, compare_min};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeSet;

/// Lifecycle of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    /// Created as a parent placeholder, no interval yet
    Empty,
    Populated,
    /// The owning entity was removed
    Removed,
}

/// Decision of the overwrite policy for one `(existing, incoming)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The ranges do not intersect.
    Disjoint,
    /// Existing end moves back to the incoming start.
    ShrinkExistingEnd(Time),
    /// Incoming start moves forward to the existing end.
    ShrinkIncomingStart(Time),
    /// Existing start moves forward to the incoming end.
    ShrinkExistingStart(Time),
    /// Incoming end moves back to the existing start.
    ShrinkIncomingEnd(Time),
    /// Intersecting ranges that no rule covers; neither side changes.
    Ambiguous,
}

/// Resolve an intersection between an existing interval `A` and an incoming
/// interval `B`, given as `(start, end)` ranges.
///
/// | Condition on B vs A                    | Action              |
/// |----------------------------------------|---------------------|
/// | `B.start > A.start && B.end >= A.end`  | `A.end = B.start`   |
/// | `B.start == A.start && B.end > A.end`  | `B.start = A.end`   |
/// | `B.end < A.end && B.start <= A.start`  | `A.start = B.end`   |
/// | `B.end == A.end && B.start < A.start`  | `B.end = A.start`   |
/// | otherwise                              | ambiguous           |
pub fn resolve_overlap(existing: (Time, Time), incoming: (Time, Time)) -> Resolution {
    if !ranges_intersect(existing, incoming) {
        return Resolution::Disjoint;
    }

    let (a_start, a_end) = existing;
    let (b_start, b_end) = incoming;

    if b_start > a_start && b_end >= a_end {
        Resolution::ShrinkExistingEnd(b_start)
    } else if b_start == a_start && b_end > a_end {
        Resolution::ShrinkIncomingStart(a_end)
    } else if b_end < a_end && b_start <= a_start {
        Resolution::ShrinkExistingStart(b_end)
    } else if b_end == a_end && b_start < a_start {
        Resolution::ShrinkIncomingEnd(a_start)
    } else {
        Resolution::Ambiguous
    }
}

/// Result of adding one interval to a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverwriteOutcome {
    /// Handle of the interval that was added
    pub id: IntervalId,
    /// Existing intervals whose endpoints were narrowed
    pub trimmed: SmallVec<[IntervalId; 2]>,
    /// Whether the added interval itself was narrowed
    pub incoming_trimmed: bool,
    /// Existing intervals left overlapping the added one
    pub conflicts: SmallVec<[IntervalId; 2]>,
}

impl OverwriteOutcome {
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn trimmed_count(&self) -> u64 {
        self.trimmed.len() as u64 + u64::from(self.incoming_trimmed)
    }
}

/// The interval sequence of one `(column, entity)` key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeRecord {
    key: AttributeKey,
    value_type: Option<ValueType>,
    intervals: Vec<IntervalId>,
    /// Columns of the same entity linked under this record
    children: BTreeSet<String>,
    min_value: Option<AttrValue>,
    max_value: Option<AttrValue>,
    state: RecordState,
}

impl AttributeRecord {
    pub fn new(key: AttributeKey) -> Self {
        Self {
            key,
            value_type: None,
            intervals: Vec::new(),
            children: BTreeSet::new(),
            min_value: None,
            max_value: None,
            state: RecordState::Empty,
        }
    }

    pub fn key(&self) -> &AttributeKey {
        &self.key
    }

    pub fn column(&self) -> &str {
        &self.key.column
    }

    pub fn entity(&self) -> EntityId {
        self.key.entity
    }

    /// Declared type, fixed by the first interval.
    pub fn value_type(&self) -> Option<ValueType> {
        self.value_type
    }

    pub fn intervals(&self) -> &[IntervalId] {
        &self.intervals
    }

    pub fn children(&self) -> impl Iterator<Item = &str> + '_ {
        self.children.iter().map(String::as_str)
    }

    /// Smallest value ever added, under the type-aware reduction.
    pub fn min_value(&self) -> Option<&AttrValue> {
        self.min_value.as_ref()
    }

    pub fn max_value(&self) -> Option<&AttrValue> {
        self.max_value.as_ref()
    }

    pub fn state(&self) -> RecordState {
        self.state
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub(crate) fn add_child(&mut self, column: &str) {
        if column != self.key.column && !self.children.contains(column) {
            self.children.insert(column.to_string());
        }
    }

    pub(crate) fn mark_removed(&mut self) {
        self.state = RecordState::Removed;
    }

    /// Add `incoming` to the record, trimming intersecting intervals.
    ///
    /// The interval is allocated in `arena` with this record's key as owner.
    /// Each existing interval is compared against the incoming one with
    /// [`resolve_overlap`]; a trim of the incoming side is visible to the
    /// comparisons that follow it. A pair the policy cannot separate, either
    /// because no rule applies or because the rule leaves the ranges
    /// intersecting, is listed in [`OverwriteOutcome::conflicts`].
    pub fn insert(
        &mut self,
        arena: &mut IntervalArena,
        mut incoming: Interval,
    ) -> Result<OverwriteOutcome> {
        let found = incoming.value_type();
        if let Some(expected) = self.value_type
            && expected != found
        {
            return Err(DynError::TypeMismatch {
                column: self.key.column.clone(),
                expected,
                found,
            });
        }

        let mut outcome = OverwriteOutcome::default();

        for &existing_id in &self.intervals {
            let Some(existing) = arena.get_mut(existing_id).map(|o| &mut o.interval) else {
                continue;
            };
            let existing_before = existing.range();
            let incoming_before = incoming.range();

            match resolve_overlap(existing_before, incoming_before) {
                Resolution::Disjoint => continue,
                Resolution::Ambiguous => {
                    outcome.conflicts.push(existing_id);
                    continue;
                }
                Resolution::ShrinkExistingEnd(t) => existing.set_end(t)?,
                Resolution::ShrinkIncomingStart(t) => incoming.set_start(t)?,
                Resolution::ShrinkExistingStart(t) => existing.set_start(t)?,
                Resolution::ShrinkIncomingEnd(t) => incoming.set_end(t)?,
            }

            if existing.range() != existing_before {
                outcome.trimmed.push(existing_id);
            }
            if incoming.range() != incoming_before {
                outcome.incoming_trimmed = true;
            }
            // an instant on a boundary can survive its rule
            if ranges_intersect(existing.range(), incoming.range()) {
                outcome.conflicts.push(existing_id);
            }
        }

        // Strings have no ordering under the reduction.
        if found != ValueType::String {
            self.min_value = compare_min(self.min_value.take(), Some(incoming.value().clone()));
            self.max_value = compare_max(self.max_value.take(), Some(incoming.value().clone()));
        }
        self.value_type = Some(found);

        outcome.id = arena.alloc(incoming, self.key.clone());
        self.intervals.push(outcome.id);
        self.state = RecordState::Populated;

        Ok(outcome)
    }

    /// Value active at instant `t`, if any interval covers it.
    pub fn value_at<'a>(&self, arena: &'a IntervalArena, t: Time) -> Option<&'a AttrValue> {
        let window = Window::at(t.value()).ok()?;
        self.intervals
            .iter()
            .filter_map(|id| arena.interval(*id))
            .find(|interval| interval.overlaps(&window))
            .map(Interval::value)
    }
}
