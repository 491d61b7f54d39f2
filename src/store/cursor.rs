//! Stateful query cursors producing per-frame change sets.

use crate::index::IntervalHit;
use dynnet_types::key::EntityId;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Difference between two successive query results.
///
/// Hits are compared by interval handle, never by value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    /// Hits active now that were not active before, in index order
    pub entered: Vec<IntervalHit>,
    /// Hits active before that are no longer active, ordered by handle
    pub left: Vec<IntervalHit>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.entered.is_empty() && self.left.is_empty()
    }

    /// Size of the symmetric difference.
    pub fn len(&self) -> usize {
        self.entered.len() + self.left.len()
    }

    /// Every changed hit, entered first.
    pub fn iter(&self) -> impl Iterator<Item = &IntervalHit> + '_ {
        self.entered.iter().chain(self.left.iter())
    }

    /// Distinct owners touched by this change set.
    pub fn owners(&self) -> Vec<EntityId> {
        let mut owners: Vec<EntityId> = self.iter().map(|hit| hit.owner).collect();
        owners.sort_unstable();
        owners.dedup();
        owners
    }
}

/// One query stream and the snapshot of its last result.
///
/// Each stream owns its snapshot, so streams never interfere with each
/// other. Diffing costs `O(|previous| + |current|)`.
#[derive(Debug, Clone, Default)]
pub struct QueryCursor {
    current: FxHashSet<IntervalHit>,
}

impl QueryCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot with `active` and return what changed.
    pub fn advance(&mut self, active: Vec<IntervalHit>) -> ChangeSet {
        let next: FxHashSet<IntervalHit> = active.iter().copied().collect();

        let entered: Vec<IntervalHit> = active
            .into_iter()
            .filter(|hit| !self.current.contains(hit))
            .collect();
        let mut left: Vec<IntervalHit> = self
            .current
            .iter()
            .filter(|hit| !next.contains(hit))
            .copied()
            .collect();
        left.sort_unstable();

        self.current = next;
        ChangeSet { entered, left }
    }

    /// Number of hits in the last result.
    pub fn visible_count(&self) -> usize {
        self.current.len()
    }

    pub fn contains(&self, hit: &IntervalHit) -> bool {
        self.current.contains(hit)
    }

    /// The last result, ordered by handle.
    pub fn snapshot(&self) -> Vec<IntervalHit> {
        let mut out: Vec<IntervalHit> = self.current.iter().copied().collect();
        out.sort_unstable();
        out
    }

    pub fn reset(&mut self) {
        self.current.clear();
    }
}
