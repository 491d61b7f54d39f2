//! Interval index powering overlap and complement queries.
//!
//! The index is a secondary, queryable projection of the attribute records:
//! it stores `(IntervalId, owner)` pairs keyed by the interval endpoints in an
//! augmented AVL tree, giving `O(log n + k)` overlap search and `O(log n)`
//! insertion and removal.

mod tree;

use crate::interval::{Interval, IntervalId, Window};
use dynnet_types::key::EntityId;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tree::{AvlTree, TreeKey};

/// One search result: the interval handle and the entity that owns it.
///
/// Equality is by handle, so two hits with equal values but different
/// handles stay distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IntervalHit {
    pub id: IntervalId,
    pub owner: EntityId,
}

/// Statistics about one interval index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    pub entries: usize,
    pub owners: usize,
    pub depth: i32,
}

/// Augmented interval tree over `(interval, owner)` entries.
///
/// Entries are identified by [`IntervalId`]. The index keeps a copy of the
/// endpoints each entry was keyed with, so removal finds the exact entry even
/// after the arena copy of the interval has been trimmed; [`IntervalIndex::rekey`]
/// moves an entry to its new endpoints.
///
/// # Examples
///
/// ```rust
/// use dynnet::{EntityId, Interval, IntervalId, IntervalIndex, Window};
///
/// let mut index = IntervalIndex::new();
/// let a = Interval::new(0.0, 5.0, "red")?;
/// let b = Interval::new(5.0, 15.0, "blue")?;
/// index.insert(IntervalId(0), &a, EntityId(1));
/// index.insert(IntervalId(1), &b, EntityId(1));
///
/// let hits = index.search(&Window::new(6.0, 7.0)?);
/// assert_eq!(hits.len(), 1);
/// assert_eq!(hits[0].id, IntervalId(1));
/// assert_eq!(index.search_not(&Window::new(6.0, 7.0)?)[0].id, IntervalId(0));
/// # Ok::<(), dynnet::DynError>(())
/// ```
#[derive(Debug, Default)]
pub struct IntervalIndex {
    tree: AvlTree,
    /// Tree key and owner of every entry
    entries: FxHashMap<IntervalId, (TreeKey, EntityId)>,
    /// Entries grouped by owner, in insertion order
    owners: FxHashMap<EntityId, SmallVec<[IntervalId; 4]>>,
    next_seq: u64,
}

impl IntervalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_key(&mut self, interval: &Interval) -> TreeKey {
        let seq = self.next_seq;
        self.next_seq += 1;
        TreeKey {
            start: interval.start(),
            end: interval.end(),
            seq,
        }
    }

    /// Add an entry. Inserting a handle that is already present re-keys it.
    pub fn insert(&mut self, id: IntervalId, interval: &Interval, owner: EntityId) {
        if self.entries.contains_key(&id) {
            self.rekey(id, interval);
            return;
        }

        let key = self.next_key(interval);
        self.tree.insert(key, IntervalHit { id, owner });
        self.entries.insert(id, (key, owner));
        self.owners.entry(owner).or_default().push(id);
    }

    /// Move an entry to the current endpoints of `interval`, keeping its
    /// tie-break position. Returns `false` if the handle is not indexed.
    pub fn rekey(&mut self, id: IntervalId, interval: &Interval) -> bool {
        let Some((old_key, owner)) = self.entries.get(&id).copied() else {
            return false;
        };
        let new_key = TreeKey {
            start: interval.start(),
            end: interval.end(),
            seq: old_key.seq,
        };
        if new_key == old_key {
            return true;
        }

        self.tree.remove(&old_key);
        self.tree.insert(new_key, IntervalHit { id, owner });
        self.entries.insert(id, (new_key, owner));
        true
    }

    /// Delete the entry for `id` if it is indexed under `owner`.
    pub fn remove(&mut self, id: IntervalId, owner: EntityId) -> bool {
        match self.entries.get(&id) {
            Some((_, indexed_owner)) if *indexed_owner == owner => {}
            _ => return false,
        }

        let Some((key, _)) = self.entries.remove(&id) else {
            return false;
        };
        self.tree.remove(&key);

        if let Some(ids) = self.owners.get_mut(&owner) {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                self.owners.remove(&owner);
            }
        }
        true
    }

    /// Replace the whole content in one pass. Entries are keyed in the
    /// order given, which fixes the tie-break between equal endpoints.
    pub fn bulk_load<'a, I>(&mut self, items: I)
    where
        I: IntoIterator<Item = (IntervalId, &'a Interval, EntityId)>,
    {
        self.clear();

        let mut sorted = Vec::new();
        for (id, interval, owner) in items {
            if self.entries.contains_key(&id) {
                continue;
            }
            let key = self.next_key(interval);
            sorted.push((key, IntervalHit { id, owner }));
            self.entries.insert(id, (key, owner));
            self.owners.entry(owner).or_default().push(id);
        }

        sorted.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        self.tree.build_sorted(&sorted);
    }

    /// Every entry whose range intersects `window`, in endpoint order.
    pub fn search(&self, window: &Window) -> Vec<IntervalHit> {
        let mut out = Vec::new();
        self.tree.collect_overlapping(window.range(), &mut out);
        out
    }

    /// Every entry whose range does not intersect `window`, in endpoint order.
    pub fn search_not(&self, window: &Window) -> Vec<IntervalHit> {
        let mut out = Vec::new();
        self.tree.collect_disjoint(window.range(), &mut out);
        out
    }

    /// All handles owned by `owner`, in insertion order.
    pub fn intervals_of(&self, owner: EntityId) -> Vec<IntervalId> {
        self.owners
            .get(&owner)
            .map(|ids| ids.to_vec())
            .unwrap_or_default()
    }

    /// Every entry, in endpoint order.
    pub fn all(&self) -> Vec<IntervalHit> {
        let mut out = Vec::with_capacity(self.len());
        self.tree.for_each(|_, hit| out.push(*hit));
        out
    }

    pub fn contains(&self, id: IntervalId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn owner_of(&self, id: IntervalId) -> Option<EntityId> {
        self.entries.get(&id).map(|(_, owner)| *owner)
    }

    pub fn clear(&mut self) {
        self.tree.clear();
        self.entries.clear();
        self.owners.clear();
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.len() == 0
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            entries: self.len(),
            owners: self.owners.len(),
            depth: self.tree.height(),
        }
    }
}
