//! Augmented AVL tree over interval endpoints.
//!
//! Nodes are kept in a slot vector and linked by index. Each node caches,
//! for its subtree, the largest end, the smallest end, and the largest start
//! so overlap and complement searches can skip whole subtrees.

use super::IntervalHit;
use crate::interval::ranges_intersect;
use dynnet_types::time::Time;

/// Ordering key of a tree entry. `seq` is the insertion sequence number and
/// breaks ties between intervals with identical endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct TreeKey {
    pub start: Time,
    pub end: Time,
    pub seq: u64,
}

#[derive(Debug, Clone, Copy)]
struct Node {
    key: TreeKey,
    hit: IntervalHit,
    left: Option<usize>,
    right: Option<usize>,
    height: i32,
    max_end: Time,
    min_end: Time,
    max_start: Time,
}

impl Node {
    fn leaf(key: TreeKey, hit: IntervalHit) -> Self {
        Self {
            key,
            hit,
            left: None,
            right: None,
            height: 1,
            max_end: key.end,
            min_end: key.end,
            max_start: key.start,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct AvlTree {
    nodes: Vec<Node>,
    free: Vec<usize>,
    root: Option<usize>,
    len: usize,
}

impl AvlTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.root = None;
        self.len = 0;
    }

    pub fn height(&self) -> i32 {
        self.height_of(self.root)
    }

    fn alloc(&mut self, node: Node) -> usize {
        self.len += 1;
        if let Some(idx) = self.free.pop() {
            self.nodes[idx] = node;
            idx
        } else {
            self.nodes.push(node);
            self.nodes.len() - 1
        }
    }

    fn release(&mut self, idx: usize) {
        self.len -= 1;
        self.free.push(idx);
    }

    #[inline]
    fn height_of(&self, node: Option<usize>) -> i32 {
        node.map_or(0, |idx| self.nodes[idx].height)
    }

    fn balance_of(&self, idx: usize) -> i32 {
        let node = &self.nodes[idx];
        self.height_of(node.left) - self.height_of(node.right)
    }

    /// Recompute the cached height and subtree aggregates of one node.
    fn update(&mut self, idx: usize) {
        let node = self.nodes[idx];
        let mut height = 1;
        let mut max_end = node.key.end;
        let mut min_end = node.key.end;
        let mut max_start = node.key.start;

        for child in [node.left, node.right].into_iter().flatten() {
            let c = &self.nodes[child];
            height = height.max(c.height + 1);
            max_end = max_end.max(c.max_end);
            min_end = min_end.min(c.min_end);
            max_start = max_start.max(c.max_start);
        }

        let node = &mut self.nodes[idx];
        node.height = height;
        node.max_end = max_end;
        node.min_end = min_end;
        node.max_start = max_start;
    }

    fn rotate_right(&mut self, idx: usize) -> usize {
        let Some(pivot) = self.nodes[idx].left else {
            return idx;
        };
        self.nodes[idx].left = self.nodes[pivot].right;
        self.nodes[pivot].right = Some(idx);
        self.update(idx);
        self.update(pivot);
        pivot
    }

    fn rotate_left(&mut self, idx: usize) -> usize {
        let Some(pivot) = self.nodes[idx].right else {
            return idx;
        };
        self.nodes[idx].right = self.nodes[pivot].left;
        self.nodes[pivot].left = Some(idx);
        self.update(idx);
        self.update(pivot);
        pivot
    }

    fn rebalance(&mut self, idx: usize) -> usize {
        self.update(idx);
        let balance = self.balance_of(idx);

        if balance > 1 {
            if let Some(left) = self.nodes[idx].left
                && self.balance_of(left) < 0
            {
                self.nodes[idx].left = Some(self.rotate_left(left));
            }
            return self.rotate_right(idx);
        }

        if balance < -1 {
            if let Some(right) = self.nodes[idx].right
                && self.balance_of(right) > 0
            {
                self.nodes[idx].right = Some(self.rotate_right(right));
            }
            return self.rotate_left(idx);
        }

        idx
    }

    pub fn insert(&mut self, key: TreeKey, hit: IntervalHit) {
        let new = self.alloc(Node::leaf(key, hit));
        self.root = Some(self.insert_at(self.root, new));
    }

    fn insert_at(&mut self, node: Option<usize>, new: usize) -> usize {
        let Some(idx) = node else {
            return new;
        };

        if self.nodes[new].key < self.nodes[idx].key {
            let left = self.insert_at(self.nodes[idx].left, new);
            self.nodes[idx].left = Some(left);
        } else {
            let right = self.insert_at(self.nodes[idx].right, new);
            self.nodes[idx].right = Some(right);
        }

        self.rebalance(idx)
    }

    /// Remove the entry with exactly this key.
    pub fn remove(&mut self, key: &TreeKey) -> Option<IntervalHit> {
        let mut removed = None;
        self.root = self.remove_at(self.root, key, &mut removed);
        removed
    }

    fn remove_at(
        &mut self,
        node: Option<usize>,
        key: &TreeKey,
        removed: &mut Option<IntervalHit>,
    ) -> Option<usize> {
        let idx = node?;

        match key.cmp(&self.nodes[idx].key) {
            std::cmp::Ordering::Less => {
                let left = self.remove_at(self.nodes[idx].left, key, removed);
                self.nodes[idx].left = left;
            }
            std::cmp::Ordering::Greater => {
                let right = self.remove_at(self.nodes[idx].right, key, removed);
                self.nodes[idx].right = right;
            }
            std::cmp::Ordering::Equal => {
                *removed = Some(self.nodes[idx].hit);
                let (left, right) = (self.nodes[idx].left, self.nodes[idx].right);
                self.release(idx);

                return match (left, right) {
                    (None, child) | (child, None) => child,
                    (Some(left), Some(right)) => {
                        let (rest, successor) = self.take_min(right);
                        self.nodes[successor].left = Some(left);
                        self.nodes[successor].right = rest;
                        Some(self.rebalance(successor))
                    }
                };
            }
        }

        Some(self.rebalance(idx))
    }

    /// Detach the minimum node of a subtree; returns the new subtree root and
    /// the detached node.
    fn take_min(&mut self, idx: usize) -> (Option<usize>, usize) {
        match self.nodes[idx].left {
            None => (self.nodes[idx].right, idx),
            Some(left) => {
                let (rest, min) = self.take_min(left);
                self.nodes[idx].left = rest;
                (Some(self.rebalance(idx)), min)
            }
        }
    }

    /// Replace the content with entries already sorted by key.
    pub fn build_sorted(&mut self, entries: &[(TreeKey, IntervalHit)]) {
        self.clear();
        self.nodes.reserve(entries.len());
        self.root = self.build_range(entries);
    }

    fn build_range(&mut self, entries: &[(TreeKey, IntervalHit)]) -> Option<usize> {
        if entries.is_empty() {
            return None;
        }
        let mid = entries.len() / 2;
        let (key, hit) = entries[mid];
        let idx = self.alloc(Node::leaf(key, hit));
        let left = self.build_range(&entries[..mid]);
        let right = self.build_range(&entries[mid + 1..]);
        self.nodes[idx].left = left;
        self.nodes[idx].right = right;
        self.update(idx);
        Some(idx)
    }

    /// In-order collection of entries intersecting `query`.
    pub fn collect_overlapping(&self, query: (Time, Time), out: &mut Vec<IntervalHit>) {
        self.overlapping_at(self.root, query, out);
    }

    fn overlapping_at(&self, node: Option<usize>, query: (Time, Time), out: &mut Vec<IntervalHit>) {
        let Some(idx) = node else {
            return;
        };
        let n = &self.nodes[idx];

        // every end in this subtree lies before the window opens
        if n.max_end < query.0 {
            return;
        }

        self.overlapping_at(n.left, query, out);

        if ranges_intersect((n.key.start, n.key.end), query) {
            out.push(n.hit);
        }

        // starts to the right are at least n.key.start
        if n.key.start > query.1 {
            return;
        }

        self.overlapping_at(n.right, query, out);
    }

    /// In-order collection of entries that do not intersect `query`.
    pub fn collect_disjoint(&self, query: (Time, Time), out: &mut Vec<IntervalHit>) {
        self.disjoint_at(self.root, query, out);
    }

    fn disjoint_at(&self, node: Option<usize>, query: (Time, Time), out: &mut Vec<IntervalHit>) {
        let Some(idx) = node else {
            return;
        };
        let n = &self.nodes[idx];

        // every entry starts before the window closes and ends after it opens
        if n.max_start < query.1 && n.min_end > query.0 {
            return;
        }

        self.disjoint_at(n.left, query, out);

        if !ranges_intersect((n.key.start, n.key.end), query) {
            out.push(n.hit);
        }

        self.disjoint_at(n.right, query, out);
    }

    pub fn for_each(&self, mut visit: impl FnMut(&TreeKey, &IntervalHit)) {
        let mut stack = Vec::new();
        let mut current = self.root;
        while current.is_some() || !stack.is_empty() {
            while let Some(idx) = current {
                stack.push(idx);
                current = self.nodes[idx].left;
            }
            if let Some(idx) = stack.pop() {
                let node = &self.nodes[idx];
                visit(&node.key, &node.hit);
                current = node.right;
            }
        }
    }

    #[cfg(test)]
    fn check_invariants(&self) {
        fn walk(tree: &AvlTree, node: Option<usize>) -> (i32, usize) {
            let Some(idx) = node else {
                return (0, 0);
            };
            let n = &tree.nodes[idx];
            let (lh, lc) = walk(tree, n.left);
            let (rh, rc) = walk(tree, n.right);
            assert!((lh - rh).abs() <= 1, "unbalanced node");
            assert_eq!(n.height, lh.max(rh) + 1);
            if let Some(l) = n.left {
                assert!(tree.nodes[l].key < n.key);
                assert!(tree.nodes[l].max_end <= n.max_end);
            }
            if let Some(r) = n.right {
                assert!(tree.nodes[r].key > n.key);
                assert!(tree.nodes[r].min_end >= n.min_end);
            }
            (n.height, lc + rc + 1)
        }
        let (_, count) = walk(self, self.root);
        assert_eq!(count, self.len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::IntervalId;
    use dynnet_types::key::EntityId;

    fn key(start: f64, end: f64, seq: u64) -> TreeKey {
        TreeKey {
            start: Time::new(start).unwrap(),
            end: Time::new(end).unwrap(),
            seq,
        }
    }

    fn hit(id: u64) -> IntervalHit {
        IntervalHit {
            id: IntervalId(id),
            owner: EntityId(id),
        }
    }

    fn q(start: f64, end: f64) -> (Time, Time) {
        (Time::new(start).unwrap(), Time::new(end).unwrap())
    }

    #[test]
    fn test_insert_keeps_balance() {
        let mut tree = AvlTree::new();
        for i in 0..200u64 {
            tree.insert(key(i as f64, i as f64 + 1.0, i), hit(i));
            tree.check_invariants();
        }
        assert_eq!(tree.len(), 200);
        assert!(tree.height() <= 11);
    }

    #[test]
    fn test_remove_keeps_balance() {
        let mut tree = AvlTree::new();
        for i in 0..100u64 {
            tree.insert(key((i * 7 % 100) as f64, 200.0, i), hit(i));
        }
        for i in (0..100u64).step_by(3) {
            let removed = tree.remove(&key((i * 7 % 100) as f64, 200.0, i));
            assert_eq!(removed, Some(hit(i)));
            tree.check_invariants();
        }
        assert!(tree.remove(&key(0.0, 200.0, 0)).is_none());
        assert_eq!(tree.len(), 100 - 34);
    }

    #[test]
    fn test_build_sorted_is_balanced() {
        let entries: Vec<_> = (0..1000u64)
            .map(|i| (key(i as f64, i as f64 + 5.0, i), hit(i)))
            .collect();
        let mut tree = AvlTree::new();
        tree.build_sorted(&entries);
        tree.check_invariants();
        assert_eq!(tree.len(), 1000);
    }

    #[test]
    fn test_overlap_and_disjoint_partition() {
        let mut tree = AvlTree::new();
        tree.insert(key(0.0, 5.0, 0), hit(0));
        tree.insert(key(5.0, 15.0, 1), hit(1));
        tree.insert(key(20.0, 20.0, 2), hit(2));
        tree.insert(key(f64::NEG_INFINITY, f64::INFINITY, 3), hit(3));

        let mut found = Vec::new();
        tree.collect_overlapping(q(6.0, 7.0), &mut found);
        assert_eq!(found, vec![hit(3), hit(1)]);

        let mut missing = Vec::new();
        tree.collect_disjoint(q(6.0, 7.0), &mut missing);
        assert_eq!(missing, vec![hit(0), hit(2)]);

        found.clear();
        tree.collect_overlapping(q(20.0, 20.0), &mut found);
        assert_eq!(found, vec![hit(3), hit(2)]);
    }

    #[test]
    fn test_in_order_traversal() {
        let mut tree = AvlTree::new();
        tree.insert(key(3.0, 4.0, 0), hit(0));
        tree.insert(key(1.0, 2.0, 1), hit(1));
        tree.insert(key(1.0, 2.0, 2), hit(2));
        let mut seen = Vec::new();
        tree.for_each(|_, h| seen.push(h.id.0));
        assert_eq!(seen, vec![1, 2, 0]);
    }
}
