//! Time-varying node positions.
//!
//! A [`PositionStore`] keeps one double-valued interval sequence per node and
//! axis. Unlike an [`EntityStore`](crate::EntityStore) it has no build phase:
//! every insert is indexed immediately, so a layout can be streamed in while
//! the animation runs.

use crate::error::{DynError, Result};
use crate::index::{IntervalHit, IntervalIndex};
use crate::interval::{Interval, IntervalArena, IntervalId, Window};
use crate::record::{AttributeRecord, OverwriteOutcome};
use crate::store::QueryCursor;
use dynnet_types::key::{AttributeKey, EntityId};
use dynnet_types::value::ValueType;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Coordinate axis of a position interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Record column used for this axis.
    pub fn column(&self) -> &'static str {
        match self {
            Axis::X => "node_X_Pos",
            Axis::Y => "node_Y_Pos",
            Axis::Z => "node_Z_Pos",
        }
    }

    pub fn from_column(column: &str) -> Option<Axis> {
        Axis::ALL.into_iter().find(|axis| axis.column() == column)
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        };
        f.write_str(name)
    }
}

/// Coordinates of one node at one instant. Axes without an active interval
/// are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
    pub node: EntityId,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

impl NodePosition {
    fn set(&mut self, axis: Axis, value: f64) {
        match axis {
            Axis::X => self.x = Some(value),
            Axis::Y => self.y = Some(value),
            Axis::Z => self.z = Some(value),
        }
    }
}

/// Interval store for node coordinates.
///
/// # Examples
///
/// ```rust
/// use dynnet::{Axis, EntityId, Interval, PositionStore};
///
/// let mut layout = PositionStore::new();
/// let node = EntityId(3);
/// layout.insert(node, Axis::X, Interval::new(0.0, 10.0, 12.5)?)?;
/// layout.insert(node, Axis::Y, Interval::new(0.0, 10.0, -4.0)?)?;
///
/// let positions = layout.positions_at(5.0)?;
/// assert_eq!(positions[0].x, Some(12.5));
/// assert_eq!(positions[0].z, None);
/// # Ok::<(), dynnet::DynError>(())
/// ```
#[derive(Debug, Default)]
pub struct PositionStore {
    arena: IntervalArena,
    records: FxHashMap<AttributeKey, AttributeRecord>,
    index: IntervalIndex,
    cursor: QueryCursor,
}

impl PositionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a coordinate interval. The value must be a double.
    pub fn insert(
        &mut self,
        node: EntityId,
        axis: Axis,
        interval: Interval,
    ) -> Result<OverwriteOutcome> {
        let found = interval.value_type();
        if found != ValueType::Double {
            return Err(DynError::TypeMismatch {
                column: axis.column().to_string(),
                expected: ValueType::Double,
                found,
            });
        }

        let key = AttributeKey::new(axis.column(), node);
        let record = self
            .records
            .entry(key.clone())
            .or_insert_with(|| AttributeRecord::new(key));
        let outcome = record.insert(&mut self.arena, interval)?;

        if let Some(interval) = self.arena.interval(outcome.id) {
            self.index.insert(outcome.id, interval, node);
        }
        for id in &outcome.trimmed {
            if let Some(interval) = self.arena.interval(*id) {
                self.index.rekey(*id, interval);
            }
        }

        Ok(outcome)
    }

    /// Drop every coordinate interval of `node`.
    ///
    /// Returns the number of intervals removed, or `UnknownKey` if the node
    /// has no position on any axis.
    pub fn remove_node(&mut self, node: EntityId) -> Result<usize> {
        let mut removed = 0;
        let mut known = false;

        for axis in Axis::ALL {
            let Some(record) = self.records.remove(&AttributeKey::new(axis.column(), node)) else {
                continue;
            };
            known = true;
            for id in record.intervals() {
                self.index.remove(*id, node);
                if self.arena.remove(*id).is_some() {
                    removed += 1;
                }
            }
        }

        if !known {
            return Err(DynError::unknown_key(Axis::X.column(), node));
        }
        log::debug!("removed {} position intervals of node {}", removed, node);
        Ok(removed)
    }

    pub fn remove_all(&mut self) {
        self.records.clear();
        self.arena.clear();
        self.index.clear();
        self.cursor.reset();
    }

    pub fn intervals_of(&self, node: EntityId) -> Vec<IntervalId> {
        self.index.intervals_of(node)
    }

    pub fn interval(&self, id: IntervalId) -> Option<&Interval> {
        self.arena.interval(id)
    }

    pub fn axis_of(&self, id: IntervalId) -> Option<Axis> {
        self.arena
            .get(id)
            .and_then(|owned| Axis::from_column(&owned.owner.column))
    }

    pub fn search(&self, window: &Window) -> Vec<IntervalHit> {
        self.index.search(window)
    }

    pub fn search_not(&self, window: &Window) -> Vec<IntervalHit> {
        self.index.search_not(window)
    }

    /// Intervals that became active since the previous call.
    ///
    /// Intervals that stopped being active are not reported: a node keeps
    /// its last coordinates until a new interval replaces them.
    pub fn search_changed(&mut self, window: &Window) -> Vec<IntervalHit> {
        let active = self.index.search(window);
        let changes = self.cursor.advance(active);
        log::trace!("position change set: +{}", changes.entered.len());
        changes.entered
    }

    /// Coordinates active at instant `t`, one entry per node, in node order.
    pub fn positions_at(&self, t: f64) -> Result<Vec<NodePosition>> {
        let window = Window::at(t)?;
        let mut by_node: BTreeMap<EntityId, NodePosition> = BTreeMap::new();

        for hit in self.index.search(&window) {
            let Some(owned) = self.arena.get(hit.id) else {
                continue;
            };
            let (Some(axis), Some(value)) = (
                Axis::from_column(&owned.owner.column),
                owned.interval.value().as_f64(),
            ) else {
                continue;
            };
            by_node
                .entry(hit.owner)
                .or_insert_with(|| NodePosition {
                    node: hit.owner,
                    ..NodePosition::default()
                })
                .set(axis, value);
        }

        Ok(by_node.into_values().collect())
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iv(a: f64, b: f64, v: f64) -> Interval {
        Interval::new(a, b, v).unwrap()
    }

    #[test]
    fn test_rejects_non_double() {
        let mut layout = PositionStore::new();
        let err = layout
            .insert(EntityId(1), Axis::X, Interval::new(0.0, 1.0, 3).unwrap())
            .unwrap_err();
        assert!(matches!(err, DynError::TypeMismatch { .. }));
        assert!(layout.is_empty());
    }

    #[test]
    fn test_indexed_on_insert() {
        let mut layout = PositionStore::new();
        layout.insert(EntityId(1), Axis::X, iv(0.0, 5.0, 1.0)).unwrap();
        layout.insert(EntityId(1), Axis::X, iv(5.0, 10.0, 2.0)).unwrap();

        let window = Window::new(6.0, 7.0).unwrap();
        let hits = layout.search(&window);
        assert_eq!(hits.len(), 1);
        assert_eq!(layout.interval(hits[0].id).unwrap().value().as_f64(), Some(2.0));
        assert_eq!(layout.axis_of(hits[0].id), Some(Axis::X));
        assert_eq!(layout.search_not(&window).len(), 1);
    }

    #[test]
    fn test_trimmed_sibling_rekeyed() {
        let mut layout = PositionStore::new();
        layout.insert(EntityId(1), Axis::Y, iv(0.0, 10.0, 1.0)).unwrap();
        layout.insert(EntityId(1), Axis::Y, iv(5.0, 15.0, 2.0)).unwrap();

        let hits = layout.search(&Window::new(6.0, 7.0).unwrap());
        assert_eq!(hits.len(), 1);
        assert_eq!(layout.positions_at(6.0).unwrap()[0].y, Some(2.0));
        assert_eq!(layout.positions_at(4.0).unwrap()[0].y, Some(1.0));
    }

    #[test]
    fn test_search_changed_reports_entered_only() {
        let mut layout = PositionStore::new();
        layout.insert(EntityId(1), Axis::X, iv(0.0, 5.0, 1.0)).unwrap();
        layout.insert(EntityId(2), Axis::X, iv(3.0, 9.0, 2.0)).unwrap();

        assert_eq!(layout.search_changed(&Window::at(1.0).unwrap()).len(), 1);
        let entered = layout.search_changed(&Window::at(6.0).unwrap());
        assert_eq!(entered.len(), 1);
        assert_eq!(entered[0].owner, EntityId(2));
        assert!(layout.search_changed(&Window::at(7.0).unwrap()).is_empty());
    }

    #[test]
    fn test_remove_node() {
        let mut layout = PositionStore::new();
        for axis in Axis::ALL {
            layout.insert(EntityId(1), axis, iv(0.0, 5.0, 1.0)).unwrap();
        }
        layout.insert(EntityId(2), Axis::Z, iv(0.0, 5.0, 1.0)).unwrap();

        assert_eq!(layout.remove_node(EntityId(1)).unwrap(), 3);
        assert!(layout.intervals_of(EntityId(1)).is_empty());
        assert_eq!(layout.search(&Window::at(1.0).unwrap()).len(), 1);
        assert!(layout.remove_node(EntityId(1)).unwrap_err().is_not_found());

        layout.remove_all();
        assert!(layout.is_empty());
        assert!(layout.positions_at(1.0).unwrap().is_empty());
    }

    #[test]
    fn test_positions_fill_missing_axes() {
        let mut layout = PositionStore::new();
        layout.insert(EntityId(4), Axis::Z, iv(0.0, 5.0, 7.0)).unwrap();
        layout.insert(EntityId(2), Axis::X, iv(0.0, 5.0, 1.0)).unwrap();

        let positions = layout.positions_at(2.0).unwrap();
        assert_eq!(
            positions,
            vec![
                NodePosition {
                    node: EntityId(2),
                    x: Some(1.0),
                    ..NodePosition::default()
                },
                NodePosition {
                    node: EntityId(4),
                    z: Some(7.0),
                    ..NodePosition::default()
                },
            ]
        );
        assert_eq!(NodePosition::default().node, EntityId(0));
    }
}
