//! Per-entity-class attribute stores.
//!
//! An [`EntityStore`] owns every interval inserted for one entity class
//! (graph, node, or edge): the interval arena, the attribute records keyed by
//! `(column, entity)`, and two interval indexes. The *identity* index holds
//! the intervals of the identifying column and answers "which entities exist
//! now"; the *attribute* index holds every other column and answers "which
//! attribute values are active now".
//!
//! A store has a build phase and a query phase. Inserts during the build
//! phase only touch the records; [`EntityStore::finalize`] bulk-loads both
//! indexes. Inserts after finalize are indexed immediately.
//!
//! # Examples
//!
//! ```rust
//! use dynnet::{EntityId, EntityKind, EntityStore, IndexKind, Interval, Window};
//!
//! let mut store = EntityStore::new(EntityKind::Node);
//! let node = EntityId(1);
//! store.insert(node, "name", Interval::new(0.0, 20.0, "a")?)?;
//! store.insert(node, "color", Interval::new(0.0, 10.0, "red")?)?;
//! store.insert(node, "color", Interval::new(5.0, 15.0, "blue")?)?;
//! store.finalize();
//!
//! let hits = store.search(IndexKind::Attribute, &Window::new(6.0, 7.0)?);
//! assert_eq!(hits.len(), 1);
//! assert_eq!(store.interval(hits[0].id).map(|iv| iv.value().to_string()), Some("blue".into()));
//! # Ok::<(), dynnet::DynError>(())
//! ```

mod bounds;
mod cursor;

pub use bounds::TimeBounds;
pub use cursor::{ChangeSet, QueryCursor};

use crate::config::Config;
use crate::error::{DynError, Result};
use crate::index::{IntervalHit, IntervalIndex};
use crate::interval::{Interval, IntervalArena, IntervalId, Window};
use crate::record::{AttributeRecord, OverwriteOutcome};
use dynnet_types::key::{AttributeKey, EntityId, EntityKind};
use dynnet_types::stats::StoreStats;
use dynnet_types::time::Time;
use dynnet_types::value::{AttrValue, ValueType, compare_max, compare_min};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Which index partition a query runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    /// Intervals of the identifying column
    Identity,
    /// Intervals of every other column
    Attribute,
}

/// Interval store for one entity class.
#[derive(Debug)]
pub struct EntityStore {
    kind: EntityKind,
    identity_column: String,
    log_ambiguous: bool,
    arena: IntervalArena,
    records: FxHashMap<AttributeKey, AttributeRecord>,
    identity: IntervalIndex,
    attributes: IntervalIndex,
    identity_cursor: QueryCursor,
    attribute_cursor: QueryCursor,
    bounds: TimeBounds,
    finalized: bool,
    stats: StoreStats,
}

impl EntityStore {
    /// Store with the default configuration.
    pub fn new(kind: EntityKind) -> Self {
        Self::with_config(kind, &Config::default())
    }

    pub fn with_config(kind: EntityKind, config: &Config) -> Self {
        Self {
            kind,
            identity_column: config.identity_column.clone(),
            log_ambiguous: config.log_ambiguous_overlaps,
            arena: IntervalArena::new(),
            records: FxHashMap::default(),
            identity: IntervalIndex::new(),
            attributes: IntervalIndex::new(),
            identity_cursor: QueryCursor::new(),
            attribute_cursor: QueryCursor::new(),
            bounds: TimeBounds::new(),
            finalized: false,
            stats: StoreStats::new(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn identity_column(&self) -> &str {
        &self.identity_column
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    fn partition_of(&self, column: &str) -> IndexKind {
        if column == self.identity_column {
            IndexKind::Identity
        } else {
            IndexKind::Attribute
        }
    }

    fn index(&self, kind: IndexKind) -> &IntervalIndex {
        match kind {
            IndexKind::Identity => &self.identity,
            IndexKind::Attribute => &self.attributes,
        }
    }

    fn index_mut(&mut self, kind: IndexKind) -> &mut IntervalIndex {
        match kind {
            IndexKind::Identity => &mut self.identity,
            IndexKind::Attribute => &mut self.attributes,
        }
    }

    /// Add an interval to the `(column, entity)` record.
    ///
    /// Intersecting intervals already in the record are trimmed by the
    /// overwrite policy. Overlaps the policy cannot resolve are kept as-is,
    /// logged, and listed in the returned outcome.
    pub fn insert(
        &mut self,
        entity: EntityId,
        column: &str,
        interval: Interval,
    ) -> Result<OverwriteOutcome> {
        let key = AttributeKey::new(column, entity);
        let range = interval.range();

        let record = self
            .records
            .entry(key.clone())
            .or_insert_with(|| AttributeRecord::new(key));
        let outcome = record.insert(&mut self.arena, interval)?;

        self.bounds.observe(range);
        self.stats.record_operation();
        self.stats.record_trimmed(outcome.trimmed_count());
        self.stats.record_ambiguous(outcome.conflicts.len() as u64);

        if !outcome.conflicts.is_empty() && self.log_ambiguous {
            self.warn_ambiguous(entity, column, &outcome);
        }

        if column != self.identity_column {
            let parent_key = AttributeKey::new(self.identity_column.as_str(), entity);
            self.records
                .entry(parent_key.clone())
                .or_insert_with(|| AttributeRecord::new(parent_key))
                .add_child(column);
        }

        if self.finalized {
            self.index_after_insert(entity, column, &outcome);
        }

        Ok(outcome)
    }

    fn index_after_insert(&mut self, entity: EntityId, column: &str, outcome: &OverwriteOutcome) {
        let partition = self.partition_of(column);
        let index = match partition {
            IndexKind::Identity => &mut self.identity,
            IndexKind::Attribute => &mut self.attributes,
        };

        if let Some(interval) = self.arena.interval(outcome.id) {
            index.insert(outcome.id, interval, entity);
        }
        for id in &outcome.trimmed {
            if let Some(interval) = self.arena.interval(*id) {
                index.rekey(*id, interval);
            }
        }
    }

    fn warn_ambiguous(&self, entity: EntityId, column: &str, outcome: &OverwriteOutcome) {
        let label = self.label(entity);
        let Some(incoming) = self.arena.interval(outcome.id) else {
            return;
        };
        for id in &outcome.conflicts {
            if let Some(existing) = self.arena.interval(*id) {
                log::warn!(
                    "inconsistent attribute interval for {} label={}: \
                     attr={} value={} start={} end={} / attr={} value={} start={} end={}",
                    self.kind,
                    label,
                    column,
                    existing.value(),
                    existing.start(),
                    existing.end(),
                    column,
                    incoming.value(),
                    incoming.start(),
                    incoming.end(),
                );
            }
        }
    }

    /// Bulk-load both indexes from the records and enter the query phase.
    ///
    /// Records are visited in key order so the tie-break between equal
    /// endpoints is deterministic.
    pub fn finalize(&mut self) {
        let mut keys: Vec<&AttributeKey> = self.records.keys().collect();
        keys.sort_unstable();

        let arena = &self.arena;
        let records = &self.records;
        let identity_column = self.identity_column.as_str();

        let entries = |identity: bool| {
            keys.iter()
                .filter(move |key| (key.column == identity_column) == identity)
                .filter_map(move |key| records.get(*key))
                .flat_map(move |record| {
                    record.intervals().iter().filter_map(move |id| {
                        arena
                            .interval(*id)
                            .map(|interval| (*id, interval, record.entity()))
                    })
                })
        };

        self.identity.bulk_load(entries(true));
        self.attributes.bulk_load(entries(false));
        self.finalized = true;

        log::debug!(
            "finalized {} store: {} identity entries, {} attribute entries",
            self.kind,
            self.identity.len(),
            self.attributes.len()
        );
    }

    /// Drop an entity and every record linked under its identity record.
    ///
    /// Returns the dropped records, marked removed. Adjacent edges are not
    /// touched; callers remove them first.
    pub fn remove(&mut self, entity: EntityId) -> Result<Vec<AttributeRecord>> {
        let identity_key = AttributeKey::new(self.identity_column.as_str(), entity);
        if !self.records.contains_key(&identity_key) {
            return Err(DynError::unknown_key(&self.identity_column, entity));
        }

        let mut pending = vec![identity_key];
        let mut removed = Vec::new();
        while let Some(key) = pending.pop() {
            let Some(mut record) = self.records.remove(&key) else {
                continue;
            };
            pending.extend(
                record
                    .children()
                    .map(|column| AttributeKey::new(column, entity)),
            );

            let partition = self.partition_of(record.column());
            for id in record.intervals() {
                self.index_mut(partition).remove(*id, entity);
                self.arena.remove(*id);
            }
            record.mark_removed();
            removed.push(record);
        }

        self.stats.record_operation();
        log::debug!(
            "removed {} {} with {} records",
            self.kind,
            entity,
            removed.len()
        );
        Ok(removed)
    }

    /// Drop every record, index entry, and cursor snapshot.
    ///
    /// Time bounds are kept. The store returns to its build phase.
    pub fn remove_all(&mut self) {
        self.records.clear();
        self.arena.clear();
        self.identity.clear();
        self.attributes.clear();
        self.identity_cursor.reset();
        self.attribute_cursor.reset();
        self.finalized = false;
        self.stats.record_operation();
        log::debug!("cleared {} store", self.kind);
    }

    pub fn search(&self, kind: IndexKind, window: &Window) -> Vec<IntervalHit> {
        self.index(kind).search(window)
    }

    pub fn search_not(&self, kind: IndexKind, window: &Window) -> Vec<IntervalHit> {
        self.index(kind).search_not(window)
    }

    /// Search `window` and diff the result against the previous search of
    /// the same partition.
    pub fn search_changed(&mut self, kind: IndexKind, window: &Window) -> ChangeSet {
        let active = self.index(kind).search(window);
        let cursor = match kind {
            IndexKind::Identity => &mut self.identity_cursor,
            IndexKind::Attribute => &mut self.attribute_cursor,
        };
        let changes = cursor.advance(active);
        log::trace!(
            "{} {:?} change set: +{} -{}",
            self.kind,
            kind,
            changes.entered.len(),
            changes.left.len()
        );
        changes
    }

    pub fn cursor(&self, kind: IndexKind) -> &QueryCursor {
        match kind {
            IndexKind::Identity => &self.identity_cursor,
            IndexKind::Attribute => &self.attribute_cursor,
        }
    }

    /// Size of the last `search_changed` result for `kind`.
    pub fn visible_count(&self, kind: IndexKind) -> usize {
        self.cursor(kind).visible_count()
    }

    /// Indexed handles owned by `entity`, identity partition first.
    pub fn intervals_of(&self, entity: EntityId) -> Vec<IntervalId> {
        let mut ids = self.identity.intervals_of(entity);
        ids.extend(self.attributes.intervals_of(entity));
        ids
    }

    pub fn interval(&self, id: IntervalId) -> Option<&Interval> {
        self.arena.interval(id)
    }

    /// Key of the record that owns `id`.
    pub fn owner(&self, id: IntervalId) -> Option<&AttributeKey> {
        self.arena.get(id).map(|owned| &owned.owner)
    }

    pub fn record(&self, entity: EntityId, column: &str) -> Result<&AttributeRecord> {
        self.records
            .get(&AttributeKey::new(column, entity))
            .ok_or_else(|| DynError::unknown_key(column, entity))
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.records
            .contains_key(&AttributeKey::new(self.identity_column.as_str(), entity))
    }

    /// Value of `column` for `entity` at instant `t`.
    ///
    /// `Ok(None)` means the key exists but no interval covers `t`.
    pub fn value_at(&self, entity: EntityId, column: &str, t: f64) -> Result<Option<&AttrValue>> {
        let t = Time::new(t).ok_or(DynError::NanEndpoint)?;
        let record = self.record(entity, column)?;
        Ok(record.value_at(&self.arena, t))
    }

    /// Display label: the first identity value, else the numeric id.
    pub fn label(&self, entity: EntityId) -> String {
        self.record(entity, &self.identity_column)
            .ok()
            .and_then(|record| record.intervals().first())
            .and_then(|id| self.arena.interval(*id))
            .map(|interval| interval.value().to_string())
            .unwrap_or_else(|| entity.to_string())
    }

    /// Entities that have an identity record, in id order.
    pub fn entities(&self) -> Vec<EntityId> {
        let mut out: Vec<EntityId> = self
            .records
            .keys()
            .filter(|key| key.column == self.identity_column)
            .map(|key| key.entity)
            .collect();
        out.sort_unstable();
        out
    }

    fn reduce_column<P, C>(
        &self,
        column: &str,
        is_live: impl Fn(EntityId) -> bool,
        pick: P,
        combine: C,
    ) -> Result<Option<AttrValue>>
    where
        P: Fn(&AttributeRecord) -> Option<&AttrValue>,
        C: Fn(Option<AttrValue>, Option<AttrValue>) -> Option<AttrValue>,
    {
        let mut seen = false;
        let mut value_type: Option<ValueType> = None;
        let mut acc: Option<AttrValue> = None;

        for record in self.records.values().filter(|r| r.column() == column) {
            seen = true;
            if !is_live(record.entity()) {
                continue;
            }
            let Some(found) = record.value_type() else {
                continue;
            };
            if found == ValueType::String || value_type.is_some_and(|t| t != found) {
                return Ok(None);
            }
            value_type = Some(found);
            acc = combine(acc, pick(record).cloned());
        }

        if !seen {
            return Err(DynError::UnknownColumn(column.to_string()));
        }
        Ok(acc)
    }

    /// Smallest value of `column` over the live entities.
    ///
    /// Ints and doubles compare numerically, booleans reduce to `false`, and
    /// strings or mixed types yield `None`.
    pub fn min_value(
        &self,
        column: &str,
        is_live: impl Fn(EntityId) -> bool,
    ) -> Result<Option<AttrValue>> {
        self.reduce_column(column, is_live, AttributeRecord::min_value, compare_min)
    }

    /// Largest value of `column` over the live entities. Booleans reduce to
    /// `true`.
    pub fn max_value(
        &self,
        column: &str,
        is_live: impl Fn(EntityId) -> bool,
    ) -> Result<Option<AttrValue>> {
        self.reduce_column(column, is_live, AttributeRecord::max_value, compare_max)
    }

    pub fn time_bounds(&self) -> &TimeBounds {
        &self.bounds
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            intervals: self.arena.len(),
            records: self.records.len(),
            identity_entries: self.identity.len(),
            attribute_entries: self.attributes.len(),
            ..self.stats.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_store() -> EntityStore {
        EntityStore::new(EntityKind::Node)
    }

    fn w(a: f64, b: f64) -> Window {
        Window::new(a, b).unwrap()
    }

    fn iv(a: f64, b: f64, v: impl Into<AttrValue>) -> Interval {
        Interval::new(a, b, v).unwrap()
    }

    fn ids(hits: &[IntervalHit]) -> Vec<IntervalId> {
        let mut out: Vec<IntervalId> = hits.iter().map(|h| h.id).collect();
        out.sort();
        out
    }

    #[test]
    fn test_trim_then_query() {
        let mut store = node_store();
        let n = EntityId(1);
        store.insert(n, "name", iv(0.0, 20.0, "n1")).unwrap();
        let a = store.insert(n, "color", iv(0.0, 10.0, "red")).unwrap().id;
        let b = store.insert(n, "color", iv(5.0, 15.0, "blue")).unwrap().id;
        store.finalize();

        let a_iv = store.interval(a).unwrap();
        assert_eq!((a_iv.start().value(), a_iv.end().value()), (0.0, 5.0));

        assert_eq!(ids(&store.search(IndexKind::Attribute, &w(6.0, 7.0))), vec![b]);
        assert_eq!(ids(&store.search(IndexKind::Attribute, &w(2.0, 3.0))), vec![a]);
        assert_eq!(ids(&store.search(IndexKind::Attribute, &w(0.0, 20.0))), vec![a, b]);
        assert_eq!(store.stats().trimmed_intervals, 1);
    }

    #[test]
    fn test_partitions_split_on_identity_column() {
        let mut store = node_store();
        store.insert(EntityId(1), "name", iv(0.0, 5.0, "a")).unwrap();
        store.insert(EntityId(1), "size", iv(0.0, 5.0, 3)).unwrap();
        store.finalize();

        let stats = store.stats();
        assert_eq!(stats.identity_entries, 1);
        assert_eq!(stats.attribute_entries, 1);
        assert_eq!(stats.records, 2);
        assert_eq!(
            store
                .record(EntityId(1), "name")
                .unwrap()
                .children()
                .collect::<Vec<_>>(),
            vec!["size"]
        );
    }

    #[test]
    fn test_remove_drops_records_and_entries() {
        let mut store = node_store();
        let n = EntityId(4);
        store.insert(n, "name", iv(0.0, 10.0, "x")).unwrap();
        store.insert(n, "weight", iv(0.0, 10.0, 1.5)).unwrap();
        store.insert(EntityId(5), "name", iv(0.0, 10.0, "y")).unwrap();
        store.finalize();

        let removed = store.remove(n).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(
            removed
                .iter()
                .all(|r| r.state() == crate::record::RecordState::Removed)
        );

        assert!(store.intervals_of(n).is_empty());
        let hits = store.search(IndexKind::Identity, &w(1.0, 2.0));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].owner, EntityId(5));
        assert!(store.search(IndexKind::Attribute, &w(1.0, 2.0)).is_empty());
        assert!(store.record(n, "weight").unwrap_err().is_not_found());

        assert!(matches!(
            store.remove(n),
            Err(DynError::UnknownKey { .. })
        ));
    }

    #[test]
    fn test_insert_after_finalize_is_indexed() {
        let mut store = node_store();
        let n = EntityId(1);
        store.insert(n, "name", iv(0.0, 10.0, "a")).unwrap();
        store.finalize();

        let late = store.insert(n, "name", iv(5.0, 20.0, "b")).unwrap();
        assert_eq!(late.trimmed.len(), 1);

        let hits = store.search(IndexKind::Identity, &w(6.0, 7.0));
        assert_eq!(ids(&hits), vec![late.id]);
        assert_eq!(store.search(IndexKind::Identity, &w(2.0, 3.0)).len(), 1);
        assert_eq!(store.intervals_of(n).len(), 2);
    }

    #[test]
    fn test_search_changed_tracks_visible() {
        let mut store = node_store();
        store.insert(EntityId(1), "name", iv(0.0, 5.0, "a")).unwrap();
        store.insert(EntityId(2), "name", iv(3.0, 8.0, "b")).unwrap();
        store.finalize();

        let first = store.search_changed(IndexKind::Identity, &w(0.0, 1.0));
        assert_eq!(first.owners(), vec![EntityId(1)]);
        assert_eq!(store.visible_count(IndexKind::Identity), 1);

        let second = store.search_changed(IndexKind::Identity, &w(6.0, 7.0));
        assert_eq!(second.entered.len(), 1);
        assert_eq!(second.entered[0].owner, EntityId(2));
        assert_eq!(second.left.len(), 1);
        assert_eq!(second.left[0].owner, EntityId(1));
        assert_eq!(store.visible_count(IndexKind::Identity), 1);
        assert_eq!(store.visible_count(IndexKind::Attribute), 0);
    }

    #[test]
    fn test_value_at_distinguishes_absent_from_unknown() {
        let mut store = node_store();
        store.insert(EntityId(1), "size", iv(0.0, 5.0, 2)).unwrap();

        assert_eq!(
            store.value_at(EntityId(1), "size", 1.0).unwrap(),
            Some(&AttrValue::Int(2))
        );
        assert_eq!(store.value_at(EntityId(1), "size", 7.0).unwrap(), None);
        assert!(store.value_at(EntityId(1), "color", 1.0).is_err());
        assert!(store.value_at(EntityId(9), "size", 1.0).is_err());
    }

    #[test]
    fn test_min_max_over_live_entities() {
        let mut store = node_store();
        store.insert(EntityId(1), "weight", iv(0.0, 1.0, 4.0)).unwrap();
        store.insert(EntityId(1), "weight", iv(1.0, 2.0, 7.0)).unwrap();
        store.insert(EntityId(2), "weight", iv(0.0, 1.0, -3.0)).unwrap();
        store.insert(EntityId(3), "label", iv(0.0, 1.0, "x")).unwrap();

        let all = |_: EntityId| true;
        assert_eq!(
            store.min_value("weight", all).unwrap(),
            Some(AttrValue::Double(-3.0))
        );
        assert_eq!(
            store.max_value("weight", all).unwrap(),
            Some(AttrValue::Double(7.0))
        );
        assert_eq!(
            store.min_value("weight", |e| e == EntityId(1)).unwrap(),
            Some(AttrValue::Double(4.0))
        );
        assert_eq!(store.min_value("label", all).unwrap(), None);
        assert!(matches!(
            store.min_value("missing", all),
            Err(DynError::UnknownColumn(_))
        ));
    }

    #[test]
    fn test_label_and_bounds() {
        let mut store = node_store();
        store.insert(EntityId(1), "name", iv(2.0, f64::INFINITY, "alpha")).unwrap();
        store.insert(EntityId(2), "size", iv(f64::NEG_INFINITY, 9.0, 1)).unwrap();

        assert_eq!(store.label(EntityId(1)), "alpha");
        assert_eq!(store.label(EntityId(2)), "2");
        assert_eq!(store.time_bounds().min_time(-1.0), 2.0);
        assert_eq!(store.time_bounds().max_time(1.0), 9.0);
        assert_eq!(store.entities(), vec![EntityId(1), EntityId(2)]);
    }

    #[test]
    fn test_remove_all_resets_store() {
        let mut store = node_store();
        store.insert(EntityId(1), "name", iv(0.0, 5.0, "a")).unwrap();
        store.finalize();
        store.search_changed(IndexKind::Identity, &w(1.0, 2.0));

        store.remove_all();
        assert!(!store.is_finalized());
        assert_eq!(store.stats().intervals, 0);
        assert_eq!(store.visible_count(IndexKind::Identity), 0);
        assert!(store.search(IndexKind::Identity, &w(1.0, 2.0)).is_empty());
        assert_eq!(store.time_bounds().min_time(-1.0), 0.0);
    }

    #[test]
    fn test_ambiguous_overlap_counted() {
        let mut store = node_store();
        store.insert(EntityId(1), "name", iv(0.0, 5.0, "a")).unwrap();
        let outcome = store.insert(EntityId(1), "name", iv(0.0, 5.0, "b")).unwrap();
        assert_eq!(outcome.conflicts.len(), 1);
        assert_eq!(store.stats().ambiguous_overlaps, 1);
    }
}
