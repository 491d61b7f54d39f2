//! Dynamic network facade.
//!
//! [`DynamicNetwork`] ties together one [`EntityStore`] per entity class, the
//! [`PositionStore`] for node coordinates, and the registry that maps
//! loader-supplied string ids to [`EntityId`]s. A loader inserts intervals,
//! calls [`DynamicNetwork::finalize`] once, and a rendering driver then calls
//! [`DynamicNetwork::advance`] once per frame.

mod frame;

#[cfg(feature = "sync")]
mod sync;

pub use frame::FrameUpdate;

#[cfg(feature = "sync")]
pub use sync::SyncNetwork;

use crate::config::Config;
use crate::error::{DynError, Result};
use crate::index::IntervalHit;
use crate::interval::{Interval, IntervalId, Window};
use crate::layout::PositionStore;
use crate::record::{AttributeRecord, OverwriteOutcome};
use crate::store::{ChangeSet, EntityStore, IndexKind};
use dynnet_types::key::{EntityId, EntityKind};
use dynnet_types::stats::StoreStats;
use dynnet_types::value::AttrValue;
use rustc_hash::{FxHashMap, FxHashSet};

/// A network whose entities and attributes change over time.
///
/// `DynamicNetwork` is single-owner: mutation and change-set queries take
/// `&mut self`. Use [`SyncNetwork`] to share one between threads.
///
/// # Examples
///
/// ```rust
/// use dynnet::{DynamicNetwork, EntityId, Interval, Window};
///
/// let mut net = DynamicNetwork::new(EntityId(0), true);
/// let a = net.register_node("a", EntityId(1));
/// let b = net.register_node("b", EntityId(2));
/// net.insert_node(a, "name", Interval::new(0.0, 10.0, "a")?)?;
/// net.insert_node(b, "name", Interval::new(5.0, 10.0, "b")?)?;
/// net.finalize();
///
/// let frame = net.advance(Window::at(2.0)?);
/// assert_eq!(frame.nodes.entered.len(), 1);
/// assert_eq!(net.visible_nodes(), 1);
///
/// let frame = net.advance(Window::at(6.0)?);
/// assert_eq!(frame.nodes.entered[0].owner, b);
/// assert_eq!(net.visible_nodes(), 2);
/// # Ok::<(), dynnet::DynError>(())
/// ```
#[derive(Debug)]
pub struct DynamicNetwork {
    graph_id: EntityId,
    directed: bool,
    config: Config,
    graph: EntityStore,
    nodes: EntityStore,
    edges: EntityStore,
    layout: PositionStore,
    node_ids: FxHashMap<String, EntityId>,
    edge_ids: FxHashMap<String, EntityId>,
}

impl DynamicNetwork {
    /// Network with the default configuration.
    pub fn new(graph_id: EntityId, directed: bool) -> Self {
        Self::build(graph_id, directed, Config::default())
    }

    /// Network with a custom configuration, validated first.
    pub fn with_config(graph_id: EntityId, directed: bool, config: Config) -> Result<Self> {
        config.validate().map_err(DynError::InvalidConfig)?;
        Ok(Self::build(graph_id, directed, config))
    }

    fn build(graph_id: EntityId, directed: bool, config: Config) -> Self {
        Self {
            graph_id,
            directed,
            graph: EntityStore::with_config(EntityKind::Graph, &config),
            nodes: EntityStore::with_config(EntityKind::Node, &config),
            edges: EntityStore::with_config(EntityKind::Edge, &config),
            layout: PositionStore::new(),
            node_ids: FxHashMap::default(),
            edge_ids: FxHashMap::default(),
            config,
        }
    }

    pub fn graph_id(&self) -> EntityId {
        self.graph_id
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self, kind: EntityKind) -> &EntityStore {
        match kind {
            EntityKind::Graph => &self.graph,
            EntityKind::Node => &self.nodes,
            EntityKind::Edge => &self.edges,
        }
    }

    pub fn store_mut(&mut self, kind: EntityKind) -> &mut EntityStore {
        match kind {
            EntityKind::Graph => &mut self.graph,
            EntityKind::Node => &mut self.nodes,
            EntityKind::Edge => &mut self.edges,
        }
    }

    pub fn layout(&self) -> &PositionStore {
        &self.layout
    }

    pub fn layout_mut(&mut self) -> &mut PositionStore {
        &mut self.layout
    }

    // ===== Build phase =====

    /// Add an interval to a column of the graph itself.
    pub fn insert_graph(&mut self, column: &str, interval: Interval) -> Result<OverwriteOutcome> {
        let graph_id = self.graph_id;
        self.graph.insert(graph_id, column, interval)
    }

    pub fn insert_node(
        &mut self,
        node: EntityId,
        column: &str,
        interval: Interval,
    ) -> Result<OverwriteOutcome> {
        self.nodes.insert(node, column, interval)
    }

    pub fn insert_edge(
        &mut self,
        edge: EntityId,
        column: &str,
        interval: Interval,
    ) -> Result<OverwriteOutcome> {
        self.edges.insert(edge, column, interval)
    }

    /// Bulk-load the indexes of every entity class.
    pub fn finalize(&mut self) {
        self.graph.finalize();
        self.nodes.finalize();
        self.edges.finalize();
    }

    // ===== Removal =====

    /// Drop a node and its positions. Its adjacent edges must be removed
    /// first, see [`remove_node_with_edges`](Self::remove_node_with_edges).
    pub fn remove_node(&mut self, node: EntityId) -> Result<Vec<AttributeRecord>> {
        let removed = self.nodes.remove(node)?;
        match self.layout.remove_node(node) {
            Ok(_) => Ok(removed),
            Err(e) if e.is_not_found() => Ok(removed),
            Err(e) => Err(e),
        }
    }

    pub fn remove_edge(&mut self, edge: EntityId) -> Result<Vec<AttributeRecord>> {
        self.edges.remove(edge)
    }

    /// Drop the given adjacent edges, then the node and its positions.
    ///
    /// Edges that are already gone are skipped.
    pub fn remove_node_with_edges<I>(&mut self, node: EntityId, edges: I) -> Result<()>
    where
        I: IntoIterator<Item = EntityId>,
    {
        if !self.nodes.contains(node) {
            return Err(DynError::unknown_key(&self.config.identity_column, node));
        }

        for edge in edges {
            match self.edges.remove(edge) {
                Ok(_) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }

        self.remove_node(node)?;
        Ok(())
    }

    /// Drop every interval of every entity class and every position.
    /// Registered ids are kept.
    pub fn remove_all(&mut self) {
        self.graph.remove_all();
        self.nodes.remove_all();
        self.edges.remove_all();
        self.layout.remove_all();
    }

    // ===== Queries =====

    pub fn search(&self, kind: EntityKind, index: IndexKind, window: &Window) -> Vec<IntervalHit> {
        self.store(kind).search(index, window)
    }

    pub fn search_not(
        &self,
        kind: EntityKind,
        index: IndexKind,
        window: &Window,
    ) -> Vec<IntervalHit> {
        self.store(kind).search_not(index, window)
    }

    pub fn search_changed(
        &mut self,
        kind: EntityKind,
        index: IndexKind,
        window: &Window,
    ) -> ChangeSet {
        self.store_mut(kind).search_changed(index, window)
    }

    /// Run every change-set stream of one frame.
    pub fn advance(&mut self, window: Window) -> FrameUpdate {
        let nodes = self.nodes.search_changed(IndexKind::Identity, &window);
        let edges = self.edges.search_changed(IndexKind::Identity, &window);
        let graph_attributes = self.graph.search_changed(IndexKind::Attribute, &window);
        let node_attributes = self.nodes.search_changed(IndexKind::Attribute, &window);
        let edge_attributes = self.edges.search_changed(IndexKind::Attribute, &window);

        FrameUpdate {
            window,
            nodes,
            edges,
            graph_attributes,
            node_attributes,
            edge_attributes,
        }
    }

    /// Nodes active in the last frame.
    pub fn visible_nodes(&self) -> usize {
        self.nodes.visible_count(IndexKind::Identity)
    }

    pub fn visible_edges(&self) -> usize {
        self.edges.visible_count(IndexKind::Identity)
    }

    /// Indexed intervals of an entity across both partitions.
    pub fn intervals_of(&self, kind: EntityKind, entity: EntityId) -> Vec<IntervalId> {
        self.store(kind).intervals_of(entity)
    }

    pub fn graph_intervals(&self) -> Vec<IntervalId> {
        self.graph.intervals_of(self.graph_id)
    }

    pub fn interval(&self, kind: EntityKind, id: IntervalId) -> Option<&Interval> {
        self.store(kind).interval(id)
    }

    pub fn record(
        &self,
        kind: EntityKind,
        entity: EntityId,
        column: &str,
    ) -> Result<&AttributeRecord> {
        self.store(kind).record(entity, column)
    }

    pub fn value_at(
        &self,
        kind: EntityKind,
        entity: EntityId,
        column: &str,
        t: f64,
    ) -> Result<Option<&AttrValue>> {
        self.store(kind).value_at(entity, column, t)
    }

    pub fn label(&self, kind: EntityKind, entity: EntityId) -> String {
        self.store(kind).label(entity)
    }

    fn live_set(&self, kind: EntityKind) -> FxHashSet<EntityId> {
        let store = self.store(kind);
        let registered = match kind {
            EntityKind::Graph => return [self.graph_id].into_iter().collect(),
            EntityKind::Node => &self.node_ids,
            EntityKind::Edge => &self.edge_ids,
        };
        registered
            .values()
            .copied()
            .filter(|entity| store.contains(*entity))
            .collect()
    }

    /// Smallest value of `column` over the registered entities still present.
    pub fn min_value(&self, kind: EntityKind, column: &str) -> Result<Option<AttrValue>> {
        let live = self.live_set(kind);
        self.store(kind)
            .min_value(column, |entity| live.contains(&entity))
    }

    /// Largest value of `column` over the registered entities still present.
    pub fn max_value(&self, kind: EntityKind, column: &str) -> Result<Option<AttrValue>> {
        let live = self.live_set(kind);
        self.store(kind)
            .max_value(column, |entity| live.contains(&entity))
    }

    /// Earliest finite time seen by any entity class.
    pub fn min_time(&self) -> f64 {
        self.graph
            .time_bounds()
            .merge(self.nodes.time_bounds())
            .merge(self.edges.time_bounds())
            .min_time(self.config.fallback_min_time)
    }

    /// Latest finite time seen by any entity class.
    pub fn max_time(&self) -> f64 {
        self.graph
            .time_bounds()
            .merge(self.nodes.time_bounds())
            .merge(self.edges.time_bounds())
            .max_time(self.config.fallback_max_time)
    }

    // ===== External id registry =====

    /// Map a loader id to a node, replacing any earlier mapping, and return
    /// the node id.
    pub fn register_node(&mut self, external: impl Into<String>, node: EntityId) -> EntityId {
        self.node_ids.insert(external.into(), node);
        node
    }

    pub fn register_edge(&mut self, external: impl Into<String>, edge: EntityId) -> EntityId {
        self.edge_ids.insert(external.into(), edge);
        edge
    }

    pub fn node_id(&self, external: &str) -> Result<EntityId> {
        self.node_ids
            .get(external)
            .copied()
            .ok_or_else(|| DynError::UnknownExternalId(external.to_string()))
    }

    pub fn edge_id(&self, external: &str) -> Result<EntityId> {
        self.edge_ids
            .get(external)
            .copied()
            .ok_or_else(|| DynError::UnknownExternalId(external.to_string()))
    }

    pub fn contains_node(&self, external: &str) -> bool {
        self.node_ids.contains_key(external)
    }

    pub fn contains_edge(&self, external: &str) -> bool {
        self.edge_ids.contains_key(external)
    }

    /// Counters summed over the three entity stores.
    pub fn stats(&self) -> StoreStats {
        let mut stats = self.graph.stats();
        stats.merge(&self.nodes.stats());
        stats.merge(&self.edges.stats());
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Axis;

    fn iv(a: f64, b: f64, v: impl Into<AttrValue>) -> Interval {
        Interval::new(a, b, v).unwrap()
    }

    fn sample() -> DynamicNetwork {
        let mut net = DynamicNetwork::new(EntityId(0), false);
        net.insert_graph("name", iv(0.0, 30.0, "g")).unwrap();
        net.insert_graph("title", iv(0.0, 30.0, "demo")).unwrap();
        for (ext, id, start) in [("a", 1, 0.0), ("b", 2, 5.0), ("c", 3, 10.0)] {
            let node = net.register_node(ext, EntityId(id));
            net.insert_node(node, "name", iv(start, 20.0, ext)).unwrap();
            net.insert_node(node, "weight", iv(start, 20.0, id as f64)).unwrap();
        }
        let edge = net.register_edge("a-b", EntityId(10));
        net.insert_edge(edge, "name", iv(5.0, 15.0, "a-b")).unwrap();
        net.finalize();
        net
    }

    #[test]
    fn test_frames_drive_visible_counts() {
        let mut net = sample();

        let first = net.advance(Window::at(1.0).unwrap());
        assert_eq!(first.nodes.entered.len(), 1);
        assert_eq!(first.graph_attributes.entered.len(), 1);
        assert_eq!(net.visible_nodes(), 1);
        assert_eq!(net.visible_edges(), 0);

        let second = net.advance(Window::at(12.0).unwrap());
        assert_eq!(second.nodes.entered.len(), 2);
        assert!(second.nodes.left.is_empty());
        assert_eq!(second.edges.entered.len(), 1);
        assert!(second.graph_attributes.is_empty());
        assert_eq!(net.visible_nodes(), 3);

        let third = net.advance(Window::at(25.0).unwrap());
        assert_eq!(third.nodes.left.len(), 3);
        assert_eq!(third.edges.left.len(), 1);
        assert_eq!(net.visible_nodes(), 0);
        assert!(!third.is_empty());
        assert!(net.advance(Window::at(26.0).unwrap()).is_empty());
    }

    #[test]
    fn test_registry() {
        let net = sample();
        assert_eq!(net.node_id("b").unwrap(), EntityId(2));
        assert!(net.contains_edge("a-b"));
        assert!(!net.contains_node("z"));
        assert!(matches!(
            net.node_id("z"),
            Err(DynError::UnknownExternalId(_))
        ));
    }

    #[test]
    fn test_remove_node_with_edges() {
        let mut net = sample();
        net.remove_node_with_edges(EntityId(1), [EntityId(10), EntityId(99)])
            .unwrap();

        assert!(net.intervals_of(EntityKind::Node, EntityId(1)).is_empty());
        assert!(net.intervals_of(EntityKind::Edge, EntityId(10)).is_empty());
        assert!(
            net.remove_node_with_edges(EntityId(1), [])
                .unwrap_err()
                .is_not_found()
        );
    }

    #[test]
    fn test_remove_node_drops_positions() {
        let mut net = sample();
        net.layout_mut()
            .insert(EntityId(2), Axis::X, iv(0.0, 20.0, 1.5))
            .unwrap();
        net.layout_mut()
            .insert(EntityId(3), Axis::Y, iv(0.0, 20.0, 2.5))
            .unwrap();

        net.remove_node(EntityId(2)).unwrap();
        assert!(net.layout().intervals_of(EntityId(2)).is_empty());
        let hits = net.layout().search(&Window::at(1.0).unwrap());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].owner, EntityId(3));

        // nodes without positions are removed as well
        net.remove_node(EntityId(1)).unwrap();
        assert!(!net.store(EntityKind::Node).contains(EntityId(1)));
    }

    #[test]
    fn test_frame_round_trips_through_json() {
        let mut net = sample();
        let frame = net.advance(Window::unbounded());
        assert_eq!(frame.nodes.entered.len(), 3);

        let json = serde_json::to_string(&frame).unwrap();
        let back: FrameUpdate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, frame);
        assert_eq!(back.window, Window::unbounded());
    }

    #[test]
    fn test_min_max_values_skip_removed() {
        let mut net = sample();
        assert_eq!(
            net.min_value(EntityKind::Node, "weight").unwrap(),
            Some(AttrValue::Double(1.0))
        );
        assert_eq!(
            net.max_value(EntityKind::Node, "weight").unwrap(),
            Some(AttrValue::Double(3.0))
        );

        net.remove_node(EntityId(1)).unwrap();
        assert_eq!(
            net.min_value(EntityKind::Node, "weight").unwrap(),
            Some(AttrValue::Double(2.0))
        );
    }

    #[test]
    fn test_time_bounds_span_all_stores() {
        let net = sample();
        assert_eq!(net.min_time(), 0.0);
        assert_eq!(net.max_time(), 30.0);

        let empty = DynamicNetwork::new(EntityId(0), true);
        assert_eq!(empty.min_time(), -1.0);
        assert_eq!(empty.max_time(), 1.0);
    }

    #[test]
    fn test_labels_and_values() {
        let net = sample();
        assert_eq!(net.label(EntityKind::Node, EntityId(2)), "b");
        assert_eq!(net.label(EntityKind::Graph, EntityId(0)), "g");
        assert_eq!(
            net.value_at(EntityKind::Graph, EntityId(0), "title", 3.0)
                .unwrap()
                .and_then(AttrValue::as_str),
            Some("demo")
        );
        assert_eq!(net.graph_intervals().len(), 2);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = Config::default().with_identity_column("");
        assert!(matches!(
            DynamicNetwork::with_config(EntityId(0), true, config),
            Err(DynError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_remove_all_keeps_registry() {
        let mut net = sample();
        net.remove_all();
        assert_eq!(net.stats().intervals, 0);
        assert!(net.contains_node("a"));
        assert!(net.search(EntityKind::Node, IndexKind::Identity, &Window::unbounded()).is_empty());
    }
}
