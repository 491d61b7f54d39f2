//! Thread-safe wrapper for sharing a dynamic network.
//!
//! `SyncNetwork` wraps a [`DynamicNetwork`] in `Arc<RwLock<_>>`. Searches and
//! aggregates take the read lock. Inserts, removals, `finalize`, and every
//! change-set query take the write lock, since change-set queries replace the
//! cursor snapshot.
//!
//! # Examples
//!
//! ```rust
//! use dynnet::{EntityId, Interval, SyncNetwork, Window};
//! use std::thread;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let net = SyncNetwork::new(EntityId(0), false);
//!
//! let loader = net.clone();
//! let handle = thread::spawn(move || {
//!     loader
//!         .insert_node(EntityId(1), "name", Interval::new(0.0, 10.0, "a").unwrap())
//!         .unwrap();
//! });
//! handle.join().unwrap();
//!
//! net.finalize();
//! let frame = net.advance(Window::at(1.0)?);
//! assert_eq!(frame.nodes.entered.len(), 1);
//! # Ok(())
//! # }
//! ```

use super::{DynamicNetwork, FrameUpdate};
use crate::config::Config;
use crate::error::Result;
use crate::index::IntervalHit;
use crate::interval::{Interval, Window};
use crate::record::{AttributeRecord, OverwriteOutcome};
use crate::store::IndexKind;
use dynnet_types::key::{EntityId, EntityKind};
use dynnet_types::stats::StoreStats;
use dynnet_types::value::AttrValue;
use parking_lot::RwLock;
use std::sync::Arc;

/// Thread-safe handle to a [`DynamicNetwork`]. Clones share the network.
#[derive(Clone)]
pub struct SyncNetwork {
    inner: Arc<RwLock<DynamicNetwork>>,
}

impl SyncNetwork {
    pub fn new(graph_id: EntityId, directed: bool) -> Self {
        Self::from_network(DynamicNetwork::new(graph_id, directed))
    }

    pub fn with_config(graph_id: EntityId, directed: bool, config: Config) -> Result<Self> {
        Ok(Self::from_network(DynamicNetwork::with_config(
            graph_id, directed, config,
        )?))
    }

    pub fn from_network(network: DynamicNetwork) -> Self {
        Self {
            inner: Arc::new(RwLock::new(network)),
        }
    }

    /// Run `f` under the read lock.
    pub fn read<R>(&self, f: impl FnOnce(&DynamicNetwork) -> R) -> R {
        f(&self.inner.read())
    }

    /// Run `f` under the write lock.
    pub fn write<R>(&self, f: impl FnOnce(&mut DynamicNetwork) -> R) -> R {
        f(&mut self.inner.write())
    }

    // ===== Build phase =====

    pub fn insert_graph(&self, column: &str, interval: Interval) -> Result<OverwriteOutcome> {
        self.inner.write().insert_graph(column, interval)
    }

    pub fn insert_node(
        &self,
        node: EntityId,
        column: &str,
        interval: Interval,
    ) -> Result<OverwriteOutcome> {
        self.inner.write().insert_node(node, column, interval)
    }

    pub fn insert_edge(
        &self,
        edge: EntityId,
        column: &str,
        interval: Interval,
    ) -> Result<OverwriteOutcome> {
        self.inner.write().insert_edge(edge, column, interval)
    }

    pub fn finalize(&self) {
        self.inner.write().finalize()
    }

    pub fn register_node(&self, external: impl Into<String>, node: EntityId) -> EntityId {
        self.inner.write().register_node(external, node)
    }

    pub fn register_edge(&self, external: impl Into<String>, edge: EntityId) -> EntityId {
        self.inner.write().register_edge(external, edge)
    }

    // ===== Removal =====

    pub fn remove_node(&self, node: EntityId) -> Result<Vec<AttributeRecord>> {
        self.inner.write().remove_node(node)
    }

    pub fn remove_edge(&self, edge: EntityId) -> Result<Vec<AttributeRecord>> {
        self.inner.write().remove_edge(edge)
    }

    pub fn remove_node_with_edges<I>(&self, node: EntityId, edges: I) -> Result<()>
    where
        I: IntoIterator<Item = EntityId>,
    {
        self.inner.write().remove_node_with_edges(node, edges)
    }

    pub fn remove_all(&self) {
        self.inner.write().remove_all()
    }

    // ===== Queries =====

    pub fn search(&self, kind: EntityKind, index: IndexKind, window: &Window) -> Vec<IntervalHit> {
        self.inner.read().search(kind, index, window)
    }

    pub fn search_not(
        &self,
        kind: EntityKind,
        index: IndexKind,
        window: &Window,
    ) -> Vec<IntervalHit> {
        self.inner.read().search_not(kind, index, window)
    }

    pub fn advance(&self, window: Window) -> FrameUpdate {
        self.inner.write().advance(window)
    }

    pub fn visible_nodes(&self) -> usize {
        self.inner.read().visible_nodes()
    }

    pub fn visible_edges(&self) -> usize {
        self.inner.read().visible_edges()
    }

    /// Owned copy of the value active at `t`.
    pub fn value_at(
        &self,
        kind: EntityKind,
        entity: EntityId,
        column: &str,
        t: f64,
    ) -> Result<Option<AttrValue>> {
        self.inner
            .read()
            .value_at(kind, entity, column, t)
            .map(|value| value.cloned())
    }

    pub fn min_value(&self, kind: EntityKind, column: &str) -> Result<Option<AttrValue>> {
        self.inner.read().min_value(kind, column)
    }

    pub fn max_value(&self, kind: EntityKind, column: &str) -> Result<Option<AttrValue>> {
        self.inner.read().max_value(kind, column)
    }

    pub fn min_time(&self) -> f64 {
        self.inner.read().min_time()
    }

    pub fn max_time(&self) -> f64 {
        self.inner.read().max_time()
    }

    pub fn stats(&self) -> StoreStats {
        self.inner.read().stats()
    }
}
