//! One animation frame worth of change sets.

use crate::interval::Window;
use crate::store::ChangeSet;
use serde::{Deserialize, Serialize};

/// Change sets produced by [`DynamicNetwork::advance`](crate::DynamicNetwork::advance).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameUpdate {
    /// Window the frame was computed for
    pub window: Window,
    /// Nodes that appeared or disappeared
    pub nodes: ChangeSet,
    /// Edges that appeared or disappeared
    pub edges: ChangeSet,
    pub graph_attributes: ChangeSet,
    pub node_attributes: ChangeSet,
    pub edge_attributes: ChangeSet,
}

impl FrameUpdate {
    pub fn is_empty(&self) -> bool {
        self.streams().iter().all(|changes| changes.is_empty())
    }

    /// Total number of changed hits across all streams.
    pub fn total_changes(&self) -> usize {
        self.streams().iter().map(|changes| changes.len()).sum()
    }

    fn streams(&self) -> [&ChangeSet; 5] {
        [
            &self.nodes,
            &self.edges,
            &self.graph_attributes,
            &self.node_attributes,
            &self.edge_attributes,
        ]
    }
}
