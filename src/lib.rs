//! Temporal interval index and dynamic attribute store for animating
//! time-varying networks.
//!
//! ```rust
//! use dynnet::{DynamicNetwork, EntityId, Interval, Window};
//!
//! let mut net = DynamicNetwork::new(EntityId(0), false);
//! let node = net.register_node("n1", EntityId(1));
//! net.insert_node(node, "name", Interval::new(0.0, 20.0, "n1")?)?;
//! net.insert_node(node, "color", Interval::new(0.0, 10.0, "red")?)?;
//! net.insert_node(node, "color", Interval::new(5.0, 15.0, "blue")?)?;
//! net.finalize();
//!
//! let frame = net.advance(Window::new(6.0, 7.0)?);
//! assert_eq!(frame.nodes.entered.len(), 1);
//! assert_eq!(frame.node_attributes.entered.len(), 1);
//! # Ok::<(), dynnet::DynError>(())
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod index;
pub mod interval;
pub mod layout;
pub mod network;
pub mod record;
pub mod store;

pub use builder::NetworkBuilder;
pub use config::Config;
pub use error::{DynError, Result};

pub use index::{IndexStats, IntervalHit, IntervalIndex};
pub use interval::{Interval, IntervalArena, IntervalId, OwnedInterval, Window, ranges_intersect};
pub use layout::{Axis, NodePosition, PositionStore};
pub use network::{DynamicNetwork, FrameUpdate};
pub use record::{AttributeRecord, OverwriteOutcome, RecordState, Resolution, resolve_overlap};
pub use store::{ChangeSet, EntityStore, IndexKind, QueryCursor, TimeBounds};

#[cfg(feature = "sync")]
pub use network::SyncNetwork;

pub use dynnet_types::key::{AttributeKey, EntityId, EntityKind};
pub use dynnet_types::stats::StoreStats;
pub use dynnet_types::time::Time;
pub use dynnet_types::value::{AttrValue, ValueType};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{DynError, DynamicNetwork, NetworkBuilder, Result};

    pub use crate::{Interval, IntervalId, Window};

    pub use crate::{AttrValue, EntityId, EntityKind, IndexKind};

    pub use crate::{ChangeSet, Config, FrameUpdate};

    #[cfg(feature = "sync")]
    pub use crate::SyncNetwork;
}
