use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable 64-bit identifier of a graph, node, or edge.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(value: u64) -> Self {
        EntityId(value)
    }
}

/// Class of network entity an attribute belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Graph,
    Node,
    Edge,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Graph, EntityKind::Node, EntityKind::Edge];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Graph => "graph",
            EntityKind::Node => "node",
            EntityKind::Edge => "edge",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one attribute record: a column of one entity.
///
/// Equality, hashing, and ordering are structural over `(column, entity)`.
///
/// # Examples
///
/// ```
/// use dynnet_types::key::{AttributeKey, EntityId};
///
/// let a = AttributeKey::new("color", EntityId(1));
/// let b = AttributeKey::new("color", EntityId(1));
/// assert_eq!(a, b);
/// assert_eq!(a.to_string(), "color@1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttributeKey {
    pub column: String,
    pub entity: EntityId,
}

impl AttributeKey {
    pub fn new(column: impl Into<String>, entity: EntityId) -> Self {
        Self {
            column: column.into(),
            entity,
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.column, self.entity)
    }
}
