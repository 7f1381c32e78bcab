//! Resolved metadata: the entity graph consumed by schema and query code.

mod column;
mod entity;
mod graph;
mod relation;

pub use column::{ColumnMetadata, ColumnOrigin, ColumnRole};
pub use entity::{
    ClosureJunctionMetadata, EmbeddedMetadata, EntityListenerMetadata, EntityMetadata,
    ForeignKeyMetadata, IndexMetadata, InheritanceMetadata, RelationDerivedMetadata,
    TableStrategy,
};
pub use graph::EntityMetadataGraph;
pub use relation::{JunctionColumn, JunctionMetadata, RelationMetadata, RelationRef};

use serde::Serialize;

/// Position of an entity within its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityId(usize);

impl EntityId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Index into the graph's entity list.
    pub fn index(self) -> usize {
        self.0
    }
}
