//! The resolved entity graph.

use super::{EntityId, EntityMetadata, RelationMetadata, RelationRef};
use crate::error::MetadataError;
use crate::target::EntityTarget;
use serde::Serialize;
use std::collections::BTreeMap;

/// All resolved entities of one resolution pass, cross-linked by [`EntityId`].
///
/// A graph is immutable once built and owned by exactly one connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityMetadataGraph {
    entities: Vec<EntityMetadata>,
    #[serde(skip)]
    by_target: BTreeMap<EntityTarget, EntityId>,
}

impl EntityMetadataGraph {
    pub(crate) fn new(entities: Vec<EntityMetadata>) -> Self {
        let by_target = entities
            .iter()
            .map(|e| (e.target.clone(), e.id))
            .collect();
        Self {
            entities,
            by_target,
        }
    }

    /// Get the metadata of an entity type.
    pub fn get(&self, target: impl AsRef<str>) -> Result<&EntityMetadata, MetadataError> {
        let target = target.as_ref();
        self.find(target)
            .ok_or_else(|| MetadataError::NotFound(target.to_string()))
    }

    /// Get the metadata of an entity type, if registered.
    pub fn find(&self, target: &str) -> Option<&EntityMetadata> {
        self.by_target.get(target).map(|id| &self.entities[id.index()])
    }

    /// Check if an entity type is registered.
    pub fn has(&self, target: &str) -> bool {
        self.by_target.contains_key(target)
    }

    /// Get an entity by id.
    ///
    /// Ids are only meaningful for the graph that issued them.
    pub fn entity(&self, id: EntityId) -> &EntityMetadata {
        &self.entities[id.index()]
    }

    /// Get a relation by reference.
    pub fn relation(&self, relation: RelationRef) -> &RelationMetadata {
        &self.entity(relation.entity).relations[relation.relation]
    }

    /// The related entity of a relation.
    pub fn relation_target(&self, relation: &RelationMetadata) -> &EntityMetadata {
        self.entity(relation.target)
    }

    /// The other side of a bidirectional relation.
    pub fn inverse_of(&self, relation: &RelationMetadata) -> Option<&RelationMetadata> {
        relation.inverse.map(|r| self.relation(r))
    }

    /// Direct parent in a table hierarchy.
    pub fn parent_of(&self, entity: &EntityMetadata) -> Option<&EntityMetadata> {
        entity.parent().map(|id| self.entity(id))
    }

    /// Direct children in a table hierarchy.
    pub fn children_of<'a>(
        &'a self,
        entity: &'a EntityMetadata,
    ) -> impl Iterator<Item = &'a EntityMetadata> + 'a {
        entity.children.iter().map(move |id| self.entity(*id))
    }

    /// All entities in resolution order.
    pub fn iter(&self) -> impl Iterator<Item = &EntityMetadata> {
        self.entities.iter()
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Names of all tables owned by entities, junctions and closure trees.
    pub fn table_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for entity in &self.entities {
            if entity.owns_table() {
                names.push(entity.table_name.as_str());
            }
            for relation in &entity.relations {
                if let Some(junction) = &relation.junction {
                    names.push(junction.table_name.as_str());
                }
            }
            if let Some(closure) = &entity.closure_junction {
                names.push(closure.table_name.as_str());
            }
        }
        names
    }
}
