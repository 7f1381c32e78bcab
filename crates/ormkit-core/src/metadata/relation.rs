//! Resolved relation metadata.

use super::EntityId;
use crate::args::{RelationOptions, RelationType, TreeRole};
use crate::target::EntityTarget;
use serde::Serialize;

/// Points at one relation of one entity in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RelationRef {
    /// Entity holding the relation.
    pub entity: EntityId,
    /// Position in that entity's relation list.
    pub relation: usize,
}

/// Column of a junction table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JunctionColumn {
    /// Column name in the junction table.
    pub name: String,
    /// Referenced table.
    pub referenced_table: String,
    /// Referenced column.
    pub referenced_column: String,
}

/// Junction table of an owning many-to-many relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JunctionMetadata {
    /// Table name.
    pub table_name: String,
    /// Column referencing the owner.
    pub owner_column: JunctionColumn,
    /// Column referencing the related entity.
    pub inverse_column: JunctionColumn,
}

/// A resolved relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationMetadata {
    /// Property name.
    pub property_name: String,
    /// Relation name from the naming strategy.
    pub name: String,
    /// Multiplicity.
    pub relation_type: RelationType,
    /// Related entity.
    pub target: EntityId,
    /// Related type key, as declared.
    pub target_entity: EntityTarget,
    /// The other side, when bidirectional.
    pub inverse: Option<RelationRef>,
    /// Inverse property, as declared.
    pub inverse_side: Option<String>,
    /// Whether this side holds the join column or junction table.
    pub is_owning: bool,
    /// Join column on this entity's table.
    pub join_column: Option<String>,
    /// Column of the related table the join column references.
    pub referenced_column: Option<String>,
    /// Junction table for owning many-to-many relations.
    pub junction: Option<JunctionMetadata>,
    /// Options.
    pub options: RelationOptions,
    /// Role in a closure tree.
    pub tree_role: Option<TreeRole>,
    /// Type that declared the relation.
    pub declared_by: EntityTarget,
}

impl RelationMetadata {
    /// Check if this relation is one-to-one.
    pub fn is_one_to_one(&self) -> bool {
        self.relation_type == RelationType::OneToOne
    }

    /// Check if this relation is one-to-many.
    pub fn is_one_to_many(&self) -> bool {
        self.relation_type == RelationType::OneToMany
    }

    /// Check if this relation is many-to-one.
    pub fn is_many_to_one(&self) -> bool {
        self.relation_type == RelationType::ManyToOne
    }

    /// Check if this relation is many-to-many.
    pub fn is_many_to_many(&self) -> bool {
        self.relation_type == RelationType::ManyToMany
    }

    /// Check if the other side is known.
    pub fn is_bidirectional(&self) -> bool {
        self.inverse.is_some()
    }
}
