//! Resolved entity metadata.

use super::{ColumnMetadata, ColumnRole, EntityId, RelationMetadata};
use crate::args::{InheritanceStrategy, ListenerKind, OnDelete};
use crate::target::EntityTarget;
use serde::Serialize;

/// How the entity is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TableStrategy {
    /// Its own table. Single-table hierarchy roots are regular too and
    /// carry [`InheritanceMetadata`].
    Regular,
    /// Its own table plus a closure junction table.
    Closure,
    /// Rows live in the hierarchy root's table.
    SingleTableChild {
        /// Direct parent.
        parent: EntityId,
    },
    /// Its own table, keyed by the parent's primary key.
    ClassTableChild {
        /// Direct parent.
        parent: EntityId,
        /// Primary key column referencing the parent row.
        parent_column: String,
    },
    /// No table; columns are flattened into owners.
    Embeddable,
}

/// Inheritance information on a hierarchy root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InheritanceMetadata {
    /// Strategy.
    pub strategy: InheritanceStrategy,
    /// Discriminator column name, for single-table hierarchies.
    pub discriminator_column: Option<String>,
}

/// A resolved index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexMetadata {
    /// Index name.
    pub name: String,
    /// Column names.
    pub columns: Vec<String>,
    /// Unique index.
    pub is_unique: bool,
}

/// A foreign key held by the entity's table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyMetadata {
    /// Referencing columns.
    pub columns: Vec<String>,
    /// Referenced entity.
    pub referenced_entity: EntityId,
    /// Referenced table.
    pub referenced_table: String,
    /// Referenced columns.
    pub referenced_columns: Vec<String>,
    /// Referential action on delete.
    pub on_delete: Option<OnDelete>,
}

/// An embedded value, with its columns located in the owner's column list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbeddedMetadata {
    /// Property holding the value.
    pub property_name: String,
    /// Embeddable type.
    pub target: EntityTarget,
    /// Prefix applied to column names.
    pub prefix: String,
    /// Positions of its columns in the owner's `columns`.
    pub columns: Vec<usize>,
    /// Nested embedded values.
    pub embeddeds: Vec<EmbeddedMetadata>,
}

/// A lifecycle method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityListenerMetadata {
    /// Event.
    pub kind: ListenerKind,
    /// Method name.
    pub method: String,
}

/// A property derived from a relation (id or count).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationDerivedMetadata {
    /// Property receiving the value.
    pub property_name: String,
    /// Relation property.
    pub relation: String,
    /// Position in the entity's relation list.
    pub relation_index: usize,
}

/// Junction table of a closure tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClosureJunctionMetadata {
    /// Table name.
    pub table_name: String,
    /// Ancestor column.
    pub ancestor_column: String,
    /// Descendant column.
    pub descendant_column: String,
    /// Depth column, when the tree declares a level column.
    pub level_column: Option<String>,
    /// Primary key column both reference.
    pub referenced_column: String,
}

/// Full structural metadata of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityMetadata {
    /// Position in the graph.
    pub id: EntityId,
    /// Entity type.
    pub target: EntityTarget,
    /// Table name. Single-table children share the root's table.
    pub table_name: String,
    /// Storage strategy.
    pub strategy: TableStrategy,
    /// Set on hierarchy roots.
    pub inheritance: Option<InheritanceMetadata>,
    /// Subtype tag, for members of single-table hierarchies.
    pub discriminator_value: Option<String>,
    /// Direct children in a table hierarchy.
    pub children: Vec<EntityId>,
    /// Type lineage, root first, ending with this type.
    pub lineage: Vec<EntityTarget>,
    /// Columns in declaration order.
    pub columns: Vec<ColumnMetadata>,
    /// Relations in declaration order.
    pub relations: Vec<RelationMetadata>,
    /// Indices.
    pub indices: Vec<IndexMetadata>,
    /// Foreign keys.
    pub foreign_keys: Vec<ForeignKeyMetadata>,
    /// Embedded values.
    pub embeddeds: Vec<EmbeddedMetadata>,
    /// Lifecycle methods.
    pub listeners: Vec<EntityListenerMetadata>,
    /// Relation id properties.
    pub relation_ids: Vec<RelationDerivedMetadata>,
    /// Relation count properties.
    pub relation_counts: Vec<RelationDerivedMetadata>,
    /// Closure junction table.
    pub closure_junction: Option<ClosureJunctionMetadata>,
    /// Excluded from schema synchronization.
    pub skip_sync: bool,
}

impl EntityMetadata {
    /// Entity name.
    pub fn name(&self) -> &str {
        self.target.name()
    }

    /// Direct parent in a table hierarchy.
    pub fn parent(&self) -> Option<EntityId> {
        match &self.strategy {
            TableStrategy::SingleTableChild { parent }
            | TableStrategy::ClassTableChild { parent, .. } => Some(*parent),
            _ => None,
        }
    }

    /// Check if the entity stores rows in a table of its own.
    pub fn owns_table(&self) -> bool {
        matches!(
            self.strategy,
            TableStrategy::Regular | TableStrategy::Closure | TableStrategy::ClassTableChild { .. }
        )
    }

    /// Check if the entity is backed by a table (its own or a shared one).
    pub fn is_table_backed(&self) -> bool {
        !matches!(self.strategy, TableStrategy::Embeddable)
    }

    /// Get a column by property path.
    pub fn find_column(&self, property_path: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|c| c.property_path == property_path)
    }

    /// Get a column by database name.
    pub fn find_column_by_name(&self, database_name: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|c| c.database_name == database_name)
    }

    /// Columns holding a role.
    pub fn columns_with_role(&self, role: ColumnRole) -> impl Iterator<Item = &ColumnMetadata> {
        self.columns.iter().filter(move |c| c.has_role(role))
    }

    /// The primary column.
    pub fn primary_column(&self) -> Option<&ColumnMetadata> {
        self.columns_with_role(ColumnRole::Primary).next()
    }

    /// The version column.
    pub fn version_column(&self) -> Option<&ColumnMetadata> {
        self.columns_with_role(ColumnRole::Version).next()
    }

    /// The creation timestamp column.
    pub fn create_date_column(&self) -> Option<&ColumnMetadata> {
        self.columns_with_role(ColumnRole::CreateDate).next()
    }

    /// The update timestamp column.
    pub fn update_date_column(&self) -> Option<&ColumnMetadata> {
        self.columns_with_role(ColumnRole::UpdateDate).next()
    }

    /// The discriminator column.
    pub fn discriminator_column(&self) -> Option<&ColumnMetadata> {
        self.columns_with_role(ColumnRole::Discriminator).next()
    }

    /// The tree level column.
    pub fn tree_level_column(&self) -> Option<&ColumnMetadata> {
        self.columns_with_role(ColumnRole::TreeLevel).next()
    }

    /// Get a relation by property name.
    pub fn find_relation(&self, property_name: &str) -> Option<&RelationMetadata> {
        self.relations
            .iter()
            .find(|r| r.property_name == property_name)
    }

    /// Relations that hold a join column on this table.
    pub fn owning_relations(&self) -> impl Iterator<Item = &RelationMetadata> {
        self.relations.iter().filter(|r| r.is_owning)
    }

    /// Listener methods for an event.
    pub fn listeners_for(&self, kind: ListenerKind) -> impl Iterator<Item = &str> {
        self.listeners
            .iter()
            .filter(move |l| l.kind == kind)
            .map(|l| l.method.as_str())
    }

    /// Check if the type extends (or is) `target`.
    pub fn is_a(&self, target: &EntityTarget) -> bool {
        self.lineage.contains(target)
    }
}
