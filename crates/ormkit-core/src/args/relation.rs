//! Relation declarations and their physical overrides.

use crate::target::EntityTarget;
use serde::Serialize;

/// Multiplicity of a relation, seen from the declaring side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RelationType {
    /// One-to-one.
    OneToOne,
    /// One-to-many; the other side holds the join column.
    OneToMany,
    /// Many-to-one; this side holds the join column.
    ManyToOne,
    /// Many-to-many through a junction table.
    ManyToMany,
}

impl RelationType {
    /// The multiplicity the inverse side must declare.
    pub fn inverse(self) -> RelationType {
        match self {
            RelationType::OneToOne => RelationType::OneToOne,
            RelationType::OneToMany => RelationType::ManyToOne,
            RelationType::ManyToOne => RelationType::OneToMany,
            RelationType::ManyToMany => RelationType::ManyToMany,
        }
    }

    /// Check if the relation loads a collection.
    pub fn is_to_many(self) -> bool {
        matches!(self, RelationType::OneToMany | RelationType::ManyToMany)
    }
}

impl std::fmt::Display for RelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RelationType::OneToOne => "one-to-one",
            RelationType::OneToMany => "one-to-many",
            RelationType::ManyToOne => "many-to-one",
            RelationType::ManyToMany => "many-to-many",
        };
        f.write_str(name)
    }
}

/// Behavior when a referenced row is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OnDelete {
    /// Delete referencing rows.
    Cascade,
    /// Prevent the delete.
    Restrict,
    /// Set the join column to NULL.
    SetNull,
    /// Leave it to the database.
    NoAction,
}

/// Role of a relation in a closure tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TreeRole {
    /// Points at the parent node.
    Parent,
    /// Collects the child nodes.
    Children,
}

/// Relation options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationOptions {
    /// Insert related objects together with the owner.
    pub cascade_insert: bool,
    /// Update related objects together with the owner.
    pub cascade_update: bool,
    /// Remove related objects together with the owner.
    pub cascade_remove: bool,
    /// Whether the join column allows NULL.
    pub nullable: bool,
    /// Referential action on delete.
    pub on_delete: Option<OnDelete>,
    /// Load the relation on first access.
    pub lazy: bool,
    /// Load the relation together with the owner.
    pub eager: bool,
}

impl Default for RelationOptions {
    fn default() -> Self {
        Self {
            cascade_insert: false,
            cascade_update: false,
            cascade_remove: false,
            nullable: true,
            on_delete: None,
            lazy: false,
            eager: false,
        }
    }
}

/// A relation declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationArgs {
    /// Declaring type.
    pub target: EntityTarget,
    /// Property name.
    pub property_name: String,
    /// Multiplicity.
    pub relation_type: RelationType,
    /// Deferred key of the related type.
    pub target_entity: EntityTarget,
    /// Property on the related type that holds the other side.
    pub inverse_side: Option<String>,
    /// Options.
    pub options: RelationOptions,
    /// Role in a closure tree.
    pub tree_role: Option<TreeRole>,
}

impl RelationArgs {
    /// Declare a relation.
    pub fn new(
        target: impl Into<EntityTarget>,
        property_name: impl Into<String>,
        relation_type: RelationType,
        target_entity: impl Into<EntityTarget>,
    ) -> Self {
        Self {
            target: target.into(),
            property_name: property_name.into(),
            relation_type,
            target_entity: target_entity.into(),
            inverse_side: None,
            options: RelationOptions::default(),
            tree_role: None,
        }
    }

    /// Declare a one-to-one relation.
    pub fn one_to_one(
        target: impl Into<EntityTarget>,
        property_name: impl Into<String>,
        target_entity: impl Into<EntityTarget>,
    ) -> Self {
        Self::new(target, property_name, RelationType::OneToOne, target_entity)
    }

    /// Declare a one-to-many relation.
    pub fn one_to_many(
        target: impl Into<EntityTarget>,
        property_name: impl Into<String>,
        target_entity: impl Into<EntityTarget>,
    ) -> Self {
        Self::new(target, property_name, RelationType::OneToMany, target_entity)
    }

    /// Declare a many-to-one relation.
    pub fn many_to_one(
        target: impl Into<EntityTarget>,
        property_name: impl Into<String>,
        target_entity: impl Into<EntityTarget>,
    ) -> Self {
        Self::new(target, property_name, RelationType::ManyToOne, target_entity)
    }

    /// Declare a many-to-many relation.
    pub fn many_to_many(
        target: impl Into<EntityTarget>,
        property_name: impl Into<String>,
        target_entity: impl Into<EntityTarget>,
    ) -> Self {
        Self::new(target, property_name, RelationType::ManyToMany, target_entity)
    }

    /// Declare the parent link of a closure tree node.
    pub fn tree_parent(target: impl Into<EntityTarget>, property_name: impl Into<String>) -> Self {
        let target = target.into();
        let mut relation = Self::many_to_one(target.clone(), property_name, target);
        relation.tree_role = Some(TreeRole::Parent);
        relation
    }

    /// Declare the children of a closure tree node.
    pub fn tree_children(
        target: impl Into<EntityTarget>,
        property_name: impl Into<String>,
        parent_property: impl Into<String>,
    ) -> Self {
        let target = target.into();
        let mut relation =
            Self::one_to_many(target.clone(), property_name, target).with_inverse(parent_property);
        relation.tree_role = Some(TreeRole::Children);
        relation
    }

    /// Name the property holding the other side.
    pub fn with_inverse(mut self, property: impl Into<String>) -> Self {
        self.inverse_side = Some(property.into());
        self
    }

    /// Replace all options.
    pub fn with_options(mut self, options: RelationOptions) -> Self {
        self.options = options;
        self
    }

    /// Cascade insert, update and remove.
    pub fn cascade_all(mut self) -> Self {
        self.options.cascade_insert = true;
        self.options.cascade_update = true;
        self.options.cascade_remove = true;
        self
    }

    /// Disallow NULL in the join column.
    pub fn not_null(mut self) -> Self {
        self.options.nullable = false;
        self
    }

    /// Set the referential action on delete.
    pub fn on_delete(mut self, on_delete: OnDelete) -> Self {
        self.options.on_delete = Some(on_delete);
        self
    }

    /// Load together with the owner.
    pub fn eager(mut self) -> Self {
        self.options.eager = true;
        self
    }

    /// Load on first access.
    pub fn lazy(mut self) -> Self {
        self.options.lazy = true;
        self
    }
}

/// Join column override for the owning side of a relation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JoinColumnOptions {
    /// Explicit column name.
    pub name: Option<String>,
    /// Property of the referenced column on the related type.
    pub referenced_column_name: Option<String>,
}

/// Marks a one-to-one or many-to-one relation as owning a join column.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinColumnArgs {
    /// Declaring type.
    pub target: EntityTarget,
    /// Relation property.
    pub property_name: String,
    /// Naming overrides.
    pub options: JoinColumnOptions,
}

impl JoinColumnArgs {
    /// Declare a join column with default naming.
    pub fn new(target: impl Into<EntityTarget>, property_name: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            property_name: property_name.into(),
            options: JoinColumnOptions::default(),
        }
    }

    /// Set an explicit column name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.options.name = Some(name.into());
        self
    }

    /// Reference a column other than the primary key.
    pub fn referencing(mut self, property: impl Into<String>) -> Self {
        self.options.referenced_column_name = Some(property.into());
        self
    }
}

/// Marks a many-to-many relation as owning the junction table.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinTableArgs {
    /// Declaring type.
    pub target: EntityTarget,
    /// Relation property.
    pub property_name: String,
    /// Explicit junction table name.
    pub name: Option<String>,
    /// Junction column pointing at the owner.
    pub join_column: Option<JoinColumnOptions>,
    /// Junction column pointing at the related type.
    pub inverse_join_column: Option<JoinColumnOptions>,
}

impl JoinTableArgs {
    /// Declare a junction table with default naming.
    pub fn new(target: impl Into<EntityTarget>, property_name: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            property_name: property_name.into(),
            name: None,
            join_column: None,
            inverse_join_column: None,
        }
    }

    /// Set an explicit table name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Override the owner-side junction column.
    pub fn with_join_column(mut self, options: JoinColumnOptions) -> Self {
        self.join_column = Some(options);
        self
    }

    /// Override the related-side junction column.
    pub fn with_inverse_join_column(mut self, options: JoinColumnOptions) -> Self {
        self.inverse_join_column = Some(options);
        self
    }
}
