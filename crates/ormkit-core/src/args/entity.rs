//! Remaining per-entity declarations: lineage, inheritance, embedding,
//! listeners, subscribers and relation-derived properties.

use super::column::ColumnOptions;
use super::table::InheritanceStrategy;
use crate::naming::NamingStrategy;
use crate::target::EntityTarget;
use serde::Serialize;
use std::sync::Arc;

/// Declares that `target` extends `parent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendsArgs {
    /// Subtype.
    pub target: EntityTarget,
    /// Supertype.
    pub parent: EntityTarget,
}

impl ExtendsArgs {
    /// Declare a lineage edge.
    pub fn new(target: impl Into<EntityTarget>, parent: impl Into<EntityTarget>) -> Self {
        Self {
            target: target.into(),
            parent: parent.into(),
        }
    }
}

/// Declares the inheritance strategy of a hierarchy root.
#[derive(Debug, Clone, PartialEq)]
pub struct InheritanceArgs {
    /// Hierarchy root.
    pub target: EntityTarget,
    /// Strategy.
    pub strategy: InheritanceStrategy,
    /// Options for a synthesized discriminator column.
    pub discriminator: ColumnOptions,
}

impl InheritanceArgs {
    /// Declare single-table inheritance.
    pub fn single_table(target: impl Into<EntityTarget>) -> Self {
        Self {
            target: target.into(),
            strategy: InheritanceStrategy::SingleTable,
            discriminator: ColumnOptions::default(),
        }
    }

    /// Declare class-table inheritance.
    pub fn class_table(target: impl Into<EntityTarget>) -> Self {
        Self {
            target: target.into(),
            strategy: InheritanceStrategy::ClassTable,
            discriminator: ColumnOptions::default(),
        }
    }

    /// Options for the discriminator column synthesized when none is declared.
    pub fn with_discriminator(mut self, options: ColumnOptions) -> Self {
        self.discriminator = options;
        self
    }
}

/// Discriminator value of a type in a single-table hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscriminatorValueArgs {
    /// The type.
    pub target: EntityTarget,
    /// Stored tag.
    pub value: String,
}

impl DiscriminatorValueArgs {
    /// Declare a discriminator value.
    pub fn new(target: impl Into<EntityTarget>, value: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            value: value.into(),
        }
    }
}

/// Embeds an embeddable type into a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedArgs {
    /// Owning type.
    pub target: EntityTarget,
    /// Property holding the embedded value.
    pub property_name: String,
    /// Deferred key of the embeddable type.
    pub embedded_type: EntityTarget,
    /// Column prefix; defaults to the property name.
    pub prefix: Option<String>,
}

impl EmbeddedArgs {
    /// Declare an embedded property.
    pub fn new(
        target: impl Into<EntityTarget>,
        property_name: impl Into<String>,
        embedded_type: impl Into<EntityTarget>,
    ) -> Self {
        Self {
            target: target.into(),
            property_name: property_name.into(),
            embedded_type: embedded_type.into(),
            prefix: None,
        }
    }

    /// Set the column prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }
}

/// Lifecycle event an entity listener reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ListenerKind {
    /// After the entity is loaded.
    AfterLoad,
    /// Before insert.
    BeforeInsert,
    /// After insert.
    AfterInsert,
    /// Before update.
    BeforeUpdate,
    /// After update.
    AfterUpdate,
    /// Before remove.
    BeforeRemove,
    /// After remove.
    AfterRemove,
}

/// A lifecycle method on an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityListenerArgs {
    /// Declaring type.
    pub target: EntityTarget,
    /// Method name.
    pub method: String,
    /// Event.
    pub kind: ListenerKind,
}

impl EntityListenerArgs {
    /// Declare a listener.
    pub fn new(target: impl Into<EntityTarget>, method: impl Into<String>, kind: ListenerKind) -> Self {
        Self {
            target: target.into(),
            method: method.into(),
            kind,
        }
    }
}

/// Registers a type as an event subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySubscriberArgs {
    /// Subscriber type.
    pub target: EntityTarget,
}

impl EntitySubscriberArgs {
    /// Declare a subscriber.
    pub fn new(target: impl Into<EntityTarget>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

/// A property exposing the id(s) of a relation without loading it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationIdArgs {
    /// Declaring type.
    pub target: EntityTarget,
    /// Property receiving the id.
    pub property_name: String,
    /// Relation property it reads.
    pub relation: String,
}

impl RelationIdArgs {
    /// Declare a relation id property.
    pub fn new(
        target: impl Into<EntityTarget>,
        property_name: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Self {
            target: target.into(),
            property_name: property_name.into(),
            relation: relation.into(),
        }
    }
}

/// A property exposing the size of a to-many relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationCountArgs {
    /// Declaring type.
    pub target: EntityTarget,
    /// Property receiving the count.
    pub property_name: String,
    /// Relation property it counts.
    pub relation: String,
}

impl RelationCountArgs {
    /// Declare a relation count property.
    pub fn new(
        target: impl Into<EntityTarget>,
        property_name: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Self {
            target: target.into(),
            property_name: property_name.into(),
            relation: relation.into(),
        }
    }
}

/// A naming strategy registered under a name.
#[derive(Debug, Clone)]
pub struct NamingStrategyArgs {
    /// Registration name.
    pub name: String,
    /// The strategy.
    pub strategy: Arc<dyn NamingStrategy>,
}

impl NamingStrategyArgs {
    /// Register a strategy.
    pub fn new(name: impl Into<String>, strategy: Arc<dyn NamingStrategy>) -> Self {
        Self {
            name: name.into(),
            strategy,
        }
    }
}
