//! Table-level declarations.

use crate::target::EntityTarget;
use serde::Serialize;

/// How a declared type maps onto tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableKind {
    /// An ordinary table.
    Regular,
    /// A mapped superclass: contributes declarations to subtypes, owns no table.
    Abstract,
    /// A tree stored with a closure junction table.
    Closure,
    /// A value type flattened into the tables of its owners.
    Embeddable,
    /// Stored in the table of its parent, tagged by a discriminator.
    SingleTableChild {
        /// The parent type.
        parent: EntityTarget,
    },
    /// Stored in its own table, joined to the parent's row by primary key.
    ClassTableChild {
        /// The parent type.
        parent: EntityTarget,
    },
}

impl TableKind {
    /// Parent type for child kinds.
    pub fn parent(&self) -> Option<&EntityTarget> {
        match self {
            TableKind::SingleTableChild { parent } | TableKind::ClassTableChild { parent } => {
                Some(parent)
            }
            _ => None,
        }
    }

    /// Inheritance strategy implied by a child kind.
    pub fn child_strategy(&self) -> Option<InheritanceStrategy> {
        match self {
            TableKind::SingleTableChild { .. } => Some(InheritanceStrategy::SingleTable),
            TableKind::ClassTableChild { .. } => Some(InheritanceStrategy::ClassTable),
            _ => None,
        }
    }
}

/// Table inheritance strategy declared on a hierarchy root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum InheritanceStrategy {
    /// Whole hierarchy in one table.
    SingleTable,
    /// One table per type, linked by primary key.
    ClassTable,
}

/// A table declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct TableArgs {
    /// Declared type.
    pub target: EntityTarget,
    /// Explicit table name.
    pub name: Option<String>,
    /// Table strategy.
    pub kind: TableKind,
    /// Exclude the table from schema synchronization.
    pub skip_sync: bool,
}

impl TableArgs {
    fn with_kind(target: impl Into<EntityTarget>, kind: TableKind) -> Self {
        Self {
            target: target.into(),
            name: None,
            kind,
            skip_sync: false,
        }
    }

    /// Declare a regular table.
    pub fn new(target: impl Into<EntityTarget>) -> Self {
        Self::with_kind(target, TableKind::Regular)
    }

    /// Declare a mapped superclass.
    pub fn abstract_table(target: impl Into<EntityTarget>) -> Self {
        Self::with_kind(target, TableKind::Abstract)
    }

    /// Declare a closure table.
    pub fn closure(target: impl Into<EntityTarget>) -> Self {
        Self::with_kind(target, TableKind::Closure)
    }

    /// Declare an embeddable type.
    pub fn embeddable(target: impl Into<EntityTarget>) -> Self {
        Self::with_kind(target, TableKind::Embeddable)
    }

    /// Declare a single-table inheritance child.
    pub fn single_table_child(
        target: impl Into<EntityTarget>,
        parent: impl Into<EntityTarget>,
    ) -> Self {
        Self::with_kind(
            target,
            TableKind::SingleTableChild {
                parent: parent.into(),
            },
        )
    }

    /// Declare a class-table inheritance child.
    pub fn class_table_child(
        target: impl Into<EntityTarget>,
        parent: impl Into<EntityTarget>,
    ) -> Self {
        Self::with_kind(
            target,
            TableKind::ClassTableChild {
                parent: parent.into(),
            },
        )
    }

    /// Set an explicit table name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Exclude from schema synchronization.
    pub fn skip_sync(mut self) -> Self {
        self.skip_sync = true;
        self
    }

    /// Whether this declaration produces an entity of its own.
    pub fn is_entity(&self) -> bool {
        !matches!(self.kind, TableKind::Abstract)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_builder() {
        let table = TableArgs::new("User").with_name("users").skip_sync();

        assert_eq!(table.target.name(), "User");
        assert_eq!(table.name.as_deref(), Some("users"));
        assert_eq!(table.kind, TableKind::Regular);
        assert!(table.skip_sync);
    }

    #[test]
    fn test_child_kinds() {
        let single = TableArgs::single_table_child("Photo", "Content");
        assert_eq!(single.kind.parent().map(|p| p.name()), Some("Content"));
        assert_eq!(
            single.kind.child_strategy(),
            Some(InheritanceStrategy::SingleTable)
        );

        let class = TableArgs::class_table_child("Question", "Content");
        assert_eq!(
            class.kind.child_strategy(),
            Some(InheritanceStrategy::ClassTable)
        );

        assert!(TableArgs::new("User").kind.parent().is_none());
        assert!(!TableArgs::abstract_table("Base").is_entity());
    }
}
