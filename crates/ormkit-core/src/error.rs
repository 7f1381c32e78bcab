//! Metadata resolution errors.

use crate::metadata::ColumnRole;
use thiserror::Error;

/// Errors raised while resolving declarations into an entity graph.
///
/// Any of these aborts the whole resolution pass; no partial graph is
/// ever returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    /// A deferred relation or embedded target could not be matched to a
    /// registered entity.
    #[error("'{entity}.{property}' references '{target}', which is not a registered entity")]
    UnresolvedReference {
        /// Entity declaring the reference.
        entity: String,
        /// Property holding the reference.
        property: String,
        /// The unresolved target (or `Target.inverseProperty`).
        target: String,
    },

    /// Two columns, tables or other named items resolved to the same name.
    #[error("{scope}: name '{name}' is claimed by both '{first}' and '{second}'")]
    NamingCollision {
        /// Where the names must be unique.
        scope: String,
        /// The colliding name.
        name: String,
        /// First claimant.
        first: String,
        /// Second claimant.
        second: String,
    },

    /// A table-backed entity has no primary column.
    #[error("entity '{entity}' has no primary column")]
    MissingPrimaryKey {
        /// The entity.
        entity: String,
    },

    /// More than one column claims a singleton role.
    #[error("entity '{entity}' has more than one {role} column: '{first}' and '{second}'")]
    DuplicateRole {
        /// The entity.
        entity: String,
        /// The role claimed twice.
        role: ColumnRole,
        /// First column holding the role.
        first: String,
        /// Second column holding the role.
        second: String,
    },

    /// Table inheritance links form a cycle.
    #[error("inheritance cycle: {}", .path.join(" -> "))]
    InheritanceCycle {
        /// Types on the cycle, starting and ending with the same type.
        path: Vec<String>,
    },

    /// Two sides of a bidirectional relation do not agree.
    #[error("relation '{entity}.{property}' cannot pair with '{inverse_entity}.{inverse_property}': {reason}")]
    RelationMismatch {
        /// Entity declaring the relation.
        entity: String,
        /// Relation property.
        property: String,
        /// Entity holding the inverse side.
        inverse_entity: String,
        /// Inverse property.
        inverse_property: String,
        /// What disagrees.
        reason: String,
    },

    /// A declaration is structurally invalid for its entity.
    #[error("invalid declaration on '{entity}': {reason}")]
    InvalidDeclaration {
        /// The entity.
        entity: String,
        /// What is wrong.
        reason: String,
    },

    /// The entity is not part of the resolved graph.
    #[error("entity '{0}' is not registered in this metadata graph")]
    NotFound(String),
}

impl MetadataError {
    /// Create an invalid declaration error.
    pub fn invalid(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        MetadataError::InvalidDeclaration {
            entity: entity.into(),
            reason: reason.into(),
        }
    }

    /// Create an unresolved reference error.
    pub fn unresolved(
        entity: impl Into<String>,
        property: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        MetadataError::UnresolvedReference {
            entity: entity.into(),
            property: property.into(),
            target: target.into(),
        }
    }

    /// Create a naming collision error.
    pub fn collision(
        scope: impl Into<String>,
        name: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        MetadataError::NamingCollision {
            scope: scope.into(),
            name: name.into(),
            first: first.into(),
            second: second.into(),
        }
    }
}
