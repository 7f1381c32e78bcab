//! Resolved column metadata.

use crate::args::{ColumnMode, ColumnType, Generation};
use crate::target::EntityTarget;
use serde::Serialize;
use std::fmt;

/// Singleton roles: at most one column per entity may hold each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ColumnRole {
    /// Primary key.
    Primary,
    /// Row version.
    Version,
    /// Creation timestamp.
    CreateDate,
    /// Update timestamp.
    UpdateDate,
    /// Subtype tag.
    Discriminator,
    /// Tree depth.
    TreeLevel,
}

impl ColumnRole {
    /// All singleton roles, in validation order.
    pub const ALL: [ColumnRole; 6] = [
        ColumnRole::Primary,
        ColumnRole::Version,
        ColumnRole::CreateDate,
        ColumnRole::UpdateDate,
        ColumnRole::Discriminator,
        ColumnRole::TreeLevel,
    ];
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnRole::Primary => "primary",
            ColumnRole::Version => "version",
            ColumnRole::CreateDate => "create-date",
            ColumnRole::UpdateDate => "update-date",
            ColumnRole::Discriminator => "discriminator",
            ColumnRole::TreeLevel => "tree-level",
        };
        f.write_str(name)
    }
}

/// Where a column came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ColumnOrigin {
    /// Declared on a type (the entity, an ancestor or an embeddable).
    Declared {
        /// Declaring type.
        target: EntityTarget,
    },
    /// Join column of an owning relation.
    JoinColumn {
        /// Relation property.
        relation: String,
    },
    /// Primary key of a class-table child pointing at its parent row.
    ParentKey,
    /// Discriminator added because the hierarchy declared none.
    SynthesizedDiscriminator,
}

/// A resolved column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMetadata {
    /// Property name on the declaring type.
    pub property_name: String,
    /// Dotted path from the entity (`address.city` for embedded columns).
    pub property_path: String,
    /// Final column name.
    pub database_name: String,
    /// Type hint.
    pub column_type: ColumnType,
    /// Column mode.
    pub mode: ColumnMode,
    /// Part of the primary key.
    pub is_primary: bool,
    /// Value generation.
    pub generation: Option<Generation>,
    /// Whether NULL is allowed.
    pub is_nullable: bool,
    /// Whether values must be unique.
    pub is_unique: bool,
    /// Length.
    pub length: Option<u32>,
    /// Precision.
    pub precision: Option<u32>,
    /// Scale.
    pub scale: Option<u32>,
    /// Default value expression.
    pub default: Option<String>,
    /// Comment.
    pub comment: Option<String>,
    /// Provenance.
    pub origin: ColumnOrigin,
}

impl ColumnMetadata {
    /// Create a column with default attributes.
    pub fn new(
        property_name: impl Into<String>,
        database_name: impl Into<String>,
        column_type: ColumnType,
        origin: ColumnOrigin,
    ) -> Self {
        let property_name = property_name.into();
        Self {
            property_path: property_name.clone(),
            property_name,
            database_name: database_name.into(),
            column_type,
            mode: ColumnMode::Regular,
            is_primary: false,
            generation: None,
            is_nullable: false,
            is_unique: false,
            length: None,
            precision: None,
            scale: None,
            default: None,
            comment: None,
            origin,
        }
    }

    /// Check whether the column holds a role.
    pub fn has_role(&self, role: ColumnRole) -> bool {
        match role {
            ColumnRole::Primary => self.is_primary,
            ColumnRole::Version => self.mode == ColumnMode::Version,
            ColumnRole::CreateDate => self.mode == ColumnMode::CreateDate,
            ColumnRole::UpdateDate => self.mode == ColumnMode::UpdateDate,
            ColumnRole::Discriminator => self.mode == ColumnMode::Discriminator,
            ColumnRole::TreeLevel => self.mode == ColumnMode::TreeLevel,
        }
    }

    /// Check if the column belongs to an embedded value.
    pub fn is_embedded(&self) -> bool {
        self.property_path.contains('.')
    }

    /// Check if the column is stored.
    pub fn is_persisted(&self) -> bool {
        self.mode != ColumnMode::Virtual
    }
}
