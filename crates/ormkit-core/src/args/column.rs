//! Column declarations.

use crate::target::EntityTarget;
use serde::Serialize;

/// Column type hint handed to the driver's schema generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ColumnType {
    /// 32-bit integer.
    Int,
    /// 64-bit integer.
    BigInt,
    /// 16-bit integer.
    SmallInt,
    /// Single-precision float.
    Float,
    /// Double-precision float.
    Double,
    /// Fixed-precision decimal.
    Decimal,
    /// Bounded string.
    String,
    /// Unbounded text.
    Text,
    /// Boolean.
    Boolean,
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
    /// Date and time.
    DateTime,
    /// JSON document.
    Json,
    /// Array stored as delimited text.
    SimpleArray,
    /// UUID.
    Uuid,
}

impl ColumnType {
    /// Check if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ColumnType::Int
                | ColumnType::BigInt
                | ColumnType::SmallInt
                | ColumnType::Float
                | ColumnType::Double
                | ColumnType::Decimal
        )
    }
}

/// Special behavior of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ColumnMode {
    /// Plain persisted value.
    Regular,
    /// Set when the row is inserted.
    CreateDate,
    /// Set whenever the row is updated.
    UpdateDate,
    /// Incremented on every update.
    Version,
    /// Holds the concrete subtype tag in single-table inheritance.
    Discriminator,
    /// Depth of a node in a closure tree.
    TreeLevel,
    /// Computed, not stored.
    Virtual,
}

/// Value generation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Generation {
    /// Auto-increment.
    Increment,
    /// Generated UUID.
    Uuid,
}

/// Column options.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnOptions {
    /// Explicit column name.
    pub name: Option<String>,
    /// Length for string types.
    pub length: Option<u32>,
    /// Precision for decimal types.
    pub precision: Option<u32>,
    /// Scale for decimal types.
    pub scale: Option<u32>,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Whether values must be unique.
    pub unique: bool,
    /// Default value expression.
    pub default: Option<String>,
    /// Column comment.
    pub comment: Option<String>,
    /// Part of the primary key.
    pub primary: bool,
    /// Value generation.
    pub generated: Option<Generation>,
}

/// A column declaration on one property.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnArgs {
    /// Declaring type.
    pub target: EntityTarget,
    /// Property name.
    pub property_name: String,
    /// Type hint.
    pub column_type: ColumnType,
    /// Column mode.
    pub mode: ColumnMode,
    /// Options.
    pub options: ColumnOptions,
}

impl ColumnArgs {
    /// Declare a regular column.
    pub fn new(
        target: impl Into<EntityTarget>,
        property_name: impl Into<String>,
        column_type: ColumnType,
    ) -> Self {
        Self {
            target: target.into(),
            property_name: property_name.into(),
            column_type,
            mode: ColumnMode::Regular,
            options: ColumnOptions::default(),
        }
    }

    /// Declare a primary column.
    pub fn primary(
        target: impl Into<EntityTarget>,
        property_name: impl Into<String>,
        column_type: ColumnType,
    ) -> Self {
        let mut column = Self::new(target, property_name, column_type);
        column.options.primary = true;
        column
    }

    /// Declare an auto-incremented integer primary column.
    pub fn primary_generated(
        target: impl Into<EntityTarget>,
        property_name: impl Into<String>,
    ) -> Self {
        Self::primary(target, property_name, ColumnType::Int).with_generation(Generation::Increment)
    }

    fn with_mode(
        target: impl Into<EntityTarget>,
        property_name: impl Into<String>,
        column_type: ColumnType,
        mode: ColumnMode,
    ) -> Self {
        let mut column = Self::new(target, property_name, column_type);
        column.mode = mode;
        column
    }

    /// Declare a creation timestamp column.
    pub fn create_date(target: impl Into<EntityTarget>, property_name: impl Into<String>) -> Self {
        Self::with_mode(target, property_name, ColumnType::DateTime, ColumnMode::CreateDate)
    }

    /// Declare an update timestamp column.
    pub fn update_date(target: impl Into<EntityTarget>, property_name: impl Into<String>) -> Self {
        Self::with_mode(target, property_name, ColumnType::DateTime, ColumnMode::UpdateDate)
    }

    /// Declare a row version column.
    pub fn version(target: impl Into<EntityTarget>, property_name: impl Into<String>) -> Self {
        Self::with_mode(target, property_name, ColumnType::Int, ColumnMode::Version)
    }

    /// Declare the discriminator column of a single-table hierarchy.
    pub fn discriminator(target: impl Into<EntityTarget>, property_name: impl Into<String>) -> Self {
        Self::with_mode(target, property_name, ColumnType::String, ColumnMode::Discriminator)
    }

    /// Declare the level column of a closure tree.
    pub fn tree_level(target: impl Into<EntityTarget>, property_name: impl Into<String>) -> Self {
        Self::with_mode(target, property_name, ColumnType::Int, ColumnMode::TreeLevel)
    }

    /// Declare a computed column that is never stored.
    pub fn virtual_column(
        target: impl Into<EntityTarget>,
        property_name: impl Into<String>,
        column_type: ColumnType,
    ) -> Self {
        Self::with_mode(target, property_name, column_type, ColumnMode::Virtual)
    }

    /// Set an explicit column name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.options.name = Some(name.into());
        self
    }

    /// Allow NULL.
    pub fn nullable(mut self) -> Self {
        self.options.nullable = true;
        self
    }

    /// Require unique values.
    pub fn unique(mut self) -> Self {
        self.options.unique = true;
        self
    }

    /// Set the length.
    pub fn with_length(mut self, length: u32) -> Self {
        self.options.length = Some(length);
        self
    }

    /// Set precision and scale.
    pub fn with_precision(mut self, precision: u32, scale: u32) -> Self {
        self.options.precision = Some(precision);
        self.options.scale = Some(scale);
        self
    }

    /// Set the default value expression.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.options.default = Some(default.into());
        self
    }

    /// Set the column comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.options.comment = Some(comment.into());
        self
    }

    /// Set value generation.
    pub fn with_generation(mut self, generation: Generation) -> Self {
        self.options.generated = Some(generation);
        self
    }

    /// Replace all options.
    pub fn with_options(mut self, options: ColumnOptions) -> Self {
        self.options = options;
        self
    }
}
