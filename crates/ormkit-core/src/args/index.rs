//! Index declarations.

use crate::target::EntityTarget;

/// An index declaration.
///
/// A property-level index covers its own property; a table-level index
/// lists the properties it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexArgs {
    /// Declaring type.
    pub target: EntityTarget,
    /// Explicit index name.
    pub name: Option<String>,
    /// Covered properties (embedded columns as `embedded.property`).
    pub columns: Vec<String>,
    /// Unique index.
    pub unique: bool,
}

impl IndexArgs {
    /// Index a single property.
    pub fn on_property(target: impl Into<EntityTarget>, property: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            name: None,
            columns: vec![property.into()],
            unique: false,
        }
    }

    /// Index several properties together.
    pub fn composite(
        target: impl Into<EntityTarget>,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            target: target.into(),
            name: None,
            columns: columns.into_iter().map(Into::into).collect(),
            unique: false,
        }
    }

    /// Set an explicit name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Make the index unique.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Identity used for last-write-wins: the name if given, else the columns.
    pub(crate) fn key(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.columns.join(","),
        }
    }
}
