//! Naming strategies: default physical names for tables, columns and joins.
//!
//! A strategy is consulted only when a declaration carries no explicit name.
//! The strategy used by a resolution pass is baked into the resulting
//! metadata, so it must be chosen before a connection builds its graph.

mod default;

pub use default::DefaultNamingStrategy;

use std::fmt::Debug;

/// Maps entity and property names to physical names.
///
/// Every function must be deterministic and total for valid identifiers.
pub trait NamingStrategy: Debug + Send + Sync {
    /// Table name for an entity type.
    fn table_name(&self, class_name: &str, custom_name: Option<&str>) -> String;

    /// Column name for a property.
    fn column_name(&self, property_name: &str, custom_name: Option<&str>) -> String;

    /// Column name for a property of an embedded value.
    fn embedded_column_name(
        &self,
        prefix: &str,
        property_name: &str,
        custom_name: Option<&str>,
    ) -> String;

    /// Name of a relation.
    fn relation_name(&self, property_name: &str) -> String;

    /// Name of an index.
    fn index_name(&self, custom_name: Option<&str>, table_name: &str, columns: &[String]) -> String;

    /// Join column name for the owning side of a relation.
    fn join_column_name(&self, relation_name: &str, referenced_column_name: &str) -> String;

    /// Junction table name for a many-to-many relation.
    fn join_table_name(
        &self,
        first_table_name: &str,
        second_table_name: &str,
        first_property_name: &str,
        second_property_name: Option<&str>,
    ) -> String;

    /// Junction table column referencing `column_name` of `table_name`.
    fn join_key_column_name(&self, table_name: &str, column_name: &str) -> String;

    /// Primary key column of a class-table child referencing its parent row.
    fn class_table_inheritance_parent_column_name(
        &self,
        parent_table_name: &str,
        parent_table_id_property_name: &str,
    ) -> String;

    /// Junction table of a closure tree.
    fn closure_junction_table_name(&self, table_name: &str) -> String;

    /// Discriminator column synthesized for single-table hierarchies.
    fn discriminator_column_name(&self) -> String;
}
