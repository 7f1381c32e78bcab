//! The default naming convention.

use super::NamingStrategy;
use inflector::Inflector;

/// Length of the hash part of generated index names.
const INDEX_HASH_LEN: usize = 26;

/// Snake-cases table names and keeps property names as column names.
///
/// | Name                | Rule                                              |
/// |---------------------|---------------------------------------------------|
/// | table               | `snake_case(class)`                               |
/// | column              | property name                                     |
/// | embedded column     | `camelCase(prefix_property)`                      |
/// | join column         | `camelCase(relation_referenced)`                  |
/// | junction table      | `snake_case(first_property_second)`               |
/// | junction column     | `camelCase(table_column)`                         |
/// | class-table parent  | `camelCase(parentTable_parentId)`                 |
/// | closure junction    | `table_closure`                                   |
/// | index               | `ind_` + BLAKE3 of `table_columns`, truncated     |
///
/// An explicit column name inside an embedded value replaces the property
/// name but keeps the embedding prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNamingStrategy;

impl DefaultNamingStrategy {
    /// Create the default strategy.
    pub fn new() -> Self {
        Self
    }
}

impl NamingStrategy for DefaultNamingStrategy {
    fn table_name(&self, class_name: &str, custom_name: Option<&str>) -> String {
        match custom_name {
            Some(name) => name.to_string(),
            None => class_name.to_snake_case(),
        }
    }

    fn column_name(&self, property_name: &str, custom_name: Option<&str>) -> String {
        custom_name.unwrap_or(property_name).to_string()
    }

    fn embedded_column_name(
        &self,
        prefix: &str,
        property_name: &str,
        custom_name: Option<&str>,
    ) -> String {
        format!("{}_{}", prefix, custom_name.unwrap_or(property_name)).to_camel_case()
    }

    fn relation_name(&self, property_name: &str) -> String {
        property_name.to_string()
    }

    fn index_name(&self, custom_name: Option<&str>, table_name: &str, columns: &[String]) -> String {
        if let Some(name) = custom_name {
            return name.to_string();
        }
        let key = format!("{}_{}", table_name, columns.join("_"));
        let hash = hex::encode(blake3::hash(key.as_bytes()).as_bytes());
        format!("ind_{}", &hash[..INDEX_HASH_LEN])
    }

    fn join_column_name(&self, relation_name: &str, referenced_column_name: &str) -> String {
        format!("{}_{}", relation_name, referenced_column_name).to_camel_case()
    }

    fn join_table_name(
        &self,
        first_table_name: &str,
        second_table_name: &str,
        first_property_name: &str,
        _second_property_name: Option<&str>,
    ) -> String {
        format!(
            "{}_{}_{}",
            first_table_name,
            first_property_name.replace('.', "_"),
            second_table_name
        )
        .to_snake_case()
    }

    fn join_key_column_name(&self, table_name: &str, column_name: &str) -> String {
        format!("{}_{}", table_name, column_name).to_camel_case()
    }

    fn class_table_inheritance_parent_column_name(
        &self,
        parent_table_name: &str,
        parent_table_id_property_name: &str,
    ) -> String {
        format!("{}_{}", parent_table_name, parent_table_id_property_name).to_camel_case()
    }

    fn closure_junction_table_name(&self, table_name: &str) -> String {
        format!("{}_closure", table_name)
    }

    fn discriminator_column_name(&self) -> String {
        "type".to_string()
    }
}
