//! Final checks over the resolved entities.

use super::Resolution;
use crate::args::{ColumnMode, Generation};
use crate::error::MetadataError;
use crate::metadata::{ColumnRole, EntityMetadata};
use std::collections::HashMap;

impl<'s> Resolution<'s> {
    /// Check per-entity names and roles, then table names across the graph.
    pub(super) fn validate(&self) -> Result<(), MetadataError> {
        for draft in &self.drafts {
            validate_entity(&draft.meta)?;
        }

        let mut tables = TableNames::default();
        for draft in &self.drafts {
            let meta = &draft.meta;
            if meta.owns_table() {
                tables.claim(&meta.table_name, meta.name().to_string())?;
            }
            for relation in &meta.relations {
                if let Some(junction) = &relation.junction {
                    tables.claim(
                        &junction.table_name,
                        format!("{}.{}", meta.target, relation.property_name),
                    )?;
                }
            }
            if let Some(closure) = &meta.closure_junction {
                tables.claim(&closure.table_name, format!("closure of {}", meta.target))?;
            }
        }
        Ok(())
    }
}

fn validate_entity(meta: &EntityMetadata) -> Result<(), MetadataError> {
    let scope = if meta.is_table_backed() {
        format!("columns of table '{}'", meta.table_name)
    } else {
        format!("columns of embeddable '{}'", meta.target)
    };
    let mut names: HashMap<&str, &str> = HashMap::new();
    for column in &meta.columns {
        if let Some(first) = names.insert(&column.database_name, &column.property_path) {
            return Err(MetadataError::collision(
                scope,
                column.database_name.as_str(),
                first,
                column.property_path.as_str(),
            ));
        }
    }

    for role in ColumnRole::ALL {
        let mut holders = meta.columns_with_role(role);
        if let (Some(first), Some(second)) = (holders.next(), holders.next()) {
            return Err(MetadataError::DuplicateRole {
                entity: meta.target.to_string(),
                role,
                first: first.property_path.clone(),
                second: second.property_path.clone(),
            });
        }
    }
    for column in &meta.columns {
        let counter = match column.mode {
            ColumnMode::Version => Some("version"),
            ColumnMode::TreeLevel => Some("tree level"),
            _ if column.generation == Some(Generation::Increment) => Some("auto-increment"),
            _ => None,
        };
        if let Some(kind) = counter.filter(|_| !column.column_type.is_numeric()) {
            return Err(MetadataError::invalid(
                meta.name(),
                format!(
                    "{} column '{}' must have a numeric type, not {:?}",
                    kind, column.property_path, column.column_type
                ),
            ));
        }
    }
    if meta.is_table_backed() && meta.primary_column().is_none() {
        return Err(MetadataError::MissingPrimaryKey {
            entity: meta.target.to_string(),
        });
    }

    let mut indices: HashMap<&str, usize> = HashMap::new();
    for (pos, index) in meta.indices.iter().enumerate() {
        if let Some(first) = indices.insert(&index.name, pos) {
            return Err(MetadataError::collision(
                format!("indices of table '{}'", meta.table_name),
                index.name.as_str(),
                meta.indices[first].columns.join(","),
                index.columns.join(","),
            ));
        }
    }
    Ok(())
}

/// Table names claimed so far, with the claimant of each.
#[derive(Default)]
struct TableNames {
    claimed: HashMap<String, String>,
}

impl TableNames {
    fn claim(&mut self, name: &str, claimant: String) -> Result<(), MetadataError> {
        match self.claimed.get(name) {
            Some(first) => Err(MetadataError::collision(
                "tables",
                name,
                first.as_str(),
                claimant,
            )),
            None => {
                self.claimed.insert(name.to_string(), claimant);
                Ok(())
            }
        }
    }
}
