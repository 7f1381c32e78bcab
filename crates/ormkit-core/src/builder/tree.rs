//! Closure trees.

use super::{primary_of, Resolution};
use crate::args::TableKind;
use crate::error::MetadataError;
use crate::metadata::{ClosureJunctionMetadata, EntityId};

const ANCESTOR_COLUMN: &str = "ancestor";
const DESCENDANT_COLUMN: &str = "descendant";
const LEVEL_COLUMN: &str = "level";

impl<'s> Resolution<'s> {
    /// Check tree declarations and describe closure junction tables.
    pub(super) fn resolve_trees(&mut self) -> Result<(), MetadataError> {
        for idx in 0..self.drafts.len() {
            let draft = &self.drafts[idx];
            let meta = &draft.meta;
            let is_closure = draft.table.kind == TableKind::Closure;

            for relation in meta.relations.iter().filter(|r| r.tree_role.is_some()) {
                if !is_closure {
                    return Err(MetadataError::invalid(
                        meta.name(),
                        format!(
                            "tree relation '{}' requires a closure table",
                            relation.property_name
                        ),
                    ));
                }
                if relation.target != EntityId::new(idx) {
                    return Err(MetadataError::invalid(
                        meta.name(),
                        format!(
                            "tree relation '{}' must target the entity itself",
                            relation.property_name
                        ),
                    ));
                }
            }

            let has_level = meta.tree_level_column().is_some();
            if !is_closure {
                if has_level {
                    return Err(MetadataError::invalid(
                        meta.name(),
                        "tree level column requires a closure table",
                    ));
                }
                continue;
            }

            let junction = ClosureJunctionMetadata {
                table_name: self.naming.closure_junction_table_name(&meta.table_name),
                ancestor_column: ANCESTOR_COLUMN.to_string(),
                descendant_column: DESCENDANT_COLUMN.to_string(),
                level_column: has_level.then(|| LEVEL_COLUMN.to_string()),
                referenced_column: primary_of(meta)?.database_name.clone(),
            };
            self.drafts[idx].meta.closure_junction = Some(junction);
        }
        Ok(())
    }
}
