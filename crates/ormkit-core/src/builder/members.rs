//! Indices, lifecycle listeners and relation-derived properties.

use super::{last_by_key, Resolution};
use crate::error::MetadataError;
use crate::metadata::{
    EntityListenerMetadata, EntityMetadata, IndexMetadata, RelationDerivedMetadata,
};

impl<'s> Resolution<'s> {
    pub(super) fn resolve_members(&mut self) -> Result<(), MetadataError> {
        let storage = self.storage;
        let naming = self.naming;

        for draft in &mut self.drafts {
            let meta = &draft.meta;
            if !meta.is_table_backed() {
                continue;
            }

            let mut indices = Vec::new();
            for args in last_by_key(storage.filter_indices(&draft.sources), |i| i.key()) {
                if args.columns.is_empty() {
                    return Err(MetadataError::invalid(meta.name(), "index covers no columns"));
                }
                let mut columns = Vec::with_capacity(args.columns.len());
                for property in &args.columns {
                    let column = meta
                        .find_column(property)
                        .or_else(|| meta.find_column_by_name(property))
                        .ok_or_else(|| {
                            MetadataError::invalid(
                                meta.name(),
                                format!("index references unknown property '{}'", property),
                            )
                        })?;
                    columns.push(column.database_name.clone());
                }
                let name = match &args.name {
                    Some(name) => name.clone(),
                    None => naming.index_name(None, &meta.table_name, &columns),
                };
                indices.push(IndexMetadata {
                    name,
                    columns,
                    is_unique: args.unique,
                });
            }

            let listeners = last_by_key(storage.filter_entity_listeners(&draft.sources), |l| {
                (l.method.clone(), l.kind)
            })
            .into_iter()
            .map(|l| EntityListenerMetadata {
                kind: l.kind,
                method: l.method.clone(),
            })
            .collect();

            let mut relation_ids = Vec::new();
            for args in last_by_key(storage.filter_relation_ids(&draft.sources), |r| {
                r.property_name.clone()
            }) {
                relation_ids.push(derived(meta, &args.property_name, &args.relation, false)?);
            }

            let mut relation_counts = Vec::new();
            for args in last_by_key(storage.filter_relation_counts(&draft.sources), |r| {
                r.property_name.clone()
            }) {
                relation_counts.push(derived(meta, &args.property_name, &args.relation, true)?);
            }

            draft.meta.indices.extend(indices);
            draft.meta.listeners = listeners;
            draft.meta.relation_ids = relation_ids;
            draft.meta.relation_counts = relation_counts;
        }
        Ok(())
    }
}

/// A property computed from one of the entity's relations.
fn derived(
    meta: &EntityMetadata,
    property: &str,
    relation: &str,
    counts: bool,
) -> Result<RelationDerivedMetadata, MetadataError> {
    let Some(relation_index) = meta
        .relations
        .iter()
        .position(|r| r.property_name == relation)
    else {
        return Err(MetadataError::invalid(
            meta.name(),
            format!("'{}' reads unknown relation '{}'", property, relation),
        ));
    };
    if counts && !meta.relations[relation_index].relation_type.is_to_many() {
        return Err(MetadataError::invalid(
            meta.name(),
            format!(
                "'{}' counts '{}', which is not a to-many relation",
                property, relation
            ),
        ));
    }
    Ok(RelationDerivedMetadata {
        property_name: property.to_string(),
        relation: relation.to_string(),
        relation_index,
    })
}
