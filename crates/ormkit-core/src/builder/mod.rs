//! The resolution pass: turns declaration records into an entity graph.
//!
//! Steps, in order:
//!
//! 1. collect the requested types and everything they reference
//! 2. gather columns along each type's lineage, flattening embedded values
//! 3. link table inheritance hierarchies
//! 4. resolve relation targets, bind inverse sides, build join columns
//!    and junction tables
//! 5. resolve indices, listeners, relation-derived properties and trees
//! 6. merge single-table children into their root table
//! 7. validate names and roles
//!
//! Any error aborts the pass; the graph is only returned when every step
//! succeeded for every entity.

mod collect;
mod columns;
mod inheritance;
mod members;
mod relations;
mod tree;
mod validate;

use crate::args::{
    InheritanceStrategy, JoinColumnArgs, JoinTableArgs, MetadataArgsStorage, TableArgs, TableKind,
};
use crate::error::MetadataError;
use crate::metadata::{
    ColumnMetadata, ColumnRole, EntityId, EntityMetadata, EntityMetadataGraph, TableStrategy,
};
use crate::naming::NamingStrategy;
use crate::target::EntityTarget;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;
use tracing::{debug, info};

/// Resolves declarations from a storage into an [`EntityMetadataGraph`].
pub struct MetadataBuilder<'s> {
    storage: &'s MetadataArgsStorage,
    naming: &'s dyn NamingStrategy,
    default_inheritance: Option<InheritanceStrategy>,
}

impl<'s> MetadataBuilder<'s> {
    /// Create a builder over a storage snapshot.
    pub fn new(storage: &'s MetadataArgsStorage, naming: &'s dyn NamingStrategy) -> Self {
        Self {
            storage,
            naming,
            default_inheritance: None,
        }
    }

    /// Strategy assumed for hierarchies whose root declares none.
    pub fn with_default_inheritance(mut self, strategy: Option<InheritanceStrategy>) -> Self {
        self.default_inheritance = strategy;
        self
    }

    /// Resolve the targets and everything they reference.
    pub fn build(&self, targets: &[EntityTarget]) -> Result<EntityMetadataGraph, MetadataError> {
        let tables = collect::collect(self.storage, targets)?;

        let mut resolution = Resolution::new(
            self.storage,
            self.naming,
            self.default_inheritance,
            &tables,
        )?;
        resolution.resolve_columns()?;
        resolution.resolve_inheritance()?;
        resolution.resolve_relations()?;
        resolution.resolve_members()?;
        resolution.resolve_trees()?;
        resolution.merge_single_tables()?;
        resolution.validate()?;

        let graph = resolution.finish();
        info!(
            requested = targets.len(),
            entities = graph.len(),
            "entity metadata resolved"
        );
        Ok(graph)
    }
}

/// Resolve `targets` with the given strategy and no inheritance default.
pub fn build(
    targets: &[EntityTarget],
    storage: &MetadataArgsStorage,
    naming: &dyn NamingStrategy,
) -> Result<EntityMetadataGraph, MetadataError> {
    MetadataBuilder::new(storage, naming).build(targets)
}

/// An entity under construction.
struct Draft<'s> {
    table: &'s TableArgs,
    /// Lineage members whose declarations this entity carries, root first.
    sources: Vec<EntityTarget>,
    join_columns: Vec<&'s JoinColumnArgs>,
    join_tables: Vec<&'s JoinTableArgs>,
    meta: EntityMetadata,
}

/// State of one resolution pass.
struct Resolution<'s> {
    storage: &'s MetadataArgsStorage,
    naming: &'s dyn NamingStrategy,
    default_inheritance: Option<InheritanceStrategy>,
    drafts: Vec<Draft<'s>>,
    ids: HashMap<EntityTarget, EntityId>,
}

impl<'s> Resolution<'s> {
    fn new(
        storage: &'s MetadataArgsStorage,
        naming: &'s dyn NamingStrategy,
        default_inheritance: Option<InheritanceStrategy>,
        tables: &[&'s TableArgs],
    ) -> Result<Self, MetadataError> {
        let mut drafts = Vec::new();
        let mut ids = HashMap::new();

        for &table in tables.iter().filter(|t| t.is_entity()) {
            let id = EntityId::new(drafts.len());
            let lineage = collect::lineage(storage, &table.target)?;
            let sources = collect::declaration_sources(storage, &lineage);
            let table_name = match &table.name {
                Some(name) => name.clone(),
                None => naming.table_name(table.target.name(), None),
            };
            let strategy = match table.kind {
                TableKind::Closure => TableStrategy::Closure,
                TableKind::Embeddable => TableStrategy::Embeddable,
                _ => TableStrategy::Regular,
            };

            ids.insert(table.target.clone(), id);
            drafts.push(Draft {
                table,
                sources,
                join_columns: Vec::new(),
                join_tables: Vec::new(),
                meta: EntityMetadata {
                    id,
                    target: table.target.clone(),
                    table_name,
                    strategy,
                    inheritance: None,
                    discriminator_value: None,
                    children: Vec::new(),
                    lineage,
                    columns: Vec::new(),
                    relations: Vec::new(),
                    indices: Vec::new(),
                    foreign_keys: Vec::new(),
                    embeddeds: Vec::new(),
                    listeners: Vec::new(),
                    relation_ids: Vec::new(),
                    relation_counts: Vec::new(),
                    closure_junction: None,
                    skip_sync: table.skip_sync,
                },
            });
        }

        Ok(Self {
            storage,
            naming,
            default_inheritance,
            drafts,
            ids,
        })
    }

    fn meta(&self, id: EntityId) -> &EntityMetadata {
        &self.drafts[id.index()].meta
    }

    fn finish(self) -> EntityMetadataGraph {
        let entities: Vec<EntityMetadata> = self.drafts.into_iter().map(|d| d.meta).collect();
        for entity in &entities {
            debug!(
                entity = %entity.target,
                table = %entity.table_name,
                columns = entity.columns.len(),
                relations = entity.relations.len(),
                "resolved entity"
            );
        }
        EntityMetadataGraph::new(entities)
    }
}

/// The single primary column of an entity.
fn primary_of(meta: &EntityMetadata) -> Result<&ColumnMetadata, MetadataError> {
    let mut primaries = meta.columns_with_role(ColumnRole::Primary);
    match (primaries.next(), primaries.next()) {
        (Some(primary), None) => Ok(primary),
        (Some(first), Some(second)) => Err(MetadataError::DuplicateRole {
            entity: meta.target.to_string(),
            role: ColumnRole::Primary,
            first: first.property_path.clone(),
            second: second.property_path.clone(),
        }),
        (None, _) => Err(MetadataError::MissingPrimaryKey {
            entity: meta.target.to_string(),
        }),
    }
}

/// Keep one item per key: the last one, in the slot of the first.
fn last_by_key<T, K>(items: Vec<&T>, key: impl Fn(&T) -> K) -> Vec<&T>
where
    K: Eq + Hash,
{
    let mut slots: HashMap<K, usize> = HashMap::new();
    let mut kept: Vec<&T> = Vec::new();
    for item in items {
        match slots.entry(key(item)) {
            Entry::Occupied(slot) => kept[*slot.get()] = item,
            Entry::Vacant(slot) => {
                slot.insert(kept.len());
                kept.push(item);
            }
        }
    }
    kept
}
