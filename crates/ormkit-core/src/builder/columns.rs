//! Column gathering and embedded value flattening.

use super::{collect, last_by_key, Resolution};
use crate::args::{ColumnArgs, EmbeddedArgs, MetadataArgsStorage, TableKind};
use crate::error::MetadataError;
use crate::metadata::{ColumnMetadata, ColumnOrigin, EmbeddedMetadata};
use crate::naming::NamingStrategy;
use crate::target::EntityTarget;

/// Where an embedded value sits inside its owner.
struct EmbedPath<'a> {
    prefix: &'a str,
    path: &'a str,
}

impl<'s> Resolution<'s> {
    /// Gather the columns each entity carries, flattening embedded values.
    pub(super) fn resolve_columns(&mut self) -> Result<(), MetadataError> {
        let storage = self.storage;
        let naming = self.naming;

        for draft in &mut self.drafts {
            let owner = draft.meta.target.clone();
            let mut columns: Vec<ColumnMetadata> = declared_columns(storage, &draft.sources)
                .into_iter()
                .map(|args| column_from_args(naming, args, None))
                .collect();

            let mut visiting = vec![owner.clone()];
            let mut embeddeds = Vec::new();
            for args in declared_embeddeds(storage, &draft.sources) {
                embeddeds.push(embed(
                    storage,
                    naming,
                    &owner,
                    args,
                    None,
                    &mut columns,
                    &mut visiting,
                )?);
            }

            draft.meta.columns = columns;
            draft.meta.embeddeds = embeddeds;
        }
        Ok(())
    }
}

/// Column declarations of the sources, one per property.
fn declared_columns<'s>(
    storage: &'s MetadataArgsStorage,
    sources: &[EntityTarget],
) -> Vec<&'s ColumnArgs> {
    last_by_key(storage.filter_columns(sources), |c| c.property_name.clone())
}

fn declared_embeddeds<'s>(
    storage: &'s MetadataArgsStorage,
    sources: &[EntityTarget],
) -> Vec<&'s EmbeddedArgs> {
    last_by_key(storage.filter_embeddeds(sources), |e| e.property_name.clone())
}

fn column_from_args(
    naming: &dyn NamingStrategy,
    args: &ColumnArgs,
    embedded: Option<&EmbedPath<'_>>,
) -> ColumnMetadata {
    let custom = args.options.name.as_deref();
    let (database_name, property_path) = match embedded {
        // Explicit names are used verbatim.
        None => (
            custom
                .map(str::to_string)
                .unwrap_or_else(|| naming.column_name(&args.property_name, None)),
            args.property_name.clone(),
        ),
        // Embedded explicit names keep the prefix.
        Some(at) => (
            naming.embedded_column_name(at.prefix, &args.property_name, custom),
            format!("{}.{}", at.path, args.property_name),
        ),
    };

    let options = &args.options;
    let mut column = ColumnMetadata::new(
        args.property_name.as_str(),
        database_name,
        args.column_type,
        ColumnOrigin::Declared {
            target: args.target.clone(),
        },
    );
    column.property_path = property_path;
    column.mode = args.mode;
    column.is_primary = options.primary;
    column.generation = options.generated;
    column.is_nullable = options.nullable;
    column.is_unique = options.unique;
    column.length = options.length;
    column.precision = options.precision;
    column.scale = options.scale;
    column.default = options.default.clone();
    column.comment = options.comment.clone();
    column
}

/// Flatten one embedded property into `columns`.
fn embed(
    storage: &MetadataArgsStorage,
    naming: &dyn NamingStrategy,
    owner: &EntityTarget,
    args: &EmbeddedArgs,
    outer: Option<&EmbedPath<'_>>,
    columns: &mut Vec<ColumnMetadata>,
    visiting: &mut Vec<EntityTarget>,
) -> Result<EmbeddedMetadata, MetadataError> {
    let embedded_type = &args.embedded_type;
    let table = storage.find_table(embedded_type).ok_or_else(|| {
        MetadataError::unresolved(owner.name(), &args.property_name, embedded_type.name())
    })?;
    if table.kind != TableKind::Embeddable {
        return Err(MetadataError::invalid(
            owner.name(),
            format!(
                "property '{}' embeds '{}', which is not embeddable",
                args.property_name, embedded_type
            ),
        ));
    }
    if visiting.contains(embedded_type) {
        return Err(MetadataError::invalid(
            owner.name(),
            format!(
                "property '{}' embeds '{}' within itself",
                args.property_name, embedded_type
            ),
        ));
    }

    let own_prefix = args.prefix.as_deref().unwrap_or(&args.property_name);
    let (prefix, path) = match outer {
        Some(outer) => (
            format!("{}_{}", outer.prefix, own_prefix),
            format!("{}.{}", outer.path, args.property_name),
        ),
        None => (own_prefix.to_string(), args.property_name.clone()),
    };
    let at = EmbedPath {
        prefix: &prefix,
        path: &path,
    };

    let chain = collect::lineage(storage, embedded_type)?;
    let sources = collect::declaration_sources(storage, &chain);

    let mut indices = Vec::new();
    for column_args in declared_columns(storage, &sources) {
        indices.push(columns.len());
        columns.push(column_from_args(naming, column_args, Some(&at)));
    }

    visiting.push(embedded_type.clone());
    let mut nested = Vec::new();
    for nested_args in declared_embeddeds(storage, &sources) {
        nested.push(embed(
            storage,
            naming,
            owner,
            nested_args,
            Some(&at),
            columns,
            visiting,
        )?);
    }
    visiting.pop();

    Ok(EmbeddedMetadata {
        property_name: args.property_name.clone(),
        target: embedded_type.clone(),
        prefix: prefix.clone(),
        columns: indices,
        embeddeds: nested,
    })
}
