//! Collection of the types reachable from the requested targets.

use crate::args::{MetadataArgsStorage, TableArgs, TableKind};
use crate::error::MetadataError;
use crate::target::EntityTarget;
use std::collections::{HashSet, VecDeque};
use tracing::trace;

/// Collect table declarations for the targets and every type they
/// reach through lineage, relations, embedding and child tables.
///
/// Tables are returned in discovery order.
pub(super) fn collect<'s>(
    storage: &'s MetadataArgsStorage,
    targets: &[EntityTarget],
) -> Result<Vec<&'s TableArgs>, MetadataError> {
    let requested: HashSet<&EntityTarget> = targets.iter().collect();
    let mut queue: VecDeque<EntityTarget> = targets.iter().cloned().collect();
    let mut seen = HashSet::new();
    let mut tables = Vec::new();

    while let Some(target) = queue.pop_front() {
        if !seen.insert(target.clone()) {
            continue;
        }

        let Some(table) = storage.find_table(&target) else {
            // Plain supertypes contribute declarations without a table.
            if requested.contains(&target) {
                return Err(MetadataError::invalid(
                    target.name(),
                    "no table declaration is registered for this type",
                ));
            }
            continue;
        };
        trace!(entity = %target, "collected table declaration");
        tables.push(table);

        let chain = lineage(storage, &target)?;
        let sources = declaration_sources(storage, &chain);

        queue.extend(chain.iter().cloned());
        for relation in storage.filter_relations(&sources) {
            queue.push_back(relation.target_entity.clone());
        }
        for embedded in storage.filter_embeddeds(&sources) {
            queue.push_back(embedded.embedded_type.clone());
        }
        for child in storage.all_tables() {
            if child.kind.parent() == Some(&target) {
                queue.push_back(child.target.clone());
            }
        }
    }

    Ok(tables)
}

/// The lineage of a type, root first and ending with the type itself.
pub(super) fn lineage(
    storage: &MetadataArgsStorage,
    target: &EntityTarget,
) -> Result<Vec<EntityTarget>, MetadataError> {
    let mut chain = vec![target.clone()];
    let mut current = target.clone();

    while let Some(parent) = parent_of(storage, &current)? {
        if let Some(pos) = chain.iter().position(|t| *t == parent) {
            let mut path: Vec<String> = chain[pos..].iter().map(|t| t.to_string()).collect();
            path.push(parent.to_string());
            return Err(MetadataError::InheritanceCycle { path });
        }
        chain.push(parent.clone());
        current = parent;
    }

    chain.reverse();
    Ok(chain)
}

/// Direct supertype of a type.
///
/// An explicit lineage edge and a child table kind must agree when both
/// are present.
fn parent_of(
    storage: &MetadataArgsStorage,
    target: &EntityTarget,
) -> Result<Option<EntityTarget>, MetadataError> {
    let extends = storage.find_extends(target).map(|e| &e.parent);
    let table_parent = storage.find_table(target).and_then(|t| t.kind.parent());

    match (extends, table_parent) {
        (Some(extends), Some(table_parent)) if extends != table_parent => {
            Err(MetadataError::invalid(
                target.name(),
                format!(
                    "extends '{}' but its table is declared as a child of '{}'",
                    extends, table_parent
                ),
            ))
        }
        (Some(parent), _) | (None, Some(parent)) => Ok(Some(parent.clone())),
        (None, None) => Ok(None),
    }
}

/// Lineage members whose declarations a type carries, root first.
///
/// Walking up from the type, every supertype contributes until a
/// class-table link is crossed: a class-table child keeps its parent's
/// columns in the parent's table.
pub(super) fn declaration_sources(
    storage: &MetadataArgsStorage,
    chain: &[EntityTarget],
) -> Vec<EntityTarget> {
    let mut sources = Vec::new();
    for member in chain.iter().rev() {
        sources.push(member.clone());
        let class_child = matches!(
            storage.find_table(member).map(|t| &t.kind),
            Some(TableKind::ClassTableChild { .. })
        );
        if class_child {
            break;
        }
    }
    sources.reverse();
    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{ExtendsArgs, TableArgs};

    fn targets(names: &[&str]) -> Vec<EntityTarget> {
        names.iter().map(|n| EntityTarget::from(*n)).collect()
    }

    #[test]
    fn test_lineage_is_root_first() {
        let mut storage = MetadataArgsStorage::new();
        storage.add(TableArgs::abstract_table("Base"));
        storage.add(TableArgs::new("Post"));
        storage.add(ExtendsArgs::new("Post", "Content"));
        storage.add(ExtendsArgs::new("Content", "Base"));

        let chain = lineage(&storage, &"Post".into()).unwrap();
        assert_eq!(chain, targets(&["Base", "Content", "Post"]));
    }

    #[test]
    fn test_lineage_cycle_reports_path() {
        let mut storage = MetadataArgsStorage::new();
        storage.add(ExtendsArgs::new("A", "B"));
        storage.add(ExtendsArgs::new("B", "A"));

        let err = lineage(&storage, &"A".into()).unwrap_err();
        assert_eq!(
            err,
            MetadataError::InheritanceCycle {
                path: vec!["A".into(), "B".into(), "A".into()],
            }
        );
    }

    #[test]
    fn test_conflicting_parents_rejected() {
        let mut storage = MetadataArgsStorage::new();
        storage.add(TableArgs::single_table_child("Post", "Content"));
        storage.add(ExtendsArgs::new("Post", "Other"));

        let err = lineage(&storage, &"Post".into()).unwrap_err();
        assert!(matches!(err, MetadataError::InvalidDeclaration { .. }));
    }

    #[test]
    fn test_sources_stop_at_class_table_link() {
        let mut storage = MetadataArgsStorage::new();
        storage.add(TableArgs::abstract_table("Base"));
        storage.add(TableArgs::new("Content"));
        storage.add(ExtendsArgs::new("Content", "Base"));
        storage.add(TableArgs::class_table_child("Photo", "Content"));

        let chain = lineage(&storage, &"Photo".into()).unwrap();
        assert_eq!(chain, targets(&["Base", "Content", "Photo"]));
        assert_eq!(declaration_sources(&storage, &chain), targets(&["Photo"]));

        let chain = lineage(&storage, &"Content".into()).unwrap();
        assert_eq!(
            declaration_sources(&storage, &chain),
            targets(&["Base", "Content"])
        );
    }

    #[test]
    fn test_collect_follows_relations_and_children() {
        use crate::args::RelationArgs;

        let mut storage = MetadataArgsStorage::new();
        storage.add(TableArgs::new("Post"));
        storage.add(RelationArgs::many_to_one("Post", "author", "User"));
        storage.add(TableArgs::new("User"));
        storage.add(TableArgs::single_table_child("Admin", "User"));
        storage.add(TableArgs::new("Unrelated"));

        let tables = collect(&storage, &targets(&["Post"])).unwrap();
        let names: Vec<&str> = tables.iter().map(|t| t.target.name()).collect();
        assert_eq!(names, vec!["Post", "User", "Admin"]);
    }

    #[test]
    fn test_collect_requires_table_for_requested_target() {
        let storage = MetadataArgsStorage::new();
        let err = collect(&storage, &targets(&["Ghost"])).unwrap_err();
        assert!(matches!(err, MetadataError::InvalidDeclaration { .. }));
    }
}
