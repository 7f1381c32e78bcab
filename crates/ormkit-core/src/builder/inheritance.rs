//! Table inheritance: child links, discriminators and single-table merges.

use super::{primary_of, Resolution};
use crate::args::{ColumnMode, ColumnType, InheritanceArgs, InheritanceStrategy, OnDelete};
use crate::error::MetadataError;
use crate::metadata::{
    ColumnMetadata, ColumnOrigin, EntityId, ForeignKeyMetadata, InheritanceMetadata,
    TableStrategy,
};
use crate::target::EntityTarget;
use std::collections::VecDeque;
use tracing::debug;

fn strategy_name(strategy: InheritanceStrategy) -> &'static str {
    match strategy {
        InheritanceStrategy::SingleTable => "single-table",
        InheritanceStrategy::ClassTable => "class-table",
    }
}

impl<'s> Resolution<'s> {
    /// Link every child table to its parent, parents first.
    pub(super) fn resolve_inheritance(&mut self) -> Result<(), MetadataError> {
        let mut order: Vec<usize> = (0..self.drafts.len()).collect();
        order.sort_by_key(|&idx| self.hierarchy_depth(idx));

        for idx in order {
            let table = self.drafts[idx].table;
            let (Some(parent_target), Some(strategy)) =
                (table.kind.parent(), table.kind.child_strategy())
            else {
                continue;
            };
            let child = self.drafts[idx].meta.target.clone();

            let parent = match self.ids.get(parent_target) {
                Some(&id) if self.meta(id).is_table_backed() => id,
                _ => {
                    return Err(MetadataError::invalid(
                        child.name(),
                        format!("parent '{}' is not a table-backed entity", parent_target),
                    ))
                }
            };

            let root = self.hierarchy_root(idx);
            let root_target = self.drafts[root].meta.target.clone();
            match self.root_strategy(&root_target) {
                None => {
                    return Err(MetadataError::invalid(
                        child.name(),
                        format!(
                            "hierarchy root '{}' declares no inheritance strategy",
                            root_target
                        ),
                    ))
                }
                Some(declared) if declared != strategy => {
                    return Err(MetadataError::invalid(
                        child.name(),
                        format!(
                            "declared as a {} child but '{}' uses {} inheritance",
                            strategy_name(strategy),
                            root_target,
                            strategy_name(declared)
                        ),
                    ))
                }
                Some(_) => {}
            }

            match strategy {
                InheritanceStrategy::SingleTable => self.link_single_table(idx, parent, root),
                InheritanceStrategy::ClassTable => self.link_class_table(idx, parent)?,
            }
            self.drafts[parent.index()]
                .meta
                .children
                .push(EntityId::new(idx));

            debug!(
                entity = %child,
                parent = %self.meta(parent).target,
                strategy = strategy_name(strategy),
                "linked child table"
            );
        }

        self.finish_hierarchy_roots()
    }

    /// Copy columns and indices of single-table descendants into the root.
    ///
    /// Merged columns become nullable: rows of other subtypes leave them
    /// empty.
    pub(super) fn merge_single_tables(&mut self) -> Result<(), MetadataError> {
        for root in 0..self.drafts.len() {
            let is_single_table_root = matches!(
                self.drafts[root].meta.inheritance,
                Some(InheritanceMetadata {
                    strategy: InheritanceStrategy::SingleTable,
                    ..
                })
            );
            if !is_single_table_root {
                continue;
            }

            for member in self.descendants(root).into_iter().skip(1) {
                let source = &self.drafts[member].meta;
                let member_target = source.target.clone();
                let columns = source.columns.clone();
                let indices = source.indices.clone();
                let foreign_keys = source.foreign_keys.clone();

                for mut column in columns {
                    let root_meta = &self.drafts[root].meta;
                    if let Some(existing) = root_meta.find_column_by_name(&column.database_name) {
                        if existing.property_path == column.property_path
                            && existing.column_type == column.column_type
                        {
                            continue;
                        }
                        return Err(MetadataError::collision(
                            format!("columns of table '{}'", root_meta.table_name),
                            column.database_name.as_str(),
                            existing.property_path.as_str(),
                            format!("{}.{}", member_target, column.property_path),
                        ));
                    }
                    column.is_nullable = true;
                    self.drafts[root].meta.columns.push(column);
                }

                let root_meta = &mut self.drafts[root].meta;
                for index in indices {
                    if !root_meta.indices.contains(&index) {
                        root_meta.indices.push(index);
                    }
                }
                for foreign_key in foreign_keys {
                    if !root_meta.foreign_keys.contains(&foreign_key) {
                        root_meta.foreign_keys.push(foreign_key);
                    }
                }
            }
        }
        Ok(())
    }

    fn root_strategy(&self, root: &EntityTarget) -> Option<InheritanceStrategy> {
        self.storage
            .find_inheritance(root)
            .map(|args| args.strategy)
            .or(self.default_inheritance)
    }

    /// Resolved parent of a draft, following child table kinds.
    fn table_parent(&self, idx: usize) -> Option<usize> {
        self.drafts[idx]
            .table
            .kind
            .parent()
            .and_then(|parent| self.ids.get(parent))
            .map(|id| id.index())
    }

    fn hierarchy_depth(&self, idx: usize) -> usize {
        let mut depth = 0;
        let mut current = idx;
        while let Some(parent) = self.table_parent(current) {
            depth += 1;
            current = parent;
        }
        depth
    }

    fn hierarchy_root(&self, idx: usize) -> usize {
        let mut current = idx;
        while let Some(parent) = self.table_parent(current) {
            current = parent;
        }
        current
    }

    /// The entity and all its linked descendants, breadth first.
    fn descendants(&self, idx: usize) -> Vec<usize> {
        let mut members = Vec::new();
        let mut queue = VecDeque::from([idx]);
        while let Some(member) = queue.pop_front() {
            members.push(member);
            queue.extend(self.drafts[member].meta.children.iter().map(|c| c.index()));
        }
        members
    }

    fn link_single_table(&mut self, idx: usize, parent: EntityId, root: usize) {
        let table_name = self.drafts[root].meta.table_name.clone();
        let meta = &mut self.drafts[idx].meta;
        meta.table_name = table_name;
        meta.strategy = TableStrategy::SingleTableChild { parent };
    }

    fn link_class_table(&mut self, idx: usize, parent: EntityId) -> Result<(), MetadataError> {
        let parent_meta = self.meta(parent);
        let parent_key = primary_of(parent_meta)?;
        let name = self
            .naming
            .class_table_inheritance_parent_column_name(&parent_meta.table_name, &parent_key.property_name);

        let mut column = ColumnMetadata::new(
            name.as_str(),
            name.as_str(),
            parent_key.column_type,
            ColumnOrigin::ParentKey,
        );
        column.is_primary = true;
        column.length = parent_key.length;

        let foreign_key = ForeignKeyMetadata {
            columns: vec![name.clone()],
            referenced_entity: parent,
            referenced_table: parent_meta.table_name.clone(),
            referenced_columns: vec![parent_key.database_name.clone()],
            on_delete: Some(OnDelete::Cascade),
        };

        let meta = &mut self.drafts[idx].meta;
        meta.columns.push(column);
        meta.foreign_keys.push(foreign_key);
        meta.strategy = TableStrategy::ClassTableChild {
            parent,
            parent_column: name,
        };
        Ok(())
    }

    /// Record inheritance on hierarchy roots and assign discriminators.
    fn finish_hierarchy_roots(&mut self) -> Result<(), MetadataError> {
        let storage = self.storage;
        for root in 0..self.drafts.len() {
            if self.drafts[root].table.kind.parent().is_some() {
                continue;
            }
            let target = self.drafts[root].meta.target.clone();
            let declared = storage.find_inheritance(&target);
            let strategy = match declared {
                Some(args) => args.strategy,
                None if !self.drafts[root].meta.children.is_empty() => {
                    match self.default_inheritance {
                        Some(strategy) => strategy,
                        None => continue,
                    }
                }
                None => continue,
            };

            match strategy {
                InheritanceStrategy::ClassTable => {
                    self.drafts[root].meta.inheritance = Some(InheritanceMetadata {
                        strategy,
                        discriminator_column: None,
                    });
                }
                InheritanceStrategy::SingleTable => self.finish_single_table(root, declared)?,
            }
        }
        Ok(())
    }

    fn finish_single_table(
        &mut self,
        root: usize,
        declared: Option<&InheritanceArgs>,
    ) -> Result<(), MetadataError> {
        let members = self.descendants(root);
        let root_target = self.drafts[root].meta.target.clone();

        let declared_column = self.drafts[root]
            .meta
            .discriminator_column()
            .map(|column| column.database_name.clone());
        let discriminator = match declared_column {
            Some(name) => name,
            None => {
                let options = declared.map(|args| &args.discriminator);
                let name = options
                    .and_then(|o| o.name.clone())
                    .unwrap_or_else(|| self.naming.discriminator_column_name());
                let mut column = ColumnMetadata::new(
                    name.as_str(),
                    name.as_str(),
                    ColumnType::String,
                    ColumnOrigin::SynthesizedDiscriminator,
                );
                column.mode = ColumnMode::Discriminator;
                column.length = options.and_then(|o| o.length);
                for &member in &members {
                    self.drafts[member].meta.columns.push(column.clone());
                }
                name
            }
        };

        let mut values: Vec<(String, EntityTarget)> = Vec::new();
        for &member in &members {
            let target = self.drafts[member].meta.target.clone();
            let value = self
                .storage
                .find_discriminator_value(&target)
                .map(|d| d.value.clone())
                .unwrap_or_else(|| target.to_string());
            if let Some((_, first)) = values.iter().find(|(v, _)| *v == value) {
                return Err(MetadataError::collision(
                    format!("discriminator values of '{}'", root_target),
                    value.as_str(),
                    first.name(),
                    target.name(),
                ));
            }
            self.drafts[member].meta.discriminator_value = Some(value.clone());
            values.push((value, target));
        }

        self.drafts[root].meta.inheritance = Some(InheritanceMetadata {
            strategy: InheritanceStrategy::SingleTable,
            discriminator_column: Some(discriminator),
        });
        debug!(
            root = %root_target,
            members = members.len(),
            "single-table hierarchy resolved"
        );
        Ok(())
    }
}
