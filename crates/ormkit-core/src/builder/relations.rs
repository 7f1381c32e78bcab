//! Relation resolution: targets, inverse binding, ownership and the
//! physical columns and tables that back each relation.

use super::{last_by_key, primary_of, Resolution};
use crate::args::{JoinColumnOptions, RelationArgs, RelationType};
use crate::error::MetadataError;
use crate::metadata::{
    ColumnMetadata, ColumnOrigin, EntityId, EntityMetadata, ForeignKeyMetadata, JunctionColumn,
    JunctionMetadata, RelationMetadata, RelationRef, TableStrategy,
};
use tracing::debug;

impl<'s> Resolution<'s> {
    pub(super) fn resolve_relations(&mut self) -> Result<(), MetadataError> {
        self.declare_relations()?;
        self.bind_inverses()?;
        self.check_ownership()?;
        self.build_join_columns()?;
        self.build_junctions()
    }

    /// Create relation metadata from declarations along each lineage.
    fn declare_relations(&mut self) -> Result<(), MetadataError> {
        let storage = self.storage;

        for idx in 0..self.drafts.len() {
            let draft = &self.drafts[idx];
            let entity = draft.meta.target.clone();
            let declared = last_by_key(storage.filter_relations(&draft.sources), |r| {
                r.property_name.clone()
            });
            let join_columns = last_by_key(storage.filter_join_columns(&draft.sources), |j| {
                j.property_name.clone()
            });
            let join_tables = last_by_key(storage.filter_join_tables(&draft.sources), |j| {
                j.property_name.clone()
            });

            if draft.meta.strategy == TableStrategy::Embeddable && !declared.is_empty() {
                return Err(MetadataError::invalid(
                    entity.name(),
                    "embeddable types cannot declare relations",
                ));
            }

            let find = |property: &str| declared.iter().find(|r| r.property_name == property);
            for join_column in &join_columns {
                match find(&join_column.property_name) {
                    Some(r) if matches!(
                        r.relation_type,
                        RelationType::ManyToOne | RelationType::OneToOne
                    ) => {}
                    Some(r) => {
                        return Err(MetadataError::invalid(
                            entity.name(),
                            format!(
                                "join column on '{}', a {} relation",
                                r.property_name, r.relation_type
                            ),
                        ))
                    }
                    None => {
                        return Err(MetadataError::invalid(
                            entity.name(),
                            format!(
                                "join column on '{}', which is not a relation",
                                join_column.property_name
                            ),
                        ))
                    }
                }
            }
            for join_table in &join_tables {
                match find(&join_table.property_name) {
                    Some(r) if r.relation_type == RelationType::ManyToMany => {}
                    _ => {
                        return Err(MetadataError::invalid(
                            entity.name(),
                            format!(
                                "join table on '{}', which is not a many-to-many relation",
                                join_table.property_name
                            ),
                        ))
                    }
                }
            }

            let mut relations = Vec::with_capacity(declared.len());
            for args in &declared {
                let target = self.relation_target(args)?;
                let is_owning = match args.relation_type {
                    RelationType::ManyToOne => true,
                    RelationType::OneToMany => false,
                    RelationType::OneToOne => join_columns
                        .iter()
                        .any(|j| j.property_name == args.property_name),
                    RelationType::ManyToMany => join_tables
                        .iter()
                        .any(|j| j.property_name == args.property_name),
                };
                relations.push(RelationMetadata {
                    property_name: args.property_name.clone(),
                    name: self.naming.relation_name(&args.property_name),
                    relation_type: args.relation_type,
                    target,
                    target_entity: args.target_entity.clone(),
                    inverse: None,
                    inverse_side: args.inverse_side.clone(),
                    is_owning,
                    join_column: None,
                    referenced_column: None,
                    junction: None,
                    options: args.options.clone(),
                    tree_role: args.tree_role,
                    declared_by: args.target.clone(),
                });
            }

            let draft = &mut self.drafts[idx];
            draft.meta.relations = relations;
            draft.join_columns = join_columns;
            draft.join_tables = join_tables;
        }
        Ok(())
    }

    fn relation_target(&self, args: &RelationArgs) -> Result<EntityId, MetadataError> {
        let target = self.ids.get(&args.target_entity).copied().ok_or_else(|| {
            MetadataError::unresolved(
                args.target.name(),
                &args.property_name,
                args.target_entity.name(),
            )
        })?;
        if self.meta(target).strategy == TableStrategy::Embeddable {
            return Err(MetadataError::invalid(
                args.target.name(),
                format!(
                    "relation '{}' targets embeddable '{}'",
                    args.property_name, args.target_entity
                ),
            ));
        }
        Ok(target)
    }

    /// Pair each relation naming an inverse side with that relation.
    fn bind_inverses(&mut self) -> Result<(), MetadataError> {
        for idx in 0..self.drafts.len() {
            for pos in 0..self.drafts[idx].meta.relations.len() {
                let this = RelationRef {
                    entity: EntityId::new(idx),
                    relation: pos,
                };
                if let Some(other) = self.find_inverse(this)? {
                    self.drafts[idx].meta.relations[pos].inverse = Some(other);
                    self.link_back(this, other)?;
                }
            }
        }
        Ok(())
    }

    fn find_inverse(&self, this: RelationRef) -> Result<Option<RelationRef>, MetadataError> {
        let meta = self.meta(this.entity);
        let relation = &meta.relations[this.relation];
        let Some(inverse_side) = relation.inverse_side.as_deref() else {
            return Ok(None);
        };

        let target = self.meta(relation.target);
        let Some(pos) = target
            .relations
            .iter()
            .position(|r| r.property_name == inverse_side)
        else {
            return Err(MetadataError::unresolved(
                meta.name(),
                &relation.property_name,
                format!("{}.{}", target.target, inverse_side),
            ));
        };
        let other = &target.relations[pos];

        let mismatch = |reason: String| MetadataError::RelationMismatch {
            entity: meta.target.to_string(),
            property: relation.property_name.clone(),
            inverse_entity: target.target.to_string(),
            inverse_property: inverse_side.to_string(),
            reason,
        };

        if other.relation_type != relation.relation_type.inverse() {
            return Err(mismatch(format!(
                "a {} relation cannot pair with a {} relation",
                relation.relation_type, other.relation_type
            )));
        }
        let other_target = &self.meta(other.target).target;
        if !meta.is_a(other_target) {
            return Err(mismatch(format!("the inverse side targets '{}'", other_target)));
        }
        if let Some(back) = &other.inverse_side {
            if *back != relation.property_name {
                return Err(mismatch(format!(
                    "the inverse side names '{}' as its own inverse",
                    back
                )));
            }
        }

        Ok(Some(RelationRef {
            entity: relation.target,
            relation: pos,
        }))
    }

    /// Point `other` back at `this` when `other` targets this exact entity.
    ///
    /// Inherited copies of a relation bind forward only.
    fn link_back(&mut self, this: RelationRef, other: RelationRef) -> Result<(), MetadataError> {
        let other_relation = &self.meta(other.entity).relations[other.relation];
        if other_relation.target != this.entity {
            return Ok(());
        }
        match other_relation.inverse {
            None => {
                self.drafts[other.entity.index()].meta.relations[other.relation].inverse =
                    Some(this);
            }
            Some(existing) if existing == this => {}
            Some(existing) => {
                let this_meta = self.meta(this.entity);
                let claimant = &self.meta(existing.entity).relations[existing.relation];
                return Err(MetadataError::RelationMismatch {
                    entity: this_meta.target.to_string(),
                    property: this_meta.relations[this.relation].property_name.clone(),
                    inverse_entity: self.meta(other.entity).target.to_string(),
                    inverse_property: other_relation.property_name.clone(),
                    reason: format!(
                        "the inverse side is already paired with '{}'",
                        claimant.property_name
                    ),
                });
            }
        }
        debug!(
            entity = %self.meta(this.entity).target,
            relation = %self.meta(this.entity).relations[this.relation].property_name,
            inverse = %self.meta(other.entity).relations[other.relation].property_name,
            "bound inverse relation"
        );
        Ok(())
    }

    /// One-to-one and many-to-many pairs need exactly one owning side.
    fn check_ownership(&self) -> Result<(), MetadataError> {
        for draft in &self.drafts {
            for relation in &draft.meta.relations {
                let fixture = match relation.relation_type {
                    RelationType::OneToOne => "join column",
                    RelationType::ManyToMany => "join table",
                    _ => continue,
                };
                match relation.inverse {
                    None if !relation.is_owning => {
                        return Err(MetadataError::invalid(
                            draft.meta.name(),
                            format!(
                                "unidirectional relation '{}' needs a {}",
                                relation.property_name, fixture
                            ),
                        ))
                    }
                    None => {}
                    Some(other) => {
                        let inverse = &self.meta(other.entity).relations[other.relation];
                        if relation.is_owning == inverse.is_owning {
                            let problem = if relation.is_owning {
                                "both sides declare"
                            } else {
                                "neither side declares"
                            };
                            return Err(MetadataError::invalid(
                                draft.meta.name(),
                                format!(
                                    "relation '{}' and its inverse '{}': {} a {}",
                                    relation.property_name,
                                    inverse.property_name,
                                    problem,
                                    fixture
                                ),
                            ));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Add the join column and foreign key of every owning to-one relation.
    fn build_join_columns(&mut self) -> Result<(), MetadataError> {
        for idx in 0..self.drafts.len() {
            for pos in 0..self.drafts[idx].meta.relations.len() {
                let draft = &self.drafts[idx];
                let relation = &draft.meta.relations[pos];
                if !relation.is_owning || relation.relation_type.is_to_many() {
                    continue;
                }

                let overrides = draft
                    .join_columns
                    .iter()
                    .find(|j| j.property_name == relation.property_name)
                    .map(|j| &j.options);
                let target = self.meta(relation.target);
                let referenced = referenced_column(
                    &draft.meta,
                    &relation.property_name,
                    target,
                    overrides.and_then(|o| o.referenced_column_name.as_deref()),
                )?;
                let name = match overrides.and_then(|o| o.name.clone()) {
                    Some(name) => name,
                    None => self
                        .naming
                        .join_column_name(&relation.name, &referenced.database_name),
                };

                let reuse = draft.meta.find_column_by_name(&name).is_some_and(|existing| {
                    matches!(existing.origin, ColumnOrigin::Declared { .. })
                        && existing.column_type == referenced.column_type
                });
                let column = (!reuse).then(|| {
                    let mut column = ColumnMetadata::new(
                        name.as_str(),
                        name.as_str(),
                        referenced.column_type,
                        ColumnOrigin::JoinColumn {
                            relation: relation.property_name.clone(),
                        },
                    );
                    column.is_nullable = relation.options.nullable;
                    column.length = referenced.length;
                    column
                });
                let foreign_key = ForeignKeyMetadata {
                    columns: vec![name.clone()],
                    referenced_entity: relation.target,
                    referenced_table: target.table_name.clone(),
                    referenced_columns: vec![referenced.database_name.clone()],
                    on_delete: relation.options.on_delete,
                };
                let referenced_name = referenced.database_name.clone();

                let meta = &mut self.drafts[idx].meta;
                if let Some(column) = column {
                    meta.columns.push(column);
                }
                meta.foreign_keys.push(foreign_key);
                let relation = &mut meta.relations[pos];
                relation.join_column = Some(name);
                relation.referenced_column = Some(referenced_name);
            }
        }
        Ok(())
    }

    /// Describe the junction table of every owning many-to-many relation.
    fn build_junctions(&mut self) -> Result<(), MetadataError> {
        for idx in 0..self.drafts.len() {
            for pos in 0..self.drafts[idx].meta.relations.len() {
                let draft = &self.drafts[idx];
                let relation = &draft.meta.relations[pos];
                if !relation.is_owning || relation.relation_type != RelationType::ManyToMany {
                    continue;
                }

                let owner = &draft.meta;
                let target = self.meta(relation.target);
                let join_table = draft
                    .join_tables
                    .iter()
                    .find(|j| j.property_name == relation.property_name);
                let inverse_property = relation
                    .inverse
                    .map(|r| self.meta(r.entity).relations[r.relation].property_name.as_str());

                let table_name = match join_table.and_then(|j| j.name.clone()) {
                    Some(name) => name,
                    None => self.naming.join_table_name(
                        &owner.table_name,
                        &target.table_name,
                        &relation.property_name,
                        inverse_property,
                    ),
                };
                let owner_column = self.junction_column(
                    owner,
                    owner,
                    &relation.property_name,
                    join_table.and_then(|j| j.join_column.as_ref()),
                )?;
                let inverse_column = self.junction_column(
                    owner,
                    target,
                    &relation.property_name,
                    join_table.and_then(|j| j.inverse_join_column.as_ref()),
                )?;
                if owner_column.name == inverse_column.name {
                    return Err(MetadataError::collision(
                        format!("columns of junction table '{}'", table_name),
                        owner_column.name.as_str(),
                        owner.name(),
                        target.name(),
                    ));
                }

                debug!(
                    entity = %owner.target,
                    relation = %relation.property_name,
                    table = %table_name,
                    "resolved junction table"
                );
                self.drafts[idx].meta.relations[pos].junction = Some(JunctionMetadata {
                    table_name,
                    owner_column,
                    inverse_column,
                });
            }
        }
        Ok(())
    }

    fn junction_column(
        &self,
        owner: &EntityMetadata,
        side: &EntityMetadata,
        property: &str,
        overrides: Option<&JoinColumnOptions>,
    ) -> Result<JunctionColumn, MetadataError> {
        let referenced = referenced_column(
            owner,
            property,
            side,
            overrides.and_then(|o| o.referenced_column_name.as_deref()),
        )?;
        let name = match overrides.and_then(|o| o.name.clone()) {
            Some(name) => name,
            None => self
                .naming
                .join_key_column_name(&side.table_name, &referenced.database_name),
        };
        Ok(JunctionColumn {
            name,
            referenced_table: side.table_name.clone(),
            referenced_column: referenced.database_name.clone(),
        })
    }
}

/// The column of `target` a relation of `owner` points at: an explicitly
/// named property, or the primary key.
fn referenced_column<'m>(
    owner: &EntityMetadata,
    property: &str,
    target: &'m EntityMetadata,
    referenced_property: Option<&str>,
) -> Result<&'m ColumnMetadata, MetadataError> {
    match referenced_property {
        Some(referenced) => target
            .find_column(referenced)
            .or_else(|| target.find_column_by_name(referenced))
            .ok_or_else(|| {
                MetadataError::invalid(
                    owner.name(),
                    format!(
                        "relation '{}' references unknown column '{}.{}'",
                        property, target.target, referenced
                    ),
                )
            }),
        None => primary_of(target),
    }
}
