//! Append-only store of declaration records.

use super::*;
use crate::target::EntityTarget;
use parking_lot::RwLock;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// One declaration record of any kind.
#[derive(Debug, Clone)]
pub enum MetadataArgs {
    /// Table declaration.
    Table(TableArgs),
    /// Column declaration.
    Column(ColumnArgs),
    /// Relation declaration.
    Relation(RelationArgs),
    /// Join column override.
    JoinColumn(JoinColumnArgs),
    /// Junction table override.
    JoinTable(JoinTableArgs),
    /// Index declaration.
    Index(IndexArgs),
    /// Inheritance strategy.
    Inheritance(InheritanceArgs),
    /// Discriminator value.
    DiscriminatorValue(DiscriminatorValueArgs),
    /// Lineage edge.
    Extends(ExtendsArgs),
    /// Embedded property.
    Embedded(EmbeddedArgs),
    /// Entity listener.
    EntityListener(EntityListenerArgs),
    /// Event subscriber.
    EntitySubscriber(EntitySubscriberArgs),
    /// Relation id property.
    RelationId(RelationIdArgs),
    /// Relation count property.
    RelationCount(RelationCountArgs),
    /// Named naming strategy.
    NamingStrategy(NamingStrategyArgs),
}

macro_rules! metadata_args_from {
    ($($variant:ident($args:ty)),* $(,)?) => {
        $(
            impl From<$args> for MetadataArgs {
                fn from(args: $args) -> Self {
                    MetadataArgs::$variant(args)
                }
            }
        )*
    };
}

metadata_args_from!(
    Table(TableArgs),
    Column(ColumnArgs),
    Relation(RelationArgs),
    JoinColumn(JoinColumnArgs),
    JoinTable(JoinTableArgs),
    Index(IndexArgs),
    Inheritance(InheritanceArgs),
    DiscriminatorValue(DiscriminatorValueArgs),
    Extends(ExtendsArgs),
    Embedded(EmbeddedArgs),
    EntityListener(EntityListenerArgs),
    EntitySubscriber(EntitySubscriberArgs),
    RelationId(RelationIdArgs),
    RelationCount(RelationCountArgs),
    NamingStrategy(NamingStrategyArgs),
);

/// Accumulates declaration records in arrival order.
///
/// Records are never removed or mutated. Filters return records in arrival
/// order; when several records share an identity (for columns, the target
/// and property), the most recently added one is returned in the position
/// of the first.
#[derive(Debug, Default)]
pub struct MetadataArgsStorage {
    tables: Vec<TableArgs>,
    columns: Vec<ColumnArgs>,
    relations: Vec<RelationArgs>,
    join_columns: Vec<JoinColumnArgs>,
    join_tables: Vec<JoinTableArgs>,
    indices: Vec<IndexArgs>,
    inheritances: Vec<InheritanceArgs>,
    discriminator_values: Vec<DiscriminatorValueArgs>,
    extends: Vec<ExtendsArgs>,
    embeddeds: Vec<EmbeddedArgs>,
    entity_listeners: Vec<EntityListenerArgs>,
    entity_subscribers: Vec<EntitySubscriberArgs>,
    relation_ids: Vec<RelationIdArgs>,
    relation_counts: Vec<RelationCountArgs>,
    naming_strategies: Vec<NamingStrategyArgs>,
}

/// Keep records whose target is in `targets`, one per key.
///
/// A key keeps the slot of its first record and the content of its last.
fn latest<'a, T, K>(
    records: &'a [T],
    targets: &[EntityTarget],
    target_of: impl Fn(&T) -> &EntityTarget,
    key_of: impl Fn(&T) -> K,
) -> Vec<&'a T>
where
    K: Eq + Hash,
{
    let wanted: HashSet<&EntityTarget> = targets.iter().collect();
    let mut slots: HashMap<K, usize> = HashMap::new();
    let mut kept: Vec<&'a T> = Vec::new();
    for record in records.iter().filter(|r| wanted.contains(target_of(*r))) {
        match slots.entry(key_of(record)) {
            Entry::Occupied(slot) => kept[*slot.get()] = record,
            Entry::Vacant(slot) => {
                slot.insert(kept.len());
                kept.push(record);
            }
        }
    }
    kept
}

impl MetadataArgsStorage {
    /// Create an empty storage.
    pub const fn new() -> Self {
        Self {
            tables: Vec::new(),
            columns: Vec::new(),
            relations: Vec::new(),
            join_columns: Vec::new(),
            join_tables: Vec::new(),
            indices: Vec::new(),
            inheritances: Vec::new(),
            discriminator_values: Vec::new(),
            extends: Vec::new(),
            embeddeds: Vec::new(),
            entity_listeners: Vec::new(),
            entity_subscribers: Vec::new(),
            relation_ids: Vec::new(),
            relation_counts: Vec::new(),
            naming_strategies: Vec::new(),
        }
    }

    /// Append a record.
    pub fn add(&mut self, args: impl Into<MetadataArgs>) {
        match args.into() {
            MetadataArgs::Table(a) => self.tables.push(a),
            MetadataArgs::Column(a) => self.columns.push(a),
            MetadataArgs::Relation(a) => self.relations.push(a),
            MetadataArgs::JoinColumn(a) => self.join_columns.push(a),
            MetadataArgs::JoinTable(a) => self.join_tables.push(a),
            MetadataArgs::Index(a) => self.indices.push(a),
            MetadataArgs::Inheritance(a) => self.inheritances.push(a),
            MetadataArgs::DiscriminatorValue(a) => self.discriminator_values.push(a),
            MetadataArgs::Extends(a) => self.extends.push(a),
            MetadataArgs::Embedded(a) => self.embeddeds.push(a),
            MetadataArgs::EntityListener(a) => self.entity_listeners.push(a),
            MetadataArgs::EntitySubscriber(a) => self.entity_subscribers.push(a),
            MetadataArgs::RelationId(a) => self.relation_ids.push(a),
            MetadataArgs::RelationCount(a) => self.relation_counts.push(a),
            MetadataArgs::NamingStrategy(a) => self.naming_strategies.push(a),
        }
    }

    /// Append several records.
    pub fn extend<A: Into<MetadataArgs>>(&mut self, records: impl IntoIterator<Item = A>) {
        for args in records {
            self.add(args);
        }
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        self.tables.len()
            + self.columns.len()
            + self.relations.len()
            + self.join_columns.len()
            + self.join_tables.len()
            + self.indices.len()
            + self.inheritances.len()
            + self.discriminator_values.len()
            + self.extends.len()
            + self.embeddeds.len()
            + self.entity_listeners.len()
            + self.entity_subscribers.len()
            + self.relation_ids.len()
            + self.relation_counts.len()
            + self.naming_strategies.len()
    }

    /// Check if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Table declarations for the targets.
    pub fn filter_tables(&self, targets: &[EntityTarget]) -> Vec<&TableArgs> {
        latest(&self.tables, targets, |a| &a.target, |a| a.target.clone())
    }

    /// Latest table declaration of one target.
    pub fn find_table(&self, target: &EntityTarget) -> Option<&TableArgs> {
        self.tables.iter().rev().find(|a| &a.target == target)
    }

    /// All table declarations, one per target.
    pub fn all_tables(&self) -> Vec<&TableArgs> {
        let mut slots: HashMap<&EntityTarget, usize> = HashMap::new();
        let mut kept: Vec<&TableArgs> = Vec::new();
        for table in &self.tables {
            match slots.entry(&table.target) {
                Entry::Occupied(slot) => kept[*slot.get()] = table,
                Entry::Vacant(slot) => {
                    slot.insert(kept.len());
                    kept.push(table);
                }
            }
        }
        kept
    }

    /// Column declarations for the targets.
    pub fn filter_columns(&self, targets: &[EntityTarget]) -> Vec<&ColumnArgs> {
        latest(
            &self.columns,
            targets,
            |a| &a.target,
            |a| (a.target.clone(), a.property_name.clone()),
        )
    }

    /// Relation declarations for the targets.
    pub fn filter_relations(&self, targets: &[EntityTarget]) -> Vec<&RelationArgs> {
        latest(
            &self.relations,
            targets,
            |a| &a.target,
            |a| (a.target.clone(), a.property_name.clone()),
        )
    }

    /// Join column overrides for the targets.
    pub fn filter_join_columns(&self, targets: &[EntityTarget]) -> Vec<&JoinColumnArgs> {
        latest(
            &self.join_columns,
            targets,
            |a| &a.target,
            |a| (a.target.clone(), a.property_name.clone()),
        )
    }

    /// Junction table overrides for the targets.
    pub fn filter_join_tables(&self, targets: &[EntityTarget]) -> Vec<&JoinTableArgs> {
        latest(
            &self.join_tables,
            targets,
            |a| &a.target,
            |a| (a.target.clone(), a.property_name.clone()),
        )
    }

    /// Index declarations for the targets.
    pub fn filter_indices(&self, targets: &[EntityTarget]) -> Vec<&IndexArgs> {
        latest(
            &self.indices,
            targets,
            |a| &a.target,
            |a| (a.target.clone(), a.key()),
        )
    }

    /// Inheritance declarations for the targets.
    pub fn filter_inheritances(&self, targets: &[EntityTarget]) -> Vec<&InheritanceArgs> {
        latest(&self.inheritances, targets, |a| &a.target, |a| a.target.clone())
    }

    /// Latest inheritance declaration of one target.
    pub fn find_inheritance(&self, target: &EntityTarget) -> Option<&InheritanceArgs> {
        self.inheritances.iter().rev().find(|a| &a.target == target)
    }

    /// Discriminator values for the targets.
    pub fn filter_discriminator_values(
        &self,
        targets: &[EntityTarget],
    ) -> Vec<&DiscriminatorValueArgs> {
        latest(
            &self.discriminator_values,
            targets,
            |a| &a.target,
            |a| a.target.clone(),
        )
    }

    /// Latest discriminator value of one target.
    pub fn find_discriminator_value(&self, target: &EntityTarget) -> Option<&DiscriminatorValueArgs> {
        self.discriminator_values
            .iter()
            .rev()
            .find(|a| &a.target == target)
    }

    /// Lineage edges for the targets.
    pub fn filter_extends(&self, targets: &[EntityTarget]) -> Vec<&ExtendsArgs> {
        latest(&self.extends, targets, |a| &a.target, |a| a.target.clone())
    }

    /// Latest lineage edge of one target.
    pub fn find_extends(&self, target: &EntityTarget) -> Option<&ExtendsArgs> {
        self.extends.iter().rev().find(|a| &a.target == target)
    }

    /// Embedded properties for the targets.
    pub fn filter_embeddeds(&self, targets: &[EntityTarget]) -> Vec<&EmbeddedArgs> {
        latest(
            &self.embeddeds,
            targets,
            |a| &a.target,
            |a| (a.target.clone(), a.property_name.clone()),
        )
    }

    /// Entity listeners for the targets.
    pub fn filter_entity_listeners(&self, targets: &[EntityTarget]) -> Vec<&EntityListenerArgs> {
        latest(
            &self.entity_listeners,
            targets,
            |a| &a.target,
            |a| (a.target.clone(), a.method.clone(), a.kind),
        )
    }

    /// Event subscribers for the targets.
    pub fn filter_entity_subscribers(
        &self,
        targets: &[EntityTarget],
    ) -> Vec<&EntitySubscriberArgs> {
        latest(
            &self.entity_subscribers,
            targets,
            |a| &a.target,
            |a| a.target.clone(),
        )
    }

    /// Relation id properties for the targets.
    pub fn filter_relation_ids(&self, targets: &[EntityTarget]) -> Vec<&RelationIdArgs> {
        latest(
            &self.relation_ids,
            targets,
            |a| &a.target,
            |a| (a.target.clone(), a.property_name.clone()),
        )
    }

    /// Relation count properties for the targets.
    pub fn filter_relation_counts(&self, targets: &[EntityTarget]) -> Vec<&RelationCountArgs> {
        latest(
            &self.relation_counts,
            targets,
            |a| &a.target,
            |a| (a.target.clone(), a.property_name.clone()),
        )
    }

    /// Latest naming strategy registered under `name`.
    pub fn find_naming_strategy(&self, name: &str) -> Option<&NamingStrategyArgs> {
        self.naming_strategies.iter().rev().find(|a| a.name == name)
    }
}

static GLOBAL_STORAGE: RwLock<MetadataArgsStorage> = RwLock::new(MetadataArgsStorage::new());

/// The process-wide storage.
///
/// Registration code takes the write lock while declarations are added at
/// startup; resolution passes take the read lock and resolve against a
/// plain `&MetadataArgsStorage`.
pub fn global_storage() -> &'static RwLock<MetadataArgsStorage> {
    &GLOBAL_STORAGE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::DefaultNamingStrategy;
    use std::sync::Arc;

    fn targets(names: &[&str]) -> Vec<EntityTarget> {
        names.iter().map(|n| EntityTarget::from(*n)).collect()
    }

    #[test]
    fn test_filter_preserves_arrival_order() {
        let mut storage = MetadataArgsStorage::new();
        storage.add(ColumnArgs::primary_generated("User", "id"));
        storage.add(ColumnArgs::new("Post", "title", ColumnType::String));
        storage.add(ColumnArgs::new("User", "name", ColumnType::String));
        storage.add(ColumnArgs::new("User", "email", ColumnType::String));

        let columns = storage.filter_columns(&targets(&["User"]));
        let names: Vec<_> = columns.iter().map(|c| c.property_name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "email"]);
    }

    #[test]
    fn test_last_write_wins() {
        let mut storage = MetadataArgsStorage::new();
        storage.add(ColumnArgs::new("User", "email", ColumnType::String).with_length(100));
        storage.add(ColumnArgs::new("User", "name", ColumnType::String));
        storage.add(
            ColumnArgs::new("User", "email", ColumnType::Text)
                .unique()
                .nullable(),
        );

        let columns = storage.filter_columns(&targets(&["User"]));
        assert_eq!(columns.len(), 2);

        let email = columns
            .iter()
            .find(|c| c.property_name == "email")
            .unwrap();
        assert_eq!(email.column_type, ColumnType::Text);
        assert_eq!(email.options.length, None);
        assert!(email.options.unique);
    }

    #[test]
    fn test_rewrite_keeps_first_position() {
        let mut storage = MetadataArgsStorage::new();
        storage.add(ColumnArgs::primary_generated("User", "id"));
        storage.add(ColumnArgs::new("User", "name", ColumnType::String));
        storage.add(ColumnArgs::primary_generated("User", "id").with_comment("surrogate"));

        let columns = storage.filter_columns(&targets(&["User"]));
        let names: Vec<_> = columns.iter().map(|c| c.property_name.as_str()).collect();
        assert_eq!(names, vec!["id", "name"]);
        assert_eq!(columns[0].options.comment.as_deref(), Some("surrogate"));
    }

    #[test]
    fn test_same_property_on_different_targets_is_kept() {
        let mut storage = MetadataArgsStorage::new();
        storage.add(ColumnArgs::primary_generated("User", "id"));
        storage.add(ColumnArgs::primary_generated("Post", "id"));

        let columns = storage.filter_columns(&targets(&["User", "Post"]));
        assert_eq!(columns.len(), 2);
    }

    #[test]
    fn test_find_table_returns_latest() {
        let mut storage = MetadataArgsStorage::new();
        storage.add(TableArgs::new("User"));
        storage.add(TableArgs::new("User").with_name("accounts"));

        let table = storage.find_table(&"User".into()).unwrap();
        assert_eq!(table.name.as_deref(), Some("accounts"));
        assert_eq!(storage.all_tables().len(), 1);
        assert_eq!(storage.filter_tables(&targets(&["User"])).len(), 1);
    }

    #[test]
    fn test_index_identity() {
        let mut storage = MetadataArgsStorage::new();
        storage.add(IndexArgs::on_property("User", "email"));
        storage.add(IndexArgs::on_property("User", "email").unique());
        storage.add(IndexArgs::composite("User", ["firstName", "lastName"]).with_name("ind_name"));

        let indices = storage.filter_indices(&targets(&["User"]));
        assert_eq!(indices.len(), 2);
        assert!(indices[0].unique);
    }

    #[test]
    fn test_len_and_naming_strategy_lookup() {
        let mut storage = MetadataArgsStorage::new();
        assert!(storage.is_empty());

        storage.extend(vec![
            MetadataArgs::from(TableArgs::new("User")),
            MetadataArgs::from(ColumnArgs::primary_generated("User", "id")),
        ]);
        storage.add(NamingStrategyArgs::new(
            "default",
            Arc::new(DefaultNamingStrategy::new()),
        ));

        assert_eq!(storage.len(), 3);
        assert!(storage.find_naming_strategy("default").is_some());
        assert!(storage.find_naming_strategy("custom").is_none());
    }
}
