//! Declaration records and the storage that accumulates them.
//!
//! Each record corresponds to one declaration applied to an entity type.
//! Records may arrive in any order and may name types that are declared
//! later; nothing is resolved until a builder runs over the storage.

mod column;
mod entity;
mod index;
mod relation;
mod storage;
mod table;

pub use column::{ColumnArgs, ColumnMode, ColumnOptions, ColumnType, Generation};
pub use entity::{
    DiscriminatorValueArgs, EmbeddedArgs, EntityListenerArgs, EntitySubscriberArgs, ExtendsArgs,
    InheritanceArgs, ListenerKind, NamingStrategyArgs, RelationCountArgs, RelationIdArgs,
};
pub use index::IndexArgs;
pub use relation::{
    JoinColumnArgs, JoinColumnOptions, JoinTableArgs, OnDelete, RelationArgs, RelationOptions,
    RelationType, TreeRole,
};
pub use storage::{global_storage, MetadataArgs, MetadataArgsStorage};
pub use table::{InheritanceStrategy, TableArgs, TableKind};
