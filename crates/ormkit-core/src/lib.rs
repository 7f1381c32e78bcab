//! ORMKit Core - Entity metadata declarations and resolution.
//!
//! Types register declaration records (tables, columns, relations,
//! indices, inheritance and embedding) into a [`MetadataArgsStorage`].
//! A [`MetadataBuilder`] resolves the records for a set of types into an
//! immutable [`EntityMetadataGraph`], naming every table and column
//! through a [`NamingStrategy`].
//!
//! ```
//! use ormkit_core::args::{ColumnArgs, ColumnType, MetadataArgsStorage, TableArgs};
//! use ormkit_core::{build, DefaultNamingStrategy, EntityTarget};
//!
//! let mut storage = MetadataArgsStorage::new();
//! storage.add(TableArgs::new("User"));
//! storage.add(ColumnArgs::primary_generated("User", "id"));
//! storage.add(ColumnArgs::new("User", "name", ColumnType::String));
//!
//! let graph = build(&[EntityTarget::from("User")], &storage, &DefaultNamingStrategy).unwrap();
//! assert_eq!(graph.get("User").unwrap().table_name, "user");
//! ```

pub mod args;
pub mod builder;
pub mod error;
pub mod metadata;
pub mod naming;
pub mod target;

pub use args::{global_storage, MetadataArgs, MetadataArgsStorage};
pub use builder::{build, MetadataBuilder};
pub use error::MetadataError;
pub use metadata::{
    ColumnMetadata, ColumnRole, EntityId, EntityMetadata, EntityMetadataGraph, RelationMetadata,
    TableStrategy,
};
pub use naming::{DefaultNamingStrategy, NamingStrategy};
pub use target::EntityTarget;
