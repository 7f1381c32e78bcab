//! ORMKit - Connections bound to resolved entity metadata.
//!
//! Declarations are registered into the process-wide metadata storage.
//! Each connection resolves the entity types it lists into its own
//! entity graph before its driver is connected.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use ormkit::args::{ColumnArgs, ColumnType, TableArgs};
//! use ormkit::{create_connection, metadata_args_storage, ConnectionOptions, DriverOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     {
//!         let mut storage = metadata_args_storage().write();
//!         storage.add(TableArgs::new("User"));
//!         storage.add(ColumnArgs::primary_generated("User", "id"));
//!         storage.add(ColumnArgs::new("User", "name", ColumnType::String));
//!     }
//!
//!     let options = ConnectionOptions::new(DriverOptions::new("postgres"))
//!         .with_entity("User");
//!     let connection = create_connection(options, Arc::new(PostgresDriver::new())).await?;
//!
//!     let user = connection.entity_metadata("User")?;
//!     println!("User lives in {}", user.table_name);
//!
//!     connection.close().await?;
//!     Ok(())
//! }
//! ```

pub mod connection;
pub mod container;
pub mod driver;
pub mod error;
pub mod manager;
pub mod options;

use std::sync::Arc;

use parking_lot::RwLock;

use ormkit_core::MetadataArgsStorage;

pub use connection::{Connection, ConnectionState, ResolvedMetadata};
pub use container::{get_from_container, use_container, Container, DefaultContainer};
pub use driver::{Driver, DriverError};
pub use error::Error;
pub use manager::{ConnectionManager, StorageHandle};
pub use options::{
    ConnectionOptions, DriverOptions, LoggingOptions, NamingStrategyChoice,
    DEFAULT_CONNECTION_NAME,
};

/// Re-export declaration and metadata types.
pub use ormkit_core::{args, metadata, naming, EntityTarget, MetadataError};

/// The process-wide declaration storage.
///
/// Always the built-in storage, whichever container is installed.
pub fn metadata_args_storage() -> &'static RwLock<MetadataArgsStorage> {
    ormkit_core::global_storage()
}

/// The shared connection manager.
pub fn connection_manager() -> Arc<ConnectionManager> {
    get_from_container::<ConnectionManager>()
}

/// Create a connection on the shared manager and connect it.
pub async fn create_connection(
    options: ConnectionOptions,
    driver: Arc<dyn Driver>,
) -> Result<Arc<Connection>, Error> {
    connection_manager().create_and_connect(options, driver).await
}

/// Get a connection of the shared manager.
pub fn get_connection(name: &str) -> Result<Arc<Connection>, Error> {
    connection_manager().get(name)
}
