//! The driver seam.
//!
//! Drivers execute SQL against a concrete database. A connection opens
//! and closes the driver and, when asked to, hands it the resolved
//! metadata for schema synchronization.

use futures::future::{self, BoxFuture};
use ormkit_core::EntityMetadataGraph;
use std::fmt::Debug;
use thiserror::Error;

/// Driver errors.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Opening the database connection failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Closing the database connection failed.
    #[error("disconnect failed: {0}")]
    Disconnect(String),

    /// Bringing the schema in line with the metadata failed.
    #[error("schema synchronization failed: {0}")]
    Synchronize(String),
}

/// A database driver.
pub trait Driver: Debug + Send + Sync {
    /// Driver type, e.g. `postgres`.
    fn driver_type(&self) -> &str;

    /// Open the database connection.
    fn connect(&self) -> BoxFuture<'_, Result<(), DriverError>>;

    /// Close the database connection.
    fn disconnect(&self) -> BoxFuture<'_, Result<(), DriverError>>;

    /// Bring the database schema in line with resolved metadata.
    ///
    /// Called after connecting when the connection enables `synchronize`.
    fn synchronize<'a>(
        &'a self,
        metadata: &'a EntityMetadataGraph,
    ) -> BoxFuture<'a, Result<(), DriverError>> {
        let _ = metadata;
        Box::pin(future::ready(Ok(())))
    }
}
