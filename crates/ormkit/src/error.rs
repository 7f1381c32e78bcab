//! Connection-layer error types.

use crate::driver::DriverError;
use ormkit_core::MetadataError;
use thiserror::Error;

/// Errors raised by connections and the connection manager.
#[derive(Debug, Error)]
pub enum Error {
    /// Entity metadata failed to resolve.
    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),

    /// The driver failed.
    #[error("driver error: {0}")]
    Driver(#[from] DriverError),

    /// No connection is registered under the name.
    #[error("connection '{0}' was not found")]
    ConnectionNotFound(String),

    /// The connection is already connected.
    #[error("connection '{0}' is already connected")]
    AlreadyConnected(String),

    /// The connection is not connected.
    #[error("connection '{0}' is not connected")]
    NotConnected(String),

    /// Connection options are invalid.
    #[error("invalid connection options: {0}")]
    InvalidOptions(String),
}
