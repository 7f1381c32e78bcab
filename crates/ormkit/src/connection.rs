//! Connections bound to resolved entity metadata.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use ormkit_core::{
    DefaultNamingStrategy, EntityMetadata, EntityMetadataGraph, EntityTarget, MetadataArgsStorage,
    MetadataBuilder, NamingStrategy,
};

use crate::driver::Driver;
use crate::error::Error;
use crate::options::{ConnectionOptions, NamingStrategyChoice};

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Connection not yet established.
    Disconnected,
    /// Driver connect in progress.
    Connecting,
    /// Metadata resolved and driver connected.
    Connected,
    /// Driver disconnect in progress.
    Closing,
    /// Connection closed.
    Closed,
}

/// Output of a resolution pass for one connection.
#[derive(Debug, Clone)]
pub struct ResolvedMetadata {
    /// The entity graph.
    pub graph: EntityMetadataGraph,
    /// Registered subscribers from the connection's subscriber list.
    pub subscribers: Vec<EntityTarget>,
}

/// A named connection.
///
/// Each connection owns the graph resolved for it; graphs are never shared
/// between connections.
pub struct Connection {
    name: String,
    options: ConnectionOptions,
    driver: Arc<dyn Driver>,
    state: Mutex<ConnectionState>,
    metadata: RwLock<Option<Arc<EntityMetadataGraph>>>,
    subscribers: RwLock<Vec<EntityTarget>>,
}

impl Connection {
    /// Create a disconnected connection.
    pub fn new(options: ConnectionOptions, driver: Arc<dyn Driver>) -> Self {
        Self {
            name: options.name.clone(),
            options,
            driver,
            state: Mutex::new(ConnectionState::Disconnected),
            metadata: RwLock::new(None),
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Get the connection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the connection options.
    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    /// Get the driver.
    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    /// Get the current state.
    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    /// Check if the connection is connected.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Check if the connection is connected or between states.
    pub fn is_active(&self) -> bool {
        matches!(
            self.state(),
            ConnectionState::Connecting | ConnectionState::Connected | ConnectionState::Closing
        )
    }

    /// Resolve this connection's entities against a storage snapshot.
    ///
    /// Does not touch the connection; the result is installed by
    /// [`Connection::connect_resolved`].
    pub fn build_metadata(&self, storage: &MetadataArgsStorage) -> Result<ResolvedMetadata, Error> {
        let naming: Arc<dyn NamingStrategy> = match &self.options.naming_strategy {
            NamingStrategyChoice::Default => Arc::new(DefaultNamingStrategy::new()),
            NamingStrategyChoice::Instance(strategy) => Arc::clone(strategy),
            NamingStrategyChoice::Named(name) => storage
                .find_naming_strategy(name)
                .map(|args| Arc::clone(&args.strategy))
                .ok_or_else(|| {
                    Error::InvalidOptions(format!(
                        "connection '{}' uses unknown naming strategy '{}'",
                        self.name, name
                    ))
                })?,
        };

        let graph = MetadataBuilder::new(storage, naming.as_ref())
            .with_default_inheritance(self.options.default_inheritance)
            .build(&self.options.entities)?;

        let subscribers = storage
            .filter_entity_subscribers(&self.options.subscribers)
            .into_iter()
            .map(|args| args.target.clone())
            .collect();

        if self.options.logging.metadata {
            debug!(
                connection = %self.name,
                tables = ?graph.table_names(),
                "metadata built"
            );
        }

        Ok(ResolvedMetadata { graph, subscribers })
    }

    /// Resolve metadata, then connect the driver.
    ///
    /// A resolution failure leaves the connection disconnected and the
    /// driver untouched.
    pub async fn connect(&self, storage: &MetadataArgsStorage) -> Result<(), Error> {
        self.ensure_connectable()?;
        let resolved = self.build_metadata(storage)?;
        self.connect_resolved(resolved).await
    }

    /// Connect the driver and install already resolved metadata.
    ///
    /// The connection is `Connecting` while the driver connects and, with
    /// `synchronize` set, synchronizes the schema; a driver failure moves it
    /// back to `Disconnected`.
    pub async fn connect_resolved(&self, resolved: ResolvedMetadata) -> Result<(), Error> {
        {
            let mut state = self.state.lock();
            match *state {
                ConnectionState::Disconnected | ConnectionState::Closed => {
                    *state = ConnectionState::Connecting;
                }
                _ => return Err(Error::AlreadyConnected(self.name.clone())),
            }
        }

        if let Err(e) = self.driver.connect().await {
            *self.state.lock() = ConnectionState::Disconnected;
            return Err(e.into());
        }

        if self.options.synchronize {
            if let Err(e) = self.driver.synchronize(&resolved.graph).await {
                if let Err(close_err) = self.driver.disconnect().await {
                    warn!(connection = %self.name, error = %close_err, "driver disconnect failed");
                }
                *self.state.lock() = ConnectionState::Disconnected;
                return Err(e.into());
            }
            debug!(connection = %self.name, "schema synchronized");
        }

        let entities = resolved.graph.len();
        *self.metadata.write() = Some(Arc::new(resolved.graph));
        *self.subscribers.write() = resolved.subscribers;
        *self.state.lock() = ConnectionState::Connected;

        if self.options.logging.connection {
            info!(
                connection = %self.name,
                driver = self.driver.driver_type(),
                entities,
                "connection established"
            );
        }
        Ok(())
    }

    /// Disconnect the driver and discard the metadata.
    ///
    /// The connection is closed even when the driver fails to disconnect;
    /// that failure is still returned.
    pub async fn close(&self) -> Result<(), Error> {
        {
            let mut state = self.state.lock();
            if *state != ConnectionState::Connected {
                return Err(Error::NotConnected(self.name.clone()));
            }
            *state = ConnectionState::Closing;
        }

        let result = self.driver.disconnect().await;
        if let Err(e) = &result {
            warn!(connection = %self.name, error = %e, "driver disconnect failed");
        }

        *self.metadata.write() = None;
        self.subscribers.write().clear();
        *self.state.lock() = ConnectionState::Closed;

        if self.options.logging.connection {
            info!(connection = %self.name, "connection closed");
        }
        result.map_err(Error::from)
    }

    /// Get the resolved graph.
    pub fn metadata(&self) -> Result<Arc<EntityMetadataGraph>, Error> {
        self.metadata
            .read()
            .clone()
            .ok_or_else(|| Error::NotConnected(self.name.clone()))
    }

    /// Get the metadata of one entity type.
    pub fn entity_metadata(&self, target: impl AsRef<str>) -> Result<EntityMetadata, Error> {
        let graph = self.metadata()?;
        let entity = graph.get(target)?;
        Ok(entity.clone())
    }

    /// Check if this connection resolved metadata for a type.
    pub fn has_metadata(&self, target: &str) -> bool {
        self.metadata
            .read()
            .as_ref()
            .is_some_and(|graph| graph.has(target))
    }

    /// Get the subscribers attached on connect.
    pub fn subscribers(&self) -> Vec<EntityTarget> {
        self.subscribers.read().clone()
    }

    fn ensure_connectable(&self) -> Result<(), Error> {
        if self.is_active() {
            return Err(Error::AlreadyConnected(self.name.clone()));
        }
        Ok(())
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("name", &self.name)
            .field("driver", &self.driver.driver_type())
            .field("state", &self.state())
            .finish()
    }
}
