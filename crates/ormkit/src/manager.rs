//! Registry of named connections.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::{join_all, try_join_all};
use parking_lot::{RwLock, RwLockReadGuard};
use tracing::debug;

use ormkit_core::{global_storage, MetadataArgsStorage};

use crate::connection::Connection;
use crate::driver::Driver;
use crate::error::Error;
use crate::options::ConnectionOptions;

/// Where a manager reads declarations from.
#[derive(Debug, Clone, Default)]
pub enum StorageHandle {
    /// The process-wide storage.
    #[default]
    Global,
    /// A storage owned by the caller.
    Shared(Arc<RwLock<MetadataArgsStorage>>),
}

impl StorageHandle {
    /// Take a read snapshot of the storage.
    pub fn read(&self) -> RwLockReadGuard<'_, MetadataArgsStorage> {
        match self {
            StorageHandle::Global => global_storage().read(),
            StorageHandle::Shared(storage) => storage.read(),
        }
    }
}

/// Creates connections and keeps them by name.
#[derive(Debug, Default)]
pub struct ConnectionManager {
    connections: RwLock<Vec<Arc<Connection>>>,
    storage: StorageHandle,
}

impl ConnectionManager {
    /// Create a manager reading the process-wide storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manager reading a caller-owned storage.
    pub fn with_storage(storage: Arc<RwLock<MetadataArgsStorage>>) -> Self {
        Self {
            connections: RwLock::new(Vec::new()),
            storage: StorageHandle::Shared(storage),
        }
    }

    /// Get the storage handle.
    pub fn storage(&self) -> &StorageHandle {
        &self.storage
    }

    /// Create a connection, replacing a disconnected one of the same name.
    pub fn create(
        &self,
        options: ConnectionOptions,
        driver: Arc<dyn Driver>,
    ) -> Result<Arc<Connection>, Error> {
        options.validate()?;

        let mut connections = self.connections.write();
        let existing = connections.iter().position(|c| c.name() == options.name);
        if let Some(idx) = existing {
            if connections[idx].is_active() {
                return Err(Error::AlreadyConnected(options.name));
            }
        }

        let connection = Arc::new(Connection::new(options, driver));
        match existing {
            Some(idx) => connections[idx] = Arc::clone(&connection),
            None => connections.push(Arc::clone(&connection)),
        }
        debug!(connection = %connection.name(), "connection created");
        Ok(connection)
    }

    /// Get a connection by name.
    pub fn get(&self, name: &str) -> Result<Arc<Connection>, Error> {
        self.connections
            .read()
            .iter()
            .find(|c| c.name() == name)
            .cloned()
            .ok_or_else(|| Error::ConnectionNotFound(name.to_string()))
    }

    /// Check if a connection exists.
    pub fn has(&self, name: &str) -> bool {
        self.connections.read().iter().any(|c| c.name() == name)
    }

    /// Names of all connections, in creation order.
    pub fn connection_names(&self) -> Vec<String> {
        self.connections
            .read()
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    /// Create a connection and connect it.
    pub async fn create_and_connect(
        &self,
        options: ConnectionOptions,
        driver: Arc<dyn Driver>,
    ) -> Result<Arc<Connection>, Error> {
        let connection = self.create(options, driver)?;
        let resolved = {
            let storage = self.storage.read();
            connection.build_metadata(&storage)?
        };
        connection.connect_resolved(resolved).await?;
        Ok(connection)
    }

    /// Create several connections and connect them concurrently.
    ///
    /// Every option set is checked before any connection is registered,
    /// and every connection's metadata is resolved before any driver is
    /// touched. Names must be unique within the batch.
    pub async fn create_and_connect_to_all(
        &self,
        configs: Vec<(ConnectionOptions, Arc<dyn Driver>)>,
    ) -> Result<Vec<Arc<Connection>>, Error> {
        let mut names = HashSet::new();
        for (options, _) in &configs {
            options.validate()?;
            if !names.insert(options.name.as_str()) {
                return Err(Error::InvalidOptions(format!(
                    "connection '{}' is listed more than once",
                    options.name
                )));
            }
            if self.get(&options.name).is_ok_and(|c| c.is_active()) {
                return Err(Error::AlreadyConnected(options.name.clone()));
            }
        }

        let connections = configs
            .into_iter()
            .map(|(options, driver)| self.create(options, driver))
            .collect::<Result<Vec<_>, _>>()?;

        let resolved = {
            let storage = self.storage.read();
            connections
                .iter()
                .map(|c| c.build_metadata(&storage))
                .collect::<Result<Vec<_>, _>>()?
        };

        try_join_all(
            connections
                .iter()
                .zip(resolved)
                .map(|(connection, resolved)| connection.connect_resolved(resolved)),
        )
        .await?;
        Ok(connections)
    }

    /// Close every connected connection.
    ///
    /// All connections are closed; the first failure is returned.
    pub async fn close_all(&self) -> Result<(), Error> {
        let connected: Vec<_> = self
            .connections
            .read()
            .iter()
            .filter(|c| c.is_connected())
            .cloned()
            .collect();

        let results = join_all(connected.iter().map(|c| c.close())).await;
        results.into_iter().collect()
    }
}
