//! Connection lifecycle and manager tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::RwLock;
use pretty_assertions::assert_eq;

use ormkit::args::{
    ColumnArgs, ColumnType, EntitySubscriberArgs, InheritanceStrategy, MetadataArgsStorage,
    NamingStrategyArgs, RelationArgs, TableArgs,
};
use ormkit::naming::{DefaultNamingStrategy, NamingStrategy};
use ormkit::{
    Connection, ConnectionManager, ConnectionOptions, ConnectionState, Driver, DriverError,
    DriverOptions, EntityTarget, Error, MetadataError,
};
use ormkit::metadata::EntityMetadataGraph;

#[derive(Debug, Default)]
struct MockDriver {
    connects: AtomicUsize,
    disconnects: AtomicUsize,
    synchronized: AtomicUsize,
    fail_connect: AtomicBool,
    fail_disconnect: AtomicBool,
    fail_synchronize: AtomicBool,
}

impl MockDriver {
    fn failing_connect() -> Arc<Self> {
        let driver = Self::default();
        driver.fail_connect.store(true, Ordering::SeqCst);
        Arc::new(driver)
    }

    fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    fn synchronized(&self) -> usize {
        self.synchronized.load(Ordering::SeqCst)
    }
}

impl Driver for MockDriver {
    fn driver_type(&self) -> &str {
        "mock"
    }

    fn connect(&self) -> BoxFuture<'_, Result<(), DriverError>> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            if self.fail_connect.load(Ordering::SeqCst) {
                return Err(DriverError::Connection("refused".to_string()));
            }
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn disconnect(&self) -> BoxFuture<'_, Result<(), DriverError>> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            self.disconnects.fetch_add(1, Ordering::SeqCst);
            if self.fail_disconnect.load(Ordering::SeqCst) {
                return Err(DriverError::Disconnect("socket gone".to_string()));
            }
            Ok(())
        })
    }

    fn synchronize<'a>(
        &'a self,
        metadata: &'a EntityMetadataGraph,
    ) -> BoxFuture<'a, Result<(), DriverError>> {
        Box::pin(async move {
            if self.fail_synchronize.load(Ordering::SeqCst) {
                return Err(DriverError::Synchronize(format!(
                    "cannot create {}",
                    metadata.table_names().join(", ")
                )));
            }
            self.synchronized.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}

/// Prefixes table names, otherwise the default convention.
#[derive(Debug)]
struct Prefixed;

impl NamingStrategy for Prefixed {
    fn table_name(&self, class_name: &str, custom_name: Option<&str>) -> String {
        format!("app_{}", DefaultNamingStrategy.table_name(class_name, custom_name))
    }
    fn column_name(&self, property_name: &str, custom_name: Option<&str>) -> String {
        DefaultNamingStrategy.column_name(property_name, custom_name)
    }
    fn embedded_column_name(
        &self,
        prefix: &str,
        property_name: &str,
        custom_name: Option<&str>,
    ) -> String {
        DefaultNamingStrategy.embedded_column_name(prefix, property_name, custom_name)
    }
    fn relation_name(&self, property_name: &str) -> String {
        DefaultNamingStrategy.relation_name(property_name)
    }
    fn index_name(&self, custom_name: Option<&str>, table_name: &str, columns: &[String]) -> String {
        DefaultNamingStrategy.index_name(custom_name, table_name, columns)
    }
    fn join_column_name(&self, relation_name: &str, referenced_column_name: &str) -> String {
        DefaultNamingStrategy.join_column_name(relation_name, referenced_column_name)
    }
    fn join_table_name(
        &self,
        first_table_name: &str,
        second_table_name: &str,
        first_property_name: &str,
        second_property_name: Option<&str>,
    ) -> String {
        DefaultNamingStrategy.join_table_name(
            first_table_name,
            second_table_name,
            first_property_name,
            second_property_name,
        )
    }
    fn join_key_column_name(&self, table_name: &str, column_name: &str) -> String {
        DefaultNamingStrategy.join_key_column_name(table_name, column_name)
    }
    fn class_table_inheritance_parent_column_name(
        &self,
        parent_table_name: &str,
        parent_table_id_property_name: &str,
    ) -> String {
        DefaultNamingStrategy
            .class_table_inheritance_parent_column_name(parent_table_name, parent_table_id_property_name)
    }
    fn closure_junction_table_name(&self, table_name: &str) -> String {
        DefaultNamingStrategy.closure_junction_table_name(table_name)
    }
    fn discriminator_column_name(&self) -> String {
        DefaultNamingStrategy.discriminator_column_name()
    }
}

fn blog_storage() -> MetadataArgsStorage {
    let mut storage = MetadataArgsStorage::new();
    storage.add(TableArgs::new("User"));
    storage.add(ColumnArgs::primary_generated("User", "id"));
    storage.add(ColumnArgs::new("User", "name", ColumnType::String));
    storage.add(RelationArgs::one_to_many("User", "posts", "Post").with_inverse("author"));
    storage.add(TableArgs::new("Post"));
    storage.add(ColumnArgs::primary_generated("Post", "id"));
    storage.add(ColumnArgs::new("Post", "title", ColumnType::String));
    storage.add(RelationArgs::many_to_one("Post", "author", "User").with_inverse("posts"));
    storage
}

fn options(name: &str) -> ConnectionOptions {
    ConnectionOptions::new(DriverOptions::new("mock"))
        .with_name(name)
        .with_entities(["User", "Post"])
}

#[tokio::test]
async fn test_connect_resolves_metadata() {
    let storage = blog_storage();
    let driver = Arc::new(MockDriver::default());
    let connection = Connection::new(options("default"), driver.clone());
    assert_eq!(connection.state(), ConnectionState::Disconnected);

    connection.connect(&storage).await.unwrap();

    assert_eq!(connection.state(), ConnectionState::Connected);
    assert_eq!(driver.connects(), 1);
    let graph = connection.metadata().unwrap();
    assert_eq!(graph.table_names(), vec!["user", "post"]);
    assert_eq!(connection.entity_metadata("Post").unwrap().table_name, "post");
    assert!(connection.has_metadata("User"));
}

#[tokio::test]
async fn test_unknown_entity_lookup() {
    let storage = blog_storage();
    let connection = Connection::new(options("default"), Arc::new(MockDriver::default()));
    connection.connect(&storage).await.unwrap();

    let err = connection.entity_metadata("Ghost").unwrap_err();
    assert!(matches!(err, Error::Metadata(MetadataError::NotFound(name)) if name == "Ghost"));
}

#[tokio::test]
async fn test_metadata_failure_leaves_driver_untouched() {
    let mut storage = blog_storage();
    storage.add(TableArgs::new("Tag"));
    storage.add(ColumnArgs::new("Tag", "label", ColumnType::String));

    let driver = Arc::new(MockDriver::default());
    let connection = Connection::new(options("default").with_entity("Tag"), driver.clone());

    let err = connection.connect(&storage).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Metadata(MetadataError::MissingPrimaryKey { .. })
    ));
    assert_eq!(driver.connects(), 0);
    assert_eq!(connection.state(), ConnectionState::Disconnected);
    assert!(matches!(connection.metadata(), Err(Error::NotConnected(_))));
}

#[tokio::test]
async fn test_driver_failure_discards_metadata() {
    let storage = blog_storage();
    let connection = Connection::new(options("default"), MockDriver::failing_connect());

    let err = connection.connect(&storage).await.unwrap_err();
    assert!(matches!(err, Error::Driver(DriverError::Connection(_))));
    assert!(!connection.is_connected());
    assert!(!connection.has_metadata("User"));
}

#[tokio::test]
async fn test_connect_twice() {
    let storage = blog_storage();
    let driver = Arc::new(MockDriver::default());
    let connection = Connection::new(options("default"), driver.clone());
    connection.connect(&storage).await.unwrap();

    let err = connection.connect(&storage).await.unwrap_err();
    assert!(matches!(err, Error::AlreadyConnected(name) if name == "default"));
    assert_eq!(driver.connects(), 1);
}

#[tokio::test]
async fn test_concurrent_connect_and_close() {
    let storage = blog_storage();
    let driver = Arc::new(MockDriver::default());
    let connection = Connection::new(options("default"), driver.clone());

    let (a, b) = tokio::join!(connection.connect(&storage), connection.connect(&storage));
    assert!(a.is_ok() != b.is_ok());
    assert!(matches!(a.and(b), Err(Error::AlreadyConnected(_))));
    assert_eq!(driver.connects(), 1);
    assert!(connection.is_connected());

    let (a, b) = tokio::join!(connection.close(), connection.close());
    assert!(a.is_ok() != b.is_ok());
    assert!(matches!(a.and(b), Err(Error::NotConnected(_))));
    assert_eq!(driver.disconnects(), 1);
    assert_eq!(connection.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn test_driver_failure_allows_retry() {
    let storage = blog_storage();
    let driver = MockDriver::failing_connect();
    let connection = Connection::new(options("default"), driver.clone());

    assert!(connection.connect(&storage).await.is_err());
    assert_eq!(connection.state(), ConnectionState::Disconnected);

    driver.fail_connect.store(false, Ordering::SeqCst);
    connection.connect(&storage).await.unwrap();
    assert!(connection.is_connected());
}

#[tokio::test]
async fn test_synchronize_on_connect() {
    let storage = blog_storage();
    let plain = Arc::new(MockDriver::default());
    Connection::new(options("plain"), plain.clone())
        .connect(&storage)
        .await
        .unwrap();
    assert_eq!(plain.synchronized(), 0);

    let syncing = Arc::new(MockDriver::default());
    let connection = Connection::new(options("sync").with_synchronize(true), syncing.clone());
    connection.connect(&storage).await.unwrap();
    assert_eq!(syncing.synchronized(), 1);
    assert!(connection.is_connected());
}

#[tokio::test]
async fn test_synchronize_failure_disconnects() {
    let storage = blog_storage();
    let driver = Arc::new(MockDriver::default());
    driver.fail_synchronize.store(true, Ordering::SeqCst);
    let connection = Connection::new(options("sync").with_synchronize(true), driver.clone());

    let err = connection.connect(&storage).await.unwrap_err();
    assert!(matches!(err, Error::Driver(DriverError::Synchronize(msg)) if msg.contains("user")));
    assert_eq!(driver.connects(), 1);
    assert_eq!(driver.disconnects(), 1);
    assert_eq!(connection.state(), ConnectionState::Disconnected);
    assert!(!connection.has_metadata("User"));
}

#[tokio::test]
async fn test_close_and_reconnect() {
    let storage = blog_storage();
    let driver = Arc::new(MockDriver::default());
    let connection = Connection::new(options("default"), driver.clone());
    connection.connect(&storage).await.unwrap();

    connection.close().await.unwrap();
    assert_eq!(connection.state(), ConnectionState::Closed);
    assert_eq!(driver.disconnects(), 1);
    assert!(matches!(connection.metadata(), Err(Error::NotConnected(_))));
    assert!(matches!(connection.close().await, Err(Error::NotConnected(_))));

    connection.connect(&storage).await.unwrap();
    assert!(connection.is_connected());
    assert_eq!(driver.connects(), 2);
}

#[tokio::test]
async fn test_close_when_disconnect_fails() {
    let storage = blog_storage();
    let driver = Arc::new(MockDriver::default());
    driver.fail_disconnect.store(true, Ordering::SeqCst);
    let connection = Connection::new(options("default"), driver.clone());
    connection.connect(&storage).await.unwrap();

    let err = connection.close().await.unwrap_err();
    assert!(matches!(err, Error::Driver(DriverError::Disconnect(_))));
    assert_eq!(connection.state(), ConnectionState::Closed);
    assert!(!connection.has_metadata("User"));
}

#[tokio::test]
async fn test_connections_own_their_metadata() {
    let storage = blog_storage();
    let first = Connection::new(options("first"), Arc::new(MockDriver::default()));
    let second = Connection::new(options("second"), Arc::new(MockDriver::default()));
    first.connect(&storage).await.unwrap();
    second.connect(&storage).await.unwrap();

    let a = first.metadata().unwrap();
    let b = second.metadata().unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(*a, *b);
}

#[tokio::test]
async fn test_naming_strategy_choices() {
    let mut storage = blog_storage();
    storage.add(NamingStrategyArgs::new("prefixed", Arc::new(Prefixed)));

    let named = Connection::new(
        options("named").with_named_naming_strategy("prefixed"),
        Arc::new(MockDriver::default()),
    );
    named.connect(&storage).await.unwrap();
    assert_eq!(named.entity_metadata("User").unwrap().table_name, "app_user");

    let instance = Connection::new(
        options("instance").with_naming_strategy(Arc::new(Prefixed)),
        Arc::new(MockDriver::default()),
    );
    instance.connect(&storage).await.unwrap();
    assert_eq!(instance.entity_metadata("Post").unwrap().table_name, "app_post");

    let driver = Arc::new(MockDriver::default());
    let unknown = Connection::new(
        options("unknown").with_named_naming_strategy("legacy"),
        driver.clone(),
    );
    let err = unknown.connect(&storage).await.unwrap_err();
    assert!(matches!(err, Error::InvalidOptions(_)));
    assert_eq!(driver.connects(), 0);
}

#[tokio::test]
async fn test_default_inheritance_from_options() {
    let mut storage = MetadataArgsStorage::new();
    storage.add(TableArgs::new("Content"));
    storage.add(ColumnArgs::primary_generated("Content", "id"));
    storage.add(TableArgs::single_table_child("Photo", "Content"));
    storage.add(ColumnArgs::new("Photo", "size", ColumnType::Int));

    let without = Connection::new(
        options("without").with_entities(["Content"]),
        Arc::new(MockDriver::default()),
    );
    assert!(matches!(
        without.connect(&storage).await,
        Err(Error::Metadata(MetadataError::InvalidDeclaration { .. }))
    ));

    let with = Connection::new(
        ConnectionOptions::new(DriverOptions::new("mock"))
            .with_name("with")
            .with_entity("Content")
            .with_default_inheritance(InheritanceStrategy::SingleTable),
        Arc::new(MockDriver::default()),
    );
    with.connect(&storage).await.unwrap();
    assert_eq!(with.entity_metadata("Photo").unwrap().table_name, "content");
}

#[tokio::test]
async fn test_subscribers_filtered_by_registration() {
    let mut storage = blog_storage();
    storage.add(EntitySubscriberArgs::new("AuditSubscriber"));
    storage.add(EntitySubscriberArgs::new("MailSubscriber"));

    let connection = Connection::new(
        options("default")
            .with_subscriber("AuditSubscriber")
            .with_subscriber("Unregistered"),
        Arc::new(MockDriver::default()),
    );
    connection.connect(&storage).await.unwrap();

    assert_eq!(
        connection.subscribers(),
        vec![EntityTarget::from("AuditSubscriber")]
    );
}

fn shared(storage: MetadataArgsStorage) -> Arc<RwLock<MetadataArgsStorage>> {
    Arc::new(RwLock::new(storage))
}

#[tokio::test]
async fn test_manager_create_and_get() {
    let manager = ConnectionManager::with_storage(shared(blog_storage()));
    let driver: Arc<dyn Driver> = Arc::new(MockDriver::default());

    manager.create(options("main"), driver.clone()).unwrap();
    manager.create(options("replica"), driver.clone()).unwrap();

    assert!(manager.has("main"));
    assert!(!manager.has("audit"));
    assert_eq!(manager.connection_names(), vec!["main", "replica"]);
    assert_eq!(manager.get("replica").unwrap().name(), "replica");
    assert!(matches!(
        manager.get("audit"),
        Err(Error::ConnectionNotFound(name)) if name == "audit"
    ));
    assert!(matches!(
        manager.create(options(""), driver),
        Err(Error::InvalidOptions(_))
    ));
}

#[tokio::test]
async fn test_manager_replaces_only_disconnected() {
    let manager = ConnectionManager::with_storage(shared(blog_storage()));

    let first = manager
        .create(options("main"), Arc::new(MockDriver::default()))
        .unwrap();
    let second = manager
        .create(options("main"), Arc::new(MockDriver::default()))
        .unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(manager.connection_names(), vec!["main"]);

    manager
        .create_and_connect(options("live"), Arc::new(MockDriver::default()))
        .await
        .unwrap();
    let err = manager
        .create(options("live"), Arc::new(MockDriver::default()))
        .unwrap_err();
    assert!(matches!(err, Error::AlreadyConnected(name) if name == "live"));
    assert!(manager.get("live").unwrap().is_connected());
}

#[tokio::test]
async fn test_manager_reads_current_storage() {
    let storage = shared(MetadataArgsStorage::new());
    let manager = ConnectionManager::with_storage(storage.clone());

    {
        let mut storage = storage.write();
        storage.add(TableArgs::new("User"));
        storage.add(ColumnArgs::primary_generated("User", "id"));
    }

    let connection = manager
        .create_and_connect(
            ConnectionOptions::new(DriverOptions::new("mock")).with_entity("User"),
            Arc::new(MockDriver::default()),
        )
        .await
        .unwrap();
    assert_eq!(connection.name(), "default");
    assert_eq!(connection.entity_metadata("User").unwrap().table_name, "user");
}

#[tokio::test]
async fn test_connect_to_all_resolves_before_connecting() {
    let mut storage = blog_storage();
    storage.add(TableArgs::new("Tag"));
    let manager = ConnectionManager::with_storage(shared(storage));

    let good = Arc::new(MockDriver::default());
    let bad = Arc::new(MockDriver::default());
    let err = manager
        .create_and_connect_to_all(vec![
            (options("good"), good.clone() as Arc<dyn Driver>),
            (options("bad").with_entity("Tag"), bad.clone() as Arc<dyn Driver>),
        ])
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Metadata(MetadataError::MissingPrimaryKey { .. })));
    assert_eq!(good.connects(), 0);
    assert_eq!(bad.connects(), 0);
    assert!(!manager.get("good").unwrap().is_connected());
}

#[tokio::test]
async fn test_connect_to_all_and_close_all() {
    let manager = ConnectionManager::with_storage(shared(blog_storage()));
    let drivers: Vec<Arc<MockDriver>> = (0..3).map(|_| Arc::new(MockDriver::default())).collect();

    let connections = manager
        .create_and_connect_to_all(
            ["a", "b", "c"]
                .into_iter()
                .zip(&drivers)
                .map(|(name, driver)| (options(name), driver.clone() as Arc<dyn Driver>))
                .collect(),
        )
        .await
        .unwrap();
    assert!(connections.iter().all(|c| c.is_connected()));
    assert!(drivers.iter().all(|d| d.connects() == 1));

    drivers[1].fail_disconnect.store(true, Ordering::SeqCst);
    let err = manager.close_all().await.unwrap_err();
    assert!(matches!(err, Error::Driver(DriverError::Disconnect(_))));
    assert!(connections
        .iter()
        .all(|c| c.state() == ConnectionState::Closed));
    assert!(drivers.iter().all(|d| d.disconnects() == 1));

    manager.close_all().await.unwrap();
}

#[tokio::test]
async fn test_connect_to_all_rejects_duplicate_names() {
    let manager = ConnectionManager::with_storage(shared(blog_storage()));
    let first = Arc::new(MockDriver::default());
    let second = Arc::new(MockDriver::default());

    let err = manager
        .create_and_connect_to_all(vec![
            (options("dup"), first.clone() as Arc<dyn Driver>),
            (options("dup"), second.clone() as Arc<dyn Driver>),
        ])
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidOptions(_)));
    assert_eq!(first.connects() + second.connects(), 0);
    assert!(manager.connection_names().is_empty());
}

#[tokio::test]
async fn test_connect_to_all_validates_before_registering() {
    let manager = ConnectionManager::with_storage(shared(blog_storage()));

    let err = manager
        .create_and_connect_to_all(vec![
            (options("main"), Arc::new(MockDriver::default()) as Arc<dyn Driver>),
            (options(" "), Arc::new(MockDriver::default()) as Arc<dyn Driver>),
        ])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidOptions(_)));
    assert!(!manager.has("main"));

    manager
        .create_and_connect(options("live"), Arc::new(MockDriver::default()))
        .await
        .unwrap();
    let err = manager
        .create_and_connect_to_all(vec![
            (options("extra"), Arc::new(MockDriver::default()) as Arc<dyn Driver>),
            (options("live"), Arc::new(MockDriver::default()) as Arc<dyn Driver>),
        ])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AlreadyConnected(name) if name == "live"));
    assert!(!manager.has("extra"));
}
