//! Connection options.

use crate::error::Error;
use ormkit_core::args::InheritanceStrategy;
use ormkit_core::{EntityTarget, NamingStrategy};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

/// Name used when a connection is not given one.
pub const DEFAULT_CONNECTION_NAME: &str = "default";

/// Options of the database driver.
#[derive(Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DriverOptions {
    /// Driver type, e.g. `postgres` or `sqlite`.
    #[serde(rename = "type")]
    pub driver_type: String,
    /// Connection URL; takes precedence over the discrete fields.
    pub url: Option<String>,
    /// Database host.
    pub host: Option<String>,
    /// Database port.
    pub port: Option<u16>,
    /// User name.
    pub username: Option<String>,
    /// Password.
    pub password: Option<String>,
    /// Database name.
    pub database: Option<String>,
    /// Driver-specific settings.
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DriverOptions {
    /// Create options for a driver type.
    pub fn new(driver_type: impl Into<String>) -> Self {
        Self {
            driver_type: driver_type.into(),
            ..Self::default()
        }
    }

    /// Set the connection URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set host and port.
    pub fn with_host(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = Some(host.into());
        self.port = Some(port);
        self
    }

    /// Set the credentials.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set the database name.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }
}

impl fmt::Debug for DriverOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverOptions")
            .field("driver_type", &self.driver_type)
            .field("url", &self.url)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("database", &self.database)
            .field("extra", &self.extra)
            .finish()
    }
}

/// What a connection logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    /// Log connects and closes.
    pub connection: bool,
    /// Log the resolved tables after each resolution pass.
    pub metadata: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            connection: true,
            metadata: false,
        }
    }
}

/// Naming strategy of a connection.
#[derive(Debug, Clone, Default)]
pub enum NamingStrategyChoice {
    /// [`ormkit_core::DefaultNamingStrategy`].
    #[default]
    Default,
    /// A strategy registered in the metadata storage under this name.
    Named(String),
    /// A strategy instance.
    Instance(Arc<dyn NamingStrategy>),
}

/// Options of one connection.
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    /// Connection name.
    pub name: String,

    /// Driver options.
    pub driver: DriverOptions,

    /// Entity types resolved for this connection.
    pub entities: Vec<EntityTarget>,

    /// Subscriber types attached to this connection.
    pub subscribers: Vec<EntityTarget>,

    /// Naming strategy.
    pub naming_strategy: NamingStrategyChoice,

    /// Inheritance strategy for hierarchies whose root declares none.
    pub default_inheritance: Option<InheritanceStrategy>,

    /// Synchronize the schema through the driver on connect.
    pub synchronize: bool,

    /// Logging flags.
    pub logging: LoggingOptions,
}

impl ConnectionOptions {
    /// Create options for the default connection.
    pub fn new(driver: DriverOptions) -> Self {
        Self {
            name: DEFAULT_CONNECTION_NAME.to_string(),
            driver,
            entities: Vec::new(),
            subscribers: Vec::new(),
            naming_strategy: NamingStrategyChoice::Default,
            default_inheritance: None,
            synchronize: false,
            logging: LoggingOptions::default(),
        }
    }

    /// Set the connection name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Add an entity type.
    pub fn with_entity(mut self, entity: impl Into<EntityTarget>) -> Self {
        self.entities.push(entity.into());
        self
    }

    /// Add entity types.
    pub fn with_entities<T: Into<EntityTarget>>(
        mut self,
        entities: impl IntoIterator<Item = T>,
    ) -> Self {
        self.entities.extend(entities.into_iter().map(Into::into));
        self
    }

    /// Add a subscriber type.
    pub fn with_subscriber(mut self, subscriber: impl Into<EntityTarget>) -> Self {
        self.subscribers.push(subscriber.into());
        self
    }

    /// Use a naming strategy instance.
    pub fn with_naming_strategy(mut self, strategy: Arc<dyn NamingStrategy>) -> Self {
        self.naming_strategy = NamingStrategyChoice::Instance(strategy);
        self
    }

    /// Use a naming strategy registered in the metadata storage.
    pub fn with_named_naming_strategy(mut self, name: impl Into<String>) -> Self {
        self.naming_strategy = NamingStrategyChoice::Named(name.into());
        self
    }

    /// Set the default inheritance strategy.
    pub fn with_default_inheritance(mut self, strategy: InheritanceStrategy) -> Self {
        self.default_inheritance = Some(strategy);
        self
    }

    /// Set the synchronize flag.
    pub fn with_synchronize(mut self, synchronize: bool) -> Self {
        self.synchronize = synchronize;
        self
    }

    /// Set the logging flags.
    pub fn with_logging(mut self, logging: LoggingOptions) -> Self {
        self.logging = logging;
        self
    }

    /// Check the options before a connection is created.
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidOptions(
                "connection name must not be empty".to_string(),
            ));
        }
        if self.driver.driver_type.trim().is_empty() {
            return Err(Error::InvalidOptions(format!(
                "connection '{}' has no driver type",
                self.name
            )));
        }
        if let NamingStrategyChoice::Named(name) = &self.naming_strategy {
            if name.trim().is_empty() {
                return Err(Error::InvalidOptions(format!(
                    "connection '{}' names an empty naming strategy",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ConnectionOptions::new(DriverOptions::new("postgres"));
        assert_eq!(options.name, DEFAULT_CONNECTION_NAME);
        assert!(options.entities.is_empty());
        assert!(matches!(options.naming_strategy, NamingStrategyChoice::Default));
        assert!(options.logging.connection);
        assert!(!options.logging.metadata);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_options_builder() {
        let options = ConnectionOptions::new(
            DriverOptions::new("postgres")
                .with_host("localhost", 5432)
                .with_credentials("app", "secret")
                .with_database("blog"),
        )
        .with_name("blog")
        .with_entities(["User", "Post"])
        .with_subscriber("AuditSubscriber")
        .with_default_inheritance(InheritanceStrategy::SingleTable)
        .with_synchronize(true);

        assert_eq!(options.name, "blog");
        assert_eq!(
            options.entities,
            vec![EntityTarget::from("User"), EntityTarget::from("Post")]
        );
        assert_eq!(options.subscribers, vec![EntityTarget::from("AuditSubscriber")]);
        assert_eq!(options.driver.port, Some(5432));
        assert_eq!(
            options.default_inheritance,
            Some(InheritanceStrategy::SingleTable)
        );
        assert!(options.synchronize);
    }

    #[test]
    fn test_validate_rejects_empty_fields() {
        let unnamed = ConnectionOptions::new(DriverOptions::new("sqlite")).with_name(" ");
        assert!(matches!(unnamed.validate(), Err(Error::InvalidOptions(_))));

        let no_driver = ConnectionOptions::new(DriverOptions::default());
        assert!(matches!(no_driver.validate(), Err(Error::InvalidOptions(_))));

        let empty_strategy = ConnectionOptions::new(DriverOptions::new("sqlite"))
            .with_named_naming_strategy("");
        assert!(matches!(
            empty_strategy.validate(),
            Err(Error::InvalidOptions(_))
        ));
    }

    #[test]
    fn test_driver_options_from_json() {
        let options: DriverOptions = serde_json::from_str(
            r#"{
                "type": "postgres",
                "host": "db.internal",
                "port": 5432,
                "username": "app",
                "password": "secret",
                "extra": { "ssl": true }
            }"#,
        )
        .unwrap();

        assert_eq!(options.driver_type, "postgres");
        assert_eq!(options.host.as_deref(), Some("db.internal"));
        assert_eq!(options.port, Some(5432));
        assert_eq!(options.database, None);
        assert_eq!(options.extra.get("ssl"), Some(&serde_json::Value::Bool(true)));
    }

    #[test]
    fn test_driver_options_debug_hides_password() {
        let options = DriverOptions::new("mysql").with_credentials("root", "hunter2");
        let debug = format!("{:?}", options);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_logging_options_from_json() {
        let logging: LoggingOptions = serde_json::from_str(r#"{ "metadata": true }"#).unwrap();
        assert!(logging.connection);
        assert!(logging.metadata);
    }
}
