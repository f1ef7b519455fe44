//! Connection records and the connection registry
//!
//! A connection is a named reference to an object-storage endpoint:
//! credentials, region, and optional starting point in the namespace. The
//! engine only ever consumes a resolved record; persistence goes through
//! the [`ConnectionStore`] collaborator, of which [`ConnectionRegistry`] is
//! the TOML-backed implementation shipped here.

use serde::{Deserialize, Serialize};

use crate::config::ConfigManager;
use crate::error::{Error, Result};

/// Storage backend family a connection speaks to.
///
/// Dispatch on this happens at connection-resolution time; adding a backend
/// means a new variant and adapter, not new call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// S3-compatible endpoint (AWS, MinIO, RustFS, ...)
    #[default]
    S3,
}

/// A connection to an object-storage endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    /// Unique identifier; identity for registry operations
    pub id: String,

    /// Display name
    pub name: String,

    /// Backend family
    #[serde(default)]
    pub backend: BackendKind,

    /// Endpoint URL
    pub endpoint: String,

    /// Region
    #[serde(default = "default_region")]
    pub region: String,

    /// Access key ID
    pub access_key: String,

    /// Secret access key
    pub secret_key: String,

    /// Bucket to open when a session starts, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_bucket: Option<String>,

    /// Prefix to open when a session starts
    #[serde(default)]
    pub default_prefix: String,

    /// Use path-style bucket addressing (required by most self-hosted
    /// S3-compatible endpoints)
    #[serde(default = "default_true")]
    pub path_style: bool,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_true() -> bool {
    true
}

impl Connection {
    /// Create a connection with required fields and defaults for the rest
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        endpoint: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            backend: BackendKind::S3,
            endpoint: endpoint.into(),
            region: default_region(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            default_bucket: None,
            default_prefix: String::new(),
            path_style: true,
        }
    }
}

/// Persistence collaborator the engine resolves connections through.
///
/// Implemented by [`ConnectionRegistry`] for on-disk storage and by
/// in-memory stores in tests.
pub trait ConnectionStore: Send + Sync {
    /// Look up a connection by id
    fn get(&self, id: &str) -> Result<Connection>;

    /// List all stored connections
    fn list(&self) -> Result<Vec<Connection>>;
}

/// TOML-backed connection registry
pub struct ConnectionRegistry {
    config_manager: ConfigManager,
}

impl ConnectionRegistry {
    /// Create a registry over a specific ConfigManager
    pub fn with_config_manager(config_manager: ConfigManager) -> Self {
        Self { config_manager }
    }

    /// Create a registry at the default config location
    pub fn new() -> Result<Self> {
        let config_manager = ConfigManager::new()?;
        Ok(Self { config_manager })
    }

    /// Add or update a connection, matching on id
    pub fn set(&self, connection: Connection) -> Result<()> {
        let mut config = self.config_manager.load()?;

        config.connections.retain(|c| c.id != connection.id);
        config.connections.push(connection);

        self.config_manager.save(&config)
    }

    /// Remove a connection by id
    pub fn remove(&self, id: &str) -> Result<()> {
        let mut config = self.config_manager.load()?;
        let original_len = config.connections.len();

        config.connections.retain(|c| c.id != id);

        if config.connections.len() == original_len {
            return Err(Error::ConnectionNotFound(id.to_string()));
        }

        self.config_manager.save(&config)
    }

    /// Check whether a connection id exists
    pub fn exists(&self, id: &str) -> Result<bool> {
        let config = self.config_manager.load()?;
        Ok(config.connections.iter().any(|c| c.id == id))
    }
}

impl ConnectionStore for ConnectionRegistry {
    fn get(&self, id: &str) -> Result<Connection> {
        let config = self.config_manager.load()?;
        config
            .connections
            .into_iter()
            .find(|c| c.id == id)
            .ok_or_else(|| Error::ConnectionNotFound(id.to_string()))
    }

    fn list(&self) -> Result<Vec<Connection>> {
        let config = self.config_manager.load()?;
        Ok(config.connections)
    }
}
