//! Pool configuration.
//!
//! A [`PoolConfig`] carries the connection target and the capacity of the
//! pool. It is handed to [`ResourcePool::initialize`](crate::ResourcePool::initialize)
//! once and never changes afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading or validating a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        /// Path that was being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The configuration document is not valid TOML or has unknown keys
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration parsed but holds values the pool cannot use
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for a resource pool
///
/// Every field falls back to its default when missing from a document, so a
/// partial file only overrides what it names.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolConfig {
    /// Database host
    pub host: String,

    /// Database port
    pub port: u16,

    /// User name used by every pooled connection
    pub username: String,

    /// Password used by every pooled connection
    pub password: String,

    /// Database name
    pub database: String,

    /// Number of slots in the pool
    pub max_connections: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            username: "admin".to_string(),
            password: "admin".to_string(),
            database: "mydb".to_string(),
            max_connections: 10,
        }
    }
}

impl PoolConfig {
    /// Create a configuration with the default target and the given capacity
    pub fn new(max_connections: usize) -> Self {
        Self {
            max_connections,
            ..Self::default()
        }
    }

    /// Set the host
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the user name and password
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Set the database name
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Parse a configuration from a TOML document.
    ///
    /// The result is not validated; call [`PoolConfig::validate`] or let
    /// `initialize` do it.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load and validate a configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_toml_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "max_connections must be at least 1".to_string(),
            ));
        }

        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host cannot be empty".to_string()));
        }

        if self.port == 0 {
            return Err(ConfigError::Invalid("port cannot be zero".to_string()));
        }

        if self.database.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "database cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Connection target as a URL, without the password
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}@{}:{}/{}",
            self.username, self.host, self.port, self.database
        )
    }
}

impl fmt::Debug for PoolConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}
