//! # Application Configuration
//!
//! Optional TOML file holding the store settings and the HTTP server
//! settings. Command-line flags override whatever the file says.
//!
//! ```toml
//! [store]
//! backend = "redb"
//! path = "knowledge.db"
//! primary_policy = "preserve"
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! ```

use semgraph_core::{BackendKind, HypergraphError, StoreConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Maximum accepted request body (2 MB).
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub body_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl ServerConfig {
    /// `host:port` string for binding.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Whole application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, HypergraphError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            HypergraphError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, HypergraphError> {
        let config: AppConfig = toml::from_str(content)
            .map_err(|e| HypergraphError::Config(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// File configuration when a path is given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, HypergraphError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Apply command-line overrides on top of the loaded values.
    #[must_use]
    pub fn with_overrides(
        mut self,
        database: Option<PathBuf>,
        backend: Option<BackendKind>,
    ) -> Self {
        if let Some(backend) = backend {
            self.store.backend = backend;
        }
        if let Some(database) = database {
            self.store.path = Some(database);
        }
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), HypergraphError> {
        if self.server.host.trim().is_empty() {
            return Err(HypergraphError::Config(
                "server.host must not be empty".into(),
            ));
        }
        if self.server.body_limit == 0 {
            return Err(HypergraphError::Config(
                "server.body_limit must be greater than 0".into(),
            ));
        }
        self.store.validate()
    }
}

// =============================================================================
// TESTS
// =============================================================================
