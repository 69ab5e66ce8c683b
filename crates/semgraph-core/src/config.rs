//! # Store Configuration
//!
//! Backend selection and store-wide policies. Applications usually embed
//! `StoreConfig` in their own configuration file (see the `semgraph` app).

use crate::types::{HypergraphError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which backend a store is opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Volatile, process-local storage.
    Memory,
    /// ACID-persistent storage in a redb file.
    #[default]
    Redb,
}

impl std::str::FromStr for BackendKind {
    type Err = HypergraphError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(Self::Memory),
            "redb" | "file" => Ok(Self::Redb),
            other => Err(HypergraphError::Config(format!(
                "unknown backend '{}' (expected 'memory' or 'redb')",
                other
            ))),
        }
    }
}

/// What happens to the primary flag when an existing entity is inserted again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryPolicy {
    /// Primary is sticky: a non-primary re-insert never demotes, a primary
    /// re-insert promotes.
    #[default]
    Preserve,
    /// The most recent insert wins.
    Overwrite,
}

impl PrimaryPolicy {
    /// Primary flag after re-inserting an entity whose current flag is `current`.
    #[must_use]
    pub const fn resolve(self, current: bool, requested: bool) -> bool {
        match self {
            Self::Preserve => current || requested,
            Self::Overwrite => requested,
        }
    }
}

/// Configuration of a single store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: BackendKind,
    /// Database file. Required for `redb`, ignored for `memory`.
    pub path: Option<PathBuf>,
    /// Store name. Derived from the file stem when absent.
    pub name: Option<String>,
    pub primary_policy: PrimaryPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Redb,
            path: Some(PathBuf::from("semgraph.db")),
            name: None,
            primary_policy: PrimaryPolicy::Preserve,
        }
    }
}

impl StoreConfig {
    /// In-memory store with the given name.
    #[must_use]
    pub fn memory(name: impl Into<String>) -> Self {
        Self {
            backend: BackendKind::Memory,
            path: None,
            name: Some(name.into()),
            primary_policy: PrimaryPolicy::default(),
        }
    }

    /// redb store at `path`.
    #[must_use]
    pub fn redb(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: BackendKind::Redb,
            path: Some(path.into()),
            name: None,
            primary_policy: PrimaryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: PrimaryPolicy) -> Self {
        self.primary_policy = policy;
        self
    }

    /// Effective store name.
    #[must_use]
    pub fn resolved_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        self.path
            .as_deref()
            .and_then(|p| p.file_stem())
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "semgraph".to_string())
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.backend == BackendKind::Redb && self.path.is_none() {
            return Err(HypergraphError::Config(
                "the redb backend requires a database path".to_string(),
            ));
        }
        if self.name.as_deref().is_some_and(str::is_empty) {
            return Err(HypergraphError::Config(
                "store name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
