//! # Core Type Definitions
//!
//! Shared value types for the semantic hypergraph store:
//! - Attribute values (`AttributeValue`)
//! - Per-call options (`AddOptions`, `RemoveOptions`, `StarOptions`)
//! - Store statistics (`StoreCounts`)
//! - Error types (`HypergraphError`)
//!
//! Entities themselves live in [`crate::entity`].

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// ATTRIBUTE VALUES
// =============================================================================

/// Typed value of a per-entity attribute.
///
/// Attributes are independent of structural identity: two stores holding the
/// same entity may carry entirely different attributes for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Str(String),
    Int(i64),
    Float(f64),
}

/// Direction of an atomic counter update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Up,
    Down,
}

impl AttributeValue {
    /// Apply a counter step to the current value of attribute `name`.
    ///
    /// An absent attribute starts from `Int(0)`. Integers use saturating
    /// arithmetic; floats move by `1.0`. String attributes cannot be counted.
    #[allow(clippy::float_arithmetic)]
    pub fn stepped(current: Option<&Self>, name: &str, step: Step) -> Result<Self> {
        match (current, step) {
            (None, Step::Up) => Ok(Self::Int(1)),
            (None, Step::Down) => Ok(Self::Int(-1)),
            (Some(Self::Int(v)), Step::Up) => Ok(Self::Int(v.saturating_add(1))),
            (Some(Self::Int(v)), Step::Down) => Ok(Self::Int(v.saturating_sub(1))),
            (Some(Self::Float(v)), Step::Up) => Ok(Self::Float(v + 1.0)),
            (Some(Self::Float(v)), Step::Down) => Ok(Self::Float(v - 1.0)),
            (Some(Self::Str(_)), _) => Err(HypergraphError::AttributeType {
                name: name.to_string(),
                found: "string",
            }),
        }
    }

    /// Name of the variant, used in error messages and JSON output.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
        }
    }

    /// String view. Numbers are rendered with their `Display` form.
    #[must_use]
    pub fn as_string(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            Self::Int(v) => v.to_string(),
            Self::Float(v) => v.to_string(),
        }
    }

    /// Integer view. Strings are parsed; floats are truncated toward zero.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Str(s) => s.trim().parse().ok(),
            Self::Int(v) => Some(*v),
            Self::Float(v) if v.is_finite() => Some(*v as i64),
            Self::Float(_) => None,
        }
    }

    /// Float view. Strings are parsed.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Str(s) => s.trim().parse().ok(),
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

// =============================================================================
// PER-CALL OPTIONS
// =============================================================================

/// Options for adding an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOptions {
    /// Primary entities count toward degrees. Children of an added edge are
    /// always inserted non-primary, whatever this flag says.
    pub primary: bool,
}

impl Default for AddOptions {
    fn default() -> Self {
        Self { primary: true }
    }
}

impl AddOptions {
    #[must_use]
    pub const fn non_primary() -> Self {
        Self { primary: false }
    }
}

/// How deep removal treats sub-edges that other stored edges still contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeepRemoval {
    /// Delete every sub-edge, shared or not. Surviving edges may be left
    /// with children that are no longer stored.
    #[default]
    Unconditional,
    /// Skip any sub-edge that is still a direct child of a stored edge after
    /// its parent has gone.
    KeepShared,
}

/// Options for removing an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RemoveOptions {
    /// Also remove every sub-edge contained at any depth.
    pub deep: bool,
    /// Sharing policy applied when `deep` is set.
    pub sharing: DeepRemoval,
}

impl RemoveOptions {
    #[must_use]
    pub const fn deep() -> Self {
        Self {
            deep: true,
            sharing: DeepRemoval::Unconditional,
        }
    }
}

/// Options for star queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StarOptions {
    /// Maximum number of edges returned. `None` means unbounded.
    pub limit: Option<usize>,
}

impl StarOptions {
    #[must_use]
    pub const fn limited(limit: usize) -> Self {
        Self { limit: Some(limit) }
    }
}

// =============================================================================
// STORE COUNTS
// =============================================================================

/// Cardinalities of a store, split by kind and primary flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoreCounts {
    pub atoms: usize,
    pub edges: usize,
    pub primary_atoms: usize,
    pub primary_edges: usize,
}

impl StoreCounts {
    /// Total number of stored entities.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.atoms.saturating_add(self.edges)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised by the hypergraph store.
///
/// Absence is never an error: missing entities show up as `false`, empty
/// sequences or caller-supplied defaults.
#[derive(Debug, Error)]
pub enum HypergraphError {
    /// Malformed textual entity or pattern.
    #[error("Parse error at byte {position}: {message}")]
    Parse { message: String, position: usize },

    /// The backend does not implement a required store operation.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    /// Pattern syntax (wildcards, `...`) used where a persisted entity is required.
    #[error("Invalid entity: {0}")]
    InvalidEntity(String),

    /// An edge was inserted before one of its children.
    #[error("Dangling child {child} in edge {edge}")]
    DanglingChild { edge: String, child: String },

    /// A counter operation was applied to a non-numeric attribute.
    #[error("Attribute '{name}' holds a {found}, not a number")]
    AttributeType { name: String, found: &'static str },

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Storage backend I/O failure.
    #[error("I/O error: {0}")]
    Io(String),

    /// Invalid store or application configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl HypergraphError {
    /// Build a parse error at the given byte offset.
    pub fn parse(message: impl Into<String>, position: usize) -> Self {
        Self::Parse {
            message: message.into(),
            position,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HypergraphError>;

// =============================================================================
// TESTS
// =============================================================================
