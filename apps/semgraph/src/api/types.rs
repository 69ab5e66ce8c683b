//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API. Entities and
//! patterns travel as their textual form, e.g. `"(is/pd sky/c blue/c)"`.

use semgraph_core::{AttributeValue, Entity, HypergraphError, StoreCounts};
use serde::{Deserialize, Serialize};

/// Upper bound on entities returned by a single list query.
pub const MAX_RESULTS: usize = 10_000;

fn default_true() -> bool {
    true
}

/// Parse an entity field, naming the field in the error.
pub fn parse_entity(field: &str, text: &str) -> Result<Entity, HypergraphError> {
    if text.trim().is_empty() {
        return Err(HypergraphError::parse(format!("'{}' must not be empty", field), 0));
    }
    Entity::parse(text)
}

/// Clamp a requested limit to [`MAX_RESULTS`].
#[must_use]
pub fn effective_limit(requested: Option<usize>) -> usize {
    requested.unwrap_or(MAX_RESULTS).min(MAX_RESULTS)
}

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Store status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub name: String,
    pub backend: String,
    pub atoms: usize,
    pub edges: usize,
    pub primary_atoms: usize,
    pub primary_edges: usize,
}

impl StatusResponse {
    pub fn new(name: impl Into<String>, backend: impl Into<String>, counts: StoreCounts) -> Self {
        Self {
            name: name.into(),
            backend: backend.into(),
            atoms: counts.atoms,
            edges: counts.edges,
            primary_atoms: counts.primary_atoms,
            primary_edges: counts.primary_edges,
        }
    }
}

// =============================================================================
// ENTITY REQUESTS
// =============================================================================

/// Add an entity. Children are added non-primary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddRequest {
    pub entity: String,
    #[serde(default = "default_true")]
    pub primary: bool,
}

/// Remove an entity, optionally with its sub-edges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveRequest {
    pub entity: String,
    #[serde(default)]
    pub deep: bool,
    #[serde(default)]
    pub keep_shared: bool,
}

/// A request naming a single entity (`/exists`, `/ego`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRequest {
    pub entity: String,
}

/// Containing edges of an entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StarRequest {
    pub entity: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Degree of an entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DegreeRequest {
    pub entity: String,
    #[serde(default)]
    pub deep: bool,
}

/// Pattern query or pattern removal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternRequest {
    pub pattern: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

// =============================================================================
// ENTITY RESPONSES
// =============================================================================

/// Result of `/add`, `/remove` and `/exists`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityResponse {
    pub success: bool,
    pub entity: Option<String>,
    /// Stored after `/add`, removed by `/remove`, present for `/exists`.
    pub found: bool,
    pub primary: bool,
    pub error: Option<String>,
}

impl EntityResponse {
    pub fn success(entity: &Entity, found: bool, primary: bool) -> Self {
        Self {
            success: true,
            entity: Some(entity.to_string()),
            found,
            primary,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            entity: None,
            found: false,
            primary: false,
            error: Some(msg.into()),
        }
    }
}

/// Result of `/match`, `/star` and `/ego`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    pub success: bool,
    pub entities: Vec<String>,
    pub error: Option<String>,
}

impl ListResponse {
    pub fn with_entities<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        Self {
            success: true,
            entities: items.into_iter().map(|e| e.to_string()).collect(),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            entities: vec![],
            error: Some(msg.into()),
        }
    }
}

/// Result of `/degree`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DegreeResponse {
    pub success: bool,
    pub degree: usize,
    pub deep: bool,
    pub error: Option<String>,
}

impl DegreeResponse {
    pub fn success(degree: usize, deep: bool) -> Self {
        Self {
            success: true,
            degree,
            deep,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            degree: 0,
            deep: false,
            error: Some(msg.into()),
        }
    }
}

/// Result of `/remove_pattern`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemovePatternResponse {
    pub success: bool,
    pub removed: usize,
    pub error: Option<String>,
}

impl RemovePatternResponse {
    pub fn success(removed: usize) -> Self {
        Self {
            success: true,
            removed,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            removed: 0,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// ATTRIBUTES
// =============================================================================

/// Attribute value as plain JSON: number or string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeJson {
    Int(i64),
    Float(f64),
    Str(String),
}

impl From<AttributeValue> for AttributeJson {
    fn from(value: AttributeValue) -> Self {
        match value {
            AttributeValue::Int(v) => Self::Int(v),
            AttributeValue::Float(v) => Self::Float(v),
            AttributeValue::Str(v) => Self::Str(v),
        }
    }
}

impl From<AttributeJson> for AttributeValue {
    fn from(value: AttributeJson) -> Self {
        match value {
            AttributeJson::Int(v) => Self::Int(v),
            AttributeJson::Float(v) => Self::Float(v),
            AttributeJson::Str(v) => Self::Str(v),
        }
    }
}

/// Attribute operation (tagged union).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum AttributeRequest {
    Get {
        entity: String,
        name: String,
    },
    Set {
        entity: String,
        name: String,
        value: AttributeJson,
    },
    Inc {
        entity: String,
        name: String,
    },
    Dec {
        entity: String,
        name: String,
    },
}

impl AttributeRequest {
    /// Entity text the operation applies to.
    pub fn entity(&self) -> &str {
        match self {
            Self::Get { entity, .. }
            | Self::Set { entity, .. }
            | Self::Inc { entity, .. }
            | Self::Dec { entity, .. } => entity,
        }
    }

    /// Attribute name.
    pub fn name(&self) -> &str {
        match self {
            Self::Get { name, .. }
            | Self::Set { name, .. }
            | Self::Inc { name, .. }
            | Self::Dec { name, .. } => name,
        }
    }
}

/// Result of `/attribute`. `value` is `None` when the attribute or the
/// entity is absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeResponse {
    pub success: bool,
    pub value: Option<AttributeJson>,
    pub error: Option<String>,
}

impl AttributeResponse {
    pub fn success(value: Option<AttributeValue>) -> Self {
        Self {
            success: true,
            value: value.map(AttributeJson::from),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            value: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// EXPORT RESPONSE
// =============================================================================

/// Export response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResponse {
    pub success: bool,
    pub data: Option<String>, // Base64 encoded
    pub checksum: Option<u64>,
    pub entities: usize,
    pub error: Option<String>,
}

impl ExportResponse {
    pub fn success(data: Vec<u8>, checksum: u64, entities: usize) -> Self {
        Self {
            success: true,
            data: Some(base64::Engine::encode(
                &base64::engine::general_purpose::STANDARD,
                &data,
            )),
            checksum: Some(checksum),
            entities,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            checksum: None,
            entities: 0,
            error: Some(msg.into()),
        }
    }
}
