//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Malformed input maps to 400, operations the backend lacks to 501 and
//! storage failures to 500. Absent entities are never an error.

use super::{
    AppState,
    types::{
        AddRequest, AttributeRequest, AttributeResponse, DegreeRequest, DegreeResponse,
        EntityRequest, EntityResponse, ExportResponse, HealthResponse, ListResponse,
        PatternRequest, RemovePatternResponse, RemoveRequest, StarRequest, StatusResponse,
        effective_limit, parse_entity,
    },
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use semgraph_core::{
    AddOptions, DeepRemoval, Hypergraph, HypergraphError, HypergraphExt, RemoveOptions,
    StarOptions,
    formats::{Snapshot, snapshot_to_bytes},
};

/// HTTP status for a store error.
pub fn error_status(error: &HypergraphError) -> StatusCode {
    match error {
        HypergraphError::Parse { .. }
        | HypergraphError::InvalidEntity(_)
        | HypergraphError::DanglingChild { .. }
        | HypergraphError::AttributeType { .. }
        | HypergraphError::Config(_) => StatusCode::BAD_REQUEST,
        HypergraphError::UnsupportedOperation(_) => StatusCode::NOT_IMPLEMENTED,
        HypergraphError::Serialization(_) | HypergraphError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

// =============================================================================
// HEALTH / STATUS
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Get store status.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.store.read().await;
    match store.counts() {
        Ok(counts) => {
            let backend = format!("{:?}", store.backend()).to_lowercase();
            (
                StatusCode::OK,
                Json(serde_json::json!(StatusResponse::new(
                    store.name(),
                    backend,
                    counts
                ))),
            )
        }
        Err(e) => (
            error_status(&e),
            Json(serde_json::json!({ "success": false, "error": e.to_string() })),
        ),
    }
}

// =============================================================================
// ENTITY HANDLERS
// =============================================================================

/// Add an entity.
pub async fn add_handler(
    State(state): State<AppState>,
    Json(request): Json<AddRequest>,
) -> impl IntoResponse {
    let entity = match parse_entity("entity", &request.entity) {
        Ok(e) => e,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(EntityResponse::error(format!("Invalid entity: {}", e))),
            );
        }
    };

    let mut store = state.store.write().await;
    let options = AddOptions {
        primary: request.primary,
    };
    match store
        .add_with(entity, options)
        .and_then(|added| store.is_primary(&added).map(|primary| (added, primary)))
    {
        Ok((added, primary)) => (
            StatusCode::OK,
            Json(EntityResponse::success(&added, true, primary)),
        ),
        Err(e) => (
            error_status(&e),
            Json(EntityResponse::error(format!("Add failed: {}", e))),
        ),
    }
}

/// Remove an entity.
pub async fn remove_handler(
    State(state): State<AppState>,
    Json(request): Json<RemoveRequest>,
) -> impl IntoResponse {
    let entity = match parse_entity("entity", &request.entity) {
        Ok(e) => e,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(EntityResponse::error(format!("Invalid entity: {}", e))),
            );
        }
    };

    let options = RemoveOptions {
        deep: request.deep,
        sharing: if request.keep_shared {
            DeepRemoval::KeepShared
        } else {
            DeepRemoval::Unconditional
        },
    };

    let mut store = state.store.write().await;
    match store.remove_with(&entity, options) {
        Ok(removed) => (
            StatusCode::OK,
            Json(EntityResponse::success(&entity, removed, false)),
        ),
        Err(e) => (
            error_status(&e),
            Json(EntityResponse::error(format!("Remove failed: {}", e))),
        ),
    }
}

/// Existence check.
pub async fn exists_handler(
    State(state): State<AppState>,
    Json(request): Json<EntityRequest>,
) -> impl IntoResponse {
    let entity = match parse_entity("entity", &request.entity) {
        Ok(e) => e,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(EntityResponse::error(format!("Invalid entity: {}", e))),
            );
        }
    };

    let store = state.store.read().await;
    let result = store.exists(&entity).and_then(|exists| {
        let primary = exists && store.is_primary(&entity)?;
        Ok((exists, primary))
    });
    match result {
        Ok((exists, primary)) => (
            StatusCode::OK,
            Json(EntityResponse::success(&entity, exists, primary)),
        ),
        Err(e) => (
            error_status(&e),
            Json(EntityResponse::error(format!("Lookup failed: {}", e))),
        ),
    }
}

// =============================================================================
// QUERY HANDLERS
// =============================================================================

/// Pattern query.
pub async fn match_handler(
    State(state): State<AppState>,
    Json(request): Json<PatternRequest>,
) -> impl IntoResponse {
    let store = state.store.read().await;
    match store.match_all(&request.pattern) {
        Ok(found) => (
            StatusCode::OK,
            Json(ListResponse::with_entities(
                found.take(effective_limit(request.limit)),
            )),
        ),
        Err(e) => (
            error_status(&e),
            Json(ListResponse::error(format!("Match failed: {}", e))),
        ),
    }
}

/// Edges directly containing an entity.
pub async fn star_handler(
    State(state): State<AppState>,
    Json(request): Json<StarRequest>,
) -> impl IntoResponse {
    let center = match parse_entity("entity", &request.entity) {
        Ok(e) => e,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ListResponse::error(format!("Invalid entity: {}", e))),
            );
        }
    };

    let store = state.store.read().await;
    let options = StarOptions {
        limit: Some(effective_limit(request.limit)),
    };
    match store.star(&center, options) {
        Ok(edges) => (StatusCode::OK, Json(ListResponse::with_entities(edges))),
        Err(e) => (
            error_status(&e),
            Json(ListResponse::error(format!("Star failed: {}", e))),
        ),
    }
}

/// Atoms of every edge containing an entity.
pub async fn ego_handler(
    State(state): State<AppState>,
    Json(request): Json<EntityRequest>,
) -> impl IntoResponse {
    let center = match parse_entity("entity", &request.entity) {
        Ok(e) => e,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ListResponse::error(format!("Invalid entity: {}", e))),
            );
        }
    };

    let store = state.store.read().await;
    match store.ego(&center) {
        Ok(atoms) => (StatusCode::OK, Json(ListResponse::with_entities(atoms))),
        Err(e) => (
            error_status(&e),
            Json(ListResponse::error(format!("Ego failed: {}", e))),
        ),
    }
}

/// Degree or deep degree of an entity.
pub async fn degree_handler(
    State(state): State<AppState>,
    Json(request): Json<DegreeRequest>,
) -> impl IntoResponse {
    let entity = match parse_entity("entity", &request.entity) {
        Ok(e) => e,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(DegreeResponse::error(format!("Invalid entity: {}", e))),
            );
        }
    };

    let store = state.store.read().await;
    let degree = if request.deep {
        store.deep_degree(&entity)
    } else {
        store.degree(&entity)
    };
    match degree {
        Ok(degree) => (
            StatusCode::OK,
            Json(DegreeResponse::success(degree, request.deep)),
        ),
        Err(e) => (
            error_status(&e),
            Json(DegreeResponse::error(format!("Degree failed: {}", e))),
        ),
    }
}

/// Remove every entity matching a pattern.
pub async fn remove_pattern_handler(
    State(state): State<AppState>,
    Json(request): Json<PatternRequest>,
) -> impl IntoResponse {
    let mut store = state.store.write().await;
    match store.remove_by_pattern(&request.pattern) {
        Ok(removed) => {
            tracing::info!(pattern = %request.pattern, removed, "removed by pattern");
            (
                StatusCode::OK,
                Json(RemovePatternResponse::success(removed)),
            )
        }
        Err(e) => (
            error_status(&e),
            Json(RemovePatternResponse::error(format!(
                "Pattern removal failed: {}",
                e
            ))),
        ),
    }
}

// =============================================================================
// ATTRIBUTE HANDLER
// =============================================================================

/// Get, set, increment or decrement an attribute.
pub async fn attribute_handler(
    State(state): State<AppState>,
    Json(request): Json<AttributeRequest>,
) -> impl IntoResponse {
    let entity = match parse_entity("entity", request.entity()) {
        Ok(e) => e,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(AttributeResponse::error(format!("Invalid entity: {}", e))),
            );
        }
    };
    if request.name().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(AttributeResponse::error("Attribute name must not be empty")),
        );
    }

    let mut store = state.store.write().await;
    let result = match request {
        AttributeRequest::Get { name, .. } => store.attribute(&entity, &name),
        AttributeRequest::Set { name, value, .. } => {
            store
                .set_attribute(&entity, &name, value.into())
                .and_then(|stored| {
                    if stored {
                        store.attribute(&entity, &name)
                    } else {
                        Ok(None)
                    }
                })
        }
        AttributeRequest::Inc { name, .. } => store.inc_attribute(&entity, &name),
        AttributeRequest::Dec { name, .. } => store.dec_attribute(&entity, &name),
    };

    match result {
        Ok(value) => (StatusCode::OK, Json(AttributeResponse::success(value))),
        Err(e) => (
            error_status(&e),
            Json(AttributeResponse::error(format!("Attribute failed: {}", e))),
        ),
    }
}

// =============================================================================
// EXPORT HANDLER
// =============================================================================

/// Export the store as a base64 snapshot.
pub async fn export_handler(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.store.read().await;

    let snapshot = match Snapshot::capture(&*store) {
        Ok(s) => s,
        Err(e) => {
            return (
                error_status(&e),
                Json(ExportResponse::error(format!(
                    "Failed to capture snapshot: {}",
                    e
                ))),
            );
        }
    };

    match snapshot_to_bytes(&snapshot) {
        Ok(data) => (
            StatusCode::OK,
            Json(ExportResponse::success(
                data,
                snapshot.checksum,
                snapshot.entries.len(),
            )),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ExportResponse::error(format!("Export failed: {}", e))),
        ),
    }
}
