//! # semgraph HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Store name, backend and counts
//! - `POST /add` - Add an entity
//! - `POST /remove` - Remove an entity (optionally deep)
//! - `POST /exists` - Existence and primary flag
//! - `POST /match` - Entities matching a pattern
//! - `POST /star` - Edges directly containing an entity
//! - `POST /ego` - Atoms of the edges containing an entity
//! - `POST /degree` - Degree or deep degree
//! - `POST /remove_pattern` - Remove every match of a pattern
//! - `POST /attribute` - Get/set/inc/dec an attribute
//! - `POST /export` - Base64 snapshot of the whole store
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `SEMGRAPH_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all
//!   (default: localhost only)
//! - `SEMGRAPH_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `SEMGRAPH_API_KEY`: If set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::{API_KEY_ENV, get_api_key_from_env, key_matches};
pub use handlers::error_status;
pub use middleware::{RATE_LIMIT_ENV, create_rate_limiter, get_rate_limit_from_env};
pub use types::{
    AddRequest, AttributeJson, AttributeRequest, AttributeResponse, DegreeRequest, DegreeResponse,
    EntityRequest, EntityResponse, ExportResponse, HealthResponse, ListResponse, MAX_RESULTS,
    PatternRequest, RemovePatternResponse, RemoveRequest, StarRequest, StatusResponse,
    effective_limit,
};

use crate::config::{DEFAULT_BODY_LIMIT, ServerConfig};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use semgraph_core::{HypergraphError, Store};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Environment variable holding the allowed CORS origins.
pub const CORS_ORIGINS_ENV: &str = "SEMGRAPH_CORS_ORIGINS";

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state containing the store.
#[derive(Clone)]
pub struct AppState {
    /// The store. Queries take the read lock, mutations the write lock.
    pub store: Arc<RwLock<Store>>,
    /// Maximum request body in bytes.
    pub body_limit: usize,
}

impl AppState {
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    #[must_use]
    pub fn with_body_limit(mut self, body_limit: usize) -> Self {
        self.body_limit = body_limit;
        self
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from `SEMGRAPH_CORS_ORIGINS`.
///
/// - `*`: allows all origins
/// - unset: localhost only
/// - otherwise: comma-separated list of allowed origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var(CORS_ORIGINS_ENV).ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins ({}=*). This is insecure for production!",
                CORS_ORIGINS_ENV
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in {}, defaulting to localhost only",
                    CORS_ORIGINS_ENV
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => {
            tracing::info!("CORS: No {} set, defaulting to localhost only", CORS_ORIGINS_ENV);
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .iter()
    .filter_map(|origin| origin.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
/// 4. Rate Limiting (if enabled)
/// 5. Authentication (if configured)
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer();
    let body_limit = state.body_limit;

    let rate_limit = get_rate_limit_from_env();
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    let has_auth = get_api_key_from_env().is_some();
    if has_auth {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "API key authentication DISABLED - all endpoints are publicly accessible! \
             Set {} to enable authentication.",
            API_KEY_ENV
        );
    }

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/add", post(handlers::add_handler))
        .route("/remove", post(handlers::remove_handler))
        .route("/exists", post(handlers::exists_handler))
        .route("/match", post(handlers::match_handler))
        .route("/star", post(handlers::star_handler))
        .route("/ego", post(handlers::ego_handler))
        .route("/degree", post(handlers::degree_handler))
        .route("/remove_pattern", post(handlers::remove_pattern_handler))
        .route("/attribute", post(handlers::attribute_handler))
        .route("/export", post(handlers::export_handler));

    if has_auth {
        router = router.layer(axum_middleware::from_fn(auth::api_key_auth_middleware));
    }

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Resolves on Ctrl+C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Serve `state` until Ctrl+C. The store stays in `state` for the caller to
/// flush afterwards.
pub async fn run_server(server: &ServerConfig, state: AppState) -> Result<(), HypergraphError> {
    let addr = server.addr();
    let router = create_router(state.with_body_limit(server.body_limit));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| HypergraphError::Io(format!("Bind failed: {}", e)))?;

    tracing::info!("semgraph HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| HypergraphError::Io(format!("Server error: {}", e)))
}
