//! Integration tests for the semgraph HTTP API.
//!
//! Uses axum-test to test the API handlers without starting a real server.

// Allow unwrap and panic in tests - these are standard for test code
// Allow holding MutexGuard across await in auth tests - tests are serialized
// intentionally to avoid env var conflicts
#![allow(clippy::unwrap_used, clippy::panic, clippy::await_holding_lock)]

use axum::http::{HeaderValue, StatusCode};
use axum_test::TestServer;
use base64::Engine;
use semgraph::api::{
    API_KEY_ENV, AppState, AttributeJson, AttributeResponse, DegreeResponse, EntityResponse,
    ExportResponse, HealthResponse, ListResponse, RemovePatternResponse, StatusResponse,
    create_router,
};
use semgraph_core::{
    Entity, Hypergraph, HypergraphExt, MemoryHypergraph, Store, StoreConfig, import_snapshot,
};
use serde_json::json;
use std::sync::Mutex;

/// Mutex to serialize tests since auth tests modify env vars.
static AUTH_TEST_MUTEX: Mutex<()> = Mutex::new(());

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Guard wrapper that holds the mutex and ensures cleanup on drop.
struct TestGuard {
    _guard: std::sync::MutexGuard<'static, ()>,
}

impl Drop for TestGuard {
    fn drop(&mut self) {
        // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
        unsafe { std::env::remove_var(API_KEY_ENV) };
    }
}

fn memory_store() -> Store {
    Store::open(&StoreConfig::memory("api-test")).unwrap()
}

fn server_for(store: Store) -> TestServer {
    TestServer::new(create_router(AppState::new(store))).unwrap()
}

/// Create a test server with a fresh in-memory store.
/// Returns a guard that must be kept alive during the test.
fn create_test_server() -> (TestServer, TestGuard) {
    let guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::remove_var(API_KEY_ENV) };
    (server_for(memory_store()), TestGuard { _guard: guard })
}

/// Create a test server holding two statements about the sky.
fn create_populated_test_server() -> (TestServer, TestGuard) {
    let guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::remove_var(API_KEY_ENV) };

    let mut store = memory_store();
    for text in [
        "(is/pd sky/c blue/c)",
        "(says/pd mary/c (is/pd sky/c blue/c))",
        "(is/pd grass/c green/c)",
    ] {
        store.add(Entity::parse(text).unwrap()).unwrap();
    }

    (server_for(store), TestGuard { _guard: guard })
}

// =============================================================================
// HEALTH / STATUS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (server, _guard) = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_status_empty_store() {
    let (server, _guard) = create_test_server();

    let response = server.get("/status").await;

    response.assert_status_ok();
    let status: StatusResponse = response.json();
    assert_eq!(status.name, "api-test");
    assert_eq!(status.backend, "memory");
    assert_eq!(status.atoms, 0);
    assert_eq!(status.edges, 0);
}

#[tokio::test]
async fn test_status_populated_store() {
    let (server, _guard) = create_populated_test_server();

    let status: StatusResponse = server.get("/status").await.json();
    // is/pd sky/c blue/c says/pd mary/c grass/c green/c
    assert_eq!(status.atoms, 7);
    assert_eq!(status.edges, 3);
    assert_eq!(status.primary_edges, 3);
    assert_eq!(status.primary_atoms, 0);
}

// =============================================================================
// ADD / REMOVE / EXISTS
// =============================================================================

#[tokio::test]
async fn test_add_edge_marks_children_non_primary() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/add")
        .json(&json!({ "entity": "(is/pd sky/c blue/c)" }))
        .await;
    response.assert_status_ok();
    let added: EntityResponse = response.json();
    assert!(added.success);
    assert!(added.primary);
    assert_eq!(added.entity.as_deref(), Some("(is/pd sky/c blue/c)"));

    let child: EntityResponse = server
        .post("/exists")
        .json(&json!({ "entity": "sky/c" }))
        .await
        .json();
    assert!(child.found);
    assert!(!child.primary);
}

#[tokio::test]
async fn test_add_non_primary() {
    let (server, _guard) = create_test_server();

    let added: EntityResponse = server
        .post("/add")
        .json(&json!({ "entity": "sky/c", "primary": false }))
        .await
        .json();
    assert!(added.success);
    assert!(!added.primary);
}

#[tokio::test]
async fn test_add_rejects_pattern() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/add")
        .json(&json!({ "entity": "(is/pd * ...)" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: EntityResponse = response.json();
    assert!(!body.success);
    assert!(body.error.is_some());
}

#[tokio::test]
async fn test_add_rejects_malformed_text() {
    let (server, _guard) = create_test_server();

    for text in ["", "(is/pd sky/c", "()", "a) b"] {
        let response = server.post("/add").json(&json!({ "entity": text })).await;
        assert_eq!(
            response.status_code(),
            StatusCode::BAD_REQUEST,
            "'{}' should be rejected",
            text
        );
    }
}

#[tokio::test]
async fn test_exists_absent_is_not_an_error() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/exists")
        .json(&json!({ "entity": "(never/pd stored/c)" }))
        .await;

    response.assert_status_ok();
    let body: EntityResponse = response.json();
    assert!(body.success);
    assert!(!body.found);
}

#[tokio::test]
async fn test_remove_shallow_keeps_subedges() {
    let (server, _guard) = create_populated_test_server();

    let removed: EntityResponse = server
        .post("/remove")
        .json(&json!({ "entity": "(says/pd mary/c (is/pd sky/c blue/c))" }))
        .await
        .json();
    assert!(removed.found);

    let inner: EntityResponse = server
        .post("/exists")
        .json(&json!({ "entity": "(is/pd sky/c blue/c)" }))
        .await
        .json();
    assert!(inner.found);
}

#[tokio::test]
async fn test_remove_deep_removes_subedges_but_not_atoms() {
    let (server, _guard) = create_populated_test_server();

    let removed: EntityResponse = server
        .post("/remove")
        .json(&json!({ "entity": "(says/pd mary/c (is/pd sky/c blue/c))", "deep": true }))
        .await
        .json();
    assert!(removed.found);

    let inner: EntityResponse = server
        .post("/exists")
        .json(&json!({ "entity": "(is/pd sky/c blue/c)" }))
        .await
        .json();
    assert!(!inner.found);

    let atom: EntityResponse = server
        .post("/exists")
        .json(&json!({ "entity": "mary/c" }))
        .await
        .json();
    assert!(atom.found);
}

#[tokio::test]
async fn test_remove_absent_returns_false() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/remove")
        .json(&json!({ "entity": "ghost/c" }))
        .await;

    response.assert_status_ok();
    let body: EntityResponse = response.json();
    assert!(body.success);
    assert!(!body.found);
}

// =============================================================================
// QUERIES
// =============================================================================

#[tokio::test]
async fn test_match_open_ended_pattern() {
    let (server, _guard) = create_populated_test_server();

    let body: ListResponse = server
        .post("/match")
        .json(&json!({ "pattern": "(is/pd * ...)" }))
        .await
        .json();

    assert!(body.success);
    assert_eq!(
        body.entities,
        vec![
            "(is/pd grass/c green/c)".to_string(),
            "(is/pd sky/c blue/c)".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_match_respects_limit() {
    let (server, _guard) = create_populated_test_server();

    let body: ListResponse = server
        .post("/match")
        .json(&json!({ "pattern": "@", "limit": 2 }))
        .await
        .json();

    assert_eq!(body.entities.len(), 2);
}

#[tokio::test]
async fn test_match_invalid_pattern() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/match")
        .json(&json!({ "pattern": "(is/pd" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_star_lists_direct_containers() {
    let (server, _guard) = create_populated_test_server();

    let body: ListResponse = server
        .post("/star")
        .json(&json!({ "entity": "(is/pd sky/c blue/c)" }))
        .await
        .json();

    assert_eq!(
        body.entities,
        vec!["(says/pd mary/c (is/pd sky/c blue/c))".to_string()]
    );
}

#[tokio::test]
async fn test_ego_collects_atoms() {
    let (server, _guard) = create_populated_test_server();

    let body: ListResponse = server
        .post("/ego")
        .json(&json!({ "entity": "sky/c" }))
        .await
        .json();

    assert!(body.entities.contains(&"blue/c".to_string()));
    assert!(body.entities.contains(&"is/pd".to_string()));
    assert!(!body.entities.contains(&"mary/c".to_string()));
}

#[tokio::test]
async fn test_degree_and_deep_degree() {
    let (server, _guard) = create_populated_test_server();

    let shallow: DegreeResponse = server
        .post("/degree")
        .json(&json!({ "entity": "sky/c" }))
        .await
        .json();
    let deep: DegreeResponse = server
        .post("/degree")
        .json(&json!({ "entity": "sky/c", "deep": true }))
        .await
        .json();

    assert_eq!(shallow.degree, 1);
    assert_eq!(deep.degree, 2);
    assert!(deep.deep);
}

#[tokio::test]
async fn test_remove_pattern_counts() {
    let (server, _guard) = create_populated_test_server();

    let body: RemovePatternResponse = server
        .post("/remove_pattern")
        .json(&json!({ "pattern": "(is/pd * *)" }))
        .await
        .json();
    assert!(body.success);
    assert_eq!(body.removed, 2);

    let status: StatusResponse = server.get("/status").await.json();
    assert_eq!(status.edges, 1);
}

// =============================================================================
// ATTRIBUTES
// =============================================================================

#[tokio::test]
async fn test_attribute_set_and_get() {
    let (server, _guard) = create_populated_test_server();

    let set: AttributeResponse = server
        .post("/attribute")
        .json(&json!({ "op": "set", "entity": "sky/c", "name": "label", "value": "the sky" }))
        .await
        .json();
    assert_eq!(set.value, Some(AttributeJson::Str("the sky".to_string())));

    let get: AttributeResponse = server
        .post("/attribute")
        .json(&json!({ "op": "get", "entity": "sky/c", "name": "label" }))
        .await
        .json();
    assert_eq!(get.value, Some(AttributeJson::Str("the sky".to_string())));
}

#[tokio::test]
async fn test_attribute_counters() {
    let (server, _guard) = create_populated_test_server();

    for _ in 0..3 {
        server
            .post("/attribute")
            .json(&json!({ "op": "inc", "entity": "sky/c", "name": "seen" }))
            .await
            .assert_status_ok();
    }
    let dec: AttributeResponse = server
        .post("/attribute")
        .json(&json!({ "op": "dec", "entity": "sky/c", "name": "seen" }))
        .await
        .json();

    assert_eq!(dec.value, Some(AttributeJson::Int(2)));
}

#[tokio::test]
async fn test_attribute_counter_on_string_fails() {
    let (server, _guard) = create_populated_test_server();

    server
        .post("/attribute")
        .json(&json!({ "op": "set", "entity": "sky/c", "name": "label", "value": "blue" }))
        .await
        .assert_status_ok();

    let response = server
        .post("/attribute")
        .json(&json!({ "op": "inc", "entity": "sky/c", "name": "label" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_attribute_on_absent_entity() {
    let (server, _guard) = create_test_server();

    let body: AttributeResponse = server
        .post("/attribute")
        .json(&json!({ "op": "set", "entity": "ghost/c", "name": "x", "value": 1 }))
        .await
        .json();

    assert!(body.success);
    assert_eq!(body.value, None);
}

// =============================================================================
// EXPORT
// =============================================================================

#[tokio::test]
async fn test_export_roundtrips_into_fresh_store() {
    let (server, _guard) = create_populated_test_server();

    let response = server.post("/export").await;
    response.assert_status_ok();
    let export: ExportResponse = response.json();
    assert!(export.success);
    assert_eq!(export.entities, 10);
    assert!(export.checksum.is_some());

    let data = base64::engine::general_purpose::STANDARD
        .decode(export.data.unwrap())
        .unwrap();
    let mut restored = MemoryHypergraph::new("restored");
    assert_eq!(import_snapshot(&mut restored, &data).unwrap(), 10);
    assert!(
        restored
            .exists(&Entity::parse("(says/pd mary/c (is/pd sky/c blue/c))").unwrap())
            .unwrap()
    );
    assert_eq!(restored.counts().unwrap().primary_edges, 3);
}

// =============================================================================
// ERROR HANDLING
// =============================================================================

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let (server, _guard) = create_test_server();

    let response = server.get("/nonexistent").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_wrong_method_returns_405() {
    let (server, _guard) = create_test_server();

    let response = server.post("/health").await;
    assert_eq!(response.status_code(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_invalid_json_body() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/add")
        .bytes(bytes::Bytes::from("not valid json"))
        .content_type("application/json")
        .await;

    assert!(response.status_code().is_client_error());
}

// =============================================================================
// AUTHENTICATION MIDDLEWARE TESTS
// =============================================================================

/// Create a test server with authentication enabled.
/// Must be called while holding AUTH_TEST_MUTEX.
fn create_auth_test_server(api_key: &str) -> TestServer {
    // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::set_var(API_KEY_ENV, api_key) };
    server_for(memory_store())
}

/// Clean up auth env var after test.
fn cleanup_auth_env() {
    // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::remove_var(API_KEY_ENV) };
}

#[tokio::test]
async fn test_auth_valid_bearer_token() {
    let _guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let api_key = "test-secret-key-12345";
    let server = create_auth_test_server(api_key);

    let response = server
        .get("/status")
        .add_header(
            axum::http::header::AUTHORIZATION,
            format!("Bearer {}", api_key)
                .parse::<HeaderValue>()
                .unwrap(),
        )
        .await;

    cleanup_auth_env();

    response.assert_status_ok();
    let status: StatusResponse = response.json();
    assert_eq!(status.atoms, 0);
}

#[tokio::test]
async fn test_auth_valid_raw_token() {
    let _guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let api_key = "test-raw-key-67890";
    let server = create_auth_test_server(api_key);

    let response = server
        .get("/status")
        .add_header(
            axum::http::header::AUTHORIZATION,
            api_key.parse::<HeaderValue>().unwrap(),
        )
        .await;

    cleanup_auth_env();

    response.assert_status_ok();
}

#[tokio::test]
async fn test_auth_invalid_token_rejected() {
    let _guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let server = create_auth_test_server("correct-key");

    let response = server
        .post("/add")
        .add_header(
            axum::http::header::AUTHORIZATION,
            "Bearer wrong-key".parse::<HeaderValue>().unwrap(),
        )
        .json(&json!({ "entity": "sky/c" }))
        .await;

    cleanup_auth_env();

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_missing_header_rejected() {
    let _guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let server = create_auth_test_server("correct-key");

    let response = server.get("/status").await;

    cleanup_auth_env();

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_health_endpoint_bypasses_auth() {
    let _guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let server = create_auth_test_server("correct-key");

    let response = server.get("/health").await;

    cleanup_auth_env();

    response.assert_status_ok();
}
