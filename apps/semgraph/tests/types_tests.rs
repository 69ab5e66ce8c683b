//! Unit tests for API types serialization/deserialization.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use semgraph::api::{
    AddRequest, AttributeJson, AttributeRequest, AttributeResponse, DegreeRequest, EntityResponse,
    ExportResponse, HealthResponse, ListResponse, MAX_RESULTS, PatternRequest, RemoveRequest,
    StarRequest, StatusResponse, effective_limit,
};
use semgraph_core::{AttributeValue, Entity, StoreCounts};

// =============================================================================
// HEALTH / STATUS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[test]
fn test_status_response_from_counts() {
    let counts = StoreCounts {
        atoms: 7,
        edges: 3,
        primary_atoms: 1,
        primary_edges: 2,
    };
    let status = StatusResponse::new("kb", "redb", counts);

    let json = serde_json::to_string(&status).unwrap();
    assert!(json.contains("\"name\":\"kb\""));
    assert!(json.contains("\"backend\":\"redb\""));
    assert!(json.contains("\"atoms\":7"));
    assert!(json.contains("\"primary_edges\":2"));
}

// =============================================================================
// REQUEST DEFAULTS
// =============================================================================

#[test]
fn test_add_request_primary_defaults_true() {
    let request: AddRequest = serde_json::from_str(r#"{"entity":"sky/c"}"#).unwrap();
    assert!(request.primary);

    let request: AddRequest =
        serde_json::from_str(r#"{"entity":"sky/c","primary":false}"#).unwrap();
    assert!(!request.primary);
}

#[test]
fn test_remove_request_defaults_shallow() {
    let request: RemoveRequest = serde_json::from_str(r#"{"entity":"(a b)"}"#).unwrap();
    assert!(!request.deep);
    assert!(!request.keep_shared);
}

#[test]
fn test_optional_limits_and_flags() {
    let star: StarRequest = serde_json::from_str(r#"{"entity":"sky/c"}"#).unwrap();
    assert_eq!(star.limit, None);

    let pattern: PatternRequest =
        serde_json::from_str(r#"{"pattern":"(* ...)","limit":5}"#).unwrap();
    assert_eq!(pattern.limit, Some(5));

    let degree: DegreeRequest =
        serde_json::from_str(r#"{"entity":"sky/c","deep":true}"#).unwrap();
    assert!(degree.deep);
}

#[test]
fn test_missing_entity_field_rejected() {
    assert!(serde_json::from_str::<AddRequest>(r#"{"primary":true}"#).is_err());
}

#[test]
fn test_effective_limit_is_clamped() {
    assert_eq!(effective_limit(None), MAX_RESULTS);
    assert_eq!(effective_limit(Some(3)), 3);
    assert_eq!(effective_limit(Some(MAX_RESULTS + 1)), MAX_RESULTS);
}

// =============================================================================
// ATTRIBUTES
// =============================================================================

#[test]
fn test_attribute_json_is_plain() {
    assert_eq!(serde_json::to_string(&AttributeJson::Int(3)).unwrap(), "3");
    assert_eq!(serde_json::to_string(&AttributeJson::Float(0.5)).unwrap(), "0.5");
    assert_eq!(
        serde_json::to_string(&AttributeJson::Str("x".to_string())).unwrap(),
        "\"x\""
    );
}

#[test]
fn test_attribute_json_number_kinds() {
    let int: AttributeJson = serde_json::from_str("42").unwrap();
    let float: AttributeJson = serde_json::from_str("4.5").unwrap();
    assert_eq!(AttributeValue::from(int), AttributeValue::Int(42));
    assert_eq!(AttributeValue::from(float), AttributeValue::Float(4.5));
}

#[test]
fn test_attribute_request_tagged_by_op() {
    let request: AttributeRequest =
        serde_json::from_str(r#"{"op":"set","entity":"sky/c","name":"w","value":2}"#).unwrap();
    assert_eq!(request.entity(), "sky/c");
    assert_eq!(request.name(), "w");
    match request {
        AttributeRequest::Set { value, .. } => assert_eq!(value, AttributeJson::Int(2)),
        other => panic!("unexpected request: {:?}", other),
    }

    let inc: AttributeRequest =
        serde_json::from_str(r#"{"op":"inc","entity":"sky/c","name":"w"}"#).unwrap();
    assert!(matches!(inc, AttributeRequest::Inc { .. }));

    assert!(
        serde_json::from_str::<AttributeRequest>(r#"{"op":"mul","entity":"a","name":"w"}"#)
            .is_err()
    );
}

#[test]
fn test_attribute_response_absent_value() {
    let response = AttributeResponse::success(None);
    let json = serde_json::to_string(&response).unwrap();
    assert!(json.contains("\"value\":null"));
}

// =============================================================================
// ENTITY / LIST / EXPORT RESPONSES
// =============================================================================

#[test]
fn test_entity_response_uses_text_form() {
    let entity = Entity::parse("(is/pd sky/c blue/c)").unwrap();
    let response = EntityResponse::success(&entity, true, false);
    assert_eq!(response.entity.as_deref(), Some("(is/pd sky/c blue/c)"));
    assert!(response.error.is_none());

    let error = EntityResponse::error("boom");
    assert!(!error.success);
    assert_eq!(error.error.as_deref(), Some("boom"));
}

#[test]
fn test_list_response_from_entities() {
    let entities = vec![
        Entity::parse("sky/c").unwrap(),
        Entity::parse("(is/pd sky/c blue/c)").unwrap(),
    ];
    let response = ListResponse::with_entities(entities);
    assert_eq!(response.entities, vec!["sky/c", "(is/pd sky/c blue/c)"]);
}

#[test]
fn test_export_response_base64() {
    let response = ExportResponse::success(vec![0x53, 0x4d, 0x48, 0x47, 0x01], 99, 0);
    assert_eq!(response.data.as_deref(), Some("U01IRwE="));
    assert_eq!(response.checksum, Some(99));

    let error = ExportResponse::error("failed");
    assert!(error.data.is_none());
    assert!(!error.success);
}
