//! Health, OpenAPI document and cross-cutting middleware.

mod helpers;

use helpers::{setup_test_app, setup_test_app_with, test_config};
use serde_json::Value;

#[tokio::test]
async fn test_health_without_database() {
    let app = setup_test_app();

    let response = app.client().get("/health").await;
    assert_eq!(response.status_code(), 200);
    let health: Value = response.json();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["database"], "not_configured");
    assert_eq!(health["storage"], "healthy");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = setup_test_app();

    let response = app.client().get("/api-docs/openapi.json").await;
    assert_eq!(response.status_code(), 200);
    let doc: Value = response.json();
    assert_eq!(doc["info"]["title"], "Fotoart API");
    assert!(doc["paths"]["/upload"]["post"].is_object());
    assert!(doc["components"]["securitySchemes"]["bearer_auth"].is_object());
}

#[tokio::test]
async fn test_request_id_is_echoed_or_generated() {
    let app = setup_test_app();

    let response = app
        .client()
        .get("/health")
        .add_header("X-Request-ID", "req-123")
        .await;
    assert_eq!(response.header("x-request-id"), "req-123");

    let response = app.client().get("/health").await;
    let generated = response.header("x-request-id");
    assert!(!generated.to_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_security_headers_follow_environment() {
    let app = setup_test_app();
    let response = app.client().get("/health").await;
    assert_eq!(response.header("x-content-type-options"), "nosniff");
    assert_eq!(response.header("x-frame-options"), "DENY");
    assert!(response
        .maybe_header("strict-transport-security")
        .is_none());

    let app = setup_test_app_with(test_config(&[("ENVIRONMENT", "production")]));
    let response = app.client().get("/health").await;
    assert!(response
        .maybe_header("strict-transport-security")
        .is_some());
}

#[tokio::test]
async fn test_error_body_shape() {
    let app = setup_test_app();

    let response = app.client().get("/public/no-such-token").await;
    assert_eq!(response.status_code(), 404);
    let body: Value = response.json();
    assert!(body["error"].is_string());
    assert_eq!(body["recoverable"], false);
}

#[tokio::test]
async fn test_local_storage_served_under_base_url_path() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("collection_abc").join("originals");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("photo.jpg"), b"jpeg bytes").unwrap();

    let app = setup_test_app_with(test_config(&[
        ("LOCAL_STORAGE_PATH", root.path().to_str().unwrap()),
        ("LOCAL_STORAGE_BASE_URL", "http://localhost:8080/media"),
    ]));

    let response = app
        .client()
        .get("/media/collection_abc/originals/photo.jpg")
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.as_bytes().as_ref(), b"jpeg bytes");

    let missing = app.client().get("/media/collection_abc/none.jpg").await;
    assert_eq!(missing.status_code(), 404);
}
