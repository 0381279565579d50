//! Registration, login, token refresh and password reset over HTTP.

mod helpers;

use helpers::{bearer, register_user, setup_test_app, TEST_PASSWORD};
use serde_json::{json, Value};

#[tokio::test]
async fn test_register_then_profile() {
    let app = setup_test_app();
    let client = app.client();

    let token = register_user(client, "anna", "Anna@Example.com").await;

    let response = client
        .get("/profile")
        .add_header("Authorization", bearer(&token))
        .await;
    assert_eq!(response.status_code(), 200);
    let profile: Value = response.json();
    assert_eq!(profile["username"], "anna");
    assert_eq!(profile["email"], "anna@example.com");
    assert_eq!(profile["subscription"]["active"], false);
    assert_eq!(profile["subscription"]["days_left"], 0);
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let app = setup_test_app();
    let client = app.client();
    register_user(client, "anna", "anna@example.com").await;

    let response = client
        .post("/auth/register")
        .json(&json!({
            "username": "other",
            "email": "ANNA@example.com",
            "password": TEST_PASSWORD,
        }))
        .await;
    assert_eq!(response.status_code(), 409);
    let body: Value = response.json();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_register_validation_errors() {
    let app = setup_test_app();

    let response = app
        .client()
        .post("/auth/register")
        .json(&json!({ "username": "anna", "email": "not-an-email", "password": "pw" }))
        .await;
    assert_eq!(response.status_code(), 400);

    let response = app
        .client()
        .post("/auth/register")
        .json(&json!({ "username": "anna" }))
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_login_checks_password() {
    let app = setup_test_app();
    let client = app.client();
    register_user(client, "anna", "anna@example.com").await;

    let response = client
        .post("/auth/login")
        .json(&json!({ "email": "anna@example.com", "password": "wrong password" }))
        .await;
    assert_eq!(response.status_code(), 401);

    let response = client
        .post("/auth/login")
        .json(&json!({ "email": "anna@example.com", "password": TEST_PASSWORD }))
        .await;
    assert_eq!(response.status_code(), 200);
    let tokens: Value = response.json();
    assert!(tokens["access_token"].is_string());
    assert!(tokens["refresh_token"].is_string());
}

#[tokio::test]
async fn test_refresh_rotates_tokens() {
    let app = setup_test_app();
    let client = app.client();
    register_user(client, "anna", "anna@example.com").await;

    let login: Value = client
        .post("/auth/login")
        .json(&json!({ "email": "anna@example.com", "password": TEST_PASSWORD }))
        .await
        .json();
    let first_refresh = login["refresh_token"].as_str().unwrap().to_string();

    let response = client
        .post("/auth/refresh")
        .json(&json!({ "refresh_token": first_refresh }))
        .await;
    assert_eq!(response.status_code(), 200);
    let rotated: Value = response.json();
    assert_ne!(rotated["refresh_token"].as_str().unwrap(), first_refresh);

    // The superseded token no longer works
    let response = client
        .post("/auth/refresh")
        .json(&json!({ "refresh_token": first_refresh }))
        .await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_refresh_token_is_not_an_access_token() {
    let app = setup_test_app();
    let client = app.client();
    register_user(client, "anna", "anna@example.com").await;
    let login: Value = client
        .post("/auth/login")
        .json(&json!({ "email": "anna@example.com", "password": TEST_PASSWORD }))
        .await
        .json();

    let response = client
        .get("/profile")
        .add_header(
            "Authorization",
            bearer(login["refresh_token"].as_str().unwrap()),
        )
        .await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_protected_routes_require_bearer() {
    let app = setup_test_app();
    let client = app.client();

    assert_eq!(client.get("/collections").await.status_code(), 401);
    assert_eq!(
        client
            .get("/collections")
            .add_header("Authorization", "Bearer garbage")
            .await
            .status_code(),
        401
    );
}

#[tokio::test]
async fn test_password_reset_flow() {
    let app = setup_test_app();
    let client = app.client();
    register_user(client, "anna", "anna@example.com").await;

    let response = client
        .post("/auth/forgot-password")
        .json(&json!({ "email": "anna@example.com" }))
        .await;
    assert_eq!(response.status_code(), 200);
    let token = app
        .mailer
        .last_reset_token("anna@example.com")
        .expect("reset mail");

    let response = client
        .post(&format!("/auth/reset-password?token={}", token))
        .json(&json!({ "new_password": "brand new secret" }))
        .await;
    assert_eq!(response.status_code(), 200);

    let response = client
        .post("/auth/login")
        .json(&json!({ "email": "anna@example.com", "password": TEST_PASSWORD }))
        .await;
    assert_eq!(response.status_code(), 401);
    let response = client
        .post("/auth/login")
        .json(&json!({ "email": "anna@example.com", "password": "brand new secret" }))
        .await;
    assert_eq!(response.status_code(), 200);

    // Single use
    let response = client
        .post(&format!("/auth/reset-password?token={}", token))
        .json(&json!({ "new_password": "another secret" }))
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_forgot_password_for_unknown_email_succeeds_quietly() {
    let app = setup_test_app();

    let response = app
        .client()
        .post("/auth/forgot-password")
        .json(&json!({ "email": "nobody@example.com" }))
        .await;
    assert_eq!(response.status_code(), 200);
    assert!(app.mailer.sent_to("nobody@example.com").is_empty());
}
