//! Subscription purchase and signed payment webhooks over HTTP.

mod helpers;

use axum::body::Bytes;
use fotoart_services::payment::webhook::{sign_payload, SIGNATURE_HEADER};
use helpers::{bearer, register_user, setup_test_app, TestApp, TEST_FRONTEND_URL, TEST_WEBHOOK_SECRET};
use serde_json::{json, Value};

async fn send_webhook(app: &TestApp, payment_id: &str, status: &str, sign: bool) -> u16 {
    let body = serde_json::to_vec(&json!({
        "event": format!("payment.{}", status),
        "object": { "id": payment_id, "status": status },
    }))
    .unwrap();
    let mut request = app.client().post("/payment/webhook");
    if sign {
        request = request.add_header(SIGNATURE_HEADER, sign_payload(TEST_WEBHOOK_SECRET, &body));
    }
    request
        .content_type("application/json")
        .bytes(Bytes::from(body))
        .await
        .status_code()
        .as_u16()
}

#[tokio::test]
async fn test_yearly_purchase_activates_subscription() {
    let app = setup_test_app();
    let client = app.client();
    let token = register_user(client, "anna", "anna@example.com").await;

    let response = client
        .post("/payment/create")
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "plan": "year" }))
        .await;
    assert_eq!(response.status_code(), 200);
    let created: Value = response.json();
    let payment_id = created["payment_id"].as_str().unwrap().to_string();
    assert_eq!(created["confirmation_url"], "https://pay.test/confirm/1");

    {
        let requests = app.gateway.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].return_url,
            format!(
                "{}/subscription/result?payment_id={}",
                TEST_FRONTEND_URL, payment_id
            )
        );
    }

    let status: Value = client
        .get(&format!("/payment/{}/status", payment_id))
        .add_header("Authorization", bearer(&token))
        .await
        .json();
    assert_eq!(status["status"], "pending");

    assert_eq!(send_webhook(&app, "yk-1", "succeeded", true).await, 200);

    let status: Value = client
        .get(&format!("/payment/{}/status", payment_id))
        .add_header("Authorization", bearer(&token))
        .await
        .json();
    assert_eq!(status["status"], "succeeded");

    let subscription: Value = client
        .get("/subscription")
        .add_header("Authorization", bearer(&token))
        .await
        .json();
    assert_eq!(subscription["active"], true);
    let days_left = subscription["days_left"].as_i64().unwrap();
    assert!((364..=365).contains(&days_left), "days_left {}", days_left);

    // Redelivery changes nothing
    assert_eq!(send_webhook(&app, "yk-1", "succeeded", true).await, 200);
    let again: Value = client
        .get("/subscription")
        .add_header("Authorization", bearer(&token))
        .await
        .json();
    assert_eq!(again["expires_at"], subscription["expires_at"]);
}

#[tokio::test]
async fn test_webhook_signature_is_enforced() {
    let app = setup_test_app();
    let client = app.client();
    let token = register_user(client, "anna", "anna@example.com").await;
    client
        .post("/payment/create")
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "plan": "month" }))
        .await;

    assert_eq!(send_webhook(&app, "yk-1", "succeeded", false).await, 401);

    let body = br#"{"event":"payment.succeeded","object":{"id":"yk-1","status":"succeeded"}}"#;
    let response = client
        .post("/payment/webhook")
        .add_header(SIGNATURE_HEADER, sign_payload("some-other-secret", body))
        .content_type("application/json")
        .bytes(Bytes::from_static(body))
        .await;
    assert_eq!(response.status_code(), 401);

    let subscription: Value = client
        .get("/subscription")
        .add_header("Authorization", bearer(&token))
        .await
        .json();
    assert_eq!(subscription["active"], false);
}

#[tokio::test]
async fn test_canceled_payment_leaves_subscription_inactive() {
    let app = setup_test_app();
    let client = app.client();
    let token = register_user(client, "anna", "anna@example.com").await;
    let created: Value = client
        .post("/payment/create")
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "plan": "month" }))
        .await
        .json();

    assert_eq!(send_webhook(&app, "yk-1", "canceled", true).await, 200);

    let status: Value = client
        .get(&format!(
            "/payment/{}/status",
            created["payment_id"].as_str().unwrap()
        ))
        .add_header("Authorization", bearer(&token))
        .await
        .json();
    assert_eq!(status["status"], "canceled");
    let subscription: Value = client
        .get("/subscription")
        .add_header("Authorization", bearer(&token))
        .await
        .json();
    assert_eq!(subscription["active"], false);
}

#[tokio::test]
async fn test_webhook_rejects_unknown_payment_and_status() {
    let app = setup_test_app();
    let client = app.client();
    let token = register_user(client, "anna", "anna@example.com").await;
    client
        .post("/payment/create")
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "plan": "month" }))
        .await;

    assert_eq!(send_webhook(&app, "yk-404", "succeeded", true).await, 404);
    assert_eq!(send_webhook(&app, "yk-1", "refunded", true).await, 400);
}

#[tokio::test]
async fn test_payment_status_is_owner_scoped() {
    let app = setup_test_app();
    let client = app.client();
    let anna = register_user(client, "anna", "anna@example.com").await;
    let boris = register_user(client, "boris", "boris@example.com").await;

    let created: Value = client
        .post("/payment/create")
        .add_header("Authorization", bearer(&anna))
        .json(&json!({ "plan": "month" }))
        .await
        .json();

    let response = client
        .get(&format!(
            "/payment/{}/status",
            created["payment_id"].as_str().unwrap()
        ))
        .add_header("Authorization", bearer(&boris))
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_unknown_plan_is_rejected() {
    let app = setup_test_app();
    let client = app.client();
    let token = register_user(client, "anna", "anna@example.com").await;

    let response = client
        .post("/payment/create")
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "plan": "lifetime" }))
        .await;
    assert_eq!(response.status_code(), 400);
    assert!(app.gateway.requests.lock().unwrap().is_empty());
}
