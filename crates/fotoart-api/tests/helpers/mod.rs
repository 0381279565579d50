//! Test helpers: build the full router over in-memory repositories and storage.
//!
//! Run from workspace root: `cargo test -p fotoart-api`. No database or
//! object store is needed.

#![allow(dead_code)]

pub mod fixtures;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum_test::TestServer;
use fotoart_api::setup::routes;
use fotoart_api::state::{AppState, Repositories};
use fotoart_core::{AppError, Config, PaymentStatus};
use fotoart_db::test_helpers::InMemoryDatabase;
use fotoart_services::{GatewayPayment, Mailer, NewGatewayPayment, PaymentGateway};
use fotoart_storage::test_helpers::InMemoryStorage;
use serde_json::{json, Value};

pub const TEST_JWT_SECRET: &str = "integration-test-secret-at-least-32-chars";
pub const TEST_FRONTEND_URL: &str = "https://fotoart.test";
pub const TEST_WEBHOOK_SECRET: &str = "integration-webhook-secret";
pub const TEST_PASSWORD: &str = "correct horse";

/// Captures outgoing mail instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, String, String)>>,
}

impl RecordingMailer {
    pub fn sent_to(&self, address: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _, _)| to == address)
            .map(|(_, _, body)| body.clone())
            .collect()
    }

    /// Token from the most recent reset link mailed to `address`.
    pub fn last_reset_token(&self, address: &str) -> Option<String> {
        let body = self.sent_to(address).pop()?;
        let start = body.find("token=")? + "token=".len();
        Some(
            body[start..]
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string(),
        )
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, body_plain: &str) -> Result<(), AppError> {
        self.sent.lock().unwrap().push((
            to.to_string(),
            subject.to_string(),
            body_plain.to_string(),
        ));
        Ok(())
    }
}

/// Payment processor double. Processor ids are `yk-1`, `yk-2`, ...
#[derive(Default)]
pub struct FakeGateway {
    pub requests: Mutex<Vec<NewGatewayPayment>>,
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_payment(&self, payment: NewGatewayPayment) -> Result<GatewayPayment, AppError> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(payment);
        Ok(GatewayPayment {
            id: format!("yk-{}", requests.len()),
            status: PaymentStatus::Pending,
            confirmation_url: format!("https://pay.test/confirm/{}", requests.len()),
        })
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub db: InMemoryDatabase,
    pub storage: InMemoryStorage,
    pub mailer: Arc<RecordingMailer>,
    pub gateway: Arc<FakeGateway>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

pub fn test_config(overrides: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = [
        ("DATABASE_URL", "postgresql://localhost/fotoart_test"),
        ("JWT_SECRET", TEST_JWT_SECRET),
        ("STORAGE_BACKEND", "local"),
        ("FRONTEND_URL", TEST_FRONTEND_URL),
        ("PAYMENT_WEBHOOK_SECRET", TEST_WEBHOOK_SECRET),
        ("ENVIRONMENT", "development"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (key, value) in overrides {
        vars.insert(key.to_string(), value.to_string());
    }
    Config::from_lookup(|key| vars.get(key).cloned()).expect("test config")
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with(test_config(&[]))
}

pub fn setup_test_app_with(config: Config) -> TestApp {
    let db = InMemoryDatabase::new();
    let storage = InMemoryStorage::default();
    let mailer = Arc::new(RecordingMailer::default());
    let gateway = Arc::new(FakeGateway::default());

    let repositories = Repositories {
        users: Arc::new(db.clone()),
        collections: Arc::new(db.clone()),
        photos: Arc::new(db.clone()),
        short_links: Arc::new(db.clone()),
        payments: Arc::new(db.clone()),
    };
    let state = AppState::new(
        config.clone(),
        repositories,
        Arc::new(storage.clone()),
        mailer.clone(),
        Some(gateway.clone() as Arc<dyn PaymentGateway>),
    );

    let router = routes::setup_routes(&config, Arc::new(state)).expect("router");
    let server = TestServer::new(router).expect("test server");

    TestApp {
        server,
        db,
        storage,
        mailer,
        gateway,
    }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Register a user and return its access token.
pub async fn register_user(client: &TestServer, username: &str, email: &str) -> String {
    let response = client
        .post("/auth/register")
        .json(&json!({
            "username": username,
            "email": email,
            "password": TEST_PASSWORD,
        }))
        .await;
    assert_eq!(response.status_code(), 201, "register {}", email);
    let body: Value = response.json();
    body["access_token"]
        .as_str()
        .expect("access_token")
        .to_string()
}

/// Create a collection and return its id.
pub async fn create_collection(client: &TestServer, token: &str, name: &str, date: &str) -> String {
    let response = client
        .post("/collection/create")
        .add_header("Authorization", bearer(token))
        .json(&json!({ "name": name, "date": date }))
        .await;
    assert_eq!(response.status_code(), 201, "create collection {}", name);
    let body: Value = response.json();
    body["id"].as_str().expect("collection id").to_string()
}
