//! Subscription billing through an external payment processor.

pub mod gateway;
pub mod service;
pub mod webhook;

pub use gateway::{GatewayPayment, NewGatewayPayment, PaymentGateway, YooKassaGateway};
pub use service::PaymentService;
pub use webhook::{sign_payload, verify_signature, WebhookNotification, WebhookObject};
