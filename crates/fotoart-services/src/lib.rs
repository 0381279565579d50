//! Fotoart Services Layer
//!
//! Business logic between the HTTP boundary and the persistence/storage
//! crates: the upload orchestrator, the collection lifecycle with its
//! publish/short-link state machine, photo queries, authentication and
//! subscription billing. Services depend on repository and storage traits
//! only, so tests run them against in-memory doubles.

pub mod auth;
pub mod collection;
pub mod payment;
pub mod photo;
pub mod token;
pub mod upload;

pub use auth::{AuthService, JwtService, LogMailer, Mailer, SmtpMailer, TokenKind};
pub use collection::CollectionService;
pub use payment::{
    GatewayPayment, NewGatewayPayment, PaymentGateway, PaymentService, WebhookNotification,
    YooKassaGateway,
};
pub use photo::PhotoService;
pub use upload::{UploadFile, UploadService};
