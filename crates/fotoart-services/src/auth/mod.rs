//! Account authentication: password hashing, HS256 tokens, reset mail.

pub mod jwt;
pub mod mailer;
pub mod password;
pub mod service;

pub use jwt::{Claims, JwtService, TokenKind};
pub use mailer::{LogMailer, Mailer, SmtpMailer};
pub use password::{hash_password, verify_password};
pub use service::AuthService;
