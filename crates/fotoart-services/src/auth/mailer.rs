//! Outgoing mail for the password reset flow.

use async_trait::async_trait;
use fotoart_core::config::SmtpConfig;
use fotoart_core::AppError;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body_plain: &str) -> Result<(), AppError>;
}

/// SMTP delivery through lettre
#[derive(Clone)]
pub struct SmtpMailer {
    transport: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
}

impl SmtpMailer {
    /// `None` when SMTP is not configured or the settings are unusable.
    pub fn from_config(config: &SmtpConfig) -> Option<Self> {
        if !config.is_configured() {
            tracing::debug!("SMTP not configured; reset mails will be logged");
            return None;
        }
        let host = config.host.as_deref()?;
        let from: Mailbox = match config.from.as_deref()?.parse() {
            Ok(from) => from,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid SMTP_FROM; reset mails will be logged");
                return None;
            }
        };
        let credentials = match (&config.user, &config.password) {
            (Some(u), Some(p)) => Some(Credentials::new(u.clone(), p.clone())),
            _ => None,
        };

        let transport = if config.tls {
            let builder = match AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host) {
                Ok(builder) => builder.port(config.port),
                Err(e) => {
                    tracing::warn!(error = %e, host = %host, "Invalid SMTP relay");
                    return None;
                }
            };
            let builder = match credentials {
                Some(c) => builder.credentials(c),
                None => builder,
            };
            tracing::info!(host = %host, port = config.port, "Mailer initialized (SMTP with STARTTLS)");
            builder.build()
        } else {
            let builder =
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(config.port);
            let builder = match credentials {
                Some(c) => builder.credentials(c),
                None => builder,
            };
            tracing::info!(host = %host, port = config.port, "Mailer initialized (SMTP)");
            builder.build()
        };

        Some(Self {
            transport: Arc::new(transport),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body_plain: &str) -> Result<(), AppError> {
        let to: Mailbox = to
            .parse()
            .map_err(|e| AppError::InvalidInput(format!("Invalid recipient address: {}", e)))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body_plain.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| AppError::Upstream(format!("SMTP delivery failed: {}", e)))?;

        tracing::info!("Email sent");
        Ok(())
    }
}

/// Fallback when SMTP is not configured: the message goes to the log.
#[derive(Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, body_plain: &str) -> Result<(), AppError> {
        tracing::info!(to = %to, subject = %subject, body = %body_plain, "Email (not sent, SMTP disabled)");
        Ok(())
    }
}
