//! Repository, mailer and payment gateway wiring

use anyhow::{Context, Result};
use fotoart_core::Config;
use fotoart_services::{LogMailer, Mailer, PaymentGateway, SmtpMailer, YooKassaGateway};
use fotoart_storage::Storage;
use sqlx::PgPool;
use std::sync::Arc;

use crate::state::{AppState, Repositories};

pub fn initialize_services(
    config: &Config,
    pool: PgPool,
    storage: Arc<dyn Storage>,
) -> Result<Arc<AppState>> {
    let repositories = Repositories::postgres(pool.clone());

    let mailer: Arc<dyn Mailer> = match SmtpMailer::from_config(&config.smtp) {
        Some(smtp) => {
            tracing::info!("SMTP mailer enabled");
            Arc::new(smtp)
        }
        None => Arc::new(LogMailer),
    };

    let gateway: Option<Arc<dyn PaymentGateway>> = YooKassaGateway::from_config(&config.payment)
        .context("Failed to initialize payment gateway")?
        .map(|gateway| Arc::new(gateway) as Arc<dyn PaymentGateway>);
    if gateway.is_none() {
        tracing::warn!("Payment gateway not configured; subscription purchases are disabled");
    }
    if config.payment.webhook_secret.is_none() {
        tracing::warn!("PAYMENT_WEBHOOK_SECRET not set; webhook signatures are not verified");
    }

    let state = AppState::new(config.clone(), repositories, storage, mailer, gateway).with_pool(pool);
    tracing::info!("Services initialized");

    Ok(Arc::new(state))
}
