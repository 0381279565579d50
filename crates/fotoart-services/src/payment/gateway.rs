use std::time::Duration;

use async_trait::async_trait;
use fotoart_core::config::PaymentConfig;
use fotoart_core::{AppError, PaymentStatus};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

/// Payment to open at the processor
#[derive(Debug, Clone)]
pub struct NewGatewayPayment {
    pub amount: Decimal,
    pub description: String,
    pub return_url: String,
    /// Retries with the same key never create a second charge
    pub idempotence_key: String,
    pub metadata: serde_json::Value,
}

/// Processor-side view of a created payment
#[derive(Debug, Clone)]
pub struct GatewayPayment {
    pub id: String,
    pub status: PaymentStatus,
    pub confirmation_url: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_payment(&self, payment: NewGatewayPayment) -> Result<GatewayPayment, AppError>;
}

/// Map a processor status string onto the local lifecycle. Anything still in
/// flight counts as pending.
pub fn map_processor_status(status: &str) -> Option<PaymentStatus> {
    match status {
        "pending" | "waiting_for_capture" => Some(PaymentStatus::Pending),
        "succeeded" => Some(PaymentStatus::Succeeded),
        "canceled" => Some(PaymentStatus::Canceled),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct YooKassaConfirmation {
    confirmation_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YooKassaPaymentResponse {
    id: String,
    status: String,
    confirmation: Option<YooKassaConfirmation>,
}

/// YooKassa REST client (`POST /v3/payments`, HTTP basic auth)
#[derive(Clone)]
pub struct YooKassaGateway {
    http_client: reqwest::Client,
    api_url: String,
    shop_id: String,
    secret_key: String,
}

impl YooKassaGateway {
    pub fn new(api_url: &str, shop_id: &str, secret_key: &str) -> Result<Self, AppError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            shop_id: shop_id.to_string(),
            secret_key: secret_key.to_string(),
        })
    }

    /// `None` when shop id or secret key is missing.
    pub fn from_config(config: &PaymentConfig) -> Result<Option<Self>, AppError> {
        match (&config.shop_id, &config.secret_key) {
            (Some(shop_id), Some(secret_key)) => {
                Self::new(&config.api_url, shop_id, secret_key).map(Some)
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl PaymentGateway for YooKassaGateway {
    #[tracing::instrument(skip(self, payment), fields(amount = %payment.amount))]
    async fn create_payment(&self, payment: NewGatewayPayment) -> Result<GatewayPayment, AppError> {
        let url = format!("{}/v3/payments", self.api_url);

        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.shop_id, Some(&self.secret_key))
            .header("Idempotence-Key", &payment.idempotence_key)
            .json(&json!({
                "amount": {
                    "value": format!("{:.2}", payment.amount),
                    "currency": "RUB",
                },
                "capture": true,
                "confirmation": {
                    "type": "redirect",
                    "return_url": payment.return_url,
                },
                "description": payment.description,
                "metadata": payment.metadata,
            }))
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Payment gateway request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!(status = %status, body = %error_text, "Payment gateway rejected request");
            return Err(AppError::Upstream(format!(
                "Payment gateway returned {}",
                status
            )));
        }

        let created: YooKassaPaymentResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid payment gateway response: {}", e)))?;

        let status = map_processor_status(&created.status).ok_or_else(|| {
            AppError::Upstream(format!("Unexpected payment status: {}", created.status))
        })?;
        let confirmation_url = created
            .confirmation
            .and_then(|c| c.confirmation_url)
            .ok_or_else(|| AppError::Upstream("Payment has no confirmation URL".to_string()))?;

        tracing::info!(processor_payment_id = %created.id, "Payment created at gateway");
        Ok(GatewayPayment {
            id: created.id,
            status,
            confirmation_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(map_processor_status("waiting_for_capture"), Some(PaymentStatus::Pending));
        assert_eq!(map_processor_status("succeeded"), Some(PaymentStatus::Succeeded));
        assert_eq!(map_processor_status("canceled"), Some(PaymentStatus::Canceled));
        assert_eq!(map_processor_status("refunded"), None);
    }

    #[test]
    fn test_from_config_requires_credentials() {
        let mut config = PaymentConfig {
            shop_id: Some("shop".to_string()),
            secret_key: None,
            api_url: "https://api.yookassa.ru".to_string(),
            webhook_secret: None,
        };
        assert!(YooKassaGateway::from_config(&config).unwrap().is_none());
        config.secret_key = Some("key".to_string());
        assert!(YooKassaGateway::from_config(&config).unwrap().is_some());
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"id":"2d5c","status":"pending","paid":false,
            "confirmation":{"type":"redirect","confirmation_url":"https://pay.test/c"}}"#;
        let parsed: YooKassaPaymentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.id, "2d5c");
        assert_eq!(
            parsed.confirmation.and_then(|c| c.confirmation_url).as_deref(),
            Some("https://pay.test/c")
        );
    }
}
