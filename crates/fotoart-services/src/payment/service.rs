use std::sync::Arc;

use chrono::Utc;
use fotoart_core::models::{CreatePaymentResponse, PaymentStatusResponse};
use fotoart_core::{AppError, PaymentStatus, SubscriptionInfo, SubscriptionPlan};
use fotoart_db::{PaymentRepositoryTrait, UserRepositoryTrait};
use serde_json::json;
use uuid::Uuid;

use super::gateway::{NewGatewayPayment, PaymentGateway};
use super::webhook::{verify_signature, WebhookNotification};
use crate::auth::service::current_subscription;

/// Subscription purchases and processor notifications
#[derive(Clone)]
pub struct PaymentService {
    payments: Arc<dyn PaymentRepositoryTrait>,
    users: Arc<dyn UserRepositoryTrait>,
    gateway: Option<Arc<dyn PaymentGateway>>,
    webhook_secret: Option<String>,
    frontend_url: String,
}

impl PaymentService {
    pub fn new(
        payments: Arc<dyn PaymentRepositoryTrait>,
        users: Arc<dyn UserRepositoryTrait>,
        gateway: Option<Arc<dyn PaymentGateway>>,
        webhook_secret: Option<String>,
        frontend_url: &str,
    ) -> Self {
        Self {
            payments,
            users,
            gateway,
            webhook_secret,
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
        }
    }

    /// Open a payment for `plan` at the processor and remember it locally.
    #[tracing::instrument(skip(self))]
    pub async fn create_payment(
        &self,
        user_id: Uuid,
        plan: &str,
    ) -> Result<CreatePaymentResponse, AppError> {
        let plan: SubscriptionPlan = plan.parse()?;
        let gateway = self
            .gateway
            .as_ref()
            .ok_or_else(|| AppError::Upstream("Payment gateway is not configured".to_string()))?;

        let payment_id = Uuid::new_v4();
        let amount = plan.amount();
        let created = gateway
            .create_payment(NewGatewayPayment {
                amount,
                description: format!("Fotoart subscription ({})", plan),
                return_url: format!(
                    "{}/subscription/result?payment_id={}",
                    self.frontend_url, payment_id
                ),
                idempotence_key: payment_id.to_string(),
                metadata: json!({
                    "payment_id": payment_id,
                    "user_id": user_id,
                    "plan": plan.as_str(),
                }),
            })
            .await?;

        self.payments
            .create(payment_id, user_id, &created.id, plan, amount, created.status)
            .await?;

        tracing::info!(
            payment_id = %payment_id,
            processor_payment_id = %created.id,
            plan = %plan,
            "Payment created"
        );

        Ok(CreatePaymentResponse {
            payment_id,
            confirmation_url: created.confirmation_url,
        })
    }

    pub async fn get_status(
        &self,
        user_id: Uuid,
        payment_id: Uuid,
    ) -> Result<PaymentStatusResponse, AppError> {
        let payment = self
            .payments
            .get(user_id, payment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;
        Ok(PaymentStatusResponse {
            status: payment.status,
        })
    }

    /// Apply a processor notification. `signature` is the `X-Content-HMAC`
    /// header value, required whenever a webhook secret is configured.
    #[tracing::instrument(skip(self, body, signature))]
    pub async fn process_webhook(
        &self,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<(), AppError> {
        if let Some(secret) = &self.webhook_secret {
            let signature = signature
                .ok_or_else(|| AppError::Unauthorized("Missing webhook signature".to_string()))?;
            if !verify_signature(secret, body, signature) {
                tracing::warn!("Rejected webhook with invalid signature");
                return Err(AppError::Unauthorized(
                    "Invalid webhook signature".to_string(),
                ));
            }
        }

        let notification: WebhookNotification = serde_json::from_slice(body)
            .map_err(|e| AppError::InvalidInput(format!("Invalid webhook body: {}", e)))?;
        let processor_payment_id = notification.object.id.as_str();

        match notification.object.status.as_str() {
            "pending" | "waiting_for_capture" => {
                tracing::info!(
                    processor_payment_id,
                    event = %notification.event,
                    "Payment still pending"
                );
            }
            "succeeded" => {
                match self
                    .payments
                    .apply_successful_payment(processor_payment_id, Utc::now())
                    .await?
                {
                    Some(expires_at) => tracing::info!(
                        processor_payment_id,
                        expires_at = %expires_at,
                        "Subscription extended"
                    ),
                    None => tracing::info!(processor_payment_id, "Payment already applied"),
                }
            }
            "canceled" => {
                let payment = self
                    .payments
                    .update_status(processor_payment_id, PaymentStatus::Canceled)
                    .await?;
                tracing::info!(
                    processor_payment_id,
                    status = %payment.status,
                    "Payment canceled"
                );
            }
            other => {
                return Err(AppError::InvalidInput(format!(
                    "Unsupported payment status: {}",
                    other
                )));
            }
        }

        Ok(())
    }

    pub async fn subscription(&self, user_id: Uuid) -> Result<SubscriptionInfo, AppError> {
        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        current_subscription(self.users.as_ref(), &user).await
    }
}
