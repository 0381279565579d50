use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fotoart_core::models::extend_expiry;
use fotoart_core::{AppError, PaymentRecord, PaymentStatus, SubscriptionPlan};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::transaction::with_transaction;

const PAYMENT_COLUMNS: &str =
    "id, user_id, processor_payment_id, plan, amount, status, created_at, updated_at";

#[async_trait]
pub trait PaymentRepositoryTrait: Send + Sync {
    /// `id` is chosen by the caller so it can be embedded in the gateway return URL.
    async fn create(
        &self,
        id: Uuid,
        user_id: Uuid,
        processor_payment_id: &str,
        plan: SubscriptionPlan,
        amount: Decimal,
        status: PaymentStatus,
    ) -> Result<PaymentRecord, AppError>;

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Option<PaymentRecord>, AppError>;

    async fn get_by_processor_id(
        &self,
        processor_payment_id: &str,
    ) -> Result<Option<PaymentRecord>, AppError>;

    /// Mark the payment succeeded and extend its owner's subscription in one
    /// transaction. Returns the new expiry, or `None` when the payment had
    /// already succeeded (nothing changes). Unknown ids are `NotFound`.
    async fn apply_successful_payment(
        &self,
        processor_payment_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, AppError>;

    /// Record a non-success status. A succeeded payment is never downgraded.
    async fn update_status(
        &self,
        processor_payment_id: &str,
        status: PaymentStatus,
    ) -> Result<PaymentRecord, AppError>;
}

/// Repository for subscription payments
#[derive(Clone)]
pub struct PostgresPaymentRepository {
    pool: PgPool,
}

impl PostgresPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepositoryTrait for PostgresPaymentRepository {
    #[tracing::instrument(skip(self), fields(db.table = "payments", db.operation = "insert"))]
    async fn create(
        &self,
        id: Uuid,
        user_id: Uuid,
        processor_payment_id: &str,
        plan: SubscriptionPlan,
        amount: Decimal,
        status: PaymentStatus,
    ) -> Result<PaymentRecord, AppError> {
        let payment = sqlx::query_as::<Postgres, PaymentRecord>(&format!(
            r#"
            INSERT INTO payments (id, user_id, processor_payment_id, plan, amount, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .bind(processor_payment_id)
        .bind(plan)
        .bind(amount)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok(payment)
    }

    #[tracing::instrument(skip(self), fields(db.table = "payments", db.operation = "select", db.record_id = %id))]
    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Option<PaymentRecord>, AppError> {
        let payment = sqlx::query_as::<Postgres, PaymentRecord>(&format!(
            "SELECT {} FROM payments WHERE id = $1 AND user_id = $2",
            PAYMENT_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    #[tracing::instrument(skip(self), fields(db.table = "payments", db.operation = "select"))]
    async fn get_by_processor_id(
        &self,
        processor_payment_id: &str,
    ) -> Result<Option<PaymentRecord>, AppError> {
        let payment = sqlx::query_as::<Postgres, PaymentRecord>(&format!(
            "SELECT {} FROM payments WHERE processor_payment_id = $1",
            PAYMENT_COLUMNS
        ))
        .bind(processor_payment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    #[tracing::instrument(skip(self), fields(db.table = "payments", db.operation = "apply"))]
    async fn apply_successful_payment(
        &self,
        processor_payment_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, AppError> {
        let processor_payment_id = processor_payment_id.to_string();

        with_transaction(&self.pool, move |tx| {
            Box::pin(async move {
                // Row lock serializes duplicate webhook deliveries.
                let payment = sqlx::query_as::<Postgres, PaymentRecord>(&format!(
                    "SELECT {} FROM payments WHERE processor_payment_id = $1 FOR UPDATE",
                    PAYMENT_COLUMNS
                ))
                .bind(&processor_payment_id)
                .fetch_optional(&mut **tx)
                .await?
                .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;

                if payment.status == PaymentStatus::Succeeded {
                    return Ok(None);
                }

                let current = sqlx::query_scalar::<Postgres, Option<DateTime<Utc>>>(
                    "SELECT subscription_expires_at FROM users WHERE id = $1 FOR UPDATE",
                )
                .bind(payment.user_id)
                .fetch_one(&mut **tx)
                .await?;

                let expires_at = extend_expiry(current, payment.plan, now);

                sqlx::query(
                    r#"
                    UPDATE users
                    SET subscription_active = TRUE, subscription_expires_at = $2
                    WHERE id = $1
                    "#,
                )
                .bind(payment.user_id)
                .bind(expires_at)
                .execute(&mut **tx)
                .await?;

                sqlx::query(
                    "UPDATE payments SET status = $2, updated_at = NOW() WHERE id = $1",
                )
                .bind(payment.id)
                .bind(PaymentStatus::Succeeded)
                .execute(&mut **tx)
                .await?;

                Ok::<_, AppError>(Some(expires_at))
            })
        })
        .await
    }

    #[tracing::instrument(skip(self), fields(db.table = "payments", db.operation = "update"))]
    async fn update_status(
        &self,
        processor_payment_id: &str,
        status: PaymentStatus,
    ) -> Result<PaymentRecord, AppError> {
        let updated = sqlx::query_as::<Postgres, PaymentRecord>(&format!(
            r#"
            UPDATE payments SET status = $2, updated_at = NOW()
            WHERE processor_payment_id = $1 AND status <> 'succeeded'
            RETURNING {}
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(processor_payment_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(payment) => Ok(payment),
            None => self
                .get_by_processor_id(processor_payment_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Payment not found".to_string())),
        }
    }
}
