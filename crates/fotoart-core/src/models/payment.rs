use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

/// Subscription plans sold through the payment gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "subscription_plan", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPlan {
    Month,
    Year,
}

impl SubscriptionPlan {
    pub fn duration(&self) -> Duration {
        match self {
            SubscriptionPlan::Month => Duration::days(30),
            SubscriptionPlan::Year => Duration::days(365),
        }
    }

    /// Price in RUB
    pub fn amount(&self) -> Decimal {
        match self {
            SubscriptionPlan::Month => Decimal::new(29900, 2),
            SubscriptionPlan::Year => Decimal::new(194300, 2),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionPlan::Month => "month",
            SubscriptionPlan::Year => "year",
        }
    }
}

impl FromStr for SubscriptionPlan {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "month" => Ok(SubscriptionPlan::Month),
            "year" => Ok(SubscriptionPlan::Year),
            other => Err(AppError::InvalidInput(format!("Unknown plan: {}", other))),
        }
    }
}

impl fmt::Display for SubscriptionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "payment_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Canceled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Succeeded => "succeeded",
            PaymentStatus::Canceled => "canceled",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "succeeded" => Ok(PaymentStatus::Succeeded),
            "canceled" => Ok(PaymentStatus::Canceled),
            other => Err(AppError::InvalidInput(format!(
                "Invalid payment status: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Locally persisted payment, keyed externally by `processor_payment_id`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PaymentRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub processor_payment_id: String,
    pub plan: SubscriptionPlan,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePaymentRequest {
    pub plan: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatePaymentResponse {
    pub payment_id: Uuid,
    pub confirmation_url: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentStatusResponse {
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionInfo {
    pub active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub days_left: i64,
}

impl SubscriptionInfo {
    /// Derive the subscription view at `now`. A subscription is active only while
    /// `now` is before the expiry, whatever the stored flag says.
    pub fn at(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        match expires_at {
            Some(expiry) if now < expiry => Self {
                active: true,
                expires_at: Some(expiry),
                days_left: (expiry - now).num_hours() / 24,
            },
            _ => Self {
                active: false,
                expires_at,
                days_left: 0,
            },
        }
    }
}

/// New expiry after a successful payment: renewals stack from the later of the
/// current expiry and `now`.
pub fn extend_expiry(
    current: Option<DateTime<Utc>>,
    plan: SubscriptionPlan,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let start = match current {
        Some(expiry) if expiry > now => expiry,
        _ => now,
    };
    start + plan.duration()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_prices() {
        assert_eq!(SubscriptionPlan::Month.amount().to_string(), "299.00");
        assert_eq!(SubscriptionPlan::Year.amount().to_string(), "1943.00");
        assert_eq!(SubscriptionPlan::Month.duration(), Duration::days(30));
        assert_eq!(SubscriptionPlan::Year.duration(), Duration::days(365));
    }

    #[test]
    fn test_unknown_plan_is_validation_error() {
        let err = "weekly".parse::<SubscriptionPlan>().unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_extend_from_now_when_expired_or_missing() {
        let now = Utc::now();
        assert_eq!(
            extend_expiry(None, SubscriptionPlan::Month, now),
            now + Duration::days(30)
        );
        let expired = now - Duration::days(3);
        assert_eq!(
            extend_expiry(Some(expired), SubscriptionPlan::Month, now),
            now + Duration::days(30)
        );
    }

    #[test]
    fn test_extend_stacks_on_future_expiry() {
        let now = Utc::now();
        let current = now + Duration::days(10);
        assert_eq!(
            extend_expiry(Some(current), SubscriptionPlan::Year, now),
            current + Duration::days(365)
        );
    }

    #[test]
    fn test_subscription_info_days_left() {
        let now = Utc::now();
        let info = SubscriptionInfo::at(Some(now + Duration::hours(49)), now);
        assert!(info.active);
        assert_eq!(info.days_left, 2);

        let info = SubscriptionInfo::at(Some(now - Duration::hours(1)), now);
        assert!(!info.active);
        assert_eq!(info.days_left, 0);

        let info = SubscriptionInfo::at(None, now);
        assert!(!info.active);
        assert!(info.expires_at.is_none());
    }
}
