//! Subscription purchase, status and processor webhook handlers

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use fotoart_core::models::{
    BooleanResponse, CreatePaymentRequest, CreatePaymentResponse, PaymentStatusResponse,
};
use fotoart_core::SubscriptionInfo;
use fotoart_services::payment::webhook::SIGNATURE_HEADER;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/payment/create",
    tag = "payments",
    security(("bearer_auth" = [])),
    request_body = CreatePaymentRequest,
    responses(
        (status = 200, description = "Payment opened; redirect the user to confirmation_url", body = CreatePaymentResponse),
        (status = 400, description = "Unknown plan", body = ErrorResponse),
        (status = 500, description = "Payment gateway unavailable", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn create_payment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<CreatePaymentRequest>,
) -> Result<Json<CreatePaymentResponse>, HttpAppError> {
    let created = state
        .payments
        .create_payment(user.user_id, &request.plan)
        .await?;
    Ok(Json(created))
}

#[utoipa::path(
    get,
    path = "/payment/{id}/status",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Current payment status", body = PaymentStatusResponse),
        (status = 404, description = "Payment not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn payment_status(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentStatusResponse>, HttpAppError> {
    Ok(Json(state.payments.get_status(user.user_id, id).await?))
}

#[utoipa::path(
    get,
    path = "/subscription",
    tag = "payments",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Subscription state", body = SubscriptionInfo)
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn subscription(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<SubscriptionInfo>, HttpAppError> {
    Ok(Json(state.payments.subscription(user.user_id).await?))
}

/// Payment processor notification. The raw body is needed for the HMAC check.
#[utoipa::path(
    post,
    path = "/payment/webhook",
    tag = "payments",
    request_body(content = serde_json::Value, content_type = "application/json"),
    params(("X-Content-HMAC" = Option<String>, Header, description = "Hex HMAC-SHA256 of the body")),
    responses(
        (status = 200, description = "Notification applied", body = BooleanResponse),
        (status = 400, description = "Malformed body or unsupported status", body = ErrorResponse),
        (status = 401, description = "Missing or invalid signature", body = ErrorResponse),
        (status = 404, description = "Unknown payment", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, headers, body), fields(body_len = body.len()))]
pub async fn payment_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<BooleanResponse>, HttpAppError> {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    state.payments.process_webhook(&body, signature).await?;
    Ok(Json(BooleanResponse::ok()))
}
