//! Registration, login and password reset handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use fotoart_core::models::{
    BooleanResponse, ForgotPasswordRequest, LoginRequest, ProfileResponse, RefreshRequest,
    RegisterRequest, ResetPasswordRequest, TokenResponse,
};
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = TokenResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request))]
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let tokens = state.auth.register(request).await?;
    Ok((StatusCode::CREATED, Json(tokens)))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = TokenResponse),
        (status = 401, description = "Invalid email or password", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request))]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<TokenResponse>, HttpAppError> {
    Ok(Json(state.auth.login(request).await?))
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New token pair", body = TokenResponse),
        (status = 401, description = "Refresh token invalid or revoked", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request))]
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<RefreshRequest>,
) -> Result<Json<TokenResponse>, HttpAppError> {
    request
        .validate()
        .map_err(|e| HttpAppError(e.into()))?;
    Ok(Json(state.auth.refresh(&request.refresh_token).await?))
}

/// Always succeeds for well-formed emails, registered or not.
#[utoipa::path(
    post,
    path = "/auth/forgot-password",
    tag = "auth",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset mail sent if the account exists", body = BooleanResponse),
        (status = 400, description = "Invalid email", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request))]
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<ForgotPasswordRequest>,
) -> Result<Json<BooleanResponse>, HttpAppError> {
    request
        .validate()
        .map_err(|e| HttpAppError(e.into()))?;
    state.auth.forgot_password(&request.email).await?;
    Ok(Json(BooleanResponse::ok()))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ResetPasswordQuery {
    /// Token from the reset mail
    pub token: String,
}

#[utoipa::path(
    post,
    path = "/auth/reset-password",
    tag = "auth",
    params(ResetPasswordQuery),
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = BooleanResponse),
        (status = 404, description = "Token unknown or already used", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, query, request))]
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ResetPasswordQuery>,
    ValidatedJson(request): ValidatedJson<ResetPasswordRequest>,
) -> Result<Json<BooleanResponse>, HttpAppError> {
    state.auth.reset_password(&query.token, request).await?;
    Ok(Json(BooleanResponse::ok()))
}

#[utoipa::path(
    get,
    path = "/profile",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = ProfileResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<ProfileResponse>, HttpAppError> {
    Ok(Json(state.auth.profile(user.user_id).await?))
}
