use std::sync::Arc;

use chrono::Utc;
use fotoart_core::models::{
    LoginRequest, ProfileResponse, RegisterRequest, ResetPasswordRequest, TokenResponse,
};
use fotoart_core::{AppError, SubscriptionInfo, User};
use fotoart_db::UserRepositoryTrait;
use subtle::ConstantTimeEq;
use uuid::Uuid;
use validator::Validate;

use super::jwt::{JwtService, TokenKind};
use super::mailer::Mailer;
use super::password::{hash_password, verify_password};
use crate::token::{random_url_token, RESET_TOKEN_BYTES};

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn secure_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Subscription state of `user` now. A stored active flag whose expiry has
/// passed is switched off on the way out.
pub async fn current_subscription(
    users: &dyn UserRepositoryTrait,
    user: &User,
) -> Result<SubscriptionInfo, AppError> {
    let info = SubscriptionInfo::at(user.subscription_expires_at, Utc::now());
    if user.subscription_active && !info.active {
        users
            .set_subscription(user.id, false, user.subscription_expires_at)
            .await?;
        tracing::info!(user_id = %user.id, "Subscription expired");
    }
    Ok(info)
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepositoryTrait>,
    jwt: JwtService,
    mailer: Arc<dyn Mailer>,
    frontend_url: String,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepositoryTrait>,
        jwt: JwtService,
        mailer: Arc<dyn Mailer>,
        frontend_url: &str,
    ) -> Self {
        Self {
            users,
            jwt,
            mailer,
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fresh access/refresh pair; the refresh token replaces the stored one.
    async fn issue_pair(&self, user_id: Uuid) -> Result<TokenResponse, AppError> {
        let access_token = self.jwt.issue(user_id, TokenKind::Access)?;
        let refresh_token = self.jwt.issue(user_id, TokenKind::Refresh)?;
        self.users
            .set_refresh_token(user_id, Some(&refresh_token))
            .await?;

        Ok(TokenResponse {
            access_token,
            refresh_token,
        })
    }

    #[tracing::instrument(skip_all)]
    pub async fn register(&self, request: RegisterRequest) -> Result<TokenResponse, AppError> {
        request.validate()?;

        let password_hash = hash_password(&request.password)?;
        let user = self
            .users
            .create(
                request.username.trim(),
                &normalize_email(&request.email),
                &password_hash,
            )
            .await?;

        tracing::info!(user_id = %user.id, "User registered");
        self.issue_pair(user.id).await
    }

    #[tracing::instrument(skip_all)]
    pub async fn login(&self, request: LoginRequest) -> Result<TokenResponse, AppError> {
        request.validate()?;
        let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

        let user = self
            .users
            .get_by_email(&normalize_email(&request.email))
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(&request.password, &user.password)? {
            tracing::debug!(user_id = %user.id, "Login rejected");
            return Err(invalid());
        }

        self.issue_pair(user.id).await
    }

    /// Rotate both tokens. Only the most recently issued refresh token works.
    #[tracing::instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AppError> {
        let claims = self.jwt.verify(refresh_token, TokenKind::Refresh)?;
        let user = self
            .users
            .get_by_id(claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Unknown user".to_string()))?;

        let current = user.refresh_token.as_deref().unwrap_or_default();
        if !secure_compare(current, refresh_token) {
            return Err(AppError::Unauthorized(
                "Refresh token has been revoked".to_string(),
            ));
        }

        self.issue_pair(user.id).await
    }

    /// Store a reset token and mail the reset link. Unknown addresses succeed
    /// silently.
    #[tracing::instrument(skip_all)]
    pub async fn forgot_password(&self, email: &str) -> Result<(), AppError> {
        let Some(user) = self.users.get_by_email(&normalize_email(email)).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let token = random_url_token(RESET_TOKEN_BYTES);
        self.users.set_reset_token(user.id, &token).await?;

        let link = format!("{}/reset-password?token={}", self.frontend_url, token);
        let body = format!(
            "Hello {},\n\nFollow this link to choose a new password:\n{}\n\nIf you did not ask for a reset, ignore this message.",
            user.username, link
        );
        self.mailer
            .send(&user.email, "Fotoart password reset", &body)
            .await
            .map_err(|e| e.context("Failed to send reset email"))?;

        tracing::info!(user_id = %user.id, "Password reset issued");
        Ok(())
    }

    /// Consume `token` and set the new password. The token works once.
    #[tracing::instrument(skip_all)]
    pub async fn reset_password(
        &self,
        token: &str,
        request: ResetPasswordRequest,
    ) -> Result<(), AppError> {
        request.validate()?;
        if token.is_empty() {
            return Err(AppError::InvalidInput("Reset token is required".to_string()));
        }

        let password_hash = hash_password(&request.new_password)?;
        if !self.users.reset_password(token, &password_hash).await? {
            return Err(AppError::NotFound(
                "Invalid or already used reset token".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve a bearer access token to its user id.
    pub fn authenticate(&self, access_token: &str) -> Result<Uuid, AppError> {
        Ok(self.jwt.verify(access_token, TokenKind::Access)?.sub)
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<ProfileResponse, AppError> {
        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        let subscription = current_subscription(self.users.as_ref(), &user).await?;

        Ok(ProfileResponse {
            id: user.id,
            username: user.username,
            email: user.email,
            subscription,
        })
    }
}
