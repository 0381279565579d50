use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fotoart_core::{AppError, User};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const USER_COLUMNS: &str = "id, username, email, password, refresh_token, reset_token, \
     subscription_active, subscription_expires_at, created_at";

#[async_trait]
pub trait UserRepositoryTrait: Send + Sync {
    /// Insert a new account. A taken email is `Conflict`.
    async fn create(&self, username: &str, email: &str, password_hash: &str)
        -> Result<User, AppError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Overwrite the single active refresh token (`None` revokes it).
    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<(), AppError>;

    async fn set_reset_token(&self, id: Uuid, token: &str) -> Result<(), AppError>;

    /// Consume a reset token: set the new hash and clear the token in one write.
    /// Returns `false` when no user holds `token`.
    async fn reset_password(&self, token: &str, password_hash: &str) -> Result<bool, AppError>;

    async fn set_subscription(
        &self,
        id: Uuid,
        active: bool,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), AppError>;
}

/// Repository for photographer accounts
#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepositoryTrait for PostgresUserRepository {
    #[tracing::instrument(skip(self, password_hash), fields(db.table = "users", db.operation = "insert"))]
    async fn create(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<Postgres, User>(&format!(
            r#"
            INSERT INTO users (username, email, password)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => {
                AppError::Conflict("User with this email already exists".to_string())
            }
            other => other,
        })?;

        Ok(user)
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select", db.record_id = %id))]
    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<Postgres, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<Postgres, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    #[tracing::instrument(skip(self, token), fields(db.table = "users", db.operation = "update", db.record_id = %id))]
    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET refresh_token = $2 WHERE id = $1")
            .bind(id)
            .bind(token)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, token), fields(db.table = "users", db.operation = "update", db.record_id = %id))]
    async fn set_reset_token(&self, id: Uuid, token: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET reset_token = $2 WHERE id = $1")
            .bind(id)
            .bind(token)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(db.table = "users", db.operation = "update"))]
    async fn reset_password(&self, token: &str, password_hash: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password = $2, reset_token = NULL, refresh_token = NULL
            WHERE reset_token = $1
            "#,
        )
        .bind(token)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "update", db.record_id = %id))]
    async fn set_subscription(
        &self,
        id: Uuid,
        active: bool,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE users SET subscription_active = $2, subscription_expires_at = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(active)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
