use async_trait::async_trait;
use fotoart_core::{AppError, ShortLink, ShortLinkInfo};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::transaction::with_transaction;

const SHORT_LINK_COLUMNS: &str = "id, collection_id, token, url, created_at, click_count";

#[async_trait]
pub trait ShortLinkRepositoryTrait: Send + Sync {
    async fn get_by_collection(&self, collection_id: Uuid) -> Result<Option<ShortLink>, AppError>;

    async fn get_by_token(&self, token: &str) -> Result<Option<ShortLink>, AppError>;

    /// Link joined with the collection name, covers and owner username.
    async fn get_info(&self, token: &str) -> Result<Option<ShortLinkInfo>, AppError>;

    /// Mark the collection published and make sure it has a link, atomically.
    ///
    /// `token`/`url` are only used when no link exists yet; otherwise the
    /// existing link is returned untouched. `None` means the collection does
    /// not exist or is not owned by `user_id`.
    async fn publish(
        &self,
        user_id: Uuid,
        collection_id: Uuid,
        token: &str,
        url: &str,
    ) -> Result<Option<ShortLink>, AppError>;

    /// Clear the published flag and drop the link, atomically. `NotFound` when
    /// the collection is not owned, not published, or has no link; nothing is
    /// changed in that case.
    async fn unpublish(&self, user_id: Uuid, collection_id: Uuid) -> Result<(), AppError>;

    async fn increment_clicks(&self, token: &str) -> Result<(), AppError>;
}

/// Repository for public short links
#[derive(Clone)]
pub struct PostgresShortLinkRepository {
    pool: PgPool,
}

impl PostgresShortLinkRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShortLinkRepositoryTrait for PostgresShortLinkRepository {
    #[tracing::instrument(skip(self), fields(db.table = "short_links", db.operation = "select"))]
    async fn get_by_collection(&self, collection_id: Uuid) -> Result<Option<ShortLink>, AppError> {
        let link = sqlx::query_as::<Postgres, ShortLink>(&format!(
            "SELECT {} FROM short_links WHERE collection_id = $1",
            SHORT_LINK_COLUMNS
        ))
        .bind(collection_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(link)
    }

    #[tracing::instrument(skip(self), fields(db.table = "short_links", db.operation = "select"))]
    async fn get_by_token(&self, token: &str) -> Result<Option<ShortLink>, AppError> {
        let link = sqlx::query_as::<Postgres, ShortLink>(&format!(
            "SELECT {} FROM short_links WHERE token = $1",
            SHORT_LINK_COLUMNS
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(link)
    }

    #[tracing::instrument(skip(self), fields(db.table = "short_links", db.operation = "select"))]
    async fn get_info(&self, token: &str) -> Result<Option<ShortLinkInfo>, AppError> {
        let info = sqlx::query_as::<Postgres, ShortLinkInfo>(
            r#"
            SELECT s.id, s.collection_id, s.url, s.token, s.created_at, s.click_count,
                   c.name, u.username, c.cover_url, c.cover_thumbnail_url
            FROM short_links s
            JOIN collections c ON c.id = s.collection_id
            JOIN users u ON u.id = c.user_id
            WHERE s.token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(info)
    }

    #[tracing::instrument(skip(self, token, url), fields(db.table = "short_links", db.operation = "publish", db.record_id = %collection_id))]
    async fn publish(
        &self,
        user_id: Uuid,
        collection_id: Uuid,
        token: &str,
        url: &str,
    ) -> Result<Option<ShortLink>, AppError> {
        let token = token.to_string();
        let url = url.to_string();

        with_transaction(&self.pool, move |tx| {
            Box::pin(async move {
                let flagged = sqlx::query(
                    "UPDATE collections SET is_published = TRUE WHERE id = $1 AND user_id = $2",
                )
                .bind(collection_id)
                .bind(user_id)
                .execute(&mut **tx)
                .await?;

                if flagged.rows_affected() == 0 {
                    return Ok(None);
                }

                // The unique constraint on collection_id settles concurrent publishes.
                sqlx::query(
                    r#"
                    INSERT INTO short_links (collection_id, token, url)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (collection_id) DO NOTHING
                    "#,
                )
                .bind(collection_id)
                .bind(&token)
                .bind(&url)
                .execute(&mut **tx)
                .await?;

                let link = sqlx::query_as::<Postgres, ShortLink>(&format!(
                    "SELECT {} FROM short_links WHERE collection_id = $1",
                    SHORT_LINK_COLUMNS
                ))
                .bind(collection_id)
                .fetch_one(&mut **tx)
                .await?;

                Ok::<_, AppError>(Some(link))
            })
        })
        .await
    }

    #[tracing::instrument(skip(self), fields(db.table = "short_links", db.operation = "unpublish", db.record_id = %collection_id))]
    async fn unpublish(&self, user_id: Uuid, collection_id: Uuid) -> Result<(), AppError> {
        with_transaction(&self.pool, move |tx| {
            Box::pin(async move {
                let flagged = sqlx::query(
                    r#"
                    UPDATE collections SET is_published = FALSE
                    WHERE id = $1 AND user_id = $2 AND is_published
                    "#,
                )
                .bind(collection_id)
                .bind(user_id)
                .execute(&mut **tx)
                .await?;

                if flagged.rows_affected() == 0 {
                    return Err(AppError::NotFound(
                        "Published collection not found".to_string(),
                    ));
                }

                let removed = sqlx::query("DELETE FROM short_links WHERE collection_id = $1")
                    .bind(collection_id)
                    .execute(&mut **tx)
                    .await?;

                if removed.rows_affected() == 0 {
                    return Err(AppError::NotFound("Short link not found".to_string()));
                }

                Ok::<_, AppError>(())
            })
        })
        .await
    }

    #[tracing::instrument(skip(self), fields(db.table = "short_links", db.operation = "update"))]
    async fn increment_clicks(&self, token: &str) -> Result<(), AppError> {
        let result =
            sqlx::query("UPDATE short_links SET click_count = click_count + 1 WHERE token = $1")
                .bind(token)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Short link not found".to_string()));
        }
        Ok(())
    }
}
