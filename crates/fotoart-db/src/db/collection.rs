use async_trait::async_trait;
use chrono::NaiveDate;
use fotoart_core::{AppError, Collection, CollectionInfo};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const COLLECTION_COLUMNS: &str =
    "id, user_id, name, date, created_at, cover_url, cover_thumbnail_url, is_published";

/// Collection joined with owner username and a live photo count
const COLLECTION_INFO_SELECT: &str = r#"
    SELECT c.id, c.user_id, c.name, c.date, c.created_at, c.cover_url,
           c.cover_thumbnail_url, c.is_published, u.username,
           (SELECT COUNT(*) FROM uploaded_photos p WHERE p.collection_id = c.id) AS count_photos
    FROM collections c
    JOIN users u ON u.id = c.user_id
"#;

#[async_trait]
pub trait CollectionRepositoryTrait: Send + Sync {
    async fn create(
        &self,
        user_id: Uuid,
        name: &str,
        date: NaiveDate,
        cover_url: &str,
        cover_thumbnail_url: &str,
    ) -> Result<Collection, AppError>;

    /// Owner-scoped lookup; another user's collection is indistinguishable from a missing one.
    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Option<Collection>, AppError>;

    /// Unscoped lookup, for public access through a short link.
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Collection>, AppError>;

    async fn get_info(&self, user_id: Uuid, id: Uuid) -> Result<Option<CollectionInfo>, AppError>;

    /// Newest shoot date first. `search` is a case-insensitive substring of the name.
    async fn list_info(
        &self,
        user_id: Uuid,
        search: Option<&str>,
    ) -> Result<Vec<CollectionInfo>, AppError>;

    /// Delete the row; photos and short link go with it. `false` if not owned.
    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError>;

    async fn update_cover(
        &self,
        user_id: Uuid,
        id: Uuid,
        cover_url: &str,
        cover_thumbnail_url: &str,
    ) -> Result<bool, AppError>;
}

/// Repository for photo collections
#[derive(Clone)]
pub struct PostgresCollectionRepository {
    pool: PgPool,
}

impl PostgresCollectionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `%term%` for ILIKE with the pattern metacharacters escaped
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl CollectionRepositoryTrait for PostgresCollectionRepository {
    #[tracing::instrument(skip(self, cover_url, cover_thumbnail_url), fields(db.table = "collections", db.operation = "insert"))]
    async fn create(
        &self,
        user_id: Uuid,
        name: &str,
        date: NaiveDate,
        cover_url: &str,
        cover_thumbnail_url: &str,
    ) -> Result<Collection, AppError> {
        let collection = sqlx::query_as::<Postgres, Collection>(&format!(
            r#"
            INSERT INTO collections (user_id, name, date, cover_url, cover_thumbnail_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            COLLECTION_COLUMNS
        ))
        .bind(user_id)
        .bind(name)
        .bind(date)
        .bind(cover_url)
        .bind(cover_thumbnail_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(collection)
    }

    #[tracing::instrument(skip(self), fields(db.table = "collections", db.operation = "select", db.record_id = %id))]
    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Option<Collection>, AppError> {
        let collection = sqlx::query_as::<Postgres, Collection>(&format!(
            "SELECT {} FROM collections WHERE id = $1 AND user_id = $2",
            COLLECTION_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(collection)
    }

    #[tracing::instrument(skip(self), fields(db.table = "collections", db.operation = "select", db.record_id = %id))]
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Collection>, AppError> {
        let collection = sqlx::query_as::<Postgres, Collection>(&format!(
            "SELECT {} FROM collections WHERE id = $1",
            COLLECTION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(collection)
    }

    #[tracing::instrument(skip(self), fields(db.table = "collections", db.operation = "select", db.record_id = %id))]
    async fn get_info(&self, user_id: Uuid, id: Uuid) -> Result<Option<CollectionInfo>, AppError> {
        let info = sqlx::query_as::<Postgres, CollectionInfo>(&format!(
            "{} WHERE c.id = $1 AND c.user_id = $2",
            COLLECTION_INFO_SELECT
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(info)
    }

    #[tracing::instrument(skip(self), fields(db.table = "collections", db.operation = "select"))]
    async fn list_info(
        &self,
        user_id: Uuid,
        search: Option<&str>,
    ) -> Result<Vec<CollectionInfo>, AppError> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());

        let collections = match search {
            Some(term) => {
                sqlx::query_as::<Postgres, CollectionInfo>(&format!(
                    "{} WHERE c.user_id = $1 AND c.name ILIKE $2 ORDER BY c.date DESC, c.created_at DESC",
                    COLLECTION_INFO_SELECT
                ))
                .bind(user_id)
                .bind(like_pattern(term))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<Postgres, CollectionInfo>(&format!(
                    "{} WHERE c.user_id = $1 ORDER BY c.date DESC, c.created_at DESC",
                    COLLECTION_INFO_SELECT
                ))
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(collections)
    }

    #[tracing::instrument(skip(self), fields(db.table = "collections", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM collections WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self, cover_url, cover_thumbnail_url), fields(db.table = "collections", db.operation = "update", db.record_id = %id))]
    async fn update_cover(
        &self,
        user_id: Uuid,
        id: Uuid,
        cover_url: &str,
        cover_thumbnail_url: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE collections
            SET cover_url = $3, cover_thumbnail_url = $4
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(cover_url)
        .bind(cover_thumbnail_url)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("wed"), "%wed%");
        assert_eq!(like_pattern("100%_a"), "%100\\%\\_a%");
    }
}
