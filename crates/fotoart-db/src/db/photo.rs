use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fotoart_core::{AppError, PhotoSort, UploadedPhoto};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const PHOTO_COLUMNS: &str = "id, collection_id, user_id, original_url, thumbnail_url, \
     file_name, file_ext, hash_name, is_favorite, uploaded_at";

/// Row to insert after both objects of an upload have been stored.
#[derive(Debug, Clone)]
pub struct NewPhoto {
    pub collection_id: Uuid,
    pub user_id: Uuid,
    pub original_url: String,
    pub thumbnail_url: String,
    pub file_name: String,
    pub file_ext: String,
    pub hash_name: String,
    pub uploaded_at: DateTime<Utc>,
}

#[async_trait]
pub trait PhotoRepositoryTrait: Send + Sync {
    async fn insert(&self, photo: NewPhoto) -> Result<UploadedPhoto, AppError>;

    /// Photos of one collection in `sort` order, optionally favorites only.
    /// Ownership is checked by the caller.
    async fn list(
        &self,
        collection_id: Uuid,
        sort: PhotoSort,
        favorites_only: bool,
    ) -> Result<Vec<UploadedPhoto>, AppError>;

    async fn count(&self, collection_id: Uuid) -> Result<i64, AppError>;

    async fn get(&self, user_id: Uuid, photo_id: Uuid) -> Result<Option<UploadedPhoto>, AppError>;

    async fn delete(&self, user_id: Uuid, photo_id: Uuid) -> Result<bool, AppError>;

    /// Rows in `collection_id` still pointing at the object named `hash_name`.
    async fn count_by_hash(&self, collection_id: Uuid, hash_name: &str) -> Result<i64, AppError>;

    async fn set_favorite(
        &self,
        user_id: Uuid,
        photo_id: Uuid,
        is_favorite: bool,
    ) -> Result<Option<UploadedPhoto>, AppError>;
}

/// ORDER BY clause for a sort key. Ties break on id so paging stays stable.
/// Names compare byte-wise under the "C" collation, independent of the
/// cluster locale.
pub fn order_by_clause(sort: PhotoSort) -> &'static str {
    match sort {
        PhotoSort::UploadedNew => "uploaded_at DESC, id DESC",
        PhotoSort::UploadedOld => "uploaded_at ASC, id ASC",
        PhotoSort::NameAz => r#"file_name COLLATE "C" ASC, id ASC"#,
        PhotoSort::NameZa => r#"file_name COLLATE "C" DESC, id DESC"#,
        PhotoSort::Random => "random()",
    }
}

/// Repository for uploaded photos
#[derive(Clone)]
pub struct PostgresPhotoRepository {
    pool: PgPool,
}

impl PostgresPhotoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PhotoRepositoryTrait for PostgresPhotoRepository {
    #[tracing::instrument(skip(self, photo), fields(db.table = "uploaded_photos", db.operation = "insert", collection_id = %photo.collection_id))]
    async fn insert(&self, photo: NewPhoto) -> Result<UploadedPhoto, AppError> {
        let row = sqlx::query_as::<Postgres, UploadedPhoto>(&format!(
            r#"
            INSERT INTO uploaded_photos
                (collection_id, user_id, original_url, thumbnail_url, file_name, file_ext, hash_name, uploaded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            PHOTO_COLUMNS
        ))
        .bind(photo.collection_id)
        .bind(photo.user_id)
        .bind(&photo.original_url)
        .bind(&photo.thumbnail_url)
        .bind(&photo.file_name)
        .bind(&photo.file_ext)
        .bind(&photo.hash_name)
        .bind(photo.uploaded_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "uploaded_photos", db.operation = "select"))]
    async fn list(
        &self,
        collection_id: Uuid,
        sort: PhotoSort,
        favorites_only: bool,
    ) -> Result<Vec<UploadedPhoto>, AppError> {
        // The ORDER BY text comes from a closed enum, never from input.
        let sql = format!(
            "SELECT {} FROM uploaded_photos WHERE collection_id = $1 AND ($2 = FALSE OR is_favorite) ORDER BY {}",
            PHOTO_COLUMNS,
            order_by_clause(sort)
        );

        let photos = sqlx::query_as::<Postgres, UploadedPhoto>(&sql)
            .bind(collection_id)
            .bind(favorites_only)
            .fetch_all(&self.pool)
            .await?;

        Ok(photos)
    }

    #[tracing::instrument(skip(self), fields(db.table = "uploaded_photos", db.operation = "count"))]
    async fn count(&self, collection_id: Uuid) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<Postgres, i64>(
            "SELECT COUNT(*) FROM uploaded_photos WHERE collection_id = $1",
        )
        .bind(collection_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    #[tracing::instrument(skip(self), fields(db.table = "uploaded_photos", db.operation = "select", db.record_id = %photo_id))]
    async fn get(&self, user_id: Uuid, photo_id: Uuid) -> Result<Option<UploadedPhoto>, AppError> {
        let photo = sqlx::query_as::<Postgres, UploadedPhoto>(&format!(
            "SELECT {} FROM uploaded_photos WHERE id = $1 AND user_id = $2",
            PHOTO_COLUMNS
        ))
        .bind(photo_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(photo)
    }

    #[tracing::instrument(skip(self), fields(db.table = "uploaded_photos", db.operation = "delete", db.record_id = %photo_id))]
    async fn delete(&self, user_id: Uuid, photo_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM uploaded_photos WHERE id = $1 AND user_id = $2")
            .bind(photo_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "uploaded_photos", db.operation = "count"))]
    async fn count_by_hash(&self, collection_id: Uuid, hash_name: &str) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<Postgres, i64>(
            "SELECT COUNT(*) FROM uploaded_photos WHERE collection_id = $1 AND hash_name = $2",
        )
        .bind(collection_id)
        .bind(hash_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    #[tracing::instrument(skip(self), fields(db.table = "uploaded_photos", db.operation = "update", db.record_id = %photo_id))]
    async fn set_favorite(
        &self,
        user_id: Uuid,
        photo_id: Uuid,
        is_favorite: bool,
    ) -> Result<Option<UploadedPhoto>, AppError> {
        let photo = sqlx::query_as::<Postgres, UploadedPhoto>(&format!(
            "UPDATE uploaded_photos SET is_favorite = $3 WHERE id = $1 AND user_id = $2 RETURNING {}",
            PHOTO_COLUMNS
        ))
        .bind(photo_id)
        .bind(user_id)
        .bind(is_favorite)
        .fetch_optional(&self.pool)
        .await?;

        Ok(photo)
    }
}
