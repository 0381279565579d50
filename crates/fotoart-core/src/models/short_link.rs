use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::photo::UploadedPhoto;
use super::sort::PhotoSort;

/// Public token for a published collection (at most one per collection).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ShortLink {
    pub id: Uuid,
    pub collection_id: Uuid,
    pub token: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub click_count: i64,
}

/// Short link joined with the collection it exposes
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ShortLinkInfo {
    pub id: Uuid,
    pub collection_id: Uuid,
    pub url: String,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub click_count: i64,
    pub name: String,
    pub username: String,
    pub cover_url: String,
    pub cover_thumbnail_url: String,
}

/// Public view of a published collection
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PublicCollection {
    pub username: String,
    pub collection_name: String,
    pub date: NaiveDate,
    pub cover_url: String,
    pub cover_thumbnail_url: String,
    pub count_photos: i64,
    pub files: Vec<UploadedPhoto>,
    pub sort: PhotoSort,
}
