use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::sort::PhotoSort;

/// Photo stored in a collection. `hash_name` is the content-addressed object
/// name shared by byte-identical uploads.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UploadedPhoto {
    pub id: Uuid,
    pub collection_id: Uuid,
    pub user_id: Uuid,
    pub original_url: String,
    /// Empty when thumbnail generation failed
    pub thumbnail_url: String,
    pub file_name: String,
    pub file_ext: String,
    pub hash_name: String,
    pub is_favorite: bool,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub files: Vec<UploadedPhoto>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PhotosResponse {
    pub files: Vec<UploadedPhoto>,
    pub sort: PhotoSort,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FavoriteRequest {
    pub is_favorite: bool,
}
