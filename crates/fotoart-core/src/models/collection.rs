use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// A named, dated group of photos owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Collection {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    /// Shoot date chosen by the user, not the upload date
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub cover_url: String,
    pub cover_thumbnail_url: String,
    pub is_published: bool,
}

/// Collection joined with its owner's username and photo count
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CollectionInfo {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub cover_url: String,
    pub cover_thumbnail_url: String,
    pub is_published: bool,
    pub username: String,
    pub count_photos: i64,
}

/// Accepts `YYYY-MM-DD` as well as a full RFC 3339 timestamp (date part kept).
fn deserialize_collection_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_collection_date(&raw).map_err(serde::de::Error::custom)
}

pub fn parse_collection_date(raw: &str) -> Result<NaiveDate, String> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .map_err(|_| format!("Invalid date '{}', expected YYYY-MM-DD", raw))
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateCollectionRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Collection name must be between 1 and 255 characters"
    ))]
    pub name: String,
    #[serde(deserialize_with = "deserialize_collection_date")]
    #[schema(value_type = String, example = "2025-07-20")]
    pub date: NaiveDate,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateCollectionResponse {
    pub id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CollectionsListResponse {
    pub collections: Vec<CollectionInfo>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCoverRequest {
    pub photo_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PublishResponse {
    pub link: String,
}
