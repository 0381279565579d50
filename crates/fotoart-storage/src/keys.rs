//! Shared key generation for storage backends.
//!
//! Key format: `collection_{id}/originals/{hash_name}` and
//! `collection_{id}/thumbnails/{hash_name}`.

use crate::traits::{StorageError, StorageResult};
use uuid::Uuid;

pub const DEFAULT_COVER_KEY: &str = "default_collection_cover/default_cover.jpg";
pub const DEFAULT_COVER_THUMBNAIL_KEY: &str = "default_collection_cover/default_cover_thumb.jpg";

/// Prefix owning every object of a collection (trailing slash included).
pub fn collection_prefix(collection_id: Uuid) -> String {
    format!("collection_{}/", collection_id)
}

pub fn original_key(collection_id: Uuid, hash_name: &str) -> String {
    format!("{}originals/{}", collection_prefix(collection_id), hash_name)
}

pub fn thumbnail_key(collection_id: Uuid, hash_name: &str) -> String {
    format!("{}thumbnails/{}", collection_prefix(collection_id), hash_name)
}

/// Reject keys that could escape the storage root.
pub fn validate_key(storage_key: &str) -> StorageResult<()> {
    if storage_key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if storage_key.contains("..") || storage_key.starts_with('/') || storage_key.contains('\\') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}
