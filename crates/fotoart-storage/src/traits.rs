//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use fotoart_core::AppError;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("List failed: {0}")]
    ListFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => AppError::NotFound(format!("Object not found: {}", key)),
            StorageError::InvalidKey(msg) => AppError::Internal(format!("Invalid storage key: {}", msg)),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Storage abstraction trait
///
/// Photo assets are written once under deterministic keys (see [`crate::keys`])
/// and removed either one by one or by collection prefix.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `data` at `storage_key`, replacing any existing object, and return
    /// its public URL.
    async fn put(&self, storage_key: &str, data: Vec<u8>, content_type: &str)
        -> StorageResult<String>;

    /// Delete a single object. Deleting a missing object is not an error.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Keys of every object whose key starts with `prefix`.
    async fn list_prefix(&self, prefix: &str) -> StorageResult<Vec<String>>;

    /// Delete every object under `prefix` and return how many were removed.
    async fn delete_prefix(&self, prefix: &str) -> StorageResult<usize> {
        let keys = self.list_prefix(prefix).await?;
        for key in &keys {
            self.delete(key).await?;
        }
        Ok(keys.len())
    }

    /// Check if an object exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Whether the configured bucket (or root directory) is reachable
    async fn bucket_exists(&self) -> StorageResult<bool>;

    /// Public URL an object stored at `storage_key` is served from
    fn public_url(&self, storage_key: &str) -> String;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_app_not_found() {
        let err: AppError = StorageError::NotFound("collection_1/originals/a.jpg".into()).into();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_upload_failure_maps_to_upstream_storage() {
        let err: AppError = StorageError::UploadFailed("connection reset".into()).into();
        assert!(matches!(err, AppError::Storage(ref msg) if msg.contains("connection reset")));
    }
}
