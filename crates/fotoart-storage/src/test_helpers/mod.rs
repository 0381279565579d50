//! In-memory storage backend for tests in dependent crates.

use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// Keeps objects in a shared map. Clones share state, so a test can hold one
/// handle while services use another.
#[derive(Clone)]
pub struct InMemoryStorage {
    objects: Arc<Mutex<BTreeMap<String, StoredObject>>>,
    fail_put_containing: Arc<Mutex<Option<String>>>,
    base_url: String,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new("http://storage.test/fotoart")
    }
}

impl InMemoryStorage {
    pub fn new(base_url: &str) -> Self {
        Self {
            objects: Arc::new(Mutex::new(BTreeMap::new())),
            fail_put_containing: Arc::new(Mutex::new(None)),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Make every `put` whose key contains `needle` fail with `UploadFailed`.
    pub fn fail_puts_containing(&self, needle: &str) {
        *self.fail_put_containing.lock().unwrap() = Some(needle.to_string());
    }

    pub fn clear_failures(&self) {
        *self.fail_put_containing.lock().unwrap() = None;
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn put(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String> {
        crate::keys::validate_key(storage_key)?;
        if let Some(needle) = self.fail_put_containing.lock().unwrap().as_deref() {
            if storage_key.contains(needle) {
                return Err(StorageError::UploadFailed(format!(
                    "injected failure for {}",
                    storage_key
                )));
            }
        }
        self.objects.lock().unwrap().insert(
            storage_key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(self.public_url(storage_key))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.objects.lock().unwrap().remove(storage_key);
        Ok(())
    }

    async fn list_prefix(&self, prefix: &str) -> StorageResult<Vec<String>> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        Ok(self.objects.lock().unwrap().contains_key(storage_key))
    }

    async fn bucket_exists(&self) -> StorageResult<bool> {
        Ok(true)
    }

    fn public_url(&self, storage_key: &str) -> String {
        format!("{}/{}", self.base_url, storage_key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_delete_prefix_uses_listing() {
        let storage = InMemoryStorage::default();
        storage.put("collection_1/originals/a.jpg", vec![1], "image/jpeg").await.unwrap();
        storage.put("collection_2/originals/a.jpg", vec![1], "image/jpeg").await.unwrap();

        assert_eq!(storage.delete_prefix("collection_1/").await.unwrap(), 1);
        assert_eq!(storage.keys(), vec!["collection_2/originals/a.jpg".to_string()]);
    }

    #[tokio::test]
    async fn test_injected_put_failure() {
        let storage = InMemoryStorage::default();
        storage.fail_puts_containing("bad");
        assert!(storage.put("collection_1/originals/bad.jpg", vec![1], "image/jpeg").await.is_err());
        assert!(storage.put("collection_1/originals/ok.jpg", vec![1], "image/jpeg").await.is_ok());
    }
}
