//! Upload orchestrator: hash, thumbnail, store, persist, one file at a time.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use fotoart_core::{AppError, UploadedPhoto};
use fotoart_db::{CollectionRepositoryTrait, NewPhoto, PhotoRepositoryTrait};
use fotoart_processing::{content_type_for_extension, ThumbnailGenerator};
use fotoart_storage::keys::{original_key, thumbnail_key};
use fotoart_storage::Storage;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// One file of a multipart batch, fully buffered.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Lower-cased extension of an original file name, without the dot.
pub fn file_extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Content-addressed object name: SHA-256 of the bytes in hex, plus the
/// extension. Identical bytes always map to the same name.
pub fn hash_name(data: &[u8], extension: &str) -> String {
    let digest = hex::encode(Sha256::digest(data));
    if extension.is_empty() {
        digest
    } else {
        format!("{}.{}", digest, extension)
    }
}

#[derive(Clone)]
pub struct UploadService {
    collections: Arc<dyn CollectionRepositoryTrait>,
    photos: Arc<dyn PhotoRepositoryTrait>,
    storage: Arc<dyn Storage>,
    thumbnails: ThumbnailGenerator,
}

impl UploadService {
    pub fn new(
        collections: Arc<dyn CollectionRepositoryTrait>,
        photos: Arc<dyn PhotoRepositoryTrait>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self {
            collections,
            photos,
            storage,
            thumbnails: ThumbnailGenerator::default(),
        }
    }

    /// Store every file of the batch into `collection_id`.
    ///
    /// Files are processed in order. A failure on a file's original object or
    /// its row aborts the batch; files stored before it stay stored.
    #[tracing::instrument(skip(self, files), fields(file_count = files.len()))]
    pub async fn upload_batch(
        &self,
        user_id: Uuid,
        collection_id: Uuid,
        files: Vec<UploadFile>,
    ) -> Result<Vec<UploadedPhoto>, AppError> {
        if files.is_empty() {
            return Err(AppError::InvalidInput("No files provided".to_string()));
        }

        self.collections
            .get(user_id, collection_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Collection not found".to_string()))?;

        let mut uploaded = Vec::with_capacity(files.len());
        for file in files {
            let photo = self.upload_one(user_id, collection_id, file).await?;
            uploaded.push(photo);
        }

        tracing::info!(
            collection_id = %collection_id,
            count = uploaded.len(),
            "Upload batch stored"
        );
        Ok(uploaded)
    }

    async fn upload_one(
        &self,
        user_id: Uuid,
        collection_id: Uuid,
        file: UploadFile,
    ) -> Result<UploadedPhoto, AppError> {
        let UploadFile { file_name, data } = file;
        let extension = file_extension(&file_name);
        let hash_name = hash_name(&data, &extension);

        // Thumbnail problems never block the original.
        let thumbnail = match self
            .thumbnails
            .generate_async(data.clone(), extension.clone())
            .await
        {
            Ok(thumbnail) => Some(thumbnail),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    file_name = %file_name,
                    "Thumbnail generation failed, storing original only"
                );
                None
            }
        };

        let original_url = self
            .storage
            .put(
                &original_key(collection_id, &hash_name),
                data,
                content_type_for_extension(&extension),
            )
            .await
            .map_err(|e| AppError::from(e).context("Failed to store original"))?;

        let thumbnail_url = match thumbnail {
            Some(thumb) => match self
                .storage
                .put(
                    &thumbnail_key(collection_id, &hash_name),
                    thumb.data,
                    thumb.content_type,
                )
                .await
            {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!(error = %e, file_name = %file_name, "Thumbnail upload failed");
                    String::new()
                }
            },
            None => String::new(),
        };

        let photo = self
            .photos
            .insert(NewPhoto {
                collection_id,
                user_id,
                original_url,
                thumbnail_url,
                file_name,
                file_ext: extension,
                hash_name,
                uploaded_at: Utc::now(),
            })
            .await?;

        tracing::debug!(photo_id = %photo.id, hash_name = %photo.hash_name, "Photo stored");
        Ok(photo)
    }
}
