//! Collection lifecycle: create, inspect, delete, cover, and the
//! draft/published state machine behind short links.

use std::sync::Arc;

use fotoart_core::models::CreateCollectionRequest;
use fotoart_core::{AppError, Collection, CollectionInfo, ShortLinkInfo};
use fotoart_db::{CollectionRepositoryTrait, PhotoRepositoryTrait, ShortLinkRepositoryTrait};
use fotoart_storage::keys::{collection_prefix, DEFAULT_COVER_KEY, DEFAULT_COVER_THUMBNAIL_KEY};
use fotoart_storage::Storage;
use uuid::Uuid;

use crate::token::{random_url_token, SHORT_LINK_TOKEN_BYTES};

#[derive(Clone)]
pub struct CollectionService {
    collections: Arc<dyn CollectionRepositoryTrait>,
    photos: Arc<dyn PhotoRepositoryTrait>,
    short_links: Arc<dyn ShortLinkRepositoryTrait>,
    storage: Arc<dyn Storage>,
    frontend_url: String,
}

impl CollectionService {
    pub fn new(
        collections: Arc<dyn CollectionRepositoryTrait>,
        photos: Arc<dyn PhotoRepositoryTrait>,
        short_links: Arc<dyn ShortLinkRepositoryTrait>,
        storage: Arc<dyn Storage>,
        frontend_url: &str,
    ) -> Self {
        Self {
            collections,
            photos,
            short_links,
            storage,
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
        }
    }

    /// Public URL handed out for a short-link token
    pub fn short_link_url(&self, token: &str) -> String {
        format!("{}/s/{}", self.frontend_url, token)
    }

    /// Where a resolved token sends the visitor
    pub fn public_listing_url(&self, token: &str) -> String {
        format!("{}/public/{}", self.frontend_url, token)
    }

    /// New draft collection with the placeholder cover.
    #[tracing::instrument(skip(self, request), fields(user_id = %user_id))]
    pub async fn create(
        &self,
        user_id: Uuid,
        request: &CreateCollectionRequest,
    ) -> Result<Collection, AppError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput(
                "Collection name must not be empty".to_string(),
            ));
        }

        let collection = self
            .collections
            .create(
                user_id,
                name,
                request.date,
                &self.storage.public_url(DEFAULT_COVER_KEY),
                &self.storage.public_url(DEFAULT_COVER_THUMBNAIL_KEY),
            )
            .await?;

        tracing::info!(collection_id = %collection.id, "Collection created");
        Ok(collection)
    }

    pub async fn get_info(&self, user_id: Uuid, id: Uuid) -> Result<CollectionInfo, AppError> {
        self.collections
            .get_info(user_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Collection not found".to_string()))
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        search: Option<&str>,
    ) -> Result<Vec<CollectionInfo>, AppError> {
        self.collections.list_info(user_id, search).await
    }

    /// Publish the collection and return its public link. Publishing an
    /// already published collection returns the same link.
    #[tracing::instrument(skip(self), fields(user_id = %user_id))]
    pub async fn publish(&self, user_id: Uuid, id: Uuid) -> Result<String, AppError> {
        let collection = self
            .collections
            .get(user_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Collection not found".to_string()))?;

        if collection.is_published {
            if let Some(link) = self.short_links.get_by_collection(id).await? {
                return Ok(link.url);
            }
        }

        let token = random_url_token(SHORT_LINK_TOKEN_BYTES);
        let url = self.short_link_url(&token);
        let link = self
            .short_links
            .publish(user_id, id, &token, &url)
            .await?
            .ok_or_else(|| AppError::NotFound("Collection not found".to_string()))?;

        tracing::info!(collection_id = %id, token = %link.token, "Collection published");
        Ok(link.url)
    }

    #[tracing::instrument(skip(self), fields(user_id = %user_id))]
    pub async fn unpublish(&self, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
        self.short_links.unpublish(user_id, id).await?;
        tracing::info!(collection_id = %id, "Collection unpublished");
        Ok(())
    }

    /// Count a visit and return the public listing URL for `token`.
    #[tracing::instrument(skip(self))]
    pub async fn resolve_public_token(&self, token: &str) -> Result<String, AppError> {
        self.short_links
            .get_by_token(token)
            .await?
            .ok_or_else(|| AppError::NotFound("Short link not found".to_string()))?;

        if let Err(e) = self.short_links.increment_clicks(token).await {
            tracing::error!(error = %e, token = %token, "Failed to count short link click");
        }

        Ok(self.public_listing_url(token))
    }

    pub async fn short_link_info(&self, token: &str) -> Result<ShortLinkInfo, AppError> {
        self.short_links
            .get_info(token)
            .await?
            .ok_or_else(|| AppError::NotFound("Short link not found".to_string()))
    }

    /// Remove every stored object of the collection, then the row (photos
    /// and short link cascade). A crash in between leaves a row without
    /// objects, never objects without a row.
    #[tracing::instrument(skip(self), fields(user_id = %user_id))]
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
        self.collections
            .get(user_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Collection not found".to_string()))?;

        let removed = self
            .storage
            .delete_prefix(&collection_prefix(id))
            .await
            .map_err(|e| AppError::from(e).context("Failed to delete collection objects"))?;

        if !self.collections.delete(user_id, id).await? {
            return Err(AppError::NotFound("Collection not found".to_string()));
        }

        tracing::info!(collection_id = %id, objects_removed = removed, "Collection deleted");
        Ok(())
    }

    /// Use one of the collection's photos as its cover.
    pub async fn update_cover(
        &self,
        user_id: Uuid,
        id: Uuid,
        photo_id: Uuid,
    ) -> Result<(), AppError> {
        let photo = self
            .photos
            .get(user_id, photo_id)
            .await?
            .filter(|p| p.collection_id == id)
            .ok_or_else(|| AppError::NotFound("Photo not found in collection".to_string()))?;

        let thumbnail_url = if photo.thumbnail_url.is_empty() {
            &photo.original_url
        } else {
            &photo.thumbnail_url
        };

        if !self
            .collections
            .update_cover(user_id, id, &photo.original_url, thumbnail_url)
            .await?
        {
            return Err(AppError::NotFound("Collection not found".to_string()));
        }
        Ok(())
    }
}
