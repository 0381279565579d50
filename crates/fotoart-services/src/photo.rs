//! Photo query/sort engine plus per-photo mutations.

use std::sync::Arc;

use fotoart_core::{AppError, PhotoSort, PublicCollection, UploadedPhoto};
use fotoart_db::{CollectionRepositoryTrait, PhotoRepositoryTrait, ShortLinkRepositoryTrait};
use fotoart_storage::keys::{original_key, thumbnail_key};
use fotoart_storage::Storage;
use uuid::Uuid;

#[derive(Clone)]
pub struct PhotoService {
    collections: Arc<dyn CollectionRepositoryTrait>,
    photos: Arc<dyn PhotoRepositoryTrait>,
    short_links: Arc<dyn ShortLinkRepositoryTrait>,
    storage: Arc<dyn Storage>,
}

impl PhotoService {
    pub fn new(
        collections: Arc<dyn CollectionRepositoryTrait>,
        photos: Arc<dyn PhotoRepositoryTrait>,
        short_links: Arc<dyn ShortLinkRepositoryTrait>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self {
            collections,
            photos,
            short_links,
            storage,
        }
    }

    /// Owner-scoped listing. Unknown sort keys fall back to
    /// [`PhotoSort::UploadedNew`]; the key actually applied is returned.
    #[tracing::instrument(skip(self))]
    pub async fn list_owned(
        &self,
        user_id: Uuid,
        collection_id: Uuid,
        sort: Option<&str>,
        favorites_only: bool,
    ) -> Result<(Vec<UploadedPhoto>, PhotoSort), AppError> {
        self.collections
            .get(user_id, collection_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Collection not found".to_string()))?;

        let sort = PhotoSort::resolve(sort);
        let photos = self.photos.list(collection_id, sort, favorites_only).await?;
        Ok((photos, sort))
    }

    /// Listing behind a short-link token. The collection must currently be
    /// published.
    #[tracing::instrument(skip(self))]
    pub async fn public_collection(
        &self,
        token: &str,
        sort: Option<&str>,
        favorites_only: bool,
    ) -> Result<PublicCollection, AppError> {
        let link = self
            .short_links
            .get_info(token)
            .await?
            .ok_or_else(|| AppError::NotFound("Short link not found".to_string()))?;

        let collection = self
            .collections
            .get_by_id(link.collection_id)
            .await?
            .filter(|c| c.is_published)
            .ok_or_else(|| AppError::NotFound("Collection is not published".to_string()))?;

        let sort = PhotoSort::resolve(sort);
        let files = self.photos.list(collection.id, sort, favorites_only).await?;
        let count_photos = self.photos.count(collection.id).await?;

        Ok(PublicCollection {
            username: link.username,
            collection_name: collection.name,
            date: collection.date,
            cover_url: collection.cover_url,
            cover_thumbnail_url: collection.cover_thumbnail_url,
            count_photos,
            files,
            sort,
        })
    }

    /// Delete one photo. Its objects are removed first, unless another row of
    /// the collection still points at the same content.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, user_id: Uuid, photo_id: Uuid) -> Result<(), AppError> {
        let photo = self
            .photos
            .get(user_id, photo_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Photo not found".to_string()))?;

        let references = self
            .photos
            .count_by_hash(photo.collection_id, &photo.hash_name)
            .await?;

        if references <= 1 {
            for key in [
                original_key(photo.collection_id, &photo.hash_name),
                thumbnail_key(photo.collection_id, &photo.hash_name),
            ] {
                self.storage
                    .delete(&key)
                    .await
                    .map_err(|e| AppError::from(e).context("Failed to delete photo object"))?;
            }
        } else {
            tracing::debug!(
                hash_name = %photo.hash_name,
                references,
                "Object shared with other photos, keeping it"
            );
        }

        if !self.photos.delete(user_id, photo_id).await? {
            return Err(AppError::NotFound("Photo not found".to_string()));
        }
        Ok(())
    }

    pub async fn set_favorite(
        &self,
        user_id: Uuid,
        photo_id: Uuid,
        is_favorite: bool,
    ) -> Result<UploadedPhoto, AppError> {
        self.photos
            .set_favorite(user_id, photo_id, is_favorite)
            .await?
            .ok_or_else(|| AppError::NotFound("Photo not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, Utc};
    use fotoart_db::test_helpers::InMemoryDatabase;
    use fotoart_db::{NewPhoto, UserRepositoryTrait};
    use fotoart_storage::test_helpers::InMemoryStorage;

    struct Fixture {
        service: PhotoService,
        db: InMemoryDatabase,
        storage: InMemoryStorage,
        user_id: Uuid,
        collection_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let db = InMemoryDatabase::new();
        let storage = InMemoryStorage::default();
        let user = UserRepositoryTrait::create(&db, "anna", "anna@example.com", "hash")
            .await
            .unwrap();
        let collection = CollectionRepositoryTrait::create(
            &db,
            user.id,
            "Wedding",
            NaiveDate::from_ymd_opt(2025, 7, 20).unwrap(),
            "c",
            "ct",
        )
        .await
        .unwrap();
        let service = PhotoService::new(
            Arc::new(db.clone()),
            Arc::new(db.clone()),
            Arc::new(db.clone()),
            Arc::new(storage.clone()),
        );
        Fixture {
            service,
            db,
            storage,
            user_id: user.id,
            collection_id: collection.id,
        }
    }

    async fn add(f: &Fixture, name: &str, hash: &str, offset_secs: i64) -> UploadedPhoto {
        let url = f
            .storage
            .put(&original_key(f.collection_id, hash), vec![0], "image/jpeg")
            .await
            .unwrap();
        f.storage
            .put(&thumbnail_key(f.collection_id, hash), vec![0], "image/jpeg")
            .await
            .unwrap();
        f.db.insert(NewPhoto {
            collection_id: f.collection_id,
            user_id: f.user_id,
            original_url: url,
            thumbnail_url: String::new(),
            file_name: name.to_string(),
            file_ext: "jpg".to_string(),
            hash_name: hash.to_string(),
            uploaded_at: Utc::now() + Duration::seconds(offset_secs),
        })
        .await
        .unwrap()
    }

    fn names(photos: &[UploadedPhoto]) -> Vec<&str> {
        photos.iter().map(|p| p.file_name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_unknown_sort_behaves_like_uploaded_new() {
        let f = fixture().await;
        add(&f, "b.jpg", "h1.jpg", 0).await;
        add(&f, "c.jpg", "h2.jpg", 5).await;
        add(&f, "a.jpg", "h3.jpg", 10).await;

        let (fallback, resolved) = f
            .service
            .list_owned(f.user_id, f.collection_id, Some("biggest_first"), false)
            .await
            .unwrap();
        assert_eq!(resolved, PhotoSort::UploadedNew);

        let (newest, _) = f
            .service
            .list_owned(f.user_id, f.collection_id, Some("uploaded_new"), false)
            .await
            .unwrap();
        assert_eq!(names(&fallback), names(&newest));
        assert_eq!(names(&newest), vec!["a.jpg", "c.jpg", "b.jpg"]);

        let (oldest, _) = f
            .service
            .list_owned(f.user_id, f.collection_id, Some("uploaded_old"), false)
            .await
            .unwrap();
        assert_eq!(names(&oldest), vec!["b.jpg", "c.jpg", "a.jpg"]);
    }

    #[tokio::test]
    async fn test_name_sorts_order_by_file_name() {
        let f = fixture().await;
        add(&f, "b.jpg", "h1.jpg", 0).await;
        add(&f, "c.jpg", "h2.jpg", 5).await;
        add(&f, "a.jpg", "h3.jpg", 10).await;

        let (az, resolved) = f
            .service
            .list_owned(f.user_id, f.collection_id, Some("name_az"), false)
            .await
            .unwrap();
        assert_eq!(resolved, PhotoSort::NameAz);
        assert_eq!(names(&az), vec!["a.jpg", "b.jpg", "c.jpg"]);

        let (za, _) = f
            .service
            .list_owned(f.user_id, f.collection_id, Some("name_za"), false)
            .await
            .unwrap();
        assert_eq!(names(&za), vec!["c.jpg", "b.jpg", "a.jpg"]);
    }

    #[tokio::test]
    async fn test_random_sort_is_a_permutation() {
        let f = fixture().await;
        for i in 0..6 {
            add(&f, &format!("{}.jpg", i), &format!("h{}.jpg", i), i).await;
        }
        let (photos, resolved) = f
            .service
            .list_owned(f.user_id, f.collection_id, Some("random"), false)
            .await
            .unwrap();
        assert_eq!(resolved, PhotoSort::Random);
        let mut sorted = names(&photos);
        sorted.sort();
        assert_eq!(sorted, vec!["0.jpg", "1.jpg", "2.jpg", "3.jpg", "4.jpg", "5.jpg"]);
    }

    #[tokio::test]
    async fn test_listing_requires_ownership() {
        let f = fixture().await;
        let err = f
            .service
            .list_owned(Uuid::new_v4(), f.collection_id, None, false)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_public_listing_requires_published_collection() {
        let f = fixture().await;
        add(&f, "a.jpg", "h1.jpg", 0).await;
        let link = f
            .db
            .publish(f.user_id, f.collection_id, "tok", "url")
            .await
            .unwrap()
            .unwrap();

        let public = f
            .service
            .public_collection(&link.token, Some("name_za"), false)
            .await
            .unwrap();
        assert_eq!(public.username, "anna");
        assert_eq!(public.collection_name, "Wedding");
        assert_eq!(public.count_photos, 1);
        assert_eq!(public.sort, PhotoSort::NameZa);

        f.db.unpublish(f.user_id, f.collection_id).await.unwrap();
        let err = f
            .service
            .public_collection(&link.token, None, false)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_keeps_shared_object_until_last_reference() {
        let f = fixture().await;
        let first = add(&f, "a.jpg", "same.jpg", 0).await;
        let second = add(&f, "b.jpg", "same.jpg", 1).await;
        let key = original_key(f.collection_id, "same.jpg");

        f.service.delete(f.user_id, first.id).await.unwrap();
        assert!(f.storage.get(&key).is_some());

        f.service.delete(f.user_id, second.id).await.unwrap();
        assert!(f.storage.get(&key).is_none());
        assert!(f.storage.is_empty());
        assert_eq!(f.db.photo_count(), 0);
    }

    #[tokio::test]
    async fn test_favorites_filter() {
        let f = fixture().await;
        let a = add(&f, "a.jpg", "h1.jpg", 0).await;
        add(&f, "b.jpg", "h2.jpg", 1).await;

        let updated = f.service.set_favorite(f.user_id, a.id, true).await.unwrap();
        assert!(updated.is_favorite);

        let (favorites, _) = f
            .service
            .list_owned(f.user_id, f.collection_id, None, true)
            .await
            .unwrap();
        assert_eq!(names(&favorites), vec!["a.jpg"]);

        let err = f
            .service
            .set_favorite(Uuid::new_v4(), a.id, false)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
