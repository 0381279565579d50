//! In-memory repositories for tests in dependent crates.
//!
//! [`InMemoryDatabase`] implements every repository trait over shared state
//! and mirrors the PostgreSQL behaviour the services rely on: owner scoping,
//! the unique email and one-link-per-collection constraints, cascading
//! deletes, and all-or-nothing publish/unpublish.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use fotoart_core::models::extend_expiry;
use fotoart_core::{
    AppError, Collection, CollectionInfo, PaymentRecord, PaymentStatus, PhotoSort, ShortLink,
    ShortLinkInfo, SubscriptionPlan, UploadedPhoto, User,
};
use rand::seq::SliceRandom;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::db::{
    CollectionRepositoryTrait, NewPhoto, PaymentRepositoryTrait, PhotoRepositoryTrait,
    ShortLinkRepositoryTrait, UserRepositoryTrait,
};

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    collections: HashMap<Uuid, Collection>,
    photos: HashMap<Uuid, UploadedPhoto>,
    short_links: HashMap<Uuid, ShortLink>,
    payments: HashMap<Uuid, PaymentRecord>,
}

impl State {
    fn collection_info(&self, collection: &Collection) -> CollectionInfo {
        let username = self
            .users
            .get(&collection.user_id)
            .map(|u| u.username.clone())
            .unwrap_or_default();
        let count_photos = self
            .photos
            .values()
            .filter(|p| p.collection_id == collection.id)
            .count() as i64;

        CollectionInfo {
            id: collection.id,
            user_id: collection.user_id,
            name: collection.name.clone(),
            date: collection.date,
            created_at: collection.created_at,
            cover_url: collection.cover_url.clone(),
            cover_thumbnail_url: collection.cover_thumbnail_url.clone(),
            is_published: collection.is_published,
            username,
            count_photos,
        }
    }

    fn link_by_token(&mut self, token: &str) -> Option<&mut ShortLink> {
        self.short_links.values_mut().find(|l| l.token == token)
    }
}

/// Shared in-memory store; clones see the same data.
#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    state: Arc<Mutex<State>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking test must not poison the store for the rest of the suite.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn short_link_count(&self) -> usize {
        self.lock().short_links.len()
    }

    pub fn photo_count(&self) -> usize {
        self.lock().photos.len()
    }

    /// Overwrite a user's subscription expiry directly.
    pub fn set_expiry(&self, user_id: Uuid, expires_at: Option<DateTime<Utc>>) {
        if let Some(user) = self.lock().users.get_mut(&user_id) {
            user.subscription_expires_at = expires_at;
            user.subscription_active = expires_at.is_some();
        }
    }
}

/// Order photos the way the SQL `ORDER BY` for `sort` would.
pub fn sort_photos(photos: &mut [UploadedPhoto], sort: PhotoSort) {
    match sort {
        PhotoSort::UploadedNew => {
            photos.sort_by(|a, b| (b.uploaded_at, b.id).cmp(&(a.uploaded_at, a.id)))
        }
        PhotoSort::UploadedOld => {
            photos.sort_by(|a, b| (a.uploaded_at, a.id).cmp(&(b.uploaded_at, b.id)))
        }
        PhotoSort::NameAz => photos.sort_by(|a, b| (&a.file_name, a.id).cmp(&(&b.file_name, b.id))),
        PhotoSort::NameZa => photos.sort_by(|a, b| (&b.file_name, b.id).cmp(&(&a.file_name, a.id))),
        PhotoSort::Random => photos.shuffle(&mut rand::rng()),
    }
}

#[async_trait]
impl UserRepositoryTrait for InMemoryDatabase {
    async fn create(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let mut state = self.lock();
        if state.users.values().any(|u| u.email == email) {
            return Err(AppError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password: password_hash.to_string(),
            refresh_token: None,
            reset_token: None,
            subscription_active: false,
            subscription_expires_at: None,
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.lock().users.values().find(|u| u.email == email).cloned())
    }

    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<(), AppError> {
        let mut state = self.lock();
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        user.refresh_token = token.map(str::to_string);
        Ok(())
    }

    async fn set_reset_token(&self, id: Uuid, token: &str) -> Result<(), AppError> {
        let mut state = self.lock();
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        user.reset_token = Some(token.to_string());
        Ok(())
    }

    async fn reset_password(&self, token: &str, password_hash: &str) -> Result<bool, AppError> {
        let mut state = self.lock();
        match state
            .users
            .values_mut()
            .find(|u| u.reset_token.as_deref() == Some(token))
        {
            Some(user) => {
                user.password = password_hash.to_string();
                user.reset_token = None;
                user.refresh_token = None;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_subscription(
        &self,
        id: Uuid,
        active: bool,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), AppError> {
        if let Some(user) = self.lock().users.get_mut(&id) {
            user.subscription_active = active;
            user.subscription_expires_at = expires_at;
        }
        Ok(())
    }
}

#[async_trait]
impl CollectionRepositoryTrait for InMemoryDatabase {
    async fn create(
        &self,
        user_id: Uuid,
        name: &str,
        date: NaiveDate,
        cover_url: &str,
        cover_thumbnail_url: &str,
    ) -> Result<Collection, AppError> {
        let collection = Collection {
            id: Uuid::new_v4(),
            user_id,
            name: name.to_string(),
            date,
            created_at: Utc::now(),
            cover_url: cover_url.to_string(),
            cover_thumbnail_url: cover_thumbnail_url.to_string(),
            is_published: false,
        };
        self.lock()
            .collections
            .insert(collection.id, collection.clone());
        Ok(collection)
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Option<Collection>, AppError> {
        Ok(self
            .lock()
            .collections
            .get(&id)
            .filter(|c| c.user_id == user_id)
            .cloned())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Collection>, AppError> {
        Ok(self.lock().collections.get(&id).cloned())
    }

    async fn get_info(&self, user_id: Uuid, id: Uuid) -> Result<Option<CollectionInfo>, AppError> {
        let state = self.lock();
        Ok(state
            .collections
            .get(&id)
            .filter(|c| c.user_id == user_id)
            .map(|c| state.collection_info(c)))
    }

    async fn list_info(
        &self,
        user_id: Uuid,
        search: Option<&str>,
    ) -> Result<Vec<CollectionInfo>, AppError> {
        let state = self.lock();
        let needle = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut infos: Vec<CollectionInfo> = state
            .collections
            .values()
            .filter(|c| c.user_id == user_id)
            .filter(|c| match &needle {
                Some(n) => c.name.to_lowercase().contains(n.as_str()),
                None => true,
            })
            .map(|c| state.collection_info(c))
            .collect();
        infos.sort_by(|a, b| (b.date, b.created_at).cmp(&(a.date, a.created_at)));
        Ok(infos)
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut state = self.lock();
        let owned = state
            .collections
            .get(&id)
            .is_some_and(|c| c.user_id == user_id);
        if !owned {
            return Ok(false);
        }

        state.collections.remove(&id);
        state.photos.retain(|_, p| p.collection_id != id);
        state.short_links.retain(|_, l| l.collection_id != id);
        Ok(true)
    }

    async fn update_cover(
        &self,
        user_id: Uuid,
        id: Uuid,
        cover_url: &str,
        cover_thumbnail_url: &str,
    ) -> Result<bool, AppError> {
        let mut state = self.lock();
        match state
            .collections
            .get_mut(&id)
            .filter(|c| c.user_id == user_id)
        {
            Some(collection) => {
                collection.cover_url = cover_url.to_string();
                collection.cover_thumbnail_url = cover_thumbnail_url.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl PhotoRepositoryTrait for InMemoryDatabase {
    async fn insert(&self, photo: NewPhoto) -> Result<UploadedPhoto, AppError> {
        let mut state = self.lock();
        if !state.collections.contains_key(&photo.collection_id) {
            return Err(AppError::NotFound("Collection not found".to_string()));
        }

        let row = UploadedPhoto {
            id: Uuid::new_v4(),
            collection_id: photo.collection_id,
            user_id: photo.user_id,
            original_url: photo.original_url,
            thumbnail_url: photo.thumbnail_url,
            file_name: photo.file_name,
            file_ext: photo.file_ext,
            hash_name: photo.hash_name,
            is_favorite: false,
            uploaded_at: photo.uploaded_at,
        };
        state.photos.insert(row.id, row.clone());
        Ok(row)
    }

    async fn list(
        &self,
        collection_id: Uuid,
        sort: PhotoSort,
        favorites_only: bool,
    ) -> Result<Vec<UploadedPhoto>, AppError> {
        let mut photos: Vec<UploadedPhoto> = self
            .lock()
            .photos
            .values()
            .filter(|p| p.collection_id == collection_id)
            .filter(|p| !favorites_only || p.is_favorite)
            .cloned()
            .collect();
        sort_photos(&mut photos, sort);
        Ok(photos)
    }

    async fn count(&self, collection_id: Uuid) -> Result<i64, AppError> {
        Ok(self
            .lock()
            .photos
            .values()
            .filter(|p| p.collection_id == collection_id)
            .count() as i64)
    }

    async fn get(&self, user_id: Uuid, photo_id: Uuid) -> Result<Option<UploadedPhoto>, AppError> {
        Ok(self
            .lock()
            .photos
            .get(&photo_id)
            .filter(|p| p.user_id == user_id)
            .cloned())
    }

    async fn delete(&self, user_id: Uuid, photo_id: Uuid) -> Result<bool, AppError> {
        let mut state = self.lock();
        let owned = state
            .photos
            .get(&photo_id)
            .is_some_and(|p| p.user_id == user_id);
        if owned {
            state.photos.remove(&photo_id);
        }
        Ok(owned)
    }

    async fn count_by_hash(&self, collection_id: Uuid, hash_name: &str) -> Result<i64, AppError> {
        Ok(self
            .lock()
            .photos
            .values()
            .filter(|p| p.collection_id == collection_id && p.hash_name == hash_name)
            .count() as i64)
    }

    async fn set_favorite(
        &self,
        user_id: Uuid,
        photo_id: Uuid,
        is_favorite: bool,
    ) -> Result<Option<UploadedPhoto>, AppError> {
        let mut state = self.lock();
        Ok(state
            .photos
            .get_mut(&photo_id)
            .filter(|p| p.user_id == user_id)
            .map(|p| {
                p.is_favorite = is_favorite;
                p.clone()
            }))
    }
}

#[async_trait]
impl ShortLinkRepositoryTrait for InMemoryDatabase {
    async fn get_by_collection(&self, collection_id: Uuid) -> Result<Option<ShortLink>, AppError> {
        Ok(self
            .lock()
            .short_links
            .values()
            .find(|l| l.collection_id == collection_id)
            .cloned())
    }

    async fn get_by_token(&self, token: &str) -> Result<Option<ShortLink>, AppError> {
        Ok(self
            .lock()
            .short_links
            .values()
            .find(|l| l.token == token)
            .cloned())
    }

    async fn get_info(&self, token: &str) -> Result<Option<ShortLinkInfo>, AppError> {
        let state = self.lock();
        let Some(link) = state.short_links.values().find(|l| l.token == token) else {
            return Ok(None);
        };
        let Some(collection) = state.collections.get(&link.collection_id) else {
            return Ok(None);
        };
        let username = state
            .users
            .get(&collection.user_id)
            .map(|u| u.username.clone())
            .unwrap_or_default();

        Ok(Some(ShortLinkInfo {
            id: link.id,
            collection_id: link.collection_id,
            url: link.url.clone(),
            token: link.token.clone(),
            created_at: link.created_at,
            click_count: link.click_count,
            name: collection.name.clone(),
            username,
            cover_url: collection.cover_url.clone(),
            cover_thumbnail_url: collection.cover_thumbnail_url.clone(),
        }))
    }

    async fn publish(
        &self,
        user_id: Uuid,
        collection_id: Uuid,
        token: &str,
        url: &str,
    ) -> Result<Option<ShortLink>, AppError> {
        let mut state = self.lock();
        let owned = state
            .collections
            .get(&collection_id)
            .is_some_and(|c| c.user_id == user_id);
        if !owned {
            return Ok(None);
        }

        // Nothing is written until the link insert cannot fail.
        let existing = state
            .short_links
            .values()
            .find(|l| l.collection_id == collection_id)
            .cloned();
        if existing.is_none() && state.short_links.values().any(|l| l.token == token) {
            return Err(AppError::Conflict("Short link token already taken".to_string()));
        }

        if let Some(collection) = state.collections.get_mut(&collection_id) {
            collection.is_published = true;
        }
        if let Some(existing) = existing {
            return Ok(Some(existing));
        }

        let link = ShortLink {
            id: Uuid::new_v4(),
            collection_id,
            token: token.to_string(),
            url: url.to_string(),
            created_at: Utc::now(),
            click_count: 0,
        };
        state.short_links.insert(link.id, link.clone());
        Ok(Some(link))
    }

    async fn unpublish(&self, user_id: Uuid, collection_id: Uuid) -> Result<(), AppError> {
        let mut state = self.lock();
        let published = state
            .collections
            .get(&collection_id)
            .is_some_and(|c| c.user_id == user_id && c.is_published);
        if !published {
            return Err(AppError::NotFound(
                "Published collection not found".to_string(),
            ));
        }

        let link_id = state
            .short_links
            .values()
            .find(|l| l.collection_id == collection_id)
            .map(|l| l.id)
            .ok_or_else(|| AppError::NotFound("Short link not found".to_string()))?;

        state.short_links.remove(&link_id);
        if let Some(collection) = state.collections.get_mut(&collection_id) {
            collection.is_published = false;
        }
        Ok(())
    }

    async fn increment_clicks(&self, token: &str) -> Result<(), AppError> {
        let mut state = self.lock();
        let link = state
            .link_by_token(token)
            .ok_or_else(|| AppError::NotFound("Short link not found".to_string()))?;
        link.click_count += 1;
        Ok(())
    }
}

#[async_trait]
impl PaymentRepositoryTrait for InMemoryDatabase {
    async fn create(
        &self,
        id: Uuid,
        user_id: Uuid,
        processor_payment_id: &str,
        plan: SubscriptionPlan,
        amount: Decimal,
        status: PaymentStatus,
    ) -> Result<PaymentRecord, AppError> {
        let mut state = self.lock();
        if state
            .payments
            .values()
            .any(|p| p.processor_payment_id == processor_payment_id)
        {
            return Err(AppError::Conflict(
                "Duplicate value violates payments_processor_payment_id_key".to_string(),
            ));
        }

        let now = Utc::now();
        let payment = PaymentRecord {
            id,
            user_id,
            processor_payment_id: processor_payment_id.to_string(),
            plan,
            amount,
            status,
            created_at: now,
            updated_at: now,
        };
        state.payments.insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Option<PaymentRecord>, AppError> {
        Ok(self
            .lock()
            .payments
            .get(&id)
            .filter(|p| p.user_id == user_id)
            .cloned())
    }

    async fn get_by_processor_id(
        &self,
        processor_payment_id: &str,
    ) -> Result<Option<PaymentRecord>, AppError> {
        Ok(self
            .lock()
            .payments
            .values()
            .find(|p| p.processor_payment_id == processor_payment_id)
            .cloned())
    }

    async fn apply_successful_payment(
        &self,
        processor_payment_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, AppError> {
        let mut state = self.lock();
        let payment = state
            .payments
            .values()
            .find(|p| p.processor_payment_id == processor_payment_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;

        if payment.status == PaymentStatus::Succeeded {
            return Ok(None);
        }

        let user = state
            .users
            .get_mut(&payment.user_id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        let expires_at = extend_expiry(user.subscription_expires_at, payment.plan, now);
        user.subscription_active = true;
        user.subscription_expires_at = Some(expires_at);

        if let Some(record) = state.payments.get_mut(&payment.id) {
            record.status = PaymentStatus::Succeeded;
            record.updated_at = now;
        }
        Ok(Some(expires_at))
    }

    async fn update_status(
        &self,
        processor_payment_id: &str,
        status: PaymentStatus,
    ) -> Result<PaymentRecord, AppError> {
        let mut state = self.lock();
        let payment = state
            .payments
            .values_mut()
            .find(|p| p.processor_payment_id == processor_payment_id)
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;

        if payment.status != PaymentStatus::Succeeded {
            payment.status = status;
            payment.updated_at = Utc::now();
        }
        Ok(payment.clone())
    }
}
