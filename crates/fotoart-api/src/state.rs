//! Application state shared by every handler.
//!
//! Services are built once from repository and storage trait objects, so the
//! same router runs against PostgreSQL in production and in-memory doubles in
//! tests.

use std::sync::Arc;

use chrono::Duration;
use fotoart_core::Config;
use fotoart_db::{
    CollectionRepositoryTrait, PaymentRepositoryTrait, PhotoRepositoryTrait,
    ShortLinkRepositoryTrait, UserRepositoryTrait,
};
use fotoart_services::{
    AuthService, CollectionService, JwtService, Mailer, PaymentGateway, PaymentService,
    PhotoService, UploadService,
};
use fotoart_storage::Storage;
use sqlx::PgPool;

/// One handle per persisted entity
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepositoryTrait>,
    pub collections: Arc<dyn CollectionRepositoryTrait>,
    pub photos: Arc<dyn PhotoRepositoryTrait>,
    pub short_links: Arc<dyn ShortLinkRepositoryTrait>,
    pub payments: Arc<dyn PaymentRepositoryTrait>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(fotoart_db::UserRepository::new(pool.clone())),
            collections: Arc::new(fotoart_db::CollectionRepository::new(pool.clone())),
            photos: Arc::new(fotoart_db::PhotoRepository::new(pool.clone())),
            short_links: Arc::new(fotoart_db::ShortLinkRepository::new(pool.clone())),
            payments: Arc::new(fotoart_db::PaymentRepository::new(pool)),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Present when backed by PostgreSQL; used by the health probe.
    pub pool: Option<PgPool>,
    pub storage: Arc<dyn Storage>,
    pub auth: AuthService,
    pub collections: CollectionService,
    pub photos: PhotoService,
    pub uploads: UploadService,
    pub payments: PaymentService,
}

impl AppState {
    pub fn new(
        config: Config,
        repositories: Repositories,
        storage: Arc<dyn Storage>,
        mailer: Arc<dyn Mailer>,
        gateway: Option<Arc<dyn PaymentGateway>>,
    ) -> Self {
        let jwt = JwtService::new(
            config.jwt_secret(),
            Duration::minutes(config.auth.access_token_ttl_minutes),
            Duration::days(config.auth.refresh_token_ttl_days),
        );
        let Repositories {
            users,
            collections,
            photos,
            short_links,
            payments,
        } = repositories;

        let auth = AuthService::new(users.clone(), jwt, mailer, &config.frontend_url);
        let collection_service = CollectionService::new(
            collections.clone(),
            photos.clone(),
            short_links.clone(),
            storage.clone(),
            &config.frontend_url,
        );
        let photo_service = PhotoService::new(
            collections.clone(),
            photos.clone(),
            short_links,
            storage.clone(),
        );
        let uploads = UploadService::new(collections, photos, storage.clone());
        let payment_service = PaymentService::new(
            payments,
            users,
            gateway,
            config.payment.webhook_secret.clone(),
            &config.frontend_url,
        );

        Self {
            config: Arc::new(config),
            pool: None,
            storage,
            auth,
            collections: collection_service,
            photos: photo_service,
            uploads,
            payments: payment_service,
        }
    }

    pub fn with_pool(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }
}
