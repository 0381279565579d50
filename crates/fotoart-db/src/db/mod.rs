//! Database repositories for data access layer
//!
//! Each entity has a `*RepositoryTrait` consumed by the services and a
//! `Postgres*Repository` implementation, re-exported under the short name.

pub mod collection;
pub mod payment;
pub mod photo;
pub mod short_link;
pub mod transaction;
pub mod user;

pub use collection::{CollectionRepositoryTrait, PostgresCollectionRepository as CollectionRepository};
pub use payment::{PaymentRepositoryTrait, PostgresPaymentRepository as PaymentRepository};
pub use photo::{
    NewPhoto, PhotoRepositoryTrait, PostgresPhotoRepository as PhotoRepository,
};
pub use short_link::{
    PostgresShortLinkRepository as ShortLinkRepository, ShortLinkRepositoryTrait,
};
pub use transaction::with_transaction;
pub use user::{PostgresUserRepository as UserRepository, UserRepositoryTrait};

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Connection pool with the idle/lifetime limits used across fotoart services.
pub async fn connect_pool(
    database_url: &str,
    max_connections: u32,
    acquire_timeout_secs: u64,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await
}
