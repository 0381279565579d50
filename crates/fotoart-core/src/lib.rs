//! Fotoart Core Library
//!
//! Domain models, the error taxonomy and process configuration shared by every
//! fotoart crate.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    Collection, CollectionInfo, PaymentRecord, PaymentStatus, PhotoSort, PublicCollection,
    ShortLink, ShortLinkInfo, SubscriptionInfo, SubscriptionPlan, UploadedPhoto, User,
};
pub use storage_types::StorageBackend;
