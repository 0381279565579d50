//! Fotoart Storage Library
//!
//! Object storage abstraction for photo assets with S3 and local filesystem
//! implementations.
//!
//! # Storage key format
//!
//! Every asset of a collection lives under the collection prefix so the whole
//! collection can be removed with one prefix delete:
//!
//! - **Original**: `collection_{collection_id}/originals/{hash_name}`
//! - **Thumbnail**: `collection_{collection_id}/thumbnails/{hash_name}`
//! - **Default cover**: `default_collection_cover/default_cover.jpg` (+ `_thumb`)
//!
//! Keys must not contain `..` or a leading `/`. Key generation is centralized in
//! the [`keys`] module so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use fotoart_core::StorageBackend;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
