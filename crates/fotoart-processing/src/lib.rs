//! Fotoart Processing Library
//!
//! Thumbnail generation for uploaded photos: decode, EXIF orientation
//! correction, fit-resize and re-encode by file extension.

pub mod error;
#[cfg(feature = "image")]
pub mod image;

pub use error::ThumbnailError;
#[cfg(feature = "image")]
pub use crate::image::{
    content_type_for_extension, ImageOrientation, Orientation, Thumbnail, ThumbnailCodec,
    ThumbnailGenerator, THUMBNAIL_MAX_SIZE,
};
