//! Image processing module
//!
//! - EXIF orientation (orientation)
//! - Output codec selection (codec)
//! - Thumbnail pipeline (thumbnail)

pub mod codec;
pub mod orientation;
pub mod thumbnail;

pub use codec::{content_type_for_extension, ThumbnailCodec};
pub use orientation::{ImageOrientation, Orientation};
pub use thumbnail::{Thumbnail, ThumbnailGenerator, THUMBNAIL_MAX_SIZE};
