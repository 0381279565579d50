use super::codec::ThumbnailCodec;
use super::orientation::ImageOrientation;
use crate::error::ThumbnailError;
use image::imageops::FilterType;
use image::GenericImageView;

/// Thumbnails fit inside a square of this many pixels.
pub const THUMBNAIL_MAX_SIZE: u32 = 300;

/// Encoded thumbnail ready for upload
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub data: Vec<u8>,
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
}

/// Decode -> orient -> fit -> encode. Pure transform over byte buffers.
#[derive(Debug, Clone, Copy)]
pub struct ThumbnailGenerator {
    max_width: u32,
    max_height: u32,
}

impl Default for ThumbnailGenerator {
    fn default() -> Self {
        Self::new(THUMBNAIL_MAX_SIZE, THUMBNAIL_MAX_SIZE)
    }
}

impl ThumbnailGenerator {
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
        }
    }

    /// Build a thumbnail from raw upload bytes. `extension` selects the output
    /// codec. Only a decode or encode failure is an error.
    pub fn generate(&self, data: &[u8], extension: &str) -> Result<Thumbnail, ThumbnailError> {
        let img = image::load_from_memory(data).map_err(|e| ThumbnailError::Decode(e.to_string()))?;
        let img = ImageOrientation::apply_exif_orientation(img, data);

        let (width, height) = img.dimensions();
        // Downscale only
        let img = if width > self.max_width || height > self.max_height {
            img.resize(self.max_width, self.max_height, FilterType::Lanczos3)
        } else {
            img
        };

        let codec = ThumbnailCodec::for_extension(extension);
        let encoded = codec.encode(&img)?;
        let (width, height) = img.dimensions();

        tracing::debug!(
            width,
            height,
            codec = codec.name(),
            size_bytes = encoded.len(),
            "Thumbnail generated"
        );

        Ok(Thumbnail {
            data: encoded,
            content_type: codec.content_type(),
            width,
            height,
        })
    }

    /// [`Self::generate`] on the blocking pool; decoding is CPU-bound.
    pub async fn generate_async(
        &self,
        data: Vec<u8>,
        extension: String,
    ) -> Result<Thumbnail, ThumbnailError> {
        let generator = *self;
        tokio::task::spawn_blocking(move || generator.generate(&data, &extension))
            .await
            .map_err(|e| ThumbnailError::Task(e.to_string()))?
    }
}
