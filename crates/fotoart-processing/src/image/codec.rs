use crate::error::ThumbnailError;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

/// Quality used for JPEG thumbnails
pub const JPEG_QUALITY: u8 = 100;

/// Output codec for a thumbnail, chosen from the original file extension.
/// Anything not listed falls back to JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailCodec {
    Jpeg { quality: u8 },
    Png,
    Tiff,
    Bmp,
}

impl ThumbnailCodec {
    pub fn for_extension(ext: &str) -> Self {
        match normalize_extension(ext).as_str() {
            "png" => ThumbnailCodec::Png,
            "tif" | "tiff" => ThumbnailCodec::Tiff,
            "bmp" => ThumbnailCodec::Bmp,
            _ => ThumbnailCodec::Jpeg {
                quality: JPEG_QUALITY,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ThumbnailCodec::Jpeg { .. } => "jpeg",
            ThumbnailCodec::Png => "png",
            ThumbnailCodec::Tiff => "tiff",
            ThumbnailCodec::Bmp => "bmp",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ThumbnailCodec::Jpeg { .. } => "image/jpeg",
            ThumbnailCodec::Png => "image/png",
            ThumbnailCodec::Tiff => "image/tiff",
            ThumbnailCodec::Bmp => "image/bmp",
        }
    }

    pub fn encode(&self, img: &DynamicImage) -> Result<Vec<u8>, ThumbnailError> {
        let mut buf = Vec::new();
        let result = match self {
            // JPEG has no alpha channel
            ThumbnailCodec::Jpeg { quality } => {
                let encoder = JpegEncoder::new_with_quality(&mut buf, *quality);
                DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)
            }
            ThumbnailCodec::Png => img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png),
            ThumbnailCodec::Tiff => DynamicImage::ImageRgba8(img.to_rgba8())
                .write_to(&mut Cursor::new(&mut buf), ImageFormat::Tiff),
            ThumbnailCodec::Bmp => DynamicImage::ImageRgba8(img.to_rgba8())
                .write_to(&mut Cursor::new(&mut buf), ImageFormat::Bmp),
        };

        result.map_err(|e| ThumbnailError::Encode {
            format: self.name(),
            message: e.to_string(),
        })?;
        Ok(buf)
    }
}

/// Lower-cased extension without a leading dot
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}

/// MIME type for an uploaded original, by extension.
pub fn content_type_for_extension(ext: &str) -> &'static str {
    match normalize_extension(ext).as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}
