use fotoart_core::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ThumbnailError {
    /// Input is not a supported raster format
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode thumbnail as {format}: {message}")]
    Encode { format: &'static str, message: String },

    #[error("Thumbnail task failed: {0}")]
    Task(String),
}

impl From<ThumbnailError> for AppError {
    fn from(err: ThumbnailError) -> Self {
        match err {
            ThumbnailError::Task(msg) => AppError::Internal(msg),
            other => AppError::ImageProcessing(other.to_string()),
        }
    }
}
