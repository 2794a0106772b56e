//! Compression error types.

use image::ImageError;
use thiserror::Error;

/// Errors raised while recompressing an image.
#[derive(Debug, Clone, Error)]
pub enum CompressError {
    /// Source bytes are not a decodable image.
    #[error("failed to decode image: {0}")]
    Decode(String),

    /// Source format is not one the decoder understands.
    #[error("unsupported image format: {0}")]
    Unsupported(String),

    /// Encoder rejected the decoded image.
    #[error("failed to encode {format}: {message}")]
    Encode {
        format: &'static str,
        message: String,
    },
}

impl From<ImageError> for CompressError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::Unsupported(e) => Self::Unsupported(e.to_string()),
            other => Self::Decode(other.to_string()),
        }
    }
}

impl CompressError {
    pub fn encode(format: &'static str, message: impl Into<String>) -> Self {
        Self::Encode {
            format,
            message: message.into(),
        }
    }
}
