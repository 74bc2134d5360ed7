//! Error types for watermark rendering and export.

use std::path::PathBuf;

use thiserror::Error;

use crate::decode::DecodeError;
use crate::encode::EncodeError;

/// Top-level error type for engine operations.
///
/// Font resolution never produces an error: it degrades to the built-in
/// bitmap font instead. Numeric settings are clamped rather than rejected.
#[derive(Debug, Error)]
pub enum WatermarkError {
    /// A base image could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The composed image could not be encoded.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// The image watermark asset is missing or unreadable.
    #[error("Cannot load watermark image {path}: {message}")]
    WatermarkImage { path: PathBuf, message: String },

    /// A resize request resolved to a zero-sized image.
    #[error("Invalid resize: {0}")]
    InvalidResize(String),

    /// A settings document could not be interpreted.
    #[error("Invalid settings: {0}")]
    Settings(String),

    /// The output directory is missing or would overwrite source images.
    #[error("Invalid output directory {path}: {message}")]
    OutputDirectory { path: PathBuf, message: String },

    /// Writing an exported file failed.
    #[error("Failed to write {path}: {message}")]
    Write { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias using WatermarkError.
pub type Result<T> = std::result::Result<T, WatermarkError>;

impl WatermarkError {
    pub fn settings(msg: impl Into<String>) -> Self {
        Self::Settings(msg.into())
    }

    pub fn output_directory(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::OutputDirectory {
            path: path.into(),
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WatermarkError::InvalidResize("width is zero".to_string());
        assert_eq!(err.to_string(), "Invalid resize: width is zero");

        let err = WatermarkError::output_directory("/photos", "same as source directory");
        assert_eq!(
            err.to_string(),
            "Invalid output directory /photos: same as source directory"
        );
    }

    #[test]
    fn test_decode_error_is_transparent() {
        let err: WatermarkError = DecodeError::InvalidFormat.into();
        assert_eq!(err.to_string(), "Invalid or unsupported image format");
    }
}
