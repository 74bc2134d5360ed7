//! Encoding of composed images for export.
//!
//! This module provides functionality for:
//! - Encoding RGB pixel data to JPEG with configurable quality
//! - Encoding RGBA pixel data to PNG
//! - Choosing the encoder for an [`ExportFormat`] and flattening alpha where needed
//!
//! # Examples
//!
//! ```ignore
//! use photomark_core::encode::encode_jpeg;
//!
//! let pixels = vec![128u8; 100 * 100 * 3]; // Gray image
//! let jpeg_bytes = encode_jpeg(&pixels, 100, 100, 90)?;
//! println!("Encoded {} bytes", jpeg_bytes.len());
//! ```

mod jpeg;
mod png;

pub use jpeg::encode_jpeg;
pub use png::encode_png_rgba;

use image::DynamicImage;
use thiserror::Error;

use crate::model::ExportFormat;

/// Errors that can occur during encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes, got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The underlying encoder failed
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),
}

pub(crate) fn check_buffer(
    pixels: &[u8],
    width: u32,
    height: u32,
    channels: usize,
) -> Result<(), EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }
    let expected = width as usize * height as usize * channels;
    if pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: pixels.len(),
        });
    }
    Ok(())
}

/// Encode an image in the given export format.
///
/// JPEG output has its alpha channel dropped; PNG output is always RGBA.
/// `quality` is only used for JPEG.
pub fn encode_image(
    img: &DynamicImage,
    format: ExportFormat,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    match format {
        ExportFormat::Jpeg => {
            let rgb = img.to_rgb8();
            encode_jpeg(rgb.as_raw(), rgb.width(), rgb.height(), quality)
        }
        ExportFormat::Png => {
            let rgba = img.to_rgba8();
            encode_png_rgba(rgba.as_raw(), rgba.width(), rgba.height())
        }
    }
}
