//! JPEG encoding for export.
//!
//! JPEG has no alpha channel, so callers flatten RGBA input to RGB first
//! (see [`super::encode_image`]).

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};

use super::{check_buffer, EncodeError};

/// Encode RGB pixel data to JPEG bytes.
///
/// # Arguments
///
/// * `pixels` - RGB pixel data (3 bytes per pixel, row-major order)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `quality` - JPEG quality, clamped to 1-100
///
/// # Example
///
/// ```ignore
/// use photomark_core::encode::encode_jpeg;
///
/// let pixels = vec![128u8; 100 * 100 * 3];
/// let jpeg = encode_jpeg(&pixels, 100, 100, 85)?;
/// assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
/// ```
pub fn encode_jpeg(
    pixels: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    check_buffer(pixels, width, height, 3)?;

    let quality = quality.clamp(1, 100);
    let mut buffer = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .write_image(pixels, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn dimensions() -> impl Strategy<Value = (u32, u32)> {
        (1u32..=48, 1u32..=48)
    }

    proptest! {
        /// Property: Valid input always yields a framed JPEG stream.
        #[test]
        fn prop_valid_input_encodes((width, height) in dimensions(), quality in 0u8..=255) {
            let pixels = vec![90u8; (width * height * 3) as usize];
            let jpeg = encode_jpeg(&pixels, width, height, quality).unwrap();

            prop_assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
            prop_assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9]);
        }

        /// Property: Encoding is deterministic.
        #[test]
        fn prop_deterministic((width, height) in dimensions(), quality in 1u8..=100) {
            let pixels = vec![100u8; (width * height * 3) as usize];
            let a = encode_jpeg(&pixels, width, height, quality).unwrap();
            let b = encode_jpeg(&pixels, width, height, quality).unwrap();
            prop_assert_eq!(a, b);
        }

        /// Property: A wrong buffer length is always rejected.
        #[test]
        fn prop_wrong_length_rejected((width, height) in dimensions(), delta in 1usize..10) {
            let pixels = vec![0u8; (width * height * 3) as usize + delta];
            let is_invalid_pixel_data = matches!(
                encode_jpeg(&pixels, width, height, 85),
                Err(EncodeError::InvalidPixelData { .. })
            );
            prop_assert!(is_invalid_pixel_data);
        }
    }
}
