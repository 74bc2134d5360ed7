//! Decoding of base images in any supported container, with EXIF orientation.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageReader};

use super::metadata::get_orientation;
use super::{DecodeError, Orientation};

/// Decode an image from bytes, applying EXIF orientation correction.
///
/// JPEG, PNG, BMP, TIFF and WebP are accepted. The result is normalized to
/// RGBA8 when the source carries alpha and RGB8 otherwise.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the container is not recognized.
/// Returns `DecodeError::CorruptedFile` if the data cannot be decoded.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
    let orientation = get_orientation(bytes);
    let img = decode_image_no_orientation(bytes)?;
    Ok(apply_orientation(img, orientation))
}

/// Decode an image from bytes without applying EXIF orientation.
pub fn decode_image_no_orientation(bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    let img = reader.decode().map_err(|e| match e {
        image::ImageError::Unsupported(_) => DecodeError::InvalidFormat,
        other => DecodeError::CorruptedFile(other.to_string()),
    })?;

    Ok(normalize(img))
}

/// Read and decode an image file.
pub fn load_image(path: impl AsRef<Path>) -> Result<DynamicImage, DecodeError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|e| DecodeError::IoError(format!("{}: {e}", path.display())))?;
    decode_image(&bytes)
}

fn normalize(img: DynamicImage) -> DynamicImage {
    if img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.into_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.into_rgb8())
    }
}

/// Apply EXIF orientation transformation to an image.
pub(crate) fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}
