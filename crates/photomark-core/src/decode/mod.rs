//! Image decoding for base photos and watermark assets.
//!
//! This module provides functionality for:
//! - Decoding JPEG, PNG, BMP, TIFF and WebP images
//! - Correcting EXIF orientation so pixels are upright
//! - Reading the EXIF capture date
//!
//! # Examples
//!
//! ```ignore
//! use photomark_core::decode::load_image;
//!
//! let image = load_image("photo.jpg")?;
//! println!("Decoded {}x{} image", image.width(), image.height());
//! ```

mod metadata;
mod reader;
mod types;

pub use metadata::{exif_date, format_exif_date, get_orientation};
pub use reader::{decode_image, decode_image_no_orientation, load_image};
pub use types::{DecodeError, DecodedImage, FilterType, Orientation};

/// File extensions accepted as input images (lowercase, no dot).
pub const SUPPORTED_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "bmp", "tif", "tiff", "webp"];

/// Whether `path` has one of the [`SUPPORTED_EXTENSIONS`].
pub fn is_supported_image(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}
