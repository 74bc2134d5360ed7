//! Image decoding WASM bindings.
//!
//! # Functions
//!
//! - [`decode_image`] - Decode a JPEG/PNG/BMP/TIFF/WebP file to RGBA
//! - [`exif_date`] - Read the capture date of a photo
//!
//! # Example
//!
//! ```typescript
//! import { decode_image } from '@photomark/wasm';
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const image = decode_image(bytes);
//! console.log(`Decoded ${image.width}x${image.height}`);
//! ```

use crate::types::JsImage;
use photomark_core::decode;
use wasm_bindgen::prelude::*;

/// Decode an image file to RGBA with EXIF orientation applied.
///
/// # Errors
///
/// Returns an error if the format is unsupported or the data is corrupted.
#[wasm_bindgen]
pub fn decode_image(bytes: &[u8]) -> Result<JsImage, JsValue> {
    decode::decode_image(bytes)
        .map(JsImage::from_dynamic)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// The EXIF capture date as `YYYY-MM-DD`, or `undefined`.
#[wasm_bindgen]
pub fn exif_date(bytes: &[u8]) -> Option<String> {
    decode::exif_date(bytes)
}
