//! Image encoding WASM bindings.
//!
//! # Functions
//!
//! - [`encode_image`] - Encode a composed [`JsImage`] as PNG or JPEG
//! - [`encode_jpeg`] - Encode raw RGB pixel data to JPEG
//!
//! # Example
//!
//! ```typescript
//! import { export_image, encode_image } from '@photomark/wasm';
//!
//! const composed = export_image(base, settings, { format: 'jpeg' }, preview.scale);
//! const bytes = encode_image(composed, 'jpeg', 90);
//! await writable.write(new Blob([bytes], { type: 'image/jpeg' }));
//! ```

use crate::types::JsImage;
use photomark_core::encode;
use photomark_core::model::ExportFormat;
use wasm_bindgen::prelude::*;

/// Encode a composed image.
///
/// # Arguments
///
/// * `image` - RGBA image, usually the result of `export_image`
/// * `format` - `"png"`, `"jpeg"` or `"jpg"` (case-insensitive)
/// * `quality` - JPEG quality, 1-100; ignored for PNG
///
/// # Errors
///
/// Returns an error for an unknown format or a pixel buffer that does not
/// match the image dimensions.
#[wasm_bindgen]
pub fn encode_image(image: &JsImage, format: &str, quality: u8) -> Result<Vec<u8>, JsValue> {
    let format: ExportFormat = format.parse().map_err(|e: String| JsValue::from_str(&e))?;
    let img = image.to_dynamic().map_err(|e| JsValue::from_str(&e))?;
    encode::encode_image(&img, format, quality).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Encode RGB pixel data (3 bytes per pixel) to JPEG bytes.
#[wasm_bindgen]
pub fn encode_jpeg(pixels: &[u8], width: u32, height: u32, quality: u8) -> Result<Vec<u8>, JsValue> {
    encode::encode_jpeg(pixels, width, height, quality).map_err(|e| JsValue::from_str(&e.to_string()))
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_encode_image_png() {
        let img = JsImage::new(10, 10, vec![255u8; 10 * 10 * 4]);
        let bytes = encode_image(&img, "png", 90).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[wasm_bindgen_test]
    fn test_encode_image_unknown_format() {
        let img = JsImage::new(1, 1, vec![0u8; 4]);
        assert!(encode_image(&img, "gif", 90).is_err());
    }

    #[wasm_bindgen_test]
    fn test_encode_jpeg_invalid_pixel_data() {
        let pixels = vec![128u8; 50 * 50 * 3];
        assert!(encode_jpeg(&pixels, 100, 100, 90).is_err());
    }
}
