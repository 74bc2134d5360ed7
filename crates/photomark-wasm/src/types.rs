//! WASM-compatible wrapper types for image data.
//!
//! This module provides JavaScript-friendly types that wrap the core photomark
//! types, handling the conversion between Rust and JavaScript data representations.

use image::{DynamicImage, RgbaImage};
use photomark_core::decode::DecodedImage;
use photomark_core::export::PreviewFrame;
use wasm_bindgen::prelude::*;

/// An RGBA image wrapper for JavaScript.
///
/// Pixels are straight-alpha RGBA, row-major, 4 bytes per pixel, which is the
/// layout `ImageData` expects on a canvas.
///
/// # Memory Management
///
/// The pixel data is stored in WASM memory. When you call `pixels()`, a copy is made
/// to JavaScript memory as a `Uint8Array`.
#[wasm_bindgen]
pub struct JsImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsImage {
    /// Create a new JsImage from dimensions and RGBA pixel data.
    ///
    /// # Arguments
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    /// * `pixels` - RGBA pixel data (4 bytes per pixel, row-major order)
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> JsImage {
        JsImage {
            width,
            height,
            pixels,
        }
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of bytes in the pixel buffer (width * height * 4)
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Returns RGBA pixel data as Uint8Array.
    ///
    /// Note: This creates a copy of the pixel data.
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }

    /// Explicitly free WASM memory.
    ///
    /// This is optional - wasm-bindgen's finalizer will handle cleanup automatically.
    pub fn free(self) {}
}

impl JsImage {
    pub(crate) fn from_decoded(img: DecodedImage) -> Self {
        Self {
            width: img.width,
            height: img.height,
            pixels: img.pixels,
        }
    }

    pub(crate) fn from_rgba(img: RgbaImage) -> Self {
        Self::from_decoded(DecodedImage::from_rgba_image(img))
    }

    pub(crate) fn from_dynamic(img: DynamicImage) -> Self {
        Self::from_decoded(DecodedImage::from_dynamic(img))
    }

    /// Convert to an image-crate image, cloning the pixels.
    ///
    /// Fails when the buffer length does not match the dimensions.
    pub(crate) fn to_dynamic(&self) -> Result<DynamicImage, String> {
        let decoded = DecodedImage {
            width: self.width,
            height: self.height,
            pixels: self.pixels.clone(),
        };
        let expected = self.width as usize * self.height as usize * 4;
        decoded
            .into_rgba_image()
            .map(DynamicImage::ImageRgba8)
            .ok_or_else(|| {
                format!(
                    "Invalid pixel data: expected {expected} bytes for {}x{} RGBA, got {}",
                    self.width,
                    self.height,
                    self.pixels.len()
                )
            })
    }
}

/// A composed preview plus the watermark's box, for drag hit testing.
#[wasm_bindgen]
pub struct JsPreview {
    image: JsImage,
    scale: f64,
    overlay_x: f64,
    overlay_y: f64,
    overlay_width: u32,
    overlay_height: u32,
}

#[wasm_bindgen]
impl JsPreview {
    /// The composed preview image. Copies the pixels.
    #[wasm_bindgen(getter)]
    pub fn image(&self) -> JsImage {
        JsImage::new(self.image.width, self.image.height, self.image.pixels.clone())
    }

    /// Preview pixels per original pixel.
    #[wasm_bindgen(getter)]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    #[wasm_bindgen(getter)]
    pub fn overlay_x(&self) -> f64 {
        self.overlay_x
    }

    #[wasm_bindgen(getter)]
    pub fn overlay_y(&self) -> f64 {
        self.overlay_y
    }

    #[wasm_bindgen(getter)]
    pub fn overlay_width(&self) -> u32 {
        self.overlay_width
    }

    #[wasm_bindgen(getter)]
    pub fn overlay_height(&self) -> u32 {
        self.overlay_height
    }
}

impl From<PreviewFrame> for JsPreview {
    fn from(frame: PreviewFrame) -> Self {
        Self {
            image: JsImage::from_rgba(frame.image),
            scale: frame.scale.factor(),
            overlay_x: frame.overlay_origin.x,
            overlay_y: frame.overlay_origin.y,
            overlay_width: frame.overlay_size.width,
            overlay_height: frame.overlay_size.height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use photomark_core::geometry::{PreviewPoint, PreviewScale, Size};

    #[test]
    fn test_js_image_creation() {
        let img = JsImage::new(100, 50, vec![0u8; 100 * 50 * 4]);
        assert_eq!(img.width(), 100);
        assert_eq!(img.height(), 50);
        assert_eq!(img.byte_length(), 20000);
    }

    #[test]
    fn test_to_dynamic_round_trip() {
        let pixels: Vec<u8> = (0..2 * 2 * 4).map(|v| v as u8).collect();
        let img = JsImage::new(2, 2, pixels.clone());
        let dynamic = img.to_dynamic().unwrap();
        assert_eq!(dynamic.to_rgba8().into_raw(), pixels);
        assert_eq!(JsImage::from_dynamic(dynamic).pixels(), pixels);
    }

    #[test]
    fn test_to_dynamic_rejects_short_buffer() {
        let img = JsImage::new(10, 10, vec![0u8; 10]);
        let err = img.to_dynamic().unwrap_err();
        assert!(err.contains("expected 400 bytes"));
    }

    #[test]
    fn test_preview_from_frame() {
        let frame = PreviewFrame {
            image: RgbaImage::from_pixel(4, 3, Rgba([1, 2, 3, 255])),
            scale: PreviewScale::new(0.5),
            overlay_origin: PreviewPoint::new(1.0, 2.0),
            overlay_size: Size::new(2, 1),
        };
        let preview = JsPreview::from(frame);
        assert_eq!(preview.scale(), 0.5);
        assert_eq!((preview.overlay_x(), preview.overlay_y()), (1.0, 2.0));
        assert_eq!((preview.overlay_width(), preview.overlay_height()), (2, 1));
        assert_eq!(preview.image().byte_length(), 48);
    }
}
