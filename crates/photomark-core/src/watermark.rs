//! Rendered watermark canvases and image-watermark preparation.
//!
//! A [`RenderedWatermark`] is the transparent raster that the text renderer
//! or the image preparer produces. It is consumed by rotation and the
//! compositor and then dropped.
//!
//! Opacity is always expressed by remapping the alpha channel through an
//! [`OpacityLut`], for text and image watermarks alike.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};

use crate::decode;
use crate::error::{Result, WatermarkError};
use crate::geometry::Size;
use crate::model::clamp_scale;

/// A transparent RGBA8 canvas with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedWatermark {
    image: RgbaImage,
}

impl RenderedWatermark {
    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Fully transparent canvas.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn size(&self) -> Size {
        Size::of(&self.image)
    }

    /// Row-major RGBA bytes.
    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Multiply the alpha channel by `opacity` in place.
    pub fn apply_opacity(&mut self, opacity: f32) {
        let lut = OpacityLut::new(opacity);
        if !lut.is_identity() {
            lut.apply(&mut self.image);
        }
    }

    /// Resize the canvas by `factor`, keeping at least one pixel per axis.
    pub fn scaled(&self, factor: f64, filter: FilterType) -> Self {
        let width = ((self.width() as f64 * factor) as u32).max(1);
        let height = ((self.height() as f64 * factor) as u32).max(1);
        if width == self.width() && height == self.height() {
            return self.clone();
        }
        Self {
            image: imageops::resize(&self.image, width, height, filter),
        }
    }
}

/// Lookup table mapping every alpha value to `floor(alpha * opacity)`.
#[derive(Debug, Clone)]
pub struct OpacityLut {
    table: [u8; 256],
    identity: bool,
}

impl OpacityLut {
    /// Build the table; `opacity` is clamped to `[0, 1]`.
    pub fn new(opacity: f32) -> Self {
        let opacity = if opacity.is_finite() {
            opacity.clamp(0.0, 1.0)
        } else {
            1.0
        };
        let mut table = [0u8; 256];
        for (i, slot) in table.iter_mut().enumerate() {
            *slot = (i as f32 * opacity).floor().clamp(0.0, 255.0) as u8;
        }
        Self {
            table,
            identity: opacity >= 1.0,
        }
    }

    #[inline]
    pub fn map(&self, alpha: u8) -> u8 {
        self.table[alpha as usize]
    }

    pub fn is_identity(&self) -> bool {
        self.identity
    }

    /// Remap the alpha channel of every pixel.
    pub fn apply(&self, image: &mut RgbaImage) {
        for pixel in image.pixels_mut() {
            pixel.0[3] = self.map(pixel.0[3]);
        }
    }
}

/// Scale an image watermark and express `opacity` through its alpha channel.
///
/// # Arguments
///
/// * `source` - The decoded watermark asset
/// * `scale` - Relative size, clamped to at least 0.01
/// * `opacity` - Global opacity in `[0, 1]`
///
/// # Returns
///
/// A canvas of `max(1, floor(w * scale))` × `max(1, floor(h * scale))`
/// pixels, resampled with Lanczos3.
pub fn prepare_image_watermark(source: &DynamicImage, scale: f32, opacity: f32) -> RenderedWatermark {
    let scale = clamp_scale(scale) as f64;
    let rgba = source.to_rgba8();
    let width = ((rgba.width() as f64 * scale) as u32).max(1);
    let height = ((rgba.height() as f64 * scale) as u32).max(1);

    let image = if (width, height) == rgba.dimensions() {
        rgba
    } else {
        imageops::resize(&rgba, width, height, FilterType::Lanczos3)
    };

    tracing::debug!(width, height, scale, "prepared image watermark");

    let mut watermark = RenderedWatermark::from_image(image);
    watermark.apply_opacity(opacity);
    watermark
}

/// Load a watermark asset from disk.
///
/// Any failure is reported as [`WatermarkError::WatermarkImage`].
pub fn load_watermark_image(path: impl AsRef<Path>) -> Result<DynamicImage> {
    let path = path.as_ref();
    decode::load_image(path).map_err(|e| WatermarkError::WatermarkImage {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}


// ============================================================================
// Property-Based Tests
// ============================================================================
