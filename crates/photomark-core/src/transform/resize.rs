//! Resizing of composed images and preview downsampling.

use image::DynamicImage;

use crate::decode::FilterType;
use crate::error::{Result, WatermarkError};
use crate::geometry::Size;
use crate::model::ResizeSpec;

/// Longest edge a resize may produce.
pub const MAX_OUTPUT_DIMENSION: u32 = 16_384;

/// Target size for `spec` applied to an image of `source` size.
///
/// Returns `None` when the spec requests no change.
///
/// - `percent` wins: `max(1, floor(w * p))` × `max(1, floor(h * p))`
/// - `width` and `height` together are used as is
/// - a single axis derives the other from the aspect ratio
///
/// A target whose longest edge exceeds [`MAX_OUTPUT_DIMENSION`] is scaled
/// down, keeping its aspect ratio, until that edge fits.
pub fn resize_target(source: Size, spec: &ResizeSpec) -> Option<Size> {
    let (w, h) = (source.width as f64, source.height as f64);

    if let Some(percent) = spec.effective_percent() {
        let p = percent as f64;
        return Some(bounded(w * p, h * p));
    }

    match (spec.effective_width(), spec.effective_height()) {
        (Some(width), Some(height)) => Some(bounded(width as f64, height as f64)),
        (Some(width), None) => Some(bounded(width as f64, h * (width as f64 / w))),
        (None, Some(height)) => Some(bounded(w * (height as f64 / h), height as f64)),
        (None, None) => None,
    }
}

fn bounded(width: f64, height: f64) -> Size {
    let longest = width.max(height);
    let limit = MAX_OUTPUT_DIMENSION as f64;
    let fit = |v: f64| {
        let v = if longest > limit { v * limit / longest } else { v };
        (v as u32).clamp(1, MAX_OUTPUT_DIMENSION)
    };
    Size::new(fit(width), fit(height))
}

/// Resize a composed image according to `spec` with a Lanczos3 filter.
///
/// An empty spec returns the input unchanged. The color type is preserved.
///
/// # Errors
///
/// Returns `WatermarkError::InvalidResize` when the source image has no
/// pixels to scale.
pub fn resize_image(img: DynamicImage, spec: &ResizeSpec) -> Result<DynamicImage> {
    let source = Size::of(&img);
    if source.width == 0 || source.height == 0 {
        return Err(WatermarkError::InvalidResize(format!(
            "source image is {}x{}",
            source.width, source.height
        )));
    }

    match resize_target(source, spec) {
        Some(target) if target != source => {
            Ok(resize(&img, target.width, target.height, FilterType::Lanczos3))
        }
        _ => Ok(img),
    }
}

/// Resize an image to exact dimensions.
pub fn resize(img: &DynamicImage, width: u32, height: u32, filter: FilterType) -> DynamicImage {
    if img.width() == width && img.height() == height {
        return img.clone();
    }
    img.resize_exact(width.max(1), height.max(1), filter.to_image_filter())
}
