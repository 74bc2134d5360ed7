//! Typed points for the original and preview pixel spaces.

use serde::{Deserialize, Serialize};

use super::Size;

/// Viewport edges smaller than this are treated as this size when fitting.
pub const MIN_VIEWPORT_EDGE: u32 = 100;

/// Ratio between preview pixels and original pixels (`preview = original * factor`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreviewScale(f64);

impl PreviewScale {
    /// Create a scale from a raw factor.
    ///
    /// Non-finite or non-positive factors fall back to identity.
    pub fn new(factor: f64) -> Self {
        if factor.is_finite() && factor > 0.0 {
            Self(factor)
        } else {
            Self(1.0)
        }
    }

    /// Scale for an image shown at full resolution.
    pub fn identity() -> Self {
        Self(1.0)
    }

    /// Largest scale that fits `image` inside `viewport` without upscaling.
    ///
    /// `min(viewport.w / image.w, viewport.h / image.h, 1.0)`
    pub fn fit(image: Size, viewport: Size) -> Self {
        if image.width == 0 || image.height == 0 {
            return Self::identity();
        }
        let vw = viewport.width.max(MIN_VIEWPORT_EDGE) as f64;
        let vh = viewport.height.max(MIN_VIEWPORT_EDGE) as f64;
        let factor = (vw / image.width as f64)
            .min(vh / image.height as f64)
            .min(1.0);
        Self::new(factor)
    }

    pub fn factor(self) -> f64 {
        self.0
    }

    pub fn is_identity(self) -> bool {
        (self.0 - 1.0).abs() < f64::EPSILON
    }

    /// Size of an original-space extent once displayed in the preview.
    pub fn preview_size(self, size: Size) -> Size {
        Size {
            width: ((size.width as f64 * self.0) as u32).max(1),
            height: ((size.height as f64 * self.0) as u32).max(1),
        }
    }
}

impl Default for PreviewScale {
    fn default() -> Self {
        Self::identity()
    }
}

/// A point in full-resolution image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OriginalPoint {
    pub x: i64,
    pub y: i64,
}

impl OriginalPoint {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Where this point is drawn in the preview.
    pub fn to_preview(self, scale: PreviewScale) -> PreviewPoint {
        PreviewPoint {
            x: self.x as f64 * scale.factor(),
            y: self.y as f64 * scale.factor(),
        }
    }
}

/// A point in preview (display) pixels, as reported by drag events.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PreviewPoint {
    pub x: f64,
    pub y: f64,
}

impl PreviewPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Map back to original pixels by dividing by the preview scale.
    ///
    /// Fractional pixels are truncated toward zero.
    pub fn to_original(self, scale: PreviewScale) -> OriginalPoint {
        OriginalPoint {
            x: (self.x / scale.factor()) as i64,
            y: (self.y / scale.factor()) as i64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_downscales_large_image() {
        let scale = PreviewScale::fit(Size::new(4000, 3000), Size::new(800, 600));
        assert!((scale.factor() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_fit_never_upscales() {
        let scale = PreviewScale::fit(Size::new(200, 100), Size::new(800, 600));
        assert!(scale.is_identity());
    }

    #[test]
    fn test_fit_uses_tighter_axis() {
        // Width allows 0.5, height allows 0.25
        let scale = PreviewScale::fit(Size::new(1600, 2400), Size::new(800, 600));
        assert!((scale.factor() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_fit_floors_tiny_viewport() {
        let scale = PreviewScale::fit(Size::new(1000, 1000), Size::new(10, 10));
        assert!((scale.factor() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_fit_zero_image_is_identity() {
        assert!(PreviewScale::fit(Size::new(0, 10), Size::new(800, 600)).is_identity());
    }

    #[test]
    fn test_invalid_factor_falls_back_to_identity() {
        assert!(PreviewScale::new(0.0).is_identity());
        assert!(PreviewScale::new(-2.0).is_identity());
        assert!(PreviewScale::new(f64::NAN).is_identity());
    }

    #[test]
    fn test_preview_to_original_divides() {
        let scale = PreviewScale::new(0.5);
        let p = PreviewPoint::new(101.0, 33.7).to_original(scale);
        assert_eq!(p, OriginalPoint::new(202, 67));
    }

    #[test]
    fn test_original_to_preview_multiplies() {
        let scale = PreviewScale::new(0.25);
        let p = OriginalPoint::new(400, 100).to_preview(scale);
        assert_eq!(p, PreviewPoint::new(100.0, 25.0));
    }

    #[test]
    fn test_preview_size_never_zero() {
        let scale = PreviewScale::new(0.01);
        assert_eq!(scale.preview_size(Size::new(50, 20)), Size::new(1, 1));
    }
}
