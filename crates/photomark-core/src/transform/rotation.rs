//! Rotation of transparent watermark canvases.
//!
//! The rotation uses inverse mapping: for each pixel in the output canvas,
//! we calculate where it falls in the source and resample the neighborhood
//! with a separable kernel.
//!
//! For rotation by angle θ, the inverse transform is:
//! ```text
//! src_x = (dst_x - cx) * cos(-θ) - (dst_y - cy) * sin(-θ) + src_cx
//! src_y = (dst_x - cx) * sin(-θ) + (dst_y - cy) * cos(-θ) + src_cy
//! ```
//!
//! Samples are accumulated with premultiplied alpha so that the color of
//! fully transparent pixels never bleeds into glyph edges. Taps that fall
//! outside the source count as transparent, which gives the rotated edges
//! a smooth falloff into the expanded background.

use image::{imageops, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::watermark::RenderedWatermark;

/// Interpolation filter for rotation operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationFilter {
    /// Fast bilinear interpolation, good for live preview.
    Bilinear,
    /// Catmull-Rom bicubic interpolation.
    #[default]
    Bicubic,
    /// Lanczos3 windowed sinc, sharpest and slowest.
    Lanczos3,
}

impl InterpolationFilter {
    fn radius(self) -> f64 {
        match self {
            InterpolationFilter::Bilinear => 1.0,
            InterpolationFilter::Bicubic => 2.0,
            InterpolationFilter::Lanczos3 => 3.0,
        }
    }

    fn weight(self, x: f64) -> f64 {
        match self {
            InterpolationFilter::Bilinear => (1.0 - x.abs()).max(0.0),
            InterpolationFilter::Bicubic => catmull_rom_weight(x),
            InterpolationFilter::Lanczos3 => lanczos_weight(x, 3.0),
        }
    }
}

/// Compute the dimensions of the bounding box for a rotated canvas.
///
/// # Arguments
///
/// * `width` - Original canvas width
/// * `height` - Original canvas height
/// * `angle_degrees` - Rotation angle in degrees (positive = counter-clockwise)
///
/// # Returns
///
/// Tuple of (new_width, new_height), rounded up so no corner is clipped.
///
/// # Example
///
/// ```ignore
/// use photomark_core::transform::compute_rotated_bounds;
///
/// assert_eq!(compute_rotated_bounds(100, 50, 90.0), (50, 100));
/// assert_eq!(compute_rotated_bounds(100, 50, 0.0), (100, 50));
/// ```
pub fn compute_rotated_bounds(width: u32, height: u32, angle_degrees: f64) -> (u32, u32) {
    match quarter_turns(angle_degrees) {
        Some(0) | Some(2) => return (width, height),
        Some(_) => return (height, width),
        None => {}
    }

    let angle_rad = angle_degrees.to_radians();
    let cos = angle_rad.cos().abs();
    let sin = angle_rad.sin().abs();

    let w = width as f64;
    let h = height as f64;

    // Trim float noise before rounding up
    let new_w = (w * cos + h * sin - 1e-6).ceil() as u32;
    let new_h = (w * sin + h * cos - 1e-6).ceil() as u32;

    (new_w.max(1), new_h.max(1))
}

/// Number of counter-clockwise quarter turns when `angle_degrees` is a
/// multiple of 90, otherwise `None`.
fn quarter_turns(angle_degrees: f64) -> Option<u8> {
    if !angle_degrees.is_finite() {
        return Some(0);
    }
    let normalized = angle_degrees.rem_euclid(360.0);
    let turns = (normalized / 90.0).round();
    if (normalized - turns * 90.0).abs() < 1e-9 {
        Some((turns as u8) % 4)
    } else {
        None
    }
}

/// Rotate a watermark canvas around its center.
///
/// The output canvas is expanded to fit the rotated content and newly
/// exposed areas are transparent. A multiple of 360° returns an identical
/// canvas without resampling.
///
/// # Arguments
///
/// * `watermark` - Canvas to rotate
/// * `angle_degrees` - Rotation angle in degrees (positive = counter-clockwise)
/// * `filter` - Resampling kernel
///
/// # Example
///
/// ```ignore
/// use photomark_core::transform::{rotate_watermark, InterpolationFilter};
///
/// let rotated = rotate_watermark(&rendered, 30.0, InterpolationFilter::Bicubic);
/// ```
pub fn rotate_watermark(
    watermark: &RenderedWatermark,
    angle_degrees: f64,
    filter: InterpolationFilter,
) -> RenderedWatermark {
    let src = watermark.as_image();
    match quarter_turns(angle_degrees) {
        Some(0) => return watermark.clone(),
        // imageops rotates clockwise
        Some(1) => return RenderedWatermark::from_image(imageops::rotate270(src)),
        Some(2) => return RenderedWatermark::from_image(imageops::rotate180(src)),
        Some(3) => return RenderedWatermark::from_image(imageops::rotate90(src)),
        _ => {}
    }

    let (dst_w, dst_h) = compute_rotated_bounds(src.width(), src.height(), angle_degrees);

    // Negate angle so positive values turn counter-clockwise on screen
    let angle_rad = -angle_degrees.to_radians();
    let cos = angle_rad.cos();
    let sin = angle_rad.sin();

    let src_cx = src.width() as f64 / 2.0;
    let src_cy = src.height() as f64 / 2.0;
    let dst_cx = dst_w as f64 / 2.0;
    let dst_cy = dst_h as f64 / 2.0;

    let output = RgbaImage::from_fn(dst_w, dst_h, |dst_x, dst_y| {
        // Work on pixel centers
        let dx = dst_x as f64 + 0.5 - dst_cx;
        let dy = dst_y as f64 + 0.5 - dst_cy;

        let src_x = dx * cos - dy * sin + src_cx - 0.5;
        let src_y = dx * sin + dy * cos + src_cy - 0.5;

        sample(src, src_x, src_y, filter)
    });

    RenderedWatermark::from_image(output)
}

/// Resample `image` at a fractional pixel-center position.
fn sample(image: &RgbaImage, x: f64, y: f64, filter: InterpolationFilter) -> Rgba<u8> {
    let radius = filter.radius();
    let (w, h) = (image.width() as i64, image.height() as i64);

    if x <= -radius || y <= -radius || x >= (w - 1) as f64 + radius || y >= (h - 1) as f64 + radius
    {
        return Rgba([0, 0, 0, 0]);
    }

    let x_start = (x - radius).ceil() as i64;
    let x_end = (x + radius).floor() as i64;
    let y_start = (y - radius).ceil() as i64;
    let y_end = (y + radius).floor() as i64;

    // Premultiplied color in [0], [1], [2]; alpha in [3]
    let mut acc = [0.0f64; 4];
    let mut weight_sum = 0.0;

    for py in y_start..=y_end {
        let wy = filter.weight(y - py as f64);
        if wy == 0.0 {
            continue;
        }
        for px in x_start..=x_end {
            let weight = filter.weight(x - px as f64) * wy;
            if weight == 0.0 {
                continue;
            }
            weight_sum += weight;

            if px < 0 || py < 0 || px >= w || py >= h {
                continue;
            }
            let p = image.get_pixel(px as u32, py as u32).0;
            let coverage = p[3] as f64 / 255.0;
            acc[0] += p[0] as f64 * coverage * weight;
            acc[1] += p[1] as f64 * coverage * weight;
            acc[2] += p[2] as f64 * coverage * weight;
            acc[3] += p[3] as f64 * weight;
        }
    }

    if weight_sum <= 0.0 || acc[3] <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let alpha = (acc[3] / weight_sum).clamp(0.0, 255.0).round();
    if alpha == 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let unpremultiply = |c: f64| (c * 255.0 / acc[3]).clamp(0.0, 255.0).round() as u8;

    Rgba([
        unpremultiply(acc[0]),
        unpremultiply(acc[1]),
        unpremultiply(acc[2]),
        alpha as u8,
    ])
}

/// Catmull-Rom cubic convolution kernel (a = -0.5).
fn catmull_rom_weight(x: f64) -> f64 {
    let a = -0.5;
    let x = x.abs();
    if x < 1.0 {
        ((a + 2.0) * x - (a + 3.0)) * x * x + 1.0
    } else if x < 2.0 {
        ((a * x - 5.0 * a) * x + 8.0 * a) * x - 4.0 * a
    } else {
        0.0
    }
}

/// Lanczos kernel weight function.
///
/// ```text
/// L(x) = sinc(x) * sinc(x/a)  for |x| < a
/// L(x) = 0                     for |x| >= a
/// ```
fn lanczos_weight(x: f64, a: f64) -> f64 {
    if x.abs() < f64::EPSILON {
        return 1.0;
    }
    if x.abs() >= a {
        return 0.0;
    }

    let pi_x = std::f64::consts::PI * x;
    let pi_x_a = pi_x / a;
    (a * pi_x.sin() * pi_x_a.sin()) / (pi_x * pi_x)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A canvas with an opaque red block on a transparent background.
    fn block(width: u32, height: u32) -> RenderedWatermark {
        RenderedWatermark::from_image(RgbaImage::from_fn(width, height, |x, y| {
            if x >= width / 4 && x < width * 3 / 4 && y >= height / 4 && y < height * 3 / 4 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        }))
    }

    fn marker() -> RenderedWatermark {
        // 3x2 with a single marked pixel at the top-right corner
        let mut img = RgbaImage::new(3, 2);
        img.put_pixel(2, 0, Rgba([0, 0, 255, 255]));
        RenderedWatermark::from_image(img)
    }

    #[test]
    fn test_zero_and_full_turns_are_identity() {
        let wm = block(40, 20);
        for angle in [0.0, 360.0, -360.0, 720.0] {
            assert_eq!(rotate_watermark(&wm, angle, InterpolationFilter::Bicubic), wm);
        }
    }

    #[test]
    fn test_quarter_turn_is_counter_clockwise() {
        let rotated = rotate_watermark(&marker(), 90.0, InterpolationFilter::Bicubic);
        assert_eq!(rotated.size(), crate::geometry::Size::new(2, 3));
        // Top-right moves to top-left under a counter-clockwise turn
        assert_eq!(rotated.as_image().get_pixel(0, 0).0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_negative_quarter_turn_is_clockwise() {
        let rotated = rotate_watermark(&marker(), -90.0, InterpolationFilter::Bilinear);
        assert_eq!(rotated.as_image().get_pixel(1, 2).0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_half_turn() {
        let rotated = rotate_watermark(&marker(), 180.0, InterpolationFilter::Lanczos3);
        assert_eq!(rotated.as_image().get_pixel(0, 1).0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_bounds_quarter_turns() {
        assert_eq!(compute_rotated_bounds(100, 50, 90.0), (50, 100));
        assert_eq!(compute_rotated_bounds(100, 50, 180.0), (100, 50));
        assert_eq!(compute_rotated_bounds(100, 50, 270.0), (50, 100));
        assert_eq!(compute_rotated_bounds(100, 50, -90.0), (50, 100));
    }

    #[test]
    fn test_bounds_45_degrees() {
        // 100 * cos45 + 100 * sin45 = 141.42
        assert_eq!(compute_rotated_bounds(100, 100, 45.0), (142, 142));
    }

    #[test]
    fn test_opposite_rotations_same_bounds() {
        assert_eq!(
            compute_rotated_bounds(120, 40, 30.0),
            compute_rotated_bounds(120, 40, -30.0)
        );
    }

    #[test]
    fn test_rotation_expands_canvas_with_transparent_corners() {
        let wm = block(100, 40);
        let rotated = rotate_watermark(&wm, 30.0, InterpolationFilter::Bicubic);
        assert!(rotated.width() > 100);
        assert!(rotated.height() > 40);
        assert_eq!(rotated.as_image().get_pixel(0, 0).0[3], 0);
        let (w, h) = (rotated.width(), rotated.height());
        assert_eq!(rotated.as_image().get_pixel(w - 1, h - 1).0[3], 0);
    }

    #[test]
    fn test_rotation_keeps_center_color() {
        let wm = block(60, 60);
        for filter in [
            InterpolationFilter::Bilinear,
            InterpolationFilter::Bicubic,
            InterpolationFilter::Lanczos3,
        ] {
            let rotated = rotate_watermark(&wm, 17.0, filter);
            let center = rotated
                .as_image()
                .get_pixel(rotated.width() / 2, rotated.height() / 2);
            assert_eq!(center.0, [255, 0, 0, 255], "filter {filter:?}");
        }
    }

    #[test]
    fn test_transparent_neighbors_do_not_darken_edges() {
        // Opaque white on a transparent black background
        let img = RgbaImage::from_fn(20, 20, |x, _| {
            if x < 10 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        });
        let rotated = rotate_watermark(
            &RenderedWatermark::from_image(img),
            10.0,
            InterpolationFilter::Bilinear,
        );
        for p in rotated.as_image().pixels() {
            if p.0[3] > 0 {
                assert_eq!(&p.0[..3], &[255, 255, 255]);
            }
        }
    }

    #[test]
    fn test_1x1_rotation() {
        let wm = RenderedWatermark::from_image(RgbaImage::from_pixel(1, 1, Rgba([9, 9, 9, 255])));
        let rotated = rotate_watermark(&wm, 45.0, InterpolationFilter::Bicubic);
        assert!(rotated.width() >= 1 && rotated.height() >= 1);
    }

    #[test]
    fn test_kernels_interpolate_at_integer_offsets() {
        for filter in [
            InterpolationFilter::Bilinear,
            InterpolationFilter::Bicubic,
            InterpolationFilter::Lanczos3,
        ] {
            assert!((filter.weight(0.0) - 1.0).abs() < 1e-12);
            assert!(filter.weight(1.0).abs() < 1e-12);
            assert!(filter.weight(2.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_lanczos_weight_symmetry() {
        for x in [0.3, 1.2, 2.7] {
            assert!((lanczos_weight(x, 3.0) - lanczos_weight(-x, 3.0)).abs() < 1e-12);
        }
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
