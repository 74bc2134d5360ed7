//! Alpha compositing of a rendered watermark onto a base image.
//!
//! All blending uses the Porter-Duff "over" operator on straight
//! (non-premultiplied) RGBA8 pixels.

use image::{DynamicImage, Rgba, RgbaImage};

use crate::geometry::OriginalPoint;
use crate::watermark::RenderedWatermark;

/// Blend `src` over `dst`.
///
/// A fully opaque source or a fully transparent destination yields `src`
/// exactly, a fully transparent source yields `dst`.
#[inline]
pub(crate) fn blend_over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let sa = src.0[3];
    if sa == 0 {
        return dst;
    }
    let da = dst.0[3];
    if sa == 255 || da == 0 {
        return src;
    }

    let sa = sa as f32 / 255.0;
    let da = da as f32 / 255.0;
    let dst_weight = da * (1.0 - sa);
    let out_a = sa + dst_weight;

    let mut out = [0u8; 4];
    for c in 0..3 {
        let value = (src.0[c] as f32 * sa + dst.0[c] as f32 * dst_weight) / out_a;
        out[c] = value.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba(out)
}

/// Composite `watermark` over a copy of `base` with its top-left corner at
/// `position`.
///
/// # Arguments
///
/// * `base` - Base photo; never modified
/// * `watermark` - Transparent overlay
/// * `position` - Overlay origin in base pixel space, may be negative
///
/// # Returns
///
/// An RGBA copy of the base with the overlay blended in. Overlay pixels
/// falling outside the base canvas are dropped.
pub fn composite(
    base: &DynamicImage,
    watermark: &RenderedWatermark,
    position: OriginalPoint,
) -> RgbaImage {
    let mut output = base.to_rgba8();
    composite_in_place(&mut output, watermark, position);
    output
}

/// Same as [`composite`] but blends directly into an owned RGBA canvas.
pub fn composite_in_place(
    canvas: &mut RgbaImage,
    watermark: &RenderedWatermark,
    position: OriginalPoint,
) {
    let overlay = watermark.as_image();
    let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);

    // Visible overlay rectangle in overlay coordinates
    let x0 = (-position.x).clamp(0, overlay.width() as i64);
    let y0 = (-position.y).clamp(0, overlay.height() as i64);
    let x1 = (cw - position.x).clamp(0, overlay.width() as i64);
    let y1 = (ch - position.y).clamp(0, overlay.height() as i64);

    for oy in y0..y1 {
        let ty = (position.y + oy) as u32;
        for ox in x0..x1 {
            let src = *overlay.get_pixel(ox as u32, oy as u32);
            if src.0[3] == 0 {
                continue;
            }
            let tx = (position.x + ox) as u32;
            let dst = canvas.get_pixel_mut(tx, ty);
            *dst = blend_over(*dst, src);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn gray_base(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb([100, 100, 100])))
    }

    fn solid(width: u32, height: u32, color: [u8; 4]) -> RenderedWatermark {
        RenderedWatermark::from_image(RgbaImage::from_pixel(width, height, Rgba(color)))
    }

    #[test]
    fn test_blend_over_edge_cases() {
        let dst = Rgba([10, 20, 30, 255]);
        assert_eq!(blend_over(dst, Rgba([1, 2, 3, 0])), dst);
        assert_eq!(blend_over(dst, Rgba([1, 2, 3, 255])), Rgba([1, 2, 3, 255]));
        assert_eq!(blend_over(Rgba([0, 0, 0, 0]), Rgba([1, 2, 3, 77])), Rgba([1, 2, 3, 77]));
    }

    #[test]
    fn test_blend_over_half_alpha_on_opaque() {
        let out = blend_over(Rgba([0, 0, 0, 255]), Rgba([255, 255, 255, 128]));
        assert_eq!(out.0[3], 255);
        assert_eq!(out.0[0], 128);
    }

    #[test]
    fn test_blend_over_translucent_destination() {
        let out = blend_over(Rgba([0, 0, 255, 128]), Rgba([255, 0, 0, 128]));
        // 0.502 + 0.502 * 0.498 = 0.752
        assert_eq!(out.0[3], 192);
        assert!(out.0[0] > out.0[2]);
    }

    #[test]
    fn test_composite_does_not_mutate_base() {
        let base = gray_base(20, 20);
        let before = base.clone();
        let out = composite(&base, &solid(5, 5, [255, 0, 0, 255]), OriginalPoint::new(2, 2));
        assert_eq!(base, before);
        assert_eq!(out.get_pixel(2, 2).0, [255, 0, 0, 255]);
        assert_eq!(out.get_pixel(1, 1).0, [100, 100, 100, 255]);
        assert_eq!(out.get_pixel(7, 7).0, [100, 100, 100, 255]);
    }

    #[test]
    fn test_composite_clips_negative_position() {
        let base = gray_base(10, 10);
        let out = composite(&base, &solid(4, 4, [0, 255, 0, 255]), OriginalPoint::new(-2, -3));
        assert_eq!(out.get_pixel(0, 0).0, [0, 255, 0, 255]);
        assert_eq!(out.get_pixel(1, 0).0, [0, 255, 0, 255]);
        assert_eq!(out.get_pixel(2, 0).0, [100, 100, 100, 255]);
        assert_eq!(out.get_pixel(0, 1).0, [100, 100, 100, 255]);
    }

    #[test]
    fn test_composite_clips_far_edge_and_outside() {
        let base = gray_base(10, 10);
        let wm = solid(4, 4, [0, 0, 255, 255]);
        let out = composite(&base, &wm, OriginalPoint::new(8, 8));
        assert_eq!(out.get_pixel(9, 9).0, [0, 0, 255, 255]);
        assert_eq!(out.get_pixel(7, 9).0, [100, 100, 100, 255]);

        let untouched = composite(&base, &wm, OriginalPoint::new(50, -50));
        assert_eq!(untouched, base.to_rgba8());
    }

    #[test]
    fn test_transparent_overlay_is_noop() {
        let base = gray_base(8, 8);
        let out = composite(&base, &RenderedWatermark::transparent(8, 8), OriginalPoint::new(0, 0));
        assert_eq!(out, base.to_rgba8());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_over_opaque_destination_stays_opaque(
            d in any::<[u8; 3]>(),
            s in any::<[u8; 4]>(),
        ) {
            let out = blend_over(Rgba([d[0], d[1], d[2], 255]), Rgba(s));
            prop_assert_eq!(out.0[3], 255);
        }

        #[test]
        fn prop_over_never_reduces_alpha(dst in any::<[u8; 4]>(), src in any::<[u8; 4]>()) {
            let out = blend_over(Rgba(dst), Rgba(src));
            prop_assert!(out.0[3] >= dst[3].max(src[3]).saturating_sub(1));
        }

        #[test]
        fn prop_output_channel_between_inputs(
            d in any::<[u8; 3]>(),
            s in any::<[u8; 3]>(),
            a in 1u8..255,
        ) {
            let out = blend_over(Rgba([d[0], d[1], d[2], 255]), Rgba([s[0], s[1], s[2], a]));
            for c in 0..3 {
                prop_assert!(out.0[c] >= d[c].min(s[c]));
                prop_assert!(out.0[c] <= d[c].max(s[c]));
            }
        }
    }
}
