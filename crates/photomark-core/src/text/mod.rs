//! Text watermark rendering.
//!
//! This module renders a [`TextWatermark`] into a standalone transparent
//! canvas, with optional stroke and drop shadow.
//!
//! # Features
//!
//! - Font resolution through a [`FontProvider`] with a fallback chain that
//!   ends at a built-in bitmap font, so rendering always succeeds
//! - Stroke by dilating the glyph coverage mask
//! - Drop shadow drawn behind the main glyph run
//! - Canvas padded so stroke and shadow are never clipped
//!
//! # Example
//!
//! ```ignore
//! use photomark_core::model::TextWatermark;
//! use photomark_core::text::{render_text, SystemFontProvider};
//!
//! let spec = TextWatermark::new("© 2024");
//! let rendered = render_text(&spec, &SystemFontProvider::new());
//! ```

mod bitmap;
mod font;
mod raster;

pub use bitmap::{BitmapFont, BUILTIN_FONT};
pub use font::{
    FallbackFontProvider, FontHandle, FontProvider, FontSource, MemoryFontProvider, OutlineFont,
    SystemFontProvider, FALLBACK_FAMILIES,
};

use image::RgbaImage;

use crate::model::{Rgba8, TextWatermark, PLACEHOLDER_TEXT};
use crate::watermark::RenderedWatermark;

pub const MIN_FONT_SIZE: u32 = 8;
pub const MAX_FONT_SIZE: u32 = 500;
pub const MAX_STROKE_WIDTH: u32 = 20;

/// Canvas width bounds in pixels.
pub const CANVAS_WIDTH_RANGE: (u32, u32) = (50, 2000);
/// Canvas height bounds in pixels.
pub const CANVAS_HEIGHT_RANGE: (u32, u32) = (20, 1000);

/// Minimum padding around the text block.
const MIN_PADDING: u32 = 10;

/// The normalized arguments of one text render.
///
/// Built from a [`TextWatermark`] with the placeholder substituted for blank
/// content and the size and stroke width clamped.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub content: String,
    pub font_family: Option<String>,
    pub font_size: u32,
    pub bold: bool,
    pub italic: bool,
    pub color: Rgba8,
    pub stroke_width: u32,
    pub stroke_color: Option<Rgba8>,
    pub shadow_offset: (i32, i32),
    pub shadow_color: Option<Rgba8>,
}

impl TextStyle {
    pub fn new(spec: &TextWatermark) -> Self {
        let content = if spec.content.trim().is_empty() {
            PLACEHOLDER_TEXT.to_string()
        } else {
            spec.content.clone()
        };
        Self {
            content,
            font_family: Some(spec.family().to_string()),
            font_size: spec.font_size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE),
            bold: spec.bold,
            italic: spec.italic,
            color: spec.color,
            stroke_width: spec.stroke_width.min(MAX_STROKE_WIDTH),
            stroke_color: spec.stroke_color,
            shadow_offset: spec.shadow_offset,
            shadow_color: spec.shadow_color,
        }
    }

    fn draws_shadow(&self) -> bool {
        self.shadow_color.is_some() && self.shadow_offset != (0, 0)
    }

    /// Extra room the shadow needs on each side.
    fn shadow_padding(&self) -> u32 {
        if self.shadow_offset == (0, 0) {
            0
        } else {
            self.shadow_offset
                .0
                .unsigned_abs()
                .max(self.shadow_offset.1.unsigned_abs())
        }
    }
}

/// Render a text watermark at full opacity.
pub fn render_text(spec: &TextWatermark, provider: &dyn FontProvider) -> RenderedWatermark {
    render_style(&TextStyle::new(spec), provider)
}

/// Render normalized text arguments into a transparent canvas.
///
/// Draw order, back to front: shadow stroke, shadow fill, main stroke,
/// main fill. Each layer is composited with the "over" operator.
pub fn render_style(style: &TextStyle, provider: &dyn FontProvider) -> RenderedWatermark {
    let font = provider.resolve(style.font_family.as_deref(), style.bold, style.italic);
    let layout = raster::layout(&font, &style.content, style.font_size as f32);
    let (ink_w, ink_h) = layout.ink_size();

    // Measured box includes the stroke even when no stroke color is set
    let stroke_width = style.stroke_width;
    let text_w = ink_w.saturating_add(2 * stroke_width);
    let text_h = ink_h.saturating_add(2 * stroke_width);

    let pad = MIN_PADDING.max(stroke_width + style.shadow_padding() + 5);
    let canvas_w = text_w
        .saturating_add(pad * 2)
        .clamp(CANVAS_WIDTH_RANGE.0, CANVAS_WIDTH_RANGE.1);
    let canvas_h = text_h
        .saturating_add(pad * 2)
        .clamp(CANVAS_HEIGHT_RANGE.0, CANVAS_HEIGHT_RANGE.1);

    let x = (canvas_w as i64 - text_w as i64).div_euclid(2);
    let y = (canvas_h as i64 - text_h as i64).div_euclid(2);
    let inset = stroke_width as i64;

    // Ink that no layer can bring onto the canvas is never rasterized
    let window = raster::Window::visible(
        (ink_w, ink_h),
        (x + inset, y + inset),
        (canvas_w, canvas_h),
        stroke_width + style.shadow_padding(),
    );
    let fill = layout.rasterize(window);
    let stroke = (stroke_width > 0).then(|| fill.dilated(stroke_width));

    tracing::debug!(
        text = %style.content,
        font = ?font,
        canvas_w,
        canvas_h,
        "rendering text watermark"
    );

    let mut canvas = RgbaImage::new(canvas_w, canvas_h);
    // Stroke masks start at the window corner, fill masks `inset` further in
    let (x, y) = (x + window.x as i64, y + window.y as i64);

    if let Some(shadow_color) = style.shadow_color.filter(|_| style.draws_shadow()) {
        let sx = x + style.shadow_offset.0 as i64;
        let sy = y + style.shadow_offset.1 as i64;
        if let Some(stroke) = &stroke {
            stroke.paint(&mut canvas, sx, sy, style.stroke_color.unwrap_or(shadow_color));
        }
        fill.paint(&mut canvas, sx + inset, sy + inset, shadow_color);
    }

    if let (Some(stroke), Some(stroke_color)) = (&stroke, style.stroke_color) {
        stroke.paint(&mut canvas, x, y, stroke_color);
    }
    fill.paint(&mut canvas, x + inset, y + inset, style.color);

    RenderedWatermark::from_image(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;

    fn spec(content: &str) -> TextWatermark {
        TextWatermark {
            content: content.to_string(),
            font_size: 32,
            ..Default::default()
        }
    }

    fn render(spec: &TextWatermark) -> RenderedWatermark {
        render_text(spec, &FallbackFontProvider)
    }

    fn count_alpha(wm: &RenderedWatermark, pred: impl Fn(&image::Rgba<u8>) -> bool) -> usize {
        wm.as_image().pixels().filter(|p| pred(p)).count()
    }

    #[test]
    fn test_blank_content_uses_placeholder() {
        let style = TextStyle::new(&spec("   "));
        assert_eq!(style.content, PLACEHOLDER_TEXT);
        assert_eq!(render(&spec("")), render(&spec(PLACEHOLDER_TEXT)));
    }

    #[test]
    fn test_size_and_stroke_clamped() {
        let mut s = spec("a");
        s.font_size = 2;
        s.stroke_width = 99;
        let style = TextStyle::new(&s);
        assert_eq!(style.font_size, MIN_FONT_SIZE);
        assert_eq!(style.stroke_width, MAX_STROKE_WIDTH);

        s.font_size = 10_000;
        assert_eq!(TextStyle::new(&s).font_size, MAX_FONT_SIZE);
    }

    #[test]
    fn test_canvas_is_text_plus_padding() {
        // Bitmap "TEST" at 32px: block 4, ink 23x7 cells -> 92x28 px
        let wm = render(&spec("TEST"));
        assert_eq!(wm.size(), Size::new(92 + 20, 28 + 20));
    }

    #[test]
    fn test_canvas_minimum_size() {
        let mut s = spec(".");
        s.font_size = 8;
        let wm = render(&s);
        assert_eq!(wm.size(), Size::new(50, 22));
    }

    #[test]
    fn test_canvas_maximum_size() {
        // Six lines of 15 glyphs at block size 25: 2225 x 1175 px of ink
        let mut s = spec(&vec!["W".repeat(15); 6].join("\n"));
        s.font_size = 200;
        let wm = render(&s);
        assert_eq!(wm.size(), Size::new(2000, 1000));
    }

    #[test]
    fn test_very_long_line_renders_into_clamped_canvas() {
        let mut s = spec(&"W".repeat(5000));
        s.font_size = 200;
        s.stroke_width = 4;
        s.stroke_color = Some(Rgba8::new(0, 0, 0, 255));
        s.shadow_offset = (3, 3);
        s.shadow_color = Some(Rgba8::new(0, 0, 0, 128));
        let wm = render(&s);
        // 175 px of ink, 4 px stroke each side, padding max(10, 4 + 3 + 5)
        assert_eq!(wm.size(), Size::new(2000, 175 + 8 + 2 * 12));

        // The text overflows both sides, so ink reaches both edges
        let img = wm.as_image();
        let inked = |xs: std::ops::Range<u32>| {
            xs.into_iter()
                .any(|x| (0..img.height()).any(|y| img.get_pixel(x, y).0[3] > 0))
        };
        assert!(inked(0..100));
        assert!(inked(1900..2000));
    }

    #[test]
    fn test_fill_color_and_transparent_background() {
        let mut s = spec("H");
        s.color = Rgba8::new(10, 200, 30, 255);
        let wm = render(&s);
        assert_eq!(wm.as_image().get_pixel(0, 0).0, [0, 0, 0, 0]);
        assert!(count_alpha(&wm, |p| p.0 == [10, 200, 30, 255]) > 0);
    }

    #[test]
    fn test_stroke_without_color_only_grows_canvas() {
        let plain = render(&spec("TEST"));
        let mut s = spec("TEST");
        s.stroke_width = 3;
        let stroked = render(&s);
        assert_eq!(stroked.width(), plain.width() + 6);
        let ink = |wm: &RenderedWatermark| count_alpha(wm, |p| p.0[3] > 0);
        assert_eq!(ink(&stroked), ink(&plain));
    }

    #[test]
    fn test_stroke_surrounds_fill() {
        let mut s = spec("H");
        s.color = Rgba8::WHITE;
        s.stroke_width = 2;
        s.stroke_color = Some(Rgba8::BLACK);
        let wm = render(&s);
        let white = count_alpha(&wm, |p| p.0 == [255, 255, 255, 255]);
        let black = count_alpha(&wm, |p| p.0 == [0, 0, 0, 255]);
        assert!(white > 0);
        assert!(black > 0);

        let ink = |wm: &RenderedWatermark| count_alpha(wm, |p| p.0[3] > 0);
        assert!(ink(&wm) > ink(&render(&spec("H"))));
    }

    #[test]
    fn test_shadow_requires_offset() {
        let mut s = spec("H");
        s.shadow_color = Some(Rgba8::BLACK);
        assert_eq!(render(&s), render(&spec("H")));

        s.shadow_offset = (3, 3);
        let shadowed = render(&s);
        assert!(count_alpha(&shadowed, |p| p.0 == [0, 0, 0, 255]) > 0);
    }

    #[test]
    fn test_shadow_never_covers_main_text() {
        let mut s = spec("H");
        s.color = Rgba8::WHITE;
        s.shadow_color = Some(Rgba8::BLACK);
        s.shadow_offset = (2, 2);
        let shadowed = render(&s);

        let mut plain = spec("H");
        plain.color = Rgba8::WHITE;
        plain.shadow_offset = (2, 2);
        let reference = render(&plain);

        for (a, b) in shadowed.as_image().pixels().zip(reference.as_image().pixels()) {
            if b.0 == [255, 255, 255, 255] {
                assert_eq!(a.0, [255, 255, 255, 255]);
            }
        }
    }

    #[test]
    fn test_shadow_padding_widens_canvas() {
        let mut s = spec("TEST");
        s.shadow_offset = (-12, 4);
        s.shadow_color = Some(Rgba8::BLACK);
        let wm = render(&s);
        // pad = max(10, 0 + 12 + 5) = 17
        assert_eq!(wm.size(), Size::new(92 + 34, 28 + 34));
    }

    // Outline font path

    const MONO: &[u8] = include_bytes!("../../tests/fixtures/DejaVuSansMono.ttf");

    fn mono() -> MemoryFontProvider {
        let mut provider = MemoryFontProvider::new();
        provider.register("DejaVu Sans Mono", MONO.to_vec()).unwrap();
        provider
    }

    fn render_mono(spec: &TextWatermark) -> RenderedWatermark {
        render_text(spec, &mono())
    }

    fn mono_ink(content: &str, size: f32) -> (u32, u32) {
        let font = mono().resolve(None, false, false);
        assert!(!font.is_bitmap());
        raster::layout(&font, content, size).ink_size()
    }

    #[test]
    fn test_outline_canvas_is_ink_plus_padding() {
        let (w, h) = mono_ink("TEST", 32.0);
        assert_eq!(render_mono(&spec("TEST")).size(), Size::new(w + 20, h + 20));

        // pad = max(10, 6 + 4 + 5) = 15, stroke adds 6 on each side
        let mut s = spec("TEST");
        s.stroke_width = 6;
        s.shadow_offset = (4, -2);
        s.shadow_color = Some(Rgba8::BLACK);
        assert_eq!(render_mono(&s).size(), Size::new(w + 12 + 30, h + 12 + 30));
    }

    #[test]
    fn test_outline_coverage_is_antialiased() {
        let mut s = spec("TEST");
        s.color = Rgba8::new(255, 255, 255, 255);
        let wm = render_mono(&s);
        assert!(count_alpha(&wm, |p| p.0[3] == 255) > 0);
        assert!(count_alpha(&wm, |p| p.0[3] > 0 && p.0[3] < 255) > 0);
        assert_eq!(wm.as_image().get_pixel(0, 0).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_outline_size_and_lines_scale_the_box() {
        let (small_w, small_h) = mono_ink("Ag", 32.0);
        let (large_w, large_h) = mono_ink("Ag", 64.0);
        assert!(large_w > small_w * 3 / 2);
        assert!(large_h > small_h * 3 / 2);

        // A second line adds at least one em of height
        let (_, two_h) = mono_ink("Ag\nAg", 32.0);
        assert!(two_h >= small_h + 32);
    }

    #[test]
    fn test_outline_stroke_rings_the_fill() {
        let mut s = spec("O");
        s.font_size = 64;
        s.color = Rgba8::WHITE;
        s.stroke_width = 3;
        s.stroke_color = Some(Rgba8::new(255, 0, 0, 255));
        let wm = render_mono(&s);
        let img = wm.as_image();

        assert!(count_alpha(&wm, |p| p.0 == [255, 0, 0, 255]) > 0);
        assert!(count_alpha(&wm, |p| p.0 == [255, 255, 255, 255]) > 0);

        // Scanning the middle row from the left, stroke is met before fill
        let y = img.height() / 2;
        let first = (0..img.width())
            .map(|x| img.get_pixel(x, y).0)
            .find(|p| p[3] == 255)
            .unwrap();
        assert_eq!(first, [255, 0, 0, 255]);
    }

    #[test]
    fn test_outline_shadow_sits_behind_fill() {
        let mut s = spec("TEST");
        s.color = Rgba8::WHITE;
        s.shadow_color = Some(Rgba8::new(0, 0, 255, 255));
        s.shadow_offset = (3, 3);
        let shadowed = render_mono(&s);
        assert!(count_alpha(&shadowed, |p| p.0 == [0, 0, 255, 255]) > 0);

        let mut plain = spec("TEST");
        plain.color = Rgba8::WHITE;
        plain.shadow_offset = (3, 3);
        let reference = render_mono(&plain);
        assert_eq!(shadowed.size(), reference.size());
        for (a, b) in shadowed.as_image().pixels().zip(reference.as_image().pixels()) {
            if b.0 == [255, 255, 255, 255] {
                assert_eq!(a.0, [255, 255, 255, 255]);
            }
        }
    }
}
