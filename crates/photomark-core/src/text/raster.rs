//! Glyph coverage masks and stroke dilation.

use ab_glyph::{point, Font, GlyphId, OutlinedGlyph, ScaleFont};
use image::{Rgba, RgbaImage};

use super::bitmap::{BitmapFont, CELL_HEIGHT, CELL_WIDTH, GLYPH_HEIGHT, GLYPH_WIDTH};
use super::font::{FontHandle, OutlineFont};
use crate::composite::blend_over;
use crate::model::Rgba8;

/// Per-pixel ink coverage in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CoverageMask {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl CoverageMask {
    pub fn new(width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        Self {
            width,
            height,
            data: vec![0.0; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[(y * self.width + x) as usize]
    }

    /// Add coverage, saturating at 1.
    #[inline]
    fn add(&mut self, x: i64, y: i64, coverage: f32) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let slot = &mut self.data[(y as u32 * self.width + x as u32) as usize];
        *slot = (*slot + coverage).min(1.0);
    }

    /// Grow the mask by `radius` pixels in every direction.
    ///
    /// Each inked pixel is splatted over a disk of `radius + 0.5` with an
    /// antialiased rim, keeping the maximum coverage per pixel. The result
    /// is `2 * radius` larger on each axis and the original sits at
    /// (`radius`, `radius`).
    pub fn dilated(&self, radius: u32) -> Self {
        if radius == 0 {
            return self.clone();
        }
        let r = radius as i64;
        let reach = radius as f32 + 0.5;
        let kernel: Vec<(i64, i64, f32)> = (-r..=r)
            .flat_map(|dy| (-r..=r).map(move |dx| (dx, dy)))
            .filter_map(|(dx, dy)| {
                let dist = ((dx * dx + dy * dy) as f32).sqrt();
                let weight = (reach - dist).clamp(0.0, 1.0);
                (weight > 0.0).then_some((dx, dy, weight))
            })
            .collect();

        let mut out = Self::new(self.width + 2 * radius, self.height + 2 * radius);
        for y in 0..self.height {
            for x in 0..self.width {
                let c = self.get(x, y);
                if c <= 0.0 {
                    continue;
                }
                let (cx, cy) = (x as i64 + r, y as i64 + r);
                for &(dx, dy, weight) in &kernel {
                    let idx = ((cy + dy) * out.width as i64 + cx + dx) as usize;
                    let value = c * weight;
                    if value > out.data[idx] {
                        out.data[idx] = value;
                    }
                }
            }
        }
        out
    }

    /// Composite `color` weighted by this mask onto `canvas` at (`x`, `y`).
    pub fn paint(&self, canvas: &mut RgbaImage, x: i64, y: i64, color: Rgba8) {
        let [r, g, b, a] = color.0;
        let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);
        for my in 0..self.height {
            let ty = y + my as i64;
            if ty < 0 || ty >= ch {
                continue;
            }
            for mx in 0..self.width {
                let tx = x + mx as i64;
                if tx < 0 || tx >= cw {
                    continue;
                }
                let coverage = self.get(mx, my);
                if coverage <= 0.0 {
                    continue;
                }
                let alpha = (a as f32 * coverage).round().clamp(0.0, 255.0) as u8;
                let dst = canvas.get_pixel_mut(tx as u32, ty as u32);
                *dst = blend_over(*dst, Rgba([r, g, b, alpha]));
            }
        }
    }
}

/// A region of the ink box, in pixels from its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Window {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Window {
    /// The part of an `ink`-sized box placed at `offset` on a `canvas` that
    /// can still land on it after being shifted by up to `reach` pixels.
    pub fn visible(ink: (u32, u32), offset: (i64, i64), canvas: (u32, u32), reach: u32) -> Self {
        let axis = |len: u32, off: i64, extent: u32| {
            let reach = reach as i64;
            let start = (-off - reach).clamp(0, len as i64);
            let end = (extent as i64 - off + reach).clamp(start, len as i64);
            (start as u32, (end - start) as u32)
        };
        let (x, width) = axis(ink.0, offset.0, canvas.0);
        let (y, height) = axis(ink.1, offset.1, canvas.1);
        Self { x, y, width, height }
    }

    fn contains_span(&self, x: i64, y: i64, width: i64, height: i64) -> bool {
        x < self.x as i64 + self.width as i64
            && x + width > self.x as i64
            && y < self.y as i64 + self.height as i64
            && y + height > self.y as i64
    }
}

/// Glyphs positioned relative to the tight ink box of a text.
///
/// Laying out costs one pass over the characters; pixels are only produced
/// by [`TextLayout::rasterize`] for the requested window.
pub(crate) enum TextLayout<'a> {
    Empty,
    Outline {
        glyphs: Vec<(OutlinedGlyph, i64, i64)>,
        size: (u32, u32),
    },
    Bitmap {
        font: &'a BitmapFont,
        block: u32,
        cells: Vec<(char, i64, i64)>,
        size: (u32, u32),
    },
}

/// Lay out `text`. Lines are separated by `\n`.
pub(crate) fn layout<'a>(font: &'a FontHandle, text: &str, px_size: f32) -> TextLayout<'a> {
    match font {
        FontHandle::Outline(outline) => layout_outline(outline, text, px_size),
        FontHandle::Bitmap(bitmap) => layout_bitmap(bitmap, text, px_size),
    }
}

impl TextLayout<'_> {
    /// Size of the tight ink box; 1×1 for a text without ink.
    pub fn ink_size(&self) -> (u32, u32) {
        match self {
            TextLayout::Empty => (1, 1),
            TextLayout::Outline { size, .. } | TextLayout::Bitmap { size, .. } => *size,
        }
    }

    /// Covering window for the whole ink box.
    pub fn full_window(&self) -> Window {
        let (width, height) = self.ink_size();
        Window { x: 0, y: 0, width, height }
    }

    /// Coverage of the ink inside `window`, with the window origin at (0, 0).
    pub fn rasterize(&self, window: Window) -> CoverageMask {
        let mut mask = CoverageMask::new(window.width, window.height);
        let (wx, wy) = (window.x as i64, window.y as i64);
        match self {
            TextLayout::Empty => {}
            TextLayout::Outline { glyphs, .. } => {
                for (glyph, gx, gy) in glyphs {
                    let bounds = glyph.px_bounds();
                    let (w, h) = (bounds.width().ceil() as i64, bounds.height().ceil() as i64);
                    if !window.contains_span(*gx, *gy, w, h) {
                        continue;
                    }
                    glyph.draw(|x, y, coverage| {
                        mask.add(gx + x as i64 - wx, gy + y as i64 - wy, coverage);
                    });
                }
            }
            TextLayout::Bitmap { font, block, cells, .. } => {
                let block = *block;
                let (cell_w, cell_h) = ((GLYPH_WIDTH * block) as i64, (GLYPH_HEIGHT * block) as i64);
                for &(c, left, top) in cells {
                    if !window.contains_span(left, top, cell_w, cell_h) {
                        continue;
                    }
                    for gy in 0..GLYPH_HEIGHT {
                        for gx in 0..GLYPH_WIDTH {
                            if !font.is_set(c, gx, gy) {
                                continue;
                            }
                            let px = left + (gx * block) as i64 - wx;
                            let py = top + (gy * block) as i64 - wy;
                            for by in 0..block as i64 {
                                for bx in 0..block as i64 {
                                    mask.add(px + bx, py + by, 1.0);
                                }
                            }
                        }
                    }
                }
            }
        }
        mask
    }
}

fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n').map(|line| line.trim_end_matches('\r'))
}

fn box_size(min: (i64, i64), max: (i64, i64)) -> (u32, u32) {
    let span = |lo: i64, hi: i64| (hi - lo).clamp(1, u32::MAX as i64) as u32;
    (span(min.0, max.0), span(min.1, max.1))
}

fn layout_outline<'a>(outline: &OutlineFont, text: &str, px_size: f32) -> TextLayout<'a> {
    let font = outline.font();
    let scale = outline.em_scale(px_size);
    let scaled = font.as_scaled(scale);
    let line_advance = scaled.height() + scaled.line_gap();

    let mut glyphs = Vec::new();
    for (line_no, line) in lines(text).enumerate() {
        let baseline = scaled.ascent() + line_no as f32 * line_advance;
        let mut caret = 0.0f32;
        let mut prev: Option<GlyphId> = None;
        for c in line.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = prev {
                caret += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(scale, point(caret, baseline));
            caret += scaled.h_advance(id);
            prev = Some(id);
            if let Some(outlined) = font.outline_glyph(glyph) {
                glyphs.push(outlined);
            }
        }
    }

    let Some(first) = glyphs.first() else {
        return TextLayout::Empty;
    };
    let mut min = first.px_bounds().min;
    let mut max = first.px_bounds().max;
    for glyph in &glyphs {
        let bounds = glyph.px_bounds();
        min.x = min.x.min(bounds.min.x);
        min.y = min.y.min(bounds.min.y);
        max.x = max.x.max(bounds.max.x);
        max.y = max.y.max(bounds.max.y);
    }
    let (origin_x, origin_y) = (min.x.floor(), min.y.floor());
    let size = box_size(
        (origin_x as i64, origin_y as i64),
        (max.x.ceil() as i64, max.y.ceil() as i64),
    );

    let glyphs = glyphs
        .into_iter()
        .map(|glyph| {
            let bounds = glyph.px_bounds();
            let gx = (bounds.min.x - origin_x) as i64;
            let gy = (bounds.min.y - origin_y) as i64;
            (glyph, gx, gy)
        })
        .collect();
    TextLayout::Outline { glyphs, size }
}

/// Inked column and row range of a glyph, inclusive.
fn glyph_ink(font: &BitmapFont, c: char) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for gy in 0..GLYPH_HEIGHT {
        for gx in 0..GLYPH_WIDTH {
            if font.is_set(c, gx, gy) {
                bounds = Some(match bounds {
                    None => (gx, gy, gx, gy),
                    Some((x0, y0, x1, y1)) => (x0.min(gx), y0.min(gy), x1.max(gx), y1.max(gy)),
                });
            }
        }
    }
    bounds
}

fn layout_bitmap<'a>(font: &'a BitmapFont, text: &str, px_size: f32) -> TextLayout<'a> {
    let block = font.block_size(px_size);
    let (cell_w, cell_h) = ((CELL_WIDTH * block) as i64, (CELL_HEIGHT * block) as i64);

    let mut cells = Vec::new();
    let mut bounds: Option<((i64, i64), (i64, i64))> = None;
    for (line_no, line) in lines(text).enumerate() {
        let top = line_no as i64 * cell_h;
        for (col_no, c) in line.chars().enumerate() {
            let Some((x0, y0, x1, y1)) = glyph_ink(font, c) else {
                continue;
            };
            let left = col_no as i64 * cell_w;
            let lo = (left + (x0 * block) as i64, top + (y0 * block) as i64);
            let hi = (left + ((x1 + 1) * block) as i64, top + ((y1 + 1) * block) as i64);
            bounds = Some(match bounds {
                None => (lo, hi),
                Some((min, max)) => (
                    (min.0.min(lo.0), min.1.min(lo.1)),
                    (max.0.max(hi.0), max.1.max(hi.1)),
                ),
            });
            cells.push((c, left, top));
        }
    }

    let Some((min, max)) = bounds else {
        return TextLayout::Empty;
    };
    for cell in &mut cells {
        cell.1 -= min.0;
        cell.2 -= min.1;
    }
    TextLayout::Bitmap {
        font,
        block,
        cells,
        size: box_size(min, max),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::bitmap::BUILTIN_FONT;

    fn bitmap() -> FontHandle {
        FontHandle::Bitmap(&BUILTIN_FONT)
    }

    fn rasterize(font: &FontHandle, text: &str, px_size: f32) -> CoverageMask {
        let layout = layout(font, text, px_size);
        layout.rasterize(layout.full_window())
    }

    impl CoverageMask {
        fn has_ink(&self) -> bool {
            self.data.iter().any(|c| *c > 0.0)
        }
    }

    #[test]
    fn test_bitmap_letter_i_is_tight() {
        // 'I' spans columns 1..=3 and all seven rows
        let mask = rasterize(&bitmap(), "I", 8.0);
        assert_eq!((mask.width(), mask.height()), (3, 7));
    }

    #[test]
    fn test_bitmap_scales_by_blocks() {
        let mask = rasterize(&bitmap(), "I", 32.0);
        assert_eq!((mask.width(), mask.height()), (12, 28));
        assert_eq!(mask.get(0, 0), 1.0);
    }

    #[test]
    fn test_bitmap_multiline_is_taller() {
        let one = rasterize(&bitmap(), "AB", 8.0);
        let two = rasterize(&bitmap(), "AB\nAB", 8.0);
        assert_eq!(two.width(), one.width());
        assert_eq!(two.height(), one.height() * 2 + 1);
    }

    #[test]
    fn test_blank_text_is_empty_pixel() {
        let mask = rasterize(&bitmap(), "   ", 16.0);
        assert_eq!((mask.width(), mask.height()), (1, 1));
        assert!(!mask.has_ink());
    }

    #[test]
    fn test_window_matches_full_render() {
        let font = bitmap();
        let layout = layout(&font, "AB", 8.0);
        let full = layout.rasterize(layout.full_window());
        let part = layout.rasterize(Window { x: 4, y: 2, width: 5, height: 3 });
        assert_eq!((part.width(), part.height()), (5, 3));
        for y in 0..3 {
            for x in 0..5 {
                assert_eq!(part.get(x, y), full.get(x + 4, y + 2));
            }
        }
    }

    #[test]
    fn test_visible_window_is_clipped_to_canvas() {
        // A 10000 px wide box centred on a 2000 px canvas
        let window = Window::visible((10_000, 40), (-4000, 5), (2000, 60), 25);
        assert_eq!(window, Window { x: 3975, y: 0, width: 2050, height: 40 });

        // Fully visible box keeps every pixel
        let window = Window::visible((100, 40), (10, 10), (200, 60), 0);
        assert_eq!(window, Window { x: 0, y: 0, width: 100, height: 40 });
    }

    #[test]
    fn test_long_line_layout_is_not_materialized() {
        let font = bitmap();
        let text = "W".repeat(100_000);
        let layout = layout(&font, &text, 500.0);
        let (w, h) = layout.ink_size();
        // 500 px draws 63 px blocks; the last cell has no trailing gap column
        assert_eq!((w, h), ((100_000 * 6 - 1) * 63, 7 * 63));
        let mask = layout.rasterize(Window { x: w / 2, y: 0, width: 64, height: 64 });
        assert_eq!((mask.width(), mask.height()), (64, 64));
    }

    #[test]
    fn test_dilation_grows_by_radius() {
        let mut mask = CoverageMask::new(1, 1);
        mask.add(0, 0, 1.0);
        let grown = mask.dilated(3);
        assert_eq!((grown.width(), grown.height()), (7, 7));
        assert_eq!(grown.get(3, 3), 1.0);
        assert_eq!(grown.get(1, 3), 1.0);
        // Rim pixel at distance 3 gets half coverage
        assert_eq!(grown.get(0, 3), 0.5);
        // Corner lies at distance 4.24, outside radius 3.5
        assert_eq!(grown.get(0, 0), 0.0);
    }

    #[test]
    fn test_dilation_zero_radius_is_identity() {
        let mask = rasterize(&bitmap(), "x", 8.0);
        assert_eq!(mask.dilated(0), mask);
    }

    #[test]
    fn test_paint_clips_to_canvas() {
        let mut mask = CoverageMask::new(4, 4);
        for y in 0..4 {
            for x in 0..4 {
                mask.add(x, y, 1.0);
            }
        }
        let mut canvas = RgbaImage::new(3, 3);
        mask.paint(&mut canvas, -2, 1, Rgba8::new(255, 0, 0, 255));
        assert_eq!(canvas.get_pixel(0, 1).0, [255, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(1, 1).0, [255, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(2, 1).0, [0, 0, 0, 0]);
        assert_eq!(canvas.get_pixel(0, 0).0, [0, 0, 0, 0]);
    }
}
