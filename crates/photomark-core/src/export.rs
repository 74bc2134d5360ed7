//! Export pipeline and live preview.
//!
//! Both paths run the same steps: render or prepare the watermark, rotate
//! it, resolve its position and composite it. Export then applies the
//! requested resize; preview works on a downsampled base with every
//! original-space measure scaled by the [`PreviewScale`].
//!
//! # Example
//!
//! ```ignore
//! use photomark_core::export::{export_image, finalize_for_format};
//! use photomark_core::text::SystemFontProvider;
//!
//! let composed = export_image(&base, &watermark, &placement, &export, &SystemFontProvider::new())?;
//! let output = finalize_for_format(composed, export.format);
//! ```

use image::imageops::FilterType as ImageFilter;
use image::{DynamicImage, RgbaImage};

use crate::composite::composite;
use crate::decode::FilterType;
use crate::error::Result;
use crate::geometry::{resolve_position, OriginalPoint, PreviewPoint, PreviewScale, Size};
use crate::model::{
    ExportFormat, ExportSpec, ManualOffset, PlacementSpec, TextWatermark, WatermarkSpec,
};
use crate::text::{render_text, FontProvider};
use crate::transform::{resize, resize_image, rotate_watermark, InterpolationFilter};
use crate::watermark::{load_watermark_image, prepare_image_watermark, RenderedWatermark};

/// A watermark whose external asset, if any, has been loaded.
///
/// Loading happens once; rendering is then infallible and can be repeated
/// for every image of a batch.
#[derive(Debug, Clone)]
pub enum LoadedWatermark {
    Text(TextWatermark),
    Image {
        asset: DynamicImage,
        scale_factor: f32,
    },
}

impl LoadedWatermark {
    /// Load the asset referenced by `spec`.
    ///
    /// # Errors
    ///
    /// Returns `WatermarkError::WatermarkImage` when an image watermark
    /// cannot be read or decoded.
    pub fn load(spec: &WatermarkSpec) -> Result<Self> {
        match spec {
            WatermarkSpec::Text(text) => Ok(Self::Text(text.clone())),
            WatermarkSpec::Image(image) => Ok(Self::Image {
                asset: load_watermark_image(&image.source_path)?,
                scale_factor: image.scale_factor,
            }),
        }
    }

    /// Render at full resolution with `opacity` applied to the alpha channel.
    pub fn render(&self, opacity: f32, provider: &dyn FontProvider) -> RenderedWatermark {
        match self {
            Self::Text(text) => {
                let mut rendered = render_text(text, provider);
                rendered.apply_opacity(opacity);
                rendered
            }
            Self::Image {
                asset,
                scale_factor,
            } => prepare_image_watermark(asset, *scale_factor, opacity),
        }
    }

    /// Render for a preview displayed at `scale`.
    ///
    /// Image watermarks are resampled once from the asset at the combined
    /// factor. Text is rendered at full size and then scaled down.
    fn render_for_preview(
        &self,
        opacity: f32,
        scale: PreviewScale,
        provider: &dyn FontProvider,
    ) -> RenderedWatermark {
        if scale.is_identity() {
            return self.render(opacity, provider);
        }
        match self {
            Self::Text(_) => self
                .render(opacity, provider)
                .scaled(scale.factor(), ImageFilter::Triangle),
            Self::Image {
                asset,
                scale_factor,
            } => {
                let combined = (*scale_factor as f64 * scale.factor()) as f32;
                prepare_image_watermark(asset, combined, opacity)
            }
        }
    }
}

/// Render or prepare the watermark described by `spec`.
///
/// # Arguments
///
/// * `spec` - Text or image watermark
/// * `opacity` - Global opacity, clamped to `[0, 1]`
/// * `provider` - Font source for text watermarks
pub fn render_watermark(
    spec: &WatermarkSpec,
    opacity: f32,
    provider: &dyn FontProvider,
) -> Result<RenderedWatermark> {
    Ok(LoadedWatermark::load(spec)?.render(opacity, provider))
}

fn rotation_of(placement: &PlacementSpec) -> f64 {
    let degrees = placement.rotation_degrees as f64;
    if degrees.is_finite() {
        degrees
    } else {
        0.0
    }
}

/// Where a watermark of `overlay` size lands on a base of `base` size.
///
/// Manual offsets are converted to original pixel space before clamping.
pub fn placement_position(base: Size, overlay: Size, placement: &PlacementSpec) -> OriginalPoint {
    resolve_position(
        base,
        overlay,
        placement.effective_preset(),
        placement.manual_offset.map(ManualOffset::to_original),
        placement.margin,
    )
}

/// Render, rotate, position and composite a watermark onto `base`.
///
/// # Errors
///
/// Fails only when an image watermark asset cannot be loaded.
pub fn apply_watermark(
    base: &DynamicImage,
    spec: &WatermarkSpec,
    placement: &PlacementSpec,
    provider: &dyn FontProvider,
) -> Result<RgbaImage> {
    let loaded = LoadedWatermark::load(spec)?;
    Ok(apply_loaded(base, &loaded, placement, provider))
}

/// [`apply_watermark`] for an already loaded watermark.
pub fn apply_loaded(
    base: &DynamicImage,
    watermark: &LoadedWatermark,
    placement: &PlacementSpec,
    provider: &dyn FontProvider,
) -> RgbaImage {
    let rendered = watermark.render(placement.clamped_opacity(), provider);
    let rotated = rotate_watermark(&rendered, rotation_of(placement), InterpolationFilter::Bicubic);
    let position = placement_position(Size::of(base), rotated.size(), placement);

    tracing::debug!(
        x = position.x,
        y = position.y,
        width = rotated.width(),
        height = rotated.height(),
        "compositing watermark"
    );
    composite(base, &rotated, position)
}

/// Full export pipeline: composite, then resize the composed image.
///
/// The result is RGBA; call [`finalize_for_format`] before encoding.
///
/// # Errors
///
/// Returns an error if the watermark asset cannot be loaded or the resize
/// request is invalid.
pub fn export_image(
    base: &DynamicImage,
    spec: &WatermarkSpec,
    placement: &PlacementSpec,
    export: &ExportSpec,
    provider: &dyn FontProvider,
) -> Result<DynamicImage> {
    let loaded = LoadedWatermark::load(spec)?;
    export_loaded(base, &loaded, placement, export, provider)
}

/// [`export_image`] for an already loaded watermark.
pub fn export_loaded(
    base: &DynamicImage,
    watermark: &LoadedWatermark,
    placement: &PlacementSpec,
    export: &ExportSpec,
    provider: &dyn FontProvider,
) -> Result<DynamicImage> {
    let composed = DynamicImage::ImageRgba8(apply_loaded(base, watermark, placement, provider));
    match &export.resize {
        Some(spec) => resize_image(composed, spec),
        None => Ok(composed),
    }
}

/// Convert a composed image to the color mode `format` can store.
///
/// JPEG has no alpha channel, so the alpha is dropped. PNG keeps RGBA.
pub fn finalize_for_format(img: DynamicImage, format: ExportFormat) -> DynamicImage {
    match format {
        ExportFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()),
        ExportFormat::Png => match img {
            DynamicImage::ImageRgba8(_) => img,
            other => DynamicImage::ImageRgba8(other.to_rgba8()),
        },
    }
}

/// A composed preview and the data needed to map it back to the original.
#[derive(Debug, Clone)]
pub struct PreviewFrame {
    /// Downsampled base with the watermark applied.
    pub image: RgbaImage,
    /// Preview pixels per original pixel.
    pub scale: PreviewScale,
    /// Top-left of the watermark's rotated bounding box, for hit testing.
    pub overlay_origin: PreviewPoint,
    /// Size of the watermark's rotated bounding box in preview pixels.
    pub overlay_size: Size,
}

/// Render a preview of `base` fitted into `viewport`.
///
/// Uses the same resolver and compositor as export. Margins and manual
/// offsets are scaled into preview space, rotation uses the faster
/// bilinear kernel.
///
/// # Errors
///
/// Fails only when an image watermark asset cannot be loaded.
pub fn render_preview(
    base: &DynamicImage,
    spec: &WatermarkSpec,
    placement: &PlacementSpec,
    viewport: Size,
    provider: &dyn FontProvider,
) -> Result<PreviewFrame> {
    let loaded = LoadedWatermark::load(spec)?;
    Ok(preview_loaded(base, &loaded, placement, viewport, provider))
}

/// [`render_preview`] for an already loaded watermark.
pub fn preview_loaded(
    base: &DynamicImage,
    watermark: &LoadedWatermark,
    placement: &PlacementSpec,
    viewport: Size,
    provider: &dyn FontProvider,
) -> PreviewFrame {
    let original = Size::of(base);
    let scale = PreviewScale::fit(original, viewport);
    let display = scale.preview_size(original);

    let scaled_base = resize(base, display.width, display.height, FilterType::Lanczos3);
    let rendered = watermark.render_for_preview(placement.clamped_opacity(), scale, provider);
    let rotated = rotate_watermark(&rendered, rotation_of(placement), InterpolationFilter::Bilinear);

    // Manual offsets are clamped in preview space against the preview margin
    let manual = placement.manual_offset.map(|offset| {
        let p = offset.to_preview(scale);
        OriginalPoint::new(p.x as i64, p.y as i64)
    });
    let position = resolve_position(
        display,
        rotated.size(),
        placement.effective_preset(),
        manual,
        placement.margin.scaled(scale),
    );

    PreviewFrame {
        image: composite(&scaled_base, &rotated, position),
        scale,
        overlay_origin: PreviewPoint::new(position.x as f64, position.y as f64),
        overlay_size: rotated.size(),
    }
}

/// A preview of `base` alone, for when there is nothing to draw yet.
pub fn preview_base(base: &DynamicImage, viewport: Size) -> PreviewFrame {
    let original = Size::of(base);
    let scale = PreviewScale::fit(original, viewport);
    let display = scale.preview_size(original);
    PreviewFrame {
        image: resize(base, display.width, display.height, FilterType::Lanczos3).to_rgba8(),
        scale,
        overlay_origin: PreviewPoint::default(),
        overlay_size: Size::default(),
    }
}
