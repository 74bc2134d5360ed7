//! Watermark preview and export bindings.
//!
//! Settings objects use the same flat keys as the native settings documents
//! (`type`, `opacity`, `rotation_deg`, `position_preset`, `manual_pos_px`,
//! `text`, `font_size`, `color_rgba`, ...). Missing keys take their defaults.
//!
//! Browsers have no font directories, so text renders with fonts registered
//! through [`register_font`] and falls back to the built-in bitmap font.
//!
//! # Example
//!
//! ```typescript
//! import { render_preview, export_image, register_font } from '@photomark/wasm';
//!
//! register_font('Inter', new Uint8Array(await (await fetch('/Inter.ttf')).arrayBuffer()));
//!
//! const settings = { type: 'text', text: '© 2024', font_family: 'Inter', opacity: 0.7 };
//! const preview = render_preview(base, settings, canvas.width, canvas.height);
//! ctx.putImageData(new ImageData(new Uint8ClampedArray(preview.image.pixels()), preview.image.width), 0, 0);
//!
//! // After a drag, keep the position in preview space; export converts it
//! settings.manual_pos_px = [dragX, dragY];
//! const full = export_image(base, settings, { resize: { percent: 0.5 } }, preview.scale);
//! ```

use std::cell::RefCell;

use photomark_core::export::{
    apply_loaded, finalize_for_format, preview_base, preview_loaded, LoadedWatermark,
};
use photomark_core::geometry::{PreviewScale, Size};
use photomark_core::model::WatermarkSpec;
use photomark_core::settings::{ExportSettings, WatermarkKind, WatermarkSettings};
use photomark_core::text::MemoryFontProvider;
use photomark_core::transform::resize_image;
use wasm_bindgen::prelude::*;

use crate::types::{JsImage, JsPreview};

thread_local! {
    static FONTS: RefCell<MemoryFontProvider> = RefCell::new(MemoryFontProvider::new());
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Register a TrueType/OpenType font under `name`.
///
/// The first registered font also serves requests for unknown families.
///
/// # Errors
///
/// Returns an error if the bytes are not a parseable font.
#[wasm_bindgen]
pub fn register_font(name: &str, bytes: Vec<u8>) -> Result<(), JsValue> {
    FONTS.with(|fonts| fonts.borrow_mut().register(name, bytes).map_err(js_error))
}

/// Number of registered fonts.
#[wasm_bindgen]
pub fn font_count() -> usize {
    FONTS.with(|fonts| fonts.borrow().len())
}

/// Scale at which an image is shown in a viewport.
///
/// `min(viewport_w / image_w, viewport_h / image_h, 1.0)`; viewport edges
/// below 100 px count as 100.
#[wasm_bindgen]
pub fn preview_scale(image_width: u32, image_height: u32, viewport_width: u32, viewport_height: u32) -> f64 {
    PreviewScale::fit(
        Size::new(image_width, image_height),
        Size::new(viewport_width, viewport_height),
    )
    .factor()
}

/// Build the watermark from settings; image watermarks use `asset`.
///
/// Returns `None` for an image watermark without an asset, in which case
/// the base is shown without a watermark.
pub(crate) fn load_watermark(
    settings: &WatermarkSettings,
    asset: Option<&JsImage>,
) -> Result<Option<LoadedWatermark>, String> {
    match settings.kind {
        WatermarkKind::Text => match settings.to_watermark_spec().map_err(|e| e.to_string())? {
            WatermarkSpec::Text(text) => Ok(Some(LoadedWatermark::Text(text))),
            WatermarkSpec::Image(_) => Ok(None),
        },
        WatermarkKind::Image => match asset {
            Some(asset) => Ok(Some(LoadedWatermark::Image {
                asset: asset.to_dynamic()?,
                scale_factor: settings.wm_scale,
            })),
            None => {
                #[cfg(target_arch = "wasm32")]
                web_sys::console::warn_1(&"photomark: image watermark without an image".into());
                Ok(None)
            }
        },
    }
}

fn parse_settings(settings: JsValue) -> Result<WatermarkSettings, JsValue> {
    if settings.is_undefined() || settings.is_null() {
        return Ok(WatermarkSettings::default());
    }
    serde_wasm_bindgen::from_value(settings)
        .map_err(|e| JsValue::from_str(&format!("Invalid watermark settings: {}", e)))
}

/// Render a live preview of `base` fitted into the viewport.
///
/// `manual_pos_px` in the settings is read in preview space of this very
/// viewport.
///
/// # Arguments
///
/// * `base` - The full-resolution photo
/// * `settings` - Flat watermark settings object
/// * `viewport_width`, `viewport_height` - Display area in pixels
/// * `watermark_image` - The logo for `type: 'image'` settings
#[wasm_bindgen]
pub fn render_preview(
    base: &JsImage,
    settings: JsValue,
    viewport_width: u32,
    viewport_height: u32,
    watermark_image: Option<JsImage>,
) -> Result<JsPreview, JsValue> {
    let settings = parse_settings(settings)?;
    let base_image = base.to_dynamic().map_err(js_error)?;
    let viewport = Size::new(viewport_width, viewport_height);
    let scale = PreviewScale::fit(Size::of(&base_image), viewport);

    let placement = settings.to_placement_spec(Some(scale));
    let loaded = load_watermark(&settings, watermark_image.as_ref()).map_err(js_error)?;

    let frame = match loaded {
        Some(watermark) => FONTS.with(|fonts| {
            preview_loaded(&base_image, &watermark, &placement, viewport, &*fonts.borrow())
        }),
        None => preview_base(&base_image, viewport),
    };
    Ok(frame.into())
}

/// Compose `base` at full resolution and apply the export resize.
///
/// # Arguments
///
/// * `base` - The full-resolution photo
/// * `settings` - Flat watermark settings object
/// * `export` - Flat export settings (`format`, `resize`); may be undefined
/// * `preview_scale` - Scale of the preview `manual_pos_px` was recorded on;
///   pass `1` when the position is already in original pixels
/// * `watermark_image` - The logo for `type: 'image'` settings
///
/// # Returns
///
/// The composed image. JPEG exports come back with opaque alpha.
#[wasm_bindgen]
pub fn export_image(
    base: &JsImage,
    settings: JsValue,
    export: JsValue,
    preview_scale: f64,
    watermark_image: Option<JsImage>,
) -> Result<JsImage, JsValue> {
    let settings = parse_settings(settings)?;
    let export: ExportSettings = if export.is_undefined() || export.is_null() {
        ExportSettings::default()
    } else {
        serde_wasm_bindgen::from_value(export)
            .map_err(|e| JsValue::from_str(&format!("Invalid export settings: {}", e)))?
    };

    let base_image = base.to_dynamic().map_err(js_error)?;
    let placement = settings.to_placement_spec(Some(PreviewScale::new(preview_scale)));

    let composed = match load_watermark(&settings, watermark_image.as_ref()).map_err(js_error)? {
        Some(watermark) => {
            FONTS.with(|fonts| apply_loaded(&base_image, &watermark, &placement, &*fonts.borrow()))
        }
        None => base_image.to_rgba8(),
    };

    let composed = image::DynamicImage::ImageRgba8(composed);
    let resized = match export.resize_spec() {
        Some(resize) => resize_image(composed, &resize).map_err(js_error)?,
        None => composed,
    };
    let output = finalize_for_format(resized, export.format);
    Ok(JsImage::from_dynamic(output))
}
