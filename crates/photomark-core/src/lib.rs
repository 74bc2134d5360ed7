//! Photomark Core - Watermark compositing engine
//!
//! This crate overlays a text or image watermark onto a raster photo. It
//! provides the layout math, text rendering with stroke and shadow, image
//! watermark preparation, rotation, compositing and export used by both the
//! interactive preview and batch export.
//!
//! Every operation is a pure function of its inputs: the caller's base
//! image is never modified and no state is kept between calls.

pub mod batch;
pub mod composite;
pub mod decode;
pub mod encode;
pub mod error;
pub mod export;
pub mod geometry;
pub mod model;
pub mod settings;
pub mod text;
pub mod transform;
pub mod watermark;

pub use batch::{collect_images, validate_output_directory, BatchExporter, BatchReport};
pub use composite::composite;
pub use error::{Result, WatermarkError};
pub use export::{
    apply_watermark, export_image, finalize_for_format, preview_base, render_preview,
    render_watermark, LoadedWatermark, PreviewFrame,
};
pub use geometry::{
    resolve_position, Margin, OriginalPoint, PositionPreset, PreviewPoint, PreviewScale, Size,
};
pub use model::{
    ExportFormat, ExportSpec, ImageWatermark, ManualOffset, NamingRule, PlacementSpec, ResizeSpec,
    Rgba8, TextWatermark, WatermarkSpec,
};
pub use settings::{ExportSettings, WatermarkSettings};
pub use text::{FallbackFontProvider, FontProvider, MemoryFontProvider, SystemFontProvider};
pub use transform::{compute_rotated_bounds, rotate_watermark, InterpolationFilter};
pub use watermark::{prepare_image_watermark, OpacityLut, RenderedWatermark};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specs_are_serializable() {
        let spec = WatermarkSpec::Text(TextWatermark::new("© photomark"));
        let json = serde_json::to_string(&spec).unwrap();
        assert!(json.contains(r#""type":"text""#));
        let back: WatermarkSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);

        let mut placement = PlacementSpec::at_preset(PositionPreset::BottomRight);
        placement.manual_offset = Some(ManualOffset::preview(12.5, 40.0, PreviewScale::new(0.5)));
        let json = serde_json::to_string(&placement).unwrap();
        let back: PlacementSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, placement);
    }

    #[test]
    fn test_export_spec_from_json() {
        let spec: ExportSpec =
            serde_json::from_str(r#"{"format": "JPG", "output_directory": "/out"}"#).unwrap();
        assert_eq!(spec.format, ExportFormat::Jpeg);
        assert_eq!(spec.jpeg_quality, 85);
        assert_eq!(spec.naming, NamingRule::Keep);
    }
}
