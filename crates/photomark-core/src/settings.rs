//! Flat settings documents exchanged with the interactive layer and the
//! template store.
//!
//! The documents are plain serde structs with a default for every key, so a
//! partial or older document still loads. Numeric values are clamped when
//! converted into the engine's specs, never rejected.
//!
//! # Example
//!
//! ```ignore
//! use photomark_core::settings::WatermarkSettings;
//!
//! let settings: WatermarkSettings = serde_json::from_str(r#"{"text": "© me", "opacity": 0.6}"#)?;
//! let spec = settings.to_watermark_spec()?;
//! let placement = settings.to_placement_spec(None);
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WatermarkError};
use crate::geometry::{Margin, PositionPreset, PreviewScale};
use crate::model::{
    ExportFormat, ExportSpec, ImageWatermark, ManualOffset, NamingRule, PlacementSpec, ResizeSpec,
    Rgba8, TextWatermark, WatermarkSpec, DEFAULT_JPEG_QUALITY,
};

/// Which kind of watermark a settings document describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatermarkKind {
    #[default]
    Text,
    Image,
}

/// Pixel space `manual_pos_px` was recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateSpace {
    /// Scene coordinates of the preview, the interactive layer's default.
    #[default]
    Preview,
    Original,
}

/// Watermark and placement settings, one flat mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkSettings {
    #[serde(rename = "type")]
    pub kind: WatermarkKind,
    pub opacity: f32,
    pub rotation_deg: f32,
    /// Nine-grid anchor name; unknown names fall back to center.
    pub position_preset: Option<String>,
    pub manual_pos_px: Option<(f64, f64)>,
    pub manual_pos_space: CoordinateSpace,
    pub margin: (u32, u32),

    pub text: String,
    #[serde(alias = "font_path")]
    pub font_family: Option<String>,
    pub font_size: u32,
    pub font_bold: bool,
    pub font_italic: bool,
    pub color_rgba: Rgba8,
    pub stroke_width: u32,
    pub stroke_rgba: Option<Rgba8>,
    pub shadow_offset: (i32, i32),
    pub shadow_rgba: Option<Rgba8>,

    pub wm_image_path: Option<PathBuf>,
    pub wm_scale: f32,
}

impl Default for WatermarkSettings {
    fn default() -> Self {
        let text = TextWatermark::default();
        Self {
            kind: WatermarkKind::Text,
            opacity: 1.0,
            rotation_deg: 0.0,
            position_preset: Some(PositionPreset::Center.name().to_string()),
            manual_pos_px: None,
            manual_pos_space: CoordinateSpace::Preview,
            margin: (Margin::default().x, Margin::default().y),
            text: text.content,
            font_family: None,
            font_size: text.font_size,
            font_bold: false,
            font_italic: false,
            color_rgba: text.color,
            stroke_width: 0,
            stroke_rgba: None,
            shadow_offset: (0, 0),
            shadow_rgba: None,
            wm_image_path: None,
            wm_scale: 1.0,
        }
    }
}

impl WatermarkSettings {
    /// Build the watermark spec.
    ///
    /// # Errors
    ///
    /// Returns `WatermarkError::Settings` for an image watermark without
    /// `wm_image_path`.
    pub fn to_watermark_spec(&self) -> Result<WatermarkSpec> {
        match self.kind {
            WatermarkKind::Text => Ok(WatermarkSpec::Text(TextWatermark {
                content: self.text.clone(),
                font_family: self.font_family.clone().filter(|f| !f.trim().is_empty()),
                font_size: self.font_size,
                bold: self.font_bold,
                italic: self.font_italic,
                color: self.color_rgba,
                stroke_width: self.stroke_width,
                stroke_color: self.stroke_rgba,
                shadow_offset: self.shadow_offset,
                shadow_color: self.shadow_rgba,
            })),
            WatermarkKind::Image => {
                let path = self
                    .wm_image_path
                    .clone()
                    .filter(|p| !p.as_os_str().is_empty())
                    .ok_or_else(|| WatermarkError::settings("image watermark needs wm_image_path"))?;
                Ok(WatermarkSpec::Image(ImageWatermark::new(path, self.wm_scale)))
            }
        }
    }

    /// Build the placement spec.
    ///
    /// `preview_scale` is the scale of the preview `manual_pos_px` was
    /// recorded on. Without it a preview-space position is taken as is.
    pub fn to_placement_spec(&self, preview_scale: Option<PreviewScale>) -> PlacementSpec {
        let manual_offset = self
            .manual_pos_px
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .map(|(x, y)| match (self.manual_pos_space, preview_scale) {
                (CoordinateSpace::Preview, Some(scale)) => ManualOffset::preview(x, y, scale),
                _ => ManualOffset::original(x as i64, y as i64),
            });

        PlacementSpec {
            opacity: self.opacity,
            rotation_degrees: self.rotation_deg,
            position_preset: self.position_preset.as_deref().map(PositionPreset::from_name),
            manual_offset,
            margin: Margin::new(self.margin.0, self.margin.1),
        }
    }
}

/// How output files are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameRule {
    #[default]
    Keep,
    Prefix,
    Suffix,
}

/// Export settings, one flat mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub format: ExportFormat,
    /// JPEG quality, clamped to `0..=100`.
    pub quality: Option<i64>,
    pub resize: ResizeSpec,
    pub name_rule: NameRule,
    pub prefix: String,
    pub suffix: String,
    pub out_dir: Option<PathBuf>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            quality: None,
            resize: ResizeSpec::default(),
            name_rule: NameRule::Keep,
            prefix: String::new(),
            suffix: String::new(),
            out_dir: None,
        }
    }
}

impl ExportSettings {
    /// The resize request, `None` when no axis or percent is set.
    pub fn resize_spec(&self) -> Option<ResizeSpec> {
        (!self.resize.is_empty()).then_some(self.resize)
    }

    /// JPEG quality clamped to `0..=100`, or the default.
    pub fn jpeg_quality(&self) -> u8 {
        self.quality
            .map(|q| q.clamp(0, 100) as u8)
            .unwrap_or(DEFAULT_JPEG_QUALITY)
    }

    /// Build the export spec.
    ///
    /// # Errors
    ///
    /// Returns `WatermarkError::OutputDirectory` when no output directory is
    /// set.
    pub fn to_export_spec(&self) -> Result<ExportSpec> {
        let output_directory = self
            .out_dir
            .clone()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| WatermarkError::output_directory("", "no output directory selected"))?;

        let naming = match self.name_rule {
            NameRule::Keep => NamingRule::Keep,
            NameRule::Prefix => NamingRule::Prefix(self.prefix.trim().to_string()),
            NameRule::Suffix => NamingRule::Suffix(self.suffix.trim().to_string()),
        };

        Ok(ExportSpec {
            format: self.format,
            jpeg_quality: self.jpeg_quality(),
            resize: self.resize_spec(),
            naming,
            output_directory,
        })
    }
}
