//! Immutable per-call descriptions of a watermark, its placement and its export.
//!
//! These values are built by the caller for each preview refresh or export
//! job and are never mutated by the engine.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geometry::{Margin, OriginalPoint, PositionPreset, PreviewPoint, PreviewScale};

/// Font family used when a text watermark names none.
pub const DEFAULT_FONT_FAMILY: &str = "Helvetica";

/// Placeholder drawn for empty or whitespace-only text.
pub const PLACEHOLDER_TEXT: &str = "Sample";

/// Default JPEG quality for export.
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Smallest accepted image watermark scale.
pub const MIN_SCALE_FACTOR: f32 = 0.01;

/// Straight-alpha RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rgba8(pub [u8; 4]);

impl Rgba8 {
    pub const WHITE: Rgba8 = Rgba8([255, 255, 255, 255]);
    pub const BLACK: Rgba8 = Rgba8([0, 0, 0, 255]);
    pub const TRANSPARENT: Rgba8 = Rgba8([0, 0, 0, 0]);

    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }

    pub fn alpha(self) -> u8 {
        self.0[3]
    }

    pub fn with_alpha(self, a: u8) -> Self {
        let [r, g, b, _] = self.0;
        Self([r, g, b, a])
    }

    /// Parse `#RGB`, `#RRGGBB`, `#RRGGBBAA` or a basic color name.
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }
        let named = match s.to_ascii_lowercase().as_str() {
            "white" => Rgba8::WHITE,
            "black" => Rgba8::BLACK,
            "red" => Rgba8::new(255, 0, 0, 255),
            "green" => Rgba8::new(0, 128, 0, 255),
            "blue" => Rgba8::new(0, 0, 255, 255),
            "yellow" => Rgba8::new(255, 255, 0, 255),
            "gray" | "grey" => Rgba8::new(128, 128, 128, 255),
            "transparent" => Rgba8::TRANSPARENT,
            _ => return None,
        };
        Some(named)
    }
}

fn parse_hex(hex: &str) -> Option<Rgba8> {
    // `from_str_radix` alone would accept a leading sign
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        3 => {
            let nibble = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok();
            Some(Rgba8::new(nibble(0)? * 17, nibble(1)? * 17, nibble(2)? * 17, 255))
        }
        6 => Some(Rgba8::new(byte(0)?, byte(2)?, byte(4)?, 255)),
        8 => Some(Rgba8::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

impl Default for Rgba8 {
    fn default() -> Self {
        Rgba8::WHITE
    }
}

impl From<[u8; 4]> for Rgba8 {
    fn from(value: [u8; 4]) -> Self {
        Self(value)
    }
}

// ============================================================================
// Watermark content
// ============================================================================

/// What to draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WatermarkSpec {
    Text(TextWatermark),
    Image(ImageWatermark),
}

/// A text watermark with optional stroke and drop shadow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextWatermark {
    pub content: String,
    /// Family name, or a path to a font file. `None` uses [`DEFAULT_FONT_FAMILY`].
    pub font_family: Option<String>,
    /// Pixel size, clamped to 8..=500 when rendered.
    pub font_size: u32,
    pub bold: bool,
    pub italic: bool,
    pub color: Rgba8,
    /// Stroke width in pixels, clamped to 0..=20 when rendered.
    pub stroke_width: u32,
    pub stroke_color: Option<Rgba8>,
    pub shadow_offset: (i32, i32),
    pub shadow_color: Option<Rgba8>,
}

impl TextWatermark {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn family(&self) -> &str {
        self.font_family
            .as_deref()
            .filter(|f| !f.trim().is_empty())
            .unwrap_or(DEFAULT_FONT_FAMILY)
    }
}

impl Default for TextWatermark {
    fn default() -> Self {
        Self {
            content: String::new(),
            font_family: None,
            font_size: 32,
            bold: false,
            italic: false,
            color: Rgba8::WHITE,
            stroke_width: 0,
            stroke_color: None,
            shadow_offset: (0, 0),
            shadow_color: None,
        }
    }
}

/// An image file used as a watermark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageWatermark {
    pub source_path: PathBuf,
    /// Relative size of the watermark, clamped to at least 0.01.
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f32,
}

fn default_scale_factor() -> f32 {
    1.0
}

impl ImageWatermark {
    pub fn new(source_path: impl Into<PathBuf>, scale_factor: f32) -> Self {
        Self {
            source_path: source_path.into(),
            scale_factor,
        }
    }
}

pub(crate) fn clamp_scale(scale: f32) -> f32 {
    if scale.is_finite() {
        scale.max(MIN_SCALE_FACTOR)
    } else {
        1.0
    }
}

// ============================================================================
// Placement
// ============================================================================

/// A manual watermark position, tagged with the pixel space it was recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "space", rename_all = "snake_case")]
pub enum ManualOffset {
    /// Already in full-resolution pixels.
    Original(OriginalPoint),
    /// Recorded on a preview shown at `scale`.
    Preview {
        point: PreviewPoint,
        scale: PreviewScale,
    },
}

impl ManualOffset {
    pub fn original(x: i64, y: i64) -> Self {
        ManualOffset::Original(OriginalPoint::new(x, y))
    }

    pub fn preview(x: f64, y: f64, scale: PreviewScale) -> Self {
        ManualOffset::Preview {
            point: PreviewPoint::new(x, y),
            scale,
        }
    }

    /// The offset in full-resolution pixels.
    pub fn to_original(self) -> OriginalPoint {
        match self {
            ManualOffset::Original(point) => point,
            ManualOffset::Preview { point, scale } => point.to_original(scale),
        }
    }

    /// The offset on a preview shown at `scale`.
    pub fn to_preview(self, scale: PreviewScale) -> PreviewPoint {
        match self {
            ManualOffset::Preview { point, scale: recorded } if recorded == scale => point,
            other => other.to_original().to_preview(scale),
        }
    }
}

/// Where and how strongly a watermark is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementSpec {
    /// Global opacity in `[0, 1]`.
    pub opacity: f32,
    /// Counter-clockwise rotation in degrees.
    pub rotation_degrees: f32,
    pub position_preset: Option<PositionPreset>,
    /// Overrides `position_preset` when present.
    pub manual_offset: Option<ManualOffset>,
    pub margin: Margin,
}

impl PlacementSpec {
    pub fn at_preset(preset: PositionPreset) -> Self {
        Self {
            position_preset: Some(preset),
            ..Default::default()
        }
    }

    pub fn clamped_opacity(&self) -> f32 {
        if self.opacity.is_finite() {
            self.opacity.clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    /// Preset used when no manual offset is set.
    pub fn effective_preset(&self) -> Option<PositionPreset> {
        if self.manual_offset.is_some() {
            None
        } else {
            Some(self.position_preset.unwrap_or_default())
        }
    }
}

impl Default for PlacementSpec {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            rotation_degrees: 0.0,
            position_preset: Some(PositionPreset::Center),
            manual_offset: None,
            margin: Margin::default(),
        }
    }
}

// ============================================================================
// Export
// ============================================================================

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExportFormat {
    #[default]
    #[serde(alias = "png")]
    Png,
    #[serde(alias = "JPG", alias = "jpeg", alias = "jpg")]
    Jpeg,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpeg" | "jpg" => Ok(ExportFormat::Jpeg),
            other => Err(format!("unsupported export format: {other} (use png or jpeg)")),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Png => f.write_str("PNG"),
            ExportFormat::Jpeg => f.write_str("JPEG"),
        }
    }
}

/// Resize applied to the composed image.
///
/// `percent` wins when present. With only one of `width`/`height` the other
/// axis follows the aspect ratio. Zero values count as unset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeSpec {
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Scale factor, `0.5` halves both axes.
    pub percent: Option<f32>,
}

impl ResizeSpec {
    pub fn percent(percent: f32) -> Self {
        Self {
            percent: Some(percent),
            ..Default::default()
        }
    }

    pub fn dimensions(width: Option<u32>, height: Option<u32>) -> Self {
        Self {
            width,
            height,
            percent: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.effective_percent().is_none()
            && self.effective_width().is_none()
            && self.effective_height().is_none()
    }

    pub(crate) fn effective_percent(&self) -> Option<f32> {
        self.percent
            .filter(|p| p.is_finite() && *p > 0.0)
            .map(clamp_scale)
    }

    pub(crate) fn effective_width(&self) -> Option<u32> {
        self.width.filter(|w| *w > 0)
    }

    pub(crate) fn effective_height(&self) -> Option<u32> {
        self.height.filter(|h| *h > 0)
    }
}

/// How exported files are named from their source file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "rule", content = "value", rename_all = "snake_case")]
pub enum NamingRule {
    /// Keep the source stem.
    #[default]
    Keep,
    Prefix(String),
    Suffix(String),
}

impl NamingRule {
    /// Output file name for `source`, with the extension of `format`.
    ///
    /// An empty prefix or suffix behaves like [`NamingRule::Keep`].
    pub fn output_file_name(&self, source: &Path, format: ExportFormat) -> String {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        let name = match self {
            NamingRule::Prefix(prefix) if !prefix.is_empty() => format!("{prefix}{stem}"),
            NamingRule::Suffix(suffix) if !suffix.is_empty() => format!("{stem}{suffix}"),
            _ => stem,
        };
        format!("{name}.{}", format.extension())
    }
}

/// Output settings of an export job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSpec {
    pub format: ExportFormat,
    /// JPEG quality 0..=100, ignored for PNG.
    #[serde(default = "default_quality")]
    pub jpeg_quality: u8,
    #[serde(default)]
    pub resize: Option<ResizeSpec>,
    #[serde(default)]
    pub naming: NamingRule,
    /// Must differ from every source image's directory.
    pub output_directory: PathBuf,
}

fn default_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

impl ExportSpec {
    pub fn new(format: ExportFormat, output_directory: impl Into<PathBuf>) -> Self {
        Self {
            format,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            resize: None,
            naming: NamingRule::Keep,
            output_directory: output_directory.into(),
        }
    }

    pub fn quality(&self) -> u8 {
        self.jpeg_quality.min(100)
    }

    /// Full output path for `source`.
    pub fn output_path(&self, source: &Path) -> PathBuf {
        self.output_directory
            .join(self.naming.output_file_name(source, self.format))
    }
}
