//! Overlay placement on a base image.
//!
//! A watermark is placed either by one of nine named anchors or by an
//! explicit pixel offset. Explicit offsets are clamped into the margin band
//! so the overlay never runs off the image, even when it was dragged out of
//! bounds or resized after the drag.
//!
//! # Example
//!
//! ```ignore
//! use photomark_core::geometry::{resolve_position, Margin, PositionPreset, Size};
//!
//! let pos = resolve_position(
//!     Size::new(800, 600),
//!     Size::new(100, 50),
//!     Some(PositionPreset::BottomRight),
//!     None,
//!     Margin::new(10, 10),
//! );
//! assert_eq!((pos.x, pos.y), (690, 540));
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Margin, OriginalPoint, Size};

/// Nine-grid anchor for coarse overlay placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionPreset {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    #[default]
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

/// Placement of the overlay along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    Start,
    Middle,
    End,
}

impl PositionPreset {
    pub const ALL: [PositionPreset; 9] = [
        PositionPreset::TopLeft,
        PositionPreset::TopCenter,
        PositionPreset::TopRight,
        PositionPreset::CenterLeft,
        PositionPreset::Center,
        PositionPreset::CenterRight,
        PositionPreset::BottomLeft,
        PositionPreset::BottomCenter,
        PositionPreset::BottomRight,
    ];

    /// Look up a preset by name, falling back to `Center` for unknown names.
    pub fn from_name(name: &str) -> Self {
        name.parse().unwrap_or_default()
    }

    pub fn name(self) -> &'static str {
        match self {
            PositionPreset::TopLeft => "top_left",
            PositionPreset::TopCenter => "top_center",
            PositionPreset::TopRight => "top_right",
            PositionPreset::CenterLeft => "center_left",
            PositionPreset::Center => "center",
            PositionPreset::CenterRight => "center_right",
            PositionPreset::BottomLeft => "bottom_left",
            PositionPreset::BottomCenter => "bottom_center",
            PositionPreset::BottomRight => "bottom_right",
        }
    }

    /// (horizontal, vertical) anchors.
    fn anchors(self) -> (Anchor, Anchor) {
        use Anchor::*;
        match self {
            PositionPreset::TopLeft => (Start, Start),
            PositionPreset::TopCenter => (Middle, Start),
            PositionPreset::TopRight => (End, Start),
            PositionPreset::CenterLeft => (Start, Middle),
            PositionPreset::Center => (Middle, Middle),
            PositionPreset::CenterRight => (End, Middle),
            PositionPreset::BottomLeft => (Start, End),
            PositionPreset::BottomCenter => (Middle, End),
            PositionPreset::BottomRight => (End, End),
        }
    }
}

impl FromStr for PositionPreset {
    type Err = String;

    /// Accepts `top_left` and `top-left` spellings, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "top_left" => Ok(PositionPreset::TopLeft),
            "top_center" => Ok(PositionPreset::TopCenter),
            "top_right" => Ok(PositionPreset::TopRight),
            "center_left" => Ok(PositionPreset::CenterLeft),
            "center" | "centre" | "middle" => Ok(PositionPreset::Center),
            "center_right" => Ok(PositionPreset::CenterRight),
            "bottom_left" => Ok(PositionPreset::BottomLeft),
            "bottom_center" => Ok(PositionPreset::BottomCenter),
            "bottom_right" => Ok(PositionPreset::BottomRight),
            _ => Err(format!("unknown position preset: {s}")),
        }
    }
}

impl fmt::Display for PositionPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolve the top-left corner of an overlay on a base image.
///
/// # Arguments
///
/// * `base` - Base image size
/// * `overlay` - Overlay (watermark) size, after rotation
/// * `preset` - Nine-grid anchor; `None` means `Center`
/// * `manual` - Explicit offset; overrides `preset` when present
/// * `margin` - Edge margin
///
/// # Returns
///
/// Position in the same pixel space as `base`. Preset positions may be
/// negative when the overlay is larger than the base.
pub fn resolve_position(
    base: Size,
    overlay: Size,
    preset: Option<PositionPreset>,
    manual: Option<OriginalPoint>,
    margin: Margin,
) -> OriginalPoint {
    if let Some(offset) = manual {
        return clamp_manual_offset(base, overlay, offset, margin);
    }

    let (h, v) = preset.unwrap_or_default().anchors();
    OriginalPoint {
        x: anchor_offset(h, base.width, overlay.width, margin.x),
        y: anchor_offset(v, base.height, overlay.height, margin.y),
    }
}

/// Clamp an explicit offset into `[margin, max(0, base - overlay - margin)]` per axis.
///
/// When the band is empty (overlay wider than base minus margins) the
/// offset collapses onto the margin.
pub fn clamp_manual_offset(
    base: Size,
    overlay: Size,
    offset: OriginalPoint,
    margin: Margin,
) -> OriginalPoint {
    OriginalPoint {
        x: clamp_axis(offset.x, base.width, overlay.width, margin.x),
        y: clamp_axis(offset.y, base.height, overlay.height, margin.y),
    }
}

fn clamp_axis(value: i64, base: u32, overlay: u32, margin: u32) -> i64 {
    let lo = margin as i64;
    let hi = (base as i64 - overlay as i64 - margin as i64).max(0);
    value.min(hi).max(lo)
}

fn anchor_offset(anchor: Anchor, base: u32, overlay: u32, margin: u32) -> i64 {
    let (base, overlay, margin) = (base as i64, overlay as i64, margin as i64);
    match anchor {
        Anchor::Start => margin,
        // Integer division truncates toward zero
        Anchor::Middle => (base - overlay) / 2,
        Anchor::End => base - overlay - margin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: Size = Size {
        width: 1000,
        height: 800,
    };

    fn resolve(preset: PositionPreset, overlay: Size) -> OriginalPoint {
        resolve_position(BASE, overlay, Some(preset), None, Margin::new(10, 10))
    }

    #[test]
    fn test_bottom_right_scenario() {
        let overlay = Size::new(120, 40);
        let pos = resolve(PositionPreset::BottomRight, overlay);
        assert_eq!(pos.x, 1000 - 120 - 10);
        assert_eq!(pos.y, 800 - 40 - 10);
    }

    #[test]
    fn test_all_presets() {
        let overlay = Size::new(100, 50);
        let expected = [
            (PositionPreset::TopLeft, (10, 10)),
            (PositionPreset::TopCenter, (450, 10)),
            (PositionPreset::TopRight, (890, 10)),
            (PositionPreset::CenterLeft, (10, 375)),
            (PositionPreset::Center, (450, 375)),
            (PositionPreset::CenterRight, (890, 375)),
            (PositionPreset::BottomLeft, (10, 740)),
            (PositionPreset::BottomCenter, (450, 740)),
            (PositionPreset::BottomRight, (890, 740)),
        ];
        for (preset, (x, y)) in expected {
            assert_eq!(resolve(preset, overlay), OriginalPoint::new(x, y), "{preset}");
        }
    }

    #[test]
    fn test_no_preset_defaults_to_center() {
        let pos = resolve_position(BASE, Size::new(100, 50), None, None, Margin::default());
        assert_eq!(pos, OriginalPoint::new(450, 375));
    }

    #[test]
    fn test_manual_overrides_preset() {
        let pos = resolve_position(
            BASE,
            Size::new(100, 50),
            Some(PositionPreset::BottomRight),
            Some(OriginalPoint::new(200, 300)),
            Margin::default(),
        );
        assert_eq!(pos, OriginalPoint::new(200, 300));
    }

    #[test]
    fn test_manual_clamped_into_margin_band() {
        let overlay = Size::new(100, 50);
        let margin = Margin::new(10, 20);

        let pos = clamp_manual_offset(BASE, overlay, OriginalPoint::new(-50, -50), margin);
        assert_eq!(pos, OriginalPoint::new(10, 20));

        let pos = clamp_manual_offset(BASE, overlay, OriginalPoint::new(5000, 5000), margin);
        assert_eq!(pos, OriginalPoint::new(890, 730));
    }

    #[test]
    fn test_manual_overlay_larger_than_base_collapses_to_margin() {
        let pos = clamp_manual_offset(
            Size::new(100, 100),
            Size::new(300, 300),
            OriginalPoint::new(40, 40),
            Margin::new(10, 10),
        );
        assert_eq!(pos, OriginalPoint::new(10, 10));
    }

    #[test]
    fn test_center_of_oversized_overlay_is_negative() {
        let pos = resolve_position(
            Size::new(100, 100),
            Size::new(201, 150),
            Some(PositionPreset::Center),
            None,
            Margin::default(),
        );
        // (100 - 201) / 2 truncates toward zero
        assert_eq!(pos, OriginalPoint::new(-50, -25));
    }

    #[test]
    fn test_preset_parsing() {
        assert_eq!(PositionPreset::from_name("bottom_right"), PositionPreset::BottomRight);
        assert_eq!(PositionPreset::from_name("Top-Left"), PositionPreset::TopLeft);
        assert_eq!(PositionPreset::from_name("middle"), PositionPreset::Center);
        assert_eq!(PositionPreset::from_name("nowhere"), PositionPreset::Center);
        assert!("nowhere".parse::<PositionPreset>().is_err());
    }

    #[test]
    fn test_preset_name_round_trips() {
        for preset in PositionPreset::ALL {
            assert_eq!(PositionPreset::from_name(preset.name()), preset);
        }
    }

    #[test]
    fn test_preset_serde_names() {
        let json = serde_json::to_string(&PositionPreset::CenterRight).unwrap();
        assert_eq!(json, "\"center_right\"");
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
