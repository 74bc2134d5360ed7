//! Layout math: sizes, margins, coordinate spaces and overlay placement.
//!
//! # Coordinate Spaces
//!
//! Two pixel spaces exist and are kept apart by type:
//! - **original**: full-resolution pixels of the base image ([`OriginalPoint`])
//! - **preview**: the scaled-down display of the interactive layer ([`PreviewPoint`])
//!
//! Converting between them always goes through a [`PreviewScale`].
//! Origin is the top-left corner in both spaces.

mod coords;
mod position;

pub use coords::{OriginalPoint, PreviewPoint, PreviewScale, MIN_VIEWPORT_EDGE};
pub use position::{clamp_manual_offset, resolve_position, PositionPreset};

use serde::{Deserialize, Serialize};

/// Width and height of an image or overlay in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Dimensions of an image-crate image.
    pub fn of<I: image::GenericImageView>(image: &I) -> Self {
        let (width, height) = image.dimensions();
        Self { width, height }
    }
}

/// Distance kept between an overlay and the base image edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Margin {
    pub x: u32,
    pub y: u32,
}

impl Margin {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Margin expressed in preview pixels.
    pub fn scaled(self, scale: PreviewScale) -> Self {
        Self {
            x: (self.x as f64 * scale.factor()) as u32,
            y: (self.y as f64 * scale.factor()) as u32,
        }
    }
}

impl Default for Margin {
    fn default() -> Self {
        Self { x: 10, y: 10 }
    }
}
