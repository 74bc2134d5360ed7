//! Geometric transforms: watermark rotation and output resizing.
//!
//! # Coordinate System
//!
//! - Rotation angles are in degrees, positive = counter-clockwise
//! - Origin is top-left corner

mod resize;
mod rotation;

pub use resize::{resize, resize_image, resize_target, MAX_OUTPUT_DIMENSION};
pub use rotation::{compute_rotated_bounds, rotate_watermark, InterpolationFilter};
