//! Photomark WASM - WebAssembly bindings for Photomark
//!
//! Exposes decoding, live watermark preview, export composition and encoding
//! from `photomark-core` to JavaScript/TypeScript.
//!
//! # Module Structure
//!
//! - `types` - WASM-compatible wrapper types for image data and previews
//! - `decode` - Image decoding and EXIF date lookup
//! - `preview` - Font registration, preview rendering and export composition
//! - `encode` - PNG/JPEG encoding of composed images
//!
//! # Usage
//!
//! ```typescript
//! import init, { decode_image, render_preview } from '@photomark/wasm';
//!
//! await init();
//!
//! const base = decode_image(new Uint8Array(await file.arrayBuffer()));
//! const preview = render_preview(base, { text: 'Sample' }, 800, 600);
//! ```

use wasm_bindgen::prelude::*;

mod decode;
mod encode;
mod preview;
mod types;

pub use decode::{decode_image, exif_date};
pub use encode::{encode_image, encode_jpeg};
pub use preview::{export_image, font_count, preview_scale, register_font, render_preview};
pub use types::{JsImage, JsPreview};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
