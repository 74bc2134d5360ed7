//! JSON job files for `photomark export`.
//!
//! ```json
//! {
//!   "watermark": { "type": "text", "text": "© 2024", "position_preset": "bottom_right" },
//!   "export": { "format": "jpeg", "quality": 90, "out_dir": "out" },
//!   "logging": { "level": "info", "json": false }
//! }
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use photomark_core::{ExportFormat, ExportSettings, PreviewScale, WatermarkSettings};
use serde::{Deserialize, Serialize};

use crate::logging::LoggingConfig;

/// A saved watermark template plus export options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobFile {
    pub watermark: WatermarkSettings,
    pub export: ExportSettings,
    pub logging: LoggingConfig,
    /// Scale of the preview a preview-space `manual_pos_px` was recorded on.
    pub preview_scale: Option<f64>,
}

impl JobFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read job file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid job file {}", path.display()))
    }

    /// Command-line flags win over the job file.
    pub fn apply_overrides(&mut self, out_dir: Option<PathBuf>, format: Option<ExportFormat>) {
        if let Some(out_dir) = out_dir {
            self.export.out_dir = Some(out_dir);
        }
        if let Some(format) = format {
            self.export.format = format;
        }
    }

    pub fn preview_scale(&self) -> Option<PreviewScale> {
        self.preview_scale.map(PreviewScale::new)
    }
}
