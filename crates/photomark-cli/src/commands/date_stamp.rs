//! Stamp each photo's EXIF capture date onto it.
//!
//! Every image in the directory is processed; results go to a
//! `<dir>_watermark` folder inside it as `<stem>_watermark.<ext>`. Images
//! without a capture date are skipped.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use image::{DynamicImage, ImageFormat, RgbaImage};
use photomark_core::decode::{decode_image, exif_date};
use photomark_core::encode::encode_image;
use photomark_core::export::{apply_loaded, finalize_for_format, LoadedWatermark};
use photomark_core::{
    collect_images, ExportFormat, FontProvider, Margin, PlacementSpec, PositionPreset, Rgba8,
    SystemFontProvider, TextWatermark,
};

/// JPEG sources are rewritten at this quality.
const JPEG_QUALITY: u8 = 95;

#[derive(Debug, Clone)]
pub struct DateStampOptions {
    pub font_size: u32,
    pub color: Rgba8,
    pub position: PositionPreset,
    pub margin: u32,
    pub font: Option<PathBuf>,
}

impl DateStampOptions {
    /// The date text with a soft drop shadow for readability.
    fn text(&self, date: &str) -> TextWatermark {
        let offset = (self.font_size / 24).max(1) as i32;
        TextWatermark {
            content: date.to_string(),
            font_family: self.font.as_ref().map(|p| p.to_string_lossy().into_owned()),
            font_size: self.font_size,
            color: self.color,
            shadow_offset: (offset, offset),
            shadow_color: Some(Rgba8::new(0, 0, 0, self.color.alpha().min(160))),
            ..TextWatermark::default()
        }
    }

    fn placement(&self) -> PlacementSpec {
        PlacementSpec {
            margin: Margin::new(self.margin, self.margin),
            ..PlacementSpec::at_preset(self.position)
        }
    }
}

/// A directory is processed as is; a file stands for its parent directory.
fn processing_dir(path: &Path) -> anyhow::Result<PathBuf> {
    if path.is_dir() {
        Ok(path.to_path_buf())
    } else if path.is_file() {
        Ok(match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        })
    } else {
        anyhow::bail!("Path not found: {}", path.display())
    }
}

fn output_dir_for(source_dir: &Path) -> PathBuf {
    let name = source_dir
        .canonicalize()
        .ok()
        .and_then(|dir| dir.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "images".to_string());
    source_dir.join(format!("{name}_watermark"))
}

/// Composite the date onto `base`.
pub(crate) fn stamp(
    base: &DynamicImage,
    date: &str,
    options: &DateStampOptions,
    fonts: &dyn FontProvider,
) -> RgbaImage {
    let watermark = LoadedWatermark::Text(options.text(date));
    apply_loaded(base, &watermark, &options.placement(), fonts)
}

/// Stamp one file. Returns `None` when it carries no capture date.
pub(crate) fn stamp_file(
    source: &Path,
    output_dir: &Path,
    options: &DateStampOptions,
    fonts: &dyn FontProvider,
) -> anyhow::Result<Option<PathBuf>> {
    let bytes = fs::read(source).with_context(|| format!("Failed to read {}", source.display()))?;
    let Some(date) = exif_date(&bytes) else {
        return Ok(None);
    };
    let base = decode_image(&bytes)?;

    let is_jpeg = matches!(image::guess_format(&bytes), Ok(ImageFormat::Jpeg));
    let (format, extension) = if is_jpeg {
        let ext = source
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| "jpg".to_string());
        (ExportFormat::Jpeg, ext)
    } else {
        (ExportFormat::Png, "png".to_string())
    };

    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let output = output_dir.join(format!("{stem}_watermark.{extension}"));

    let stamped = finalize_for_format(
        DynamicImage::ImageRgba8(stamp(&base, &date, options, fonts)),
        format,
    );
    let encoded = encode_image(&stamped, format, JPEG_QUALITY)?;
    fs::write(&output, encoded).with_context(|| format!("Failed to write {}", output.display()))?;

    Ok(Some(output))
}

pub fn run(path: PathBuf, options: DateStampOptions) -> anyhow::Result<()> {
    let source_dir = processing_dir(&path)?;
    let output_dir = output_dir_for(&source_dir);
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let images = collect_images(&source_dir)?;
    if images.is_empty() {
        println!("No images found in: {}", source_dir.display());
        return Ok(());
    }

    let fonts = SystemFontProvider::new();
    let mut processed = 0;
    for source in &images {
        match stamp_file(source, &output_dir, &options, &fonts) {
            Ok(Some(output)) => {
                processed += 1;
                tracing::info!(source = %source.display(), output = %output.display(), "stamped");
            }
            Ok(None) => {
                tracing::warn!(source = %source.display(), "no EXIF date, skipped");
            }
            Err(e) => {
                tracing::warn!(source = %source.display(), error = %e, "failed to stamp");
            }
        }
    }

    println!(
        "Done. Processed {processed}/{} images. Output: {}",
        images.len(),
        output_dir.display()
    );
    Ok(())
}
