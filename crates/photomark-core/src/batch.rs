//! Sequential batch export.
//!
//! The batch driver loads the watermark asset once, then exports every
//! source image on its own: an unreadable image, an unloadable watermark
//! image or a failed write is recorded for that item and the batch moves
//! on. The only batch-wide failure is an unusable output directory,
//! detected before any file is processed.

use std::fs;
use std::path::{Path, PathBuf};

use crate::decode::{is_supported_image, load_image};
use crate::encode::encode_image;
use crate::error::{Result, WatermarkError};
use crate::export::{export_loaded, finalize_for_format, LoadedWatermark};
use crate::model::{ExportSpec, PlacementSpec, WatermarkSpec};
use crate::text::FontProvider;

/// Outcome of exporting a single source image.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Exported { source: PathBuf, output: PathBuf },
    Failed { source: PathBuf, error: String },
}

/// Summary of a batch run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// Written output files.
    pub succeeded: Vec<PathBuf>,
    /// Sources that could not be exported, with the cause.
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchReport {
    pub fn success_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    fn record(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Exported { output, .. } => self.succeeded.push(output),
            ItemOutcome::Failed { source, error } => self.failed.push((source, error)),
        }
    }
}

fn normalized(path: &Path) -> PathBuf {
    fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

fn parent_dir(source: &Path) -> &Path {
    match source.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Check that `out_dir` can receive exports of `sources`.
///
/// # Errors
///
/// Returns `WatermarkError::OutputDirectory` when `out_dir` is empty, is
/// an existing non-directory, or is the directory of any source image.
pub fn validate_output_directory(out_dir: &Path, sources: &[PathBuf]) -> Result<()> {
    if out_dir.as_os_str().is_empty() {
        return Err(WatermarkError::output_directory(out_dir, "no output directory selected"));
    }
    if out_dir.exists() && !out_dir.is_dir() {
        return Err(WatermarkError::output_directory(out_dir, "not a directory"));
    }

    let target = normalized(out_dir);
    for source in sources {
        if normalized(parent_dir(source)) == target {
            return Err(WatermarkError::output_directory(
                out_dir,
                format!(
                    "same as the directory of {}; exporting there could overwrite originals",
                    source.display()
                ),
            ));
        }
    }
    Ok(())
}

/// Supported images directly inside `dir`, sorted by path.
pub fn collect_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_supported_image(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// The watermark asset, or why it could not be loaded.
enum Asset {
    Loaded(LoadedWatermark),
    Unavailable { path: PathBuf, message: String },
}

/// Applies one watermark configuration to many images.
///
/// An image watermark that cannot be loaded does not abort the batch:
/// every item is then reported as failed with that cause.
///
/// # Example
///
/// ```ignore
/// use photomark_core::batch::BatchExporter;
/// use photomark_core::text::SystemFontProvider;
///
/// let fonts = SystemFontProvider::new();
/// let exporter = BatchExporter::new(&watermark, placement, export, &fonts);
/// let report = exporter.run(&sources)?;
/// println!("Exported {}/{}", report.success_count(), report.total());
/// ```
pub struct BatchExporter<'a> {
    watermark: Asset,
    placement: PlacementSpec,
    export: ExportSpec,
    fonts: &'a dyn FontProvider,
}

impl<'a> BatchExporter<'a> {
    /// Create an exporter, loading the watermark asset once.
    pub fn new(
        watermark: &WatermarkSpec,
        placement: PlacementSpec,
        export: ExportSpec,
        fonts: &'a dyn FontProvider,
    ) -> Self {
        let watermark = match LoadedWatermark::load(watermark) {
            Ok(loaded) => Asset::Loaded(loaded),
            Err(e) => {
                tracing::warn!(error = %e, "watermark image unavailable, every item will fail");
                match e {
                    WatermarkError::WatermarkImage { path, message } => {
                        Asset::Unavailable { path, message }
                    }
                    other => Asset::Unavailable {
                        path: PathBuf::new(),
                        message: other.to_string(),
                    },
                }
            }
        };
        Self {
            watermark,
            placement,
            export,
            fonts,
        }
    }

    pub fn export_spec(&self) -> &ExportSpec {
        &self.export
    }

    /// Export every source in order.
    ///
    /// The output directory is validated and created first; per-item
    /// failures are collected in the report.
    ///
    /// # Errors
    ///
    /// Fails before processing any file when the output directory is
    /// invalid or cannot be created.
    pub fn run(&self, sources: &[PathBuf]) -> Result<BatchReport> {
        let out_dir = &self.export.output_directory;
        validate_output_directory(out_dir, sources)?;
        fs::create_dir_all(out_dir)
            .map_err(|e| WatermarkError::output_directory(out_dir, e.to_string()))?;

        let mut report = BatchReport::default();
        for source in sources {
            let outcome = match self.export_one(source) {
                Ok(output) => {
                    tracing::info!(source = %source.display(), output = %output.display(), "exported");
                    ItemOutcome::Exported {
                        source: source.clone(),
                        output,
                    }
                }
                Err(e) => {
                    tracing::warn!(source = %source.display(), error = %e, "skipping image");
                    ItemOutcome::Failed {
                        source: source.clone(),
                        error: e.to_string(),
                    }
                }
            };
            report.record(outcome);
        }

        tracing::info!(
            succeeded = report.success_count(),
            failed = report.failed.len(),
            out_dir = %out_dir.display(),
            "batch export finished"
        );
        Ok(report)
    }

    /// Export a single source and return the written path.
    pub fn export_one(&self, source: &Path) -> Result<PathBuf> {
        let watermark = match &self.watermark {
            Asset::Loaded(watermark) => watermark,
            Asset::Unavailable { path, message } => {
                return Err(WatermarkError::WatermarkImage {
                    path: path.clone(),
                    message: message.clone(),
                })
            }
        };
        let base = load_image(source)?;
        let composed = export_loaded(&base, watermark, &self.placement, &self.export, self.fonts)?;
        let output = finalize_for_format(composed, self.export.format);
        let bytes = encode_image(&output, self.export.format, self.export.quality())?;

        let path = self.export.output_path(source);
        fs::write(&path, bytes).map_err(|e| WatermarkError::Write {
            path: path.clone(),
            message: e.to_string(),
        })?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_rejects_source_directory() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.jpg");
        let err = validate_output_directory(dir.path(), &[source]).unwrap_err();
        assert!(matches!(err, WatermarkError::OutputDirectory { .. }));
    }

    #[test]
    fn test_rejects_equivalent_spelling() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("photos")).unwrap();
        let source = dir.path().join("photos").join("a.jpg");
        let out = dir.path().join("photos").join(".");
        assert!(validate_output_directory(&out, &[source]).is_err());
    }

    #[test]
    fn test_accepts_sibling_directory() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.jpg");
        let out = dir.path().join("out");
        assert!(validate_output_directory(&out, &[source]).is_ok());
    }

    #[test]
    fn test_rejects_empty_and_file_paths() {
        assert!(validate_output_directory(Path::new(""), &[]).is_err());

        let dir = TempDir::new().unwrap();
        let file = dir.path().join("x.txt");
        fs::write(&file, b"x").unwrap();
        assert!(validate_output_directory(&file, &[]).is_err());
    }

    #[test]
    fn test_collect_images_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        for name in ["b.PNG", "a.jpg", "notes.txt", "c.tiff"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("nested.jpg")).unwrap();

        let files = collect_images(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["a.jpg", "b.PNG", "c.tiff"]);
    }

    #[test]
    fn test_report_counts() {
        let mut report = BatchReport::default();
        report.record(ItemOutcome::Exported {
            source: "a.jpg".into(),
            output: "out/a.png".into(),
        });
        report.record(ItemOutcome::Failed {
            source: "b.jpg".into(),
            error: "corrupt".into(),
        });
        assert_eq!(report.success_count(), 1);
        assert_eq!(report.total(), 2);
        assert_eq!(report.failed[0].0, PathBuf::from("b.jpg"));
    }
}
