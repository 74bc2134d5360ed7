//! Batch export driven by a job file.

use std::path::PathBuf;

use photomark_core::{collect_images, BatchExporter, ExportFormat, SystemFontProvider};

use crate::job::JobFile;

/// Expand directories into the images they contain; files are kept as given.
pub(crate) fn expand_inputs(inputs: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut sources = Vec::new();
    for input in inputs {
        if input.is_dir() {
            sources.extend(collect_images(input)?);
        } else {
            sources.push(input.clone());
        }
    }
    Ok(sources)
}

pub fn run(
    inputs: Vec<PathBuf>,
    mut job: JobFile,
    out: Option<PathBuf>,
    format: Option<ExportFormat>,
) -> anyhow::Result<()> {
    job.apply_overrides(out, format);

    let sources = expand_inputs(&inputs)?;
    if sources.is_empty() {
        anyhow::bail!("No images found in the given inputs");
    }

    let watermark = job.watermark.to_watermark_spec()?;
    let placement = job.watermark.to_placement_spec(job.preview_scale());
    let export = job.export.to_export_spec()?;

    let fonts = SystemFontProvider::new();
    let exporter = BatchExporter::new(&watermark, placement, export, &fonts);

    println!(
        "Exporting {} image(s) to {} as {}",
        sources.len(),
        exporter.export_spec().output_directory.display(),
        exporter.export_spec().format
    );

    let report = exporter.run(&sources)?;
    for (source, error) in &report.failed {
        println!("  [error] {}: {error}", source.display());
    }
    println!("Exported {}/{}", report.success_count(), report.total());

    Ok(())
}
