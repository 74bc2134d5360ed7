//! Photomark CLI - batch watermarking from the command line.
//!
//! Usage:
//!   photomark export <INPUTS>... --job <FILE>   Watermark and export images
//!   photomark date-stamp <PATH>                 Stamp EXIF capture dates

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use photomark_core::{ExportFormat, PositionPreset, Rgba8};

mod commands;
mod job;
mod logging;

use commands::date_stamp::DateStampOptions;
use job::JobFile;
use logging::{init_logging, LoggingConfig};

#[derive(Parser)]
#[command(
    name = "photomark",
    about = "Text and image watermarks for photos",
    version
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a saved watermark to images and export them
    Export {
        /// Image files or directories of images
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// JSON job file with `watermark`, `export` and `logging` sections
        #[arg(short, long)]
        job: PathBuf,

        /// Output directory (overrides the job file)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Output format: png or jpeg (overrides the job file)
        #[arg(long)]
        format: Option<ExportFormat>,
    },

    /// Stamp each image's EXIF capture date (YYYY-MM-DD) onto it
    DateStamp {
        /// An image file (its whole directory is processed) or a directory
        path: PathBuf,

        /// Font size of the date text
        #[arg(long, default_value = "36")]
        font_size: u32,

        /// Text color as #RRGGBB or #RRGGBBAA
        #[arg(long, default_value = "#FFFFFFCC", value_parser = parse_color)]
        color: Rgba8,

        /// Anchor, e.g. bottom-right, top-left, center
        #[arg(long, default_value = "bottom-right")]
        position: PositionPreset,

        /// Distance from the image edges in pixels
        #[arg(long, default_value = "24")]
        margin: u32,

        /// Path to a .ttf/.otf font file
        #[arg(long)]
        font: Option<PathBuf>,
    },
}

fn parse_color(value: &str) -> Result<Rgba8, String> {
    Rgba8::parse(value).ok_or_else(|| format!("invalid color {value:?}, expected #RRGGBB, #RRGGBBAA or a color name"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            inputs,
            job,
            out,
            format,
        } => {
            let job = JobFile::load(&job)?;
            init_logging(&job.logging.clone().with_verbose(cli.verbose));
            commands::export::run(inputs, job, out, format)
        }
        Commands::DateStamp {
            path,
            font_size,
            color,
            position,
            margin,
            font,
        } => {
            init_logging(&LoggingConfig::default().with_verbose(cli.verbose));
            commands::date_stamp::run(
                path,
                DateStampOptions {
                    font_size,
                    color,
                    position,
                    margin,
                    font,
                },
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_date_stamp_defaults() {
        let cli = Cli::parse_from(["photomark", "date-stamp", "photos"]);
        match cli.command {
            Commands::DateStamp {
                font_size,
                color,
                position,
                margin,
                font,
                ..
            } => {
                assert_eq!(font_size, 36);
                assert_eq!(color, Rgba8::new(255, 255, 255, 0xCC));
                assert_eq!(position, PositionPreset::BottomRight);
                assert_eq!(margin, 24);
                assert!(font.is_none());
            }
            Commands::Export { .. } => panic!("expected date-stamp"),
        }
    }

    #[test]
    fn test_export_flags() {
        let cli = Cli::parse_from([
            "photomark", "-v", "export", "a.jpg", "dir", "--job", "job.json", "--format", "JPG",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Export {
                inputs,
                format,
                out,
                ..
            } => {
                assert_eq!(inputs.len(), 2);
                assert_eq!(format, Some(ExportFormat::Jpeg));
                assert!(out.is_none());
            }
            Commands::DateStamp { .. } => panic!("expected export"),
        }
    }

    #[test]
    fn test_bad_color_is_rejected() {
        assert!(Cli::try_parse_from(["photomark", "date-stamp", ".", "--color", "#12"]).is_err());
    }
}
