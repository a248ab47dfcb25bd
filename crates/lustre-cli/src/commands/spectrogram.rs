//! Spectrogram export command.

use super::common::load_audio;
use anyhow::Context;
use clap::{Args, ValueEnum};
use lustre_analysis::{DEFAULT_DB_RANGE, Spectrogram};
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ImageFormat {
    /// Grayscale PGM image, dB scaled
    Pgm,
    /// Frame-per-row CSV
    Csv,
}

#[derive(Args)]
pub struct SpectrogramArgs {
    /// Input audio file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Output format (defaults to the output extension, else PGM)
    #[arg(long, value_enum)]
    format: Option<ImageFormat>,

    /// FFT size
    #[arg(long, default_value = "2048")]
    fft_size: usize,

    /// Hop size
    #[arg(long, default_value = "512")]
    hop: usize,

    /// Dynamic range shown in the image, dB
    #[arg(long, default_value_t = DEFAULT_DB_RANGE)]
    db_range: f32,

    /// Write linear magnitudes to CSV instead of dB
    #[arg(long)]
    linear: bool,
}

fn format_for(path: &Path) -> ImageFormat {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => ImageFormat::Csv,
        _ => ImageFormat::Pgm,
    }
}

pub fn run(args: SpectrogramArgs) -> anyhow::Result<()> {
    let buffer = load_audio(&args.input, None)?;
    let spec = Spectrogram::compute(&buffer, args.fft_size, args.hop)?;

    let written = match args.format.unwrap_or_else(|| format_for(&args.output)) {
        ImageFormat::Pgm => spec.export_pgm(&args.output, args.db_range),
        ImageFormat::Csv => spec.export_csv(&args.output, !args.linear),
    };
    written.with_context(|| format!("writing {}", args.output.display()))?;

    println!(
        "Spectrogram: {} frames x {} bins -> {}",
        spec.num_frames(),
        spec.num_bins(),
        args.output.display()
    );
    Ok(())
}
