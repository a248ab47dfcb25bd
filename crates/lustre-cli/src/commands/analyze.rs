//! Descriptor analysis command.

use super::common::{load_audio, spinner};
use anyhow::Context;
use clap::Args;
use lustre_analysis::{AnalysisReport, Analyzer};
use std::path::PathBuf;

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Input audio file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Print the flat JSON report instead of a summary
    #[arg(long)]
    json: bool,

    /// Also write the JSON report to this file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// STFT window size
    #[arg(long, default_value = "2048")]
    window: usize,

    /// STFT hop size
    #[arg(long, default_value = "512")]
    hop: usize,

    /// Resample before analysis
    #[arg(long, value_name = "HZ")]
    sample_rate: Option<u32>,
}

pub fn run(args: AnalyzeArgs) -> anyhow::Result<()> {
    let analyzer = Analyzer::new(args.window, args.hop)?;
    let buffer = load_audio(&args.input, args.sample_rate)?;

    let pb = spinner("analyzing")?;
    let report = analyzer.analyze(&buffer)?;
    pb.finish_and_clear();

    if args.json {
        println!("{}", report.to_json()?);
    } else {
        print_summary(&report);
    }

    if let Some(path) = &args.output {
        report
            .export_json(path)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Report written to {}", path.display());
    }
    Ok(())
}

fn print_summary(report: &AnalysisReport) {
    let flat = report.to_flat();

    println!("\nSpectral:");
    println!(
        "  Centroid:     {:8.1} Hz (std {:.1})",
        flat.spectral_centroid_mean, flat.spectral_centroid_std
    );
    println!("  Rolloff:      {:8.1} Hz", flat.spectral_rolloff_mean);
    println!("  Bandwidth:    {:8.1} Hz", flat.spectral_bandwidth_mean);
    println!("  ZCR:          {:8.4}", flat.zero_crossing_rate_mean);

    println!("\nRhythm:");
    if flat.beat_count == 0 {
        println!("  Tempo:        none detected");
    } else {
        println!("  Tempo:        {:8.1} BPM ({} beats)", flat.tempo_bpm, flat.beat_count);
    }

    println!("\nKey:");
    match report.tonal.key {
        Some(key) => println!("  {key} (confidence {:.2})", flat.key_confidence),
        None => println!("  none"),
    }

    println!("\nLoudness:");
    println!("  RMS:          {:8.1} dBFS", flat.rms_db);
    println!("  Peak:         {:8.1} dBFS", flat.peak_db);
    println!("  Crest factor: {:8.1} dB", flat.crest_factor_db);
    println!("  Dynamic range:{:8.1} dB", flat.dynamic_range_db);
}
