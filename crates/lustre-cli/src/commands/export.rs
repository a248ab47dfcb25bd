//! Batch encoding command.

use super::common::{TagArgs, export_requests, load_audio, output_stem, spinner};
use anyhow::Context;
use clap::Args;
use lustre_io::{CodecGateway, QualityPreset};
use std::path::PathBuf;

#[derive(Args)]
pub struct ExportArgs {
    /// Input audio file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Formats, optionally with quality (e.g. `wav:24bit,mp3:192k,flac`)
    #[arg(short, long, required = true, value_delimiter = ',')]
    formats: Vec<String>,

    /// Quality preset for formats given without an explicit quality
    #[arg(short, long, default_value = "high")]
    quality: QualityPreset,

    /// Directory for the encoded files
    #[arg(short, long, default_value = ".", value_name = "DIR")]
    output_dir: PathBuf,

    /// Output file stem (defaults to the input's)
    #[arg(long)]
    name: Option<String>,

    /// Resample before encoding
    #[arg(long, value_name = "HZ")]
    sample_rate: Option<u32>,

    #[command(flatten)]
    tags: TagArgs,
}

pub fn run(args: ExportArgs) -> anyhow::Result<()> {
    let requests = export_requests(&args.formats, args.quality)?;
    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("creating {}", args.output_dir.display()))?;

    let buffer = load_audio(&args.input, args.sample_rate)?;
    let stem = args.name.clone().unwrap_or_else(|| output_stem(&args.input));
    let gateway = CodecGateway::new();

    let pb = spinner(&format!("encoding {} format(s)", requests.len()))?;
    let results = gateway.export_to_dir(
        &buffer,
        &requests,
        &args.tags.metadata(),
        &args.output_dir,
        &stem,
    );
    pb.finish_and_clear();

    let mut failed = 0;
    for (request, result) in &results {
        match result {
            Ok(path) => println!("  {:12} {}", request.to_string(), path.display()),
            Err(e) => {
                failed += 1;
                println!("  {:12} FAILED: {e}", request.to_string());
            }
        }
    }

    if failed == results.len() {
        anyhow::bail!("every export failed");
    }
    Ok(())
}
