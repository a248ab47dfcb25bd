//! The full enhancement pipeline for one file.

use super::common::{ChainArgs, TagArgs, export_requests, load_audio, output_stem};
use anyhow::Context;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use lustre_analysis::{Analyzer, DEFAULT_DB_RANGE, Spectrogram};
use lustre_config::EffectChain;
use lustre_core::linear_to_db;
use lustre_io::{CodecGateway, OutputFormat, QualityOptions, QualityPreset};
use std::path::PathBuf;

#[derive(Args)]
pub struct ProcessArgs {
    /// Input audio file (WAV, MP3, FLAC, OGG, M4A)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Directory for all outputs
    #[arg(short, long, default_value = ".", value_name = "DIR")]
    output_dir: PathBuf,

    #[command(flatten)]
    chain: ChainArgs,

    /// Export formats, optionally with quality (e.g. `mp3:192k,flac`)
    #[arg(short, long, default_value = "mp3,flac,ogg", value_delimiter = ',')]
    formats: Vec<String>,

    /// Quality preset for formats given without an explicit quality
    #[arg(short, long, default_value = "high")]
    quality: QualityPreset,

    /// Resample the input to this rate before processing
    #[arg(long, value_name = "HZ")]
    sample_rate: Option<u32>,

    /// Skip the JSON analysis report
    #[arg(long)]
    no_report: bool,

    /// Skip the spectrogram image
    #[arg(long)]
    no_spectrogram: bool,

    #[command(flatten)]
    tags: TagArgs,
}

pub fn run(args: ProcessArgs) -> anyhow::Result<()> {
    let config = args.chain.to_config()?;
    let chain = EffectChain::from_config_with_policy(&config, args.chain.limiter_policy)?;
    let requests = export_requests(&args.formats, args.quality)?;
    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("creating {}", args.output_dir.display()))?;

    let input = load_audio(&args.input, args.sample_rate)?;
    let stem = output_stem(&args.input);
    let metadata = args.tags.metadata();
    let gateway = CodecGateway::new();

    let steps = 2
        + requests.len() as u64
        + u64::from(!args.no_report)
        + u64::from(!args.no_spectrogram);
    let pb = ProgressBar::new(steps);
    pb.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("##-"),
    );

    let names: Vec<&str> = chain.stages().iter().map(|s| s.kind().name()).collect();
    pb.set_message(format!("effects: {}", names.join(" > ")));
    let enhanced = chain.process(&input)?;
    pb.inc(1);

    pb.set_message("writing enhanced WAV");
    let wav_path = args.output_dir.join(format!("{stem}_enhanced.wav"));
    let wav = gateway.encode(&enhanced, OutputFormat::Wav, QualityOptions::Default, &metadata)?;
    std::fs::write(&wav_path, wav).with_context(|| format!("writing {}", wav_path.display()))?;
    pb.inc(1);

    pb.set_message("exporting");
    let exports = gateway.export_to_dir(&enhanced, &requests, &metadata, &args.output_dir, &stem);
    pb.inc(requests.len() as u64);

    let mut report_path = None;
    if !args.no_report {
        pb.set_message("analyzing");
        let report = Analyzer::default().analyze(&enhanced)?;
        let path = args.output_dir.join(format!("{stem}_analysis.json"));
        report
            .export_json(&path)
            .with_context(|| format!("writing {}", path.display()))?;
        report_path = Some(path);
        pb.inc(1);
    }

    let mut spectrogram_path = None;
    if !args.no_spectrogram {
        pb.set_message("spectrogram");
        let spec = Spectrogram::compute(&enhanced, 2048, 512)?;
        let path = args.output_dir.join(format!("{stem}_spectrogram.pgm"));
        spec.export_pgm(&path, DEFAULT_DB_RANGE)
            .with_context(|| format!("writing {}", path.display()))?;
        spectrogram_path = Some(path);
        pb.inc(1);
    }
    pb.finish_with_message("done");

    println!("\nStats:");
    println!(
        "  Input:  Peak {:.1} dB, {} frames",
        linear_to_db(input.peak()),
        input.len()
    );
    println!(
        "  Output: Peak {:.1} dB, {} frames",
        linear_to_db(enhanced.peak()),
        enhanced.len()
    );

    println!("\nOutputs:");
    println!("  enhanced     {}", wav_path.display());
    let mut failures = 0;
    for (request, result) in &exports {
        match result {
            Ok(path) => println!("  {:12} {}", request.to_string(), path.display()),
            Err(e) => {
                failures += 1;
                println!("  {:12} FAILED: {e}", request.to_string());
            }
        }
    }
    if let Some(path) = report_path {
        println!("  report       {}", path.display());
    }
    if let Some(path) = spectrogram_path {
        println!("  spectrogram  {}", path.display());
    }
    if failures > 0 {
        tracing::warn!(failures, "some exports failed");
    }

    Ok(())
}
