//! Lustre CLI - offline audio enhancement, analysis and export.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lustre")]
#[command(author, version, about = "Lustre audio enhancement engine", long_about = None)]
struct Cli {
    /// Log at debug level (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enhance a file: effects, enhanced WAV, exports, report, spectrogram
    Process(commands::process::ProcessArgs),

    /// Print or export descriptors for an audio file
    Analyze(commands::analyze::AnalyzeArgs),

    /// Encode an audio file into one or more formats
    Export(commands::export::ExportArgs),

    /// List available effects and their parameters
    Effects(commands::effects::EffectsArgs),

    /// Write a magnitude spectrogram as PGM or CSV
    Spectrogram(commands::spectrogram::SpectrogramArgs),
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Process(args) => commands::process::run(args),
        Commands::Analyze(args) => commands::analyze::run(args),
        Commands::Export(args) => commands::export::run(args),
        Commands::Effects(args) => commands::effects::run(args),
        Commands::Spectrogram(args) => commands::spectrogram::run(args),
    }
}
