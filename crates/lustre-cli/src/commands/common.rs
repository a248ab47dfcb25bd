//! Shared CLI helpers used across multiple commands.

use anyhow::Context;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use lustre_config::{ConfigValue, EffectConfig, LimiterPolicy};
use lustre_core::SampleBuffer;
use lustre_io::{CodecGateway, ExportRequest, Metadata, QualityPreset};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Parse a `key=value` string for clap's `value_parser`.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .ok_or_else(|| format!("Invalid parameter format: '{s}' (expected key=value)"))
}

/// Parse `effect.param=value`.
pub fn parse_effect_param(s: &str) -> Result<(String, String, String), String> {
    let (key, value) = parse_key_val(s)?;
    let (effect, param) = key
        .split_once('.')
        .ok_or_else(|| format!("Invalid parameter '{s}' (expected effect.param=value)"))?;
    Ok((effect.to_string(), param.to_string(), value))
}

/// Options that build an [`EffectConfig`].
#[derive(Args, Debug)]
pub struct ChainArgs {
    /// Effect configuration file (TOML, or JSON by extension)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Start from every effect disabled instead of the default pipeline
    #[arg(long, conflicts_with = "config")]
    pub bare: bool,

    /// Enable an effect (repeatable)
    #[arg(long, value_name = "EFFECT")]
    pub enable: Vec<String>,

    /// Disable an effect (repeatable)
    #[arg(long, value_name = "EFFECT")]
    pub disable: Vec<String>,

    /// Set a parameter, e.g. `compressor.ratio=3` or `limiter.ceiling=-1dB`
    #[arg(short, long, value_name = "EFFECT.PARAM=VALUE", value_parser = parse_effect_param)]
    pub param: Vec<(String, String, String)>,

    /// What to do when limiter and mastering are both enabled
    #[arg(long, default_value = "mastering-wins", value_name = "POLICY")]
    pub limiter_policy: LimiterPolicy,
}

impl ChainArgs {
    /// The configuration these options describe.
    pub fn to_config(&self) -> anyhow::Result<EffectConfig> {
        let mut config = match (&self.config, self.bare) {
            (Some(path), _) => EffectConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            (None, true) => EffectConfig::all_disabled(),
            (None, false) => EffectConfig::default(),
        };
        for name in &self.enable {
            config.set_enabled(name, true);
        }
        for name in &self.disable {
            config.set_enabled(name, false);
        }
        for (effect, param, value) in &self.param {
            config = config.with_param(effect, param.as_str(), ConfigValue::from(value.as_str()));
        }
        Ok(config)
    }
}

/// Tags to embed in encoded output.
#[derive(Args, Debug, Default)]
pub struct TagArgs {
    /// Title tag
    #[arg(long)]
    pub title: Option<String>,

    /// Artist tag
    #[arg(long)]
    pub artist: Option<String>,

    /// Album tag
    #[arg(long)]
    pub album: Option<String>,

    /// Genre tag
    #[arg(long)]
    pub genre: Option<String>,

    /// Year tag
    #[arg(long)]
    pub year: Option<String>,
}

impl TagArgs {
    /// Collected metadata.
    pub fn metadata(&self) -> Metadata {
        Metadata {
            title: self.title.clone(),
            artist: self.artist.clone(),
            album: self.album.clone(),
            genre: self.genre.clone(),
            year: self.year.clone(),
        }
    }
}

/// Build export requests from `format` or `format:quality` entries.
///
/// Entries without an explicit quality use `preset`.
pub fn export_requests(
    entries: &[String],
    preset: QualityPreset,
) -> anyhow::Result<Vec<ExportRequest>> {
    entries
        .iter()
        .flat_map(|entry| entry.split(','))
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            if entry.contains(':') {
                entry
                    .parse::<ExportRequest>()
                    .with_context(|| format!("invalid export entry '{entry}'"))
            } else {
                Ok(ExportRequest::batch(&[entry], preset).remove(0))
            }
        })
        .collect()
}

/// Decode an input file, optionally resampling.
pub fn load_audio(path: &Path, sample_rate: Option<u32>) -> anyhow::Result<SampleBuffer> {
    let mut gateway = CodecGateway::new();
    if let Some(rate) = sample_rate {
        gateway = gateway.with_target_sample_rate(rate);
    }
    let buffer = gateway
        .decode_file(path)
        .with_context(|| format!("decoding {}", path.display()))?;
    println!(
        "Loaded {}: {} Hz, {} ch, {:.2}s",
        path.display(),
        buffer.sample_rate(),
        buffer.num_channels(),
        buffer.duration_secs()
    );
    Ok(buffer)
}

/// File stem used to name outputs.
pub fn output_stem(input: &Path) -> String {
    input
        .file_stem()
        .map_or_else(|| "output".to_string(), |s| s.to_string_lossy().into_owned())
}

/// A spinner for a step with no measurable progress.
pub fn spinner(message: &str) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner} [{elapsed_precise}] {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}
