//! Analysis report and its flat JSON form.

use crate::dynamics::LoudnessDescriptors;
use crate::rhythm::BeatDescriptors;
use crate::spectral::SpectralDescriptors;
use crate::tonal::KeyEstimate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Value of `key` and `key_mode` when no key was found.
pub const NO_KEY: &str = "none";

/// Everything the analyzer measures about one buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    /// Duration in seconds.
    pub duration_s: f64,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count of the analyzed buffer.
    pub channels: usize,
    /// Spectral shape.
    pub spectral: SpectralDescriptors,
    /// Tempo and beats.
    pub rhythm: BeatDescriptors,
    /// Key estimate.
    pub tonal: KeyEstimate,
    /// Loudness.
    pub loudness: LoudnessDescriptors,
}

impl AnalysisReport {
    /// Report for a buffer with no content: zero energy, no tempo, no key.
    pub fn silent(sample_rate: u32, channels: usize, duration_s: f64) -> Self {
        Self {
            duration_s,
            sample_rate,
            channels,
            spectral: SpectralDescriptors::default(),
            rhythm: BeatDescriptors::default(),
            tonal: KeyEstimate::default(),
            loudness: LoudnessDescriptors::default(),
        }
    }

    /// Flatten into the key/value export form.
    pub fn to_flat(&self) -> FlatReport {
        let s = &self.spectral;
        let l = &self.loudness;
        FlatReport {
            duration_s: self.duration_s,
            sample_rate: self.sample_rate,
            channels: self.channels,
            spectral_centroid_mean: s.centroid.mean,
            spectral_centroid_variance: s.centroid.variance,
            spectral_centroid_std: s.centroid.std,
            spectral_rolloff_mean: s.rolloff.mean,
            spectral_rolloff_variance: s.rolloff.variance,
            spectral_rolloff_std: s.rolloff.std,
            spectral_bandwidth_mean: s.bandwidth.mean,
            spectral_bandwidth_variance: s.bandwidth.variance,
            spectral_bandwidth_std: s.bandwidth.std,
            zero_crossing_rate_mean: s.zero_crossing_rate.mean,
            zero_crossing_rate_variance: s.zero_crossing_rate.variance,
            zero_crossing_rate_std: s.zero_crossing_rate.std,
            tempo_bpm: self.rhythm.tempo_bpm,
            beat_count: self.rhythm.beat_count(),
            beat_times_s: self.rhythm.beat_times_s.clone(),
            key: self
                .tonal
                .key
                .map_or(NO_KEY, |k| k.tonic_name())
                .to_string(),
            key_mode: self
                .tonal
                .key
                .map_or(NO_KEY, |k| k.mode.name())
                .to_string(),
            key_confidence: self.tonal.confidence,
            rms: l.rms,
            rms_db: l.rms_db,
            peak: l.peak,
            peak_db: l.peak_db,
            dynamic_range_db: l.dynamic_range_db,
            noise_floor: l.noise_floor,
            crest_factor_db: l.crest_factor_db,
        }
    }

    /// Pretty-printed flat JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.to_flat())
    }

    /// Write flat JSON to `writer`.
    pub fn write_json<W: Write>(&self, mut writer: W) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut writer, &self.to_flat())?;
        writeln!(writer)?;
        writer.flush()
    }

    /// Export flat JSON to a file.
    pub fn export_json(&self, path: impl AsRef<Path>) -> io::Result<()> {
        self.write_json(BufWriter::new(File::create(path)?))
    }
}

/// Flat, fully numeric/string form of an [`AnalysisReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct FlatReport {
    pub duration_s: f64,
    pub sample_rate: u32,
    pub channels: usize,
    pub spectral_centroid_mean: f32,
    pub spectral_centroid_variance: f32,
    pub spectral_centroid_std: f32,
    pub spectral_rolloff_mean: f32,
    pub spectral_rolloff_variance: f32,
    pub spectral_rolloff_std: f32,
    pub spectral_bandwidth_mean: f32,
    pub spectral_bandwidth_variance: f32,
    pub spectral_bandwidth_std: f32,
    pub zero_crossing_rate_mean: f32,
    pub zero_crossing_rate_variance: f32,
    pub zero_crossing_rate_std: f32,
    pub tempo_bpm: f32,
    pub beat_count: usize,
    pub beat_times_s: Vec<f32>,
    pub key: String,
    pub key_mode: String,
    pub key_confidence: f32,
    pub rms: f32,
    pub rms_db: f32,
    pub peak: f32,
    pub peak_db: f32,
    pub dynamic_range_db: f32,
    pub noise_floor: f32,
    pub crest_factor_db: f32,
}
