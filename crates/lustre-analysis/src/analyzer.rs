//! One-shot analysis of a sample buffer.

use crate::dynamics::LoudnessDescriptors;
use crate::report::AnalysisReport;
use crate::rhythm::{BeatDescriptors, estimate_tempo, onset_strength, track_beats};
use crate::spectral::SpectralDescriptors;
use crate::tonal::{chroma, estimate_key};
use lustre_core::{EngineError, Result, SampleBuffer, SpectralEngine, check_range};

const STAGE: &str = "analyzer";

/// Computes an [`AnalysisReport`] from a buffer.
///
/// Spectral, rhythm and key descriptors of a stereo buffer come from its
/// mono downmix; loudness is measured over both channels. Content never
/// makes analysis fail: empty and silent buffers give a report of sentinel
/// values. Errors come only from invalid analyzer settings.
///
/// # Example
///
/// ```rust
/// use lustre_analysis::Analyzer;
/// use lustre_core::SampleBuffer;
///
/// let silence = SampleBuffer::silence(44100, 2, 44100).unwrap();
/// let report = Analyzer::default().analyze(&silence).unwrap();
/// assert_eq!(report.loudness.peak, 0.0);
/// assert_eq!(report.to_flat().key, "none");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Analyzer {
    /// STFT window size (power of two).
    pub window_size: usize,
    /// STFT hop size.
    pub hop_size: usize,
    /// Energy fraction for the spectral rolloff.
    pub rolloff_fraction: f32,
    /// Slowest tempo considered.
    pub min_bpm: f32,
    /// Fastest tempo considered.
    pub max_bpm: f32,
    /// Percentile of block levels taken as the noise floor.
    pub noise_floor_percentile: f32,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self {
            window_size: 2048,
            hop_size: 512,
            rolloff_fraction: 0.85,
            min_bpm: 40.0,
            max_bpm: 240.0,
            noise_floor_percentile: 10.0,
        }
    }
}

impl Analyzer {
    /// Analyzer with a specific STFT grid and default everything else.
    pub fn new(window_size: usize, hop_size: usize) -> Result<Self> {
        let analyzer = Self {
            window_size,
            hop_size,
            ..Self::default()
        };
        analyzer.validate()?;
        Ok(analyzer)
    }

    /// Check the settings.
    pub fn validate(&self) -> Result<()> {
        SpectralEngine::new(self.window_size, self.hop_size)?;
        check_range(STAGE, "rolloff_fraction", self.rolloff_fraction, 0.01, 1.0)?;
        check_range(STAGE, "min_bpm", self.min_bpm, 1.0, 1000.0)?;
        check_range(STAGE, "max_bpm", self.max_bpm, 1.0, 1000.0)?;
        if self.min_bpm >= self.max_bpm {
            return Err(EngineError::invalid_parameter(
                STAGE,
                "max_bpm",
                self.max_bpm,
                format!("must exceed min_bpm ({})", self.min_bpm),
            ));
        }
        check_range(STAGE, "noise_floor_percentile", self.noise_floor_percentile, 0.0, 100.0)
    }

    /// Analyze `buffer`.
    pub fn analyze(&self, buffer: &SampleBuffer) -> Result<AnalysisReport> {
        let engine = SpectralEngine::new(self.window_size, self.hop_size)?;
        self.validate()?;

        let sample_rate = buffer.sample_rate();
        let duration_s = buffer.duration_secs();
        let mono = buffer.to_mono();
        if mono.is_empty() {
            tracing::debug!("analyzer: empty buffer, returning sentinel report");
            return Ok(AnalysisReport::silent(sample_rate, buffer.num_channels(), duration_s));
        }

        let magnitudes: Vec<Vec<f32>> = engine
            .forward_channel(&mono)
            .iter()
            .map(|frame| frame.iter().map(|c| c.norm()).collect())
            .collect();
        let bin_hz = sample_rate as f32 / self.window_size as f32;

        let spectral = SpectralDescriptors::compute(
            &magnitudes,
            &mono,
            bin_hz,
            self.rolloff_fraction,
            self.window_size,
            self.hop_size,
        );
        let rhythm = self.beats(&magnitudes, sample_rate);
        let tonal = estimate_key(&chroma(&magnitudes, bin_hz));
        let loudness =
            LoudnessDescriptors::compute_channels(buffer.channels(), self.noise_floor_percentile);

        tracing::debug!(
            frames = magnitudes.len(),
            tempo_bpm = rhythm.tempo_bpm,
            beats = rhythm.beat_count(),
            key = ?tonal.key,
            rms_db = loudness.rms_db,
            "analyzer: done"
        );

        Ok(AnalysisReport {
            duration_s,
            sample_rate,
            channels: buffer.num_channels(),
            spectral,
            rhythm,
            tonal,
            loudness,
        })
    }

    fn beats(&self, magnitudes: &[Vec<f32>], sample_rate: u32) -> BeatDescriptors {
        let frame_rate = sample_rate as f32 / self.hop_size as f32;
        let onsets = onset_strength(magnitudes);
        let Some(tempo_bpm) = estimate_tempo(&onsets, frame_rate, self.min_bpm, self.max_bpm)
        else {
            return BeatDescriptors::default();
        };

        let period = 60.0 * frame_rate / tempo_bpm;
        let pad = self.window_size - self.hop_size;
        let beat_times_s = track_beats(&onsets, period)
            .into_iter()
            .map(|frame| {
                let center = (frame * self.hop_size + self.window_size / 2) as f32 - pad as f32;
                center.max(0.0) / sample_rate as f32
            })
            .collect();

        BeatDescriptors {
            tempo_bpm,
            beat_times_s,
        }
    }
}
