//! Loudness and dynamics measurements
//!
//! - RMS and peak level of the whole signal, pooled over every channel
//! - Crest factor (peak-to-RMS ratio)
//! - Noise floor: a low percentile of block RMS levels
//! - Dynamic range: peak level over the noise floor

use lustre_core::{SILENCE_DB, linear_to_db};
use serde::{Deserialize, Serialize};

/// Block length used for noise floor estimation.
pub const BLOCK_SIZE: usize = 4096;

/// Block RMS below this is digital silence and never counts as noise.
const SILENCE_RMS: f32 = 1e-10;

/// RMS level of a signal (linear).
pub fn rms(signal: &[f32]) -> f32 {
    if signal.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = signal.iter().map(|&x| f64::from(x) * f64::from(x)).sum();
    (sum_sq / signal.len() as f64).sqrt() as f32
}

/// Maximum absolute sample.
pub fn peak(signal: &[f32]) -> f32 {
    signal.iter().fold(0.0f32, |m, x| m.max(x.abs()))
}

/// Level in dB, with [`SILENCE_DB`] for zero.
pub fn level_db(linear: f32) -> f32 {
    if linear > SILENCE_RMS {
        linear_to_db(linear)
    } else {
        SILENCE_DB
    }
}

/// Crest factor in dB; 0 for silence.
///
/// A sine is about 3 dB, typical music 12-18 dB.
pub fn crest_factor_db(signal: &[f32]) -> f32 {
    let r = rms(signal);
    if r > SILENCE_RMS {
        linear_to_db(peak(signal) / r)
    } else {
        0.0
    }
}

/// RMS of consecutive blocks; the last block may be short.
pub fn block_rms(signal: &[f32], block_size: usize) -> Vec<f32> {
    signal.chunks(block_size.max(1)).map(rms).collect()
}

/// Noise floor as the `percentile` (0-100) of non-silent block RMS levels.
///
/// Returns 0 when every block is digital silence.
pub fn noise_floor(signal: &[f32], block_size: usize, percentile: f32) -> f32 {
    floor_percentile(block_rms(signal, block_size), percentile)
}

fn floor_percentile(levels: Vec<f32>, percentile: f32) -> f32 {
    let mut levels: Vec<f32> = levels.into_iter().filter(|&r| r > SILENCE_RMS).collect();
    if levels.is_empty() {
        return 0.0;
    }
    levels.sort_by(f32::total_cmp);
    let rank = (percentile.clamp(0.0, 100.0) / 100.0 * (levels.len() - 1) as f32).round();
    levels[rank as usize]
}

/// Whole-signal loudness descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoudnessDescriptors {
    /// RMS level, linear.
    pub rms: f32,
    /// RMS level in dBFS.
    pub rms_db: f32,
    /// Peak level, linear.
    pub peak: f32,
    /// Peak level in dBFS.
    pub peak_db: f32,
    /// Percentile noise floor, linear.
    pub noise_floor: f32,
    /// Peak over noise floor in dB; 0 for silence.
    pub dynamic_range_db: f32,
    /// Peak over RMS in dB; 0 for silence.
    pub crest_factor_db: f32,
}

impl Default for LoudnessDescriptors {
    fn default() -> Self {
        Self {
            rms: 0.0,
            rms_db: SILENCE_DB,
            peak: 0.0,
            peak_db: SILENCE_DB,
            noise_floor: 0.0,
            dynamic_range_db: 0.0,
            crest_factor_db: 0.0,
        }
    }
}

impl LoudnessDescriptors {
    /// Measure a single signal.
    pub fn compute(signal: &[f32], noise_percentile: f32) -> Self {
        Self::compute_channels(&[signal], noise_percentile)
    }

    /// Measure every channel together.
    ///
    /// RMS pools the samples of all channels, peak is the largest of any
    /// channel, and the noise floor ranks the blocks of all channels.
    pub fn compute_channels<C: AsRef<[f32]>>(channels: &[C], noise_percentile: f32) -> Self {
        let total: usize = channels.iter().map(|c| c.as_ref().len()).sum();
        if total == 0 {
            return Self::default();
        }
        let sum_sq: f64 = channels
            .iter()
            .flat_map(|c| c.as_ref())
            .map(|&x| f64::from(x) * f64::from(x))
            .sum();
        let rms = (sum_sq / total as f64).sqrt() as f32;
        let peak = channels.iter().map(|c| peak(c.as_ref())).fold(0.0, f32::max);
        let blocks = channels
            .iter()
            .flat_map(|c| block_rms(c.as_ref(), BLOCK_SIZE))
            .collect();
        let noise_floor = floor_percentile(blocks, noise_percentile);

        let ratio_db = |num: f32, den: f32| {
            if den > SILENCE_RMS {
                linear_to_db(num / den)
            } else {
                0.0
            }
        };
        Self {
            rms,
            rms_db: level_db(rms),
            peak,
            peak_db: level_db(peak),
            noise_floor,
            dynamic_range_db: ratio_db(peak, noise_floor),
            crest_factor_db: ratio_db(peak, rms),
        }
    }
}
