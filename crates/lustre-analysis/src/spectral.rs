//! Per-frame spectral shape descriptors.
//!
//! Every function takes one magnitude spectrum (`N/2 + 1` bins) and the bin
//! spacing in Hz. A silent frame yields 0 for every descriptor.

use serde::{Deserialize, Serialize};

/// Mean, variance and standard deviation of a descriptor time series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Arithmetic mean.
    pub mean: f32,
    /// Population variance.
    pub variance: f32,
    /// Square root of the variance.
    pub std: f32,
}

impl Summary {
    /// Summarize `values`; an empty series gives all zeros.
    pub fn of(values: &[f32]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let n = values.len() as f64;
        let mean = values.iter().map(|&v| f64::from(v)).sum::<f64>() / n;
        let variance = values
            .iter()
            .map(|&v| (f64::from(v) - mean).powi(2))
            .sum::<f64>()
            / n;
        Self {
            mean: mean as f32,
            variance: variance as f32,
            std: variance.sqrt() as f32,
        }
    }
}

/// Magnitude-weighted mean frequency in Hz.
pub fn spectral_centroid(magnitudes: &[f32], bin_hz: f32) -> f32 {
    let mut weighted = 0.0f64;
    let mut total = 0.0f64;
    for (i, &m) in magnitudes.iter().enumerate() {
        weighted += f64::from(m) * i as f64 * f64::from(bin_hz);
        total += f64::from(m);
    }
    if total > 1e-12 {
        (weighted / total) as f32
    } else {
        0.0
    }
}

/// Frequency below which `fraction` of the frame's energy lies.
///
/// Energy is the squared magnitude.
pub fn spectral_rolloff(magnitudes: &[f32], bin_hz: f32, fraction: f32) -> f32 {
    let total: f64 = magnitudes.iter().map(|&m| f64::from(m) * f64::from(m)).sum();
    if total <= 1e-24 {
        return 0.0;
    }
    let threshold = total * f64::from(fraction);
    let mut cumulative = 0.0f64;
    for (i, &m) in magnitudes.iter().enumerate() {
        cumulative += f64::from(m) * f64::from(m);
        if cumulative >= threshold {
            return i as f32 * bin_hz;
        }
    }
    magnitudes.len().saturating_sub(1) as f32 * bin_hz
}

/// Magnitude-weighted standard deviation of frequency around `centroid`.
pub fn spectral_bandwidth(magnitudes: &[f32], bin_hz: f32, centroid: f32) -> f32 {
    let mut spread = 0.0f64;
    let mut total = 0.0f64;
    for (i, &m) in magnitudes.iter().enumerate() {
        let freq = i as f64 * f64::from(bin_hz);
        spread += f64::from(m) * (freq - f64::from(centroid)).powi(2);
        total += f64::from(m);
    }
    if total > 1e-12 {
        (spread / total).sqrt() as f32
    } else {
        0.0
    }
}

/// Sign changes per sample in a time-domain frame.
///
/// Zero counts as positive, so a run of silence has no crossings.
pub fn zero_crossing_rate(frame: &[f32]) -> f32 {
    if frame.len() < 2 {
        return 0.0;
    }
    let crossings = frame
        .windows(2)
        .filter(|w| (w[0] < 0.0) != (w[1] < 0.0))
        .count();
    crossings as f32 / frame.len() as f32
}

/// Summaries of the four spectral descriptors over all frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpectralDescriptors {
    /// Centroid in Hz.
    pub centroid: Summary,
    /// Rolloff frequency in Hz.
    pub rolloff: Summary,
    /// Bandwidth in Hz.
    pub bandwidth: Summary,
    /// Zero-crossing rate per sample.
    pub zero_crossing_rate: Summary,
}

impl SpectralDescriptors {
    /// Describe a signal from its magnitude frames and time-domain samples.
    ///
    /// Zero-crossing frames use the same `window`/`hop` grid as the STFT,
    /// starting at sample 0.
    pub fn compute(
        magnitudes: &[Vec<f32>],
        samples: &[f32],
        bin_hz: f32,
        rolloff_fraction: f32,
        window: usize,
        hop: usize,
    ) -> Self {
        let mut centroids = Vec::with_capacity(magnitudes.len());
        let mut rolloffs = Vec::with_capacity(magnitudes.len());
        let mut bandwidths = Vec::with_capacity(magnitudes.len());
        for frame in magnitudes {
            let c = spectral_centroid(frame, bin_hz);
            centroids.push(c);
            rolloffs.push(spectral_rolloff(frame, bin_hz, rolloff_fraction));
            bandwidths.push(spectral_bandwidth(frame, bin_hz, c));
        }

        let zcr: Vec<f32> = (0..samples.len())
            .step_by(hop.max(1))
            .map(|start| zero_crossing_rate(&samples[start..(start + window).min(samples.len())]))
            .collect();

        Self {
            centroid: Summary::of(&centroids),
            rolloff: Summary::of(&rolloffs),
            bandwidth: Summary::of(&bandwidths),
            zero_crossing_rate: Summary::of(&zcr),
        }
    }
}
