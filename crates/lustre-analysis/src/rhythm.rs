//! Tempo and beat tracking from spectral flux.
//!
//! 1. Onset strength: half-wave rectified frame-to-frame increase of the
//!    log-compressed magnitude spectrum.
//! 2. Tempo: autocorrelation of the mean-removed onset signal over the lags
//!    of a BPM range, weighted by a log-normal preference around 120 BPM.
//! 3. Beats: starting at the strongest onset, step one beat period at a
//!    time in both directions, snapping to the local onset maximum.

use serde::{Deserialize, Serialize};

/// Center of the tempo preference, in BPM.
const PREFERRED_BPM: f32 = 120.0;

/// Width of the tempo preference, in octaves.
const PREFERENCE_OCTAVES: f32 = 1.0;

/// Estimated tempo and beat positions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BeatDescriptors {
    /// Tempo in beats per minute; 0 when none was found.
    pub tempo_bpm: f32,
    /// Beat times in seconds, ascending.
    pub beat_times_s: Vec<f32>,
}

impl BeatDescriptors {
    /// Number of detected beats.
    pub fn beat_count(&self) -> usize {
        self.beat_times_s.len()
    }
}

/// Onset strength per frame. Frame 0 has no predecessor and scores 0.
pub fn onset_strength(magnitudes: &[Vec<f32>]) -> Vec<f32> {
    let mut onsets = Vec::with_capacity(magnitudes.len());
    let mut previous: Option<Vec<f32>> = None;
    for frame in magnitudes {
        let current: Vec<f32> = frame.iter().map(|&m| m.ln_1p()).collect();
        let flux = previous.as_ref().map_or(0.0, |prev| {
            prev.iter()
                .zip(&current)
                .map(|(&p, &c)| (c - p).max(0.0))
                .sum()
        });
        onsets.push(flux);
        previous = Some(current);
    }
    onsets
}

/// Estimate the tempo of an onset signal sampled at `frame_rate` Hz.
///
/// Returns `None` when the signal is too short for the slowest tempo or
/// carries no periodic energy.
pub fn estimate_tempo(onsets: &[f32], frame_rate: f32, min_bpm: f32, max_bpm: f32) -> Option<f32> {
    if onsets.len() < 4 || frame_rate <= 0.0 {
        return None;
    }
    let mean = onsets.iter().sum::<f32>() / onsets.len() as f32;
    let centered: Vec<f32> = onsets.iter().map(|o| o - mean).collect();
    if centered.iter().all(|c| c.abs() < 1e-9) {
        return None;
    }

    let min_lag = ((60.0 * frame_rate / max_bpm).floor() as usize).max(1);
    let max_lag = ((60.0 * frame_rate / min_bpm).ceil() as usize).min(centered.len() - 2);
    if min_lag > max_lag {
        return None;
    }

    let autocorr = |lag: usize| -> f32 {
        centered
            .iter()
            .zip(&centered[lag..])
            .map(|(a, b)| a * b)
            .sum()
    };
    let weight = |lag: usize| -> f32 {
        let bpm = 60.0 * frame_rate / lag as f32;
        let octaves = (bpm / PREFERRED_BPM).log2() / PREFERENCE_OCTAVES;
        (-0.5 * octaves * octaves).exp()
    };

    let scores: Vec<f32> = (min_lag..=max_lag)
        .map(|lag| autocorr(lag) * weight(lag))
        .collect();
    let (best, &score) = scores
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))?;
    if score <= 0.0 {
        return None;
    }

    // Parabolic refinement between neighboring lags.
    let mut lag = (min_lag + best) as f32;
    if best > 0 && best + 1 < scores.len() {
        let (a, b, c) = (scores[best - 1], score, scores[best + 1]);
        let denom = a - 2.0 * b + c;
        if denom.abs() > 1e-12 {
            lag += (0.5 * (a - c) / denom).clamp(-0.5, 0.5);
        }
    }
    Some(60.0 * frame_rate / lag)
}

/// Beat frames for an onset signal with a known beat period in frames.
pub fn track_beats(onsets: &[f32], period: f32) -> Vec<usize> {
    if onsets.is_empty() || period < 1.0 {
        return Vec::new();
    }
    let Some(anchor) = onsets
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
    else {
        return Vec::new();
    };

    let radius = ((period / 10.0).round() as usize).max(1);
    let snap = |predicted: f32| -> Option<usize> {
        if predicted < 0.0 || predicted > (onsets.len() - 1) as f32 {
            return None;
        }
        let center = predicted.round() as usize;
        let lo = center.saturating_sub(radius);
        let hi = (center + radius).min(onsets.len() - 1);
        (lo..=hi).max_by(|&a, &b| onsets[a].total_cmp(&onsets[b]))
    };

    let mut beats = vec![anchor];
    let mut position = anchor as f32;
    while let Some(next) = snap(position + period) {
        if next <= *beats.last().unwrap_or(&anchor) {
            break;
        }
        beats.push(next);
        position = next as f32;
    }
    let mut position = anchor as f32;
    let mut earlier = Vec::new();
    while let Some(prev) = snap(position - period) {
        if prev >= earlier.last().copied().unwrap_or(anchor) {
            break;
        }
        earlier.push(prev);
        position = prev as f32;
    }
    earlier.reverse();
    earlier.extend(beats);
    earlier
}
