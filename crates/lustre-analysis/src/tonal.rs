//! Chroma features and key estimation.
//!
//! Spectral bins between [`MIN_CHROMA_HZ`] and [`MAX_CHROMA_HZ`] are folded
//! onto the 12 pitch classes by their nearest equal-tempered note. The
//! frame-averaged chroma vector is correlated against the 24 rotations of
//! the Krumhansl-Kessler major and minor key profiles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest frequency folded into chroma (about C1).
pub const MIN_CHROMA_HZ: f32 = 32.0;

/// Highest frequency folded into chroma.
pub const MAX_CHROMA_HZ: f32 = 5000.0;

/// Pitch class names, C first.
pub const PITCH_CLASSES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

const MAJOR_PROFILE: [f32; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];
const MINOR_PROFILE: [f32; 12] = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17,
];

/// Major or minor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Major key.
    Major,
    /// Minor key.
    Minor,
}

impl Mode {
    /// Lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Mode::Major => "major",
            Mode::Minor => "minor",
        }
    }
}

/// A musical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    /// Tonic pitch class, 0 = C.
    pub tonic: usize,
    /// Major or minor.
    pub mode: Mode,
}

impl Key {
    /// Tonic name, e.g. `"F#"`.
    pub fn tonic_name(&self) -> &'static str {
        PITCH_CLASSES[self.tonic % 12]
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.tonic_name(), self.mode.name())
    }
}

/// Result of key estimation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyEstimate {
    /// Best-matching key; `None` for silence or a flat chroma vector.
    pub key: Option<Key>,
    /// Margin of the best correlation over the runner-up, in `[0, 1]`.
    pub confidence: f32,
}

/// Pitch class of a frequency.
pub fn pitch_class(freq_hz: f32) -> usize {
    let midi = 69.0 + 12.0 * (freq_hz / 440.0).log2();
    (midi.round() as i64).rem_euclid(12) as usize
}

/// Frame-averaged chroma vector.
///
/// Each frame's energy per pitch class is square-rooted and normalized to
/// a maximum of 1 before averaging. Silent frames are skipped.
pub fn chroma(magnitudes: &[Vec<f32>], bin_hz: f32) -> [f32; 12] {
    let mut sum = [0.0f32; 12];
    let mut counted = 0usize;

    for frame in magnitudes {
        let mut energy = [0.0f32; 12];
        for (bin, &m) in frame.iter().enumerate() {
            let freq = bin as f32 * bin_hz;
            if (MIN_CHROMA_HZ..=MAX_CHROMA_HZ).contains(&freq) {
                energy[pitch_class(freq)] += m * m;
            }
        }
        let amplitude = energy.map(f32::sqrt);
        let max = amplitude.iter().fold(0.0f32, |a, &b| a.max(b));
        if max > 1e-10 {
            for (s, a) in sum.iter_mut().zip(amplitude) {
                *s += a / max;
            }
            counted += 1;
        }
    }

    if counted > 0 {
        for s in &mut sum {
            *s /= counted as f32;
        }
    }
    sum
}

fn correlation(a: &[f32; 12], b: &[f32; 12]) -> Option<f32> {
    let ma = a.iter().sum::<f32>() / 12.0;
    let mb = b.iter().sum::<f32>() / 12.0;
    let mut num = 0.0f32;
    let mut da = 0.0f32;
    let mut db = 0.0f32;
    for (&x, &y) in a.iter().zip(b) {
        num += (x - ma) * (y - mb);
        da += (x - ma) * (x - ma);
        db += (y - mb) * (y - mb);
    }
    let denom = (da * db).sqrt();
    (denom > 1e-12).then(|| num / denom)
}

fn rotate(profile: &[f32; 12], tonic: usize) -> [f32; 12] {
    std::array::from_fn(|i| profile[(i + 12 - tonic) % 12])
}

/// Correlation of `chroma` with each of the 24 keys.
///
/// Empty when the chroma vector is flat (silence included).
pub fn key_correlations(chroma: &[f32; 12]) -> Vec<(Key, f32)> {
    let mut scores = Vec::with_capacity(24);
    for (mode, profile) in [(Mode::Major, &MAJOR_PROFILE), (Mode::Minor, &MINOR_PROFILE)] {
        for tonic in 0..12 {
            match correlation(chroma, &rotate(profile, tonic)) {
                Some(r) => scores.push((Key { tonic, mode }, r)),
                None => return Vec::new(),
            }
        }
    }
    scores
}

/// Estimate the key of a chroma vector.
///
/// Confidence is `(best - second) / (1 - second)`: 0 when two keys tie, 1
/// when the best key correlates perfectly.
pub fn estimate_key(chroma: &[f32; 12]) -> KeyEstimate {
    let mut scores = key_correlations(chroma);
    if scores.is_empty() {
        return KeyEstimate::default();
    }
    scores.sort_by(|a, b| b.1.total_cmp(&a.1));
    let (key, best) = scores[0];
    let second = scores[1].1;
    let confidence = if second < 1.0 {
        ((best - second) / (1.0 - second)).clamp(0.0, 1.0)
    } else {
        0.0
    };
    KeyEstimate {
        key: Some(key),
        confidence,
    }
}
