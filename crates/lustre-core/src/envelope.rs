//! Envelope follower for tracking signal amplitude.
//!
//! Drives the compressor and the mastering band compressors.

use crate::math::time_constant_coeff;

/// How the follower rectifies its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectionMode {
    /// Absolute value (peak-style detection).
    #[default]
    Peak,
    /// Squared input; [`EnvelopeFollower::process`] returns the square root.
    Rms,
}

/// Attack/release envelope follower.
///
/// One-pole smoothing of the rectified signal with separate attack and
/// release coefficients:
///
/// ```text
/// coeff = input > env ? attack : release
/// env   = coeff * env + (1 - coeff) * |input|
/// ```
///
/// # Example
///
/// ```rust
/// use lustre_core::EnvelopeFollower;
///
/// let mut env = EnvelopeFollower::new(48000, 10.0, 100.0);
/// let level = env.process(0.5);
/// assert!(level > 0.0 && level < 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct EnvelopeFollower {
    envelope: f32,
    attack_coeff: f32,
    release_coeff: f32,
    mode: DetectionMode,
}

impl EnvelopeFollower {
    /// Create a peak follower with the given attack and release times.
    pub fn new(sample_rate: u32, attack_ms: f32, release_ms: f32) -> Self {
        Self {
            envelope: 0.0,
            attack_coeff: time_constant_coeff(attack_ms, sample_rate),
            release_coeff: time_constant_coeff(release_ms, sample_rate),
            mode: DetectionMode::Peak,
        }
    }

    /// Switch the detection mode.
    pub fn with_mode(mut self, mode: DetectionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Feed one sample and return the current envelope (always ≥ 0).
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let rectified = match self.mode {
            DetectionMode::Peak => input.abs(),
            DetectionMode::Rms => input * input,
        };

        let coeff = if rectified > self.envelope {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.envelope = coeff * self.envelope + (1.0 - coeff) * rectified;

        match self.mode {
            DetectionMode::Peak => self.envelope,
            DetectionMode::Rms => self.envelope.sqrt(),
        }
    }

    /// Reset the envelope to zero.
    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }
}
