//! Feed-forward dynamics compressor.
//!
//! # Signal Flow
//!
//! ```text
//! max(|L|, |R|) → Envelope Follower → Gain Computer → × gain → Output
//!                                          ↓
//!                                     Makeup Gain
//! ```
//!
//! Gain reduction is hard-knee:
//!
//! ```text
//! reduction_db = max(0, (level_db - threshold_db) × (1 - 1/ratio))
//! ```
//!
//! so a ratio of 1 never reduces gain and an infinite ratio pins the level
//! at the threshold.
//!
//! # Parameters
//!
//! | Parameter | Range | Default |
//! |-----------|-------|---------|
//! | threshold_db | -80 to 0 dB | -20 |
//! | ratio | ≥ 1 (∞ allowed) | 4 |
//! | attack_ms | 0.01 to 1000 ms | 3 |
//! | release_ms | 1 to 5000 ms | 100 |
//! | makeup_db | -24 to 24 dB | 0 |

use crate::params::{Configurable, ParamDescriptor, ParamUnit, ParamValue, unknown_param};
use lustre_core::{
    Effect, EngineError, EnvelopeFollower, Result, SampleBuffer, check_range, db_to_linear,
    linear_to_db,
};

const STAGE: &str = "compressor";

/// Dynamics compressor with channel-linked detection.
///
/// # Example
///
/// ```rust
/// use lustre_core::{Effect, SampleBuffer};
/// use lustre_effects::Compressor;
///
/// let comp = Compressor {
///     threshold_db: -30.0,
///     ratio: 8.0,
///     ..Compressor::default()
/// };
/// let input = SampleBuffer::mono(44100, vec![0.8; 4410]).unwrap();
/// let output = comp.apply(&input).unwrap();
/// assert!(output.peak() < input.peak());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Compressor {
    /// Level where compression begins.
    pub threshold_db: f32,
    /// Compression ratio; `f32::INFINITY` limits at the threshold.
    pub ratio: f32,
    /// Envelope attack time.
    pub attack_ms: f32,
    /// Envelope release time.
    pub release_ms: f32,
    /// Gain applied after compression.
    pub makeup_db: f32,
}

impl Default for Compressor {
    fn default() -> Self {
        Self {
            threshold_db: -20.0,
            ratio: 4.0,
            attack_ms: 3.0,
            release_ms: 100.0,
            makeup_db: 0.0,
        }
    }
}

impl Compressor {
    /// Gain reduction in dB (≥ 0) for a detector level.
    #[inline]
    pub fn gain_reduction_db(&self, level_db: f32) -> f32 {
        let overshoot = level_db - self.threshold_db;
        if overshoot <= 0.0 {
            return 0.0;
        }
        overshoot * (1.0 - 1.0 / self.ratio)
    }

    /// Per-frame linear gain curve for `buffer`, makeup included.
    pub fn gain_curve(&self, buffer: &SampleBuffer) -> Vec<f32> {
        let mut follower =
            EnvelopeFollower::new(buffer.sample_rate(), self.attack_ms, self.release_ms);
        let channels = buffer.channels();

        (0..buffer.len())
            .map(|i| {
                let linked = channels.iter().fold(0.0_f32, |acc, c| acc.max(c[i].abs()));
                let level_db = linear_to_db(follower.process(linked));
                db_to_linear(self.makeup_db - self.gain_reduction_db(level_db))
            })
            .collect()
    }
}

pub(crate) fn validate_ratio(stage: &str, param: &str, ratio: f32) -> Result<()> {
    if ratio.is_nan() || ratio < 1.0 {
        return Err(EngineError::invalid_parameter(
            stage,
            param,
            ratio,
            "must be >= 1",
        ));
    }
    Ok(())
}

impl Effect for Compressor {
    fn name(&self) -> &'static str {
        STAGE
    }

    fn validate(&self, _buffer: &SampleBuffer) -> Result<()> {
        check_range(STAGE, "threshold_db", self.threshold_db, -80.0, 0.0)?;
        validate_ratio(STAGE, "ratio", self.ratio)?;
        check_range(STAGE, "attack_ms", self.attack_ms, 0.01, 1000.0)?;
        check_range(STAGE, "release_ms", self.release_ms, 1.0, 5000.0)?;
        check_range(STAGE, "makeup_db", self.makeup_db, -24.0, 24.0)
    }

    fn process(&self, buffer: &SampleBuffer) -> Result<SampleBuffer> {
        let gains = self.gain_curve(buffer);
        buffer.map_channels(|c| c.iter().zip(&gains).map(|(x, g)| x * g).collect())
    }
}

impl Configurable for Compressor {
    const PARAMS: &'static [ParamDescriptor] = &[
        ParamDescriptor::number(
            "threshold_db",
            ParamUnit::Decibels,
            -80.0,
            0.0,
            -20.0,
            "Level where compression begins",
        ),
        ParamDescriptor::number(
            "ratio",
            ParamUnit::Ratio,
            1.0,
            f32::INFINITY,
            4.0,
            "Compression ratio (inf = limiting)",
        ),
        ParamDescriptor::number(
            "attack_ms",
            ParamUnit::Milliseconds,
            0.01,
            1000.0,
            3.0,
            "Envelope attack time",
        ),
        ParamDescriptor::number(
            "release_ms",
            ParamUnit::Milliseconds,
            1.0,
            5000.0,
            100.0,
            "Envelope release time",
        ),
        ParamDescriptor::number(
            "makeup_db",
            ParamUnit::Decibels,
            -24.0,
            24.0,
            0.0,
            "Output gain after compression",
        ),
    ];

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        match name {
            "threshold_db" => self.threshold_db = value.as_number(STAGE, name)?,
            "ratio" => self.ratio = value.as_number(STAGE, name)?,
            "attack_ms" => self.attack_ms = value.as_number(STAGE, name)?,
            "release_ms" => self.release_ms = value.as_number(STAGE, name)?,
            "makeup_db" => self.makeup_db = value.as_number(STAGE, name)?,
            _ => return Err(unknown_param(STAGE, name, value)),
        }
        Ok(())
    }
}
