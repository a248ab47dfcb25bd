//! Multiband mastering chain.
//!
//! ```text
//!            ┌─ LR low ──────────── Compressor 1 ─┐
//! Input ─────┼─ LR mid (2 splits) ─ Compressor 2 ─┼─ Σ ─ Limiter ─ Output
//!            └─ rest ────────────── Compressor N ─┘
//! ```
//!
//! Bands are split with complementary Linkwitz-Riley style crossovers: the
//! low band is a Butterworth low-pass applied twice, the remainder is the
//! input minus the low band. Without compression the bands sum back to the
//! input. Each band is compressed independently (bands run in parallel),
//! the bands are summed, and the sum is brick-wall limited.

use crate::compressor::{Compressor, validate_ratio};
use crate::limiter::{Limiter, validate_ceiling};
use crate::params::{Configurable, ParamDescriptor, ParamUnit, ParamValue, unknown_param};
use lustre_core::{
    Biquad, Effect, EngineError, Result, SampleBuffer, check_frequency, check_range,
    db_to_linear, lowpass_coefficients,
};
use rayon::prelude::*;

const STAGE: &str = "mastering";

/// Most crossovers a chain may split at, giving four bands.
pub const MAX_CROSSOVERS: usize = 3;

/// Butterworth Q for each half of the crossover low-pass.
const BUTTERWORTH_Q: f32 = core::f32::consts::FRAC_1_SQRT_2;

/// Low band of one crossover: a Butterworth low-pass applied twice.
fn crossover_low(signal: &[f32], freq_hz: f32, sample_rate: u32) -> Vec<f32> {
    let coeffs = lowpass_coefficients(freq_hz, BUTTERWORTH_Q, sample_rate as f32);
    let first = Biquad::with_coefficients(coeffs).process_slice(signal);
    Biquad::with_coefficients(coeffs).process_slice(&first)
}

/// Split one channel into `crossovers.len() + 1` bands that sum to `signal`.
pub fn split_bands(signal: &[f32], crossovers: &[f32], sample_rate: u32) -> Vec<Vec<f32>> {
    let mut bands = Vec::with_capacity(crossovers.len() + 1);
    let mut rest = signal.to_vec();
    for &freq in crossovers {
        let low = crossover_low(&rest, freq, sample_rate);
        for (r, l) in rest.iter_mut().zip(&low) {
            *r -= l;
        }
        bands.push(low);
    }
    bands.push(rest);
    bands
}

/// Multiband compression followed by limiting.
///
/// # Example
///
/// ```rust
/// use lustre_core::{Effect, SampleBuffer};
/// use lustre_effects::MasteringChain;
///
/// let samples: Vec<f32> = (0..4410).map(|i| 1.2 * (i as f32 * 0.07).sin()).collect();
/// let input = SampleBuffer::mono(44100, samples).unwrap();
/// let output = MasteringChain::default().apply(&input).unwrap();
/// assert!(output.peak() <= MasteringChain::default().ceiling);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MasteringChain {
    /// One to three strictly increasing crossover frequencies.
    pub crossovers_hz: Vec<f32>,
    /// Compressor threshold per band (`crossovers_hz.len() + 1` values).
    pub band_thresholds_db: Vec<f32>,
    /// Compressor ratio per band.
    pub band_ratios: Vec<f32>,
    /// Band compressor attack.
    pub attack_ms: f32,
    /// Band compressor release.
    pub release_ms: f32,
    /// Final limiter ceiling, linear.
    pub ceiling: f32,
    /// Final limiter look-ahead.
    pub lookahead_ms: f32,
}

impl Default for MasteringChain {
    fn default() -> Self {
        Self {
            crossovers_hz: vec![250.0, 4000.0],
            band_thresholds_db: vec![-15.0, -12.0, -10.0],
            band_ratios: vec![2.0, 3.0, 2.5],
            attack_ms: 3.0,
            release_ms: 100.0,
            ceiling: db_to_linear(-1.0),
            lookahead_ms: 5.0,
        }
    }
}

impl MasteringChain {
    fn band_compressor(&self, band: usize) -> Compressor {
        Compressor {
            threshold_db: self.band_thresholds_db[band],
            ratio: self.band_ratios[band],
            attack_ms: self.attack_ms,
            release_ms: self.release_ms,
            makeup_db: 0.0,
        }
    }

    fn limiter(&self) -> Limiter {
        Limiter {
            ceiling: self.ceiling,
            lookahead_ms: self.lookahead_ms,
            ..Limiter::default()
        }
    }

    /// Band buffers for `buffer`: `[band]`, each with every channel.
    pub fn split(&self, buffer: &SampleBuffer) -> Result<Vec<SampleBuffer>> {
        let per_channel: Vec<Vec<Vec<f32>>> = buffer
            .channels()
            .iter()
            .map(|c| split_bands(c, &self.crossovers_hz, buffer.sample_rate()))
            .collect();

        (0..=self.crossovers_hz.len())
            .map(|band| {
                let channels = per_channel.iter().map(|bands| bands[band].clone()).collect();
                buffer.with_channels(channels)
            })
            .collect()
    }
}

impl Effect for MasteringChain {
    fn name(&self) -> &'static str {
        STAGE
    }

    fn validate(&self, buffer: &SampleBuffer) -> Result<()> {
        let n = self.crossovers_hz.len();
        if !(1..=MAX_CROSSOVERS).contains(&n) {
            return Err(EngineError::invalid_parameter(
                STAGE,
                "crossovers_hz",
                format!("{:?}", self.crossovers_hz),
                format!("expected 1 to {MAX_CROSSOVERS} crossover frequencies"),
            ));
        }
        for (i, &freq) in self.crossovers_hz.iter().enumerate() {
            check_frequency(STAGE, &format!("crossovers_hz[{i}]"), freq, buffer.sample_rate())?;
        }
        if self.crossovers_hz.windows(2).any(|w| w[1] <= w[0]) {
            return Err(EngineError::invalid_parameter(
                STAGE,
                "crossovers_hz",
                format!("{:?}", self.crossovers_hz),
                "must be strictly increasing",
            ));
        }

        for (param, len) in [
            ("band_thresholds_db", self.band_thresholds_db.len()),
            ("band_ratios", self.band_ratios.len()),
        ] {
            if len != n + 1 {
                return Err(EngineError::invalid_parameter(
                    STAGE,
                    param,
                    format!("{len} values"),
                    format!("expected one per band ({})", n + 1),
                ));
            }
        }
        for (i, &t) in self.band_thresholds_db.iter().enumerate() {
            check_range(STAGE, &format!("band_thresholds_db[{i}]"), t, -80.0, 0.0)?;
        }
        for (i, &r) in self.band_ratios.iter().enumerate() {
            validate_ratio(STAGE, &format!("band_ratios[{i}]"), r)?;
        }

        check_range(STAGE, "attack_ms", self.attack_ms, 0.01, 1000.0)?;
        check_range(STAGE, "release_ms", self.release_ms, 1.0, 5000.0)?;
        validate_ceiling(STAGE, self.ceiling)?;
        check_range(STAGE, "lookahead_ms", self.lookahead_ms, 0.0, 100.0)
    }

    fn process(&self, buffer: &SampleBuffer) -> Result<SampleBuffer> {
        let bands = self.split(buffer)?;
        let compressed: Vec<SampleBuffer> = bands
            .par_iter()
            .enumerate()
            .map(|(i, band)| self.band_compressor(i).process(band))
            .collect::<Result<_>>()?;

        let mut sum = vec![vec![0.0_f32; buffer.len()]; buffer.num_channels()];
        for band in &compressed {
            for (acc, channel) in sum.iter_mut().zip(band.channels()) {
                for (a, x) in acc.iter_mut().zip(channel) {
                    *a += x;
                }
            }
        }
        tracing::debug!(bands = compressed.len(), "mastering: bands compressed");

        self.limiter().process(&buffer.with_channels(sum)?)
    }
}

impl Configurable for MasteringChain {
    const PARAMS: &'static [ParamDescriptor] = &[
        ParamDescriptor::list(
            "crossovers_hz",
            ParamUnit::Hertz,
            1.0,
            24000.0,
            &[250.0, 4000.0],
            "Band split frequencies (1 to 3, increasing)",
        ),
        ParamDescriptor::list(
            "band_thresholds_db",
            ParamUnit::Decibels,
            -80.0,
            0.0,
            &[-15.0, -12.0, -10.0],
            "Compressor threshold per band",
        ),
        ParamDescriptor::list(
            "band_ratios",
            ParamUnit::Ratio,
            1.0,
            f32::INFINITY,
            &[2.0, 3.0, 2.5],
            "Compressor ratio per band",
        ),
        ParamDescriptor::number(
            "attack_ms",
            ParamUnit::Milliseconds,
            0.01,
            1000.0,
            3.0,
            "Band compressor attack",
        ),
        ParamDescriptor::number(
            "release_ms",
            ParamUnit::Milliseconds,
            1.0,
            5000.0,
            100.0,
            "Band compressor release",
        ),
        ParamDescriptor::number(
            "ceiling",
            ParamUnit::None,
            0.0,
            1.0,
            0.89125,
            "Output ceiling (linear)",
        ),
        ParamDescriptor::number(
            "lookahead_ms",
            ParamUnit::Milliseconds,
            0.0,
            100.0,
            5.0,
            "Limiter look-ahead",
        ),
    ];

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        match name {
            "crossovers_hz" => self.crossovers_hz = value.as_list(STAGE, name)?,
            "band_thresholds_db" => self.band_thresholds_db = value.as_list(STAGE, name)?,
            "band_ratios" => self.band_ratios = value.as_list(STAGE, name)?,
            "attack_ms" => self.attack_ms = value.as_number(STAGE, name)?,
            "release_ms" => self.release_ms = value.as_number(STAGE, name)?,
            "ceiling" => self.ceiling = value.as_number(STAGE, name)?,
            "lookahead_ms" => self.lookahead_ms = value.as_number(STAGE, name)?,
            _ => return Err(unknown_param(STAGE, name, value)),
        }
        Ok(())
    }
}
