//! Mathematical utility functions for DSP.
//!
//! # Level Conversions
//!
//! - [`db_to_linear`] / [`linear_to_db`] - Convert between dB and linear gain
//!
//! # Utilities
//!
//! - [`ms_to_samples`] - Time conversion
//! - [`wet_dry_mix`] - Crossfade between dry and processed signal
//! - [`is_power_of_two`] - Transform size check

use libm::{expf, logf};

/// Level reported for silence, in dB.
pub const SILENCE_DB: f32 = -200.0;

/// Convert decibels to linear gain.
///
/// # Example
/// ```rust
/// use lustre_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels.
///
/// Inputs at or below `1e-10` map to -200 dB.
///
/// # Example
/// ```rust
/// use lustre_core::linear_to_db;
///
/// assert!((linear_to_db(1.0) - 0.0).abs() < 0.001);
/// assert!((linear_to_db(0.5) - (-6.02)).abs() < 0.01);
/// ```
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    // 20 * log10(linear) = 20 * ln(linear) / ln(10)
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Convert milliseconds to a whole number of samples (rounded).
#[inline]
pub fn ms_to_samples(ms: f32, sample_rate: u32) -> usize {
    (ms * sample_rate as f32 / 1000.0).round().max(0.0) as usize
}

/// One-pole smoothing coefficient for a time constant in milliseconds.
///
/// `coeff = exp(-1 / (time_ms * sample_rate / 1000))`
#[inline]
pub fn time_constant_coeff(time_ms: f32, sample_rate: u32) -> f32 {
    let samples = time_ms * sample_rate as f32 / 1000.0;
    if samples <= 0.0 {
        0.0
    } else {
        expf(-1.0 / samples)
    }
}

/// Blend dry and wet samples: `dry * (1 - mix) + wet * mix`.
#[inline]
pub fn wet_dry_mix(dry: f32, wet: f32, mix: f32) -> f32 {
    dry * (1.0 - mix) + wet * mix
}

/// Whether `n` is a non-zero power of two.
#[inline]
pub fn is_power_of_two(n: usize) -> bool {
    n != 0 && n & (n - 1) == 0
}
