//! Biquad (bi-quadratic) filter structure.
//!
//! Provides a generic second-order IIR filter plus the coefficient
//! functions the equalizer and the mastering crossovers need.
//!
//! Coefficient calculation uses the RBJ Audio EQ Cookbook formulas.

use core::f32::consts::PI;
use libm::{cosf, powf, sinf, sqrtf};

/// Unnormalized biquad coefficients `(b0, b1, b2, a0, a1, a2)`.
pub type Coefficients = (f32, f32, f32, f32, f32, f32);

/// Generic biquad filter coefficients and state.
///
/// Implements the Direct Form I biquad structure:
/// ```text
/// y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2]
///                - a1*y[n-1] - a2*y[n-2]
/// ```
#[derive(Debug, Clone)]
pub struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,

    /// Input delay line: x[n-1], x[n-2]
    x1: f32,
    x2: f32,

    /// Output delay line: y[n-1], y[n-2]
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// Creates a new biquad with passthrough coefficients.
    pub fn new() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Creates a biquad from a coefficient tuple.
    pub fn with_coefficients(coeffs: Coefficients) -> Self {
        let mut biquad = Self::new();
        let (b0, b1, b2, a0, a1, a2) = coeffs;
        biquad.set_coefficients(b0, b1, b2, a0, a1, a2);
        biquad
    }

    /// Sets the biquad coefficients, normalizing by `a0`.
    pub fn set_coefficients(&mut self, b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) {
        let a0_inv = 1.0 / a0;
        self.b0 = b0 * a0_inv;
        self.b1 = b1 * a0_inv;
        self.b2 = b2 * a0_inv;
        self.a1 = a1 * a0_inv;
        self.a2 = a2 * a0_inv;
    }

    /// Processes a single sample through the biquad filter.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }

    /// Filters a whole slice from the current state, returning the output.
    pub fn process_slice(&mut self, input: &[f32]) -> Vec<f32> {
        input.iter().map(|&x| self.process(x)).collect()
    }

    /// Clears the filter state (delay lines).
    pub fn clear(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared intermediate terms: `(cos ω, α)`.
fn omega_terms(frequency: f32, q: f32, sample_rate: f32) -> (f32, f32) {
    let omega = 2.0 * PI * frequency / sample_rate;
    (cosf(omega), sinf(omega) / (2.0 * q))
}

/// Low-pass filter coefficients (RBJ).
///
/// `q` of 0.707 gives a Butterworth response.
pub fn lowpass_coefficients(frequency: f32, q: f32, sample_rate: f32) -> Coefficients {
    let (cos_omega, alpha) = omega_terms(frequency, q, sample_rate);

    let b0 = (1.0 - cos_omega) / 2.0;
    let b1 = 1.0 - cos_omega;
    let b2 = (1.0 - cos_omega) / 2.0;
    let a0 = 1.0 + alpha;
    let a1 = -2.0 * cos_omega;
    let a2 = 1.0 - alpha;

    (b0, b1, b2, a0, a1, a2)
}

/// High-pass filter coefficients (RBJ).
pub fn highpass_coefficients(frequency: f32, q: f32, sample_rate: f32) -> Coefficients {
    let (cos_omega, alpha) = omega_terms(frequency, q, sample_rate);

    let b0 = (1.0 + cos_omega) / 2.0;
    let b1 = -(1.0 + cos_omega);
    let b2 = (1.0 + cos_omega) / 2.0;
    let a0 = 1.0 + alpha;
    let a1 = -2.0 * cos_omega;
    let a2 = 1.0 - alpha;

    (b0, b1, b2, a0, a1, a2)
}

/// Peaking EQ coefficients (RBJ).
///
/// Boosts or cuts by `gain_db` around `frequency` with bandwidth `frequency / q`.
pub fn peaking_eq_coefficients(
    frequency: f32,
    q: f32,
    gain_db: f32,
    sample_rate: f32,
) -> Coefficients {
    let a = powf(10.0, gain_db / 40.0); // sqrt(10^(dB/20))
    let (cos_omega, alpha) = omega_terms(frequency, q, sample_rate);

    let b0 = 1.0 + alpha * a;
    let b1 = -2.0 * cos_omega;
    let b2 = 1.0 - alpha * a;
    let a0 = 1.0 + alpha / a;
    let a1 = -2.0 * cos_omega;
    let a2 = 1.0 - alpha / a;

    (b0, b1, b2, a0, a1, a2)
}

/// Low-shelf coefficients (RBJ).
///
/// Frequencies below `frequency` are raised or lowered by `gain_db`.
pub fn low_shelf_coefficients(
    frequency: f32,
    q: f32,
    gain_db: f32,
    sample_rate: f32,
) -> Coefficients {
    let a = powf(10.0, gain_db / 40.0);
    let (cos_omega, alpha) = omega_terms(frequency, q, sample_rate);
    let two_sqrt_a_alpha = 2.0 * sqrtf(a) * alpha;

    let b0 = a * ((a + 1.0) - (a - 1.0) * cos_omega + two_sqrt_a_alpha);
    let b1 = 2.0 * a * ((a - 1.0) - (a + 1.0) * cos_omega);
    let b2 = a * ((a + 1.0) - (a - 1.0) * cos_omega - two_sqrt_a_alpha);
    let a0 = (a + 1.0) + (a - 1.0) * cos_omega + two_sqrt_a_alpha;
    let a1 = -2.0 * ((a - 1.0) + (a + 1.0) * cos_omega);
    let a2 = (a + 1.0) + (a - 1.0) * cos_omega - two_sqrt_a_alpha;

    (b0, b1, b2, a0, a1, a2)
}

/// High-shelf coefficients (RBJ).
///
/// Frequencies above `frequency` are raised or lowered by `gain_db`.
pub fn high_shelf_coefficients(
    frequency: f32,
    q: f32,
    gain_db: f32,
    sample_rate: f32,
) -> Coefficients {
    let a = powf(10.0, gain_db / 40.0);
    let (cos_omega, alpha) = omega_terms(frequency, q, sample_rate);
    let two_sqrt_a_alpha = 2.0 * sqrtf(a) * alpha;

    let b0 = a * ((a + 1.0) + (a - 1.0) * cos_omega + two_sqrt_a_alpha);
    let b1 = -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_omega);
    let b2 = a * ((a + 1.0) + (a - 1.0) * cos_omega - two_sqrt_a_alpha);
    let a0 = (a + 1.0) - (a - 1.0) * cos_omega + two_sqrt_a_alpha;
    let a1 = 2.0 * ((a - 1.0) - (a + 1.0) * cos_omega);
    let a2 = (a + 1.0) - (a - 1.0) * cos_omega - two_sqrt_a_alpha;

    (b0, b1, b2, a0, a1, a2)
}
