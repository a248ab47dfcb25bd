//! Planned real/complex FFTs and analysis windows.

use rustfft::num_complex::Complex;
use rustfft::{Fft as RustFft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

const ZERO: Complex<f32> = Complex::new(0.0, 0.0);

/// Analysis window shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// All ones.
    Rectangular,
    /// Periodic Hann, `0.5 (1 - cos(2πn / N))`. Zero at `n = 0`.
    Hann,
    /// Hann sampled at half-sample offsets, never exactly zero.
    ///
    /// `w[n] = sin²(π (n + 0.5) / N)`. Same shape and overlap-add behavior
    /// as [`Window::Hann`], but every sample of a frame carries some
    /// weight, so weighted overlap-add reconstructs every input sample.
    HannShifted,
}

impl Window {
    /// Weight of sample `n` in a window of length `len`.
    pub fn weight(self, n: usize, len: usize) -> f32 {
        let len = len as f32;
        let n = n as f32;
        match self {
            Window::Rectangular => 1.0,
            Window::Hann => 0.5 - 0.5 * (2.0 * PI * n / len).cos(),
            Window::HannShifted => {
                let s = (PI * (n + 0.5) / len).sin();
                s * s
            }
        }
    }

    /// The `len` weights of this window.
    pub fn coefficients(self, len: usize) -> Vec<f32> {
        (0..len).map(|n| self.weight(n, len)).collect()
    }

    /// Multiply `frame` by the window in place.
    pub fn apply(self, frame: &mut [f32]) {
        let len = frame.len();
        for (n, x) in frame.iter_mut().enumerate() {
            *x *= self.weight(n, len);
        }
    }
}

/// Forward/inverse plans of one fixed size.
///
/// Plans are reference counted, so an `Fft` is cheap to clone and can be
/// shared across threads.
#[derive(Clone)]
pub struct Fft {
    forward_plan: Arc<dyn RustFft<f32>>,
    inverse_plan: Arc<dyn RustFft<f32>>,
    len: usize,
}

impl core::fmt::Debug for Fft {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Fft").field("len", &self.len).finish()
    }
}

impl Fft {
    /// Plan both directions for transforms of `len` points.
    pub fn new(len: usize) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        Self {
            forward_plan: planner.plan_fft_forward(len),
            inverse_plan: planner.plan_fft_inverse(len),
            len,
        }
    }

    /// Transform length.
    pub fn size(&self) -> usize {
        self.len
    }

    /// Number of non-negative frequency bins, `len / 2 + 1`.
    pub fn bins(&self) -> usize {
        self.len / 2 + 1
    }

    /// Half spectrum (DC through Nyquist) of a real signal.
    ///
    /// `input` is zero-padded or cut to the transform length.
    pub fn forward(&self, input: &[f32]) -> Vec<Complex<f32>> {
        let mut work = vec![ZERO; self.len];
        for (slot, &x) in work.iter_mut().zip(input) {
            slot.re = x;
        }
        self.forward_plan.process(&mut work);
        work.truncate(self.bins());
        work
    }

    /// Unnormalized forward transform of complex data in place.
    pub fn forward_complex(&self, data: &mut [Complex<f32>]) {
        self.forward_plan.process(data);
    }

    /// Real signal of `len` samples from a half spectrum.
    ///
    /// Negative frequencies are mirrored from the positive ones by
    /// conjugate symmetry; the result is scaled by `1 / len`.
    pub fn inverse(&self, half: &[Complex<f32>]) -> Vec<f32> {
        let mut work = vec![ZERO; self.len];
        let nyquist = self.len / 2;
        for (k, &bin) in half.iter().enumerate().take(nyquist + 1) {
            work[k] = bin;
            if k > 0 && k < nyquist {
                work[self.len - k] = bin.conj();
            }
        }
        self.inverse_plan.process(&mut work);

        let norm = (self.len as f32).recip();
        work.into_iter().map(|c| c.re * norm).collect()
    }

    /// Inverse transform of complex data in place, scaled by `1 / len`.
    pub fn inverse_complex(&self, data: &mut [Complex<f32>]) {
        self.inverse_plan.process(data);
        let norm = (self.len as f32).recip();
        data.iter_mut().for_each(|c| *c *= norm);
    }
}
