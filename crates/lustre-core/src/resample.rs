//! Rational P/Q sample-rate conversion.
//!
//! Polyphase FIR resampling with a windowed-sinc (Blackman) prototype
//! lowpass. The prototype's group delay is compensated so output sample `m`
//! lines up with input time `m * Q / P`.
//!
//! ```rust
//! use lustre_core::resample::resample;
//!
//! // 48 kHz -> 32 kHz
//! let signal = vec![0.0_f32; 4800];
//! let out = resample(&signal, 32000, 48000);
//! assert_eq!(out.len(), 3200);
//! ```

use core::f32::consts::PI;

/// Windowed-sinc lowpass FIR, normalized to unity DC gain.
///
/// `cutoff` is normalized to Nyquist (0.0..1.0).
pub fn design_lowpass(num_taps: usize, cutoff: f32) -> Vec<f32> {
    if num_taps == 0 {
        return Vec::new();
    }

    let m = num_taps - 1;
    let mut coeffs: Vec<f32> = (0..num_taps)
        .map(|n| {
            let x = n as f32 - m as f32 / 2.0;
            let sinc = if x.abs() < 1e-7 {
                cutoff
            } else {
                (PI * cutoff * x).sin() / (PI * x)
            };
            // Blackman: 0.42 - 0.5 cos(2πn/M) + 0.08 cos(4πn/M)
            let window = if m == 0 {
                1.0
            } else {
                let phase = 2.0 * PI * n as f32 / m as f32;
                0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos()
            };
            sinc * window
        })
        .collect();

    let sum: f32 = coeffs.iter().sum();
    if sum.abs() > 1e-10 {
        for c in &mut coeffs {
            *c /= sum;
        }
    }
    coeffs
}

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

/// Resample `signal` by the rational factor `p / q`.
///
/// Output length is `ceil(len * p / q)`. With `p == q` the input is
/// returned unchanged.
pub fn resample(signal: &[f32], p: usize, q: usize) -> Vec<f32> {
    let g = gcd(p.max(1), q.max(1));
    let p = p.max(1) / g;
    let q = q.max(1) / g;

    if p == q {
        return signal.to_vec();
    }

    // ~60 dB stopband for typical audio ratios
    let num_taps = 20 * p.max(q) + 1;
    let cutoff = 0.9 / p.max(q) as f32;
    let prototype = design_lowpass(num_taps, cutoff);

    let taps_per_phase = num_taps.div_ceil(p);
    let mut polyphase = vec![vec![0.0f32; taps_per_phase]; p];
    for (tap, &coeff) in prototype.iter().enumerate() {
        polyphase[tap % p][tap / p] = coeff;
    }

    let delay = (num_taps - 1) / 2;
    let out_len = (signal.len() * p).div_ceil(q);
    let gain = p as f32;

    (0..out_len)
        .map(|m| {
            let t = m * q + delay;
            let n = t / p;
            let sub_filter = &polyphase[t % p];
            let mut acc = 0.0f32;
            for (i, &coeff) in sub_filter.iter().enumerate() {
                if n >= i
                    && let Some(&x) = signal.get(n - i)
                {
                    acc += coeff * x;
                }
            }
            acc * gain
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn lowpass_has_unity_dc_gain() {
        let h = design_lowpass(101, 0.25);
        let sum: f32 = h.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);
    }

    #[test]
    fn identity_ratio_is_passthrough() {
        let x = sine(440.0, 48000.0, 256);
        assert_eq!(resample(&x, 3, 3), x);
    }

    #[test]
    fn downsampled_sine_keeps_amplitude_and_phase() {
        let x = sine(440.0, 48000.0, 9600);
        let y = resample(&x, 2, 3);
        assert_eq!(y.len(), 6400);

        let expected = sine(440.0, 32000.0, 6400);
        // Skip the filter warm-up at both ends
        for i in 400..6000 {
            assert!(
                (y[i] - expected[i]).abs() < 0.02,
                "sample {i}: {} vs {}",
                y[i],
                expected[i]
            );
        }
    }
}
