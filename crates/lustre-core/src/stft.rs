//! Short-time Fourier transform with exact overlap-add reconstruction.
//!
//! [`SpectralEngine`] frames a signal with a Hann window, transforms every
//! frame, and inverts by weighted overlap-add:
//!
//! ```text
//! y[n] = Σ_k w[n - kH] · ifft(X_k)[n - kH]  /  Σ_k w²[n - kH]
//! ```
//!
//! The window is applied on both analysis and synthesis, and the
//! normalization by `Σ w²` makes `inverse(forward(x)) == x` (to float
//! precision) for any hop `H ≤ N`, not only the COLA hops. The signal is
//! padded by `N - H` zeros on both sides so the first and last samples get
//! the same frame overlap as the interior.
//!
//! ```rust
//! use lustre_core::{SampleBuffer, SpectralEngine};
//!
//! let samples: Vec<f32> = (0..4096).map(|i| (i as f32 * 0.01).sin()).collect();
//! let buffer = SampleBuffer::mono(44100, samples).unwrap();
//!
//! let engine = SpectralEngine::new(1024, 256).unwrap();
//! let frames = engine.forward(&buffer).unwrap();
//! let back = engine.inverse(&frames).unwrap();
//!
//! for (a, b) in buffer.channel(0).unwrap().iter().zip(back.channel(0).unwrap()) {
//!     assert!((a - b).abs() < 1e-4);
//! }
//! ```

use crate::buffer::SampleBuffer;
use crate::error::{EngineError, Result};
use crate::fft::{Fft, Window};
use crate::math::is_power_of_two;
use rustfft::num_complex::Complex;

const STAGE: &str = "stft";

/// Complex STFT frames of one channel: `[frame][bin]`.
pub type ChannelFrames = Vec<Vec<Complex<f32>>>;

/// Result of a forward transform: per-channel frames plus everything the
/// inverse needs to rebuild a buffer of the original shape.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralFrames {
    /// Frames per channel, `[channel][frame][bin]`.
    pub channels: Vec<ChannelFrames>,
    /// Window (FFT) size used.
    pub window_size: usize,
    /// Hop size used.
    pub hop_size: usize,
    /// Sample rate of the source buffer.
    pub sample_rate: u32,
    /// Number of samples per channel in the source buffer.
    pub signal_len: usize,
}

impl SpectralFrames {
    /// Number of frames per channel.
    pub fn num_frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Number of frequency bins per frame (`window_size / 2 + 1`).
    pub fn num_bins(&self) -> usize {
        self.window_size / 2 + 1
    }

    /// Frequency in Hz of a bin.
    pub fn bin_to_freq(&self, bin: usize) -> f32 {
        bin as f32 * self.sample_rate as f32 / self.window_size as f32
    }

    /// Magnitudes of one channel, `[frame][bin]`.
    pub fn magnitudes(&self, channel: usize) -> Vec<Vec<f32>> {
        self.channels
            .get(channel)
            .map(|frames| {
                frames
                    .iter()
                    .map(|frame| frame.iter().map(|c| c.norm()).collect())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Forward/inverse STFT with a fixed window and hop.
#[derive(Debug, Clone)]
pub struct SpectralEngine {
    window_size: usize,
    hop_size: usize,
    window: Vec<f32>,
    fft: Fft,
}

impl SpectralEngine {
    /// Create an engine.
    ///
    /// `window_size` must be a power of two ≥ 2; `hop_size` must be in
    /// `1..=window_size`.
    pub fn new(window_size: usize, hop_size: usize) -> Result<Self> {
        if window_size < 2 || !is_power_of_two(window_size) {
            return Err(EngineError::invalid_parameter(
                STAGE,
                "window_size",
                window_size,
                "must be a power of two >= 2",
            ));
        }
        if hop_size == 0 || hop_size > window_size {
            return Err(EngineError::invalid_parameter(
                STAGE,
                "hop_size",
                hop_size,
                format!("must be in 1..={window_size}"),
            ));
        }

        Ok(Self {
            window_size,
            hop_size,
            window: Window::HannShifted.coefficients(window_size),
            fft: Fft::new(window_size),
        })
        .inspect(|_| {
            #[cfg(feature = "tracing")]
            tracing::trace!(window_size, hop_size, "stft: engine planned");
        })
    }

    /// Window size in samples.
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Hop size in samples.
    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    fn padding(&self) -> usize {
        self.window_size - self.hop_size
    }

    fn frame_count(&self, signal_len: usize) -> usize {
        let padded = signal_len + 2 * self.padding();
        if padded <= self.window_size {
            1
        } else {
            (padded - self.window_size).div_ceil(self.hop_size) + 1
        }
    }

    /// Transform one channel of samples into frames.
    pub fn forward_channel(&self, samples: &[f32]) -> ChannelFrames {
        let pad = self.padding();
        let num_frames = self.frame_count(samples.len());
        let total = (num_frames - 1) * self.hop_size + self.window_size;

        let mut padded = vec![0.0f32; total];
        padded[pad..pad + samples.len()].copy_from_slice(samples);

        let mut frame = vec![0.0f32; self.window_size];
        (0..num_frames)
            .map(|k| {
                let start = k * self.hop_size;
                for (i, out) in frame.iter_mut().enumerate() {
                    *out = padded[start + i] * self.window[i];
                }
                self.fft.forward(&frame)
            })
            .collect()
    }

    /// Rebuild `signal_len` samples of one channel from frames.
    pub fn inverse_channel(&self, frames: &[Vec<Complex<f32>>], signal_len: usize) -> Vec<f32> {
        let pad = self.padding();
        let total = frames.len().saturating_sub(1) * self.hop_size + self.window_size;
        let mut output = vec![0.0f32; total.max(pad + signal_len)];
        let mut norm = vec![0.0f32; output.len()];

        for (k, spectrum) in frames.iter().enumerate() {
            let start = k * self.hop_size;
            let time = self.fft.inverse(spectrum);
            for (i, (&x, &w)) in time.iter().zip(self.window.iter()).enumerate() {
                output[start + i] += x * w;
                norm[start + i] += w * w;
            }
        }

        output
            .iter()
            .zip(norm.iter())
            .skip(pad)
            .take(signal_len)
            .map(|(&y, &n)| if n > f32::MIN_POSITIVE { y / n } else { 0.0 })
            .collect()
    }

    /// Forward transform of every channel of `buffer`.
    pub fn forward(&self, buffer: &SampleBuffer) -> Result<SpectralFrames> {
        if buffer.is_empty() {
            return Err(EngineError::empty_input(STAGE));
        }

        let channels = buffer
            .channels()
            .iter()
            .map(|c| self.forward_channel(c))
            .collect();

        Ok(SpectralFrames {
            channels,
            window_size: self.window_size,
            hop_size: self.hop_size,
            sample_rate: buffer.sample_rate(),
            signal_len: buffer.len(),
        })
    }

    /// Inverse transform back to a buffer.
    ///
    /// Fails if `frames` were produced with a different window or hop, or
    /// if their frame/bin counts do not match the recorded signal length.
    pub fn inverse(&self, frames: &SpectralFrames) -> Result<SampleBuffer> {
        if frames.window_size != self.window_size {
            return Err(EngineError::invalid_parameter(
                STAGE,
                "window_size",
                frames.window_size,
                format!(
                    "frames were computed with {}, engine uses {}",
                    frames.window_size, self.window_size
                ),
            ));
        }
        if frames.hop_size != self.hop_size {
            return Err(EngineError::invalid_parameter(
                STAGE,
                "hop_size",
                frames.hop_size,
                format!(
                    "frames were computed with {}, engine uses {}",
                    frames.hop_size, self.hop_size
                ),
            ));
        }

        let expected_frames = self.frame_count(frames.signal_len);
        let bins = self.window_size / 2 + 1;
        for channel in &frames.channels {
            if channel.len() != expected_frames || channel.iter().any(|f| f.len() != bins) {
                return Err(EngineError::incompatible_buffer(
                    STAGE,
                    format!(
                        "expected {expected_frames} frames of {bins} bins for {} samples",
                        frames.signal_len
                    ),
                ));
            }
        }

        let channels = frames
            .channels
            .iter()
            .map(|c| self.inverse_channel(c, frames.signal_len))
            .collect();
        SampleBuffer::new(frames.sample_rate, channels)
    }
}

/// Forward transform of `buffer` with the given window and hop.
pub fn forward_transform(
    buffer: &SampleBuffer,
    window_size: usize,
    hop_size: usize,
) -> Result<SpectralFrames> {
    SpectralEngine::new(window_size, hop_size)?.forward(buffer)
}

/// Inverse transform of `frames` with the given window and hop.
pub fn inverse_transform(
    frames: &SpectralFrames,
    window_size: usize,
    hop_size: usize,
) -> Result<SampleBuffer> {
    SpectralEngine::new(window_size, hop_size)?.inverse(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn chirp(len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| {
                let t = i as f32 / 44100.0;
                0.6 * (2.0 * core::f32::consts::PI * (200.0 + 2000.0 * t) * t).sin()
            })
            .collect()
    }

    fn assert_close(a: &[f32], b: &[f32], tol: f32) {
        assert_eq!(a.len(), b.len());
        for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
            assert!((x - y).abs() < tol, "sample {i}: {x} vs {y}");
        }
    }

    #[test]
    fn rejects_non_power_of_two_window() {
        let err = SpectralEngine::new(1000, 250).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        assert_eq!(err.param(), Some("window_size"));
    }

    #[test]
    fn rejects_hop_larger_than_window() {
        assert!(SpectralEngine::new(512, 513).is_err());
        assert!(SpectralEngine::new(512, 0).is_err());
        assert!(SpectralEngine::new(512, 512).is_ok());
    }

    #[test]
    fn roundtrip_at_common_hops() {
        let x = chirp(10_000);
        let buffer = SampleBuffer::mono(44100, x.clone()).unwrap();
        for hop in [128, 256, 512] {
            let engine = SpectralEngine::new(1024, hop).unwrap();
            let back = engine.inverse(&engine.forward(&buffer).unwrap()).unwrap();
            assert_close(&x, back.channel(0).unwrap(), 1e-4);
        }
    }

    #[test]
    fn roundtrip_short_signal_and_odd_hop() {
        let x = chirp(37);
        let buffer = SampleBuffer::mono(44100, x.clone()).unwrap();
        let engine = SpectralEngine::new(256, 100).unwrap();
        let back = engine.inverse(&engine.forward(&buffer).unwrap()).unwrap();
        assert_close(&x, back.channel(0).unwrap(), 1e-4);
    }

    #[test]
    fn roundtrip_stereo_keeps_channels_apart() {
        let left = chirp(3000);
        let right: Vec<f32> = left.iter().map(|x| -0.5 * x).collect();
        let buffer = SampleBuffer::stereo(48000, left.clone(), right.clone()).unwrap();
        let frames = forward_transform(&buffer, 512, 128).unwrap();
        assert_eq!(frames.channels.len(), 2);
        assert_eq!(frames.num_bins(), 257);
        let back = inverse_transform(&frames, 512, 128).unwrap();
        assert_eq!(back.sample_rate(), 48000);
        assert_close(&left, back.channel(0).unwrap(), 1e-4);
        assert_close(&right, back.channel(1).unwrap(), 1e-4);
    }

    #[test]
    fn inverse_rejects_mismatched_parameters() {
        let buffer = SampleBuffer::mono(44100, chirp(2048)).unwrap();
        let frames = forward_transform(&buffer, 512, 128).unwrap();
        let err = inverse_transform(&frames, 1024, 128).unwrap_err();
        assert_eq!(err.param(), Some("window_size"));
        let err = inverse_transform(&frames, 512, 256).unwrap_err();
        assert_eq!(err.param(), Some("hop_size"));
    }

    #[test]
    fn inverse_rejects_truncated_frames() {
        let buffer = SampleBuffer::mono(44100, chirp(2048)).unwrap();
        let mut frames = forward_transform(&buffer, 512, 128).unwrap();
        frames.channels[0].pop();
        let err = inverse_transform(&frames, 512, 128).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IncompatibleBuffer);
    }

    #[test]
    fn forward_rejects_empty_buffer() {
        let buffer = SampleBuffer::mono(44100, Vec::new()).unwrap();
        let err = forward_transform(&buffer, 512, 128).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyInput);
    }

    #[test]
    fn sine_energy_lands_in_expected_bin() {
        let sr = 8192;
        let x: Vec<f32> = (0..8192)
            .map(|i| (2.0 * core::f32::consts::PI * 1024.0 * i as f32 / sr as f32).sin())
            .collect();
        let buffer = SampleBuffer::mono(sr, x).unwrap();
        let frames = forward_transform(&buffer, 256, 64).unwrap();
        let mags = frames.magnitudes(0);
        let mid = &mags[mags.len() / 2];
        let peak_bin = mid
            .iter()
            .enumerate()
            .fold((0, 0.0_f32), |acc, (i, &m)| if m > acc.1 { (i, m) } else { acc })
            .0;
        assert!((frames.bin_to_freq(peak_bin) - 1024.0).abs() < 40.0);
    }
}
