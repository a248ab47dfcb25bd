//! Owned PCM sample buffer.
//!
//! [`SampleBuffer`] is the interchange type of the engine: decoders produce
//! one, every effect consumes one and returns a new one, the analyzer reads
//! one. It holds one or two planar channels of `f32` samples at a fixed
//! sample rate.
//!
//! Invariants enforced at construction:
//!
//! - sample rate > 0, and immutable for the buffer's lifetime
//! - 1 or 2 channels
//! - all channels have the same length
//!
//! A zero-length buffer is valid; operations that need data report
//! [`EngineError::EmptyInput`].

use crate::error::{EngineError, Result};
use crate::resample;

const STAGE: &str = "buffer";

/// Maximum number of channels a buffer can hold.
pub const MAX_CHANNELS: usize = 2;

/// Planar mono or stereo sample buffer.
///
/// # Example
///
/// ```rust
/// use lustre_core::SampleBuffer;
///
/// let buffer = SampleBuffer::stereo(48000, vec![1.0; 1024], vec![0.5; 1024]).unwrap();
/// assert_eq!(buffer.len(), 1024);
/// assert_eq!(buffer.num_channels(), 2);
///
/// let mono = buffer.to_mono();
/// assert_eq!(mono[0], 0.75);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl SampleBuffer {
    /// Create a buffer from planar channel data.
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self> {
        if sample_rate == 0 {
            return Err(EngineError::invalid_parameter(
                STAGE,
                "sample_rate",
                sample_rate,
                "must be positive",
            ));
        }
        if channels.is_empty() || channels.len() > MAX_CHANNELS {
            return Err(EngineError::incompatible_buffer(
                STAGE,
                format!("expected 1 or 2 channels, got {}", channels.len()),
            ));
        }
        let len = channels[0].len();
        if let Some(bad) = channels.iter().position(|c| c.len() != len) {
            return Err(EngineError::incompatible_buffer(
                STAGE,
                format!(
                    "channel {bad} has {} samples, channel 0 has {len}",
                    channels[bad].len()
                ),
            ));
        }
        Ok(Self {
            sample_rate,
            channels,
        })
    }

    /// Create a mono buffer.
    pub fn mono(sample_rate: u32, samples: Vec<f32>) -> Result<Self> {
        Self::new(sample_rate, vec![samples])
    }

    /// Create a stereo buffer from left and right channels.
    pub fn stereo(sample_rate: u32, left: Vec<f32>, right: Vec<f32>) -> Result<Self> {
        Self::new(sample_rate, vec![left, right])
    }

    /// Create a buffer of `frames` zero samples per channel.
    pub fn silence(sample_rate: u32, num_channels: usize, frames: usize) -> Result<Self> {
        Self::new(sample_rate, vec![vec![0.0; frames]; num_channels])
    }

    /// Create a buffer from interleaved samples (L, R, L, R, ...).
    ///
    /// A trailing partial frame is dropped.
    pub fn from_interleaved(sample_rate: u32, num_channels: usize, data: &[f32]) -> Result<Self> {
        if num_channels == 0 || num_channels > MAX_CHANNELS {
            return Err(EngineError::incompatible_buffer(
                STAGE,
                format!("expected 1 or 2 channels, got {num_channels}"),
            ));
        }
        let frames = data.len() / num_channels;
        let mut channels = vec![Vec::with_capacity(frames); num_channels];
        for frame in data.chunks_exact(num_channels) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }
        Self::new(sample_rate, channels)
    }

    /// Build a new buffer at this buffer's sample rate.
    ///
    /// Used by effects to return their output without touching `self`.
    pub fn with_channels(&self, channels: Vec<Vec<f32>>) -> Result<Self> {
        Self::new(self.sample_rate, channels)
    }

    /// Apply `f` to every channel, producing a new buffer.
    pub fn map_channels<F>(&self, mut f: F) -> Result<Self>
    where
        F: FnMut(&[f32]) -> Vec<f32>,
    {
        let channels = self.channels.iter().map(|c| f(c)).collect();
        self.with_channels(channels)
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of channels (1 or 2).
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Number of sample frames (samples per channel).
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    /// Whether the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the buffer has one channel.
    pub fn is_mono(&self) -> bool {
        self.channels.len() == 1
    }

    /// Whether the buffer has two channels.
    pub fn is_stereo(&self) -> bool {
        self.channels.len() == 2
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.len() as f64 / f64::from(self.sample_rate)
    }

    /// Samples of one channel.
    ///
    /// Returns `None` if `index` is out of range.
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// All channels, planar.
    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Consume the buffer, returning its planar channels.
    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.channels
    }

    /// Mix down to mono by averaging channels.
    pub fn to_mono(&self) -> Vec<f32> {
        match self.channels.as_slice() {
            [mono] => mono.clone(),
            [left, right] => left
                .iter()
                .zip(right.iter())
                .map(|(l, r)| (l + r) * 0.5)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Convert to interleaved format (L, R, L, R, ...).
    pub fn to_interleaved(&self) -> Vec<f32> {
        let n = self.num_channels();
        let mut interleaved = Vec::with_capacity(self.len() * n);
        for i in 0..self.len() {
            for channel in &self.channels {
                interleaved.push(channel[i]);
            }
        }
        interleaved
    }

    /// Maximum absolute sample value across all channels.
    pub fn peak(&self) -> f32 {
        self.channels
            .iter()
            .flat_map(|c| c.iter())
            .fold(0.0_f32, |acc, &x| acc.max(x.abs()))
    }

    /// Resample to `target_rate`, returning a new buffer.
    ///
    /// Uses a polyphase windowed-sinc resampler per channel. Returns a copy
    /// when the rates already match.
    pub fn resample(&self, target_rate: u32) -> Result<Self> {
        if target_rate == 0 {
            return Err(EngineError::invalid_parameter(
                "resample",
                "target_rate",
                target_rate,
                "must be positive",
            ));
        }
        if target_rate == self.sample_rate {
            return Ok(self.clone());
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(from = self.sample_rate, to = target_rate, "resample");
        let channels = self
            .channels
            .iter()
            .map(|c| resample::resample(c, target_rate as usize, self.sample_rate as usize))
            .collect();
        Self::new(target_rate, channels)
    }
}
