//! Lustre Core - buffers, spectral engine and DSP primitives
//!
//! This crate provides the foundation every other lustre crate builds on:
//! an owned sample buffer, a uniform effect contract, and the
//! time-frequency transform used by noise reduction and analysis.
//!
//! # Core Abstractions
//!
//! ## Buffers & Errors
//!
//! - [`SampleBuffer`] - Planar mono/stereo samples at a fixed sample rate
//! - [`EngineError`] / [`ErrorKind`] - Failures naming stage, parameter and value
//!
//! ## Effect System
//!
//! - [`Effect`] - Object-safe trait: `apply(&SampleBuffer) -> SampleBuffer`
//! - [`EffectExt`] / [`Chain`] - Static series composition
//!
//! ## Spectral Engine
//!
//! - [`SpectralEngine`] - Hann-windowed STFT with exact overlap-add inverse
//! - [`Fft`] / [`Window`] - Planned FFTs and window functions
//!
//! ## Filters & Dynamics
//!
//! - [`Biquad`] - Second-order IIR filter with RBJ cookbook coefficients
//! - [`EnvelopeFollower`] - Attack/release amplitude detection
//!
//! ## Utilities
//!
//! - Math functions: [`db_to_linear`], [`linear_to_db`], [`ms_to_samples`], etc.
//! - [`resample`] - Rational polyphase sample-rate conversion
//!
//! # Example
//!
//! ```rust
//! use lustre_core::{SampleBuffer, SpectralEngine};
//!
//! let buffer = SampleBuffer::mono(44100, vec![0.25; 4096]).unwrap();
//! let engine = SpectralEngine::new(2048, 512).unwrap();
//! let frames = engine.forward(&buffer).unwrap();
//! assert_eq!(frames.num_bins(), 1025);
//! ```
//!
//! # Design Principles
//!
//! - **Immutable inputs**: effects return new buffers, never mutate their input
//! - **Fail fast**: parameters are validated before any sample is processed
//! - **Object-safe traits**: `Box<dyn Effect>` for runtime-configured chains

pub mod biquad;
pub mod buffer;
pub mod effect;
pub mod envelope;
pub mod error;
pub mod fft;
pub mod math;
pub mod resample;
pub mod stft;

// Re-export main types at crate root
pub use biquad::{
    Biquad, Coefficients, high_shelf_coefficients, highpass_coefficients, low_shelf_coefficients,
    lowpass_coefficients, peaking_eq_coefficients,
};
pub use buffer::{MAX_CHANNELS, SampleBuffer};
pub use effect::{Chain, Effect, EffectExt};
pub use envelope::{DetectionMode, EnvelopeFollower};
pub use error::{EngineError, ErrorKind, Result, check_frequency, check_range};
pub use fft::{Fft, Window};
pub use math::{
    SILENCE_DB, db_to_linear, is_power_of_two, linear_to_db, ms_to_samples, time_constant_coeff,
    wet_dry_mix,
};
pub use rustfft::num_complex::Complex;
pub use stft::{
    ChannelFrames, SpectralEngine, SpectralFrames, forward_transform, inverse_transform,
};
