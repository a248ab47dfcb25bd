//! Lustre Effects - offline audio effect implementations
//!
//! Every effect implements [`lustre_core::Effect`]: it validates its
//! parameters against the input buffer, then returns a new buffer.
//!
//! - [`NoiseReduction`] - Spectral subtraction with automatic noise profiling
//! - [`Equalizer`] - Low/high shelves plus peaking bands
//! - [`Compressor`] - Feed-forward compressor with linked stereo detection
//! - [`Reverb`] - FFT convolution with a synthetic or supplied impulse response
//! - [`Delay`] - Feedback comb delay with optional ringing tail
//! - [`StereoWidener`] - Mid/side width control
//! - [`Limiter`] - Look-ahead brick-wall limiter
//! - [`MasteringChain`] - Linkwitz-Riley multiband compression into a limiter
//!
//! Effects are plain structs with public parameter fields. For runtime
//! configuration each one also implements [`Configurable`], and
//! [`EffectStage`] wraps any of them behind a single type.
//!
//! ## Example
//!
//! ```rust
//! use lustre_core::{Effect, EffectExt, SampleBuffer};
//! use lustre_effects::{Compressor, Limiter};
//!
//! let input = SampleBuffer::mono(48000, vec![0.8; 4800]).unwrap();
//! let chain = Compressor::default().chain(Limiter::with_ceiling(0.5));
//! let output = chain.apply(&input).unwrap();
//! assert!(output.peak() <= 0.5);
//! ```

pub mod compressor;
pub mod delay;
pub mod equalizer;
pub mod kind;
pub mod limiter;
pub mod mastering;
pub mod noise_reduction;
pub mod params;
pub mod reverb;
pub mod stereo_widener;

// Re-export main types at crate root
pub use compressor::Compressor;
pub use delay::Delay;
pub use equalizer::{EqBand, Equalizer};
pub use kind::{CANONICAL_ORDER, EffectKind, EffectStage};
pub use limiter::Limiter;
pub use mastering::{MasteringChain, split_bands};
pub use noise_reduction::{NoiseProfile, NoiseReduction};
pub use params::{
    Configurable, ParamDefault, ParamDescriptor, ParamUnit, ParamValue, unknown_param,
};
pub use reverb::{ImpulseResponse, Reverb, convolve};
pub use stereo_widener::{MAX_WIDTH, StereoWidener};
