//! Core Effect trait and related types.
//!
//! The [`Effect`] trait is the uniform contract of every transformation in
//! the engine: take a buffer, return a new buffer.
//!
//! ## Design Decisions
//!
//! - **Whole-buffer processing**: effects see the complete, finite buffer,
//!   so look-ahead, noise profiling and convolution need no streaming state.
//!
//! - **Never in place**: `apply` borrows its input and returns a fresh
//!   [`SampleBuffer`]. A buffer handed to a concurrent reader (for example
//!   the analyzer) can never be mutated underneath it.
//!
//! - **Validate first**: [`Effect::apply`] runs [`Effect::validate`] before
//!   any sample is touched, so a bad parameter fails fast with the stage
//!   and parameter named.

use crate::buffer::SampleBuffer;
use crate::error::{EngineError, Result};

/// Core trait for all audio effects.
///
/// Implementors provide [`name`](Effect::name) and
/// [`process`](Effect::process); [`validate`](Effect::validate) defaults to
/// accepting any buffer.
///
/// # Example
///
/// ```rust
/// use lustre_core::{Effect, Result, SampleBuffer};
///
/// struct Gain {
///     gain: f32,
/// }
///
/// impl Effect for Gain {
///     fn name(&self) -> &'static str {
///         "gain"
///     }
///
///     fn process(&self, buffer: &SampleBuffer) -> Result<SampleBuffer> {
///         buffer.map_channels(|c| c.iter().map(|x| x * self.gain).collect())
///     }
/// }
///
/// let input = SampleBuffer::mono(48000, vec![0.5; 16]).unwrap();
/// let output = Gain { gain: 2.0 }.apply(&input).unwrap();
/// assert_eq!(output.peak(), 1.0);
/// assert_eq!(input.peak(), 0.5);
/// ```
pub trait Effect: Send + Sync {
    /// Stage name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Check parameters against the buffer they are about to run on.
    ///
    /// Sample-rate-dependent checks (frequencies below Nyquist, delay
    /// lengths) belong here.
    fn validate(&self, _buffer: &SampleBuffer) -> Result<()> {
        Ok(())
    }

    /// Transform an already validated, non-empty buffer.
    fn process(&self, buffer: &SampleBuffer) -> Result<SampleBuffer>;

    /// Validate, then process.
    ///
    /// Empty buffers are rejected with [`EngineError::EmptyInput`].
    fn apply(&self, buffer: &SampleBuffer) -> Result<SampleBuffer> {
        if buffer.is_empty() {
            return Err(EngineError::empty_input(self.name()));
        }
        self.validate(buffer)?;
        self.process(buffer)
    }
}

impl<E: Effect + ?Sized> Effect for Box<E> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn validate(&self, buffer: &SampleBuffer) -> Result<()> {
        (**self).validate(buffer)
    }

    fn process(&self, buffer: &SampleBuffer) -> Result<SampleBuffer> {
        (**self).process(buffer)
    }

    fn apply(&self, buffer: &SampleBuffer) -> Result<SampleBuffer> {
        (**self).apply(buffer)
    }
}

/// Extension trait for chaining effects.
///
/// Provides a fluent interface for building effect chains with static dispatch.
pub trait EffectExt: Effect + Sized {
    /// Chain this effect with another; the output of `self` feeds `next`.
    ///
    /// ```rust,ignore
    /// let chain = equalizer.chain(compressor).chain(limiter);
    /// ```
    fn chain<E: Effect>(self, next: E) -> Chain<Self, E> {
        Chain {
            first: self,
            second: next,
        }
    }
}

impl<T: Effect> EffectExt for T {}

/// Two effects applied in series.
///
/// Both stages are validated against the input before either runs; effects
/// preserve sample rate and channel count, so the second stage's checks
/// hold for the first stage's output too.
#[derive(Debug, Clone)]
pub struct Chain<A, B> {
    first: A,
    second: B,
}

impl<A: Effect, B: Effect> Effect for Chain<A, B> {
    fn name(&self) -> &'static str {
        "chain"
    }

    fn validate(&self, buffer: &SampleBuffer) -> Result<()> {
        self.first.validate(buffer)?;
        self.second.validate(buffer)
    }

    fn process(&self, buffer: &SampleBuffer) -> Result<SampleBuffer> {
        let intermediate = self.first.process(buffer)?;
        self.second.process(&intermediate)
    }
}
