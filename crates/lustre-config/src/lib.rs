//! Configuration and effect chains for lustre.
//!
//! # Features
//!
//! - **Effect configuration**: [`EffectConfig`] maps effect names to
//!   [`EffectSettings`] and loads/saves TOML or JSON
//! - **Unit-aware values**: [`parse_param_value`] reads `"-6dB"`, `"250ms"`,
//!   `"4kHz"`, `"50%"` in whatever unit the parameter expects
//! - **Chains**: [`EffectChain`] applies enabled effects in canonical order,
//!   resolving the limiter/mastering overlap through [`LimiterPolicy`]
//!
//! # Example
//!
//! ```rust,no_run
//! use lustre_config::{EffectChain, EffectConfig};
//! use lustre_core::SampleBuffer;
//!
//! let config = EffectConfig::load("chain.toml").unwrap();
//! let chain = EffectChain::from_config(&config).unwrap();
//!
//! let input = SampleBuffer::mono(44100, vec![0.0; 44100]).unwrap();
//! let output = chain.process(&input).unwrap();
//! ```

mod chain;
mod effect_config;
mod error;
mod value;

pub use chain::{EffectChain, LimiterPolicy, canonical_order, process};
pub use effect_config::{EQ_INTENSITY_KEYS, EffectConfig, EffectSettings};
pub use error::ConfigError;
pub use value::{ConfigValue, parse_param_value};
