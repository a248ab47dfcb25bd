//! Effect tags, canonical pipeline order, and the tagged stage variant.
//!
//! [`EffectKind`] names an effect; [`CANONICAL_ORDER`] fixes the order in
//! which enabled effects run regardless of how a configuration lists them.
//! [`EffectStage`] carries one configured effect and dispatches [`Effect`]
//! uniformly, so a chain is just a `Vec<EffectStage>`.

use crate::params::{Configurable, ParamDescriptor, ParamValue};
use crate::{
    Compressor, Delay, Equalizer, Limiter, MasteringChain, NoiseReduction, Reverb, StereoWidener,
};
use lustre_core::{Effect, EngineError, Result, SampleBuffer};
use std::fmt;
use std::str::FromStr;

/// Identifies one of the eight effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EffectKind {
    /// Spectral-subtraction denoiser.
    NoiseReduction,
    /// Shelving and peaking EQ.
    Equalizer,
    /// Dynamics compressor.
    Compressor,
    /// Convolution reverb.
    Reverb,
    /// Feedback delay.
    Delay,
    /// Mid/side widener.
    StereoWidener,
    /// Brick-wall limiter.
    Limiter,
    /// Multiband compression plus limiter.
    Mastering,
}

/// Order in which enabled effects are applied.
///
/// Corrective stages come first, spatial and time effects next, and the
/// peak-controlling stages last.
pub const CANONICAL_ORDER: [EffectKind; 8] = [
    EffectKind::NoiseReduction,
    EffectKind::Equalizer,
    EffectKind::Compressor,
    EffectKind::Reverb,
    EffectKind::Delay,
    EffectKind::StereoWidener,
    EffectKind::Limiter,
    EffectKind::Mastering,
];

impl EffectKind {
    /// Canonical configuration name.
    pub fn name(self) -> &'static str {
        match self {
            EffectKind::NoiseReduction => "noise_reduction",
            EffectKind::Equalizer => "equalizer",
            EffectKind::Compressor => "compressor",
            EffectKind::Reverb => "reverb",
            EffectKind::Delay => "delay",
            EffectKind::StereoWidener => "stereo_widener",
            EffectKind::Limiter => "limiter",
            EffectKind::Mastering => "mastering",
        }
    }

    /// Alternative names accepted in configurations.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            EffectKind::NoiseReduction => &["denoise", "nr"],
            EffectKind::Equalizer => &["eq", "eq_adjustment"],
            EffectKind::Compressor => &["compression"],
            EffectKind::Reverb => &[],
            EffectKind::Delay => &["echo"],
            EffectKind::StereoWidener => &["stereo_widening", "widener"],
            EffectKind::Limiter => &[],
            EffectKind::Mastering => &["mastering_chain"],
        }
    }

    /// One-line description.
    pub fn description(self) -> &'static str {
        match self {
            EffectKind::NoiseReduction => "Spectral subtraction of a measured noise profile",
            EffectKind::Equalizer => "Low shelf, peaking bands, high shelf",
            EffectKind::Compressor => "Feed-forward compressor with linked detection",
            EffectKind::Reverb => "FFT convolution with a synthetic or supplied response",
            EffectKind::Delay => "Feedback comb delay",
            EffectKind::StereoWidener => "Mid/side width control",
            EffectKind::Limiter => "Look-ahead brick-wall limiter",
            EffectKind::Mastering => "Multiband compression followed by limiting",
        }
    }

    /// Parameter table.
    pub fn params(self) -> &'static [ParamDescriptor] {
        match self {
            EffectKind::NoiseReduction => NoiseReduction::PARAMS,
            EffectKind::Equalizer => Equalizer::PARAMS,
            EffectKind::Compressor => Compressor::PARAMS,
            EffectKind::Reverb => Reverb::PARAMS,
            EffectKind::Delay => Delay::PARAMS,
            EffectKind::StereoWidener => StereoWidener::PARAMS,
            EffectKind::Limiter => Limiter::PARAMS,
            EffectKind::Mastering => MasteringChain::PARAMS,
        }
    }

    /// Look up a kind by canonical name or alias.
    ///
    /// Matching ignores case and treats `-` and spaces as `_`.
    ///
    /// ```rust
    /// use lustre_effects::EffectKind;
    ///
    /// assert_eq!(EffectKind::from_name("EQ"), Some(EffectKind::Equalizer));
    /// assert_eq!(EffectKind::from_name("stereo-widening"), Some(EffectKind::StereoWidener));
    /// assert_eq!(EffectKind::from_name("flanger"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        let key = name.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        CANONICAL_ORDER
            .into_iter()
            .find(|kind| kind.name() == key || kind.aliases().contains(&key.as_str()))
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EffectKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
            .ok_or_else(|| EngineError::invalid_parameter("effects", "effect", s, "unknown effect"))
    }
}

/// One configured effect.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectStage {
    /// See [`NoiseReduction`].
    NoiseReduction(NoiseReduction),
    /// See [`Equalizer`].
    Equalizer(Equalizer),
    /// See [`Compressor`].
    Compressor(Compressor),
    /// See [`Reverb`].
    Reverb(Reverb),
    /// See [`Delay`].
    Delay(Delay),
    /// See [`StereoWidener`].
    StereoWidener(StereoWidener),
    /// See [`Limiter`].
    Limiter(Limiter),
    /// See [`MasteringChain`].
    Mastering(MasteringChain),
}

impl EffectStage {
    /// The effect of `kind` with default parameters.
    pub fn default_for(kind: EffectKind) -> Self {
        match kind {
            EffectKind::NoiseReduction => Self::NoiseReduction(NoiseReduction::default()),
            EffectKind::Equalizer => Self::Equalizer(Equalizer::default()),
            EffectKind::Compressor => Self::Compressor(Compressor::default()),
            EffectKind::Reverb => Self::Reverb(Reverb::default()),
            EffectKind::Delay => Self::Delay(Delay::default()),
            EffectKind::StereoWidener => Self::StereoWidener(StereoWidener::default()),
            EffectKind::Limiter => Self::Limiter(Limiter::default()),
            EffectKind::Mastering => Self::Mastering(MasteringChain::default()),
        }
    }

    /// Tag of this stage.
    pub fn kind(&self) -> EffectKind {
        match self {
            Self::NoiseReduction(_) => EffectKind::NoiseReduction,
            Self::Equalizer(_) => EffectKind::Equalizer,
            Self::Compressor(_) => EffectKind::Compressor,
            Self::Reverb(_) => EffectKind::Reverb,
            Self::Delay(_) => EffectKind::Delay,
            Self::StereoWidener(_) => EffectKind::StereoWidener,
            Self::Limiter(_) => EffectKind::Limiter,
            Self::Mastering(_) => EffectKind::Mastering,
        }
    }

    /// Set one parameter by name.
    pub fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        match self {
            Self::NoiseReduction(e) => e.set_param(name, value),
            Self::Equalizer(e) => e.set_param(name, value),
            Self::Compressor(e) => e.set_param(name, value),
            Self::Reverb(e) => e.set_param(name, value),
            Self::Delay(e) => e.set_param(name, value),
            Self::StereoWidener(e) => e.set_param(name, value),
            Self::Limiter(e) => e.set_param(name, value),
            Self::Mastering(e) => e.set_param(name, value),
        }
    }

    fn as_effect(&self) -> &dyn Effect {
        match self {
            Self::NoiseReduction(e) => e,
            Self::Equalizer(e) => e,
            Self::Compressor(e) => e,
            Self::Reverb(e) => e,
            Self::Delay(e) => e,
            Self::StereoWidener(e) => e,
            Self::Limiter(e) => e,
            Self::Mastering(e) => e,
        }
    }
}

impl Effect for EffectStage {
    fn name(&self) -> &'static str {
        self.kind().name()
    }

    fn validate(&self, buffer: &SampleBuffer) -> Result<()> {
        self.as_effect().validate(buffer)
    }

    fn process(&self, buffer: &SampleBuffer) -> Result<SampleBuffer> {
        self.as_effect().process(buffer)
    }
}

macro_rules! impl_from_effect {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for EffectStage {
                fn from(effect: $ty) -> Self {
                    Self::$variant(effect)
                }
            }
        )*
    };
}

impl_from_effect! {
    NoiseReduction => NoiseReduction,
    Equalizer => Equalizer,
    Compressor => Compressor,
    Reverb => Reverb,
    Delay => Delay,
    StereoWidener => StereoWidener,
    Limiter => Limiter,
    Mastering => MasteringChain,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_names_roundtrip() {
        for kind in CANONICAL_ORDER {
            assert_eq!(EffectKind::from_name(kind.name()), Some(kind));
            assert_eq!(kind.to_string().parse::<EffectKind>().unwrap(), kind);
            for alias in kind.aliases() {
                assert_eq!(EffectKind::from_name(alias), Some(kind));
            }
        }
    }

    #[test]
    fn test_order_is_sorted_by_declaration() {
        let mut sorted = CANONICAL_ORDER;
        sorted.sort();
        assert_eq!(sorted, CANONICAL_ORDER);
        assert_eq!(CANONICAL_ORDER.first(), Some(&EffectKind::NoiseReduction));
        assert_eq!(CANONICAL_ORDER.last(), Some(&EffectKind::Mastering));
    }

    #[test]
    fn test_unknown_name_is_error() {
        let err = "chorus".parse::<EffectKind>().unwrap_err();
        assert_eq!(err.param(), Some("effect"));
    }

    #[test]
    fn test_stage_dispatch() {
        for kind in CANONICAL_ORDER {
            let stage = EffectStage::default_for(kind);
            assert_eq!(stage.kind(), kind);
            assert_eq!(stage.name(), kind.name());
            assert!(!kind.params().is_empty());
        }

        let mut stage = EffectStage::from(Limiter::with_ceiling(0.5));
        stage.set_param("ceiling", &ParamValue::Number(0.25)).unwrap();
        let input = SampleBuffer::mono(48000, vec![0.9; 32]).unwrap();
        assert!(stage.apply(&input).unwrap().peak() <= 0.25);
    }

    #[test]
    fn test_every_descriptor_is_settable() {
        for kind in CANONICAL_ORDER {
            let mut stage = EffectStage::default_for(kind);
            for desc in kind.params() {
                let value = match desc.default {
                    crate::ParamDefault::Number(v) => ParamValue::Number(v),
                    crate::ParamDefault::Toggle(b) => ParamValue::Toggle(b),
                    crate::ParamDefault::List(v) => ParamValue::List(v.to_vec()),
                };
                stage
                    .set_param(desc.name, &value)
                    .unwrap_or_else(|e| panic!("{kind}.{}: {e}", desc.name));
            }
        }
    }
}
