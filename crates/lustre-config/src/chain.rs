//! Effect chain construction and processing.
//!
//! [`EffectChain::from_config`] turns an [`EffectConfig`] into a list of
//! configured [`EffectStage`]s sorted into [`CANONICAL_ORDER`], so the order
//! entries appear in a file never changes the result.
//!
//! # Example
//!
//! ```rust
//! use lustre_config::{EffectChain, EffectConfig, EffectSettings};
//! use lustre_core::SampleBuffer;
//!
//! let config = EffectConfig::all_disabled()
//!     .with_effect("limiter", EffectSettings::enabled().with_param("ceiling", 0.9));
//! let chain = EffectChain::from_config(&config).unwrap();
//!
//! let input = SampleBuffer::mono(44100, vec![1.2; 4410]).unwrap();
//! let output = chain.process(&input).unwrap();
//! assert!(output.peak() <= 0.9);
//! ```

use crate::effect_config::EffectConfig;
use lustre_core::{Effect, EngineError, Result, SampleBuffer};
use lustre_effects::{CANONICAL_ORDER, EffectKind, EffectStage};
use std::fmt;
use std::str::FromStr;

const STAGE: &str = "chain";

/// What to do when both the limiter and mastering are enabled.
///
/// Mastering ends in its own limiter, so running both would limit twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LimiterPolicy {
    /// Drop the standalone limiter and log a warning.
    #[default]
    MasteringWins,
    /// Refuse the configuration with `InvalidParameter` naming `limiter`.
    Reject,
}

impl LimiterPolicy {
    /// Name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            LimiterPolicy::MasteringWins => "mastering-wins",
            LimiterPolicy::Reject => "reject",
        }
    }
}

impl fmt::Display for LimiterPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LimiterPolicy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "mastering-wins" | "mastering" | "skip" => Ok(LimiterPolicy::MasteringWins),
            "reject" | "error" => Ok(LimiterPolicy::Reject),
            other => Err(EngineError::invalid_parameter(
                STAGE,
                "limiter_policy",
                other,
                "expected mastering-wins or reject",
            )),
        }
    }
}

/// Enabled effects in canonical order.
///
/// Processing is a fold over the stages; the first failing stage aborts the
/// chain and its error names the stage and parameter. A chain with no stages
/// returns a copy of its input.
#[derive(Debug, Clone, Default)]
pub struct EffectChain {
    stages: Vec<EffectStage>,
}

impl EffectChain {
    /// A chain with no stages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a chain using [`LimiterPolicy::MasteringWins`].
    pub fn from_config(config: &EffectConfig) -> Result<Self> {
        Self::from_config_with_policy(config, LimiterPolicy::default())
    }

    /// Build a chain from a configuration.
    ///
    /// Unknown effect names are skipped with a warning. Unknown parameter
    /// names, unreadable values and an effect listed twice (under a name and
    /// an alias) fail with `InvalidParameter`.
    pub fn from_config_with_policy(config: &EffectConfig, policy: LimiterPolicy) -> Result<Self> {
        let mut seen: Vec<(EffectKind, &str)> = Vec::new();
        let mut stages = Vec::new();

        for (name, settings) in config.iter() {
            let Some(kind) = EffectKind::from_name(name) else {
                tracing::warn!(effect = %name, "ignoring unknown effect");
                continue;
            };
            if let Some((_, first)) = seen.iter().find(|(k, _)| *k == kind) {
                return Err(EngineError::invalid_parameter(
                    kind.name(),
                    "effect",
                    name,
                    format!("already configured as '{first}'"),
                ));
            }
            seen.push((kind, name));

            if !settings.enabled {
                continue;
            }

            let mut stage = EffectStage::default_for(kind);
            for (param, value) in &settings.params {
                let desc = kind
                    .params()
                    .iter()
                    .find(|d| d.name == param.as_str())
                    .ok_or_else(|| {
                        EngineError::invalid_parameter(
                            kind.name(),
                            param,
                            value,
                            "unknown parameter",
                        )
                    })?;
                stage.set_param(param, &value.resolve(kind.name(), desc)?)?;
            }
            stages.push(stage);
        }

        stages.sort_by_key(EffectStage::kind);
        apply_limiter_policy(&mut stages, policy)?;
        Ok(Self { stages })
    }

    /// Append a stage, keeping canonical order.
    pub fn with_stage(mut self, stage: impl Into<EffectStage>) -> Self {
        self.stages.push(stage.into());
        self.stages.sort_by_key(EffectStage::kind);
        self
    }

    /// The configured stages in application order.
    pub fn stages(&self) -> &[EffectStage] {
        &self.stages
    }

    /// Kinds of the configured stages in application order.
    pub fn kinds(&self) -> Vec<EffectKind> {
        self.stages.iter().map(EffectStage::kind).collect()
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// True when the chain is the identity.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Check every stage against `buffer` without processing anything.
    pub fn validate(&self, buffer: &SampleBuffer) -> Result<()> {
        self.stages.iter().try_for_each(|stage| stage.validate(buffer))
    }

    /// Run every stage in order.
    ///
    /// All stages are validated against the input before the first one
    /// runs, so a bad parameter late in the chain fails without wasted work.
    pub fn process(&self, buffer: &SampleBuffer) -> Result<SampleBuffer> {
        self.validate(buffer)?;

        let mut current = buffer.clone();
        for stage in &self.stages {
            current = stage.apply(&current)?;
            tracing::debug!(
                stage = stage.name(),
                frames = current.len(),
                channels = current.num_channels(),
                peak = current.peak(),
                "chain: stage applied"
            );
        }
        Ok(current)
    }
}

impl Effect for EffectChain {
    fn name(&self) -> &'static str {
        STAGE
    }

    fn validate(&self, buffer: &SampleBuffer) -> Result<()> {
        EffectChain::validate(self, buffer)
    }

    fn process(&self, buffer: &SampleBuffer) -> Result<SampleBuffer> {
        EffectChain::process(self, buffer)
    }
}

fn apply_limiter_policy(stages: &mut Vec<EffectStage>, policy: LimiterPolicy) -> Result<()> {
    let has = |kind| stages.iter().any(|s| s.kind() == kind);
    if !(has(EffectKind::Limiter) && has(EffectKind::Mastering)) {
        return Ok(());
    }
    match policy {
        LimiterPolicy::MasteringWins => {
            tracing::warn!(
                "limiter and mastering both enabled; mastering's limiter wins, skipping limiter"
            );
            stages.retain(|s| s.kind() != EffectKind::Limiter);
            Ok(())
        }
        LimiterPolicy::Reject => Err(EngineError::invalid_parameter(
            EffectKind::Limiter.name(),
            "enabled",
            true,
            "cannot be combined with mastering, which ends in its own limiter",
        )),
    }
}

/// Process `buffer` through the effects `config` enables.
///
/// Shorthand for [`EffectChain::from_config`] followed by
/// [`EffectChain::process`].
pub fn process(buffer: &SampleBuffer, config: &EffectConfig) -> Result<SampleBuffer> {
    EffectChain::from_config(config)?.process(buffer)
}

/// Kinds in the order [`EffectChain`] applies them.
pub fn canonical_order() -> &'static [EffectKind] {
    &CANONICAL_ORDER
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect_config::EffectSettings;
    use lustre_core::ErrorKind;
    use lustre_effects::{Limiter, StereoWidener};

    fn sine(frames: usize) -> SampleBuffer {
        let samples = (0..frames)
            .map(|i| 0.8 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44100.0).sin())
            .collect();
        SampleBuffer::mono(44100, samples).unwrap()
    }

    #[test]
    fn test_order_ignores_config_order() {
        let config = EffectConfig::new()
            .with_effect("limiter", EffectSettings::enabled())
            .with_effect("eq", EffectSettings::enabled())
            .with_effect("compression", EffectSettings::enabled())
            .with_effect("delay", EffectSettings::enabled());
        let chain = EffectChain::from_config(&config).unwrap();
        assert_eq!(
            chain.kinds(),
            vec![
                EffectKind::Equalizer,
                EffectKind::Compressor,
                EffectKind::Delay,
                EffectKind::Limiter
            ]
        );
    }

    #[test]
    fn test_all_disabled_is_identity() {
        let input = sine(2048);
        let chain = EffectChain::from_config(&EffectConfig::all_disabled()).unwrap();
        assert!(chain.is_empty());
        assert_eq!(chain.process(&input).unwrap(), input);
    }

    #[test]
    fn test_unknown_effect_is_skipped() {
        let config = EffectConfig::new()
            .with_effect("flanger", EffectSettings::enabled())
            .with_effect("limiter", EffectSettings::enabled());
        let chain = EffectChain::from_config(&config).unwrap();
        assert_eq!(chain.kinds(), vec![EffectKind::Limiter]);
    }

    #[test]
    fn test_unknown_param_is_rejected() {
        let config = EffectConfig::new().with_param("compressor", "treshold_db", -10.0f32);
        let err = EffectChain::from_config(&config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        assert_eq!(err.stage(), "compressor");
        assert_eq!(err.param(), Some("treshold_db"));
    }

    #[test]
    fn test_duplicate_alias_is_rejected() {
        let config = EffectConfig::new()
            .with_effect("eq", EffectSettings::enabled())
            .with_effect("equalizer", EffectSettings::disabled());
        let err = EffectChain::from_config(&config).unwrap_err();
        assert_eq!(err.stage(), "equalizer");
    }

    #[test]
    fn test_mastering_wins_drops_limiter() {
        let chain = EffectChain::from_config(&EffectConfig::default()).unwrap();
        assert!(!chain.kinds().contains(&EffectKind::Limiter));
        assert_eq!(chain.kinds().last(), Some(&EffectKind::Mastering));
    }

    #[test]
    fn test_reject_policy() {
        let err = EffectChain::from_config_with_policy(&EffectConfig::default(), LimiterPolicy::Reject)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        assert_eq!(err.stage(), "limiter");
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("reject".parse::<LimiterPolicy>().unwrap(), LimiterPolicy::Reject);
        assert_eq!(
            "Mastering_Wins".parse::<LimiterPolicy>().unwrap(),
            LimiterPolicy::MasteringWins
        );
        assert!("both".parse::<LimiterPolicy>().is_err());
    }

    #[test]
    fn test_first_failure_aborts_before_processing() {
        // feedback of 1 diverges; the limiter after it must not run
        let config = EffectConfig::all_disabled()
            .with_effect("delay", EffectSettings::enabled().with_param("feedback", 1.0f32))
            .with_effect("limiter", EffectSettings::enabled());
        let chain = EffectChain::from_config(&config).unwrap();
        let err = chain.process(&sine(4410)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DivergentConfiguration);
        assert_eq!(err.stage(), "delay");
        assert_eq!(err.param(), Some("feedback"));
    }

    #[test]
    fn test_limiter_scenario() {
        // 2 s of 440 Hz, limiter at 0.9
        let input = sine(88200);
        let config = EffectConfig::all_disabled()
            .with_effect("limiter", EffectSettings::enabled().with_param("ceiling", 0.9f32));
        let output = process(&input, &config).unwrap();
        assert!(output.peak() <= 0.9);
        assert_eq!(output.len(), input.len());
    }

    #[test]
    fn test_with_stage_keeps_order() {
        let chain = EffectChain::new()
            .with_stage(Limiter::with_ceiling(0.5))
            .with_stage(StereoWidener::default());
        assert_eq!(
            chain.kinds(),
            vec![EffectKind::StereoWidener, EffectKind::Limiter]
        );
        assert_eq!(canonical_order().len(), 8);
    }
}
