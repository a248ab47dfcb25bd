//! Effect configuration: which effects run and with what parameters.

use crate::error::ConfigError;
use crate::value::ConfigValue;
use lustre_effects::{CANONICAL_ORDER, EffectKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Intensity keys that drive the equalizer in [`EffectConfig::from_intensities`].
pub const EQ_INTENSITY_KEYS: [&str; 3] = ["eq_low", "eq_mid", "eq_high"];

fn enabled_by_default() -> bool {
    true
}

/// Settings for one effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSettings {
    /// Whether the effect runs. Defaults to `true` when omitted.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,

    /// Parameter overrides; anything missing keeps the effect's default.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, ConfigValue>,
}

impl EffectSettings {
    /// Enabled with default parameters.
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            params: BTreeMap::new(),
        }
    }

    /// Disabled.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            params: BTreeMap::new(),
        }
    }

    /// Add a parameter override.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self::enabled()
    }
}

/// A flat mapping from effect name to [`EffectSettings`].
///
/// Serialized as one table per effect:
///
/// ```toml
/// [compressor]
/// enabled = true
///
/// [compressor.params]
/// threshold_db = "-18dB"
/// ratio = 3
///
/// [reverb]
/// enabled = false
/// ```
///
/// Names may be canonical (`stereo_widener`) or aliases (`stereo_widening`).
/// Names that match no effect are ignored when the chain is built.
///
/// # Example
///
/// ```rust
/// use lustre_config::{EffectConfig, EffectSettings};
///
/// let config = EffectConfig::all_disabled()
///     .with_effect("limiter", EffectSettings::enabled().with_param("ceiling", "-1dB"));
///
/// assert!(config.is_enabled("limiter"));
/// assert!(!config.is_enabled("reverb"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectConfig {
    effects: BTreeMap<String, EffectSettings>,
}

impl Default for EffectConfig {
    /// The standard enhancement pipeline: noise reduction, equalizer,
    /// compressor, limiter and mastering on; reverb, delay and widening off.
    fn default() -> Self {
        let mut config = Self::all_disabled();
        for kind in [
            EffectKind::NoiseReduction,
            EffectKind::Equalizer,
            EffectKind::Compressor,
            EffectKind::Limiter,
            EffectKind::Mastering,
        ] {
            config.set_enabled(kind.name(), true);
        }
        config
    }
}

impl EffectConfig {
    /// A configuration with no entries.
    pub fn new() -> Self {
        Self {
            effects: BTreeMap::new(),
        }
    }

    /// Every effect listed and disabled; processes as the identity.
    pub fn all_disabled() -> Self {
        Self {
            effects: CANONICAL_ORDER
                .iter()
                .map(|kind| (kind.name().to_string(), EffectSettings::disabled()))
                .collect(),
        }
    }

    /// Derive a configuration from per-effect intensities in `0..=1`.
    ///
    /// An effect is enabled when its intensity (looked up by name or alias)
    /// is above zero. The equalizer is enabled when any of `eq_low`,
    /// `eq_mid` or `eq_high` is non-zero; those values become the low-shelf,
    /// mid-band and high-shelf gains in dB.
    ///
    /// ```rust
    /// use std::collections::BTreeMap;
    /// use lustre_config::EffectConfig;
    ///
    /// let intensities = BTreeMap::from([("compression".to_string(), 0.6), ("eq_high".to_string(), 2.0)]);
    /// let config = EffectConfig::from_intensities(&intensities);
    /// assert!(config.is_enabled("compressor"));
    /// assert!(config.is_enabled("equalizer"));
    /// assert!(!config.is_enabled("limiter"));
    /// ```
    pub fn from_intensities(intensities: &BTreeMap<String, f32>) -> Self {
        let mut config = Self::all_disabled();

        for (key, &value) in intensities {
            if EQ_INTENSITY_KEYS.contains(&key.as_str()) {
                continue;
            }
            match EffectKind::from_name(key) {
                Some(kind) => config.set_enabled(kind.name(), value > 0.0),
                None => tracing::warn!(effect = %key, "ignoring intensity for unknown effect"),
            }
        }

        let eq = |key: &str| intensities.get(key).copied().unwrap_or(0.0);
        let (low, mid, high) = (eq("eq_low"), eq("eq_mid"), eq("eq_high"));
        if low != 0.0 || mid != 0.0 || high != 0.0 {
            let settings = EffectSettings::enabled()
                .with_param("low_shelf_gain_db", low)
                .with_param("high_shelf_gain_db", high)
                .with_param("bands", vec![1000.0, mid, 1.0]);
            config = config.with_effect(EffectKind::Equalizer.name(), settings);
        }
        config
    }

    /// Insert or replace the settings for one effect.
    pub fn with_effect(mut self, name: impl Into<String>, settings: EffectSettings) -> Self {
        self.effects.insert(name.into(), settings);
        self
    }

    /// Set one parameter, enabling the effect if it was not listed.
    ///
    /// Known aliases are stored under the canonical name.
    pub fn with_param(
        mut self,
        effect: &str,
        param: impl Into<String>,
        value: impl Into<ConfigValue>,
    ) -> Self {
        self.effects
            .entry(canonical_key(effect))
            .or_default()
            .params
            .insert(param.into(), value.into());
        self
    }

    /// Enable or disable an effect, adding an entry if needed.
    ///
    /// Known aliases are stored under the canonical name.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) {
        self.effects.entry(canonical_key(name)).or_default().enabled = enabled;
    }

    /// Settings for an effect by exact name.
    pub fn get(&self, name: &str) -> Option<&EffectSettings> {
        self.effects.get(name)
    }

    /// Whether an effect is enabled, matching names and aliases.
    pub fn is_enabled(&self, name: &str) -> bool {
        let Some(kind) = EffectKind::from_name(name) else {
            return false;
        };
        self.effects
            .iter()
            .any(|(key, s)| s.enabled && EffectKind::from_name(key) == Some(kind))
    }

    /// Entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &EffectSettings)> {
        self.effects.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// True when there are no entries.
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Parse TOML.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Serialize as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Parse JSON.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize as pretty JSON.
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load from a file; `.json` is read as JSON, anything else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        if is_json(path) {
            Self::from_json_str(&text)
        } else {
            Self::from_toml_str(&text)
        }
    }

    /// Save to a file in the format its extension names.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = if is_json(path) {
            self.to_json_string()?
        } else {
            self.to_toml_string()?
        };
        std::fs::write(path, text).map_err(|e| ConfigError::write_file(path, e))
    }
}

fn canonical_key(name: &str) -> String {
    EffectKind::from_name(name).map_or_else(|| name.to_string(), |kind| kind.name().to_string())
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pipeline() {
        let config = EffectConfig::default();
        for name in ["noise_reduction", "equalizer", "compressor", "limiter", "mastering"] {
            assert!(config.is_enabled(name), "{name}");
        }
        for name in ["reverb", "delay", "stereo_widener"] {
            assert!(!config.is_enabled(name), "{name}");
        }
        assert_eq!(config.len(), 8);
    }

    #[test]
    fn test_aliases_count_as_enabled() {
        let config = EffectConfig::new().with_effect("stereo_widening", EffectSettings::enabled());
        assert!(config.is_enabled("stereo_widener"));
        assert!(config.is_enabled("widener"));
        assert!(!config.is_enabled("flanger"));
    }

    #[test]
    fn test_setters_use_canonical_names() {
        let mut config = EffectConfig::default();
        config.set_enabled("eq", false);
        let config = config.with_param("compression", "ratio", 2.0f32);
        assert_eq!(config.len(), 8);
        assert!(!config.get("equalizer").unwrap().enabled);
        assert!(config.get("compressor").unwrap().params.contains_key("ratio"));
    }

    #[test]
    fn test_toml_layout() {
        let text = r#"
            [compressor]
            enabled = true

            [compressor.params]
            threshold_db = "-18dB"
            ratio = 3

            [reverb]
            enabled = false

            [limiter]
        "#;
        let config = EffectConfig::from_toml_str(text).unwrap();
        let comp = config.get("compressor").unwrap();
        assert_eq!(comp.params["ratio"], ConfigValue::Number(3.0));
        assert_eq!(comp.params["threshold_db"], ConfigValue::Text("-18dB".into()));
        assert!(!config.get("reverb").unwrap().enabled);
        // a bare section means enabled with defaults
        assert!(config.get("limiter").unwrap().enabled);
    }

    #[test]
    fn test_toml_and_json_roundtrip() {
        let config = EffectConfig::default()
            .with_param("delay", "delay_ms", "120ms")
            .with_param("mastering", "crossovers_hz", vec![200.0, 5000.0])
            .with_param("delay", "keep_tail", true);

        let toml_text = config.to_toml_string().unwrap();
        assert_eq!(EffectConfig::from_toml_str(&toml_text).unwrap(), config);

        let json_text = config.to_json_string().unwrap();
        assert_eq!(EffectConfig::from_json_str(&json_text).unwrap(), config);
    }

    #[test]
    fn test_intensities() {
        let intensities = BTreeMap::from([
            ("noise_reduction".to_string(), 0.5),
            ("reverb".to_string(), 0.0),
            ("stereo_widening".to_string(), 1.0),
            ("eq_low".to_string(), 3.0),
            ("warp_drive".to_string(), 1.0),
        ]);
        let config = EffectConfig::from_intensities(&intensities);
        assert!(config.is_enabled("noise_reduction"));
        assert!(!config.is_enabled("reverb"));
        assert!(config.is_enabled("stereo_widener"));
        assert!(!config.is_enabled("compressor"));

        let eq = config.get("equalizer").unwrap();
        assert!(eq.enabled);
        assert_eq!(eq.params["low_shelf_gain_db"], ConfigValue::Number(3.0));
    }

    #[test]
    fn test_intensities_without_eq_leave_it_off() {
        let config = EffectConfig::from_intensities(&BTreeMap::new());
        assert_eq!(config, EffectConfig::all_disabled());
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let config = EffectConfig::default().with_param("limiter", "ceiling", 0.9f32);
        for name in ["chain.toml", "chain.json"] {
            let path = dir.path().join(name);
            config.save(&path).unwrap();
            assert_eq!(EffectConfig::load(&path).unwrap(), config);
        }
    }

    #[test]
    fn test_load_missing_file() {
        let err = EffectConfig::load("/nonexistent/lustre.toml").unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }
}
