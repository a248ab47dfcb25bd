//! Parameter values as written in configuration files.
//!
//! A value is a number, a boolean, a string with an optional unit suffix, or a
//! list of numbers/strings. [`ConfigValue::resolve`] turns it into the
//! [`ParamValue`] an effect accepts, converting units to what the parameter's
//! descriptor expects.

use lustre_core::{EngineError, Result, db_to_linear};
use lustre_effects::{ParamDefault, ParamDescriptor, ParamUnit, ParamValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A parameter value from TOML or JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// `true` / `false`.
    Toggle(bool),
    /// A bare number.
    Number(f64),
    /// Text, usually a number with a unit suffix such as `"-6dB"`.
    Text(String),
    /// A list, e.g. `[250, "4kHz"]`.
    List(Vec<ConfigValue>),
}

impl ConfigValue {
    /// Convert to the value `desc` expects, parsing unit suffixes.
    ///
    /// `stage` names the effect in the error if the value cannot be read.
    pub fn resolve(&self, stage: &str, desc: &ParamDescriptor) -> Result<ParamValue> {
        let invalid = |reason: &str| EngineError::invalid_parameter(stage, desc.name, self, reason);
        match (self, desc.default) {
            (ConfigValue::Toggle(b), _) => Ok(ParamValue::Toggle(*b)),
            (ConfigValue::Number(v), _) => Ok(ParamValue::Number(*v as f32)),
            (ConfigValue::Text(text), ParamDefault::Toggle(_)) => parse_toggle(text)
                .map(ParamValue::Toggle)
                .ok_or_else(|| invalid("expected true or false")),
            (ConfigValue::Text(text), ParamDefault::List(_)) => text
                .split(',')
                .map(|item| parse_param_value(item, desc.unit))
                .collect::<Option<Vec<f32>>>()
                .map(ParamValue::List)
                .ok_or_else(|| invalid("expected a comma-separated list of numbers")),
            (ConfigValue::Text(text), ParamDefault::Number(_)) => parse_param_value(text, desc.unit)
                .map(ParamValue::Number)
                .ok_or_else(|| invalid("not a number")),
            (ConfigValue::List(items), _) => items
                .iter()
                .map(|item| match item {
                    ConfigValue::Number(v) => Some(*v as f32),
                    ConfigValue::Text(text) => parse_param_value(text, desc.unit),
                    ConfigValue::Toggle(_) | ConfigValue::List(_) => None,
                })
                .collect::<Option<Vec<f32>>>()
                .map(ParamValue::List)
                .ok_or_else(|| invalid("list items must be numbers")),
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Toggle(b) => write!(f, "{b}"),
            ConfigValue::Number(v) => write!(f, "{v}"),
            ConfigValue::Text(s) => write!(f, "{s:?}"),
            ConfigValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<f32> for ConfigValue {
    fn from(v: f32) -> Self {
        ConfigValue::Number(f64::from(v))
    }
}

impl From<f64> for ConfigValue {
    fn from(v: f64) -> Self {
        ConfigValue::Number(v)
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Toggle(b)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::Text(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::Text(s)
    }
}

impl From<Vec<f32>> for ConfigValue {
    fn from(values: Vec<f32>) -> Self {
        ConfigValue::List(values.into_iter().map(ConfigValue::from).collect())
    }
}

fn parse_toggle(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Parse a parameter value string into the unit `unit` expects.
///
/// Supports:
/// - Plain numbers: "0.5", "-3", "inf"
/// - Percentages: "50%" (divided by 100)
/// - Decibels: "-6dB" (kept for dB parameters, converted to linear gain otherwise)
/// - Time: "100ms", "1.5s" (converted between ms and s as needed)
/// - Frequency: "440Hz", "1.2kHz" (converted to Hz)
///
/// ```rust
/// use lustre_config::parse_param_value;
/// use lustre_effects::ParamUnit;
///
/// assert_eq!(parse_param_value("-18dB", ParamUnit::Decibels), Some(-18.0));
/// assert_eq!(parse_param_value("1.5s", ParamUnit::Milliseconds), Some(1500.0));
/// assert_eq!(parse_param_value("4kHz", ParamUnit::Hertz), Some(4000.0));
/// assert_eq!(parse_param_value("loud", ParamUnit::None), None);
/// ```
pub fn parse_param_value(text: &str, unit: ParamUnit) -> Option<f32> {
    let lower = text.trim().to_ascii_lowercase();
    let number = |s: &str| s.trim().parse::<f32>().ok().filter(|v| !v.is_nan());

    if let Some(pct) = lower.strip_suffix('%') {
        return number(pct).map(|v| v / 100.0);
    }
    if let Some(khz) = lower.strip_suffix("khz") {
        return number(khz).map(|v| v * 1000.0);
    }
    if let Some(hz) = lower.strip_suffix("hz") {
        return number(hz);
    }
    if let Some(db) = lower.strip_suffix("db") {
        return number(db).map(|v| {
            if unit == ParamUnit::Decibels {
                v
            } else {
                db_to_linear(v)
            }
        });
    }
    if let Some(ms) = lower.strip_suffix("ms") {
        return number(ms).map(|v| if unit == ParamUnit::Seconds { v / 1000.0 } else { v });
    }
    if let Some(s) = lower.strip_suffix('s') {
        return number(s).map(|v| {
            if unit == ParamUnit::Milliseconds {
                v * 1000.0
            } else {
                v
            }
        });
    }

    number(&lower)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lustre_core::ErrorKind;
    use lustre_effects::{Configurable, Limiter, MasteringChain};

    fn desc<'a>(table: &'a [ParamDescriptor], name: &str) -> &'a ParamDescriptor {
        table.iter().find(|d| d.name == name).unwrap()
    }

    #[test]
    fn test_suffixes() {
        assert_eq!(parse_param_value("50%", ParamUnit::None), Some(0.5));
        assert_eq!(parse_param_value(" 440 Hz ", ParamUnit::Hertz), Some(440.0));
        assert_eq!(parse_param_value("1.2kHz", ParamUnit::Hertz), Some(1200.0));
        assert_eq!(parse_param_value("250ms", ParamUnit::Milliseconds), Some(250.0));
        assert_eq!(parse_param_value("250ms", ParamUnit::Seconds), Some(0.25));
        assert_eq!(parse_param_value("2s", ParamUnit::Seconds), Some(2.0));
        assert_eq!(parse_param_value("-12", ParamUnit::Decibels), Some(-12.0));
        assert_eq!(parse_param_value("inf", ParamUnit::Ratio), Some(f32::INFINITY));
        assert_eq!(parse_param_value("NaN", ParamUnit::None), None);
        assert_eq!(parse_param_value("", ParamUnit::None), None);
    }

    #[test]
    fn test_db_on_linear_parameter() {
        let v = parse_param_value("-6dB", ParamUnit::None).unwrap();
        assert!((v - 0.501_187).abs() < 1e-4);
    }

    #[test]
    fn test_resolve_against_descriptor() {
        let ceiling = desc(Limiter::PARAMS, "ceiling");
        let v = ConfigValue::from("-1dB").resolve("limiter", ceiling).unwrap();
        let ParamValue::Number(linear) = v else {
            panic!("expected a number");
        };
        assert!((linear - 0.891_25).abs() < 1e-4);

        let crossovers = desc(MasteringChain::PARAMS, "crossovers_hz");
        let v = ConfigValue::from("200Hz, 3kHz").resolve("mastering", crossovers).unwrap();
        assert_eq!(v, ParamValue::List(vec![200.0, 3000.0]));

        let mixed = ConfigValue::List(vec![ConfigValue::Number(150.0), "5kHz".into()]);
        let v = mixed.resolve("mastering", crossovers).unwrap();
        assert_eq!(v, ParamValue::List(vec![150.0, 5000.0]));
    }

    #[test]
    fn test_unreadable_text_is_invalid_parameter() {
        let ceiling = desc(Limiter::PARAMS, "ceiling");
        let err = ConfigValue::from("loud").resolve("limiter", ceiling).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        assert_eq!(err.stage(), "limiter");
        assert_eq!(err.param(), Some("ceiling"));
    }

    #[test]
    fn test_untagged_deserialization() {
        #[derive(Deserialize)]
        struct Doc {
            a: ConfigValue,
            b: ConfigValue,
            c: ConfigValue,
            d: ConfigValue,
        }
        let doc: Doc = toml::from_str("a = 3\nb = true\nc = \"-6dB\"\nd = [1, \"2kHz\"]").unwrap();
        assert_eq!(doc.a, ConfigValue::Number(3.0));
        assert_eq!(doc.b, ConfigValue::Toggle(true));
        assert_eq!(doc.c, ConfigValue::Text("-6dB".into()));
        assert_eq!(
            doc.d,
            ConfigValue::List(vec![ConfigValue::Number(1.0), ConfigValue::Text("2kHz".into())])
        );
    }
}
