//! Parameter metadata and name-based parameter setting.
//!
//! Every effect publishes a static table of [`ParamDescriptor`]s (used by the
//! `effects` listing and by config documentation) and implements
//! [`Configurable`] so a configuration layer can set parameters by name
//! without knowing the concrete struct.

use lustre_core::{EngineError, Result};

/// Unit of a parameter value, used for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamUnit {
    /// Decibels.
    Decibels,
    /// Hertz.
    Hertz,
    /// Milliseconds.
    Milliseconds,
    /// Seconds.
    Seconds,
    /// Ratio (n:1).
    Ratio,
    /// Sample count.
    Samples,
    /// Dimensionless.
    None,
}

impl ParamUnit {
    /// Returns the unit suffix string for display.
    ///
    /// ```rust
    /// use lustre_effects::ParamUnit;
    ///
    /// assert_eq!(ParamUnit::Decibels.suffix(), " dB");
    /// assert_eq!(ParamUnit::None.suffix(), "");
    /// ```
    pub fn suffix(&self) -> &'static str {
        match self {
            ParamUnit::Decibels => " dB",
            ParamUnit::Hertz => " Hz",
            ParamUnit::Milliseconds => " ms",
            ParamUnit::Seconds => " s",
            ParamUnit::Ratio => ":1",
            ParamUnit::Samples => " samples",
            ParamUnit::None => "",
        }
    }
}

/// Default value of a parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamDefault {
    /// A scalar.
    Number(f32),
    /// An on/off switch.
    Toggle(bool),
    /// A list of numbers.
    List(&'static [f32]),
}

/// Static description of one effect parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    /// Parameter key as used in configuration files.
    pub name: &'static str,
    /// Display unit.
    pub unit: ParamUnit,
    /// Minimum accepted value (per element for lists).
    pub min: f32,
    /// Maximum accepted value (per element for lists).
    pub max: f32,
    /// Default value.
    pub default: ParamDefault,
    /// One-line description.
    pub description: &'static str,
}

impl ParamDescriptor {
    /// A scalar parameter.
    pub const fn number(
        name: &'static str,
        unit: ParamUnit,
        min: f32,
        max: f32,
        default: f32,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            unit,
            min,
            max,
            default: ParamDefault::Number(default),
            description,
        }
    }

    /// An on/off parameter.
    pub const fn toggle(name: &'static str, default: bool, description: &'static str) -> Self {
        Self {
            name,
            unit: ParamUnit::None,
            min: 0.0,
            max: 1.0,
            default: ParamDefault::Toggle(default),
            description,
        }
    }

    /// A list-of-numbers parameter.
    pub const fn list(
        name: &'static str,
        unit: ParamUnit,
        min: f32,
        max: f32,
        default: &'static [f32],
        description: &'static str,
    ) -> Self {
        Self {
            name,
            unit,
            min,
            max,
            default: ParamDefault::List(default),
            description,
        }
    }

    /// Default rendered for display, e.g. `"-20 dB"` or `"[250, 4000] Hz"`.
    pub fn default_label(&self) -> String {
        match self.default {
            ParamDefault::Number(v) => format!("{}{}", v, self.unit.suffix()),
            ParamDefault::Toggle(b) => b.to_string(),
            ParamDefault::List(values) => {
                let items: Vec<String> = values.iter().map(ToString::to_string).collect();
                format!("[{}]{}", items.join(", "), self.unit.suffix())
            }
        }
    }

    /// Range rendered for display.
    pub fn range_label(&self) -> String {
        match self.default {
            ParamDefault::Toggle(_) => "on/off".to_string(),
            _ => format!("{} to {}{}", self.min, self.max, self.unit.suffix()),
        }
    }
}

/// A parameter value on its way into an effect.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// A scalar.
    Number(f32),
    /// An on/off switch.
    Toggle(bool),
    /// A list of numbers.
    List(Vec<f32>),
}

impl ParamValue {
    /// The value as a scalar, or `InvalidParameter`.
    pub fn as_number(&self, stage: &str, param: &str) -> Result<f32> {
        match self {
            ParamValue::Number(v) => Ok(*v),
            other => Err(type_mismatch(stage, param, other, "expected a number")),
        }
    }

    /// The value as a switch; numbers are accepted as `!= 0`.
    pub fn as_bool(&self, stage: &str, param: &str) -> Result<bool> {
        match self {
            ParamValue::Toggle(b) => Ok(*b),
            ParamValue::Number(v) => Ok(*v != 0.0),
            other @ ParamValue::List(_) => {
                Err(type_mismatch(stage, param, other, "expected true or false"))
            }
        }
    }

    /// The value as a list; a scalar is promoted to a one-element list.
    pub fn as_list(&self, stage: &str, param: &str) -> Result<Vec<f32>> {
        match self {
            ParamValue::List(values) => Ok(values.clone()),
            ParamValue::Number(v) => Ok(vec![*v]),
            other @ ParamValue::Toggle(_) => {
                Err(type_mismatch(stage, param, other, "expected a list of numbers"))
            }
        }
    }
}

impl core::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ParamValue::Number(v) => write!(f, "{v}"),
            ParamValue::Toggle(b) => write!(f, "{b}"),
            ParamValue::List(values) => write!(f, "{values:?}"),
        }
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Number(v)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Toggle(b)
    }
}

impl From<Vec<f32>> for ParamValue {
    fn from(values: Vec<f32>) -> Self {
        ParamValue::List(values)
    }
}

fn type_mismatch(stage: &str, param: &str, value: &ParamValue, reason: &str) -> EngineError {
    EngineError::invalid_parameter(stage, param, value, reason)
}

/// Error for a parameter name the effect does not have.
pub fn unknown_param(stage: &str, param: &str, value: &ParamValue) -> EngineError {
    EngineError::invalid_parameter(stage, param, value, "unknown parameter")
}

/// Name-based parameter access.
///
/// Setting stores the value as given; range checks happen in
/// [`Effect::validate`](lustre_core::Effect::validate) so that a
/// configuration is checked as a whole, against the buffer it will run on.
pub trait Configurable {
    /// Parameter table in display order.
    const PARAMS: &'static [ParamDescriptor];

    /// Set one parameter by name.
    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()>;
}
