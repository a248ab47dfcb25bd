//! Error types shared by every stage of the engine.
//!
//! Every failure names the stage that raised it (an effect name, `"stft"`,
//! `"buffer"`, a codec) and, where one exists, the offending parameter and
//! value, so callers can render an actionable message without re-deriving
//! context.

use core::fmt::Display;
use thiserror::Error;

/// Errors raised by buffers, the spectral engine and effects.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A parameter is out of range or of the wrong type.
    #[error("{stage}: invalid parameter '{param}' = {value}: {reason}")]
    InvalidParameter {
        /// Stage that rejected the parameter.
        stage: String,
        /// Parameter name.
        param: String,
        /// Offending value, rendered as text.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A decode/encode target is not recognized or not available.
    #[error("{stage}: unsupported format '{format}'")]
    UnsupportedFormat {
        /// Stage (usually a codec) that rejected the format.
        stage: String,
        /// The format as requested.
        format: String,
    },

    /// The buffer shape does not fit the operation.
    #[error("{stage}: incompatible buffer: {reason}")]
    IncompatibleBuffer {
        /// Stage that rejected the buffer.
        stage: String,
        /// Description of the mismatch.
        reason: String,
    },

    /// Parameters that would make the computation numerically unstable.
    #[error("{stage}: divergent configuration '{param}' = {value}: {reason}")]
    DivergentConfiguration {
        /// Stage that rejected the configuration.
        stage: String,
        /// Parameter name.
        param: String,
        /// Offending value, rendered as text.
        value: String,
        /// Why the value diverges.
        reason: String,
    },

    /// A zero-length buffer was given to an operation that needs data.
    #[error("{stage}: empty input")]
    EmptyInput {
        /// Stage that needed non-empty input.
        stage: String,
    },
}

/// Fieldless discriminant of [`EngineError`], convenient for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`EngineError::InvalidParameter`].
    InvalidParameter,
    /// See [`EngineError::UnsupportedFormat`].
    UnsupportedFormat,
    /// See [`EngineError::IncompatibleBuffer`].
    IncompatibleBuffer,
    /// See [`EngineError::DivergentConfiguration`].
    DivergentConfiguration,
    /// See [`EngineError::EmptyInput`].
    EmptyInput,
}

impl EngineError {
    /// Create an invalid parameter error.
    pub fn invalid_parameter(
        stage: impl Into<String>,
        param: impl Into<String>,
        value: impl Display,
        reason: impl Into<String>,
    ) -> Self {
        EngineError::InvalidParameter {
            stage: stage.into(),
            param: param.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Create an unsupported format error.
    pub fn unsupported_format(stage: impl Into<String>, format: impl Into<String>) -> Self {
        EngineError::UnsupportedFormat {
            stage: stage.into(),
            format: format.into(),
        }
    }

    /// Create an incompatible buffer error.
    pub fn incompatible_buffer(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::IncompatibleBuffer {
            stage: stage.into(),
            reason: reason.into(),
        }
    }

    /// Create a divergent configuration error.
    pub fn divergent(
        stage: impl Into<String>,
        param: impl Into<String>,
        value: impl Display,
        reason: impl Into<String>,
    ) -> Self {
        EngineError::DivergentConfiguration {
            stage: stage.into(),
            param: param.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Create an empty input error.
    pub fn empty_input(stage: impl Into<String>) -> Self {
        EngineError::EmptyInput {
            stage: stage.into(),
        }
    }

    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            EngineError::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            EngineError::IncompatibleBuffer { .. } => ErrorKind::IncompatibleBuffer,
            EngineError::DivergentConfiguration { .. } => ErrorKind::DivergentConfiguration,
            EngineError::EmptyInput { .. } => ErrorKind::EmptyInput,
        }
    }

    /// Name of the stage that raised the error.
    pub fn stage(&self) -> &str {
        match self {
            EngineError::InvalidParameter { stage, .. }
            | EngineError::UnsupportedFormat { stage, .. }
            | EngineError::IncompatibleBuffer { stage, .. }
            | EngineError::DivergentConfiguration { stage, .. }
            | EngineError::EmptyInput { stage } => stage,
        }
    }

    /// Name of the offending parameter, if the error concerns one.
    pub fn param(&self) -> Option<&str> {
        match self {
            EngineError::InvalidParameter { param, .. }
            | EngineError::DivergentConfiguration { param, .. } => Some(param),
            _ => None,
        }
    }
}

/// Convenience result type for engine operations.
pub type Result<T> = core::result::Result<T, EngineError>;

/// Reject `value` unless it is finite and within `[min, max]`.
pub fn check_range(stage: &str, param: &str, value: f32, min: f32, max: f32) -> Result<()> {
    if !value.is_finite() {
        return Err(EngineError::invalid_parameter(
            stage,
            param,
            value,
            "must be finite",
        ));
    }
    if value < min || value > max {
        return Err(EngineError::invalid_parameter(
            stage,
            param,
            value,
            format!("must be in [{min}, {max}]"),
        ));
    }
    Ok(())
}

/// Reject a frequency outside the open interval `(0, sample_rate / 2)`.
pub fn check_frequency(stage: &str, param: &str, freq_hz: f32, sample_rate: u32) -> Result<()> {
    let nyquist = sample_rate as f32 / 2.0;
    if !freq_hz.is_finite() || freq_hz <= 0.0 || freq_hz >= nyquist {
        return Err(EngineError::invalid_parameter(
            stage,
            param,
            freq_hz,
            format!("must be between 0 and the Nyquist frequency ({nyquist} Hz)"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_stage_param_and_value() {
        let err = EngineError::invalid_parameter("compressor", "ratio", 0.5, "must be >= 1");
        assert_eq!(
            err.to_string(),
            "compressor: invalid parameter 'ratio' = 0.5: must be >= 1"
        );
        assert_eq!(err.stage(), "compressor");
        assert_eq!(err.param(), Some("ratio"));
    }

    #[test]
    fn kind_matches_variant() {
        assert_eq!(
            EngineError::divergent("delay", "feedback", 1.0, "x").kind(),
            ErrorKind::DivergentConfiguration
        );
        assert_eq!(
            EngineError::unsupported_format("codec", "xyz").kind(),
            ErrorKind::UnsupportedFormat
        );
        assert_eq!(
            EngineError::empty_input("stft").kind(),
            ErrorKind::EmptyInput
        );
        assert_eq!(EngineError::empty_input("stft").param(), None);
    }

    #[test]
    fn check_range_bounds_are_inclusive() {
        assert!(check_range("x", "p", 0.0, 0.0, 1.0).is_ok());
        assert!(check_range("x", "p", 1.0, 0.0, 1.0).is_ok());
        assert!(check_range("x", "p", 1.01, 0.0, 1.0).is_err());
        assert!(check_range("x", "p", f32::NAN, 0.0, 1.0).is_err());
    }

    #[test]
    fn check_frequency_rejects_nyquist_and_above() {
        assert!(check_frequency("eq", "freq", 1000.0, 44100).is_ok());
        assert!(check_frequency("eq", "freq", 22050.0, 44100).is_err());
        assert!(check_frequency("eq", "freq", 0.0, 44100).is_err());
        assert!(check_frequency("eq", "freq", -5.0, 44100).is_err());
    }
}
