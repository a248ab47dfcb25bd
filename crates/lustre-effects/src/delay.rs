//! Feedback comb delay.
//!
//! ```text
//! w[n] = x[n] + feedback × w[n - d]
//! y[n] = x[n] + mix × (w[n] - x[n])
//! ```
//!
//! With `mix = 1` this is the plain feedback comb `y[n] = x[n] + fb·y[n-d]`.
//! Feedback of 1 or more never decays and is rejected as divergent.
//!
//! By default the output keeps the input length. With `keep_tail` the
//! echoes ring out past the end of the input, one delay period at a time,
//! until a period peaks below -90 dBFS or `max_tail_s` is reached.

use crate::params::{Configurable, ParamDescriptor, ParamUnit, ParamValue, unknown_param};
use lustre_core::{
    Effect, EngineError, Result, SampleBuffer, check_range, db_to_linear, ms_to_samples,
};

const STAGE: &str = "delay";

/// Upper bound on `max_tail_s`.
pub const MAX_TAIL_S: f32 = 60.0;

/// Level below which a ringing tail is cut.
const TAIL_FLOOR_DB: f32 = -90.0;

/// Feedback delay.
///
/// # Example
///
/// ```rust
/// use lustre_core::{Effect, SampleBuffer};
/// use lustre_effects::Delay;
///
/// let delay = Delay {
///     delay_ms: 1.0,
///     feedback: 0.5,
///     ..Delay::default()
/// };
/// let mut impulse = vec![0.0; 200];
/// impulse[0] = 1.0;
/// let out = delay.apply(&SampleBuffer::mono(48000, impulse).unwrap()).unwrap();
/// assert_eq!(out.channel(0).unwrap()[48], 0.5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Delay {
    /// Delay time.
    pub delay_ms: f32,
    /// Feedback gain, `0 <= feedback < 1`.
    pub feedback: f32,
    /// Echo level, 0 (dry) to 1.
    pub mix: f32,
    /// Extend the output with the decaying echo tail.
    pub keep_tail: bool,
    /// Upper bound on the tail length, at most [`MAX_TAIL_S`].
    pub max_tail_s: f32,
}

impl Default for Delay {
    fn default() -> Self {
        Self {
            delay_ms: 250.0,
            feedback: 0.3,
            mix: 1.0,
            keep_tail: false,
            max_tail_s: 10.0,
        }
    }
}

impl Delay {
    fn comb(&self, input: &[f32], delay: usize, max_tail: usize) -> Vec<f32> {
        let fb = self.feedback;
        let mut w: Vec<f32> = Vec::with_capacity(input.len());
        for (n, &x) in input.iter().enumerate() {
            let echo = n.checked_sub(delay).map_or(0.0, |m| w[m]);
            w.push(x + fb * echo);
        }

        let mut out: Vec<f32> = input
            .iter()
            .zip(&w)
            .map(|(&x, &wet)| x + self.mix * (wet - x))
            .collect();

        if self.keep_tail && fb > 0.0 && self.mix > 0.0 {
            let floor = db_to_linear(TAIL_FLOOR_DB);
            let mut tail = 0;
            while tail < max_tail {
                let period = delay.min(max_tail - tail);
                let start = w.len();
                let mut peak = 0.0_f32;
                for n in start..start + period {
                    let echo = n.checked_sub(delay).map_or(0.0, |m| w[m]);
                    let value = fb * echo;
                    peak = peak.max(value.abs());
                    w.push(value);
                    out.push(self.mix * value);
                }
                tail += period;
                if peak * self.mix < floor {
                    break;
                }
            }
        }
        out
    }
}

impl Effect for Delay {
    fn name(&self) -> &'static str {
        STAGE
    }

    fn validate(&self, _buffer: &SampleBuffer) -> Result<()> {
        check_range(STAGE, "delay_ms", self.delay_ms, 1.0, 5000.0)?;
        if !self.feedback.is_finite() || self.feedback < 0.0 {
            return Err(EngineError::invalid_parameter(
                STAGE,
                "feedback",
                self.feedback,
                "must be >= 0",
            ));
        }
        if self.feedback >= 1.0 {
            return Err(EngineError::divergent(
                STAGE,
                "feedback",
                self.feedback,
                "feedback >= 1 never decays",
            ));
        }
        check_range(STAGE, "mix", self.mix, 0.0, 1.0)?;
        check_range(STAGE, "max_tail_s", self.max_tail_s, 0.001, MAX_TAIL_S)
    }

    fn process(&self, buffer: &SampleBuffer) -> Result<SampleBuffer> {
        let sr = buffer.sample_rate();
        let delay = ms_to_samples(self.delay_ms, sr).max(1);
        let max_tail = (self.max_tail_s * sr as f32) as usize;

        let channels: Vec<Vec<f32>> = buffer
            .channels()
            .iter()
            .map(|c| self.comb(c, delay, max_tail))
            .collect();

        // channels ring out independently; pad to a common length
        let len = channels.iter().map(Vec::len).max().unwrap_or(0);
        let channels = channels
            .into_iter()
            .map(|mut c| {
                c.resize(len, 0.0);
                c
            })
            .collect();
        buffer.with_channels(channels)
    }
}

impl Configurable for Delay {
    const PARAMS: &'static [ParamDescriptor] = &[
        ParamDescriptor::number(
            "delay_ms",
            ParamUnit::Milliseconds,
            1.0,
            5000.0,
            250.0,
            "Delay time",
        ),
        ParamDescriptor::number(
            "feedback",
            ParamUnit::None,
            0.0,
            0.999,
            0.3,
            "Feedback gain (must stay below 1)",
        ),
        ParamDescriptor::number("mix", ParamUnit::None, 0.0, 1.0, 1.0, "Echo level"),
        ParamDescriptor::toggle("keep_tail", false, "Let echoes ring past the input end"),
        ParamDescriptor::number(
            "max_tail_s",
            ParamUnit::Seconds,
            0.001,
            MAX_TAIL_S,
            10.0,
            "Longest echo tail kept",
        ),
    ];

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        match name {
            "delay_ms" => self.delay_ms = value.as_number(STAGE, name)?,
            "feedback" => self.feedback = value.as_number(STAGE, name)?,
            "mix" => self.mix = value.as_number(STAGE, name)?,
            "keep_tail" => self.keep_tail = value.as_bool(STAGE, name)?,
            "max_tail_s" => self.max_tail_s = value.as_number(STAGE, name)?,
            _ => return Err(unknown_param(STAGE, name, value)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lustre_core::ErrorKind;

    fn impulse(len: usize) -> SampleBuffer {
        let mut samples = vec![0.0; len];
        samples[0] = 1.0;
        SampleBuffer::mono(1000, samples).unwrap()
    }

    #[test]
    fn test_echo_train() {
        let delay = Delay {
            delay_ms: 10.0,
            feedback: 0.5,
            ..Delay::default()
        };
        let out = delay.apply(&impulse(40)).unwrap();
        let y = out.channel(0).unwrap();
        assert_eq!(y.len(), 40);
        assert_eq!(y[0], 1.0);
        assert_eq!(y[10], 0.5);
        assert_eq!(y[20], 0.25);
        assert_eq!(y[30], 0.125);
        assert_eq!(y[5], 0.0);
    }

    #[test]
    fn test_mix_scales_echoes_only() {
        let delay = Delay {
            delay_ms: 10.0,
            feedback: 0.5,
            mix: 0.5,
            ..Delay::default()
        };
        let out = delay.apply(&impulse(20)).unwrap();
        let y = out.channel(0).unwrap();
        assert_eq!(y[0], 1.0);
        assert_eq!(y[10], 0.25);
    }

    #[test]
    fn test_zero_feedback_is_identity() {
        let delay = Delay {
            feedback: 0.0,
            keep_tail: true,
            ..Delay::default()
        };
        let input = impulse(64);
        assert_eq!(delay.apply(&input).unwrap(), input);
    }

    #[test]
    fn test_tail_decays_below_floor() {
        let delay = Delay {
            delay_ms: 10.0,
            feedback: 0.5,
            keep_tail: true,
            ..Delay::default()
        };
        let out = delay.apply(&impulse(20)).unwrap();
        let y = out.channel(0).unwrap();
        assert!(y.len() > 20);
        // 0.5^k < 10^(-90/20) first holds at k = 15 echoes
        assert!(y.len() <= 20 + 16 * 10, "len {}", y.len());
        assert!(y[y.len() - 10..].iter().all(|v| v.abs() < 1e-4));
    }

    #[test]
    fn test_tail_capped_by_max_tail() {
        let delay = Delay {
            delay_ms: 10.0,
            feedback: 0.99,
            keep_tail: true,
            max_tail_s: 0.05,
            ..Delay::default()
        };
        let out = delay.apply(&impulse(20)).unwrap();
        assert_eq!(out.len(), 70);
    }

    #[test]
    fn test_unity_feedback_is_divergent() {
        let delay = Delay {
            feedback: 1.0,
            ..Delay::default()
        };
        let err = delay.apply(&impulse(8)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DivergentConfiguration);
        assert_eq!(err.param(), Some("feedback"));
        assert_eq!(err.stage(), "delay");
    }
}
