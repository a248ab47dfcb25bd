//! Look-ahead brick-wall limiter.
//!
//! Whole-buffer limiting in four passes:
//!
//! 1. required gain per frame: `min(1, ceiling / max(|L|, |R|))`
//! 2. look-ahead minimum: the smallest required gain within the next
//!    `lookahead` frames (monotonic deque, O(n))
//! 3. attack ramp: a moving average over the look-ahead window, so gain
//!    reduction fades in before the peak instead of stepping
//! 4. release: gain recovers exponentially but never rises above the
//!    ramped target
//!
//! Every frame of the ramped target is ≤ the required gain at that frame,
//! so the limited signal never exceeds the ceiling. A final clamp removes
//! rounding residue so the post-condition holds exactly.

use crate::params::{Configurable, ParamDescriptor, ParamUnit, ParamValue, unknown_param};
use lustre_core::{
    Effect, EngineError, Result, SampleBuffer, check_range, db_to_linear, ms_to_samples,
    time_constant_coeff,
};
use std::collections::VecDeque;

const STAGE: &str = "limiter";

/// Brick-wall peak limiter.
///
/// # Example
///
/// ```rust
/// use lustre_core::{Effect, SampleBuffer};
/// use lustre_effects::Limiter;
///
/// let limiter = Limiter {
///     ceiling: 0.5,
///     ..Limiter::default()
/// };
/// let input = SampleBuffer::mono(48000, vec![0.1, 0.9, -1.2, 0.3]).unwrap();
/// let output = limiter.apply(&input).unwrap();
/// assert!(output.peak() <= 0.5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Limiter {
    /// Maximum output magnitude, linear, in `(0, 1]`.
    pub ceiling: f32,
    /// How far ahead peaks are anticipated.
    pub lookahead_ms: f32,
    /// Gain recovery time after a peak.
    pub release_ms: f32,
}

impl Default for Limiter {
    fn default() -> Self {
        Self {
            ceiling: db_to_linear(-0.1),
            lookahead_ms: 5.0,
            release_ms: 50.0,
        }
    }
}

impl Limiter {
    /// Limiter with the given ceiling and default timing.
    pub fn with_ceiling(ceiling: f32) -> Self {
        Self {
            ceiling,
            ..Self::default()
        }
    }

    /// Per-frame gain curve for `buffer`.
    pub fn gain_curve(&self, buffer: &SampleBuffer) -> Vec<f32> {
        let len = buffer.len();
        let channels = buffer.channels();
        let required: Vec<f32> = (0..len)
            .map(|i| {
                let peak = channels.iter().fold(0.0_f32, |acc, c| acc.max(c[i].abs()));
                if peak > self.ceiling {
                    self.ceiling / peak
                } else {
                    1.0
                }
            })
            .collect();

        let lookahead = ms_to_samples(self.lookahead_ms, buffer.sample_rate());
        let target = forward_min(&required, lookahead);
        let ramped = trailing_mean(&target, lookahead + 1);

        let release = time_constant_coeff(self.release_ms, buffer.sample_rate());
        let mut gain = 1.0_f32;
        ramped
            .iter()
            .map(|&t| {
                gain = if t <= gain {
                    t
                } else {
                    (release * gain + (1.0 - release) * t).min(t)
                };
                gain
            })
            .collect()
    }
}

/// `out[i] = min(values[i..=i + window])`, clipped at the end.
fn forward_min(values: &[f32], window: usize) -> Vec<f32> {
    let len = values.len();
    let mut out = vec![1.0_f32; len];
    let mut deque: VecDeque<usize> = VecDeque::new();

    // Walk backwards so the deque holds the upcoming window.
    for i in (0..len).rev() {
        while deque.back().is_some_and(|&j| values[j] >= values[i]) {
            deque.pop_back();
        }
        deque.push_back(i);
        while deque.front().is_some_and(|&j| j > i + window) {
            deque.pop_front();
        }
        if let Some(&j) = deque.front() {
            out[i] = values[j];
        }
    }
    out
}

/// Moving average over the last `window` values; the head is padded with
/// the first value.
fn trailing_mean(values: &[f32], window: usize) -> Vec<f32> {
    let window = window.max(1);
    let first = values.first().copied().unwrap_or(1.0);
    let mut history: VecDeque<f32> = std::iter::repeat_n(first, window).collect();
    let mut sum = f64::from(first) * window as f64;

    values
        .iter()
        .map(|&v| {
            if let Some(oldest) = history.pop_front() {
                sum -= f64::from(oldest);
            }
            history.push_back(v);
            sum += f64::from(v);
            ((sum / window as f64) as f32).min(1.0)
        })
        .collect()
}

impl Effect for Limiter {
    fn name(&self) -> &'static str {
        STAGE
    }

    fn validate(&self, _buffer: &SampleBuffer) -> Result<()> {
        validate_ceiling(STAGE, self.ceiling)?;
        check_range(STAGE, "lookahead_ms", self.lookahead_ms, 0.0, 100.0)?;
        check_range(STAGE, "release_ms", self.release_ms, 1.0, 5000.0)
    }

    fn process(&self, buffer: &SampleBuffer) -> Result<SampleBuffer> {
        let gains = self.gain_curve(buffer);
        let ceiling = self.ceiling;
        buffer.map_channels(|c| {
            c.iter()
                .zip(&gains)
                .map(|(x, g)| (x * g).clamp(-ceiling, ceiling))
                .collect()
        })
    }
}

pub(crate) fn validate_ceiling(stage: &str, ceiling: f32) -> Result<()> {
    if !(ceiling > 0.0 && ceiling <= 1.0) {
        return Err(EngineError::invalid_parameter(
            stage,
            "ceiling",
            ceiling,
            "must be in (0, 1]",
        ));
    }
    Ok(())
}

impl Configurable for Limiter {
    const PARAMS: &'static [ParamDescriptor] = &[
        ParamDescriptor::number(
            "ceiling",
            ParamUnit::None,
            0.0,
            1.0,
            0.98855,
            "Maximum output magnitude (linear)",
        ),
        ParamDescriptor::number(
            "lookahead_ms",
            ParamUnit::Milliseconds,
            0.0,
            100.0,
            5.0,
            "Peak anticipation window",
        ),
        ParamDescriptor::number(
            "release_ms",
            ParamUnit::Milliseconds,
            1.0,
            5000.0,
            50.0,
            "Gain recovery time",
        ),
    ];

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        match name {
            "ceiling" => self.ceiling = value.as_number(STAGE, name)?,
            "lookahead_ms" => self.lookahead_ms = value.as_number(STAGE, name)?,
            "release_ms" => self.release_ms = value.as_number(STAGE, name)?,
            _ => return Err(unknown_param(STAGE, name, value)),
        }
        Ok(())
    }
}
