//! Mid/side stereo width control.
//!
//! ```text
//! mid  = (L + R) / 2
//! side = (L - R) / 2 × width
//! L'   = mid + side
//! R'   = mid - side
//! ```
//!
//! A width of 0 folds the image to mono, 1 leaves it unchanged, values
//! above 1 widen. Widths above [`MAX_WIDTH`] are clamped: past that point
//! the side signal dominates and mono compatibility collapses.

use crate::params::{Configurable, ParamDescriptor, ParamUnit, ParamValue, unknown_param};
use lustre_core::{Effect, EngineError, Result, SampleBuffer};

const STAGE: &str = "stereo_widener";

/// Largest width applied; larger settings are clamped with a warning.
pub const MAX_WIDTH: f32 = 4.0;

/// Mid/side stereo widener.
///
/// Mono buffers pass through unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct StereoWidener {
    /// Side-channel scale factor, ≥ 0.
    pub width: f32,
}

impl Default for StereoWidener {
    fn default() -> Self {
        Self { width: 1.5 }
    }
}

impl StereoWidener {
    /// Widener with the given width.
    pub fn new(width: f32) -> Self {
        Self { width }
    }

    /// The width actually applied after clamping.
    pub fn effective_width(&self) -> f32 {
        self.width.min(MAX_WIDTH)
    }
}

impl Effect for StereoWidener {
    fn name(&self) -> &'static str {
        STAGE
    }

    fn validate(&self, _buffer: &SampleBuffer) -> Result<()> {
        if self.width.is_nan() || self.width < 0.0 {
            return Err(EngineError::invalid_parameter(
                STAGE,
                "width",
                self.width,
                "must be >= 0",
            ));
        }
        Ok(())
    }

    fn process(&self, buffer: &SampleBuffer) -> Result<SampleBuffer> {
        let [left, right] = buffer.channels() else {
            tracing::debug!("stereo_widener: mono input, passing through");
            return Ok(buffer.clone());
        };

        if self.width > MAX_WIDTH {
            tracing::warn!(
                requested = self.width,
                applied = MAX_WIDTH,
                "stereo_widener: width clamped"
            );
        }
        let width = self.effective_width();
        if width == 1.0 {
            return Ok(buffer.clone());
        }

        let (l, r): (Vec<f32>, Vec<f32>) = left
            .iter()
            .zip(right)
            .map(|(&l, &r)| {
                let mid = (l + r) * 0.5;
                let side = (l - r) * 0.5 * width;
                (mid + side, mid - side)
            })
            .unzip();
        buffer.with_channels(vec![l, r])
    }
}

impl Configurable for StereoWidener {
    const PARAMS: &'static [ParamDescriptor] = &[ParamDescriptor::number(
        "width",
        ParamUnit::None,
        0.0,
        MAX_WIDTH,
        1.5,
        "Side-channel scale (0 = mono, 1 = unchanged)",
    )];

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        match name {
            "width" => self.width = value.as_number(STAGE, name)?,
            _ => return Err(unknown_param(STAGE, name, value)),
        }
        Ok(())
    }
}
