//! Spectral-subtraction noise reduction.
//!
//! 1. Frame the signal with the STFT.
//! 2. Rank frames by level and take the quietest ones at or below
//!    `threshold_db`, up to `profile_duration_s` worth of audio. Their mean
//!    magnitude per bin is the noise profile.
//! 3. Subtract the profile from every frame, keeping the phase:
//!
//! ```text
//! |X'| = max(|X| - strength × over_subtraction × N, spectral_floor × |X|)
//! ```
//!
//! 4. Inverse STFT.
//!
//! The spectral floor keeps a fraction of every bin so subtraction never
//! leaves holes that ring as "musical noise". If no frame is quiet enough to
//! serve as a profile, the effect returns its input unchanged and reports
//! [`NoiseProfile::NotFound`].

use crate::params::{Configurable, ParamDescriptor, ParamUnit, ParamValue, unknown_param};
use lustre_core::{
    Effect, EngineError, Result, SampleBuffer, SpectralEngine, check_range, is_power_of_two,
    linear_to_db,
};

const STAGE: &str = "noise_reduction";

/// Outcome of noise profiling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoiseProfile {
    /// A profile was estimated.
    Estimated {
        /// Frames that contributed to the profile.
        frames: usize,
        /// Mean level of those frames in dBFS.
        level_db: f32,
    },
    /// Every frame was louder than the threshold; nothing was subtracted.
    NotFound,
}

/// Spectral-subtraction denoiser.
///
/// # Example
///
/// ```rust
/// use lustre_core::SampleBuffer;
/// use lustre_effects::{NoiseProfile, NoiseReduction};
///
/// // a loud tone has no noise-only frames
/// let tone: Vec<f32> = (0..8192).map(|i| 0.8 * (i as f32 * 0.05).sin()).collect();
/// let input = SampleBuffer::mono(16000, tone).unwrap();
/// let (output, profile) = NoiseReduction::default().apply_with_report(&input).unwrap();
/// assert_eq!(profile, NoiseProfile::NotFound);
/// assert_eq!(output, input);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseReduction {
    /// Amount of quiet audio used to estimate the profile.
    pub profile_duration_s: f32,
    /// Subtraction strength, 0 (off) to 1.
    pub strength: f32,
    /// Profile multiplier; > 1 subtracts more than the measured noise.
    pub over_subtraction: f32,
    /// Fraction of each bin always kept.
    pub spectral_floor: f32,
    /// Frames louder than this never count as noise.
    pub threshold_db: f32,
    /// STFT window size (power of two).
    pub window_size: usize,
    /// STFT hop size.
    pub hop_size: usize,
}

impl Default for NoiseReduction {
    fn default() -> Self {
        Self {
            profile_duration_s: 0.5,
            strength: 1.0,
            over_subtraction: 2.0,
            spectral_floor: 0.1,
            threshold_db: -40.0,
            window_size: 2048,
            hop_size: 512,
        }
    }
}

impl NoiseReduction {
    /// Validate, denoise, and report how the profile was obtained.
    pub fn apply_with_report(&self, buffer: &SampleBuffer) -> Result<(SampleBuffer, NoiseProfile)> {
        if buffer.is_empty() {
            return Err(EngineError::empty_input(STAGE));
        }
        self.validate(buffer)?;
        self.denoise(buffer)
    }

    /// Level in dBFS of each STFT frame of the mono downmix.
    ///
    /// Only samples inside the signal count, and frames covering fewer than
    /// `min(window / 2, len)` real samples are skipped (`None`), so padded
    /// edges never look artificially quiet.
    fn frame_levels(&self, mono: &[f32], num_frames: usize) -> Vec<Option<f32>> {
        let pad = self.window_size - self.hop_size;
        let min_coverage = (self.window_size / 2).min(mono.len()).max(1);

        (0..num_frames)
            .map(|k| {
                let start = (k * self.hop_size).saturating_sub(pad);
                let end = (k * self.hop_size + self.window_size)
                    .saturating_sub(pad)
                    .min(mono.len());
                let span = mono.get(start..end).unwrap_or(&[]);
                if span.len() < min_coverage {
                    return None;
                }
                let mean_sq = span.iter().map(|x| x * x).sum::<f32>() / span.len() as f32;
                Some(linear_to_db(mean_sq.sqrt()))
            })
            .collect()
    }

    fn denoise(&self, buffer: &SampleBuffer) -> Result<(SampleBuffer, NoiseProfile)> {
        let engine = SpectralEngine::new(self.window_size, self.hop_size)?;
        let mut frames = engine.forward(buffer)?;
        let levels = self.frame_levels(&buffer.to_mono(), frames.num_frames());

        let mut candidates: Vec<(usize, f32)> = levels
            .iter()
            .enumerate()
            .filter_map(|(k, level)| level.map(|l| (k, l)))
            .filter(|&(_, l)| l <= self.threshold_db)
            .collect();
        candidates.sort_by(|a, b| a.1.total_cmp(&b.1));

        let wanted = ((self.profile_duration_s * buffer.sample_rate() as f32
            / self.hop_size as f32)
            .ceil() as usize)
            .max(1);
        candidates.truncate(wanted);

        if candidates.is_empty() {
            tracing::warn!(
                threshold_db = self.threshold_db,
                "noise_reduction: no frame below threshold, no noise profile found"
            );
            return Ok((buffer.clone(), NoiseProfile::NotFound));
        }

        let level_db =
            candidates.iter().map(|&(_, l)| l).sum::<f32>() / candidates.len() as f32;
        let amount = self.strength * self.over_subtraction;
        let bins = frames.num_bins();

        for channel in &mut frames.channels {
            let mut profile = vec![0.0_f32; bins];
            for &(k, _) in &candidates {
                for (p, c) in profile.iter_mut().zip(&channel[k]) {
                    *p += c.norm();
                }
            }
            let scale = 1.0 / candidates.len() as f32;
            profile.iter_mut().for_each(|p| *p *= scale);

            for frame in channel.iter_mut() {
                for (bin, noise) in frame.iter_mut().zip(&profile) {
                    let mag = bin.norm();
                    if mag <= 0.0 {
                        continue;
                    }
                    let cleaned = (mag - amount * noise).max(self.spectral_floor * mag);
                    *bin *= cleaned / mag;
                }
            }
        }

        tracing::debug!(
            frames = candidates.len(),
            level_db,
            "noise_reduction: profile estimated"
        );
        let output = engine.inverse(&frames)?;
        Ok((
            output,
            NoiseProfile::Estimated {
                frames: candidates.len(),
                level_db,
            },
        ))
    }
}

impl Effect for NoiseReduction {
    fn name(&self) -> &'static str {
        STAGE
    }

    fn validate(&self, _buffer: &SampleBuffer) -> Result<()> {
        check_range(STAGE, "profile_duration_s", self.profile_duration_s, 0.05, 10.0)?;
        check_range(STAGE, "strength", self.strength, 0.0, 1.0)?;
        check_range(STAGE, "over_subtraction", self.over_subtraction, 1.0, 4.0)?;
        check_range(STAGE, "spectral_floor", self.spectral_floor, 0.0, 1.0)?;
        check_range(STAGE, "threshold_db", self.threshold_db, -120.0, 0.0)?;
        if !is_power_of_two(self.window_size) || !(64..=16384).contains(&self.window_size) {
            return Err(EngineError::invalid_parameter(
                STAGE,
                "window_size",
                self.window_size,
                "must be a power of two in 64..=16384",
            ));
        }
        if self.hop_size == 0 || self.hop_size > self.window_size {
            return Err(EngineError::invalid_parameter(
                STAGE,
                "hop_size",
                self.hop_size,
                format!("must be in 1..={}", self.window_size),
            ));
        }
        Ok(())
    }

    fn process(&self, buffer: &SampleBuffer) -> Result<SampleBuffer> {
        self.denoise(buffer).map(|(output, _)| output)
    }
}

fn as_size(param: &str, value: &ParamValue) -> Result<usize> {
    let v = value.as_number(STAGE, param)?;
    if v < 0.0 || v.fract() != 0.0 || !v.is_finite() {
        return Err(EngineError::invalid_parameter(
            STAGE,
            param,
            v,
            "must be a whole number of samples",
        ));
    }
    Ok(v as usize)
}

impl Configurable for NoiseReduction {
    const PARAMS: &'static [ParamDescriptor] = &[
        ParamDescriptor::number(
            "profile_duration_s",
            ParamUnit::Seconds,
            0.05,
            10.0,
            0.5,
            "Quiet audio used to estimate the noise",
        ),
        ParamDescriptor::number("strength", ParamUnit::None, 0.0, 1.0, 1.0, "Subtraction amount"),
        ParamDescriptor::number(
            "over_subtraction",
            ParamUnit::Ratio,
            1.0,
            4.0,
            2.0,
            "Noise profile multiplier",
        ),
        ParamDescriptor::number(
            "spectral_floor",
            ParamUnit::None,
            0.0,
            1.0,
            0.1,
            "Fraction of each bin always kept",
        ),
        ParamDescriptor::number(
            "threshold_db",
            ParamUnit::Decibels,
            -120.0,
            0.0,
            -40.0,
            "Frames louder than this are never noise",
        ),
        ParamDescriptor::number(
            "window_size",
            ParamUnit::Samples,
            64.0,
            16384.0,
            2048.0,
            "STFT window (power of two)",
        ),
        ParamDescriptor::number(
            "hop_size",
            ParamUnit::Samples,
            1.0,
            16384.0,
            512.0,
            "STFT hop",
        ),
    ];

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        match name {
            "profile_duration_s" => self.profile_duration_s = value.as_number(STAGE, name)?,
            "strength" => self.strength = value.as_number(STAGE, name)?,
            "over_subtraction" => self.over_subtraction = value.as_number(STAGE, name)?,
            "spectral_floor" => self.spectral_floor = value.as_number(STAGE, name)?,
            "threshold_db" => self.threshold_db = value.as_number(STAGE, name)?,
            "window_size" => self.window_size = as_size(name, value)?,
            "hop_size" => self.hop_size = as_size(name, value)?,
            _ => return Err(unknown_param(STAGE, name, value)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lustre_core::ErrorKind;

    /// Deterministic white-ish noise in [-amp, amp).
    fn noise(len: usize, amp: f32, seed: u32) -> Vec<f32> {
        let mut state = seed;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                amp * (2.0 * f32::from((state >> 16) as u16) / 65_536.0 - 1.0)
            })
            .collect()
    }

    fn rms(x: &[f32]) -> f32 {
        (x.iter().map(|s| s * s).sum::<f32>() / x.len() as f32).sqrt()
    }

    /// One second of noise, with a 440 Hz tone over the second half.
    fn noisy_tone() -> SampleBuffer {
        let sr = 16000;
        let mut samples = noise(sr, 0.005, 3);
        for (i, s) in samples.iter_mut().enumerate().skip(sr / 2) {
            *s += 0.5 * (2.0 * core::f32::consts::PI * 440.0 * i as f32 / sr as f32).sin();
        }
        SampleBuffer::mono(sr as u32, samples).unwrap()
    }

    #[test]
    fn test_reduces_noise_in_quiet_section() {
        let input = noisy_tone();
        let nr = NoiseReduction {
            window_size: 512,
            hop_size: 128,
            ..NoiseReduction::default()
        };
        let (output, profile) = nr.apply_with_report(&input).unwrap();
        assert!(matches!(profile, NoiseProfile::Estimated { frames, .. } if frames > 0));
        assert_eq!(output.len(), input.len());

        let before = rms(&input.channel(0).unwrap()[1000..7000]);
        let after = rms(&output.channel(0).unwrap()[1000..7000]);
        assert!(after < before * 0.5, "before {before}, after {after}");

        // the tone survives
        let tone_before = rms(&input.channel(0).unwrap()[9000..15000]);
        let tone_after = rms(&output.channel(0).unwrap()[9000..15000]);
        assert!(tone_after > tone_before * 0.8);
    }

    #[test]
    fn test_zero_strength_roundtrips() {
        let input = noisy_tone();
        let nr = NoiseReduction {
            strength: 0.0,
            window_size: 512,
            hop_size: 128,
            ..NoiseReduction::default()
        };
        let output = nr.apply(&input).unwrap();
        for (a, b) in output.channel(0).unwrap().iter().zip(input.channel(0).unwrap()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_loud_signal_reports_no_profile() {
        let samples: Vec<f32> = (0..4096).map(|i| 0.7 * (i as f32 * 0.2).sin()).collect();
        let input = SampleBuffer::stereo(16000, samples.clone(), samples).unwrap();
        let nr = NoiseReduction {
            window_size: 256,
            hop_size: 64,
            ..NoiseReduction::default()
        };
        let (output, profile) = nr.apply_with_report(&input).unwrap();
        assert_eq!(profile, NoiseProfile::NotFound);
        assert_eq!(output, input);
    }

    #[test]
    fn test_rejects_bad_window() {
        let input = SampleBuffer::mono(16000, vec![0.0; 1024]).unwrap();
        let nr = NoiseReduction {
            window_size: 1000,
            ..NoiseReduction::default()
        };
        let err = nr.apply(&input).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        assert_eq!(err.param(), Some("window_size"));
    }

    #[test]
    fn test_rejects_strength_above_one() {
        let input = SampleBuffer::mono(16000, vec![0.0; 1024]).unwrap();
        let nr = NoiseReduction {
            strength: 1.5,
            ..NoiseReduction::default()
        };
        assert_eq!(nr.apply(&input).unwrap_err().param(), Some("strength"));
    }

    #[test]
    fn test_window_size_from_param() {
        let mut nr = NoiseReduction::default();
        nr.set_param("window_size", &ParamValue::Number(1024.0)).unwrap();
        assert_eq!(nr.window_size, 1024);
        assert!(nr.set_param("hop_size", &ParamValue::Number(12.5)).is_err());
    }
}
