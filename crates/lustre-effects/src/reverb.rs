//! Convolution reverb.
//!
//! The buffer is convolved with an [`ImpulseResponse`], either supplied by
//! the caller or synthesized from `room_size` and `damping`, then blended
//! with the dry signal:
//!
//! ```text
//! wet = x * ir                       (length N + M - 1)
//! y   = dry × (1 - mix) + wet × mix
//! ```
//!
//! Convolution runs as FFT overlap-add, one channel per rayon task. The
//! output is truncated to the input length unless `keep_tail` is set.
//!
//! The synthetic response is deterministic: exponentially decaying noise
//! from a seeded LCG, low-passed by `damping`, with a unit direct path at
//! `ir[0]`. The same parameters always produce the same output.

use crate::params::{Configurable, ParamDescriptor, ParamUnit, ParamValue, unknown_param};
use lustre_core::{
    Complex, Effect, EngineError, Fft, Result, SampleBuffer, check_range, wet_dry_mix,
};
use rayon::prelude::*;

const STAGE: &str = "reverb";

/// Upper bound on `max_ir_s`.
pub const MAX_IR_S: f32 = 60.0;

/// Decay to -60 dB, as a natural-log amplitude factor.
const LN_1000: f32 = 6.907_755;

/// Convolution kernel for [`Reverb`].
///
/// Mono responses are applied to every channel; stereo responses are
/// applied channel for channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpulseResponse {
    buffer: SampleBuffer,
}

impl ImpulseResponse {
    /// Wrap a recorded response.
    pub fn new(buffer: SampleBuffer) -> Result<Self> {
        if buffer.is_empty() {
            return Err(EngineError::empty_input("impulse_response"));
        }
        Ok(Self { buffer })
    }

    /// Synthesize a room response.
    ///
    /// `room_size` (0..1) stretches the decay; `damping` (0..1) shortens
    /// it and darkens the tail.
    pub fn synthetic(
        sample_rate: u32,
        num_channels: usize,
        duration_s: f32,
        room_size: f32,
        damping: f32,
        seed: u32,
    ) -> Result<Self> {
        let len = ((duration_s * sample_rate as f32).ceil() as usize).max(1);
        let t60 = duration_s * (0.2 + 0.8 * room_size) * (1.0 - 0.5 * damping);
        let decay_per_sample = LN_1000 / (t60 * sample_rate as f32).max(1.0);
        let smoothing = 0.9 * damping;

        let channels = (0..num_channels)
            .map(|ch| {
                let mut rng = Lcg::new(seed.wrapping_add(ch as u32));
                let mut lp = 0.0_f32;
                (0..len)
                    .map(|n| {
                        if n == 0 {
                            return 1.0;
                        }
                        let noise = 2.0 * rng.next_f32() - 1.0;
                        lp = (1.0 - smoothing) * noise + smoothing * lp;
                        0.5 * lp * libm::expf(-decay_per_sample * n as f32)
                    })
                    .collect()
            })
            .collect();

        Self::new(SampleBuffer::new(sample_rate, channels)?)
    }

    /// The response samples.
    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    /// Length in samples.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Always false; empty responses are rejected at construction.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.buffer.duration_secs()
    }

    /// Kernel for output channel `index`.
    pub fn channel_for(&self, index: usize) -> &[f32] {
        let last = self.buffer.num_channels() - 1;
        &self.buffer.channels()[index.min(last)]
    }

    fn at_rate(&self, sample_rate: u32) -> Result<Self> {
        if self.buffer.sample_rate() == sample_rate {
            return Ok(self.clone());
        }
        Ok(Self {
            buffer: self.buffer.resample(sample_rate)?,
        })
    }
}

/// Linear congruential generator (Numerical Recipes constants).
struct Lcg {
    state: u32,
}

impl Lcg {
    fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Uniform in [0, 1), from the upper 16 bits.
    fn next_f32(&mut self) -> f32 {
        self.state = self
            .state
            .wrapping_mul(1_664_525)
            .wrapping_add(1_013_904_223);
        let upper = (self.state >> 16) as u16;
        f32::from(upper) / 65_536.0
    }
}

/// Full linear convolution of `signal` with `kernel` by FFT overlap-add.
pub fn convolve(signal: &[f32], kernel: &[f32]) -> Vec<f32> {
    if signal.is_empty() || kernel.is_empty() {
        return Vec::new();
    }
    let out_len = signal.len() + kernel.len() - 1;
    let fft_size = (2 * kernel.len()).next_power_of_two().max(64);
    let block = fft_size - kernel.len() + 1;
    let fft = Fft::new(fft_size);

    let mut kernel_spectrum: Vec<Complex<f32>> = kernel
        .iter()
        .map(|&k| Complex::new(k, 0.0))
        .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
        .take(fft_size)
        .collect();
    fft.forward_complex(&mut kernel_spectrum);

    let mut out = vec![0.0_f32; out_len];
    let mut scratch = vec![Complex::new(0.0, 0.0); fft_size];
    for (b, chunk) in signal.chunks(block).enumerate() {
        let start = b * block;
        scratch.fill(Complex::new(0.0, 0.0));
        for (dst, &x) in scratch.iter_mut().zip(chunk) {
            dst.re = x;
        }
        fft.forward_complex(&mut scratch);
        for (s, h) in scratch.iter_mut().zip(&kernel_spectrum) {
            *s *= *h;
        }
        fft.inverse_complex(&mut scratch);

        let span = (chunk.len() + kernel.len() - 1).min(out_len - start);
        for (o, s) in out[start..start + span].iter_mut().zip(&scratch) {
            *o += s.re;
        }
    }
    out
}

/// Convolution reverb.
///
/// # Example
///
/// ```rust
/// use lustre_core::{Effect, SampleBuffer};
/// use lustre_effects::Reverb;
///
/// let reverb = Reverb {
///     ir_duration_s: 0.1,
///     ..Reverb::default()
/// };
/// let input = SampleBuffer::mono(8000, vec![0.5; 800]).unwrap();
/// let output = reverb.apply(&input).unwrap();
/// assert_eq!(output.len(), input.len());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Reverb {
    /// Room size, 0 (small) to 1 (large).
    pub room_size: f32,
    /// High-frequency damping, 0 to 1.
    pub damping: f32,
    /// Wet level, 0 (dry) to 1 (wet only).
    pub mix: f32,
    /// Length of the synthetic response.
    pub ir_duration_s: f32,
    /// Longest response accepted, at most [`MAX_IR_S`].
    pub max_ir_s: f32,
    /// Keep the reverb tail (output grows by the response length - 1).
    pub keep_tail: bool,
    /// Seed of the synthetic response.
    pub seed: u32,
    /// Caller-supplied response; replaces the synthetic one.
    pub impulse: Option<ImpulseResponse>,
}

impl Default for Reverb {
    fn default() -> Self {
        Self {
            room_size: 0.3,
            damping: 0.5,
            mix: 0.3,
            ir_duration_s: 2.0,
            max_ir_s: 10.0,
            keep_tail: false,
            seed: 0x5eed,
            impulse: None,
        }
    }
}

impl Reverb {
    /// Reverb with a caller-supplied response.
    pub fn with_impulse(impulse: ImpulseResponse) -> Self {
        Self {
            impulse: Some(impulse),
            ..Self::default()
        }
    }

    /// The response used for `buffer`, at its sample rate.
    pub fn impulse_for(&self, buffer: &SampleBuffer) -> Result<ImpulseResponse> {
        match &self.impulse {
            Some(ir) => ir.at_rate(buffer.sample_rate()),
            None => ImpulseResponse::synthetic(
                buffer.sample_rate(),
                buffer.num_channels(),
                self.ir_duration_s,
                self.room_size,
                self.damping,
                self.seed,
            ),
        }
    }
}

impl Effect for Reverb {
    fn name(&self) -> &'static str {
        STAGE
    }

    fn validate(&self, _buffer: &SampleBuffer) -> Result<()> {
        check_range(STAGE, "room_size", self.room_size, 0.0, 1.0)?;
        check_range(STAGE, "damping", self.damping, 0.0, 1.0)?;
        check_range(STAGE, "mix", self.mix, 0.0, 1.0)?;
        check_range(STAGE, "max_ir_s", self.max_ir_s, 0.01, MAX_IR_S)?;
        match &self.impulse {
            Some(ir) if ir.duration_secs() > f64::from(self.max_ir_s) => {
                Err(EngineError::invalid_parameter(
                    STAGE,
                    "impulse_response",
                    format!("{:.3} s", ir.duration_secs()),
                    format!("longer than max_ir_s ({} s)", self.max_ir_s),
                ))
            }
            Some(_) => Ok(()),
            None => check_range(
                STAGE,
                "ir_duration_s",
                self.ir_duration_s,
                0.01,
                self.max_ir_s,
            ),
        }
    }

    fn process(&self, buffer: &SampleBuffer) -> Result<SampleBuffer> {
        let ir = self.impulse_for(buffer)?;
        let len = buffer.len();
        let mix = self.mix;

        let channels: Vec<Vec<f32>> = buffer
            .channels()
            .par_iter()
            .enumerate()
            .map(|(ch, dry)| {
                let wet = convolve(dry, ir.channel_for(ch));
                let keep = if self.keep_tail { wet.len() } else { len };
                wet.iter()
                    .take(keep)
                    .enumerate()
                    .map(|(n, &w)| wet_dry_mix(dry.get(n).copied().unwrap_or(0.0), w, mix))
                    .collect()
            })
            .collect();

        tracing::debug!(ir_len = ir.len(), keep_tail = self.keep_tail, "reverb: convolved");
        buffer.with_channels(channels)
    }
}

impl Configurable for Reverb {
    const PARAMS: &'static [ParamDescriptor] = &[
        ParamDescriptor::number("room_size", ParamUnit::None, 0.0, 1.0, 0.3, "Decay length"),
        ParamDescriptor::number("damping", ParamUnit::None, 0.0, 1.0, 0.5, "Tail darkening"),
        ParamDescriptor::number("mix", ParamUnit::None, 0.0, 1.0, 0.3, "Wet level"),
        ParamDescriptor::number(
            "ir_duration_s",
            ParamUnit::Seconds,
            0.01,
            10.0,
            2.0,
            "Synthetic response length",
        ),
        ParamDescriptor::number(
            "max_ir_s",
            ParamUnit::Seconds,
            0.01,
            MAX_IR_S,
            10.0,
            "Longest response accepted",
        ),
        ParamDescriptor::toggle("keep_tail", false, "Append the reverb tail"),
        ParamDescriptor::number(
            "seed",
            ParamUnit::None,
            0.0,
            16_777_216.0,
            24301.0,
            "Synthetic response seed",
        ),
    ];

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        match name {
            "room_size" => self.room_size = value.as_number(STAGE, name)?,
            "damping" => self.damping = value.as_number(STAGE, name)?,
            "mix" => self.mix = value.as_number(STAGE, name)?,
            "ir_duration_s" => self.ir_duration_s = value.as_number(STAGE, name)?,
            "max_ir_s" => self.max_ir_s = value.as_number(STAGE, name)?,
            "keep_tail" => self.keep_tail = value.as_bool(STAGE, name)?,
            "seed" => {
                let seed = value.as_number(STAGE, name)?;
                if !(0.0..=16_777_216.0).contains(&seed) || seed.fract() != 0.0 {
                    return Err(EngineError::invalid_parameter(
                        STAGE,
                        name,
                        seed,
                        "must be a non-negative integer",
                    ));
                }
                self.seed = seed as u32;
            }
            _ => return Err(unknown_param(STAGE, name, value)),
        }
        Ok(())
    }
}
