//! Shelving and peaking equalizer.
//!
//! Signal flow per channel:
//!
//! ```text
//! Input → Low Shelf → Peak 1 → ... → Peak N → High Shelf → Output
//! ```
//!
//! Every stage is an RBJ biquad. Stages with 0 dB gain are skipped, so a
//! flat equalizer passes audio through unchanged.

use crate::params::{Configurable, ParamDescriptor, ParamUnit, ParamValue, unknown_param};
use lustre_core::{
    Biquad, Effect, EngineError, Result, SampleBuffer, check_frequency, check_range,
    high_shelf_coefficients, low_shelf_coefficients, peaking_eq_coefficients,
};

const STAGE: &str = "equalizer";

/// One peaking band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EqBand {
    /// Center frequency in Hz.
    pub freq_hz: f32,
    /// Boost (positive) or cut (negative) in dB.
    pub gain_db: f32,
    /// Quality factor; bandwidth is `freq_hz / q`.
    pub q: f32,
}

impl EqBand {
    /// Create a band.
    pub fn new(freq_hz: f32, gain_db: f32, q: f32) -> Self {
        Self {
            freq_hz,
            gain_db,
            q,
        }
    }
}

impl Default for EqBand {
    fn default() -> Self {
        Self::new(1000.0, 0.0, 1.0)
    }
}

/// Low shelf, high shelf and any number of peaking bands.
///
/// # Example
///
/// ```rust
/// use lustre_core::{Effect, SampleBuffer};
/// use lustre_effects::{EqBand, Equalizer};
///
/// let eq = Equalizer {
///     bands: vec![EqBand::new(3000.0, -4.0, 2.0)],
///     ..Equalizer::default()
/// };
/// let input = SampleBuffer::mono(44100, vec![0.0; 1024]).unwrap();
/// assert!(eq.apply(&input).is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Equalizer {
    /// Low-shelf corner frequency.
    pub low_shelf_hz: f32,
    /// Low-shelf gain.
    pub low_shelf_gain_db: f32,
    /// High-shelf corner frequency.
    pub high_shelf_hz: f32,
    /// High-shelf gain.
    pub high_shelf_gain_db: f32,
    /// Q shared by both shelves.
    pub shelf_q: f32,
    /// Peaking bands, applied between the shelves.
    pub bands: Vec<EqBand>,
}

impl Default for Equalizer {
    fn default() -> Self {
        Self {
            low_shelf_hz: 200.0,
            low_shelf_gain_db: 0.8,
            high_shelf_hz: 8000.0,
            high_shelf_gain_db: 0.4,
            shelf_q: 0.707,
            bands: vec![EqBand::default()],
        }
    }
}

impl Equalizer {
    /// An equalizer with every gain at 0 dB.
    pub fn flat() -> Self {
        Self {
            low_shelf_gain_db: 0.0,
            high_shelf_gain_db: 0.0,
            ..Self::default()
        }
    }

    /// Biquad cascade for one channel at `sample_rate`.
    fn filters(&self, sample_rate: u32) -> Vec<Biquad> {
        let sr = sample_rate as f32;
        let mut filters = Vec::with_capacity(self.bands.len() + 2);

        if self.low_shelf_gain_db != 0.0 {
            filters.push(Biquad::with_coefficients(low_shelf_coefficients(
                self.low_shelf_hz,
                self.shelf_q,
                self.low_shelf_gain_db,
                sr,
            )));
        }
        for band in self.bands.iter().filter(|b| b.gain_db != 0.0) {
            filters.push(Biquad::with_coefficients(peaking_eq_coefficients(
                band.freq_hz,
                band.q,
                band.gain_db,
                sr,
            )));
        }
        if self.high_shelf_gain_db != 0.0 {
            filters.push(Biquad::with_coefficients(high_shelf_coefficients(
                self.high_shelf_hz,
                self.shelf_q,
                self.high_shelf_gain_db,
                sr,
            )));
        }
        filters
    }
}

fn check_q(param: &str, q: f32, max: f32) -> Result<()> {
    if !(q > 0.0 && q <= max) {
        return Err(EngineError::invalid_parameter(
            STAGE,
            param,
            q,
            format!("must be in (0, {max}]"),
        ));
    }
    Ok(())
}

impl Effect for Equalizer {
    fn name(&self) -> &'static str {
        STAGE
    }

    fn validate(&self, buffer: &SampleBuffer) -> Result<()> {
        let sr = buffer.sample_rate();
        check_frequency(STAGE, "low_shelf_hz", self.low_shelf_hz, sr)?;
        check_range(STAGE, "low_shelf_gain_db", self.low_shelf_gain_db, -24.0, 24.0)?;
        check_frequency(STAGE, "high_shelf_hz", self.high_shelf_hz, sr)?;
        check_range(STAGE, "high_shelf_gain_db", self.high_shelf_gain_db, -24.0, 24.0)?;
        check_q("shelf_q", self.shelf_q, 10.0)?;

        for (i, band) in self.bands.iter().enumerate() {
            check_frequency(STAGE, &format!("bands[{i}].freq_hz"), band.freq_hz, sr)?;
            check_range(STAGE, &format!("bands[{i}].gain_db"), band.gain_db, -24.0, 24.0)?;
            check_q(&format!("bands[{i}].q"), band.q, 20.0)?;
        }
        Ok(())
    }

    fn process(&self, buffer: &SampleBuffer) -> Result<SampleBuffer> {
        let template = self.filters(buffer.sample_rate());
        buffer.map_channels(|channel| {
            let mut filters = template.clone();
            let mut out = channel.to_vec();
            for filter in &mut filters {
                out = filter.process_slice(&out);
            }
            out
        })
    }
}

impl Configurable for Equalizer {
    const PARAMS: &'static [ParamDescriptor] = &[
        ParamDescriptor::number(
            "low_shelf_hz",
            ParamUnit::Hertz,
            1.0,
            24000.0,
            200.0,
            "Low-shelf corner frequency",
        ),
        ParamDescriptor::number(
            "low_shelf_gain_db",
            ParamUnit::Decibels,
            -24.0,
            24.0,
            0.8,
            "Low-shelf gain",
        ),
        ParamDescriptor::number(
            "high_shelf_hz",
            ParamUnit::Hertz,
            1.0,
            24000.0,
            8000.0,
            "High-shelf corner frequency",
        ),
        ParamDescriptor::number(
            "high_shelf_gain_db",
            ParamUnit::Decibels,
            -24.0,
            24.0,
            0.4,
            "High-shelf gain",
        ),
        ParamDescriptor::number("shelf_q", ParamUnit::None, 0.01, 10.0, 0.707, "Shelf slope"),
        ParamDescriptor::list(
            "bands",
            ParamUnit::None,
            -24.0,
            24000.0,
            &[1000.0, 0.0, 1.0],
            "Peaking bands as freq_hz, gain_db, q triples",
        ),
    ];

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        match name {
            "low_shelf_hz" => self.low_shelf_hz = value.as_number(STAGE, name)?,
            "low_shelf_gain_db" => self.low_shelf_gain_db = value.as_number(STAGE, name)?,
            "high_shelf_hz" => self.high_shelf_hz = value.as_number(STAGE, name)?,
            "high_shelf_gain_db" => self.high_shelf_gain_db = value.as_number(STAGE, name)?,
            "shelf_q" => self.shelf_q = value.as_number(STAGE, name)?,
            "bands" => {
                let flat = value.as_list(STAGE, name)?;
                if flat.len() % 3 != 0 {
                    return Err(EngineError::invalid_parameter(
                        STAGE,
                        name,
                        value,
                        "expected freq_hz, gain_db, q triples",
                    ));
                }
                self.bands = flat
                    .chunks_exact(3)
                    .map(|t| EqBand::new(t[0], t[1], t[2]))
                    .collect();
            }
            _ => return Err(unknown_param(STAGE, name, value)),
        }
        Ok(())
    }
}
