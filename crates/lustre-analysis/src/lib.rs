//! Lustre Analysis - descriptors for quality assessment
//!
//! [`Analyzer::analyze`] turns a [`SampleBuffer`](lustre_core::SampleBuffer)
//! into an [`AnalysisReport`] with four groups of descriptors:
//!
//! - [`spectral`] - Centroid, rolloff, bandwidth, zero-crossing rate
//! - [`rhythm`] - Spectral-flux onsets, autocorrelation tempo, beat times
//! - [`tonal`] - Chroma and Krumhansl-Kessler key estimation
//! - [`dynamics`] - RMS, peak, noise floor, dynamic range, crest factor
//!
//! [`spectrogram`] computes and exports magnitude spectrograms (CSV, PGM);
//! [`report`] exports the report as flat JSON.
//!
//! ## Example
//!
//! ```rust
//! use lustre_analysis::Analyzer;
//! use lustre_core::SampleBuffer;
//!
//! let samples: Vec<f32> = (0..44100)
//!     .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / 44100.0).sin())
//!     .collect();
//! let buffer = SampleBuffer::mono(44100, samples).unwrap();
//!
//! let report = Analyzer::default().analyze(&buffer).unwrap();
//! assert!((report.spectral.centroid.mean - 1000.0).abs() < 50.0);
//! ```

pub mod analyzer;
pub mod dynamics;
pub mod report;
pub mod rhythm;
pub mod spectral;
pub mod spectrogram;
pub mod tonal;

pub use analyzer::Analyzer;
pub use dynamics::LoudnessDescriptors;
pub use report::{AnalysisReport, FlatReport, NO_KEY};
pub use rhythm::BeatDescriptors;
pub use spectral::{SpectralDescriptors, Summary};
pub use spectrogram::{DEFAULT_DB_RANGE, Spectrogram};
pub use tonal::{Key, KeyEstimate, Mode};
