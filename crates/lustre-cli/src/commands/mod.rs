//! CLI command implementations.

pub mod analyze;
pub mod common;
pub mod effects;
pub mod export;
pub mod process;
pub mod spectrogram;
