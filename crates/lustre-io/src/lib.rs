//! Codec gateway for the lustre engine.
//!
//! This crate provides:
//!
//! - **Decoding**: WAV, FLAC, MP3, Ogg Vorbis and AAC (MP4/M4A) through
//!   symphonia, with optional resampling to a target rate
//! - **Encoding**: WAV through hound, FLAC through libFLAC, MP3 through LAME
//!   and Ogg Vorbis through libvorbis, with tags in each container's own form
//! - **Quality**: per-format [`QualityOptions`] and named [`QualityPreset`]s
//! - **Batch export**: [`CodecGateway::export_batch`] encodes one buffer into
//!   several formats in parallel; each entry succeeds or fails on its own
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lustre_io::{CodecGateway, ExportRequest, Metadata, QualityPreset};
//!
//! let gateway = CodecGateway::new().with_target_sample_rate(44100);
//! let buffer = gateway.decode_file("input.mp3")?;
//!
//! let requests = ExportRequest::batch(&["wav", "flac", "mp3"], QualityPreset::High);
//! for entry in gateway.export_batch(&buffer, &requests, &Metadata::titled("Master")) {
//!     println!("{}: {}", entry.request, entry.is_ok());
//! }
//! # Ok::<(), lustre_io::CodecError>(())
//! ```

pub mod decode;
pub mod flac;
pub mod format;
pub mod gateway;
pub mod metadata;
pub mod mp3;
pub mod quality;
pub mod vorbis;
pub mod wav;

pub use decode::decode_bytes;
pub use flac::encode_flac;
pub use format::{FormatHint, OutputFormat};
pub use gateway::{CodecGateway, ExportRequest, ExportResult};
pub use metadata::Metadata;
pub use mp3::encode_mp3;
pub use quality::{EncoderSettings, QualityOptions, QualityPreset};
pub use vorbis::encode_vorbis;
pub use wav::encode_wav;

use lustre_core::{EngineError, ErrorKind};

/// Error types for codec operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Validation failure shared with the rest of the engine.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// WAV write error.
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    /// Container or codec failure while decoding.
    #[error("decode error: {0}")]
    Decode(#[from] symphonia::core::errors::Error),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A native encoder reported failure.
    #[error("{encoder} encoder failed: {message}")]
    EncoderFailed {
        /// Format being encoded.
        encoder: String,
        /// Encoder diagnostics.
        message: String,
    },
}

impl CodecError {
    /// Engine-wide error category, where one applies.
    pub fn kind(&self) -> Option<ErrorKind> {
        use symphonia::core::errors::Error as SymphoniaError;
        match self {
            Self::Engine(e) => Some(e.kind()),
            Self::Wav(hound::Error::Unsupported)
            | Self::Decode(SymphoniaError::Unsupported(_)) => Some(ErrorKind::UnsupportedFormat),
            _ => None,
        }
    }

    /// The stage that failed.
    pub fn stage(&self) -> &str {
        match self {
            Self::Engine(e) => e.stage(),
            Self::Wav(_) => "wav",
            Self::EncoderFailed { encoder, .. } => encoder,
            Self::Decode(_) | Self::Io(_) => format::STAGE,
        }
    }
}

/// Convenience result type for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;
