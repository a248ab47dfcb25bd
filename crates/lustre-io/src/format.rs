//! Container formats accepted for decoding and produced by encoding.

use lustre_core::EngineError;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Stage name carried by codec errors.
pub(crate) const STAGE: &str = "codec";

/// Input container hint for decoding.
///
/// `Auto` lets symphonia identify the container by content; the other
/// variants seed its detection with the matching file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FormatHint {
    /// Detect the container from its bytes.
    #[default]
    Auto,
    /// RIFF WAVE.
    Wav,
    /// MPEG-1/2 Layer III.
    Mp3,
    /// Free Lossless Audio Codec.
    Flac,
    /// Ogg Vorbis.
    Ogg,
    /// MPEG-4 audio (AAC in an ISO-BMFF container).
    M4a,
}

impl FormatHint {
    /// File extension passed to symphonia, if any.
    pub fn extension(self) -> Option<&'static str> {
        match self {
            FormatHint::Auto => None,
            FormatHint::Wav => Some("wav"),
            FormatHint::Mp3 => Some("mp3"),
            FormatHint::Flac => Some("flac"),
            FormatHint::Ogg => Some("ogg"),
            FormatHint::M4a => Some("m4a"),
        }
    }

    /// Hint from a file path's extension; `Auto` when unknown or missing.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
            .unwrap_or(FormatHint::Auto)
    }
}

impl FromStr for FormatHint {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(FormatHint::Auto),
            "wav" | "wave" => Ok(FormatHint::Wav),
            "mp3" => Ok(FormatHint::Mp3),
            "flac" => Ok(FormatHint::Flac),
            "ogg" | "oga" => Ok(FormatHint::Ogg),
            "m4a" | "mp4" | "aac" => Ok(FormatHint::M4a),
            _ => Err(EngineError::unsupported_format(STAGE, s)),
        }
    }
}

/// Target container for encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutputFormat {
    /// PCM WAV via hound.
    Wav,
    /// MP3 through LAME.
    Mp3,
    /// FLAC through libFLAC.
    Flac,
    /// Ogg Vorbis through libvorbis.
    Ogg,
}

impl OutputFormat {
    /// Every encodable format.
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Wav,
        OutputFormat::Mp3,
        OutputFormat::Flac,
        OutputFormat::Ogg,
    ];

    /// Lowercase name, also the file extension.
    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Wav => "wav",
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Flac => "flac",
            OutputFormat::Ogg => "ogg",
        }
    }

    /// File extension for this format.
    pub fn extension(self) -> &'static str {
        self.name()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wav" | "wave" => Ok(OutputFormat::Wav),
            "mp3" => Ok(OutputFormat::Mp3),
            "flac" => Ok(OutputFormat::Flac),
            "ogg" | "vorbis" => Ok(OutputFormat::Ogg),
            _ => Err(EngineError::unsupported_format(STAGE, s)),
        }
    }
}
