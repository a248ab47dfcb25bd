//! Format-specific quality options and presets.
//!
//! [`QualityOptions`] is what a caller asks for; [`EncoderSettings`] is what
//! an encoder receives after [`QualityOptions::resolve`] has checked that
//! the option applies to the target format and lies in range. A mismatch
//! (a bitrate for WAV, a bit depth for MP3) is an error rather than a silent
//! fallback to defaults.

use crate::format::OutputFormat;
use lustre_core::EngineError;
use std::fmt;
use std::str::FromStr;

/// WAV bit depths hound can write; 32 means IEEE float.
pub const WAV_BIT_DEPTHS: [u16; 3] = [16, 24, 32];

/// MP3 constant bitrates the LAME encoder accepts, in kbps.
pub const MP3_BITRATES: [u32; 13] = [32, 40, 48, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320];

/// Ogg Vorbis nominal bitrate range in kbps.
pub const OGG_BITRATE_RANGE: (u32, u32) = (32, 500);

/// Highest FLAC compression level.
pub const MAX_FLAC_LEVEL: u8 = 8;

/// Requested quality for one encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QualityOptions {
    /// The format's default.
    #[default]
    Default,
    /// WAV bit depth (16, 24, or 32 for float).
    BitDepth(u16),
    /// MP3/OGG bitrate in kbps.
    BitrateKbps(u32),
    /// FLAC compression level, 0 (fastest) to 8 (smallest).
    CompressionLevel(u8),
}

/// Quality presets mapped onto each format's own option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QualityPreset {
    /// Highest quality / largest files.
    #[default]
    High,
    /// Balanced.
    Medium,
    /// Smallest files.
    Low,
}

/// Validated, format-bound encoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderSettings {
    /// WAV bit depth.
    Wav {
        /// 16, 24 or 32 (float).
        bit_depth: u16,
    },
    /// FLAC compression level.
    Flac {
        /// 0 to 8.
        level: u8,
    },
    /// MP3 constant bitrate.
    Mp3 {
        /// Bitrate in kbps.
        bitrate_kbps: u32,
    },
    /// Ogg Vorbis nominal bitrate.
    Ogg {
        /// Bitrate in kbps.
        bitrate_kbps: u32,
    },
}

impl QualityPreset {
    /// The option this preset selects for `format`.
    ///
    /// | preset | wav | mp3 | flac | ogg |
    /// |---|---|---|---|---|
    /// | high | 24-bit | 320k | level 8 | 256k |
    /// | medium | 16-bit | 192k | level 5 | 128k |
    /// | low | 16-bit | 128k | level 0 | 64k |
    pub fn options(self, format: OutputFormat) -> QualityOptions {
        use QualityPreset::{High, Low, Medium};
        match (format, self) {
            (OutputFormat::Wav, High) => QualityOptions::BitDepth(24),
            (OutputFormat::Wav, Medium | Low) => QualityOptions::BitDepth(16),
            (OutputFormat::Mp3, High) => QualityOptions::BitrateKbps(320),
            (OutputFormat::Mp3, Medium) => QualityOptions::BitrateKbps(192),
            (OutputFormat::Mp3, Low) => QualityOptions::BitrateKbps(128),
            (OutputFormat::Flac, High) => QualityOptions::CompressionLevel(8),
            (OutputFormat::Flac, Medium) => QualityOptions::CompressionLevel(5),
            (OutputFormat::Flac, Low) => QualityOptions::CompressionLevel(0),
            (OutputFormat::Ogg, High) => QualityOptions::BitrateKbps(256),
            (OutputFormat::Ogg, Medium) => QualityOptions::BitrateKbps(128),
            (OutputFormat::Ogg, Low) => QualityOptions::BitrateKbps(64),
        }
    }

    /// Lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            QualityPreset::High => "high",
            QualityPreset::Medium => "medium",
            QualityPreset::Low => "low",
        }
    }
}

impl FromStr for QualityPreset {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(QualityPreset::High),
            "medium" | "med" => Ok(QualityPreset::Medium),
            "low" => Ok(QualityPreset::Low),
            _ => Err(EngineError::invalid_parameter(
                "codec",
                "quality",
                s,
                "expected high, medium or low",
            )),
        }
    }
}

impl fmt::Display for QualityPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl QualityOptions {
    /// Check the option against `format` and produce encoder settings.
    ///
    /// Defaults: WAV 16-bit, MP3 320 kbps, FLAC level 5, OGG 192 kbps.
    pub fn resolve(self, format: OutputFormat) -> Result<EncoderSettings, EngineError> {
        let stage = format.name();
        match (format, self) {
            (OutputFormat::Wav, QualityOptions::Default) => {
                Ok(EncoderSettings::Wav { bit_depth: 16 })
            }
            (OutputFormat::Mp3, QualityOptions::Default) => {
                Ok(EncoderSettings::Mp3 { bitrate_kbps: 320 })
            }
            (OutputFormat::Flac, QualityOptions::Default) => {
                Ok(EncoderSettings::Flac { level: 5 })
            }
            (OutputFormat::Ogg, QualityOptions::Default) => {
                Ok(EncoderSettings::Ogg { bitrate_kbps: 192 })
            }

            (OutputFormat::Wav, QualityOptions::BitDepth(bits)) => {
                if WAV_BIT_DEPTHS.contains(&bits) {
                    Ok(EncoderSettings::Wav { bit_depth: bits })
                } else {
                    Err(EngineError::invalid_parameter(
                        stage,
                        "bit_depth",
                        bits,
                        "expected 16, 24 or 32",
                    ))
                }
            }
            (OutputFormat::Mp3, QualityOptions::BitrateKbps(kbps)) => {
                if MP3_BITRATES.contains(&kbps) {
                    Ok(EncoderSettings::Mp3 { bitrate_kbps: kbps })
                } else {
                    Err(EngineError::invalid_parameter(
                        stage,
                        "bitrate_kbps",
                        kbps,
                        "not a LAME bitrate (32-320)",
                    ))
                }
            }
            (OutputFormat::Ogg, QualityOptions::BitrateKbps(kbps)) => {
                let (lo, hi) = OGG_BITRATE_RANGE;
                if (lo..=hi).contains(&kbps) {
                    Ok(EncoderSettings::Ogg { bitrate_kbps: kbps })
                } else {
                    Err(EngineError::invalid_parameter(
                        stage,
                        "bitrate_kbps",
                        kbps,
                        format!("must be in [{lo}, {hi}]"),
                    ))
                }
            }
            (OutputFormat::Flac, QualityOptions::CompressionLevel(level)) => {
                if level <= MAX_FLAC_LEVEL {
                    Ok(EncoderSettings::Flac { level })
                } else {
                    Err(EngineError::invalid_parameter(
                        stage,
                        "compression_level",
                        level,
                        format!("must be in [0, {MAX_FLAC_LEVEL}]"),
                    ))
                }
            }
            (_, option) => Err(EngineError::invalid_parameter(
                stage,
                "quality",
                option,
                format!("does not apply to {stage}"),
            )),
        }
    }
}

impl fmt::Display for QualityOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityOptions::Default => f.write_str("default"),
            QualityOptions::BitDepth(bits) => write!(f, "{bits}bit"),
            QualityOptions::BitrateKbps(kbps) => write!(f, "{kbps}k"),
            QualityOptions::CompressionLevel(level) => write!(f, "level{level}"),
        }
    }
}

impl FromStr for QualityOptions {
    type Err = EngineError;

    /// Parse `default`, `24bit`, `192k` / `192kbps`, or `level5`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let invalid = || {
            EngineError::invalid_parameter(
                "codec",
                "quality",
                s,
                "expected default, <n>bit, <n>k or level<n>",
            )
        };

        if lower == "default" {
            return Ok(QualityOptions::Default);
        }
        if let Some(n) = lower.strip_suffix("bit") {
            return n.parse().map(QualityOptions::BitDepth).map_err(|_| invalid());
        }
        if let Some(n) = lower.strip_suffix("kbps").or_else(|| lower.strip_suffix('k')) {
            return n.parse().map(QualityOptions::BitrateKbps).map_err(|_| invalid());
        }
        if let Some(n) = lower.strip_prefix("level") {
            return n
                .parse()
                .map(QualityOptions::CompressionLevel)
                .map_err(|_| invalid());
        }
        Err(invalid())
    }
}
