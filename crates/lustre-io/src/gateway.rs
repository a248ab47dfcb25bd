//! The codec boundary: bytes in, buffers out, and back.

use crate::decode::decode_bytes;
use crate::flac::encode_flac;
use crate::format::{FormatHint, OutputFormat};
use crate::metadata::Metadata;
use crate::mp3::encode_mp3;
use crate::quality::{EncoderSettings, QualityOptions, QualityPreset};
use crate::vorbis::encode_vorbis;
use crate::wav::encode_wav;
use crate::Result;
use lustre_core::{EngineError, SampleBuffer};
use rayon::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// One entry of a batch export: a format name and its quality option.
///
/// The format is kept as text so an unrecognized name fails its own entry
/// instead of the whole batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    /// Target format name (`wav`, `mp3`, `flac`, `ogg`).
    pub format: String,
    /// Quality for this format.
    pub quality: QualityOptions,
}

impl ExportRequest {
    /// Request with an explicit quality option.
    pub fn new(format: impl Into<String>, quality: QualityOptions) -> Self {
        Self {
            format: format.into(),
            quality,
        }
    }

    /// Request using a preset resolved for `format`.
    pub fn with_preset(format: OutputFormat, preset: QualityPreset) -> Self {
        Self::new(format.name(), preset.options(format))
    }

    /// Requests for several format names at one preset.
    ///
    /// Unknown names get [`QualityOptions::Default`] and fail when exported.
    pub fn batch<S: AsRef<str>>(formats: &[S], preset: QualityPreset) -> Vec<Self> {
        formats
            .iter()
            .map(|name| {
                let name = name.as_ref();
                match name.parse::<OutputFormat>() {
                    Ok(format) => Self::with_preset(format, preset),
                    Err(_) => Self::new(name, QualityOptions::Default),
                }
            })
            .collect()
    }
}

impl FromStr for ExportRequest {
    type Err = EngineError;

    /// Parse `format` or `format:quality`, e.g. `mp3:192k`, `flac:level8`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((format, quality)) => Ok(Self::new(format.trim(), quality.parse()?)),
            None => Ok(Self::new(s.trim(), QualityOptions::Default)),
        }
    }
}

impl fmt::Display for ExportRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.format, self.quality)
    }
}

/// Outcome of one batch entry.
#[derive(Debug)]
pub struct ExportResult {
    /// The request as given.
    pub request: ExportRequest,
    /// Encoded bytes, or why this entry failed.
    pub result: Result<Vec<u8>>,
}

impl ExportResult {
    /// True when the entry encoded.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Decodes containers into sample buffers and encodes buffers into
/// containers.
///
/// ```rust
/// use lustre_core::SampleBuffer;
/// use lustre_io::{CodecGateway, FormatHint, Metadata, OutputFormat, QualityOptions};
///
/// let gateway = CodecGateway::new();
/// let buffer = SampleBuffer::mono(8000, vec![0.25; 800]).unwrap();
/// let wav = gateway
///     .encode(&buffer, OutputFormat::Wav, QualityOptions::Default, &Metadata::default())
///     .unwrap();
/// let decoded = gateway.decode(&wav, FormatHint::Wav).unwrap();
/// assert_eq!(decoded.len(), 800);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CodecGateway {
    target_sample_rate: Option<u32>,
}

impl CodecGateway {
    /// Gateway with no resampling.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resample every decoded buffer to `rate`.
    pub fn with_target_sample_rate(mut self, rate: u32) -> Self {
        self.target_sample_rate = Some(rate);
        self
    }

    /// Target sample rate for decoding, if any.
    pub fn target_sample_rate(&self) -> Option<u32> {
        self.target_sample_rate
    }

    /// Decode encoded bytes.
    pub fn decode(&self, bytes: &[u8], hint: FormatHint) -> Result<SampleBuffer> {
        self.finish_decode(decode_bytes(bytes.to_vec(), hint)?)
    }

    /// Decode a file, hinting the format from its extension.
    pub fn decode_file(&self, path: impl AsRef<Path>) -> Result<SampleBuffer> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "decode: reading file");
        self.finish_decode(decode_bytes(bytes, FormatHint::from_path(path))?)
    }

    fn finish_decode(&self, buffer: SampleBuffer) -> Result<SampleBuffer> {
        match self.target_sample_rate {
            Some(rate) if rate != buffer.sample_rate() => Ok(buffer.resample(rate)?),
            _ => Ok(buffer),
        }
    }

    /// Encode a buffer.
    ///
    /// Fails with `EmptyInput` for a zero-length buffer and with
    /// `InvalidParameter` when `quality` does not apply to `format`.
    pub fn encode(
        &self,
        buffer: &SampleBuffer,
        format: OutputFormat,
        quality: QualityOptions,
        metadata: &Metadata,
    ) -> Result<Vec<u8>> {
        if buffer.is_empty() {
            return Err(EngineError::empty_input(format.name()).into());
        }
        let bytes = match quality.resolve(format)? {
            EncoderSettings::Wav { bit_depth } => encode_wav(buffer, bit_depth, metadata)?,
            EncoderSettings::Flac { level } => encode_flac(buffer, level, metadata)?,
            EncoderSettings::Mp3 { bitrate_kbps } => encode_mp3(buffer, bitrate_kbps, metadata)?,
            EncoderSettings::Ogg { bitrate_kbps } => encode_vorbis(buffer, bitrate_kbps, metadata)?,
        };
        tracing::debug!(%format, %quality, bytes = bytes.len(), "encode: done");
        Ok(bytes)
    }

    /// Encode a request whose format is still a name.
    pub fn encode_request(
        &self,
        buffer: &SampleBuffer,
        request: &ExportRequest,
        metadata: &Metadata,
    ) -> Result<Vec<u8>> {
        let format: OutputFormat = request.format.parse()?;
        self.encode(buffer, format, request.quality, metadata)
    }

    /// Encode one buffer for every request.
    ///
    /// Entries run in parallel and fail independently; results come back in
    /// request order.
    pub fn export_batch(
        &self,
        buffer: &SampleBuffer,
        requests: &[ExportRequest],
        metadata: &Metadata,
    ) -> Vec<ExportResult> {
        requests
            .par_iter()
            .map(|request| {
                let result = self.encode_request(buffer, request, metadata);
                if let Err(e) = &result {
                    tracing::warn!(request = %request, error = %e, "export: entry failed");
                }
                ExportResult {
                    request: request.clone(),
                    result,
                }
            })
            .collect()
    }

    /// Batch-export into `dir` as `<stem>.<ext>` files.
    ///
    /// Returns, per request, the written path or the error.
    pub fn export_to_dir(
        &self,
        buffer: &SampleBuffer,
        requests: &[ExportRequest],
        metadata: &Metadata,
        dir: impl AsRef<Path>,
        stem: &str,
    ) -> Vec<(ExportRequest, Result<PathBuf>)> {
        let dir = dir.as_ref();
        self.export_batch(buffer, requests, metadata)
            .into_iter()
            .map(|entry| {
                let written = entry.result.and_then(|bytes| {
                    let ext = entry.request.format.trim().to_ascii_lowercase();
                    let path = dir.join(format!("{stem}.{ext}"));
                    std::fs::write(&path, bytes)?;
                    Ok(path)
                });
                (entry.request, written)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lustre_core::ErrorKind;

    #[test]
    fn test_request_parse() {
        let r: ExportRequest = "mp3:192k".parse().unwrap();
        assert_eq!(r, ExportRequest::new("mp3", QualityOptions::BitrateKbps(192)));
        let r: ExportRequest = "flac".parse().unwrap();
        assert_eq!(r.quality, QualityOptions::Default);
        assert!("wav:loud".parse::<ExportRequest>().is_err());
        assert_eq!(
            ExportRequest::new("ogg", QualityOptions::BitrateKbps(64)).to_string(),
            "ogg:64k"
        );
    }

    #[test]
    fn test_batch_requests_keep_unknown_names() {
        let requests = ExportRequest::batch(&["wav", "xyz"], QualityPreset::Medium);
        assert_eq!(requests[0].quality, QualityOptions::BitDepth(16));
        assert_eq!(requests[1].format, "xyz");
    }

    #[test]
    fn test_encode_empty_buffer() {
        let empty = SampleBuffer::mono(44100, vec![]).unwrap();
        let err = CodecGateway::new()
            .encode(&empty, OutputFormat::Wav, QualityOptions::Default, &Metadata::default())
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::EmptyInput));
    }

    #[test]
    fn test_quality_mismatch_fails_before_encoding() {
        let buffer = SampleBuffer::mono(44100, vec![0.1; 100]).unwrap();
        let err = CodecGateway::new()
            .encode(
                &buffer,
                OutputFormat::Flac,
                QualityOptions::BitrateKbps(320),
                &Metadata::default(),
            )
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidParameter));
        assert_eq!(err.stage(), "flac");
    }
}
