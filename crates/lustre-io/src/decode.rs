//! Container decoding through symphonia.
//!
//! Supports WAV, FLAC, MP3, Ogg Vorbis and AAC in MP4/M4A. Output is at most
//! two channels: files with more keep only the first two.

use crate::format::{FormatHint, STAGE};
use crate::{CodecError, Result};
use lustre_core::{EngineError, MAX_CHANNELS, SampleBuffer};
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer as PcmBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decode an encoded byte stream into a sample buffer.
pub fn decode_bytes(bytes: Vec<u8>, hint: FormatHint) -> Result<SampleBuffer> {
    if bytes.is_empty() {
        return Err(EngineError::empty_input(STAGE).into());
    }

    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());
    let mut ext_hint = Hint::new();
    if let Some(ext) = hint.extension() {
        ext_hint.with_extension(ext);
    }

    let opened = symphonia::default::get_probe()
        .format(
            &ext_hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| match e {
            // no reader recognized the stream before it ended
            SymphoniaError::Unsupported(_) | SymphoniaError::IoError(_) => CodecError::Engine(
                EngineError::unsupported_format(STAGE, hint.extension().unwrap_or("auto")),
            ),
            other => CodecError::Decode(other),
        })?;
    let mut format = opened.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| EngineError::unsupported_format(STAGE, "no audio track"))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| match e {
            SymphoniaError::Unsupported(codec) => {
                CodecError::Engine(EngineError::unsupported_format(STAGE, codec))
            }
            other => CodecError::Decode(other),
        })?;

    let mut sample_rate = codec_params.sample_rate;
    let mut channels = codec_params.channels.map(|c| c.count());
    let mut interleaved: Vec<f32> = Vec::new();
    let mut pcm: Option<PcmBuffer<f32>> = None;
    let mut skipped = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(CodecError::Decode(e)),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(_)) => {
                skipped += 1;
                continue;
            }
            Err(e) => return Err(CodecError::Decode(e)),
        };

        let spec = *decoded.spec();
        sample_rate = Some(spec.rate);
        channels = Some(spec.channels.count());

        if pcm.as_ref().is_none_or(|b| b.capacity() < decoded.capacity()) {
            pcm = Some(PcmBuffer::new(decoded.capacity() as u64, spec));
        }
        if let Some(buf) = pcm.as_mut() {
            buf.copy_interleaved_ref(decoded);
            interleaved.extend_from_slice(buf.samples());
        }
    }

    if skipped > 0 {
        tracing::warn!(skipped, "decode: skipped corrupt packets");
    }

    let sample_rate = sample_rate.ok_or_else(|| {
        EngineError::incompatible_buffer(STAGE, "stream does not declare a sample rate")
    })?;
    let channels = channels.unwrap_or(1).max(1);
    let buffer = to_buffer(sample_rate, channels, &interleaved)?;

    tracing::debug!(
        sample_rate,
        channels = buffer.num_channels(),
        frames = buffer.len(),
        source_channels = channels,
        "decode: done"
    );
    Ok(buffer)
}

/// Build a buffer from interleaved samples, keeping at most two channels.
fn to_buffer(sample_rate: u32, channels: usize, interleaved: &[f32]) -> Result<SampleBuffer> {
    if channels <= MAX_CHANNELS {
        return Ok(SampleBuffer::from_interleaved(sample_rate, channels, interleaved)?);
    }

    tracing::warn!(channels, "decode: keeping the first two channels");
    let front: Vec<f32> = interleaved
        .chunks_exact(channels)
        .flat_map(|frame| [frame[0], frame[1]])
        .collect();
    Ok(SampleBuffer::from_interleaved(sample_rate, 2, &front)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lustre_core::ErrorKind;

    #[test]
    fn test_empty_bytes() {
        let err = decode_bytes(Vec::new(), FormatHint::Auto).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::EmptyInput));
    }

    #[test]
    fn test_garbage_is_unsupported() {
        let err = decode_bytes(b"definitely not audio".to_vec(), FormatHint::Auto).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::UnsupportedFormat));
    }

    #[test]
    fn test_surround_keeps_front_pair() {
        let interleaved: [f32; 12] = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 1.1, 1.2, 1.3, 1.4, 1.5, 1.6];
        let buffer = to_buffer(48000, 6, &interleaved).unwrap();
        assert_eq!(buffer.num_channels(), 2);
        assert_eq!(buffer.channel(0).unwrap(), &[0.1f32, 1.1]);
        assert_eq!(buffer.channel(1).unwrap(), &[0.2f32, 1.2]);
    }
}
