//! FLAC encoding through libFLAC (`flac-bound`).
//!
//! Samples are quantized to 16 bits and fed to the encoder in interleaved
//! blocks. libFLAC writes its own `VORBIS_COMMENT` block carrying only a
//! vendor string; when tags are set, that block is replaced by one holding
//! them.

use crate::metadata::{Metadata, VENDOR};
use crate::wav::quantize;
use crate::{CodecError, Result};
use flac_bound::{FlacEncoder, WriteWrapper};
use lustre_core::{EngineError, SampleBuffer};

/// Bit depth of encoded streams.
pub const FLAC_BITS_PER_SAMPLE: u32 = 16;

/// Highest sample rate a FLAC STREAMINFO can declare.
pub const MAX_FLAC_SAMPLE_RATE: u32 = 655_350;

const STAGE: &str = "flac";
const BLOCK_FRAMES: usize = 4096;
const BLOCK_VORBIS_COMMENT: u8 = 4;

fn failed(message: impl Into<String>) -> CodecError {
    CodecError::EncoderFailed {
        encoder: STAGE.to_string(),
        message: message.into(),
    }
}

/// Encode a buffer as a FLAC stream at compression `level` (0-8).
///
/// Tags, if any, go into a `VORBIS_COMMENT` metadata block.
pub fn encode_flac(buffer: &SampleBuffer, level: u8, metadata: &Metadata) -> Result<Vec<u8>> {
    let sample_rate = buffer.sample_rate();
    if sample_rate > MAX_FLAC_SAMPLE_RATE {
        return Err(EngineError::invalid_parameter(
            STAGE,
            "sample_rate",
            sample_rate,
            format!("FLAC supports at most {MAX_FLAC_SAMPLE_RATE} Hz"),
        )
        .into());
    }

    let channels = buffer.num_channels();
    let samples: Vec<i32> = buffer
        .to_interleaved()
        .iter()
        .map(|&s| quantize(s, FLAC_BITS_PER_SAMPLE as u16))
        .collect();

    let mut output = Vec::new();
    {
        let config = FlacEncoder::new()
            .ok_or_else(|| failed("encoder init failed"))?
            .channels(channels as u32)
            .sample_rate(sample_rate)
            .bits_per_sample(FLAC_BITS_PER_SAMPLE)
            .compression_level(u32::from(level))
            .total_samples_estimate(buffer.len() as u64);

        let mut wrapper = WriteWrapper(&mut output);
        let mut encoder = config
            .init_write(&mut wrapper)
            .map_err(|e| failed(format!("init failed: {e:?}")))?;

        for block in samples.chunks(BLOCK_FRAMES * channels) {
            encoder
                .process_interleaved(block, (block.len() / channels) as u32)
                .map_err(|e| failed(format!("process failed: {e:?}")))?;
        }
        encoder.finish().map_err(|_| failed("finish failed"))?;
    }

    if !metadata.is_empty() {
        output = replace_vorbis_comment(&output, &metadata.vorbis_comment_body(VENDOR))?;
    }

    tracing::debug!(level, bytes = output.len(), "flac: encoded");
    Ok(output)
}

/// Rebuild the metadata section of `stream` with `comment` as its only
/// `VORBIS_COMMENT` block. Audio frames are copied unchanged.
fn replace_vorbis_comment(stream: &[u8], comment: &[u8]) -> Result<Vec<u8>> {
    if stream.get(..4) != Some(b"fLaC".as_slice()) {
        return Err(failed("stream does not start with fLaC"));
    }

    let mut blocks: Vec<(u8, &[u8])> = Vec::new();
    let mut offset = 4;
    loop {
        let header = stream
            .get(offset..offset + 4)
            .ok_or_else(|| failed("truncated metadata block header"))?;
        let last = header[0] & 0x80 != 0;
        let block_type = header[0] & 0x7F;
        let len = u32::from_be_bytes([0, header[1], header[2], header[3]]) as usize;
        let body = stream
            .get(offset + 4..offset + 4 + len)
            .ok_or_else(|| failed("truncated metadata block"))?;
        if block_type != BLOCK_VORBIS_COMMENT {
            blocks.push((block_type, body));
        }
        offset += 4 + len;
        if last {
            break;
        }
    }
    blocks.push((BLOCK_VORBIS_COMMENT, comment));

    let mut out = Vec::with_capacity(stream.len() + comment.len());
    out.extend_from_slice(b"fLaC");
    let count = blocks.len();
    for (i, (block_type, body)) in blocks.into_iter().enumerate() {
        let last_flag = if i + 1 == count { 0x80 } else { 0 };
        out.push(last_flag | block_type);
        out.extend_from_slice(&(body.len() as u32).to_be_bytes()[1..]);
        out.extend_from_slice(body);
    }
    out.extend_from_slice(&stream[offset..]);
    Ok(out)
}
