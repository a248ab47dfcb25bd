//! MP3 encoding through LAME (`mp3lame-encoder`).
//!
//! Constant bitrate, best quality setting. Tags are written as an ID3v2.3
//! tag in front of the first frame.

use crate::metadata::Metadata;
use crate::wav::quantize;
use crate::{CodecError, Result};
use lustre_core::{EngineError, SampleBuffer};
use mp3lame_encoder::{Bitrate, Builder, DualPcm, FlushNoGap, Quality};

/// Sample rates MPEG-1/2/2.5 layer III can carry.
pub const MP3_SAMPLE_RATES: [u32; 9] =
    [8000, 11025, 12000, 16000, 22050, 24000, 32000, 44100, 48000];

const STAGE: &str = "mp3";

/// Largest LAME flush, one frame plus the bit reservoir.
const FLUSH_RESERVE: usize = 7200;

fn failed(message: impl Into<String>) -> CodecError {
    CodecError::EncoderFailed {
        encoder: STAGE.to_string(),
        message: message.into(),
    }
}

fn lame_bitrate(kbps: u32) -> Result<Bitrate> {
    Ok(match kbps {
        32 => Bitrate::Kbps32,
        40 => Bitrate::Kbps40,
        48 => Bitrate::Kbps48,
        64 => Bitrate::Kbps64,
        80 => Bitrate::Kbps80,
        96 => Bitrate::Kbps96,
        112 => Bitrate::Kbps112,
        128 => Bitrate::Kbps128,
        160 => Bitrate::Kbps160,
        192 => Bitrate::Kbps192,
        224 => Bitrate::Kbps224,
        256 => Bitrate::Kbps256,
        320 => Bitrate::Kbps320,
        other => {
            return Err(EngineError::invalid_parameter(
                STAGE,
                "bitrate_kbps",
                other,
                "not a LAME bitrate (32-320)",
            )
            .into());
        }
    })
}

/// Encode a buffer as constant-bitrate MP3.
#[allow(unsafe_code)]
pub fn encode_mp3(
    buffer: &SampleBuffer,
    bitrate_kbps: u32,
    metadata: &Metadata,
) -> Result<Vec<u8>> {
    let sample_rate = buffer.sample_rate();
    if !MP3_SAMPLE_RATES.contains(&sample_rate) {
        return Err(EngineError::invalid_parameter(
            STAGE,
            "sample_rate",
            sample_rate,
            "MP3 supports 8000-48000 Hz in the MPEG rate family",
        )
        .into());
    }
    let bitrate = lame_bitrate(bitrate_kbps)?;

    let mut builder = Builder::new().ok_or_else(|| failed("LAME init failed"))?;
    builder
        .set_num_channels(buffer.num_channels() as u8)
        .map_err(|e| failed(format!("set channels failed: {e:?}")))?;
    builder
        .set_sample_rate(sample_rate)
        .map_err(|e| failed(format!("set sample rate failed: {e:?}")))?;
    builder
        .set_brate(bitrate)
        .map_err(|e| failed(format!("set bitrate failed: {e:?}")))?;
    builder
        .set_quality(Quality::Best)
        .map_err(|e| failed(format!("set quality failed: {e:?}")))?;
    let mut encoder = builder
        .build()
        .map_err(|e| failed(format!("build failed: {e:?}")))?;

    // mono feeds the same channel twice; LAME reads only the left
    let to_i16 = |channel: &[f32]| -> Vec<i16> {
        channel.iter().map(|&s| quantize(s, 16) as i16).collect()
    };
    let channels = buffer.channels();
    let left = to_i16(&channels[0]);
    let right = channels.get(1).map_or_else(|| left.clone(), |c| to_i16(c));

    let mut output = metadata.id3v2_tag().unwrap_or_default();
    let tag_len = output.len();
    output.reserve(mp3lame_encoder::max_required_buffer_size(left.len()));

    let input = DualPcm {
        left: &left,
        right: &right,
    };
    let encoded = encoder
        .encode(input, output.spare_capacity_mut())
        .map_err(|e| failed(format!("encode failed: {e:?}")))?;
    // SAFETY: LAME initialized `encoded` bytes of the spare capacity.
    unsafe {
        output.set_len(tag_len + encoded);
    }

    output.reserve(FLUSH_RESERVE);
    let flushed = encoder
        .flush::<FlushNoGap>(output.spare_capacity_mut())
        .map_err(|e| failed(format!("flush failed: {e:?}")))?;
    // SAFETY: LAME initialized `flushed` bytes of the spare capacity.
    unsafe {
        output.set_len(output.len() + flushed);
    }

    tracing::debug!(bitrate_kbps, bytes = output.len(), "mp3: encoded");
    Ok(output)
}
