//! WAV encoding through hound, with an optional `LIST/INFO` tag chunk.

use crate::Result;
use crate::metadata::Metadata;
use hound::{SampleFormat, WavWriter};
use lustre_core::SampleBuffer;
use std::io::Cursor;

/// hound spec for a buffer at a given bit depth; 32 bits means float.
pub(crate) fn wav_spec(buffer: &SampleBuffer, bit_depth: u16) -> hound::WavSpec {
    hound::WavSpec {
        channels: buffer.num_channels() as u16,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: bit_depth,
        sample_format: if bit_depth == 32 {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    }
}

/// Quantize one sample to a signed integer of `bits` bits.
pub(crate) fn quantize(sample: f32, bits: u16) -> i32 {
    let max_val = (1i64 << (bits - 1)) as f32;
    (sample * max_val).round().clamp(-max_val, max_val - 1.0) as i32
}

/// Encode a buffer as WAV bytes.
///
/// `bit_depth` is 16 or 24 for integer PCM, 32 for IEEE float. Tags, if any,
/// go into a `LIST/INFO` chunk placed before the data chunk.
pub fn encode_wav(buffer: &SampleBuffer, bit_depth: u16, metadata: &Metadata) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    let spec = wav_spec(buffer, bit_depth);
    let mut writer = WavWriter::new(Cursor::new(&mut output), spec)?;

    let interleaved = buffer.to_interleaved();
    if bit_depth == 32 {
        for &sample in &interleaved {
            writer.write_sample(sample)?;
        }
    } else {
        for &sample in &interleaved {
            writer.write_sample(quantize(sample, bit_depth))?;
        }
    }
    writer.finalize()?;

    if let Some(chunk) = metadata.riff_info_chunk() {
        insert_before_data(&mut output, &chunk);
    }
    Ok(output)
}

/// Splice `chunk` in front of the `data` chunk and fix the RIFF size.
fn insert_before_data(riff: &mut Vec<u8>, chunk: &[u8]) {
    let mut offset = 12;
    let mut insert_at = riff.len();
    while offset + 8 <= riff.len() {
        let id = &riff[offset..offset + 4];
        if id == b"data" {
            insert_at = offset;
            break;
        }
        let size = u32::from_le_bytes([
            riff[offset + 4],
            riff[offset + 5],
            riff[offset + 6],
            riff[offset + 7],
        ]) as usize;
        offset += 8 + size + (size & 1);
    }

    riff.splice(insert_at..insert_at, chunk.iter().copied());
    let riff_size = (riff.len() - 8) as u32;
    riff[4..8].copy_from_slice(&riff_size.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::WavReader;

    fn ramp() -> SampleBuffer {
        let left: Vec<f32> = (0..64).map(|i| i as f32 / 64.0 - 0.5).collect();
        let right: Vec<f32> = left.iter().map(|s| -s).collect();
        SampleBuffer::stereo(22050, left, right).unwrap()
    }

    #[test]
    fn test_quantize_clamps() {
        assert_eq!(quantize(1.0, 16), 32767);
        assert_eq!(quantize(-1.0, 16), -32768);
        assert_eq!(quantize(2.0, 16), 32767);
        assert_eq!(quantize(0.5, 24), 4194304);
        assert_eq!(quantize(0.0, 24), 0);
    }

    #[test]
    fn test_wav_16_bit_roundtrip_through_hound() {
        let buffer = ramp();
        let bytes = encode_wav(&buffer, 16, &Metadata::default()).unwrap();
        let reader = WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 22050);
        assert_eq!(spec.bits_per_sample, 16);

        let samples: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), 128);
        assert_eq!(samples[0], quantize(-0.5, 16) as i16);
        assert_eq!(samples[1], quantize(0.5, 16) as i16);
    }

    #[test]
    fn test_wav_float() {
        let buffer = ramp();
        let bytes = encode_wav(&buffer, 32, &Metadata::default()).unwrap();
        let reader = WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.spec().sample_format, SampleFormat::Float);
        let samples: Vec<f32> = reader.into_samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, buffer.to_interleaved());
    }

    #[test]
    fn test_info_chunk_precedes_data() {
        let buffer = ramp();
        let bytes = encode_wav(&buffer, 16, &Metadata::titled("Test Tone")).unwrap();

        let riff_size = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
        assert_eq!(riff_size + 8, bytes.len());

        let list = bytes.windows(4).position(|w| w == b"LIST").unwrap();
        let data = bytes.windows(4).position(|w| w == b"data").unwrap();
        assert!(list < data);
        assert!(bytes.windows(9).any(|w| w == b"Test Tone"));

        // hound skips unknown chunks, so the audio still reads back
        let reader = WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.len(), 128);
    }
}
