//! Ogg Vorbis encoding through libvorbis (`vorbis-encoder`).
//!
//! The requested nominal bitrate picks a VBR quality. Tags are written by
//! replacing the stream's comment header packet, re-paging the stream with
//! the `ogg` crate.

use crate::metadata::{Metadata, VENDOR};
use crate::wav::quantize;
use crate::{CodecError, Result};
use lustre_core::SampleBuffer;
use ogg::{PacketReader, PacketWriteEndInfo, PacketWriter};
use std::io::Cursor;

const STAGE: &str = "ogg";

/// Approximate nominal bitrate (kbps, stereo 44.1 kHz) of libvorbis quality
/// settings.
const QUALITY_CURVE: [(f32, f32); 12] = [
    (45.0, -0.1),
    (64.0, 0.0),
    (80.0, 0.1),
    (96.0, 0.2),
    (112.0, 0.3),
    (128.0, 0.4),
    (160.0, 0.5),
    (192.0, 0.6),
    (224.0, 0.7),
    (256.0, 0.8),
    (320.0, 0.9),
    (500.0, 1.0),
];

fn failed(message: impl Into<String>) -> CodecError {
    CodecError::EncoderFailed {
        encoder: STAGE.to_string(),
        message: message.into(),
    }
}

/// VBR quality (-0.1 to 1.0) whose nominal bitrate is closest to `kbps`.
pub fn vorbis_quality(kbps: u32) -> f32 {
    let kbps = kbps as f32;
    let (first, last) = (QUALITY_CURVE[0], QUALITY_CURVE[QUALITY_CURVE.len() - 1]);
    if kbps <= first.0 {
        return first.1;
    }
    if kbps >= last.0 {
        return last.1;
    }
    QUALITY_CURVE
        .windows(2)
        .find(|w| kbps <= w[1].0)
        .map(|w| {
            let (k0, q0) = w[0];
            let (k1, q1) = w[1];
            q0 + (q1 - q0) * (kbps - k0) / (k1 - k0)
        })
        .unwrap_or(last.1)
}

/// Encode a buffer as Ogg Vorbis near `bitrate_kbps`.
pub fn encode_vorbis(
    buffer: &SampleBuffer,
    bitrate_kbps: u32,
    metadata: &Metadata,
) -> Result<Vec<u8>> {
    let quality = vorbis_quality(bitrate_kbps);
    let mut encoder = vorbis_encoder::Encoder::new(
        buffer.num_channels() as u32,
        u64::from(buffer.sample_rate()),
        quality,
    )
    .map_err(|e| failed(format!("init failed: {e}")))?;

    let samples: Vec<i16> = buffer
        .to_interleaved()
        .iter()
        .map(|&s| quantize(s, 16) as i16)
        .collect();

    let mut output = encoder
        .encode(&samples)
        .map_err(|e| failed(format!("encode failed: {e}")))?;
    output.extend(
        encoder
            .flush()
            .map_err(|e| failed(format!("flush failed: {e}")))?,
    );

    if !metadata.is_empty() {
        output = replace_comment_header(&output, &comment_header(metadata))?;
    }

    tracing::debug!(bitrate_kbps, quality, bytes = output.len(), "ogg: encoded");
    Ok(output)
}

/// Vorbis comment header packet (type 3) carrying `metadata`.
fn comment_header(metadata: &Metadata) -> Vec<u8> {
    let mut packet = vec![0x03];
    packet.extend_from_slice(b"vorbis");
    packet.extend_from_slice(&metadata.vorbis_comment_body(VENDOR));
    packet.push(0x01);
    packet
}

/// Copy an Ogg stream, swapping its second packet for `comment`.
///
/// Page boundaries and granule positions are copied from the source, so the
/// identification header still ends its own page.
fn replace_comment_header(stream: &[u8], comment: &[u8]) -> Result<Vec<u8>> {
    let mut reader = PacketReader::new(Cursor::new(stream));
    let mut writer = PacketWriter::new(Vec::with_capacity(stream.len() + comment.len()));

    let mut index = 0usize;
    while let Some(packet) = reader
        .read_packet()
        .map_err(|e| failed(format!("ogg read failed: {e}")))?
    {
        let end = if packet.last_in_stream() {
            PacketWriteEndInfo::EndStream
        } else if packet.last_in_page() {
            PacketWriteEndInfo::EndPage
        } else {
            PacketWriteEndInfo::NormalPacket
        };
        let serial = packet.stream_serial();
        let granule = packet.absgp_page();
        let data = if index == 1 {
            comment.to_vec()
        } else {
            packet.data
        };
        writer
            .write_packet(data, serial, end, granule)
            .map_err(|e| failed(format!("ogg write failed: {e}")))?;
        index += 1;
    }
    if index < 3 {
        return Err(failed("stream is missing its Vorbis headers"));
    }
    Ok(writer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn tone(frames: usize) -> SampleBuffer {
        let left: Vec<f32> = (0..frames)
            .map(|i| 0.5 * (2.0 * PI * 440.0 * i as f32 / 44100.0).sin())
            .collect();
        SampleBuffer::stereo(44100, left.clone(), left).unwrap()
    }

    fn packets(stream: &[u8]) -> Vec<Vec<u8>> {
        let mut reader = PacketReader::new(Cursor::new(stream));
        let mut out = Vec::new();
        while let Some(p) = reader.read_packet().unwrap() {
            out.push(p.data);
        }
        out
    }

    #[test]
    fn test_quality_curve() {
        assert_eq!(vorbis_quality(32), -0.1);
        assert!((vorbis_quality(128) - 0.4).abs() < 1e-6);
        assert_eq!(vorbis_quality(500), 1.0);
        assert!((vorbis_quality(144) - 0.45).abs() < 1e-6);
        assert!(vorbis_quality(192) < vorbis_quality(256));
    }

    #[test]
    fn test_stream_headers() {
        let bytes = encode_vorbis(&tone(22050), 128, &Metadata::default()).unwrap();
        assert_eq!(&bytes[0..4], b"OggS");
        let packets = packets(&bytes);
        assert!(packets.len() > 3);
        assert_eq!(&packets[0][0..7], b"\x01vorbis");
        assert_eq!(&packets[1][0..7], b"\x03vorbis");
        assert_eq!(&packets[2][0..7], b"\x05vorbis");
    }

    #[test]
    fn test_tags_land_in_comment_header() {
        let meta = Metadata {
            title: Some("Hush".into()),
            artist: Some("Lumen".into()),
            ..Metadata::default()
        };
        let plain = packets(&encode_vorbis(&tone(22050), 128, &Metadata::default()).unwrap());
        let tagged = packets(&encode_vorbis(&tone(22050), 128, &meta).unwrap());

        assert_eq!(tagged[1], comment_header(&meta));
        assert!(tagged[1].windows(10).any(|w| w == b"TITLE=Hush"));
        assert_eq!(plain.len(), tagged.len());
        assert_eq!(plain[2..], tagged[2..]);
    }

    #[test]
    fn test_replace_rejects_truncated_stream() {
        assert!(replace_comment_header(b"", b"\x03vorbis").is_err());
    }
}
