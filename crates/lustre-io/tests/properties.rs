//! FLAC output decodes back to the 16-bit quantized input.

use lustre_core::SampleBuffer;
use lustre_io::{CodecGateway, FormatHint, Metadata, OutputFormat, QualityOptions};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn flac_is_lossless(
        samples in prop::collection::vec(-1.0f32..1.0, 1..6000),
        level in 0u8..=8,
        stereo in any::<bool>(),
    ) {
        let buffer = if stereo {
            let right: Vec<f32> = samples.iter().map(|s| s * 0.5).collect();
            SampleBuffer::stereo(48000, samples.clone(), right).unwrap()
        } else {
            SampleBuffer::mono(48000, samples.clone()).unwrap()
        };

        let gateway = CodecGateway::new();
        let bytes = gateway
            .encode(&buffer, OutputFormat::Flac, QualityOptions::CompressionLevel(level), &Metadata::default())
            .unwrap();
        let decoded = gateway.decode(&bytes, FormatHint::Flac).unwrap();

        prop_assert_eq!(decoded.len(), buffer.len());
        prop_assert_eq!(decoded.num_channels(), buffer.num_channels());
        for (out, src) in decoded.channels().iter().zip(buffer.channels()) {
            for (a, b) in out.iter().zip(src) {
                let q = (b * 32768.0).round().clamp(-32768.0, 32767.0) / 32768.0;
                prop_assert!((a - q).abs() < 1e-6);
            }
        }
    }
}
