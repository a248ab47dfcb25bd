//! Benchmarks for the spectral engine.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use lustre_core::{SampleBuffer, SpectralEngine};

fn test_buffer(seconds: f32) -> SampleBuffer {
    let len = (44100.0 * seconds) as usize;
    let samples = (0..len)
        .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44100.0).sin())
        .collect();
    SampleBuffer::mono(44100, samples).unwrap()
}

fn bench_stft_roundtrip(c: &mut Criterion) {
    let buffer = test_buffer(2.0);
    let mut group = c.benchmark_group("stft_roundtrip");

    for window in [512usize, 2048, 4096] {
        let engine = SpectralEngine::new(window, window / 4).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(window), &window, |b, _| {
            b.iter(|| {
                let frames = engine.forward(black_box(&buffer)).unwrap();
                black_box(engine.inverse(&frames).unwrap())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_stft_roundtrip);
criterion_main!(benches);
