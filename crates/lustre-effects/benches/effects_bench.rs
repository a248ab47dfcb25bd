//! Criterion benchmarks for lustre effects
//!
//! Run with: cargo bench
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use lustre_core::{Effect, EffectExt, SampleBuffer};
use lustre_effects::{
    Compressor, Delay, Equalizer, Limiter, MasteringChain, NoiseReduction, Reverb, StereoWidener,
    convolve,
};

const SAMPLE_RATE: u32 = 48000;
const DURATIONS_MS: &[usize] = &[100, 1000, 5000];

fn generate_test_signal(frames: usize) -> SampleBuffer {
    let left: Vec<f32> = (0..frames)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5
        })
        .collect();
    let right = left.iter().map(|x| x * 0.8).collect();
    SampleBuffer::stereo(SAMPLE_RATE, left, right).unwrap()
}

fn bench_effect<E: Effect>(c: &mut Criterion, name: &str, effect: E) {
    let mut group = c.benchmark_group(name);
    group.sample_size(20);

    for &ms in DURATIONS_MS {
        let input = generate_test_signal(SAMPLE_RATE as usize * ms / 1000);

        group.bench_with_input(BenchmarkId::from_parameter(format!("{ms}ms")), &ms, |b, _| {
            b.iter(|| black_box(effect.apply(black_box(&input)).unwrap()))
        });
    }

    group.finish();
}

fn bench_noise_reduction(c: &mut Criterion) {
    bench_effect(c, "NoiseReduction", NoiseReduction::default());
}

fn bench_equalizer(c: &mut Criterion) {
    bench_effect(c, "Equalizer", Equalizer::default());
}

fn bench_compressor(c: &mut Criterion) {
    bench_effect(c, "Compressor", Compressor::default());
}

fn bench_reverb(c: &mut Criterion) {
    bench_effect(c, "Reverb", Reverb::default());
}

fn bench_delay(c: &mut Criterion) {
    bench_effect(c, "Delay", Delay::default());
}

fn bench_stereo_widener(c: &mut Criterion) {
    bench_effect(c, "StereoWidener", StereoWidener::default());
}

fn bench_limiter(c: &mut Criterion) {
    bench_effect(c, "Limiter", Limiter::default());
}

fn bench_mastering(c: &mut Criterion) {
    bench_effect(c, "MasteringChain", MasteringChain::default());
}

fn bench_convolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("convolve");
    let signal = generate_test_signal(SAMPLE_RATE as usize);
    let signal = signal.channel(0).unwrap();

    for &kernel_len in &[256_usize, 4096, 96000] {
        let kernel: Vec<f32> = (0..kernel_len).map(|i| 0.999_f32.powi(i as i32)).collect();
        group.bench_with_input(
            BenchmarkId::from_parameter(kernel_len),
            &kernel_len,
            |b, _| b.iter(|| black_box(convolve(black_box(signal), &kernel))),
        );
    }

    group.finish();
}

fn bench_effect_chain(c: &mut Criterion) {
    let chain = Equalizer::default()
        .chain(Compressor::default())
        .chain(StereoWidener::default())
        .chain(Limiter::default());
    bench_effect(c, "Chain", chain);
}

criterion_group!(
    benches,
    bench_noise_reduction,
    bench_equalizer,
    bench_compressor,
    bench_reverb,
    bench_delay,
    bench_stereo_widener,
    bench_limiter,
    bench_mastering,
    bench_convolve,
    bench_effect_chain,
);

criterion_main!(benches);
