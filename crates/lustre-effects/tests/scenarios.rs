//! End-to-end scenarios on realistic signals.

use lustre_core::{Effect, EffectExt, ErrorKind, SampleBuffer};
use lustre_effects::{
    Compressor, Delay, EqBand, Equalizer, Limiter, MasteringChain, NoiseProfile, NoiseReduction,
    Reverb, StereoWidener,
};
use std::f32::consts::PI;

const SR: u32 = 44100;

fn sine(freq: f32, amplitude: f32, secs: f32) -> Vec<f32> {
    let n = (secs * SR as f32) as usize;
    (0..n)
        .map(|i| amplitude * (2.0 * PI * freq * i as f32 / SR as f32).sin())
        .collect()
}

fn rms(samples: &[f32]) -> f32 {
    (samples.iter().map(|x| x * x).sum::<f32>() / samples.len() as f32).sqrt()
}

#[test]
fn test_limiter_on_hot_sine() {
    let input = SampleBuffer::mono(SR, sine(440.0, 1.5, 2.0)).unwrap();
    let out = Limiter::with_ceiling(0.9).apply(&input).unwrap();
    let y = out.channel(0).unwrap();

    assert_eq!(y.len(), input.len());
    assert!(out.peak() <= 0.9);

    // Steady-state gain is constant, so the waveform stays a sine.
    let tail = &y[SR as usize..];
    let peak = tail.iter().fold(0.0_f32, |m, x| m.max(x.abs()));
    let ratio = rms(tail) / peak;
    assert!((ratio - std::f32::consts::FRAC_1_SQRT_2).abs() < 0.02, "rms/peak {ratio}");
    let x = &input.channel(0).unwrap()[SR as usize..];
    let sign_flips = tail
        .iter()
        .zip(x)
        .filter(|(a, b)| a.signum() != b.signum() && b.abs() > 0.05)
        .count();
    assert_eq!(sign_flips, 0);
}

#[test]
fn test_widener_on_identical_channels() {
    let mono = sine(220.0, 0.5, 0.5);
    let input = SampleBuffer::stereo(SR, mono.clone(), mono).unwrap();
    let out = StereoWidener::new(2.0).apply(&input).unwrap();
    let (l, r) = (out.channel(0).unwrap(), out.channel(1).unwrap());
    for (a, b) in l.iter().zip(r) {
        assert_eq!(a - b, 0.0);
    }
    assert_eq!(out, input);
}

#[test]
fn test_denoise_quiet_intro() {
    // Half a second of faint hiss, then a tone buried in the same hiss.
    let mut state = 12345_u32;
    let mut hiss = || {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        ((state >> 16) as f32 / 32768.0 - 1.0) * 0.003
    };
    let tone = sine(1000.0, 0.5, 1.5);
    let samples: Vec<f32> = (0..tone.len())
        .map(|i| {
            let n = hiss();
            if i < SR as usize / 2 { n } else { tone[i] + n }
        })
        .collect();
    let input = SampleBuffer::mono(SR, samples).unwrap();

    let (out, profile) = NoiseReduction::default().apply_with_report(&input).unwrap();
    assert!(matches!(profile, NoiseProfile::Estimated { .. }));

    let quiet = SR as usize / 4;
    let before = rms(&input.channel(0).unwrap()[1024..quiet]);
    let after = rms(&out.channel(0).unwrap()[1024..quiet]);
    assert!(after < before * 0.5, "hiss rms {before} -> {after}");

    let loud = SR as usize..SR as usize + SR as usize / 4;
    let tone_before = rms(&input.channel(0).unwrap()[loud.clone()]);
    let tone_after = rms(&out.channel(0).unwrap()[loud]);
    assert!((tone_after / tone_before - 1.0).abs() < 0.1);
}

#[test]
fn test_full_chain_keeps_headroom() {
    let left = sine(110.0, 0.6, 1.0)
        .iter()
        .zip(sine(3000.0, 0.4, 1.0))
        .map(|(a, b)| a + b)
        .collect::<Vec<_>>();
    let right = left.iter().map(|x| 0.8 * x).collect();
    let input = SampleBuffer::stereo(SR, left, right).unwrap();

    let chain = Equalizer {
        bands: vec![EqBand::new(3000.0, -3.0, 1.0)],
        ..Equalizer::default()
    }
    .chain(Compressor::default())
    .chain(Reverb {
        ir_duration_s: 0.3,
        ..Reverb::default()
    })
    .chain(Delay {
        delay_ms: 120.0,
        mix: 0.3,
        ..Delay::default()
    })
    .chain(StereoWidener::new(1.3))
    .chain(MasteringChain::default());

    let out = chain.apply(&input).unwrap();
    assert_eq!(out.len(), input.len());
    assert_eq!(out.num_channels(), 2);
    assert!(out.peak() <= MasteringChain::default().ceiling);
    assert!(out.channels().iter().flatten().all(|s| s.is_finite()));
}

#[test]
fn test_four_band_mastering() {
    let mix: Vec<f32> = [(60.0, 0.5), (500.0, 0.4), (3000.0, 0.3), (10000.0, 0.2)]
        .iter()
        .map(|&(freq, amp)| sine(freq, amp, 1.0))
        .reduce(|acc, s| acc.iter().zip(&s).map(|(a, b)| a + b).collect())
        .unwrap();
    let input = SampleBuffer::mono(SR, mix).unwrap();
    let chain = MasteringChain {
        crossovers_hz: vec![120.0, 1000.0, 6000.0],
        band_thresholds_db: vec![-12.0; 4],
        band_ratios: vec![2.0; 4],
        ..MasteringChain::default()
    };

    let bands = chain.split(&input).unwrap();
    assert_eq!(bands.len(), 4);
    let x = input.channel(0).unwrap();
    for i in 0..input.len() {
        let sum: f32 = bands.iter().map(|b| b.channel(0).unwrap()[i]).sum();
        assert!((sum - x[i]).abs() < 1e-4, "sample {i}: {sum} vs {}", x[i]);
    }
    // every band carries one of the partials
    let steady = SR as usize / 10..;
    for (band, partial) in bands.iter().zip([60.0, 500.0, 3000.0, 10000.0]) {
        let own = rms(&band.channel(0).unwrap()[steady.clone()]);
        assert!(own > 0.05, "{partial} Hz band rms {own}");
    }

    let out = chain.apply(&input).unwrap();
    assert_eq!(out.len(), input.len());
    assert!(out.peak() <= chain.ceiling);
    assert!(out.channel(0).unwrap().iter().all(|s| s.is_finite()));
}

#[test]
fn test_chain_fails_before_processing() {
    let input = SampleBuffer::mono(SR, sine(440.0, 0.5, 0.1)).unwrap();
    let chain = Compressor::default().chain(Delay {
        feedback: 1.2,
        ..Delay::default()
    });
    let err = chain.apply(&input).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DivergentConfiguration);
    assert_eq!(err.stage(), "delay");
}
