//! Integration tests for lustre-analysis on synthetic signals.

use lustre_analysis::{Analyzer, FlatReport, Key, Mode, Spectrogram};
use lustre_core::SampleBuffer;
use std::f32::consts::PI;
use tempfile::TempDir;

fn sine(freq: f32, amplitude: f32, sample_rate: u32, len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| amplitude * (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
        .collect()
}

/// Decaying 1 kHz bursts every `period` samples.
fn click_train(sample_rate: u32, period: usize, len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| {
            let t = i % period;
            if t < 256 {
                let env = (-(t as f32) / 40.0).exp();
                env * (2.0 * PI * 1000.0 * t as f32 / sample_rate as f32).sin()
            } else {
                0.0
            }
        })
        .collect()
}

#[test]
fn test_sine_spectral_descriptors() {
    // 1000 whole cycles, starting and ending at zero
    let buffer = SampleBuffer::mono(44100, sine(1000.0, 0.5, 44100, 44100)).unwrap();
    let report = Analyzer::default().analyze(&buffer).unwrap();

    let s = &report.spectral;
    assert!((s.centroid.mean - 1000.0).abs() < 50.0, "centroid {}", s.centroid.mean);
    assert!((s.rolloff.mean - 1000.0).abs() < 50.0, "rolloff {}", s.rolloff.mean);
    assert!(s.bandwidth.mean < 400.0, "bandwidth {}", s.bandwidth.mean);
    // 2 crossings per cycle: 2000 / 44100
    assert!((s.zero_crossing_rate.mean - 0.0454).abs() < 0.003);

    let l = &report.loudness;
    assert!((l.rms - 0.3536).abs() < 0.002);
    assert!((l.peak - 0.5).abs() < 0.001);
    assert!((l.crest_factor_db - 3.01).abs() < 0.1);
    assert!((report.duration_s - 1.0).abs() < 1e-9);
}

#[test]
fn test_click_train_tempo() {
    let sample_rate = 22050;
    // 22 hops of 512 samples per beat
    let period = 22 * 512;
    let expected_bpm = 60.0 * sample_rate as f32 / period as f32;
    let buffer = SampleBuffer::mono(sample_rate, click_train(sample_rate, period, period * 16))
        .unwrap();

    let report = Analyzer::default().analyze(&buffer).unwrap();
    let rhythm = &report.rhythm;
    assert!(
        (rhythm.tempo_bpm - expected_bpm).abs() < 2.0,
        "tempo {} expected {}",
        rhythm.tempo_bpm,
        expected_bpm
    );

    assert!(rhythm.beat_count() >= 12, "beats {:?}", rhythm.beat_times_s);
    let beat_period = period as f32 / sample_rate as f32;
    let hop_s = 512.0 / sample_rate as f32;
    for pair in rhythm.beat_times_s.windows(2) {
        let gap = pair[1] - pair[0];
        assert!((gap - beat_period).abs() <= hop_s + 1e-4, "gap {gap}");
    }
}

#[test]
fn test_major_chord_key() {
    let sample_rate = 22050;
    let len = sample_rate as usize * 3;
    let c5 = sine(523.25, 0.3, sample_rate, len);
    let e5 = sine(659.26, 0.3, sample_rate, len);
    let g5 = sine(783.99, 0.3, sample_rate, len);
    let chord: Vec<f32> = (0..len).map(|i| c5[i] + e5[i] + g5[i]).collect();
    let buffer = SampleBuffer::mono(sample_rate, chord).unwrap();

    let report = Analyzer::new(4096, 1024).unwrap().analyze(&buffer).unwrap();
    assert_eq!(
        report.tonal.key,
        Some(Key {
            tonic: 0,
            mode: Mode::Major
        })
    );
    assert!(report.tonal.confidence > 0.0);

    let flat = report.to_flat();
    assert_eq!(flat.key, "C");
    assert_eq!(flat.key_mode, "major");
}

#[test]
fn test_stereo_content_uses_downmix() {
    let left = sine(440.0, 0.4, 44100, 22050);
    let right = sine(660.0, 0.2, 44100, 22050);
    let mono: Vec<f32> = left.iter().zip(&right).map(|(l, r)| (l + r) * 0.5).collect();

    let analyzer = Analyzer::default();
    let stereo = analyzer
        .analyze(&SampleBuffer::stereo(44100, left, right).unwrap())
        .unwrap();
    let downmix = analyzer
        .analyze(&SampleBuffer::mono(44100, mono).unwrap())
        .unwrap();

    assert_eq!(stereo.channels, 2);
    assert_eq!(stereo.spectral, downmix.spectral);
    assert_eq!(stereo.rhythm, downmix.rhythm);
    assert_eq!(stereo.tonal, downmix.tonal);

    // levels come from the channels themselves
    assert!((stereo.loudness.peak - 0.4).abs() < 1e-3);
    let pooled_rms = ((0.4f32.powi(2) + 0.2f32.powi(2)) / 4.0).sqrt();
    assert!((stereo.loudness.rms - pooled_rms).abs() < 0.01, "{}", stereo.loudness.rms);
}

#[test]
fn test_anti_phase_stereo_keeps_its_level() {
    let left = sine(440.0, 1.0, 44100, 44100);
    let right: Vec<f32> = left.iter().map(|x| -x).collect();
    let report = Analyzer::default()
        .analyze(&SampleBuffer::stereo(44100, left, right).unwrap())
        .unwrap();

    assert!(report.loudness.peak > 0.9, "peak {}", report.loudness.peak);
    assert!(report.loudness.rms > 0.6, "rms {}", report.loudness.rms);
    assert!(report.loudness.rms_db > -4.0);
}

#[test]
fn test_silence_sentinels() {
    let buffer = SampleBuffer::silence(44100, 2, 44100).unwrap();
    let report = Analyzer::default().analyze(&buffer).unwrap();
    let flat = report.to_flat();

    assert_eq!(flat.rms, 0.0);
    assert_eq!(flat.peak, 0.0);
    assert_eq!(flat.tempo_bpm, 0.0);
    assert_eq!(flat.beat_count, 0);
    assert_eq!(flat.key, "none");
    assert_eq!(flat.key_mode, "none");
    assert_eq!(flat.key_confidence, 0.0);
    assert_eq!(flat.spectral_centroid_mean, 0.0);
    assert_eq!(flat.dynamic_range_db, 0.0);
    assert!((flat.duration_s - 1.0).abs() < 1e-9);
}

#[test]
fn test_exports_to_files() {
    let dir = TempDir::new().unwrap();
    let buffer = SampleBuffer::mono(16000, sine(440.0, 0.5, 16000, 16000)).unwrap();

    let report = Analyzer::default().analyze(&buffer).unwrap();
    let json_path = dir.path().join("report.json");
    report.export_json(&json_path).unwrap();
    let loaded: FlatReport =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(loaded.sample_rate, 16000);
    assert_eq!(loaded.key, report.to_flat().key);

    let spec = Spectrogram::compute(&buffer, 1024, 256).unwrap();
    let pgm_path = dir.path().join("spec.pgm");
    let csv_path = dir.path().join("spec.csv");
    spec.export_pgm(&pgm_path, 80.0).unwrap();
    spec.export_csv(&csv_path, true).unwrap();
    assert!(std::fs::read_to_string(&pgm_path).unwrap().starts_with("P2\n"));
    let csv = std::fs::read_to_string(&csv_path).unwrap();
    assert_eq!(csv.lines().count(), spec.num_frames() + 1);
}
