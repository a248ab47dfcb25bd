//! Integration tests for the `lustre` binary.

use std::f32::consts::PI;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Helper to get the path to the `lustre` binary built by cargo.
fn lustre_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_lustre"))
}

fn run(args: &[&str]) -> Output {
    lustre_bin()
        .args(args)
        .output()
        .expect("failed to run lustre")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Write a 16-bit mono sine to `dir/name`.
fn write_sine(dir: &Path, name: &str, freq: f32, amp: f32, secs: f32) -> PathBuf {
    let path = dir.join(name);
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 44100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    let frames = (44100.0 * secs) as usize;
    for i in 0..frames {
        let s = amp * (2.0 * PI * freq * i as f32 / 44100.0).sin();
        writer.write_sample((s * 32767.0) as i16).unwrap();
    }
    writer.finalize().unwrap();
    path
}

fn wav_peak(path: &Path) -> f32 {
    let reader = hound::WavReader::open(path).unwrap();
    reader
        .into_samples::<i16>()
        .map(|s| f32::from(s.unwrap()).abs() / 32768.0)
        .fold(0.0, f32::max)
}

// ---------------------------------------------------------------------------
// lustre effects
// ---------------------------------------------------------------------------

#[test]
fn cli_effects_lists_in_processing_order() {
    let output = run(&["effects"]);
    assert!(output.status.success());
    let text = stdout(&output);

    let names = [
        "noise_reduction",
        "equalizer",
        "compressor",
        "reverb",
        "delay",
        "stereo_widener",
        "limiter",
        "mastering",
    ];
    let positions: Vec<usize> = names
        .iter()
        .map(|n| text.find(n).unwrap_or_else(|| panic!("missing {n}")))
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{text}");
}

#[test]
fn cli_effects_detail_accepts_alias() {
    let output = run(&["effects", "compression"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("compressor"));
    assert!(text.contains("Parameters"));
    assert!(text.contains("threshold_db"));
    assert!(text.contains("makeup_db"));
}

#[test]
fn cli_effects_unknown_fails() {
    let output = run(&["effects", "flanger"]);
    assert!(!output.status.success());
}

#[test]
fn cli_effects_example_config_is_loadable() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(&["effects", "--example-config"]);
    assert!(output.status.success());
    let config_path = dir.path().join("chain.toml");
    std::fs::write(&config_path, &output.stdout).unwrap();

    let input = write_sine(dir.path(), "in.wav", 440.0, 0.5, 0.5);
    let output = run(&[
        "process",
        input.to_str().unwrap(),
        "--config",
        config_path.to_str().unwrap(),
        "--formats",
        "wav",
        "--no-report",
        "--no-spectrogram",
        "--output-dir",
        dir.path().to_str().unwrap(),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
}

// ---------------------------------------------------------------------------
// lustre analyze
// ---------------------------------------------------------------------------

#[test]
fn cli_analyze_json_report() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_sine(dir.path(), "tone.wav", 1000.0, 0.5, 1.0);
    let report_path = dir.path().join("report.json");

    let output = run(&[
        "analyze",
        input.to_str().unwrap(),
        "--json",
        "--output",
        report_path.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(report["sample_rate"], 44100);
    assert_eq!(report["channels"], 1);
    let centroid = report["spectral_centroid_mean"].as_f64().unwrap();
    assert!((centroid - 1000.0).abs() < 100.0, "centroid {centroid}");
    assert!(report["key"].is_string());
    assert!(report["beat_times_s"].is_array());
}

#[test]
fn cli_analyze_missing_file_fails() {
    let output = run(&["analyze", "/nonexistent/lustre-input.wav"]);
    assert!(!output.status.success());
}

// ---------------------------------------------------------------------------
// lustre process
// ---------------------------------------------------------------------------

#[test]
fn cli_process_limiter_only() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_sine(dir.path(), "loud.wav", 440.0, 0.99, 1.0);
    let out_dir = dir.path().join("out");

    let output = run(&[
        "process",
        input.to_str().unwrap(),
        "--bare",
        "--enable",
        "limiter",
        "--param",
        "limiter.ceiling=0.5",
        "--formats",
        "wav:24bit,flac,xyz",
        "--output-dir",
        out_dir.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let enhanced = out_dir.join("loud_enhanced.wav");
    assert!(wav_peak(&enhanced) <= 0.5 + 1.0 / 32768.0);
    assert!(out_dir.join("loud.wav").exists());
    assert!(out_dir.join("loud.flac").exists());
    assert!(out_dir.join("loud_analysis.json").exists());
    assert!(out_dir.join("loud_spectrogram.pgm").exists());

    // the unknown format is reported but does not abort the run
    assert!(stdout(&output).contains("FAILED"));
}

#[test]
fn cli_process_reject_policy() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_sine(dir.path(), "in.wav", 440.0, 0.5, 0.2);
    let output = run(&[
        "process",
        input.to_str().unwrap(),
        "--limiter-policy",
        "reject",
        "--output-dir",
        dir.path().to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("limiter"));
}

#[test]
fn cli_process_bad_param_fails_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_sine(dir.path(), "in.wav", 440.0, 0.5, 0.2);
    let out_dir = dir.path().join("out");
    let output = run(&[
        "process",
        input.to_str().unwrap(),
        "--param",
        "delay.feedback=1.5",
        "--enable",
        "delay",
        "--output-dir",
        out_dir.to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    assert!(!out_dir.join("in_enhanced.wav").exists());
}

// ---------------------------------------------------------------------------
// lustre export / spectrogram
// ---------------------------------------------------------------------------

#[test]
fn cli_export_encodes_lossy_natively() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_sine(dir.path(), "in.wav", 440.0, 0.5, 0.5);
    let out_dir = dir.path().join("exports");

    let output = run(&[
        "export",
        input.to_str().unwrap(),
        "--formats",
        "mp3,ogg,wav",
        "--title",
        "Master",
        "--name",
        "master",
        "--output-dir",
        out_dir.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(!stdout(&output).contains("FAILED"));
    for ext in ["mp3", "ogg", "wav"] {
        let path = out_dir.join(format!("master.{ext}"));
        assert!(std::fs::metadata(&path).unwrap().len() > 0, "{}", path.display());
    }
    let mp3 = std::fs::read(out_dir.join("master.mp3")).unwrap();
    assert_eq!(&mp3[0..3], b"ID3");
}

#[test]
fn cli_export_all_failed_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_sine(dir.path(), "in.wav", 440.0, 0.5, 0.2);
    let output = run(&[
        "export",
        input.to_str().unwrap(),
        "--formats",
        "xyz",
        "--output-dir",
        dir.path().to_str().unwrap(),
    ]);
    assert!(!output.status.success());
}

#[test]
fn cli_spectrogram_csv() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_sine(dir.path(), "in.wav", 440.0, 0.5, 0.5);
    let csv = dir.path().join("spec.csv");

    let output = run(&[
        "spectrogram",
        input.to_str().unwrap(),
        csv.to_str().unwrap(),
        "--fft-size",
        "512",
        "--hop",
        "256",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let text = std::fs::read_to_string(&csv).unwrap();
    assert!(text.lines().count() > 10);
}
