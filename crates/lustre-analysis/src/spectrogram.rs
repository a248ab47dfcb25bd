//! STFT magnitude spectrogram and its file exports.
//!
//! Stereo input is downmixed to mono first. Export formats:
//! - CSV: one row per frame, first column time in seconds, then one column
//!   per frequency bin
//! - PGM: ASCII grayscale image (P2), time on X, frequency on Y with low
//!   frequencies at the bottom, dB-scaled over a fixed dynamic range

use lustre_core::{Result, SampleBuffer, SpectralEngine};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Default dynamic range mapped onto the PGM gray scale.
pub const DEFAULT_DB_RANGE: f32 = 80.0;

/// Magnitude spectrogram, `data[frame][bin]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    /// Magnitudes per frame.
    pub data: Vec<Vec<f32>>,
    /// FFT size used.
    pub fft_size: usize,
    /// Hop size between frames.
    pub hop_size: usize,
    /// Sample rate of the source.
    pub sample_rate: u32,
}

impl Spectrogram {
    /// Compute the spectrogram of a buffer.
    ///
    /// Fails on invalid window/hop or an empty buffer.
    pub fn compute(buffer: &SampleBuffer, fft_size: usize, hop_size: usize) -> Result<Self> {
        let engine = SpectralEngine::new(fft_size, hop_size)?;
        let mono = SampleBuffer::mono(buffer.sample_rate(), buffer.to_mono())?;
        let frames = engine.forward(&mono)?;
        Ok(Self {
            data: frames.magnitudes(0),
            fft_size,
            hop_size,
            sample_rate: buffer.sample_rate(),
        })
    }

    /// Number of time frames.
    pub fn num_frames(&self) -> usize {
        self.data.len()
    }

    /// Number of frequency bins (`fft_size / 2 + 1`).
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Frequency in Hz of a bin.
    pub fn bin_to_freq(&self, bin: usize) -> f32 {
        bin as f32 * self.sample_rate as f32 / self.fft_size as f32
    }

    /// Time in seconds at the center of a frame, clamped at 0.
    ///
    /// Frames start `fft_size - hop_size` samples before the signal.
    pub fn frame_to_time(&self, frame: usize) -> f32 {
        let center = (frame * self.hop_size + self.fft_size / 2) as f32
            - (self.fft_size - self.hop_size) as f32;
        center.max(0.0) / self.sample_rate as f32
    }

    /// Magnitude at a frame and bin.
    pub fn get(&self, frame: usize, bin: usize) -> Option<f32> {
        self.data.get(frame).and_then(|f| f.get(bin)).copied()
    }

    /// Magnitude in dB at a frame and bin.
    pub fn get_db(&self, frame: usize, bin: usize) -> Option<f32> {
        self.get(frame, bin).map(|m| 20.0 * m.max(1e-10).log10())
    }

    /// Frequency of the strongest bin in a frame.
    pub fn peak_frequency(&self, frame: usize) -> Option<f32> {
        let spectrum = self.data.get(frame)?;
        let (bin, _) = spectrum
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))?;
        Some(self.bin_to_freq(bin))
    }

    /// Write CSV to `writer`.
    pub fn write_csv<W: Write>(&self, mut writer: W, db_scale: bool) -> io::Result<()> {
        write!(writer, "time_s")?;
        for bin in 0..self.num_bins() {
            write!(writer, ",{:.2}", self.bin_to_freq(bin))?;
        }
        writeln!(writer)?;

        for (frame, spectrum) in self.data.iter().enumerate() {
            write!(writer, "{:.6}", self.frame_to_time(frame))?;
            for &mag in spectrum {
                let value = if db_scale {
                    20.0 * mag.max(1e-10).log10()
                } else {
                    mag
                };
                write!(writer, ",{:.6}", value)?;
            }
            writeln!(writer)?;
        }
        writer.flush()
    }

    /// Write an ASCII PGM image to `writer`.
    ///
    /// Levels more than `db_range` below the loudest bin map to black.
    pub fn write_pgm<W: Write>(&self, mut writer: W, db_range: f32) -> io::Result<()> {
        let width = self.num_frames();
        let height = self.num_bins();
        let db_range = db_range.max(1.0);

        writeln!(writer, "P2")?;
        writeln!(writer, "# lustre spectrogram")?;
        writeln!(writer, "# Width: {} frames, Height: {} bins", width, height)?;
        writeln!(writer, "{} {}", width, height)?;
        writeln!(writer, "255")?;

        let max_mag = self
            .data
            .iter()
            .flatten()
            .fold(0.0f32, |m, &v| m.max(v));
        let max_db = 20.0 * max_mag.max(1e-10).log10();

        for bin in (0..height).rev() {
            let row: Vec<String> = (0..width)
                .map(|frame| {
                    let db = self.get_db(frame, bin).unwrap_or(-200.0);
                    let normalized = ((db - (max_db - db_range)) / db_range).clamp(0.0, 1.0);
                    ((normalized * 255.0) as u8).to_string()
                })
                .collect();
            writeln!(writer, "{}", row.join(" "))?;
        }
        writer.flush()
    }

    /// Export CSV to a file.
    pub fn export_csv(&self, path: impl AsRef<Path>, db_scale: bool) -> io::Result<()> {
        self.write_csv(BufWriter::new(File::create(path)?), db_scale)
    }

    /// Export a PGM image to a file.
    pub fn export_pgm(&self, path: impl AsRef<Path>, db_range: f32) -> io::Result<()> {
        self.write_pgm(BufWriter::new(File::create(path)?), db_range)
    }
}
