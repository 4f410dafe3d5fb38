//! Per-frame spectrum analysis and waveform capture.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::collections::VecDeque;
use std::f32::consts::PI;
use std::sync::Arc;

use crate::params::{audio_constants::WAVEFORM_LEN, FFTConfig};

/// Audio frequency band energies, each normalized to [0, 1]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AudioBands {
    pub low: f32,  // Bass (20-200 Hz)
    pub mid: f32,  // Mids (200-1000 Hz)
    pub high: f32, // Highs (1000-4000 Hz)
}

/// Hann window function for FFT analysis
pub fn hann_window(index: usize, size: usize) -> f32 {
    0.5 * (1.0 - ((2.0 * PI * index as f32) / (size as f32 - 1.0)).cos())
}

/// FFT band analyzer fed with the most recent output samples
pub struct BandAnalyzer {
    config: FFTConfig,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    samples: VecDeque<f32>,
    buffer: Vec<Complex<f32>>,
    bands: AudioBands,
}

impl BandAnalyzer {
    pub fn new(config: FFTConfig) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(config.fft_size);
        let window = (0..config.fft_size)
            .map(|i| hann_window(i, config.fft_size))
            .collect();

        Self {
            fft,
            window,
            samples: VecDeque::with_capacity(config.fft_size),
            buffer: vec![Complex::new(0.0, 0.0); config.fft_size],
            bands: AudioBands::default(),
            config,
        }
    }

    /// Append samples, keeping only the latest `fft_size`
    pub fn push_samples(&mut self, samples: &[f32]) {
        let size = self.config.fft_size;
        let skip = samples.len().saturating_sub(size);
        for &s in &samples[skip..] {
            if self.samples.len() == size {
                self.samples.pop_front();
            }
            self.samples.push_back(s);
        }
    }

    /// Run the FFT on the current window and update smoothed bands.
    ///
    /// Until a full window is available the previous bands are returned.
    pub fn analyze(&mut self) -> AudioBands {
        let size = self.config.fft_size;
        if self.samples.len() < size {
            return self.bands;
        }

        for (i, (&s, &w)) in self.samples.iter().zip(&self.window).enumerate() {
            self.buffer[i] = Complex::new(s * w, 0.0);
        }
        self.fft.process(&mut self.buffer);

        // A full-scale sine lands at ~size/4 in its peak bin after the Hann window
        let norm = size as f32 / 4.0;
        let band_energy = |range: std::ops::Range<usize>, buf: &[Complex<f32>]| -> f32 {
            let len = range.len().max(1) as f32;
            let mean = buf[range].iter().map(|c| c.norm()).sum::<f32>() / len;
            (mean / norm).clamp(0.0, 1.0)
        };

        let raw = AudioBands {
            low: band_energy(self.config.bass_bins(), &self.buffer),
            mid: band_energy(self.config.mid_bins(), &self.buffer),
            high: band_energy(self.config.high_bins(), &self.buffer),
        };

        let k = self.config.smoothing;
        let smooth = |prev: f32, new: f32| k * prev + (1.0 - k) * new;
        self.bands = AudioBands {
            low: smooth(self.bands.low, raw.low),
            mid: smooth(self.bands.mid, raw.mid),
            high: smooth(self.bands.high, raw.high),
        };
        self.bands
    }
}

/// Fixed-length ring buffer of decimated samples, used only for drawing
pub struct Waveform {
    buf: [f32; WAVEFORM_LEN],
    pos: usize,
    decimation: usize,
    counter: usize,
}

impl Waveform {
    /// Keep one of every `decimation` samples
    pub fn new(decimation: usize) -> Self {
        Self {
            buf: [0.0; WAVEFORM_LEN],
            pos: 0,
            decimation: decimation.max(1),
            counter: 0,
        }
    }

    pub fn push_samples(&mut self, samples: &[f32]) {
        for &s in samples {
            self.counter += 1;
            if self.counter >= self.decimation {
                self.counter = 0;
                self.buf[self.pos] = s;
                self.pos = (self.pos + 1) % WAVEFORM_LEN;
            }
        }
    }

    /// Samples ordered oldest to newest
    pub fn snapshot(&self) -> [f32; WAVEFORM_LEN] {
        let mut out = [0.0; WAVEFORM_LEN];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.buf[(self.pos + i) % WAVEFORM_LEN];
        }
        out
    }
}
