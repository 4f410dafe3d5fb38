//! Audio analysis configuration and constants.

use serde::Deserialize;
use std::ops::Range;

/// FFT analysis configuration with frequency band mappings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FFTConfig {
    /// Audio sample rate (Hz)
    pub sample_rate_hz: usize,

    /// FFT window size (must be power of 2)
    pub fft_size: usize,

    /// Exponential smoothing of band energies per frame (0 = none, <1)
    pub smoothing: f32,

    /// Bass frequency range (Hz)
    pub bass_range_hz: (f32, f32),

    /// Mid frequency range (Hz)
    pub mid_range_hz: (f32, f32),

    /// High frequency range (Hz)
    pub high_range_hz: (f32, f32),
}

impl Default for FFTConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 44100,
            fft_size: 1024,
            smoothing: 0.6,
            bass_range_hz: (20.0, 200.0),
            mid_range_hz: (200.0, 1000.0),
            high_range_hz: (1000.0, 4000.0),
        }
    }
}

impl FFTConfig {
    /// Convert frequency (Hz) to FFT bin index
    pub fn hz_to_bin(&self, hz: f32) -> usize {
        ((hz * self.fft_size as f32) / self.sample_rate_hz as f32) as usize
    }

    /// Get FFT bin range for bass frequencies
    pub fn bass_bins(&self) -> Range<usize> {
        self.bins_for(self.bass_range_hz)
    }

    /// Get FFT bin range for mid frequencies
    pub fn mid_bins(&self) -> Range<usize> {
        self.bins_for(self.mid_range_hz)
    }

    /// Get FFT bin range for high frequencies
    pub fn high_bins(&self) -> Range<usize> {
        self.bins_for(self.high_range_hz)
    }

    /// Bin range for a band, never empty and never past Nyquist
    fn bins_for(&self, (lo_hz, hi_hz): (f32, f32)) -> Range<usize> {
        let nyquist = self.fft_size / 2;
        let start = self.hz_to_bin(lo_hz).min(nyquist - 1);
        let end = self.hz_to_bin(hi_hz).clamp(start + 1, nyquist);
        start..end
    }

    /// Validate configuration (FFT size must be power of 2, etc.)
    pub fn validate(&self) -> Result<(), String> {
        if !self.fft_size.is_power_of_two() || self.fft_size < 64 {
            return Err(format!(
                "FFT size must be a power of 2 and at least 64, got {}",
                self.fft_size
            ));
        }
        if self.sample_rate_hz == 0 {
            return Err("Sample rate must be > 0".to_string());
        }
        if !(0.0..1.0).contains(&self.smoothing) {
            return Err(format!("Smoothing must be in [0, 1), got {}", self.smoothing));
        }
        for (name, (lo, hi)) in [
            ("bass", self.bass_range_hz),
            ("mid", self.mid_range_hz),
            ("high", self.high_range_hz),
        ] {
            if lo < 0.0 || hi <= lo {
                return Err(format!("Invalid {} range: {}..{} Hz", name, lo, hi));
            }
        }
        Ok(())
    }
}

/// Microphone (beatbox) detection parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MicConfig {
    /// Enable microphone capture at startup
    pub enabled: bool,

    /// RMS energy above which a hit is detected (0-1)
    pub beat_threshold: f32,

    /// Minimum time between two hits (seconds)
    pub refractory_s: f32,

    /// Lowest detectable pitch (Hz)
    pub min_pitch_hz: f32,

    /// Highest detectable pitch (Hz)
    pub max_pitch_hz: f32,

    /// Minimum normalized autocorrelation to accept a pitch
    pub pitch_confidence: f32,
}

impl Default for MicConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            beat_threshold: 0.12,
            refractory_s: 0.12,
            min_pitch_hz: 70.0,
            max_pitch_hz: 1000.0,
            pitch_confidence: 0.6,
        }
    }
}

impl MicConfig {
    /// Validate detection parameters; pitch limits must sit below Nyquist
    pub fn validate(&self, sample_rate_hz: usize) -> Result<(), String> {
        if !(self.beat_threshold > 0.0 && self.beat_threshold <= 1.0) {
            return Err(format!(
                "Beat threshold must be in (0, 1], got {}",
                self.beat_threshold
            ));
        }
        if !(self.refractory_s >= 0.0) {
            return Err(format!(
                "Refractory period must be >= 0 s, got {}",
                self.refractory_s
            ));
        }
        let nyquist = sample_rate_hz as f32 / 2.0;
        if !(self.min_pitch_hz > 0.0
            && self.min_pitch_hz < self.max_pitch_hz
            && self.max_pitch_hz <= nyquist)
        {
            return Err(format!(
                "Pitch range must satisfy 0 < min < max <= {} Hz, got {}..{} Hz",
                nyquist, self.min_pitch_hz, self.max_pitch_hz
            ));
        }
        if !(0.0..=1.0).contains(&self.pitch_confidence) {
            return Err(format!(
                "Pitch confidence must be in [0, 1], got {}",
                self.pitch_confidence
            ));
        }
        Ok(())
    }
}

/// Audio constants (compile-time, match Glicol engine setup)
pub mod audio_constants {
    /// Audio block size (samples per buffer)
    /// 128 = 2.9ms @ 44.1kHz
    pub const BLOCK_SIZE: usize = 128;

    /// Samples kept for waveform drawing
    pub const WAVEFORM_LEN: usize = 128;

    /// Output safety limiter (hard clip)
    pub const LIMITER: f32 = 0.5;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fft_config_hz_to_bin() {
        let config = FFTConfig::default();

        // At 44100 Hz sample rate and 1024 FFT size:
        // Bin resolution = 44100 / 1024 ≈ 43.07 Hz per bin
        assert_eq!(config.hz_to_bin(0.0), 0);
        assert_eq!(config.hz_to_bin(43.07), 1);
        assert_eq!(config.hz_to_bin(100.0), 2);
    }

    #[test]
    fn test_fft_config_band_ranges() {
        let config = FFTConfig::default();

        let bass = config.bass_bins();
        let mid = config.mid_bins();
        let high = config.high_bins();

        assert!(!bass.is_empty());
        assert!(bass.end <= 10);

        assert!(mid.start >= bass.end);
        assert!(mid.end <= 50);

        assert!(high.start >= mid.end);
        assert!(high.end <= 200);
    }

    #[test]
    fn test_band_range_never_empty() {
        let config = FFTConfig {
            bass_range_hz: (20.0, 25.0),
            ..Default::default()
        };
        assert_eq!(config.bass_bins().len(), 1);
    }

    #[test]
    fn test_validate() {
        assert!(FFTConfig::default().validate().is_ok());

        let bad_size = FFTConfig {
            fft_size: 1000,
            ..Default::default()
        };
        assert!(bad_size.validate().is_err());

        let inverted = FFTConfig {
            mid_range_hz: (1000.0, 200.0),
            ..Default::default()
        };
        assert!(inverted.validate().is_err());

        let zero_rate = FFTConfig {
            sample_rate_hz: 0,
            ..Default::default()
        };
        assert!(zero_rate.validate().is_err());
    }

    #[test]
    fn test_mic_config_validate() {
        assert!(MicConfig::default().validate(44100).is_ok());

        for bad in [
            MicConfig { min_pitch_hz: 0.0, ..Default::default() },
            MicConfig { min_pitch_hz: 1200.0, ..Default::default() },
            MicConfig { max_pitch_hz: 30000.0, ..Default::default() },
            MicConfig { beat_threshold: -0.1, ..Default::default() },
            MicConfig { refractory_s: -1.0, ..Default::default() },
            MicConfig { pitch_confidence: 1.5, ..Default::default() },
            MicConfig { min_pitch_hz: f32::NAN, ..Default::default() },
        ] {
            assert!(bad.validate(44100).is_err(), "accepted {:?}", bad);
        }
    }
}
