//! Microphone beat and pitch detection.
//!
//! Beats: frame RMS over a threshold with a refractory period, classified
//! by zero-crossing rate (low = kick, mid = snare, high = hi-hat).
//! Pitch: normalized autocorrelation over a sliding window.

use tracing::debug;

use crate::music::{theory::hz_to_midi, DrumPattern, DrumVoice, STEPS};
use crate::params::MicConfig;

/// Samples per detection frame
pub const FRAME_SIZE: usize = 512;

/// Zero-crossing rate boundaries (crossings per sample)
const KICK_MAX_ZCR: f32 = 0.06;
const SNARE_MAX_ZCR: f32 = 0.2;

/// Window for pitch estimation
pub const PITCH_WINDOW: usize = 2048;

/// Minimum RMS before a pitch is reported
const PITCH_MIN_RMS: f32 = 0.01;

/// A detected percussive onset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatHit {
    pub voice: DrumVoice,
    pub energy: f32,
}

pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}

/// Sign changes per sample
pub fn zero_crossing_rate(samples: &[f32]) -> f32 {
    if samples.len() < 2 {
        return 0.0;
    }
    let crossings = samples
        .windows(2)
        .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
        .count();
    crossings as f32 / (samples.len() - 1) as f32
}

pub fn classify(zcr: f32) -> DrumVoice {
    if zcr < KICK_MAX_ZCR {
        DrumVoice::Kick
    } else if zcr < SNARE_MAX_ZCR {
        DrumVoice::Snare
    } else {
        DrumVoice::HiHat
    }
}

/// Energy-threshold onset detector
pub struct BeatDetector {
    threshold: f32,
    refractory_samples: usize,
    since_hit: usize,
    frame: Vec<f32>,
}

impl BeatDetector {
    pub fn new(config: &MicConfig, sample_rate: u32) -> Self {
        let refractory_samples = (config.refractory_s * sample_rate as f32) as usize;
        Self {
            threshold: config.beat_threshold,
            refractory_samples,
            since_hit: refractory_samples,
            frame: Vec::with_capacity(FRAME_SIZE),
        }
    }

    /// Feed samples; returns hits completed by this call
    pub fn process(&mut self, samples: &[f32]) -> Vec<BeatHit> {
        let mut hits = Vec::new();
        for &sample in samples {
            self.frame.push(sample);
            if self.frame.len() < FRAME_SIZE {
                continue;
            }

            let energy = rms(&self.frame);
            if energy > self.threshold && self.since_hit >= self.refractory_samples {
                let voice = classify(zero_crossing_rate(&self.frame));
                debug!("Beat: {} ({:.3})", voice.name(), energy);
                hits.push(BeatHit { voice, energy });
                self.since_hit = 0;
            }
            self.since_hit = self.since_hit.saturating_add(FRAME_SIZE);
            self.frame.clear();
        }
        hits
    }
}

/// Estimated pitch of the microphone signal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEstimate {
    pub hz: f32,
    pub midi: u8,
    pub confidence: f32,
}

/// Autocorrelation pitch estimate over `samples`.
///
/// Picks the first local correlation peak that reaches 90% of the best one,
/// which avoids locking onto subharmonics. Returns (hz, correlation).
pub fn estimate_pitch(samples: &[f32], sample_rate: u32, min_hz: f32, max_hz: f32) -> Option<(f32, f32)> {
    if !(min_hz > 0.0 && max_hz > min_hz) || sample_rate == 0 {
        return None;
    }
    let sr = sample_rate as f32;
    let min_lag = (sr / max_hz).floor().max(1.0) as usize;
    let max_lag = (sr / min_hz).ceil() as usize;
    let needed = max_lag.checked_mul(2)?;
    if samples.len() < needed || min_lag + 2 > max_lag {
        return None;
    }

    let correlation = |lag: usize| {
        let n = samples.len() - lag;
        let (mut xy, mut xx, mut yy) = (0.0f32, 0.0f32, 0.0f32);
        for i in 0..n {
            let (x, y) = (samples[i], samples[i + lag]);
            xy += x * y;
            xx += x * x;
            yy += y * y;
        }
        let denom = (xx * yy).sqrt();
        if denom > f32::EPSILON {
            xy / denom
        } else {
            0.0
        }
    };

    // One extra lag on each side for peak tests and interpolation
    let scores: Vec<f32> = (min_lag - 1..=max_lag + 1).map(correlation).collect();
    let score = |lag: usize| scores[lag + 1 - min_lag];

    let best = (min_lag..=max_lag).map(score).fold(f32::MIN, f32::max);
    if best <= 0.0 {
        return None;
    }

    let lag = (min_lag..=max_lag).find(|&lag| {
        let s = score(lag);
        s >= 0.9 * best && s >= score(lag - 1) && s >= score(lag + 1)
    })?;

    // Parabolic interpolation around the peak
    let (a, b, c) = (score(lag - 1), score(lag), score(lag + 1));
    let denom = a - 2.0 * b + c;
    let offset = if denom.abs() > f32::EPSILON {
        (0.5 * (a - c) / denom).clamp(-0.5, 0.5)
    } else {
        0.0
    };

    Some((sr / (lag as f32 + offset), b))
}

/// Sliding-window pitch tracker
pub struct PitchDetector {
    sample_rate: u32,
    min_hz: f32,
    max_hz: f32,
    confidence: f32,
    window: Vec<f32>,
}

impl PitchDetector {
    pub fn new(config: &MicConfig, sample_rate: u32) -> Self {
        Self {
            sample_rate,
            min_hz: config.min_pitch_hz,
            max_hz: config.max_pitch_hz,
            confidence: config.pitch_confidence,
            window: Vec::with_capacity(PITCH_WINDOW),
        }
    }

    /// Feed samples and estimate the pitch of the latest window
    pub fn process(&mut self, samples: &[f32]) -> Option<PitchEstimate> {
        self.window.extend_from_slice(samples);
        if self.window.len() > PITCH_WINDOW {
            let excess = self.window.len() - PITCH_WINDOW;
            self.window.drain(..excess);
        }
        if self.window.len() < PITCH_WINDOW || rms(&self.window) < PITCH_MIN_RMS {
            return None;
        }

        let (hz, confidence) =
            estimate_pitch(&self.window, self.sample_rate, self.min_hz, self.max_hz)?;
        (confidence >= self.confidence).then(|| PitchEstimate {
            hz,
            midi: hz_to_midi(hz),
            confidence,
        })
    }
}

/// Reports a note once it has been estimated for `required` consecutive
/// windows. Fires once per hold.
pub struct PitchHold {
    required: u32,
    note: Option<u8>,
    frames: u32,
}

impl PitchHold {
    pub fn new(required: u32) -> Self {
        Self {
            required: required.max(1),
            note: None,
            frames: 0,
        }
    }

    /// Feed the latest estimate (`None` when no pitch was found)
    pub fn update(&mut self, note: Option<u8>) -> Option<u8> {
        let Some(note) = note else {
            self.reset();
            return None;
        };
        if self.note == Some(note) {
            self.frames = self.frames.saturating_add(1);
        } else {
            self.note = Some(note);
            self.frames = 1;
        }
        (self.frames == self.required).then_some(note)
    }

    pub fn reset(&mut self) {
        self.note = None;
        self.frames = 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecorderState {
    Idle,
    /// Waiting for the next bar line
    Armed,
    Recording,
}

/// Records one bar of beatbox hits into a 16-step drum pattern
pub struct BeatRecorder {
    state: RecorderState,
    pattern: DrumPattern,
}

/// Step for a position within the bar (0..1), rounded to the nearest step
pub fn quantize(bar_phase: f64) -> usize {
    ((bar_phase.clamp(0.0, 1.0) * STEPS as f64).round() as usize) % STEPS
}

impl BeatRecorder {
    pub fn new() -> Self {
        Self {
            state: RecorderState::Idle,
            pattern: DrumPattern::empty(),
        }
    }

    /// Start recording at the next bar line
    pub fn arm(&mut self) {
        self.state = RecorderState::Armed;
    }

    pub fn is_armed(&self) -> bool {
        self.state == RecorderState::Armed
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecorderState::Recording
    }

    pub fn record(&mut self, hit: &BeatHit, bar_phase: f64) {
        if self.state == RecorderState::Recording {
            self.pattern.set(hit.voice, quantize(bar_phase), true);
        }
    }

    /// Advance at a bar line. Returns the finished pattern when a recording
    /// bar ends with at least one hit.
    pub fn on_bar(&mut self) -> Option<DrumPattern> {
        match self.state {
            RecorderState::Idle => None,
            RecorderState::Armed => {
                self.pattern = DrumPattern::empty();
                self.state = RecorderState::Recording;
                None
            }
            RecorderState::Recording => {
                self.state = RecorderState::Idle;
                let pattern = std::mem::replace(&mut self.pattern, DrumPattern::empty());
                (!pattern.is_empty()).then_some(pattern)
            }
        }
    }
}

impl Default for BeatRecorder {
    fn default() -> Self {
        Self::new()
    }
}
