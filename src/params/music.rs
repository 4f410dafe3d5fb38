//! Generative music parameters.

use serde::Deserialize;

use crate::music::{Mode, PlaybackMode};

/// Tempo limits (BPM)
pub const MIN_BPM: f32 = 40.0;
pub const MAX_BPM: f32 = 240.0;

/// Tonic limits (MIDI, C1..C7)
pub const MIN_ROOT_MIDI: u8 = 24;
pub const MAX_ROOT_MIDI: u8 = 96;

/// Musical settings for the generative engine
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MusicSettings {
    /// Tonic as MIDI note (48 = C3)
    pub root_midi: u8,

    /// Diatonic mode
    pub mode: Mode,

    /// Tempo (beats per minute)
    pub bpm: f32,

    /// How the current chord is voiced
    pub playback: PlaybackMode,

    /// Beats per bar; one chord per bar
    pub beats_per_bar: u32,

    /// Chords per phrase before returning to the tonic
    pub phrase_len: usize,

    /// Progression RNG seed
    pub seed: u64,

    /// Start playing immediately
    pub autoplay: bool,
}

impl Default for MusicSettings {
    fn default() -> Self {
        Self {
            root_midi: 48,
            mode: Mode::Aeolian,
            bpm: 110.0,
            playback: PlaybackMode::Arpeggio,
            beats_per_bar: 4,
            phrase_len: 8,
            seed: 42,
            autoplay: true,
        }
    }
}

impl MusicSettings {
    /// Duration of one bar (seconds)
    pub fn bar_duration_s(&self) -> f64 {
        self.beats_per_bar as f64 * 60.0 / self.bpm as f64
    }

    /// Glicol `speed` factor (its sequencer runs one bar per 2 s at 120 BPM)
    pub fn glicol_speed(&self) -> f32 {
        self.bpm / 120.0
    }

    /// Tonic for `pitch_class` in the octave of the current root, dropping
    /// an octave when that would pass the top of the range
    pub fn root_for_pitch_class(&self, pitch_class: u8) -> u8 {
        let root = self.root_midi.clamp(MIN_ROOT_MIDI, MAX_ROOT_MIDI);
        let note = root - root % 12 + pitch_class % 12;
        if note > MAX_ROOT_MIDI {
            note - 12
        } else {
            note
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(MIN_BPM..=MAX_BPM).contains(&self.bpm) {
            return Err(format!(
                "Tempo must be within {}-{} BPM, got {}",
                MIN_BPM, MAX_BPM, self.bpm
            ));
        }
        if !(MIN_ROOT_MIDI..=MAX_ROOT_MIDI).contains(&self.root_midi) {
            return Err(format!(
                "Root note must be MIDI {}-{}, got {}",
                MIN_ROOT_MIDI, MAX_ROOT_MIDI, self.root_midi
            ));
        }
        if self.beats_per_bar == 0 {
            return Err("Beats per bar must be > 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_duration() {
        let settings = MusicSettings {
            bpm: 120.0,
            ..Default::default()
        };
        assert!((settings.bar_duration_s() - 2.0).abs() < 1e-9);
        assert!((settings.glicol_speed() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_validate() {
        assert!(MusicSettings::default().validate().is_ok());
        let too_fast = MusicSettings {
            bpm: 300.0,
            ..Default::default()
        };
        assert!(too_fast.validate().is_err());
        let too_high = MusicSettings {
            root_midi: 120,
            ..Default::default()
        };
        assert!(too_high.validate().is_err());
    }

    #[test]
    fn test_root_for_pitch_class_keeps_octave() {
        let settings = MusicSettings::default();
        // C3 -> Eb3
        assert_eq!(settings.root_for_pitch_class(3), 51);
    }

    #[test]
    fn test_root_for_pitch_class_at_top_of_range() {
        let settings = MusicSettings {
            root_midi: MAX_ROOT_MIDI,
            ..Default::default()
        };
        // B above C7 is out of range: B6 instead
        assert_eq!(settings.root_for_pitch_class(11), 95);
        assert_eq!(settings.root_for_pitch_class(0), 96);
        for pc in 0..12 {
            let note = settings.root_for_pitch_class(pc);
            assert_eq!(note % 12, pc);
            assert!((MIN_ROOT_MIDI..=MAX_ROOT_MIDI).contains(&note));
        }
    }
}
