//! Commands shared by every input path, plus color adjustment and cue points.
//!
//! Keyboard, hand/face landmarks, voice, and the microphone all reduce to a
//! `Command` which the app applies in one place.

use crate::audio::{EffectKind, FilterKind};
use crate::music::{theory::note_name, Mode, PlaybackMode};

/// Number of cue slots
pub const CUE_SLOTS: usize = 4;

/// A single user intent
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    // Transport
    Play,
    Pause,
    TogglePlay,

    // Shader gallery
    NextShader,
    PreviousShader,
    RandomShader,
    SelectShader(usize),

    // Music
    SetMode(Mode),
    NextMode,
    /// Pitch class above C (0-11)
    SetRootPitch(u8),
    /// Absolute MIDI tonic
    SetRoot(u8),
    SetTempo(f32),
    NudgeTempo(f32),
    SetPlayback(PlaybackMode),
    NextPlayback,
    RestartPhrase,

    // Effects
    ToggleEffect(EffectKind),
    SetEffect(EffectKind, bool),
    AllEffectsOff,
    SetFilterKind(FilterKind),
    SetFilterCutoff(f32),
    SetReverbMix(f32),
    SetCrossfader(f32),

    // Color
    SetHueShift(f32),
    NudgeHue(f32),
    NudgeSaturation(f32),
    NudgeBrightness(f32),
    NudgeContrast(f32),
    ResetColor,

    // Cues (zero-based slot)
    TriggerCue(usize),
    StoreCue(usize),
    ClearCues,

    // Beatbox pattern
    RecordBeat,
    ClearBeat,
    DefaultBeat,

    Help,
}

impl Command {
    /// Whether the command comes from a continuous control (hand/face),
    /// which is applied silently every frame
    pub fn is_continuous(&self) -> bool {
        matches!(
            self,
            Command::SetFilterCutoff(_)
                | Command::SetReverbMix(_)
                | Command::SetCrossfader(_)
                | Command::SetHueShift(_)
        )
    }

    /// Short acknowledgement text for spoken feedback
    pub fn feedback(&self) -> String {
        match *self {
            Command::Play => "Playing".to_string(),
            Command::Pause => "Paused".to_string(),
            Command::TogglePlay => "Toggling playback".to_string(),
            Command::NextShader => "Next visual".to_string(),
            Command::PreviousShader => "Previous visual".to_string(),
            Command::RandomShader => "Random visual".to_string(),
            Command::SelectShader(i) => format!("Visual {}", i + 1),
            Command::SetMode(mode) => format!("{} mode", mode),
            Command::NextMode => "Next mode".to_string(),
            Command::SetRootPitch(pc) => {
                let name = note_name(pc % 12);
                format!("Key of {}", name.trim_end_matches(|c: char| c.is_ascii_digit() || c == '-'))
            }
            Command::SetRoot(note) => format!("Root {}", note_name(note)),
            Command::SetTempo(bpm) => format!("Tempo {:.0}", bpm),
            Command::NudgeTempo(delta) if delta >= 0.0 => "Faster".to_string(),
            Command::NudgeTempo(_) => "Slower".to_string(),
            Command::SetPlayback(mode) => format!("{} playback", mode.name()),
            Command::NextPlayback => "Next playback mode".to_string(),
            Command::RestartPhrase => "From the top".to_string(),
            Command::ToggleEffect(kind) => format!("Toggling {}", kind.name()),
            Command::SetEffect(kind, on) => {
                format!("{} {}", kind.name(), if on { "on" } else { "off" })
            }
            Command::AllEffectsOff => "Effects off".to_string(),
            Command::SetFilterKind(FilterKind::Lowpass) => "Low pass".to_string(),
            Command::SetFilterKind(FilterKind::Highpass) => "High pass".to_string(),
            Command::SetFilterCutoff(hz) => format!("Cutoff {:.0} hertz", hz),
            Command::SetReverbMix(mix) => format!("Reverb {:.0} percent", mix * 100.0),
            Command::SetCrossfader(x) => format!("Crossfader {:.0} percent", x * 100.0),
            Command::SetHueShift(_) | Command::NudgeHue(_) => "Shifting colors".to_string(),
            Command::NudgeSaturation(d) if d >= 0.0 => "More color".to_string(),
            Command::NudgeSaturation(_) => "Less color".to_string(),
            Command::NudgeBrightness(d) if d >= 0.0 => "Brighter".to_string(),
            Command::NudgeBrightness(_) => "Darker".to_string(),
            Command::NudgeContrast(d) if d >= 0.0 => "More contrast".to_string(),
            Command::NudgeContrast(_) => "Less contrast".to_string(),
            Command::ResetColor => "Colors reset".to_string(),
            Command::TriggerCue(slot) => format!("Cue {}", slot + 1),
            Command::StoreCue(slot) => format!("Saved cue {}", slot + 1),
            Command::ClearCues => "Cues cleared".to_string(),
            Command::RecordBeat => "Beatbox on the next bar".to_string(),
            Command::ClearBeat => "Drums off".to_string(),
            Command::DefaultBeat => "Default beat".to_string(),
            Command::Help => "Try: play, next, faster, mode dorian, key of e flat, cue one".to_string(),
        }
    }
}

/// Post-processing color controls applied in every shader
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorAdjust {
    /// Hue rotation in turns, -0.5..0.5
    pub hue_shift: f32,
    /// Saturation multiplier, 0..2
    pub saturation: f32,
    /// Brightness multiplier, 0.2..2
    pub brightness: f32,
    /// Contrast around mid-grey, 0.5..2
    pub contrast: f32,
}

impl Default for ColorAdjust {
    fn default() -> Self {
        Self {
            hue_shift: 0.0,
            saturation: 1.0,
            brightness: 1.0,
            contrast: 1.0,
        }
    }
}

impl ColorAdjust {
    pub fn set_hue_shift(&mut self, turns: f32) {
        self.hue_shift = turns.clamp(-0.5, 0.5);
    }

    pub fn nudge_hue(&mut self, delta: f32) {
        self.set_hue_shift(self.hue_shift + delta);
    }

    pub fn nudge_saturation(&mut self, delta: f32) {
        self.saturation = (self.saturation + delta).clamp(0.0, 2.0);
    }

    pub fn nudge_brightness(&mut self, delta: f32) {
        self.brightness = (self.brightness + delta).clamp(0.2, 2.0);
    }

    pub fn nudge_contrast(&mut self, delta: f32) {
        self.contrast = (self.contrast + delta).clamp(0.5, 2.0);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Everything a cue point restores
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scene {
    pub shader: usize,
    pub root_midi: u8,
    pub mode: Mode,
    pub playback: PlaybackMode,
    pub bpm: f32,
    pub color: ColorAdjust,
}

/// Outcome of pressing a cue
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CueAction {
    /// Slot was empty and now holds the current scene
    Stored,
    /// Slot held a scene to restore
    Recalled(Scene),
    /// Slot index out of range
    Ignored,
}

/// Hot-cue style scene slots: an empty slot records, a filled one recalls
#[derive(Debug, Default)]
pub struct CueBank {
    slots: [Option<Scene>; CUE_SLOTS],
}

impl CueBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: usize) -> Option<&Scene> {
        self.slots.get(slot).and_then(|s| s.as_ref())
    }

    /// Overwrite a slot; returns false for an invalid slot
    pub fn store(&mut self, slot: usize, scene: Scene) -> bool {
        match self.slots.get_mut(slot) {
            Some(entry) => {
                *entry = Some(scene);
                true
            }
            None => false,
        }
    }

    pub fn trigger(&mut self, slot: usize, current: Scene) -> CueAction {
        match self.slots.get_mut(slot) {
            Some(Some(scene)) => CueAction::Recalled(*scene),
            Some(entry) => {
                *entry = Some(current);
                CueAction::Stored
            }
            None => CueAction::Ignored,
        }
    }

    pub fn clear(&mut self) {
        self.slots = [None; CUE_SLOTS];
    }

    /// Number of filled slots
    pub fn filled(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn scene(shader: usize) -> Scene {
        Scene {
            shader,
            root_midi: 48,
            mode: Mode::Dorian,
            playback: PlaybackMode::Bass,
            bpm: 100.0,
            color: ColorAdjust::default(),
        }
    }

    #[test]
    fn test_cue_stores_then_recalls() {
        let mut cues = CueBank::new();
        assert_eq!(cues.trigger(0, scene(3)), CueAction::Stored);
        assert_eq!(cues.trigger(0, scene(5)), CueAction::Recalled(scene(3)));
        assert_eq!(cues.filled(), 1);
    }

    #[test]
    fn test_cue_store_overwrites() {
        let mut cues = CueBank::new();
        cues.trigger(1, scene(1));
        assert!(cues.store(1, scene(2)));
        assert_eq!(cues.get(1).map(|s| s.shader), Some(2));
    }

    #[test]
    fn test_cue_out_of_range() {
        let mut cues = CueBank::new();
        assert_eq!(cues.trigger(CUE_SLOTS, scene(0)), CueAction::Ignored);
        assert!(!cues.store(CUE_SLOTS, scene(0)));
        cues.trigger(2, scene(0));
        cues.clear();
        assert_eq!(cues.filled(), 0);
    }

    #[test]
    fn test_key_feedback_drops_octave() {
        assert_eq!(Command::SetRootPitch(3).feedback(), "Key of Eb");
        assert_eq!(Command::TriggerCue(0).feedback(), "Cue 1");
    }

    #[test]
    fn test_color_reset() {
        let mut color = ColorAdjust::default();
        color.nudge_brightness(0.5);
        color.nudge_hue(0.2);
        color.reset();
        assert_eq!(color, ColorAdjust::default());
    }

    proptest! {
        #[test]
        fn test_color_nudges_stay_in_range(deltas in proptest::collection::vec(-3.0f32..3.0, 1..20)) {
            let mut color = ColorAdjust::default();
            for d in deltas {
                color.nudge_hue(d);
                color.nudge_saturation(d);
                color.nudge_brightness(d);
                color.nudge_contrast(d);
            }
            prop_assert!((-0.5..=0.5).contains(&color.hue_shift));
            prop_assert!((0.0..=2.0).contains(&color.saturation));
            prop_assert!((0.2..=2.0).contains(&color.brightness));
            prop_assert!((0.5..=2.0).contains(&color.contrast));
        }
    }
}
