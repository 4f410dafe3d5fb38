//! Music engine: settings, bar clock, and current chord.

use serde::Deserialize;
use tracing::{debug, info};

use super::progression::Progression;
use super::theory::{triad, Chord, Mode};
use crate::params::{MusicSettings, MAX_BPM, MAX_ROOT_MIDI, MIN_BPM, MIN_ROOT_MIDI};

/// How the current chord is played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    /// Held triad
    Sustained,
    /// Broken chord over two octaves
    Arpeggio,
    /// Root/fifth bass line one octave down
    Bass,
}

impl PlaybackMode {
    /// Cycle Sustained -> Arpeggio -> Bass -> Sustained
    pub fn next(self) -> Self {
        match self {
            PlaybackMode::Sustained => PlaybackMode::Arpeggio,
            PlaybackMode::Arpeggio => PlaybackMode::Bass,
            PlaybackMode::Bass => PlaybackMode::Sustained,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PlaybackMode::Sustained => "sustained",
            PlaybackMode::Arpeggio => "arpeggio",
            PlaybackMode::Bass => "bass",
        }
    }
}

/// Generative music state advanced by the render loop
pub struct MusicEngine {
    settings: MusicSettings,
    progression: Progression,
    chord: Chord,
    playing: bool,
    bar_start_s: f64,
    bars_played: u64,
    dirty: bool,
}

impl MusicEngine {
    pub fn new(settings: MusicSettings) -> Self {
        let progression = Progression::new(settings.seed, settings.phrase_len);
        let chord = triad(settings.root_midi, settings.mode, progression.current());
        let playing = settings.autoplay;
        Self {
            settings,
            progression,
            chord,
            playing,
            bar_start_s: 0.0,
            bars_played: 0,
            dirty: true,
        }
    }

    pub fn settings(&self) -> &MusicSettings {
        &self.settings
    }

    pub fn chord(&self) -> &Chord {
        &self.chord
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn bars_played(&self) -> u64 {
        self.bars_played
    }

    /// Start playback; the bar clock restarts at `now_s`
    pub fn play(&mut self, now_s: f64) {
        if !self.playing {
            self.playing = true;
            self.bar_start_s = now_s;
            self.dirty = true;
            info!("Playback started");
        }
    }

    pub fn pause(&mut self) {
        if self.playing {
            self.playing = false;
            info!("Playback paused");
        }
    }

    pub fn toggle(&mut self, now_s: f64) {
        if self.playing {
            self.pause();
        } else {
            self.play(now_s);
        }
    }

    /// Advance the bar clock. Returns true when the patch must be rebuilt.
    pub fn tick(&mut self, now_s: f64) -> bool {
        if self.playing {
            let bar = self.settings.bar_duration_s();
            if now_s - self.bar_start_s >= bar {
                // Resync if the loop stalled for more than a bar
                self.bar_start_s = if now_s - self.bar_start_s >= 2.0 * bar {
                    now_s
                } else {
                    self.bar_start_s + bar
                };
                self.bars_played += 1;
                self.advance_chord();
            }
        }
        std::mem::take(&mut self.dirty)
    }

    /// Position within the current bar in [0, 1)
    pub fn bar_phase(&self, now_s: f64) -> f64 {
        let bar = self.settings.bar_duration_s();
        ((now_s - self.bar_start_s) / bar).rem_euclid(1.0)
    }

    fn advance_chord(&mut self) {
        let degree = self.progression.advance();
        self.chord = triad(self.settings.root_midi, self.settings.mode, degree);
        self.dirty = true;
        debug!("Chord: {}", self.chord.label());
    }

    fn rebuild_chord(&mut self) {
        self.chord = triad(
            self.settings.root_midi,
            self.settings.mode,
            self.progression.current(),
        );
        self.dirty = true;
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.settings.mode = mode;
        self.rebuild_chord();
        info!("Mode: {}", mode);
    }

    /// Set the tonic pitch class, keeping the current octave
    pub fn set_root_pitch_class(&mut self, pitch_class: u8) {
        self.set_root(self.settings.root_for_pitch_class(pitch_class));
    }

    pub fn set_root(&mut self, root_midi: u8) {
        self.settings.root_midi = root_midi.clamp(MIN_ROOT_MIDI, MAX_ROOT_MIDI);
        self.rebuild_chord();
        info!("Root: {}", super::theory::note_name(self.settings.root_midi));
    }

    pub fn set_bpm(&mut self, bpm: f32) {
        self.settings.bpm = bpm.clamp(MIN_BPM, MAX_BPM);
        self.dirty = true;
        info!("Tempo: {:.0} BPM", self.settings.bpm);
    }

    pub fn nudge_bpm(&mut self, delta: f32) {
        self.set_bpm(self.settings.bpm + delta);
    }

    pub fn set_playback(&mut self, playback: PlaybackMode) {
        self.settings.playback = playback;
        self.dirty = true;
        info!("Playback mode: {}", playback.name());
    }

    /// Restart the progression on the tonic
    pub fn restart_phrase(&mut self) {
        self.progression.reset();
        self.rebuild_chord();
    }

    /// MIDI notes the harmonic layer plays for the current chord.
    ///
    /// Sustained: the triad. Arpeggio: up and back down over two octaves.
    /// Bass: root, root, fifth, root an octave below the chord.
    pub fn voicing(&self) -> Vec<u8> {
        let [root, third, fifth] = self.chord.notes;
        match self.settings.playback {
            PlaybackMode::Sustained => vec![root, third, fifth],
            PlaybackMode::Arpeggio => vec![
                root,
                third,
                fifth,
                root + 12,
                third + 12,
                fifth + 12,
                root + 12,
                fifth,
            ],
            PlaybackMode::Bass => {
                let low_root = root.saturating_sub(12);
                let low_fifth = fifth.saturating_sub(12);
                vec![low_root, low_root, low_fifth, low_root]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::music::theory::ChordQuality;

    fn engine() -> MusicEngine {
        MusicEngine::new(MusicSettings {
            root_midi: 60,
            mode: Mode::Ionian,
            bpm: 120.0,
            ..Default::default()
        })
    }

    #[test]
    fn test_starts_on_tonic_and_dirty() {
        let mut engine = engine();
        assert_eq!(engine.chord().notes, [60, 64, 67]);
        assert!(engine.tick(0.0));
        assert!(!engine.tick(0.1));
    }

    #[test]
    fn test_chord_changes_once_per_bar() {
        let mut engine = engine();
        engine.tick(0.0);
        // 120 BPM, 4/4 -> 2 s per bar
        assert!(!engine.tick(1.9));
        assert!(engine.tick(2.0));
        assert_eq!(engine.bars_played(), 1);
        assert!(!engine.tick(2.5));
        assert!(engine.tick(4.1));
        assert_eq!(engine.bars_played(), 2);
    }

    #[test]
    fn test_paused_engine_does_not_advance() {
        let mut engine = engine();
        engine.tick(0.0);
        engine.pause();
        assert!(!engine.tick(10.0));
        assert_eq!(engine.bars_played(), 0);

        engine.play(10.0);
        assert!(engine.tick(10.0));
        assert!(!engine.tick(11.0));
    }

    #[test]
    fn test_set_mode_rebuilds_chord() {
        let mut engine = engine();
        engine.set_mode(Mode::Aeolian);
        assert_eq!(engine.chord().quality, ChordQuality::Minor);
        assert_eq!(engine.chord().notes, [60, 63, 67]);
    }

    #[test]
    fn test_set_root_pitch_class_keeps_octave() {
        let mut engine = engine();
        engine.set_root_pitch_class(3);
        assert_eq!(engine.settings().root_midi, 63);
    }

    #[test]
    fn test_set_root_pitch_class_at_top_keeps_pitch_class() {
        let mut engine = engine();
        engine.set_root(MAX_ROOT_MIDI);
        engine.set_root_pitch_class(11);
        assert_eq!(engine.settings().root_midi, 95);
        engine.set_root(MIN_ROOT_MIDI);
        engine.set_root_pitch_class(11);
        assert_eq!(engine.settings().root_midi, 35);
    }

    #[test]
    fn test_bpm_clamped() {
        let mut engine = engine();
        engine.set_bpm(1000.0);
        assert_eq!(engine.settings().bpm, MAX_BPM);
        engine.nudge_bpm(-1000.0);
        assert_eq!(engine.settings().bpm, MIN_BPM);
    }

    #[test]
    fn test_voicings() {
        let mut engine = engine();
        engine.set_playback(PlaybackMode::Sustained);
        assert_eq!(engine.voicing(), vec![60, 64, 67]);

        engine.set_playback(PlaybackMode::Bass);
        assert_eq!(engine.voicing(), vec![48, 48, 55, 48]);

        engine.set_playback(PlaybackMode::Arpeggio);
        assert_eq!(engine.voicing().len(), 8);
        assert_eq!(engine.voicing()[3], 72);
    }

    #[test]
    fn test_playback_mode_cycles() {
        assert_eq!(PlaybackMode::Sustained.next(), PlaybackMode::Arpeggio);
        assert_eq!(PlaybackMode::Arpeggio.next(), PlaybackMode::Bass);
        assert_eq!(PlaybackMode::Bass.next(), PlaybackMode::Sustained);
    }

    #[test]
    fn test_bar_phase() {
        let engine = engine();
        assert!((engine.bar_phase(1.0) - 0.5).abs() < 1e-9);
        assert!((engine.bar_phase(3.0) - 0.5).abs() < 1e-9);
    }
}
