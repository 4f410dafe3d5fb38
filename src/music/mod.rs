//! Generative music: modal harmony, chord progressions, and playback voicing.
//!
//! The engine only decides *what* to play. Sound is produced by the glicol
//! patch rendered in `audio::synthesis`.

mod engine;
mod pattern;
mod progression;
pub mod theory;

pub use engine::{MusicEngine, PlaybackMode};
pub use pattern::{DrumPattern, DrumVoice, STEPS};
pub use progression::Progression;
pub use theory::{chord_quality, midi_to_hz, triad, Chord, ChordQuality, Mode};
