//! Parameter definitions with physical units and documented semantics.
//!
//! All magic numbers are extracted here with:
//! - Physical units (Hz, seconds, BPM, etc.)
//! - Documented ranges and meanings
//! - Serde defaults so a partial TOML file is enough

mod audio;
mod input;
mod music;
mod render;

// Re-export all types
pub use audio::{audio_constants, FFTConfig, MicConfig};
pub use input::InputConfig;
pub use music::{MusicSettings, MAX_BPM, MAX_ROOT_MIDI, MIN_BPM, MIN_ROOT_MIDI};
pub use render::{RecordingConfig, RenderConfig};
