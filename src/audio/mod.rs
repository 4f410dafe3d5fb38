//! Audio synthesis, effects, and FFT analysis.
//!
//! Glicol renders the generated patch to the output device; the render loop
//! analyzes what was played to extract frequency bands for the visuals.

mod analysis;
pub mod effects;
mod mic;
pub mod synthesis;
mod system;

// Re-export public types
pub use analysis::{hann_window, AudioBands, BandAnalyzer, Waveform};
pub use effects::{EffectKind, EffectRack, FilterKind, OutputStage};
pub use mic::MicInput;
pub use synthesis::{crossfade_gains, render_patch, PatchInputs};
pub use system::AudioSystem;
