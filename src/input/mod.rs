//! Alternative inputs: landmarks, gestures, voice, and microphone beatboxing.
//!
//! Listener threads (OSC, console) send `InputEvent`s over a channel; the
//! render loop drains it and maps events to `Command`s.

mod beatbox;
pub mod console;
mod face;
mod gestures;
mod hand;
pub mod landmarks;
mod osc;
mod speech;

pub use beatbox::{BeatDetector, BeatHit, BeatRecorder, PitchDetector, PitchEstimate, PitchHold};
pub use face::FaceMapper;
pub use gestures::{FingerState, Gesture, GestureDebouncer};
pub use hand::HandMapper;
pub use landmarks::{FaceLandmarks, HandLandmarks};
pub use osc::OscListener;
pub use speech::CommandDispatcher;

/// Event from an input listener thread
#[derive(Debug, Clone)]
pub enum InputEvent {
    Hand(HandLandmarks),
    /// Tracker reports no hand in frame
    HandLost,
    Face(FaceLandmarks),
    /// Transcribed speech or a typed console line
    Utterance(String),
}
