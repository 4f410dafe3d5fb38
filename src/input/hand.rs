//! Hand landmarks -> continuous controls and gesture triggers.

use tracing::debug;

use super::gestures::{Gesture, GestureDebouncer};
use super::landmarks::HandLandmarks;
use crate::audio::EffectKind;
use crate::control::Command;
use crate::params::InputConfig;

/// Command fired by a stable gesture
pub fn gesture_command(gesture: Gesture) -> Option<Command> {
    match gesture {
        Gesture::OpenPalm => Some(Command::Play),
        Gesture::Fist => Some(Command::Pause),
        Gesture::Point => Some(Command::TriggerCue(0)),
        Gesture::Victory => Some(Command::TriggerCue(1)),
        Gesture::Three => Some(Command::TriggerCue(2)),
        Gesture::ThumbsUp => Some(Command::NextShader),
        Gesture::Rock => Some(Command::ToggleEffect(EffectKind::Delay)),
        Gesture::Unknown => None,
    }
}

/// Linear map of palm height to cutoff; the top of the frame is the maximum
pub fn cutoff_for_height(y: f32, (min_hz, max_hz): (f32, f32)) -> f32 {
    let t = 1.0 - y.clamp(0.0, 1.0);
    min_hz + t * (max_hz - min_hz)
}

pub struct HandMapper {
    cutoff_range_hz: (f32, f32),
    debouncer: GestureDebouncer,
}

impl HandMapper {
    pub fn new(config: &InputConfig) -> Self {
        Self {
            cutoff_range_hz: config.cutoff_range_hz,
            debouncer: GestureDebouncer::new(config.gesture_stable_frames),
        }
    }

    /// Commands for one tracked frame: cutoff and crossfader every frame,
    /// plus a trigger when a gesture settles
    pub fn update(&mut self, hand: &HandLandmarks) -> Vec<Command> {
        let palm = hand.palm_center();
        let mut commands = vec![
            Command::SetFilterCutoff(cutoff_for_height(palm.y, self.cutoff_range_hz)),
            Command::SetCrossfader(palm.x.clamp(0.0, 1.0)),
        ];

        let gesture = Gesture::from_landmarks(hand);
        if let Some(fired) = self.debouncer.update(gesture) {
            debug!("Gesture: {:?}", fired);
            commands.extend(gesture_command(fired));
        }
        commands
    }

    pub fn hand_lost(&mut self) {
        self.debouncer.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::landmarks::fixtures::hand;
    use proptest::prelude::*;

    #[test]
    fn test_cutoff_top_is_max() {
        let range = (200.0, 12000.0);
        assert_eq!(cutoff_for_height(0.0, range), 12000.0);
        assert_eq!(cutoff_for_height(1.0, range), 200.0);
        assert_eq!(cutoff_for_height(0.5, range), 6100.0);
    }

    #[test]
    fn test_mapper_emits_controls_then_trigger() {
        let config = InputConfig {
            gesture_stable_frames: 2,
            ..Default::default()
        };
        let mut mapper = HandMapper::new(&config);
        let fist = hand(0.25, 0.3, [false; 5]);

        let first = mapper.update(&fist);
        assert_eq!(first.len(), 2);
        assert!(matches!(first[1], Command::SetCrossfader(x) if (x - 0.25).abs() < 1e-5));

        let second = mapper.update(&fist);
        assert_eq!(second.last(), Some(&Command::Pause));

        // Held pose does not repeat
        assert_eq!(mapper.update(&fist).len(), 2);

        // Losing the hand re-arms the same gesture
        mapper.hand_lost();
        mapper.update(&fist);
        assert_eq!(mapper.update(&fist).last(), Some(&Command::Pause));
    }

    #[test]
    fn test_gesture_commands() {
        assert_eq!(gesture_command(Gesture::OpenPalm), Some(Command::Play));
        assert_eq!(gesture_command(Gesture::Three), Some(Command::TriggerCue(2)));
        assert_eq!(gesture_command(Gesture::Unknown), None);
    }

    proptest! {
        #[test]
        fn test_cutoff_stays_in_range(y in -2.0f32..3.0) {
            let hz = cutoff_for_height(y, (200.0, 12000.0));
            prop_assert!((200.0..=12000.0).contains(&hz));
        }
    }
}
