//! Finger states, the static gesture table, and debouncing.

use super::landmarks::{HandLandmarks, FINGER_JOINTS, PINKY_MCP, THUMB_IP, THUMB_TIP, WRIST};

/// Which fingers are extended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FingerState {
    pub thumb: bool,
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
}

impl FingerState {
    /// A finger is extended when its tip is farther from the wrist than its
    /// middle joint. The thumb is compared against the pinky base instead,
    /// which is stable when the palm faces the camera.
    pub fn from_landmarks(hand: &HandLandmarks) -> Self {
        let wrist = hand.point(WRIST);
        let extended = |(pip, tip): (usize, usize)| {
            hand.point(tip).distance(wrist) > hand.point(pip).distance(wrist)
        };
        let pinky_base = hand.point(PINKY_MCP);
        let thumb =
            hand.point(THUMB_TIP).distance(pinky_base) > hand.point(THUMB_IP).distance(pinky_base);

        Self {
            thumb,
            index: extended(FINGER_JOINTS[0]),
            middle: extended(FINGER_JOINTS[1]),
            ring: extended(FINGER_JOINTS[2]),
            pinky: extended(FINGER_JOINTS[3]),
        }
    }

    pub fn as_tuple(self) -> (bool, bool, bool, bool, bool) {
        (self.thumb, self.index, self.middle, self.ring, self.pinky)
    }
}

/// Recognized static hand poses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gesture {
    Fist,
    OpenPalm,
    Point,
    Victory,
    Three,
    ThumbsUp,
    Rock,
    Unknown,
}

const T: bool = true;
const F: bool = false;

/// (thumb, index, middle, ring, pinky) -> gesture
const GESTURE_TABLE: &[((bool, bool, bool, bool, bool), Gesture)] = &[
    ((F, F, F, F, F), Gesture::Fist),
    ((T, T, T, T, T), Gesture::OpenPalm),
    ((F, T, T, T, T), Gesture::OpenPalm),
    ((F, T, F, F, F), Gesture::Point),
    ((T, T, F, F, F), Gesture::Point),
    ((F, T, T, F, F), Gesture::Victory),
    ((F, T, T, T, F), Gesture::Three),
    ((T, T, T, F, F), Gesture::Three),
    ((T, F, F, F, F), Gesture::ThumbsUp),
    ((F, T, F, F, T), Gesture::Rock),
    ((T, T, F, F, T), Gesture::Rock),
];

impl Gesture {
    pub fn classify(fingers: FingerState) -> Gesture {
        let key = fingers.as_tuple();
        GESTURE_TABLE
            .iter()
            .find(|(pattern, _)| *pattern == key)
            .map(|&(_, gesture)| gesture)
            .unwrap_or(Gesture::Unknown)
    }

    pub fn from_landmarks(hand: &HandLandmarks) -> Gesture {
        Self::classify(FingerState::from_landmarks(hand))
    }
}

/// Fires a gesture once after it has been seen for `required` consecutive frames.
///
/// The same gesture does not fire again until a different pose (or no hand)
/// is seen in between.
#[derive(Debug)]
pub struct GestureDebouncer {
    required: u32,
    candidate: Gesture,
    count: u32,
    fired: bool,
}

impl GestureDebouncer {
    pub fn new(required: u32) -> Self {
        Self {
            required: required.max(1),
            candidate: Gesture::Unknown,
            count: 0,
            fired: false,
        }
    }

    pub fn update(&mut self, gesture: Gesture) -> Option<Gesture> {
        if gesture == self.candidate {
            self.count = self.count.saturating_add(1);
        } else {
            self.candidate = gesture;
            self.count = 1;
            self.fired = false;
        }

        if !self.fired && gesture != Gesture::Unknown && self.count >= self.required {
            self.fired = true;
            Some(gesture)
        } else {
            None
        }
    }

    /// Hand left the frame
    pub fn reset(&mut self) {
        self.candidate = Gesture::Unknown;
        self.count = 0;
        self.fired = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::landmarks::fixtures::hand;
    use std::collections::HashSet;

    #[test]
    fn test_classify_fixture_hands() {
        let cases = [
            ([false; 5], Gesture::Fist),
            ([true; 5], Gesture::OpenPalm),
            ([false, true, false, false, false], Gesture::Point),
            ([false, true, true, false, false], Gesture::Victory),
            ([false, true, true, true, false], Gesture::Three),
            ([true, false, false, false, false], Gesture::ThumbsUp),
            ([false, true, false, false, true], Gesture::Rock),
            ([false, false, true, false, false], Gesture::Unknown),
        ];
        for (fingers, expected) in cases {
            let landmarks = hand(0.5, 0.5, fingers);
            assert_eq!(Gesture::from_landmarks(&landmarks), expected, "{:?}", fingers);
        }
    }

    #[test]
    fn test_table_has_no_duplicate_patterns() {
        let patterns: HashSet<_> = GESTURE_TABLE.iter().map(|(p, _)| *p).collect();
        assert_eq!(patterns.len(), GESTURE_TABLE.len());
    }

    #[test]
    fn test_debouncer_fires_once_after_stable_frames() {
        let mut debouncer = GestureDebouncer::new(3);
        assert_eq!(debouncer.update(Gesture::Fist), None);
        assert_eq!(debouncer.update(Gesture::Fist), None);
        assert_eq!(debouncer.update(Gesture::Fist), Some(Gesture::Fist));
        assert_eq!(debouncer.update(Gesture::Fist), None);
    }

    #[test]
    fn test_debouncer_flicker_restarts_count() {
        let mut debouncer = GestureDebouncer::new(2);
        assert_eq!(debouncer.update(Gesture::Point), None);
        assert_eq!(debouncer.update(Gesture::Victory), None);
        assert_eq!(debouncer.update(Gesture::Point), None);
        assert_eq!(debouncer.update(Gesture::Point), Some(Gesture::Point));
    }

    #[test]
    fn test_debouncer_never_fires_unknown() {
        let mut debouncer = GestureDebouncer::new(1);
        for _ in 0..5 {
            assert_eq!(debouncer.update(Gesture::Unknown), None);
        }
        debouncer.reset();
        assert_eq!(debouncer.update(Gesture::OpenPalm), Some(Gesture::OpenPalm));
    }
}
