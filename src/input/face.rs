//! Face landmarks -> reverb mix and hue shift.

use super::landmarks::FaceLandmarks;
use crate::control::Command;
use crate::params::InputConfig;

/// Mouth openness treated as fully open
const MAX_OPENNESS: f32 = 0.6;

pub struct FaceMapper {
    reverb_range: (f32, f32),
    max_roll_rad: f32,
}

impl FaceMapper {
    pub fn new(config: &InputConfig) -> Self {
        Self {
            reverb_range: config.reverb_range,
            max_roll_rad: config.max_roll_rad,
        }
    }

    pub fn reverb_mix(&self, face: &FaceLandmarks) -> f32 {
        let t = (face.mouth_openness() / MAX_OPENNESS).clamp(0.0, 1.0);
        let (lo, hi) = self.reverb_range;
        lo + t * (hi - lo)
    }

    /// Hue shift in turns (-0.5..0.5)
    pub fn hue_shift(&self, face: &FaceLandmarks) -> f32 {
        (face.roll() / self.max_roll_rad).clamp(-1.0, 1.0) * 0.5
    }

    pub fn update(&self, face: &FaceLandmarks) -> Vec<Command> {
        vec![
            Command::SetReverbMix(self.reverb_mix(face)),
            Command::SetHueShift(self.hue_shift(face)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::landmarks::fixtures::face;

    #[test]
    fn test_reverb_follows_mouth() {
        let mapper = FaceMapper::new(&InputConfig::default());
        assert_eq!(mapper.reverb_mix(&face(0.0, 0.0)), 0.0);
        assert!((mapper.reverb_mix(&face(0.3, 0.0)) - 0.4).abs() < 1e-4);
        assert!((mapper.reverb_mix(&face(2.0, 0.0)) - 0.8).abs() < 1e-5);
    }

    #[test]
    fn test_hue_follows_roll() {
        let mapper = FaceMapper::new(&InputConfig::default());
        assert!(mapper.hue_shift(&face(0.0, 0.0)).abs() < 1e-5);
        assert!((mapper.hue_shift(&face(0.0, 0.3)) - 0.25).abs() < 1e-4);
        assert!((mapper.hue_shift(&face(0.0, -1.2)) + 0.5).abs() < 1e-5);
    }
}
