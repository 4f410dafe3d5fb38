//! Alternative input parameters (landmarks, voice, console).

use serde::Deserialize;

/// Input listener and mapping configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Listen for landmark and speech messages over OSC
    pub osc_enabled: bool,

    /// UDP port for the OSC listener
    pub osc_port: u16,

    /// Delay before rebinding after a socket error (ms)
    pub osc_restart_delay_ms: u64,

    /// Read utterances from stdin
    pub console: bool,

    /// Frames a gesture must hold before it fires
    pub gesture_stable_frames: u32,

    /// Filter cutoff reached with the palm at the bottom/top of the frame (Hz)
    pub cutoff_range_hz: (f32, f32),

    /// Reverb mix for a closed/fully open mouth
    pub reverb_range: (f32, f32),

    /// Head roll (radians) that maps to a full hue rotation either way
    pub max_roll_rad: f32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            osc_enabled: true,
            osc_port: 9000,
            osc_restart_delay_ms: 1000,
            console: true,
            gesture_stable_frames: 5,
            cutoff_range_hz: (200.0, 12000.0),
            reverb_range: (0.0, 0.8),
            max_roll_rad: 0.6,
        }
    }
}

impl InputConfig {
    pub fn validate(&self) -> Result<(), String> {
        let (lo, hi) = self.cutoff_range_hz;
        if !(20.0..=20000.0).contains(&lo) || !(20.0..=20000.0).contains(&hi) || lo >= hi {
            return Err(format!("cutoff_range_hz {:?} must be ascending within 20-20000", self.cutoff_range_hz));
        }
        let (lo, hi) = self.reverb_range;
        if !(0.0..=1.0).contains(&lo) || !(0.0..=1.0).contains(&hi) || lo > hi {
            return Err(format!("reverb_range {:?} must be ascending within 0-1", self.reverb_range));
        }
        if self.gesture_stable_frames == 0 {
            return Err("gesture_stable_frames must be at least 1".to_string());
        }
        if self.max_roll_rad <= 0.0 {
            return Err("max_roll_rad must be positive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(InputConfig::default().validate().is_ok());
    }

    #[test]
    fn test_inverted_cutoff_rejected() {
        let config = InputConfig {
            cutoff_range_hz: (5000.0, 100.0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
