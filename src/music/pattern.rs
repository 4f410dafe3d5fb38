//! Sixteen-step percussion pattern for the rhythm layer.

/// Steps per bar
pub const STEPS: usize = 16;

/// Percussion voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrumVoice {
    Kick,
    Snare,
    HiHat,
}

impl DrumVoice {
    pub const ALL: [DrumVoice; 3] = [DrumVoice::Kick, DrumVoice::Snare, DrumVoice::HiHat];

    pub fn name(self) -> &'static str {
        match self {
            DrumVoice::Kick => "kick",
            DrumVoice::Snare => "snare",
            DrumVoice::HiHat => "hat",
        }
    }
}

/// One bar of on/off steps per voice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrumPattern {
    pub kick: [bool; STEPS],
    pub snare: [bool; STEPS],
    pub hihat: [bool; STEPS],
}

impl Default for DrumPattern {
    /// Four-on-the-floor kick, backbeat snare, eighth-note hats
    fn default() -> Self {
        let mut pattern = Self::empty();
        for step in 0..STEPS {
            pattern.kick[step] = step % 4 == 0;
            pattern.snare[step] = step == 4 || step == 12;
            pattern.hihat[step] = step % 2 == 0;
        }
        pattern
    }
}

impl DrumPattern {
    pub fn empty() -> Self {
        Self {
            kick: [false; STEPS],
            snare: [false; STEPS],
            hihat: [false; STEPS],
        }
    }

    pub fn steps(&self, voice: DrumVoice) -> &[bool; STEPS] {
        match voice {
            DrumVoice::Kick => &self.kick,
            DrumVoice::Snare => &self.snare,
            DrumVoice::HiHat => &self.hihat,
        }
    }

    pub fn set(&mut self, voice: DrumVoice, step: usize, on: bool) {
        let steps = match voice {
            DrumVoice::Kick => &mut self.kick,
            DrumVoice::Snare => &mut self.snare,
            DrumVoice::HiHat => &mut self.hihat,
        };
        steps[step % STEPS] = on;
    }

    pub fn is_empty(&self) -> bool {
        DrumVoice::ALL
            .iter()
            .all(|&v| self.steps(v).iter().all(|&on| !on))
    }

    /// Glicol `seq` arguments for one voice: "60" for a hit, "_" for a rest
    pub fn seq_args(&self, voice: DrumVoice) -> Option<String> {
        let steps = self.steps(voice);
        if !steps.iter().any(|&on| on) {
            return None;
        }
        let args: Vec<&str> = steps.iter().map(|&on| if on { "60" } else { "_" }).collect();
        Some(args.join(" "))
    }
}
