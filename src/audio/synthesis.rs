//! Glicol patch generation.
//!
//! The music engine's voicing (layer A) and the percussion pattern (layer B)
//! are rendered as glicol code, crossfaded, and routed through the effect
//! rack. The resulting program is hot-swapped into the running engine.

use std::f32::consts::FRAC_PI_2;
use std::fmt::Write;

use super::effects::EffectRack;
use crate::music::{midi_to_hz, DrumPattern, DrumVoice, MusicEngine, PlaybackMode};

/// Equal-power gains for layer A and B at crossfader position `x` in [0, 1]
pub fn crossfade_gains(x: f32) -> (f32, f32) {
    let x = x.clamp(0.0, 1.0);
    ((x * FRAC_PI_2).cos().max(0.0), (x * FRAC_PI_2).sin().max(0.0))
}

/// Everything a patch is rendered from
pub struct PatchInputs<'a> {
    pub music: &'a MusicEngine,
    pub drums: &'a DrumPattern,
    pub effects: &'a EffectRack,
    pub crossfader: f32,
}

/// Render the complete glicol program
pub fn render_patch(inputs: &PatchInputs<'_>) -> String {
    let mut code = String::new();
    let speed = inputs.music.settings().glicol_speed();

    render_harmony(inputs.music, speed, &mut code);
    render_drums(inputs.drums, speed, &mut code);

    let (gain_a, gain_b) = crossfade_gains(inputs.crossfader);
    let _ = writeln!(code, "~mix_a: ~layer_a >> mul {:.3}", gain_a);
    let _ = writeln!(code, "~mix_b: ~layer_b >> mul {:.3}", gain_b);
    let _ = writeln!(code, "~bus: mix ~mix_a ~mix_b");

    let last = inputs.effects.render_chain("~bus", &mut code);
    let _ = writeln!(code, "o: {} >> mul 0.8", last);
    code
}

/// Layer A: the current chord in the selected playback mode
fn render_harmony(music: &MusicEngine, speed: f32, code: &mut String) {
    let notes = music.voicing();
    match music.settings().playback {
        PlaybackMode::Sustained => {
            let mut refs = Vec::with_capacity(notes.len());
            for (i, &note) in notes.iter().enumerate() {
                let _ = writeln!(code, "~pad{}: saw {:.2} >> mul 0.06", i, midi_to_hz(note));
                refs.push(format!("~pad{}", i));
            }
            let _ = writeln!(code, "~layer_a: mix {} >> lpf 2400.0 1.0", refs.join(" "));
        }
        PlaybackMode::Arpeggio => {
            let _ = writeln!(code, "~arp_gate: speed {:.3} >> seq {}", speed, seq_notes(&notes));
            let _ = writeln!(code, "~arp_amp: ~arp_gate >> envperc 0.005 0.2");
            let _ = writeln!(code, "~arp_pit: ~arp_gate >> mul 261.63");
            let _ = writeln!(
                code,
                "~layer_a: saw ~arp_pit >> mul ~arp_amp >> lpf 3000.0 2.0 >> mul 0.2"
            );
        }
        PlaybackMode::Bass => {
            let _ = writeln!(code, "~bass_gate: speed {:.3} >> seq {}", speed, seq_notes(&notes));
            let _ = writeln!(code, "~bass_amp: ~bass_gate >> envperc 0.01 0.35");
            let _ = writeln!(code, "~bass_pit: ~bass_gate >> mul 261.63");
            let _ = writeln!(
                code,
                "~layer_a: squ ~bass_pit >> mul ~bass_amp >> lpf 600.0 2.0 >> mul 0.25"
            );
        }
    }
}

/// Layer B: kick (sine), snare (low-passed noise), hat (high-passed noise)
fn render_drums(pattern: &DrumPattern, speed: f32, code: &mut String) {
    let mut voices = Vec::new();

    for voice in DrumVoice::ALL {
        let Some(args) = pattern.seq_args(voice) else {
            continue;
        };
        let name = voice.name();
        let _ = writeln!(code, "~{}_gate: speed {:.3} >> seq {}", name, speed, args);
        let (decay, source) = match voice {
            DrumVoice::Kick => (0.25, "sin 55.0".to_string()),
            DrumVoice::Snare => (0.12, "noise 7 >> lpf 3000.0 1.0".to_string()),
            DrumVoice::HiHat => (0.04, "noise 42 >> hpf 8000.0 1.0".to_string()),
        };
        let _ = writeln!(code, "~{}_env: ~{}_gate >> envperc 0.001 {:.3}", name, name, decay);
        let _ = writeln!(code, "~{}: {} >> mul ~{}_env", name, source, name);
        voices.push(format!("~{}", name));
    }

    if voices.is_empty() {
        let _ = writeln!(code, "~layer_b: sin 0.0 >> mul 0.0");
    } else {
        let _ = writeln!(code, "~layer_b: mix {} >> mul 0.5", voices.join(" "));
    }
}

/// Space-separated MIDI notes for a glicol `seq`
fn seq_notes(notes: &[u8]) -> String {
    notes
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::music::Mode;
    use crate::params::MusicSettings;

    fn engine(playback: PlaybackMode) -> MusicEngine {
        MusicEngine::new(MusicSettings {
            root_midi: 60,
            mode: Mode::Ionian,
            bpm: 120.0,
            playback,
            ..Default::default()
        })
    }

    fn render(music: &MusicEngine, drums: &DrumPattern, crossfader: f32) -> String {
        let effects = EffectRack::default();
        render_patch(&PatchInputs {
            music,
            drums,
            effects: &effects,
            crossfader,
        })
    }

    #[test]
    fn test_crossfade_equal_power() {
        let (a, b) = crossfade_gains(0.0);
        assert!((a - 1.0).abs() < 1e-6 && b.abs() < 1e-6);
        let (a, b) = crossfade_gains(1.0);
        assert!(a.abs() < 1e-6 && (b - 1.0).abs() < 1e-6);
        let (a, b) = crossfade_gains(0.5);
        assert!((a * a + b * b - 1.0).abs() < 1e-5);
        assert_eq!(crossfade_gains(4.0), crossfade_gains(1.0));
    }

    #[test]
    fn test_sustained_patch_has_one_oscillator_per_note() {
        let music = engine(PlaybackMode::Sustained);
        let code = render(&music, &DrumPattern::default(), 0.0);
        assert!(code.contains("~pad0: saw 261.63"));
        assert!(code.contains("~pad2: saw 392.00"));
        assert!(code.contains("~layer_a: mix ~pad0 ~pad1 ~pad2"));
        assert!(code.contains("~mix_a: ~layer_a >> mul 1.000"));
        assert!(code.contains("~mix_b: ~layer_b >> mul 0.000"));
    }

    #[test]
    fn test_arpeggio_patch_sequences_voicing() {
        let music = engine(PlaybackMode::Arpeggio);
        let code = render(&music, &DrumPattern::default(), 0.5);
        assert!(code.contains("~arp_gate: speed 1.000 >> seq 60 64 67 72 76 79 72 67"));
    }

    #[test]
    fn test_bass_patch() {
        let music = engine(PlaybackMode::Bass);
        let code = render(&music, &DrumPattern::default(), 0.5);
        assert!(code.contains("~bass_gate: speed 1.000 >> seq 48 48 55 48"));
        assert!(code.contains("squ ~bass_pit"));
    }

    #[test]
    fn test_empty_drum_pattern_is_silent_layer() {
        let music = engine(PlaybackMode::Sustained);
        let code = render(&music, &DrumPattern::empty(), 1.0);
        assert!(code.contains("~layer_b: sin 0.0 >> mul 0.0"));
        assert!(!code.contains("~kick_gate"));
    }

    #[test]
    fn test_output_line_terminates_chain() {
        let music = engine(PlaybackMode::Sustained);
        let code = render(&music, &DrumPattern::default(), 0.5);
        // Default rack: filter + reverb enabled
        assert!(code.trim_end().ends_with("o: ~fx_reverb >> mul 0.8"));
        assert_eq!(code.matches("\no: ").count() + code.starts_with("o: ") as usize, 1);
    }
}
