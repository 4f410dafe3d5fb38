//! Voice command dispatcher.
//!
//! Utterances are normalized (lowercase, punctuation stripped) and matched
//! first against parameterized forms ("tempo 120", "key of e flat") and then
//! against a static phrase table. The longest phrase found on word
//! boundaries wins.

use crate::audio::{EffectKind, FilterKind};
use crate::control::{Command, CUE_SLOTS};
use crate::music::{theory::parse_pitch_class, Mode, PlaybackMode};

/// Static phrase table
const PHRASES: &[(&str, Command)] = &[
    // Transport
    ("play", Command::Play),
    ("start", Command::Play),
    ("resume", Command::Play),
    ("go", Command::Play),
    ("start music", Command::Play),
    ("play music", Command::Play),
    ("drop it", Command::Play),
    ("pause", Command::Pause),
    ("stop", Command::Pause),
    ("hold on", Command::Pause),
    ("stop music", Command::Pause),
    ("pause music", Command::Pause),
    ("quiet", Command::Pause),
    ("silence", Command::Pause),
    ("toggle", Command::TogglePlay),
    ("play pause", Command::TogglePlay),
    // Gallery
    ("next", Command::NextShader),
    ("next shader", Command::NextShader),
    ("next visual", Command::NextShader),
    ("next scene", Command::NextShader),
    ("skip", Command::NextShader),
    ("forward", Command::NextShader),
    ("previous", Command::PreviousShader),
    ("previous shader", Command::PreviousShader),
    ("previous visual", Command::PreviousShader),
    ("back", Command::PreviousShader),
    ("go back", Command::PreviousShader),
    ("random", Command::RandomShader),
    ("random shader", Command::RandomShader),
    ("shuffle", Command::RandomShader),
    ("surprise me", Command::RandomShader),
    // Tempo
    ("faster", Command::NudgeTempo(5.0)),
    ("speed up", Command::NudgeTempo(5.0)),
    ("tempo up", Command::NudgeTempo(5.0)),
    ("much faster", Command::NudgeTempo(20.0)),
    ("slower", Command::NudgeTempo(-5.0)),
    ("slow down", Command::NudgeTempo(-5.0)),
    ("tempo down", Command::NudgeTempo(-5.0)),
    ("much slower", Command::NudgeTempo(-20.0)),
    ("half time", Command::SetTempo(60.0)),
    ("double time", Command::SetTempo(180.0)),
    // Modes
    ("major", Command::SetMode(Mode::Ionian)),
    ("minor", Command::SetMode(Mode::Aeolian)),
    ("happy", Command::SetMode(Mode::Ionian)),
    ("sad", Command::SetMode(Mode::Aeolian)),
    ("dark", Command::SetMode(Mode::Phrygian)),
    ("dreamy", Command::SetMode(Mode::Lydian)),
    ("spooky", Command::SetMode(Mode::Locrian)),
    ("ionian", Command::SetMode(Mode::Ionian)),
    ("dorian", Command::SetMode(Mode::Dorian)),
    ("phrygian", Command::SetMode(Mode::Phrygian)),
    ("lydian", Command::SetMode(Mode::Lydian)),
    ("mixolydian", Command::SetMode(Mode::Mixolydian)),
    ("aeolian", Command::SetMode(Mode::Aeolian)),
    ("locrian", Command::SetMode(Mode::Locrian)),
    ("next mode", Command::NextMode),
    ("change mode", Command::NextMode),
    ("switch mode", Command::NextMode),
    // Playback
    ("sustain", Command::SetPlayback(PlaybackMode::Sustained)),
    ("sustained", Command::SetPlayback(PlaybackMode::Sustained)),
    ("pads", Command::SetPlayback(PlaybackMode::Sustained)),
    ("chords", Command::SetPlayback(PlaybackMode::Sustained)),
    ("arpeggio", Command::SetPlayback(PlaybackMode::Arpeggio)),
    ("arpeggiate", Command::SetPlayback(PlaybackMode::Arpeggio)),
    ("arp", Command::SetPlayback(PlaybackMode::Arpeggio)),
    ("bass", Command::SetPlayback(PlaybackMode::Bass)),
    ("bass line", Command::SetPlayback(PlaybackMode::Bass)),
    ("bassline", Command::SetPlayback(PlaybackMode::Bass)),
    ("next pattern", Command::NextPlayback),
    ("change pattern", Command::NextPlayback),
    ("from the top", Command::RestartPhrase),
    ("restart", Command::RestartPhrase),
    // Effects
    ("filter", Command::ToggleEffect(EffectKind::Filter)),
    ("delay", Command::ToggleEffect(EffectKind::Delay)),
    ("echo", Command::ToggleEffect(EffectKind::Delay)),
    ("reverb", Command::ToggleEffect(EffectKind::Reverb)),
    ("space", Command::ToggleEffect(EffectKind::Reverb)),
    ("phaser", Command::ToggleEffect(EffectKind::Phaser)),
    ("phase", Command::ToggleEffect(EffectKind::Phaser)),
    ("chorus", Command::ToggleEffect(EffectKind::Chorus)),
    ("bitcrush", Command::ToggleEffect(EffectKind::Bitcrush)),
    ("bit crush", Command::ToggleEffect(EffectKind::Bitcrush)),
    ("crush", Command::ToggleEffect(EffectKind::Bitcrush)),
    ("lo fi", Command::ToggleEffect(EffectKind::Bitcrush)),
    ("lofi", Command::ToggleEffect(EffectKind::Bitcrush)),
    ("gate", Command::ToggleEffect(EffectKind::Gate)),
    ("stutter", Command::ToggleEffect(EffectKind::Gate)),
    ("delay on", Command::SetEffect(EffectKind::Delay, true)),
    ("delay off", Command::SetEffect(EffectKind::Delay, false)),
    ("reverb on", Command::SetEffect(EffectKind::Reverb, true)),
    ("reverb off", Command::SetEffect(EffectKind::Reverb, false)),
    ("filter on", Command::SetEffect(EffectKind::Filter, true)),
    ("filter off", Command::SetEffect(EffectKind::Filter, false)),
    ("effects off", Command::AllEffectsOff),
    ("dry", Command::AllEffectsOff),
    ("clean", Command::AllEffectsOff),
    ("low pass", Command::SetFilterKind(FilterKind::Lowpass)),
    ("lowpass", Command::SetFilterKind(FilterKind::Lowpass)),
    ("high pass", Command::SetFilterKind(FilterKind::Highpass)),
    ("highpass", Command::SetFilterKind(FilterKind::Highpass)),
    ("open filter", Command::SetFilterCutoff(12000.0)),
    ("open up", Command::SetFilterCutoff(12000.0)),
    ("close filter", Command::SetFilterCutoff(400.0)),
    ("muffle", Command::SetFilterCutoff(400.0)),
    ("layer a", Command::SetCrossfader(0.0)),
    ("melody only", Command::SetCrossfader(0.0)),
    ("layer b", Command::SetCrossfader(1.0)),
    ("drums only", Command::SetCrossfader(1.0)),
    ("center", Command::SetCrossfader(0.5)),
    ("crossfade center", Command::SetCrossfader(0.5)),
    ("both layers", Command::SetCrossfader(0.5)),
    // Color
    ("brighter", Command::NudgeBrightness(0.1)),
    ("lighter", Command::NudgeBrightness(0.1)),
    ("darker", Command::NudgeBrightness(-0.1)),
    ("dimmer", Command::NudgeBrightness(-0.1)),
    ("more color", Command::NudgeSaturation(0.2)),
    ("more saturation", Command::NudgeSaturation(0.2)),
    ("saturate", Command::NudgeSaturation(0.2)),
    ("less color", Command::NudgeSaturation(-0.2)),
    ("less saturation", Command::NudgeSaturation(-0.2)),
    ("desaturate", Command::NudgeSaturation(-0.2)),
    ("more contrast", Command::NudgeContrast(0.1)),
    ("less contrast", Command::NudgeContrast(-0.1)),
    ("shift colors", Command::NudgeHue(0.1)),
    ("shift hue", Command::NudgeHue(0.1)),
    ("change color", Command::NudgeHue(0.1)),
    ("rotate colors", Command::NudgeHue(0.1)),
    ("reset color", Command::ResetColor),
    ("reset colors", Command::ResetColor),
    ("normal colors", Command::ResetColor),
    // Cues
    ("clear cues", Command::ClearCues),
    ("forget cues", Command::ClearCues),
    // Beatbox
    ("record beat", Command::RecordBeat),
    ("record beatbox", Command::RecordBeat),
    ("beatbox", Command::RecordBeat),
    ("clear beat", Command::ClearBeat),
    ("no drums", Command::ClearBeat),
    ("drums off", Command::ClearBeat),
    ("default beat", Command::DefaultBeat),
    ("reset beat", Command::DefaultBeat),
    ("drums on", Command::DefaultBeat),
    // Help
    ("help", Command::Help),
    ("what can i say", Command::Help),
    ("commands", Command::Help),
];

/// Lowercase, drop punctuation (keeping `#` for sharps), collapse whitespace
pub fn normalize(utterance: &str) -> String {
    utterance
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '#' || c == '♯' || c == '♭' {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a small number given as digits or words ("120", "one", "twenty five")
pub fn parse_number(words: &[&str]) -> Option<u32> {
    let first = *words.first()?;
    if let Ok(n) = first.parse::<u32>() {
        return Some(n);
    }

    const ONES: [&str; 20] = [
        "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
        "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen",
        "eighteen", "nineteen",
    ];
    const TENS: [&str; 8] = [
        "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
    ];
    let ones = |w: &str| ONES.iter().position(|&o| o == w).map(|n| n as u32);
    let tens = |w: &str| TENS.iter().position(|&t| t == w).map(|n| n as u32 * 10 + 20);

    let mut total = 0;
    let mut rest = words;
    if rest.first() == Some(&"hundred") {
        return None;
    }
    if rest.len() >= 2 && rest[1] == "hundred" {
        total += ones(rest[0])? * 100;
        rest = &rest[2..];
        if rest.first() == Some(&"and") {
            rest = &rest[1..];
        }
        if rest.is_empty() {
            return Some(total);
        }
    }
    // Spoken tempos: "one twenty" = 120
    if rest.len() >= 2 && total == 0 {
        if let (Some(h), Some(t)) = (ones(rest[0]), tens(rest[1])) {
            if (1..=2).contains(&h) {
                let unit = rest.get(2).and_then(|&w| ones(w)).filter(|&u| u < 10).unwrap_or(0);
                return Some(h * 100 + t + unit);
            }
        }
    }
    if let Some(t) = rest.first().and_then(|&w| tens(w)) {
        let unit = rest.get(1).and_then(|&w| ones(w)).filter(|&u| (1..10).contains(&u)).unwrap_or(0);
        return Some(total + t + unit);
    }
    rest.first().and_then(|&w| ones(w)).map(|n| total + n)
}

/// Maps utterances to commands
pub struct CommandDispatcher {
    /// Normalized gallery names, by index
    shader_names: Vec<String>,
}

impl CommandDispatcher {
    pub fn new<'a>(shader_names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            shader_names: shader_names.into_iter().map(normalize).collect(),
        }
    }

    /// Commands recognized in an utterance (empty if nothing matched)
    pub fn dispatch(&self, utterance: &str) -> Vec<Command> {
        let text = normalize(utterance);
        if text.is_empty() {
            return Vec::new();
        }
        let words: Vec<&str> = text.split(' ').collect();

        if let Some(commands) = self.parse_parameterized(&words) {
            return commands;
        }
        longest_phrase(&text).into_iter().collect()
    }

    fn parse_parameterized(&self, words: &[&str]) -> Option<Vec<Command>> {
        for (i, &word) in words.iter().enumerate() {
            let rest = &words[i + 1..];
            let parsed = match word {
                "mode" => rest.first().and_then(|w| Mode::parse(w)).map(|m| vec![Command::SetMode(m)]),
                "key" => parse_key(rest),
                "tempo" | "bpm" => parse_tempo(rest),
                "cue" => parse_cue(rest).map(|slot| {
                    let store = i > 0 && matches!(words[i - 1], "save" | "store" | "set");
                    vec![if store { Command::StoreCue(slot) } else { Command::TriggerCue(slot) }]
                }),
                "shader" | "show" | "visual" => self.parse_shader(rest),
                _ => None,
            };
            if parsed.is_some() {
                return parsed;
            }
        }

        // "<n> bpm"
        if let Some(pos) = words.iter().position(|&w| w == "bpm") {
            if pos > 0 {
                if let Some(bpm) = parse_number(&words[pos - 1..pos]) {
                    return Some(vec![Command::SetTempo(bpm as f32)]);
                }
            }
        }

        // "<mode> mode" (e.g. "dorian mode")
        if let Some(pos) = words.iter().position(|&w| w == "mode") {
            if pos > 0 {
                if let Some(mode) = Mode::parse(words[pos - 1]) {
                    return Some(vec![Command::SetMode(mode)]);
                }
            }
        }
        None
    }

    fn parse_shader(&self, rest: &[&str]) -> Option<Vec<Command>> {
        if rest.is_empty() {
            return None;
        }
        let wanted = rest.join(" ");
        self.shader_names
            .iter()
            .position(|name| *name == wanted)
            .or_else(|| self.shader_names.iter().position(|name| name.starts_with(&wanted)))
            .map(|index| vec![Command::SelectShader(index)])
    }
}

/// "key of e flat minor", "key d", "key f#"
fn parse_key(rest: &[&str]) -> Option<Vec<Command>> {
    let rest = match rest.first() {
        Some(&"of") | Some(&"to") => &rest[1..],
        _ => rest,
    };
    let letter = *rest.first()?;

    // Two-word spelling first ("e flat"), then one word ("eb", "f#")
    let (pitch, used) = match rest.get(1) {
        Some(accidental) => match parse_pitch_class(&format!("{} {}", letter, accidental)) {
            Some(pc) if matches!(*accidental, "sharp" | "flat" | "natural") => (pc, 2),
            _ => (parse_pitch_class(letter)?, 1),
        },
        None => (parse_pitch_class(letter)?, 1),
    };

    let mut commands = vec![Command::SetRootPitch(pitch)];
    if let Some(mode) = rest.get(used).and_then(|w| Mode::parse(w)) {
        commands.push(Command::SetMode(mode));
    }
    Some(commands)
}

fn parse_tempo(rest: &[&str]) -> Option<Vec<Command>> {
    let rest = match rest.first() {
        Some(&"to") | Some(&"of") => &rest[1..],
        _ => rest,
    };
    match rest.first() {
        Some(&"up") => Some(vec![Command::NudgeTempo(5.0)]),
        Some(&"down") => Some(vec![Command::NudgeTempo(-5.0)]),
        _ => parse_number(rest).map(|bpm| vec![Command::SetTempo(bpm as f32)]),
    }
}

/// One-based cue number -> zero-based slot
fn parse_cue(rest: &[&str]) -> Option<usize> {
    let n = parse_number(rest)? as usize;
    (1..=CUE_SLOTS).contains(&n).then(|| n - 1)
}

/// Longest table phrase contained in `text` on word boundaries
fn longest_phrase(text: &str) -> Option<Command> {
    let padded = format!(" {} ", text);
    PHRASES
        .iter()
        .filter(|(phrase, _)| padded.contains(&format!(" {} ", phrase)))
        .fold(None, |best: Option<&(&str, Command)>, entry| match best {
            Some(b) if b.0.len() >= entry.0.len() => Some(b),
            _ => Some(entry),
        })
        .map(|&(_, command)| command)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatcher() -> CommandDispatcher {
        CommandDispatcher::new(["Plasma", "Tunnel", "Star Field"])
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Next,   SHADER!! "), "next shader");
        assert_eq!(normalize("Key of F#"), "key of f#");
    }

    #[test]
    fn test_simple_phrases() {
        let d = dispatcher();
        assert_eq!(d.dispatch("play"), vec![Command::Play]);
        assert_eq!(d.dispatch("Please pause."), vec![Command::Pause]);
        assert_eq!(d.dispatch("make it brighter"), vec![Command::NudgeBrightness(0.1)]);
        assert!(d.dispatch("banana").is_empty());
        assert!(d.dispatch("").is_empty());
    }

    #[test]
    fn test_longest_phrase_wins() {
        let d = dispatcher();
        // "next" and "next mode" both match
        assert_eq!(d.dispatch("next mode"), vec![Command::NextMode]);
        assert_eq!(d.dispatch("go back"), vec![Command::PreviousShader]);
        assert_eq!(d.dispatch("delay off"), vec![Command::SetEffect(EffectKind::Delay, false)]);
    }

    #[test]
    fn test_word_boundaries() {
        let d = dispatcher();
        // "playful" must not match "play", "arpeggios" must not match "arp"
        assert!(d.dispatch("playful").is_empty());
        assert!(d.dispatch("arpeggios").is_empty());
    }

    #[test]
    fn test_mode_commands() {
        let d = dispatcher();
        assert_eq!(d.dispatch("mode dorian"), vec![Command::SetMode(Mode::Dorian)]);
        assert_eq!(d.dispatch("switch to lydian mode"), vec![Command::SetMode(Mode::Lydian)]);
        assert_eq!(d.dispatch("mode minor"), vec![Command::SetMode(Mode::Aeolian)]);
    }

    #[test]
    fn test_key_commands() {
        let d = dispatcher();
        assert_eq!(d.dispatch("key of e flat"), vec![Command::SetRootPitch(3)]);
        assert_eq!(d.dispatch("key of F#"), vec![Command::SetRootPitch(6)]);
        assert_eq!(
            d.dispatch("change key to d minor"),
            vec![Command::SetRootPitch(2), Command::SetMode(Mode::Aeolian)]
        );
        assert_eq!(d.dispatch("key of bb"), vec![Command::SetRootPitch(10)]);
    }

    #[test]
    fn test_tempo_commands() {
        let d = dispatcher();
        assert_eq!(d.dispatch("tempo 128"), vec![Command::SetTempo(128.0)]);
        assert_eq!(d.dispatch("set tempo to ninety"), vec![Command::SetTempo(90.0)]);
        assert_eq!(d.dispatch("tempo one twenty"), vec![Command::SetTempo(120.0)]);
        assert_eq!(d.dispatch("140 bpm"), vec![Command::SetTempo(140.0)]);
        assert_eq!(d.dispatch("tempo up"), vec![Command::NudgeTempo(5.0)]);
    }

    #[test]
    fn test_cue_commands() {
        let d = dispatcher();
        assert_eq!(d.dispatch("cue one"), vec![Command::TriggerCue(0)]);
        assert_eq!(d.dispatch("cue 4"), vec![Command::TriggerCue(3)]);
        assert_eq!(d.dispatch("save cue two"), vec![Command::StoreCue(1)]);
        // Out of range falls through to the table, which has no match
        assert!(d.dispatch("cue nine").is_empty());
    }

    #[test]
    fn test_shader_by_name() {
        let d = dispatcher();
        assert_eq!(d.dispatch("shader tunnel"), vec![Command::SelectShader(1)]);
        assert_eq!(d.dispatch("show star field"), vec![Command::SelectShader(2)]);
        assert_eq!(d.dispatch("show star"), vec![Command::SelectShader(2)]);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(&["seven"]), Some(7));
        assert_eq!(parse_number(&["twenty", "five"]), Some(25));
        assert_eq!(parse_number(&["one", "hundred", "and", "ten"]), Some(110));
        assert_eq!(parse_number(&["two", "hundred"]), Some(200));
        assert_eq!(parse_number(&["loud"]), None);
        assert_eq!(parse_number(&[]), None);
    }

    #[test]
    fn test_phrases_are_normalized() {
        for (phrase, _) in PHRASES {
            assert_eq!(normalize(phrase), *phrase);
        }
    }
}
