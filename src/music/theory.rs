//! Scales, modes, and triads.
//!
//! Pitches are MIDI note numbers (60 = middle C, A4 = 69 = 440 Hz).
//! Scale degrees are zero-based indices into a seven-note mode (0 = tonic).

use serde::Deserialize;
use std::fmt;

/// Number of degrees in a diatonic mode
pub const DEGREES: usize = 7;

/// The seven diatonic modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Ionian,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Aeolian,
    Locrian,
}

impl Mode {
    pub const ALL: [Mode; DEGREES] = [
        Mode::Ionian,
        Mode::Dorian,
        Mode::Phrygian,
        Mode::Lydian,
        Mode::Mixolydian,
        Mode::Aeolian,
        Mode::Locrian,
    ];

    /// Semitone offsets of each degree from the tonic
    pub fn intervals(self) -> [u8; DEGREES] {
        match self {
            Mode::Ionian => [0, 2, 4, 5, 7, 9, 11],
            Mode::Dorian => [0, 2, 3, 5, 7, 9, 10],
            Mode::Phrygian => [0, 1, 3, 5, 7, 8, 10],
            Mode::Lydian => [0, 2, 4, 6, 7, 9, 11],
            Mode::Mixolydian => [0, 2, 4, 5, 7, 9, 10],
            Mode::Aeolian => [0, 2, 3, 5, 7, 8, 10],
            Mode::Locrian => [0, 1, 3, 5, 6, 8, 10],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Mode::Ionian => "ionian",
            Mode::Dorian => "dorian",
            Mode::Phrygian => "phrygian",
            Mode::Lydian => "lydian",
            Mode::Mixolydian => "mixolydian",
            Mode::Aeolian => "aeolian",
            Mode::Locrian => "locrian",
        }
    }

    /// Parse a mode name; "major" and "minor" are accepted as aliases
    pub fn parse(name: &str) -> Option<Mode> {
        match name.trim().to_lowercase().as_str() {
            "major" => Some(Mode::Ionian),
            "minor" => Some(Mode::Aeolian),
            other => Mode::ALL.into_iter().find(|m| m.name() == other),
        }
    }

    /// Following mode in the list (wraps)
    pub fn next(self) -> Mode {
        let idx = Mode::ALL.iter().position(|&m| m == self).unwrap_or(0);
        Mode::ALL[(idx + 1) % DEGREES]
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Triad quality
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
}

impl ChordQuality {
    /// Semitones of third and fifth above the chord root
    pub fn intervals(self) -> [u8; 3] {
        match self {
            ChordQuality::Major => [0, 4, 7],
            ChordQuality::Minor => [0, 3, 7],
            ChordQuality::Diminished => [0, 3, 6],
            ChordQuality::Augmented => [0, 4, 8],
        }
    }

    /// Classify a stacked triad from its third and fifth (semitones above root)
    pub fn from_intervals(third: u8, fifth: u8) -> Option<ChordQuality> {
        match (third, fifth) {
            (4, 7) => Some(ChordQuality::Major),
            (3, 7) => Some(ChordQuality::Minor),
            (3, 6) => Some(ChordQuality::Diminished),
            (4, 8) => Some(ChordQuality::Augmented),
            _ => None,
        }
    }
}

use ChordQuality::{Diminished as D, Major as M, Minor as N};

/// Triad quality per scale degree, one row per mode (same order as `Mode::ALL`)
const CHORD_QUALITIES: [[ChordQuality; DEGREES]; DEGREES] = [
    [M, N, N, M, M, N, D], // Ionian
    [N, N, M, M, N, D, M], // Dorian
    [N, M, M, N, D, M, N], // Phrygian
    [M, M, N, D, M, N, N], // Lydian
    [M, N, D, M, N, N, M], // Mixolydian
    [N, D, M, N, N, M, M], // Aeolian
    [D, M, N, N, M, M, N], // Locrian
];

/// Triad quality built on a scale degree of a mode
pub fn chord_quality(mode: Mode, degree: usize) -> ChordQuality {
    let row = Mode::ALL.iter().position(|&m| m == mode).unwrap_or(0);
    CHORD_QUALITIES[row][degree % DEGREES]
}

/// Roman numeral for a degree, lowercase for minor/diminished chords
pub fn roman(degree: usize, quality: ChordQuality) -> String {
    const NUMERALS: [&str; DEGREES] = ["I", "II", "III", "IV", "V", "VI", "VII"];
    let numeral = NUMERALS[degree % DEGREES];
    match quality {
        ChordQuality::Major => numeral.to_string(),
        ChordQuality::Augmented => format!("{}+", numeral),
        ChordQuality::Minor => numeral.to_lowercase(),
        ChordQuality::Diminished => format!("{}°", numeral.to_lowercase()),
    }
}

/// A triad as MIDI notes (root position)
#[derive(Debug, Clone, PartialEq)]
pub struct Chord {
    pub degree: usize,
    pub quality: ChordQuality,
    pub notes: [u8; 3],
}

impl Chord {
    /// Note frequencies (Hz)
    pub fn frequencies(&self) -> [f32; 3] {
        self.notes.map(midi_to_hz)
    }

    pub fn root(&self) -> u8 {
        self.notes[0]
    }

    pub fn label(&self) -> String {
        format!(
            "{} ({})",
            roman(self.degree, self.quality),
            note_name(self.root())
        )
    }
}

/// Build the diatonic triad on `degree` of `mode` rooted at `tonic` (MIDI)
pub fn triad(tonic: u8, mode: Mode, degree: usize) -> Chord {
    let degree = degree % DEGREES;
    let steps = mode.intervals();
    let note_at = |d: usize| -> u8 {
        let octave = (d / DEGREES) as u8;
        tonic + steps[d % DEGREES] + 12 * octave
    };
    let root = note_at(degree);
    let third = note_at(degree + 2);
    let fifth = note_at(degree + 4);

    Chord {
        degree,
        quality: chord_quality(mode, degree),
        notes: [root, third, fifth],
    }
}

/// Convert MIDI note to frequency (A4 = 440 Hz)
pub fn midi_to_hz(note: u8) -> f32 {
    440.0 * 2f32.powf((note as f32 - 69.0) / 12.0)
}

/// Nearest MIDI note for a frequency
pub fn hz_to_midi(hz: f32) -> u8 {
    let note = 69.0 + 12.0 * (hz / 440.0).log2();
    note.round().clamp(0.0, 127.0) as u8
}

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "Eb", "E", "F", "F#", "G", "Ab", "A", "Bb", "B",
];

/// Note name with octave, e.g. 60 -> "C4"
pub fn note_name(note: u8) -> String {
    let octave = note as i32 / 12 - 1;
    format!("{}{}", NOTE_NAMES[(note % 12) as usize], octave)
}

/// Parse a spoken or typed pitch class into semitones above C.
///
/// Accepts "c", "C#", "c sharp", "e flat", "bb", "b♭".
pub fn parse_pitch_class(text: &str) -> Option<u8> {
    let text = text.trim().to_lowercase();
    let mut chars = text.chars();
    let letter = chars.next()?;
    let base: i32 = match letter {
        'c' => 0,
        'd' => 2,
        'e' => 4,
        'f' => 5,
        'g' => 7,
        'a' => 9,
        'b' => 11,
        _ => return None,
    };
    let rest = chars.as_str().trim();
    let accidental = match rest {
        "" | "natural" => 0,
        "#" | "♯" | "sharp" | "s" => 1,
        "b" | "♭" | "flat" => -1,
        _ => return None,
    };
    Some((base + accidental).rem_euclid(12) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phrygian_third_degree_is_major() {
        // C Phrygian: C Db Eb F G Ab Bb -> III = Eb major
        let chord = triad(60, Mode::Phrygian, 2);
        assert_eq!(chord.quality, ChordQuality::Major);
        assert_eq!(chord.notes, [63, 67, 70]);

        let freqs = chord.frequencies();
        assert!((freqs[0] - 311.13).abs() < 0.01);
        assert!((freqs[1] - 392.00).abs() < 0.01);
        assert!((freqs[2] - 466.16).abs() < 0.01);
    }

    #[test]
    fn test_quality_table_matches_stacked_thirds() {
        for mode in Mode::ALL {
            for degree in 0..DEGREES {
                let chord = triad(48, mode, degree);
                let third = chord.notes[1] - chord.notes[0];
                let fifth = chord.notes[2] - chord.notes[0];
                assert_eq!(
                    ChordQuality::from_intervals(third, fifth),
                    Some(chord_quality(mode, degree)),
                    "{} degree {}",
                    mode,
                    degree
                );
            }
        }
    }

    #[test]
    fn test_triad_wraps_octave() {
        // C Ionian VII = B D F, third and fifth cross the octave
        let chord = triad(60, Mode::Ionian, 6);
        assert_eq!(chord.notes, [71, 74, 77]);
        assert_eq!(chord.quality, ChordQuality::Diminished);
        assert_eq!(roman(6, chord.quality), "vii°");
    }

    #[test]
    fn test_midi_conversion() {
        assert!((midi_to_hz(69) - 440.0).abs() < 1e-3);
        assert!((midi_to_hz(60) - 261.63).abs() < 0.01);
        assert_eq!(hz_to_midi(440.0), 69);
        assert_eq!(hz_to_midi(262.0), 60);
        assert_eq!(note_name(60), "C4");
        assert_eq!(note_name(63), "Eb4");
    }

    #[test]
    fn test_parse_pitch_class() {
        assert_eq!(parse_pitch_class("c"), Some(0));
        assert_eq!(parse_pitch_class("C#"), Some(1));
        assert_eq!(parse_pitch_class("e flat"), Some(3));
        assert_eq!(parse_pitch_class("bb"), Some(10));
        assert_eq!(parse_pitch_class("b"), Some(11));
        assert_eq!(parse_pitch_class("c flat"), Some(11));
        assert_eq!(parse_pitch_class("h"), None);
        assert_eq!(parse_pitch_class("d minor"), None);
    }

    #[test]
    fn test_mode_parse_and_cycle() {
        assert_eq!(Mode::parse("Dorian"), Some(Mode::Dorian));
        assert_eq!(Mode::parse("minor"), Some(Mode::Aeolian));
        assert_eq!(Mode::parse("blues"), None);
        assert_eq!(Mode::Locrian.next(), Mode::Ionian);
    }
}
