//! Seeded chord progression generator.
//!
//! A weighted walk over scale degrees following common functional-harmony
//! moves. Every phrase starts on the tonic.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::theory::DEGREES;

/// Weighted successors per degree: (next degree, weight)
const TRANSITIONS: [&[(usize, u32)]; DEGREES] = [
    &[(3, 3), (4, 3), (5, 2), (1, 2), (2, 1)], // I   -> IV V vi ii iii
    &[(4, 4), (6, 1), (3, 1)],                 // ii  -> V vii IV
    &[(5, 3), (3, 2)],                         // iii -> vi IV
    &[(4, 3), (0, 2), (1, 2)],                 // IV  -> V I ii
    &[(0, 4), (5, 2)],                         // V   -> I vi
    &[(1, 2), (3, 3), (4, 1)],                 // vi  -> ii IV V
    &[(0, 3), (2, 1)],                         // vii -> I iii
];

/// Whether `to` may follow `from`
pub fn is_valid_transition(from: usize, to: usize) -> bool {
    TRANSITIONS[from % DEGREES].iter().any(|&(d, _)| d == to)
}

/// Chord progression state
pub struct Progression {
    rng: StdRng,
    current: usize,
    phrase_len: usize,
    position: usize,
}

impl Progression {
    /// Create a progression positioned on the tonic
    pub fn new(seed: u64, phrase_len: usize) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            current: 0,
            phrase_len: phrase_len.max(1),
            position: 0,
        }
    }

    /// Current degree (0 = tonic)
    pub fn current(&self) -> usize {
        self.current
    }

    /// Advance one chord and return the new degree
    pub fn advance(&mut self) -> usize {
        self.position += 1;
        if self.position >= self.phrase_len {
            self.position = 0;
            self.current = 0;
            return self.current;
        }

        let choices = TRANSITIONS[self.current];
        let total: u32 = choices.iter().map(|&(_, w)| w).sum();
        let mut pick = self.rng.gen_range(0..total);
        for &(degree, weight) in choices {
            if pick < weight {
                self.current = degree;
                break;
            }
            pick -= weight;
        }
        self.current
    }

    /// Restart the phrase on the tonic
    pub fn reset(&mut self) {
        self.current = 0;
        self.position = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_on_tonic() {
        let progression = Progression::new(7, 8);
        assert_eq!(progression.current(), 0);
    }

    #[test]
    fn test_transitions_follow_table() {
        let mut progression = Progression::new(1234, 8);
        let mut prev = progression.current();
        for i in 1..200 {
            let next = progression.advance();
            if i % 8 == 0 {
                assert_eq!(next, 0, "phrase boundary must return to tonic");
            } else {
                assert!(is_valid_transition(prev, next), "{} -> {}", prev, next);
            }
            prev = next;
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = Progression::new(99, 16);
        let mut b = Progression::new(99, 16);
        let seq_a: Vec<usize> = (0..32).map(|_| a.advance()).collect();
        let seq_b: Vec<usize> = (0..32).map(|_| b.advance()).collect();
        assert_eq!(seq_a, seq_b);
    }

    #[test]
    fn test_reset() {
        let mut progression = Progression::new(5, 8);
        progression.advance();
        progression.advance();
        progression.reset();
        assert_eq!(progression.current(), 0);
    }
}
