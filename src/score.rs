//! Gain arithmetic and the configurable weighted score.

use crate::options::PackerOptions;

/// Net byte saving of replacing `copies` occurrences of a pattern of
/// escaped length `len` with a one-byte token, decoder overhead included.
pub fn gain(copies: usize, len: usize) -> i64 {
    let c = copies as i64;
    let l = len as i64;
    c * l - c - l - 2
}

/// Gain variant for tokens wider than one output byte (the escaped
/// backslash and multi-digit numeric tokens).
pub fn gain_with_token_cost(copies: usize, len: usize, token_cost: usize) -> i64 {
    let c = copies as i64;
    let l = len as i64;
    let t = token_cost as i64;
    c * (l - t) - l - 2 * t
}

/// Weights combined into the selection score.
#[derive(Debug, Clone, Copy)]
pub struct Weights {
    pub gain: f64,
    pub length: f64,
    pub copies: f64,
    pub tiebreaker: f64,
}

impl Weights {
    pub fn from_options(opts: &PackerOptions) -> Self {
        Self {
            gain: opts.crush_gain_factor,
            length: opts.crush_length_factor,
            copies: opts.crush_copies_factor,
            tiebreaker: opts.crush_tiebreaker_factor,
        }
    }

    pub fn score(&self, gain: i64, len: usize, copies: usize) -> f64 {
        self.gain * gain as f64 + self.length * len as f64 + self.copies * copies as f64
    }
}

/// Ordering key: higher score wins, then higher gain, then weighted copies.
///
/// Returns a value suitable for `sort_by` via `partial_cmp`; callers use a
/// stable sort so equal keys keep insertion order, which keeps the whole
/// search deterministic.
pub fn selection_key(weights: &Weights, gain: i64, len: usize, copies: usize) -> (f64, i64, f64) {
    (
        weights.score(gain, len, copies),
        gain,
        weights.tiebreaker * copies as f64,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gain_matches_formula() {
        // three copies of a three-byte pattern: 3*3 - 3 - 3 - 2
        assert_eq!(gain(3, 3), 1);
        assert_eq!(gain(2, 2), -2);
        assert_eq!(gain(4, 10), 24);
    }

    #[test]
    fn token_cost_one_matches_plain_gain() {
        for (c, l) in [(2, 5), (3, 3), (7, 12)] {
            assert_eq!(gain_with_token_cost(c, l, 1), gain(c, l));
        }
    }

    #[test]
    fn backslash_token_costs_more() {
        assert!(gain_with_token_cost(4, 10, 2) < gain_with_token_cost(4, 10, 1));
    }

    #[test]
    fn score_weights_apply() {
        let w = Weights { gain: 1.0, length: 0.5, copies: 0.25, tiebreaker: 1.0 };
        assert_eq!(w.score(10, 4, 8), 10.0 + 2.0 + 2.0);
    }
}
