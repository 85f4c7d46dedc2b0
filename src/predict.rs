//! Bounded-depth greedy look-ahead used to rank beam candidates.
//!
//! A locally inferior substitution with rich follow-ups should beat a
//! locally superior one that dead-ends. The predictor plays the greedy
//! strategy forward a configurable number of steps and reports the
//! discounted gain it collects; beam candidates are then ranked by
//! `own gain + discount * look-ahead`.
//!
//! Results are memoised by a SHA-256 digest of the projected text. The
//! cache keeps a bounded number of entries and evicts the oldest when
//! full; correctness never depends on a hit.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::collections::VecDeque;

use crate::pattern::{self, Pattern};

const CACHE_CAPACITY: usize = 4096;

pub struct GainPredictor {
    discount: f64,
    cache: HashMap<[u8; 32], f64>,
    order: VecDeque<[u8; 32]>,
}

impl GainPredictor {
    pub fn new(discount: f64) -> Self {
        Self {
            discount,
            cache: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Discounted gain obtainable from `text` within `depth` further greedy
    /// replacements, using only tokens from `alphabet` not yet in `used`.
    ///
    /// `inline` mirrors the strategy's rewrite: when true the projected text
    /// carries the `pattern ++ token` decoder entry, matching strategies
    /// that store pattern bodies inside the packed literal.
    pub fn predict(
        &mut self,
        text: &str,
        patterns: &[Pattern],
        depth: usize,
        used: &[String],
        alphabet: &[String],
        delimiter: char,
        inline: bool,
    ) -> f64 {
        if depth == 0 {
            return 0.0;
        }
        let key: [u8; 32] = Sha256::digest(text.as_bytes()).into();
        if let Some(&hit) = self.cache.get(&key) {
            return hit;
        }

        let mut live = patterns.to_vec();
        pattern::recount(&mut live, text);

        let value = match self.best_step(text, &mut live, depth, used, alphabet, delimiter, inline)
        {
            Some(v) => v,
            None => 0.0,
        };

        if self.cache.len() >= CACHE_CAPACITY {
            if let Some(old) = self.order.pop_front() {
                self.cache.remove(&old);
            }
        }
        self.order.push_back(key);
        self.cache.insert(key, value);
        value
    }

    #[allow(clippy::too_many_arguments)]
    fn best_step(
        &mut self,
        text: &str,
        live: &mut [Pattern],
        depth: usize,
        used: &[String],
        alphabet: &[String],
        delimiter: char,
        inline: bool,
    ) -> Option<f64> {
        // highest gain first; stable, so ties keep discovery order
        live.sort_by(|a, b| b.gain.cmp(&a.gain));
        let best = live.first().filter(|p| p.gain > 0)?.clone();

        let token = alphabet
            .iter()
            .find(|t| !used.contains(t) && !text.contains(t.as_str()))?
            .clone();

        let replaced = pattern::rewrite(text, &best.string, &token);
        let projected = if inline {
            format!("{}{}{}", best.string, token, replaced)
        } else {
            replaced
        };

        let mut remaining: Vec<Pattern> =
            live.iter().filter(|p| p.string != best.string).cloned().collect();
        pattern::substitute(&mut remaining, &best.string, &token, delimiter);

        let mut used_next = used.to_vec();
        used_next.push(token.clone());

        let below = self.predict(
            &projected,
            &remaining,
            depth - 1,
            &used_next,
            alphabet,
            delimiter,
            inline,
        );
        Some(best.gain as f64 + self.discount * below)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::enumerate;

    fn alphabet() -> Vec<String> {
        ('!'..='/').map(|c| c.to_string()).collect()
    }

    #[test]
    fn zero_depth_predicts_nothing() {
        let text = "abcabcabc";
        let pats = enumerate(text, '`');
        let mut pred = GainPredictor::new(0.9);
        assert_eq!(pred.predict(text, &pats, 0, &[], &alphabet(), '`', true), 0.0);
    }

    #[test]
    fn lookahead_sees_the_single_replacement() {
        let text = "abcabcabc";
        let pats = enumerate(text, '`');
        let mut pred = GainPredictor::new(1.0);
        let v = pred.predict(text, &pats, 4, &[], &alphabet(), '`', true);
        // "abc" is the only gainful pattern, worth exactly one byte
        assert_eq!(v, 1.0);
    }

    #[test]
    fn memoised_call_is_stable() {
        let text = "the cat and the dog and the bird";
        let pats = enumerate(text, '`');
        let mut pred = GainPredictor::new(0.9);
        let a = pred.predict(text, &pats, 6, &[], &alphabet(), '`', true);
        let b = pred.predict(text, &pats, 6, &[], &alphabet(), '`', true);
        assert_eq!(a, b);
    }

    #[test]
    fn deeper_lookahead_never_loses_value() {
        let text = "one two one two three three one two";
        let pats = enumerate(text, '`');
        let mut shallow = GainPredictor::new(1.0);
        let mut deep = GainPredictor::new(1.0);
        let s = shallow.predict(text, &pats, 1, &[], &alphabet(), '`', true);
        let d = deep.predict(text, &pats, 8, &[], &alphabet(), '`', true);
        assert!(d >= s);
    }
}
