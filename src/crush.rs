//! Single-pass greedy search: pick the best pattern, apply it, repeat.

use std::time::Instant;
use tracing::debug;

use crate::error::TandemError;
use crate::options::PackerOptions;
use crate::pattern::{self, Pattern};
use crate::score::Weights;
use crate::types::{Replacement, SearchOutcome};

/// Selection rule used at each greedy step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heuristic {
    /// Weighted score from the configured factors.
    Balanced,
    /// Favour the most-repeated pattern.
    MostCopies,
    /// Favour the longest pattern.
    Longest,
    /// Favour gain per escaped byte.
    Density,
    /// Evaluate every fixed rule each step, keep the best-scoring choice.
    Adaptive,
    /// Evaluate every fixed rule each step, keep the highest-gain choice.
    AdaptiveGain,
}

impl Heuristic {
    pub fn name(&self) -> &'static str {
        match self {
            Heuristic::Balanced => "balanced",
            Heuristic::MostCopies => "most-copies",
            Heuristic::Longest => "longest",
            Heuristic::Density => "density",
            Heuristic::Adaptive => "adaptive",
            Heuristic::AdaptiveGain => "adaptive-gain",
        }
    }

    const FIXED: [Heuristic; 4] = [
        Heuristic::Balanced,
        Heuristic::MostCopies,
        Heuristic::Longest,
        Heuristic::Density,
    ];
}

/// Printable bytes usable as replacement tokens for `text`.
///
/// Backtick, backslash and the configured delimiter are reserved for the
/// decoder syntax; anything already present in the text cannot serve as a
/// token at all.
pub fn free_tokens(text: &str, delimiter: char) -> Vec<String> {
    (32u8..=126)
        .map(char::from)
        .filter(|&c| c != '`' && c != '\\' && c != delimiter)
        .filter(|&c| !text.contains(c))
        .map(String::from)
        .collect()
}

/// Index of the pattern the heuristic would apply next, if any has
/// positive gain. First-found wins ties, keeping selection deterministic.
fn choose(patterns: &[Pattern], heuristic: Heuristic, weights: &Weights) -> Option<usize> {
    let argmax = |key: &dyn Fn(&Pattern) -> (f64, i64, f64)| -> Option<usize> {
        let mut best: Option<(usize, (f64, i64, f64))> = None;
        for (i, p) in patterns.iter().enumerate().filter(|(_, p)| p.gain > 0) {
            let k = key(p);
            let replace = match &best {
                None => true,
                Some((_, held)) => {
                    k.0 > held.0
                        || (k.0 == held.0 && k.1 > held.1)
                        || (k.0 == held.0 && k.1 == held.1 && k.2 > held.2)
                }
            };
            if replace {
                best = Some((i, k));
            }
        }
        best.map(|(i, _)| i)
    };

    match heuristic {
        Heuristic::Balanced => argmax(&|p| {
            (
                weights.score(p.gain, p.len, p.copies),
                p.gain,
                weights.tiebreaker * p.copies as f64,
            )
        }),
        Heuristic::MostCopies => argmax(&|p| (p.copies as f64, p.gain, 0.0)),
        Heuristic::Longest => argmax(&|p| (p.len as f64, p.gain, 0.0)),
        Heuristic::Density => argmax(&|p| (p.gain as f64 / p.len as f64, p.gain, 0.0)),
        Heuristic::Adaptive | Heuristic::AdaptiveGain => {
            let mut winner: Option<usize> = None;
            for fixed in Heuristic::FIXED {
                let Some(i) = choose(patterns, fixed, weights) else { continue };
                let better = match winner {
                    None => true,
                    Some(w) => {
                        let (cand, held) = (&patterns[i], &patterns[w]);
                        if heuristic == Heuristic::AdaptiveGain {
                            cand.gain > held.gain
                        } else {
                            weights.score(cand.gain, cand.len, cand.copies)
                                > weights.score(held.gain, held.len, held.copies)
                        }
                    }
                };
                if better {
                    winner = Some(i);
                }
            }
            winner
        }
    }
}

/// Run the greedy crusher over `input`.
///
/// Only the first iteration pays for full enumeration; later iterations
/// re-count the already-discovered patterns against the rewritten text.
/// Each applied replacement prepends its `pattern ++ token` decoder entry
/// to the working text.
pub fn crush(
    input: &str,
    opts: &PackerOptions,
    heuristic: Heuristic,
) -> Result<SearchOutcome, TandemError> {
    let start = Instant::now();
    let weights = Weights::from_options(opts);
    let alphabet = free_tokens(input, opts.delimiter);
    let mut next_token = 0usize;

    let mut text = input.to_string();
    let mut patterns: Vec<Pattern> = Vec::new();
    let mut replacements: Vec<Replacement> = Vec::new();
    let mut total_gain = 0i64;
    let mut tokens_exhausted = false;
    let mut iterations = 0u64;

    loop {
        iterations += 1;
        if iterations > opts.max_iterations {
            break;
        }
        if iterations == 1 {
            patterns = pattern::enumerate(&text, opts.delimiter);
        } else {
            pattern::recount(&mut patterns, &text);
        }
        for p in patterns.iter_mut() {
            p.score = weights.score(p.gain, p.len, p.copies);
        }

        let Some(best) = choose(&patterns, heuristic, &weights) else { break };
        if next_token >= alphabet.len() {
            tokens_exhausted = true;
            break;
        }
        let token = alphabet[next_token].clone();
        next_token += 1;

        let chosen = patterns.remove(best);
        let replaced = pattern::rewrite(&text, &chosen.string, &token);
        text = format!("{}{}{}", chosen.string, token, replaced);
        pattern::substitute(&mut patterns, &chosen.string, &token, opts.delimiter);

        total_gain += chosen.gain;
        debug!(
            token = %token,
            pattern = %chosen.string,
            copies = chosen.copies,
            gain = chosen.gain,
            "applied replacement"
        );
        replacements.push(Replacement {
            token,
            pattern: chosen.string.clone(),
            original: chosen.original.clone(),
            copies: chosen.copies,
            gain: chosen.gain,
            score: chosen.score,
        });
        if replacements.len() >= opts.max_replacements {
            break;
        }
    }

    Ok(SearchOutcome {
        text,
        replacements,
        patterns,
        total_gain,
        tokens_exhausted,
        nodes_explored: iterations,
        elapsed_ms: start.elapsed().as_millis(),
        stopped_by_budget: false,
    })
}
