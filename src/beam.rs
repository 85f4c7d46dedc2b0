//! Beam search over replacement sequences with look-ahead ranking.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::TandemError;
use crate::graph::SearchGraph;
use crate::options::PackerOptions;
use crate::pattern::{self, Pattern};
use crate::predict::GainPredictor;
use crate::score::{self, Weights};
use crate::types::{Progress, Replacement, SearchOutcome};

/// Node-count and wall-clock limits checked at each iteration boundary.
#[derive(Debug, Clone, Copy)]
pub struct BeamBudgets {
    pub max_states: u64,
    pub time_limit: Duration,
}

impl BeamBudgets {
    pub fn from_options(opts: &PackerOptions) -> Self {
        Self {
            max_states: opts.max_states,
            time_limit: Duration::from_millis(opts.time_limit_ms),
        }
    }
}

/// How occurrence counts feed the ranking of expansion candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountMode {
    /// Rank by the plain non-overlapping gain.
    Exact,
    /// Rank by the overlap-weighted count
    /// `nonOverlap + 0.3 * (overlap - nonOverlap)`.
    OverlapWeighted,
}

#[derive(Debug, Clone)]
struct BeamState {
    node: usize,
    text: String,
    tokens: Vec<String>,
    replacements: Vec<Replacement>,
    patterns: Vec<Pattern>,
    gain: i64,
    predicted: f64,
    depth: usize,
}

pub struct BeamOutcome {
    pub search: SearchOutcome,
    pub graph: SearchGraph,
}

pub struct BeamSolver<'a> {
    opts: &'a PackerOptions,
    alphabet: Vec<String>,
    /// Store `pattern ++ token` decoder entries inside the working text.
    inline: bool,
    count_mode: CountMode,
}

impl<'a> BeamSolver<'a> {
    pub fn new(
        opts: &'a PackerOptions,
        alphabet: Vec<String>,
        inline: bool,
        count_mode: CountMode,
    ) -> Self {
        Self { opts, alphabet, inline, count_mode }
    }

    /// Cost in output bytes of the next token a state would consume.
    fn next_token_cost(&self, state: &BeamState) -> usize {
        self.alphabet.get(state.tokens.len()).map_or(1, |t| t.len())
    }

    fn fresh_token(&self, state: &BeamState) -> Option<String> {
        self.alphabet.iter().find(|t| !state.tokens.contains(t)).cloned()
    }

    /// Re-count, re-score and prune a state's patterns against its text.
    fn rescore(&self, patterns: &mut Vec<Pattern>, text: &str, token_cost: usize) {
        let weights = Weights::from_options(self.opts);
        for p in patterns.iter_mut() {
            let non = pattern::count_occurrences(text, &p.string);
            p.copies = non;
            p.gain = score::gain_with_token_cost(non, p.len, token_cost);
            p.score = match self.count_mode {
                CountMode::Exact => weights.score(p.gain, p.len, p.copies),
                CountMode::OverlapWeighted => {
                    let over = pattern::count_overlapping(text, &p.string);
                    let weighted = non as f64 + 0.3 * (over.saturating_sub(non)) as f64;
                    weighted * (p.len as i64 - token_cost as i64) as f64
                        - (p.len + 2 * token_cost) as f64
                }
            };
        }
        patterns.retain(|p| p.copies >= 2 && p.gain > 0);
    }

    /// Run the search; `observer` receives coarse progress reports and a
    /// raised `abort` flag stops the search at the next iteration boundary.
    pub fn solve(
        &self,
        input: &str,
        mut observer: Option<&mut dyn FnMut(Progress)>,
        abort: Option<&AtomicBool>,
    ) -> Result<BeamOutcome, TandemError> {
        let opts = self.opts;
        let start = Instant::now();
        let budgets = BeamBudgets::from_options(opts);
        let mut predictor = GainPredictor::new(opts.look_ahead_discount);
        let mut graph = SearchGraph::new();

        let root_node = graph.add_root(input.len());
        let root = BeamState {
            node: root_node,
            text: input.to_string(),
            tokens: Vec::new(),
            replacements: Vec::new(),
            patterns: pattern::enumerate(input, opts.delimiter),
            gain: 0,
            predicted: 0.0,
            depth: 0,
        };

        let mut best = root.clone();
        let mut beam = vec![root];
        let mut nodes: u64 = 1;
        let mut tokens_exhausted = false;
        let mut stopped_by_budget = false;
        let mut iterations = 0u64;

        loop {
            iterations += 1;
            if iterations > opts.max_iterations
                || nodes >= budgets.max_states
                || start.elapsed() >= budgets.time_limit
                || abort.is_some_and(|a| a.load(Ordering::Relaxed))
            {
                stopped_by_budget = true;
                break;
            }

            // convergence: the beam head can no longer improve
            {
                let head = &beam[0];
                let mut live = head.patterns.clone();
                self.rescore(&mut live, &head.text, self.next_token_cost(head));
                if live.is_empty() || head.replacements.len() >= opts.max_replacements {
                    break;
                }
            }

            let mut pool: Vec<BeamState> = Vec::new();
            let mut expanded = false;
            for state in &beam {
                // "stop here" option: the unexpanded parent stays eligible
                pool.push(state.clone());
                if state.replacements.len() >= opts.max_replacements {
                    continue;
                }
                let token_cost = self.next_token_cost(state);
                let mut live = state.patterns.clone();
                self.rescore(&mut live, &state.text, token_cost);
                match self.count_mode {
                    CountMode::Exact => live.sort_by(|a, b| b.gain.cmp(&a.gain)),
                    CountMode::OverlapWeighted => live.sort_by(|a, b| {
                        b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal)
                    }),
                }

                for p in live.iter().take(opts.branch_factor) {
                    let Some(token) = self.fresh_token(state) else {
                        tokens_exhausted = true;
                        break;
                    };
                    let replaced = pattern::rewrite(&state.text, &p.string, &token);
                    let child_text = if self.inline {
                        format!("{}{}{}", p.string, token, replaced)
                    } else {
                        replaced
                    };
                    let mut child_patterns: Vec<Pattern> =
                        live.iter().filter(|q| q.string != p.string).cloned().collect();
                    pattern::substitute(&mut child_patterns, &p.string, &token, opts.delimiter);

                    let child_gain = state.gain + p.gain;
                    let mut used = state.tokens.clone();
                    used.push(token.clone());
                    let ahead = predictor.predict(
                        &child_text,
                        &child_patterns,
                        opts.look_ahead_depth,
                        &used,
                        &self.alphabet,
                        opts.delimiter,
                        self.inline,
                    );
                    let predicted = child_gain as f64 + opts.look_ahead_discount * ahead;

                    let node = graph.add_child(
                        state.node,
                        &p.string,
                        p.gain,
                        child_gain,
                        predicted,
                        state.depth + 1,
                        child_text.len(),
                    );
                    nodes += 1;

                    let mut replacements = state.replacements.clone();
                    replacements.push(Replacement {
                        token,
                        pattern: p.string.clone(),
                        original: p.original.clone(),
                        copies: p.copies,
                        gain: p.gain,
                        score: p.score,
                    });
                    let child = BeamState {
                        node,
                        text: child_text,
                        tokens: used,
                        replacements,
                        patterns: child_patterns,
                        gain: child_gain,
                        predicted,
                        depth: state.depth + 1,
                    };
                    if child.gain > best.gain {
                        best = child.clone();
                    }
                    pool.push(child);
                    expanded = true;
                }
            }
            if !expanded {
                break;
            }

            // one survivor per distinct text, first arrival wins
            let mut seen: HashSet<String> = HashSet::new();
            pool.retain(|s| seen.insert(s.text.clone()));

            if opts.prioritize_highest_gain {
                pool.sort_by(|a, b| b.gain.cmp(&a.gain));
            } else {
                pool.sort_by(|a, b| {
                    b.predicted
                        .partial_cmp(&a.predicted)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then(b.gain.cmp(&a.gain))
                });
            }
            pool.truncate(opts.beam_width);
            if pool.is_empty() {
                break;
            }
            beam = pool;

            debug!(
                iteration = iterations,
                nodes,
                beam_gain = beam[0].gain,
                best_gain = best.gain,
                "beam iteration"
            );
            if let Some(obs) = observer.as_deref_mut() {
                let ratio = (nodes as f64 / budgets.max_states as f64)
                    .max(start.elapsed().as_secs_f64() / budgets.time_limit.as_secs_f64())
                    .max(beam[0].replacements.len() as f64 / opts.max_replacements as f64)
                    .clamp(0.0, 1.0);
                obs(Progress {
                    ratio,
                    phase: "search".to_string(),
                    message: format!("{} states explored, best gain {}", nodes, best.gain),
                    detail: Some(format!("beam depth {}", beam[0].depth)),
                });
            }
        }

        graph.mark_best_path(best.node);
        Ok(BeamOutcome {
            search: SearchOutcome {
                text: best.text,
                replacements: best.replacements,
                patterns: best.patterns,
                total_gain: best.gain,
                tokens_exhausted,
                nodes_explored: nodes,
                elapsed_ms: start.elapsed().as_millis(),
                stopped_by_budget,
            },
            graph,
        })
    }
}

/// Beam search with the full printable-byte token alphabet.
pub fn solve(input: &str, opts: &PackerOptions) -> Result<BeamOutcome, TandemError> {
    let alphabet = crate::crush::free_tokens(input, opts.delimiter);
    BeamSolver::new(opts, alphabet, true, CountMode::Exact).solve(input, None, None)
}
