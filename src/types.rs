//! Shared result types returned by the packing entry points.

use serde::Serialize;
use std::collections::HashMap;

use crate::graph::SearchGraph;
use crate::pattern::Pattern;

/// A pattern that has been committed to the output, with its bound token.
#[derive(Debug, Clone, Serialize)]
pub struct Replacement {
    /// Token text substituted for the pattern (one byte, except for the
    /// escaped backslash and multi-digit numeric tokens).
    pub token: String,
    /// The pattern as it stood in the working text when it was applied.
    pub pattern: String,
    /// The pattern fully expanded back to input text.
    pub original: String,
    /// Occurrence count at the moment of application.
    pub copies: usize,
    /// Net byte saving recorded at the moment of application.
    pub gain: i64,
    /// Selection score at the moment of application.
    pub score: f64,
}

/// One stage of a packed result.
#[derive(Debug, Clone, Serialize)]
pub struct ResultStage {
    /// Byte length of the artefact; -1 when this stage failed.
    pub length: i64,
    /// The complete self-extracting artefact.
    pub output: String,
    /// Free-form human report for this stage.
    pub details: String,
    /// The packed text before escaping, when meaningful.
    pub transform: Option<String>,
    /// True while an asynchronous variant is still producing this stage.
    pub is_running: bool,
}

impl ResultStage {
    pub fn failed(details: impl Into<String>) -> Self {
        Self {
            length: -1,
            output: String::new(),
            details: details.into(),
            transform: None,
            is_running: false,
        }
    }
}

/// Everything produced by one strategy run.
#[derive(Debug, Clone, Serialize)]
pub struct PackerData {
    /// Strategy name, e.g. `crusher/balanced`, `beam`, `digits`.
    pub strategy: String,
    /// The untouched input.
    pub original: String,
    /// Replacements in application order.
    pub replacements: Vec<Replacement>,
    /// Replacements keyed by their token.
    pub matches_lookup: HashMap<String, Replacement>,
    /// Stage one (search output) and stage two (token allocation).
    pub result: [ResultStage; 2],
    /// Recorded search states, present for the beam-driven strategies.
    pub search_graph: Option<SearchGraph>,
}

impl PackerData {
    pub fn from_error(strategy: &str, original: &str, message: &str) -> Self {
        let details = format!("Error: {message}");
        Self {
            strategy: strategy.to_string(),
            original: original.to_string(),
            replacements: Vec::new(),
            matches_lookup: HashMap::new(),
            result: [ResultStage::failed(&details), ResultStage::failed(&details)],
            search_graph: None,
        }
    }

    /// The shorter of the two stages, preferring stage two on ties.
    pub fn best_stage(&self) -> &ResultStage {
        let [s1, s2] = &self.result;
        match (s1.length, s2.length) {
            (_, l2) if l2 >= 0 && (s1.length < 0 || l2 <= s1.length) => s2,
            _ => s1,
        }
    }
}

/// Progress report emitted by asynchronous searches.
#[derive(Debug, Clone, Serialize)]
pub struct Progress {
    /// Fraction complete, monotone non-decreasing in [0, 1].
    pub ratio: f64,
    /// Coarse phase label, e.g. `search`, `allocate`, `timeout`.
    pub phase: String,
    /// One-line human message.
    pub message: String,
    /// Optional free-form detail.
    pub detail: Option<String>,
}

/// Outcome of a search strategy before token allocation.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Working text after all replacements (including any inline decoder
    /// entries the strategy stores in the text).
    pub text: String,
    /// Replacements in application order.
    pub replacements: Vec<Replacement>,
    /// Patterns discovered by the analyser, for the allocator's reuse.
    pub patterns: Vec<Pattern>,
    /// Sum of recorded gains.
    pub total_gain: i64,
    /// The search ran out of fresh tokens while gainful patterns remained.
    pub tokens_exhausted: bool,
    /// States explored (1 for the greedy strategy's single pass).
    pub nodes_explored: u64,
    /// Wall-clock spent searching.
    pub elapsed_ms: u128,
    /// True when a budget, not convergence, ended the search.
    pub stopped_by_budget: bool,
}
