//! Runtime configuration for the packer and its search strategies.

/// Options accepted by every packing entry point.
///
/// The defaults reproduce the standard interactive configuration; the
/// search strategies read only the fields that concern them.
#[derive(Debug, Clone)]
pub struct PackerOptions {
    /// Emit the shorter `for(i of ...)` token-list decoder instead of the
    /// ES5 `for(i in G=...)` form.
    pub use_es6: bool,
    /// Beam width: number of partial solutions kept per iteration.
    pub beam_width: usize,
    /// Branch factor: patterns expanded per beam state per iteration.
    pub branch_factor: usize,
    /// Hard cap on the number of replacements per solution.
    pub max_replacements: usize,
    /// Depth of the greedy look-ahead used to rank beam candidates.
    pub look_ahead_depth: usize,
    /// Sort the beam by cumulative gain instead of predicted score.
    pub prioritize_highest_gain: bool,
    /// Scorer weight applied to the raw gain.
    pub crush_gain_factor: f64,
    /// Scorer weight applied to the pattern length.
    pub crush_length_factor: f64,
    /// Scorer weight applied to the occurrence count.
    pub crush_copies_factor: f64,
    /// Weight applied to copies when breaking score and gain ties.
    pub crush_tiebreaker_factor: f64,
    /// Per-step discount applied to look-ahead gains, in [0.8, 1.0].
    pub look_ahead_discount: f64,
    /// Number of numeric tokens available to the digit strategy (1..=100).
    pub max_int: usize,
    /// Worker budget: beam states explored before giving up.
    pub max_states: u64,
    /// Worker budget: wall-clock milliseconds before giving up.
    pub time_limit_ms: u64,
    /// Spawn the worker parked; it only starts once triggered.
    pub waiting_for_trigger: bool,
    /// Safety counter: any single search loop aborts past this many iterations.
    pub max_iterations: u64,
    /// Variable name holding the packed string in the decoder.
    pub packed_var: char,
    /// String delimiter used around the packed literal.
    pub delimiter: char,
    /// Expression placed inside the decoder's `shift(...)` call.
    pub wrapped_init: String,
    /// Statements emitted between the decode loop and the interpreter call.
    pub environment: String,
    /// Final interpreter invocation; `None` means `eval(<packed_var>)`.
    pub interpreter: Option<String>,
}

impl Default for PackerOptions {
    fn default() -> Self {
        Self {
            use_es6: true,
            beam_width: 5,
            branch_factor: 20,
            max_replacements: 100,
            look_ahead_depth: 150,
            prioritize_highest_gain: false,
            crush_gain_factor: 1.0,
            crush_length_factor: 0.0,
            crush_copies_factor: 0.0,
            crush_tiebreaker_factor: 1.0,
            look_ahead_discount: 0.9,
            max_int: 10,
            max_states: 500_000,
            time_limit_ms: 600_000,
            waiting_for_trigger: false,
            max_iterations: 10_000,
            packed_var: '_',
            delimiter: '`',
            wrapped_init: String::new(),
            environment: String::new(),
            interpreter: None,
        }
    }
}

impl PackerOptions {
    /// The interpreter call appended after the decode loop.
    pub fn interpreter_call(&self) -> String {
        match &self.interpreter {
            Some(call) => call.clone(),
            None => format!("eval({})", self.packed_var),
        }
    }
}
