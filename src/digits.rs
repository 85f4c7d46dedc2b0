//! Search variant using the decimal digits as replacement tokens.
//!
//! The decoder is a single `replace` pass mapping each digit to its fully
//! expanded pattern body, so the input must not contain any digit to begin
//! with. Pattern ranking uses the overlap-weighted occurrence count.

use std::sync::atomic::AtomicBool;

use crate::beam::{BeamOutcome, BeamSolver, CountMode};
use crate::error::TandemError;
use crate::options::PackerOptions;
use crate::types::Progress;

/// Character class of the bytes this strategy reserves as tokens.
pub const RESERVED_CLASS: &str = "[0-9]";

/// Reject inputs that already contain a reserved token byte.
pub fn check_precondition(input: &str) -> Result<(), TandemError> {
    if input.chars().any(|c| c.is_ascii_digit()) {
        return Err(TandemError::ReservedToken { class: RESERVED_CLASS.to_string() });
    }
    Ok(())
}

/// Numeric token alphabet `0..n`, single digits first.
pub fn token_alphabet(n: usize) -> Vec<String> {
    (0..n.clamp(1, 100)).map(|i| i.to_string()).collect()
}

/// Run the digit-token beam search.
///
/// The working text carries no inline decoder entries; pattern bodies are
/// emitted separately as a pipe-delimited list, so replacements here only
/// shrink the text.
pub fn solve(
    input: &str,
    opts: &PackerOptions,
    observer: Option<&mut dyn FnMut(Progress)>,
    abort: Option<&AtomicBool>,
) -> Result<BeamOutcome, TandemError> {
    check_precondition(input)?;
    let alphabet = token_alphabet(opts.max_int);
    BeamSolver::new(opts, alphabet, false, CountMode::OverlapWeighted).solve(
        input, observer, abort,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_inputs_are_refused() {
        let err = check_precondition("0 1 2 3 4").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("[0-9]"), "message should name the class: {msg}");
    }

    #[test]
    fn digit_free_inputs_pass() {
        assert!(check_precondition("abcabcabc").is_ok());
    }

    #[test]
    fn alphabet_is_clamped_and_ordered() {
        assert_eq!(token_alphabet(3), vec!["0", "1", "2"]);
        assert_eq!(token_alphabet(0).len(), 1);
        assert_eq!(token_alphabet(1000).len(), 100);
        assert_eq!(token_alphabet(12)[11], "11");
    }

    #[test]
    fn tokens_are_assigned_in_numeric_order() {
        let opts = PackerOptions { look_ahead_depth: 2, ..PackerOptions::default() };
        let out =
            solve("lorem ipsum lorem ipsum lorem ipsum dolor dolor dolor sit", &opts, None, None)
                .unwrap();
        for (i, r) in out.search.replacements.iter().enumerate() {
            assert_eq!(r.token, i.to_string());
        }
    }
}
