//! Self-extracting repeated-substring packer.
//!
//! Short programs for dynamic-language runtimes are compressed by replacing
//! repeated substrings with single-byte tokens and emitting a packed string
//! literal together with a tiny decoder that reverses the substitutions at
//! run time. The optimised metric is the byte length of the complete
//! self-extracting artefact, decoder included.

pub mod alloc;
pub mod artefact;
pub mod beam;
pub mod bytes;
pub mod crush;
pub mod digits;
pub mod error;
pub mod graph;
pub mod io_utils;
pub mod options;
pub mod pattern;
pub mod predict;
pub mod score;
pub mod stats;
pub mod types;
pub mod worker;

pub use crush::Heuristic;
pub use error::TandemError;
pub use options::PackerOptions;
pub use types::{PackerData, Progress, Replacement, ResultStage};

use std::sync::atomic::AtomicBool;
use tracing::info;

use artefact::DecoderForm;
use graph::SearchGraph;
use types::SearchOutcome;

/// The interchangeable search strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Crusher(Heuristic),
    Beam,
    Digits,
}

impl Strategy {
    pub fn name(&self) -> String {
        match self {
            Strategy::Crusher(h) => format!("crusher/{}", h.name()),
            Strategy::Beam => "beam".to_string(),
            Strategy::Digits => "digits".to_string(),
        }
    }
}

/// Pack `input` with every strategy and return one result per strategy.
pub fn pack(input: &str, opts: &PackerOptions) -> Vec<PackerData> {
    [
        Strategy::Crusher(Heuristic::Balanced),
        Strategy::Beam,
        Strategy::Digits,
    ]
    .into_iter()
    .map(|s| pack_with_strategy(input, opts, s))
    .collect()
}

/// Pack with one strategy. Total: failures come back as an error-shaped
/// result rather than an `Err`.
pub fn pack_with_strategy(input: &str, opts: &PackerOptions, strategy: Strategy) -> PackerData {
    match try_pack_with_strategy(input, opts, strategy) {
        Ok(data) => data,
        Err(e) => PackerData::from_error(&strategy.name(), input, &e.to_string()),
    }
}

/// Fallible variant of [`pack_with_strategy`] for callers that want the
/// typed error, such as the CLI.
pub fn try_pack_with_strategy(
    input: &str,
    opts: &PackerOptions,
    strategy: Strategy,
) -> Result<PackerData, TandemError> {
    match strategy {
        Strategy::Crusher(h) => {
            let search = crush::crush(input, opts, h)?;
            assemble(input, opts, &strategy.name(), search, None, Stage1Form::TokenList)
        }
        Strategy::Beam => {
            let out = beam::solve(input, opts)?;
            assemble(
                input,
                opts,
                &strategy.name(),
                out.search,
                Some(out.graph),
                Stage1Form::TokenList,
            )
        }
        Strategy::Digits => digit_data(input, opts, None, None).map(|(data, _)| data),
    }
}

enum Stage1Form {
    TokenList,
    Digits,
}

/// Digit-strategy run shared by the synchronous path and the worker.
/// Returns the packed data and whether a budget cut the search short.
pub(crate) fn digit_data(
    input: &str,
    opts: &PackerOptions,
    observer: Option<&mut dyn FnMut(Progress)>,
    abort: Option<&AtomicBool>,
) -> Result<(PackerData, bool), TandemError> {
    let out = digits::solve(input, opts, observer, abort)?;
    let stopped = out.search.stopped_by_budget;
    let data = assemble(
        input,
        opts,
        &Strategy::Digits.name(),
        out.search,
        Some(out.graph),
        Stage1Form::Digits,
    )?;
    Ok((data, stopped))
}

fn assemble(
    input: &str,
    opts: &PackerOptions,
    name: &str,
    search: SearchOutcome,
    search_graph: Option<SearchGraph>,
    form: Stage1Form,
) -> Result<PackerData, TandemError> {
    let stage1 = build_stage1(input, opts, &search, &form)?;
    let (stage2, bound) = build_stage2(input, opts, &search)?;
    let replacements = bound.unwrap_or_else(|| search.replacements.clone());
    let matches_lookup =
        replacements.iter().map(|r| (r.token.clone(), r.clone())).collect();

    info!(
        strategy = name,
        input = input.len(),
        stage1 = stage1.length,
        stage2 = stage2.length,
        replacements = replacements.len(),
        "packed"
    );
    Ok(PackerData {
        strategy: name.to_string(),
        original: input.to_string(),
        replacements,
        matches_lookup,
        result: [stage1, stage2],
        search_graph,
    })
}

fn build_stage1(
    input: &str,
    opts: &PackerOptions,
    search: &SearchOutcome,
    form: &Stage1Form,
) -> Result<ResultStage, TandemError> {
    let art = match form {
        Stage1Form::TokenList => {
            let tokens = search.replacements.iter().map(|r| r.token.clone()).collect();
            artefact::build(
                input,
                &search.text,
                &DecoderForm::TokenList { es6: opts.use_es6, tokens },
                opts,
            )
        }
        Stage1Form::Digits => {
            let bodies: Vec<String> =
                search.replacements.iter().map(|r| r.original.clone()).collect();
            if bodies.iter().any(|b| b.contains('|')) {
                return Err(TandemError::Config(
                    "a pattern body contains the list separator '|'".to_string(),
                ));
            }
            artefact::build(
                input,
                &search.text,
                &DecoderForm::Digits { bodies, multi: opts.max_int > 10 },
                opts,
            )
        }
    };

    let mut details = art.details;
    if search.replacements.is_empty() {
        let note = if search.tokens_exhausted { "no tokens available" } else { "no gain found" };
        details = format!("{note}\n{details}");
    }
    Ok(ResultStage {
        length: art.length,
        output: art.output,
        details,
        transform: Some(search.text.clone()),
        is_running: false,
    })
}

fn build_stage2(
    input: &str,
    opts: &PackerOptions,
    search: &SearchOutcome,
) -> Result<(ResultStage, Option<Vec<Replacement>>), TandemError> {
    let allocation = match alloc::allocate(input, &search.replacements, opts) {
        Ok(a) => a,
        Err(TandemError::NoFreeTokens) => {
            // surface the input untouched; the caller decides what to ship
            let stage = ResultStage {
                length: -1,
                output: input.to_string(),
                details: "no tokens available".to_string(),
                transform: None,
                is_running: false,
            };
            return Ok((stage, None));
        }
        Err(e) => return Err(e),
    };

    let members = allocation.class_members();
    let art = artefact::build(
        input,
        &allocation.text,
        &DecoderForm::CharClass { class: allocation.char_class.clone(), members },
        opts,
    );
    let mut details = format!("class [{}]\n{}", allocation.char_class, art.details);
    if allocation.replacements.is_empty() {
        details = format!("no gain found\n{details}");
    }
    let stage = ResultStage {
        length: art.length,
        output: art.output,
        details,
        transform: Some(allocation.text.clone()),
        is_running: false,
    };
    Ok((stage, Some(allocation.replacements)))
}
