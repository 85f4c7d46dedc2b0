use clap::Parser;
use std::fs;
use std::path::PathBuf;

use tandem::io_utils::{io_cli_error, simple_cli_error, tandem_cli_error};
use tandem::stats::PackStats;
use tandem::{
    pack, try_pack_with_strategy, Heuristic, PackerOptions, ResultStage, Strategy, TandemError,
};

/// Pack a program into a self-extracting artefact.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Input file path
    input: PathBuf,
    /// Output file path; stdout when omitted
    #[arg(long)]
    output: Option<PathBuf>,
    /// Strategy to run: all, crusher, beam or digits
    #[arg(long, default_value = "all")]
    strategy: String,
    /// Crusher heuristic: balanced, most-copies, longest, density,
    /// adaptive or adaptive-gain
    #[arg(long, default_value = "balanced")]
    heuristic: String,
    /// Beam width
    #[arg(long, default_value_t = 5)]
    beam_width: usize,
    /// Patterns expanded per beam state
    #[arg(long, default_value_t = 20)]
    branch_factor: usize,
    /// Look-ahead depth for beam ranking
    #[arg(long, default_value_t = 150)]
    look_ahead_depth: usize,
    /// Cap on replacements per solution
    #[arg(long, default_value_t = 100)]
    max_replacements: usize,
    /// Sort the beam by cumulative gain instead of predicted score
    #[arg(long)]
    prioritize_highest_gain: bool,
    /// Emit the longer ES5 decoder form
    #[arg(long)]
    es5: bool,
    /// Write the recorded search graph as JSON
    #[arg(long)]
    graph: Option<PathBuf>,
    /// Fail unless the winning artefact passed its decode check
    #[arg(long)]
    test: bool,
}

fn main() {
    tracing_subscriber::fmt::init();
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn parse_heuristic(name: &str) -> Result<Heuristic, Box<dyn std::error::Error>> {
    Ok(match name {
        "balanced" => Heuristic::Balanced,
        "most-copies" => Heuristic::MostCopies,
        "longest" => Heuristic::Longest,
        "density" => Heuristic::Density,
        "adaptive" => Heuristic::Adaptive,
        "adaptive-gain" => Heuristic::AdaptiveGain,
        other => {
            return Err(simple_cli_error(&format!("unknown heuristic '{other}'")).into())
        }
    })
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let source = fs::read_to_string(&args.input)
        .map_err(|e| io_cli_error("reading input file", &args.input, e))?;

    let opts = PackerOptions {
        use_es6: !args.es5,
        beam_width: args.beam_width.max(1),
        branch_factor: args.branch_factor.max(1),
        look_ahead_depth: args.look_ahead_depth,
        max_replacements: args.max_replacements.max(1),
        prioritize_highest_gain: args.prioritize_highest_gain,
        ..PackerOptions::default()
    };
    let heuristic = parse_heuristic(&args.heuristic)?;

    // single-strategy runs report the typed library error with its hint;
    // `all` keeps going so the surviving strategies still compete
    let run_one = |s: Strategy| -> Result<Vec<_>, Box<dyn std::error::Error>> {
        try_pack_with_strategy(&source, &opts, s)
            .map(|data| vec![data])
            .map_err(|e| tandem_cli_error("packing failed", e).into())
    };
    let results = match args.strategy.as_str() {
        "all" => pack(&source, &opts),
        "crusher" => run_one(Strategy::Crusher(heuristic))?,
        "beam" => run_one(Strategy::Beam)?,
        "digits" => run_one(Strategy::Digits)?,
        other => return Err(simple_cli_error(&format!("unknown strategy '{other}'")).into()),
    };

    let stats = PackStats::from_results(&source, &results);
    eprintln!("{}", stats.report());

    let winner: Option<&ResultStage> = results
        .iter()
        .map(|d| d.best_stage())
        .filter(|s| s.length >= 0)
        .min_by_key(|s| s.length);

    let artefact = match winner {
        Some(stage) if (stage.length as usize) < source.len() => {
            if args.test && !stage.details.contains("Final check: passed") {
                let err = TandemError::Verification(
                    "the simulated decode did not reproduce the input".to_string(),
                );
                return Err(tandem_cli_error("decode check", err).into());
            }
            if args.test {
                eprintln!("decode check passed");
            }
            stage.output.clone()
        }
        // nothing beat the input; ship it untouched
        _ => source.clone(),
    };

    if let Some(path) = &args.graph {
        let dump = results
            .iter()
            .find_map(|d| d.search_graph.as_ref())
            .map(|g| g.to_json())
            .transpose()?
            .unwrap_or_else(|| "null".to_string());
        fs::write(path, dump).map_err(|e| io_cli_error("writing graph file", path, e))?;
    }

    match &args.output {
        Some(path) => {
            fs::write(path, &artefact)
                .map_err(|e| io_cli_error("writing output file", path, e))?;
        }
        None => println!("{artefact}"),
    }
    Ok(())
}
