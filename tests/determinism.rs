use quickcheck::{quickcheck, TestResult};
use tandem::{pack_with_strategy, Heuristic, PackerOptions, Strategy};

fn quick_opts() -> PackerOptions {
    PackerOptions { look_ahead_depth: 2, ..PackerOptions::default() }
}

#[test]
fn repeated_packs_are_byte_identical() {
    let source = "She sells seashells by the seashore, she sells seashore shells, \
she sells, she sells, seashore seashore.";
    for strategy in [
        Strategy::Crusher(Heuristic::Balanced),
        Strategy::Crusher(Heuristic::Adaptive),
        Strategy::Beam,
        Strategy::Digits,
    ] {
        let a = pack_with_strategy(source, &quick_opts(), strategy);
        let b = pack_with_strategy(source, &quick_opts(), strategy);
        assert_eq!(a.result[0].output, b.result[0].output, "{}", a.strategy);
        assert_eq!(a.result[1].output, b.result[1].output, "{}", a.strategy);
        assert_eq!(a.replacements.len(), b.replacements.len());
    }
}

#[test]
fn crusher_idempotence_on_arbitrary_ascii() {
    fn prop(raw: String) -> TestResult {
        // restrict to printable non-digit ASCII so every strategy applies
        let source: String = raw
            .chars()
            .filter(|c| c.is_ascii_graphic() || *c == ' ')
            .filter(|c| !c.is_ascii_digit())
            .take(80)
            .collect();
        let opts = PackerOptions { look_ahead_depth: 1, ..PackerOptions::default() };
        let a = pack_with_strategy(&source, &opts, Strategy::Crusher(Heuristic::Balanced));
        let b = pack_with_strategy(&source, &opts, Strategy::Crusher(Heuristic::Balanced));
        TestResult::from_bool(
            a.result[0].output == b.result[0].output && a.result[1].output == b.result[1].output,
        )
    }
    quickcheck(prop as fn(String) -> TestResult);
}
