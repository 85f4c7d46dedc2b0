use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tandem::{pack_with_strategy, Heuristic, PackerOptions, Strategy};

fn quick_opts() -> PackerOptions {
    PackerOptions { look_ahead_depth: 1, ..PackerOptions::default() }
}

/// Repetitive synthetic inputs with randomised blocks and lengths.
#[test]
fn random_blocky_inputs_roundtrip_on_both_stages() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..6 {
        let block: String = (0..rng.gen_range(4..12))
            .map(|_| char::from(rng.gen_range(b'a'..=b'z')))
            .collect();
        let input = block.repeat(rng.gen_range(3..24));

        for strategy in [Strategy::Crusher(Heuristic::Balanced), Strategy::Beam] {
            let data = pack_with_strategy(&input, &quick_opts(), strategy);
            for stage in &data.result {
                assert!(
                    stage.details.contains("Final check: passed"),
                    "{} on {:?}: {}",
                    data.strategy,
                    input,
                    stage.details
                );
            }
        }
    }
}

/// Mixed corpora: repeated phrases glued with random separators.
#[test]
fn random_phrase_soup_roundtrips() {
    let mut rng = StdRng::seed_from_u64(42);
    let phrases = ["lorem ipsum", "dolor sit amet", "consectetur", "adipiscing elit"];
    for _ in 0..4 {
        let mut input = String::new();
        for _ in 0..rng.gen_range(6..18) {
            input.push_str(phrases[rng.gen_range(0..phrases.len())]);
            input.push(if rng.gen_bool(0.5) { ' ' } else { ';' });
        }
        let data =
            pack_with_strategy(&input, &quick_opts(), Strategy::Crusher(Heuristic::AdaptiveGain));
        for stage in &data.result {
            assert!(
                stage.details.contains("Final check: passed"),
                "{:?}: {}",
                input,
                stage.details
            );
        }
    }
}
