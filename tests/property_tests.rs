use proptest::prelude::*;
use std::collections::HashSet;
use tandem::{pack_with_strategy, Heuristic, PackerOptions, Strategy};

fn quick_opts() -> PackerOptions {
    PackerOptions { look_ahead_depth: 1, ..PackerOptions::default() }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn crusher_roundtrip_random(source in "[a-z ]{0,120}") {
        let data =
            pack_with_strategy(&source, &quick_opts(), Strategy::Crusher(Heuristic::Balanced));
        for stage in &data.result {
            if stage.length >= 0 {
                prop_assert!(
                    stage.details.contains("Final check: passed"),
                    "{}", stage.details
                );
            }
        }
    }

    #[test]
    fn beam_roundtrip_random(source in "[a-zA-Z ,.]{0,100}") {
        let data = pack_with_strategy(&source, &quick_opts(), Strategy::Beam);
        for stage in &data.result {
            if stage.length >= 0 {
                prop_assert!(
                    stage.details.contains("Final check: passed"),
                    "{}", stage.details
                );
            }
        }
    }

    #[test]
    fn bound_replacements_have_positive_gain_and_distinct_tokens(
        source in "[a-z !?]{0,120}"
    ) {
        let data =
            pack_with_strategy(&source, &quick_opts(), Strategy::Crusher(Heuristic::Balanced));
        let mut tokens = HashSet::new();
        for r in &data.replacements {
            prop_assert!(r.gain > 0);
            prop_assert!(tokens.insert(r.token.clone()), "token {:?} reused", r.token);
            prop_assert!(!source.contains(&r.token));
        }
    }

    #[test]
    fn digit_roundtrip_random(source in "[a-z ]{0,80}") {
        let data = pack_with_strategy(&source, &quick_opts(), Strategy::Digits);
        let s1 = &data.result[0];
        if s1.length >= 0 {
            prop_assert!(s1.details.contains("Final check: passed"), "{}", s1.details);
        }
    }
}
