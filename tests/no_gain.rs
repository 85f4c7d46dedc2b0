use tandem::{pack_with_strategy, Heuristic, PackerOptions, Strategy};

/// A thousand distinct code points: no substring of length two repeats.
fn repeat_free_input() -> String {
    (0..1000u32).map(|i| char::from_u32(0x4E00 + i).unwrap()).collect()
}

#[test]
fn crusher_leaves_repeat_free_input_unchanged() {
    let input = repeat_free_input();
    let data =
        pack_with_strategy(&input, &PackerOptions::default(), Strategy::Crusher(Heuristic::Balanced));
    assert!(data.replacements.is_empty());
    let s1 = &data.result[0];
    assert!(s1.details.contains("no gain found"), "{}", s1.details);
    assert!(s1.length as usize >= input.len());
    assert!(s1.details.contains("Final check: passed"));
    assert_eq!(s1.transform.as_deref(), Some(input.as_str()));
}

#[test]
fn beam_leaves_repeat_free_input_unchanged() {
    let input = repeat_free_input();
    let data = pack_with_strategy(&input, &PackerOptions::default(), Strategy::Beam);
    assert!(data.replacements.is_empty());
    let s1 = &data.result[0];
    assert!(s1.details.contains("no gain found"), "{}", s1.details);
    assert!(s1.length as usize >= input.len());
}
