use tandem::{pack_with_strategy, Heuristic, PackerOptions, Strategy};

/// Every byte value the allocator could ever hand out.
fn saturated_input() -> String {
    (1u8..=126).map(char::from).collect()
}

#[test]
fn saturated_input_reports_no_tokens_available() {
    let input = saturated_input();
    let data =
        pack_with_strategy(&input, &PackerOptions::default(), Strategy::Crusher(Heuristic::Balanced));
    let s2 = &data.result[1];
    assert_eq!(s2.length, -1);
    assert!(s2.details.contains("no tokens available"), "{}", s2.details);
    // the caller gets the input back untouched
    assert_eq!(s2.output, input);
}

#[test]
fn repeats_without_free_tokens_cannot_be_crushed() {
    // gainful repeats exist, but every printable byte is taken
    let once = saturated_input();
    let input = format!("{once}{once}");
    let data =
        pack_with_strategy(&input, &PackerOptions::default(), Strategy::Crusher(Heuristic::Balanced));
    assert!(data.replacements.is_empty());
    assert!(data.result[0].details.contains("no tokens available"), "{}", data.result[0].details);
    assert_eq!(data.result[1].length, -1);
}
