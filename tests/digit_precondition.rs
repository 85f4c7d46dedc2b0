use tandem::{pack_with_strategy, PackerOptions, Strategy};

#[test]
fn digit_input_is_refused_with_the_offending_class() {
    let data = pack_with_strategy("0 1 2 3 4", &PackerOptions::default(), Strategy::Digits);
    let s1 = &data.result[0];
    assert_eq!(s1.length, -1);
    assert!(s1.output.is_empty());
    assert!(s1.details.starts_with("Error:"), "{}", s1.details);
    assert!(s1.details.contains("[0-9]"), "{}", s1.details);
    assert!(data.replacements.is_empty());
}

#[test]
fn a_single_digit_anywhere_is_enough_to_refuse() {
    let data = pack_with_strategy(
        "lots of text lots of text 7 lots of text",
        &PackerOptions::default(),
        Strategy::Digits,
    );
    assert_eq!(data.result[0].length, -1);
    assert!(data.result[0].details.contains("[0-9]"));
}
