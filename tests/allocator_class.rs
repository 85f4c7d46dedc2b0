use tandem::alloc::allocate;
use tandem::crush::{crush, Heuristic};
use tandem::PackerOptions;

fn class_is_well_formed(class: &str) {
    assert!(!class.starts_with('^'), "class negated: [{class}]");
    let trailing_backslashes = class.chars().rev().take_while(|&c| c == '\\').count();
    assert_eq!(trailing_backslashes % 2, 0, "unescaped trailing backslash: [{class}]");
    if class.ends_with('-') && class != "-" {
        assert!(class.ends_with("\\-"), "trailing dash is a metacharacter: [{class}]");
    }
    assert!(!class.contains('\r') && !class.contains('\n'), "raw newline in class: [{class}]");
}

fn check(source: &str) {
    let opts = PackerOptions::default();
    let search = crush(source, &opts, Heuristic::Balanced).unwrap();
    let alloc = allocate(source, &search.replacements, &opts).unwrap();
    class_is_well_formed(&alloc.char_class);

    // every token byte is a class member and absent from the input
    let members = alloc.class_members();
    for r in &alloc.replacements {
        for c in r.token.chars() {
            assert!(members.contains(&c), "token {:?} outside class [{}]", r.token, alloc.char_class);
        }
        assert!(!source.contains(&r.token));
    }
}

#[test]
fn classes_are_well_formed_across_inputs() {
    check("She sells seashells by the seashore, she sells seashore shells, again and again.");
    check("function f(){return 1+1}\nfunction g(){return 1+1}\nfunction h(){return 1+1}\n".replace('1', "one").as_str());
    check("aaaa bbbb aaaa bbbb aaaa bbbb cccc dddd cccc dddd");
    check("to be or not to be, that is the question; to be or not to be.");
}

#[test]
fn newline_heavy_input_keeps_newlines_out_of_token_positions() {
    let source = "line one\nline two\nline one\nline two\nline one\nline two\n";
    let opts = PackerOptions::default();
    let search = crush(source, &opts, Heuristic::Balanced).unwrap();
    let alloc = allocate(source, &search.replacements, &opts).unwrap();
    for r in &alloc.replacements {
        assert!(r.token != "\n" && r.token != "\r");
    }
    class_is_well_formed(&alloc.char_class);
}

#[test]
fn dependency_order_restores_contained_patterns_first() {
    // decode walks the bound list backwards, so a pattern contained in
    // another must be bound later to be expanded earlier
    let source = "int alpha = beta + gamma; int delta = beta + gamma; \
int alpha2 = beta + gamma; int alpha3 = beta;";
    let opts = PackerOptions::default();
    let search = crush(source, &opts, Heuristic::Balanced).unwrap();
    let alloc = allocate(source, &search.replacements, &opts).unwrap();
    for (i, a) in alloc.replacements.iter().enumerate() {
        for (j, b) in alloc.replacements.iter().enumerate() {
            if i != j && a.original.contains(&b.original) {
                assert!(i < j, "{:?} must bind before contained {:?}", a.original, b.original);
            }
        }
    }
}
