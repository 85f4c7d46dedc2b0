//! Compose the self-extracting artefact and verify its decoder.
//!
//! Three decoder shapes exist. The token-list forms iterate an explicit
//! token string, last-applied token first:
//!
//! ```text
//! _=`<packed>`;for(i of`<tokens>`)with(_.split(i))_=join(shift());eval(_)
//! _=`<packed>`;for(i in G=`<tokens>`)with(_.split(G[i]))_=join(shift());eval(_)
//! ```
//!
//! The character-class form discovers the next token itself; the first
//! class byte in the packed string is always the most recently applied
//! token, because every stored pattern body is token-free by the time the
//! decoder reaches it:
//!
//! ```text
//! for(_=`<packed>`;G=/[<class>]/.exec(_);)with(_.split(G))_=join(shift());eval(_)
//! ```
//!
//! The digit form restores every numeric token from a pipe-delimited list
//! of fully expanded bodies in a single pass:
//!
//! ```text
//! eval(`<packed>`.replace(/\d/g,i=>`<b0>|<b1>|…`.split`|`[i]))
//! ```
//!
//! Every build runs the matching decode simulation over the packed text and
//! compares the result byte-for-byte with the original input.

use std::collections::HashSet;

use crate::bytes::escape;
use crate::options::PackerOptions;

/// Decoder shape plus everything its glue needs.
pub enum DecoderForm {
    /// Explicit token string; `tokens` in application order.
    TokenList { es6: bool, tokens: Vec<String> },
    /// Regex character class over single-byte tokens.
    CharClass { class: String, members: HashSet<char> },
    /// Numeric tokens mapped through a pipe-delimited body list.
    Digits { bodies: Vec<String>, multi: bool },
}

/// A finished artefact with its verification verdict.
#[derive(Debug, Clone)]
pub struct Artefact {
    pub output: String,
    pub length: i64,
    pub verified: bool,
    pub details: String,
}

/// Build the artefact for `packed` and verify it decodes back to `original`.
pub fn build(original: &str, packed: &str, form: &DecoderForm, opts: &PackerOptions) -> Artefact {
    let d = opts.delimiter;
    let v = opts.packed_var;
    let lit = escape(packed, d);
    let wrap = &opts.wrapped_init;
    let env = &opts.environment;
    let interp = opts.interpreter_call();

    let output = match form {
        DecoderForm::TokenList { es6, tokens } => {
            let mut order: Vec<&str> = tokens.iter().map(String::as_str).collect();
            order.reverse();
            let toks = escape(&order.concat(), d);
            if *es6 {
                format!(
                    "{v}={d}{lit}{d};for(i of{d}{toks}{d})with({v}.split(i)){v}=join(shift({wrap}));{env}{interp}"
                )
            } else {
                format!(
                    "{v}={d}{lit}{d};for(i in G={d}{toks}{d})with({v}.split(G[i])){v}=join(shift({wrap}));{env}{interp}"
                )
            }
        }
        DecoderForm::CharClass { class, .. } => {
            format!(
                "for({v}={d}{lit}{d};G=/[{class}]/.exec({v});)with({v}.split(G)){v}=join(shift({wrap}));{env}{interp}"
            )
        }
        DecoderForm::Digits { bodies, multi } => {
            let list =
                bodies.iter().map(|b| escape(b, d)).collect::<Vec<_>>().join("|");
            let re = if *multi { "\\d+" } else { "\\d" };
            format!("eval({d}{lit}{d}.replace(/{re}/g,i=>{d}{list}{d}.split{d}|{d}[i]))")
        }
    };

    let decoded = simulate(packed, form);
    let verified = decoded == original;
    let details = format!(
        "input {} bytes, packed {} bytes, artefact {} bytes\nFinal check: {}",
        original.len(),
        packed.len(),
        output.len(),
        if verified { "passed" } else { "failed" }
    );

    Artefact { length: output.len() as i64, output, verified, details }
}

/// Run the decode the emitted artefact would perform.
pub fn simulate(packed: &str, form: &DecoderForm) -> String {
    match form {
        DecoderForm::TokenList { tokens, .. } => simulate_token_list(packed, tokens),
        DecoderForm::CharClass { members, .. } => simulate_char_class(packed, members),
        DecoderForm::Digits { bodies, multi } => simulate_digits(packed, bodies, *multi),
    }
}

/// `split`/`shift`/`join` once per token, last-applied first. The chunk
/// before the first token occurrence is the stored body; re-joining with it
/// restores every occurrence at once.
fn simulate_token_list(packed: &str, tokens: &[String]) -> String {
    let mut text = packed.to_string();
    for t in tokens.iter().rev() {
        let parts: Vec<&str> = text.split(t.as_str()).collect();
        if parts.len() <= 1 {
            continue;
        }
        let body = parts[0].to_string();
        text = parts[1..].join(&body);
    }
    text
}

/// Expand whichever class member appears first until none remain. Each
/// round erases that member entirely, so the loop finishes after at most
/// one round per member.
fn simulate_char_class(packed: &str, members: &HashSet<char>) -> String {
    let mut text = packed.to_string();
    loop {
        let Some(token) = text.chars().find(|c| members.contains(c)) else {
            break;
        };
        let sep = token.to_string();
        let parts: Vec<&str> = text.split(sep.as_str()).collect();
        let body = parts[0].to_string();
        text = parts[1..].join(&body);
    }
    text
}

/// Single left-to-right pass; replaced bodies are not rescanned, matching
/// a regex `replace`. An out-of-range index yields the literal
/// `undefined`, as the target runtime would produce.
fn simulate_digits(packed: &str, bodies: &[String], multi: bool) -> String {
    let mut out = String::new();
    let mut chars = packed.chars().peekable();
    while let Some(c) = chars.next() {
        if !c.is_ascii_digit() {
            out.push(c);
            continue;
        }
        let mut run = c.to_string();
        if multi {
            while let Some(&next) = chars.peek() {
                if next.is_ascii_digit() {
                    run.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
        }
        match run.parse::<usize>().ok().and_then(|i| bodies.get(i)) {
            Some(body) => out.push_str(body),
            None => out.push_str("undefined"),
        }
    }
    out
}
