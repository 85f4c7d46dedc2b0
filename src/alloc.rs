//! Second-stage token allocation.
//!
//! The search strategies decide *what* to replace; this pass decides *which
//! byte* stands for each replacement so that all tokens fit one regex
//! character class. Free bytes are gathered into contiguous ranges, ranges
//! are ranked by how many cheap tokens they contribute per class byte, and
//! replacements are bound outermost-first so that every stored pattern body
//! is free of not-yet-expanded tokens when the decoder reaches it.

use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use crate::bytes::escaped_len;
use crate::error::TandemError;
use crate::options::PackerOptions;
use crate::pattern;
use crate::score::{self, Weights};
use crate::types::Replacement;

const CR: u8 = 0x0D;
const LF: u8 = 0x0A;

/// A contiguous interval of byte values absent from the input.
#[derive(Debug, Clone, Serialize)]
pub struct TokenRange {
    pub first: u8,
    pub last: u8,
    /// Pre-trim extent; the range may grow back up to here.
    pub max_last: u8,
    /// Tokens available in the range.
    pub count: usize,
    /// Byte cost of the range's character-class serialisation.
    pub cost: usize,
    /// Tokens that cost a single output byte (backslash costs two).
    pub one_byte_count: usize,
}

impl TokenRange {
    fn new(first: u8, last: u8) -> Self {
        let mut r = Self { first, last, max_last: last, count: 0, cost: 0, one_byte_count: 0 };
        r.refresh();
        r
    }

    fn contains(&self, b: u8) -> bool {
        self.first <= b && b <= self.last
    }

    fn refresh(&mut self) {
        self.count = (self.last - self.first + 1) as usize;
        self.cost = range_text(self, false).len();
        self.one_byte_count = self.count - usize::from(self.contains(b'\\'));
    }

    fn sort_key(&self) -> f64 {
        10.0 * self.one_byte_count as f64 - self.cost as f64 + self.first as f64 / 1000.0
    }
}

fn class_char(b: u8, at_class_start: bool) -> String {
    match b {
        b'\\' => "\\\\".to_string(),
        b']' => "\\]".to_string(),
        b'-' if !at_class_start => "\\-".to_string(),
        _ => char::from(b).to_string(),
    }
}

fn range_text(r: &TokenRange, at_class_start: bool) -> String {
    let span = (r.last - r.first) as usize;
    match span {
        0 => class_char(r.first, at_class_start),
        1 => format!("{}{}", class_char(r.first, at_class_start), class_char(r.last, false)),
        _ => format!("{}-{}", class_char(r.first, at_class_start), class_char(r.last, false)),
    }
}

/// Scan byte values 1..=126 for maximal runs absent from `original`.
///
/// CR and LF never begin or end a range, though they may sit inside one.
fn discover_ranges(original: &str, delimiter: char) -> Vec<TokenRange> {
    let mut present = [false; 256];
    for b in original.bytes() {
        present[b as usize] = true;
    }
    if delimiter.is_ascii() {
        present[delimiter as usize] = true;
    }

    let mut ranges = Vec::new();
    let mut b = 1u8;
    while b <= 126 {
        if present[b as usize] {
            b += 1;
            continue;
        }
        let mut end = b;
        while end < 126 && !present[(end + 1) as usize] {
            end += 1;
        }
        let mut first = b;
        let mut last = end;
        while first <= last && (first == CR || first == LF) {
            first += 1;
        }
        while last >= first && (last == CR || last == LF) {
            last -= 1;
        }
        if first <= last {
            ranges.push(TokenRange::new(first, last));
        }
        b = end + 1;
    }
    ranges
}

#[derive(Debug, Clone)]
struct Binding {
    original: String,
    /// Provisional token from the search, used as the containment edge id.
    provisional: String,
    depends: Vec<String>,
    used_by: Vec<String>,
    cleared: bool,
    bound: bool,
}

/// Result of the allocation pass.
#[derive(Debug, Clone, Serialize)]
pub struct Allocation {
    /// The rebuilt packed text, decoder entries prepended.
    pub text: String,
    /// Replacements in binding order (the reverse of decode order).
    pub replacements: Vec<Replacement>,
    /// The final character class, ready to splice into `/[...]/`.
    pub char_class: String,
    /// Ranges retained in the class, in serialisation order.
    pub ranges: Vec<TokenRange>,
    pub total_gain: i64,
}

impl Allocation {
    /// Every byte the class matches, whether or not it was consumed.
    pub fn class_members(&self) -> HashSet<char> {
        let mut out = HashSet::new();
        for r in &self.ranges {
            for b in r.first..=r.last {
                out.insert(char::from(b));
            }
        }
        out
    }
}

/// Bind the provisional replacements to character-class tokens.
pub fn allocate(
    original: &str,
    provisional: &[Replacement],
    opts: &PackerOptions,
) -> Result<Allocation, TandemError> {
    let delimiter = opts.delimiter;
    let weights = Weights::from_options(opts);

    let mut ranges = discover_ranges(original, delimiter);
    if ranges.is_empty() {
        return Err(TandemError::NoFreeTokens);
    }
    ranges.sort_by(|a, b| {
        b.sort_key().partial_cmp(&a.sort_key()).unwrap_or(std::cmp::Ordering::Equal)
    });

    // a leading caret would negate the class; shed it when affordable
    if ranges[0].first == b'^' && (provisional.len() < ranges[0].count || ranges.len() == 1) {
        if ranges[0].count == 1 {
            ranges.remove(0);
            if ranges.is_empty() {
                return Err(TandemError::NoFreeTokens);
            }
        } else {
            ranges[0].first += 1;
            ranges[0].refresh();
        }
    }

    // select just enough ranges to cover the replacement count
    let mut selected = Vec::new();
    let mut available = 0usize;
    for r in &ranges {
        if available >= provisional.len() && !selected.is_empty() {
            break;
        }
        selected.push(r.clone());
        available += r.count;
    }

    // cheap tokens first: every one-byte token in range order, backslash last
    let mut supply: Vec<(String, usize, usize)> = Vec::new();
    let mut backslash_range = None;
    for (idx, r) in selected.iter().enumerate() {
        for b in r.first..=r.last {
            if b == b'\\' {
                backslash_range = Some(idx);
                continue;
            }
            supply.push((char::from(b).to_string(), 1, idx));
        }
    }
    if let Some(idx) = backslash_range {
        supply.push(("\\".to_string(), 2, idx));
    }

    // containment edges between fully expanded originals
    let mut bindings: Vec<Binding> = provisional
        .iter()
        .map(|r| Binding {
            original: r.original.clone(),
            provisional: r.token.clone(),
            depends: Vec::new(),
            used_by: Vec::new(),
            cleared: false,
            bound: false,
        })
        .collect();
    for i in 0..bindings.len() {
        for j in 0..bindings.len() {
            if i == j {
                continue;
            }
            if bindings[j].original.contains(&bindings[i].original) {
                let inner = bindings[i].provisional.clone();
                let outer = bindings[j].provisional.clone();
                bindings[j].depends.push(inner);
                bindings[i].used_by.push(outer);
            }
        }
    }

    let unlink = |bindings: &mut [Binding], id: &str| {
        for b in bindings.iter_mut() {
            b.used_by.retain(|t| t != id);
            b.depends.retain(|t| t != id);
        }
    };

    let mut text = original.to_string();
    let mut replacements: Vec<Replacement> = Vec::new();
    let mut total_gain = 0i64;
    let mut supply_at = 0usize;
    let mut consumed: Vec<(usize, u8)> = Vec::new(); // (range idx, byte)

    loop {
        let unbound: Vec<usize> = (0..bindings.len())
            .filter(|&i| !bindings[i].cleared && !bindings[i].bound)
            .collect();
        if unbound.is_empty() {
            break;
        }
        let Some((token, token_cost, range_idx)) = supply.get(supply_at).cloned() else {
            // cursor walked past every range: the rest stays literal
            for i in unbound {
                let id = bindings[i].provisional.clone();
                bindings[i].cleared = true;
                unlink(&mut bindings, &id);
            }
            break;
        };

        let eligible: Vec<usize> =
            unbound.iter().copied().filter(|&i| bindings[i].used_by.is_empty()).collect();
        if eligible.is_empty() {
            return Err(TandemError::Internal(
                "containment graph left no bindable replacement".to_string(),
            ));
        }

        let mut dead: Vec<usize> = Vec::new();
        let mut best: Option<(usize, (f64, i64, f64), usize, i64)> = None;
        for &i in &eligible {
            let copies = pattern::count_occurrences(&text, &bindings[i].original);
            let len = escaped_len(&bindings[i].original, delimiter);
            let gain = score::gain_with_token_cost(copies, len, token_cost);
            if gain <= 0 {
                dead.push(i);
                continue;
            }
            let key = score::selection_key(&weights, gain, len, copies);
            let better = match &best {
                None => true,
                Some((_, held, _, _)) => {
                    key.0 > held.0
                        || (key.0 == held.0 && key.1 > held.1)
                        || (key.0 == held.0 && key.1 == held.1 && key.2 > held.2)
                }
            };
            if better {
                best = Some((i, key, copies, gain));
            }
        }

        if !dead.is_empty() {
            // retiring a dominated pattern may unblock the ones it contains
            for i in dead {
                let id = bindings[i].provisional.clone();
                bindings[i].cleared = true;
                unlink(&mut bindings, &id);
            }
            continue;
        }

        let (idx, key, copies, gain) = match best {
            Some(found) => found,
            None => break,
        };

        let body = bindings[idx].original.clone();
        let replaced = pattern::rewrite(&text, &body, &token);
        text = format!("{}{}{}", body, token, replaced);
        debug!(token = %token, pattern = %body, copies, gain, "bound replacement");

        replacements.push(Replacement {
            token: token.clone(),
            pattern: body.clone(),
            original: body,
            copies,
            gain,
            score: key.0,
        });
        total_gain += gain;
        consumed.push((range_idx, token.as_bytes()[0]));
        bindings[idx].bound = true;
        let id = bindings[idx].provisional.clone();
        unlink(&mut bindings, &id);
        supply_at += 1;
    }

    // keep only ranges that handed out a token; trim the tail of the last
    let mut kept: Vec<TokenRange> = Vec::new();
    let mut kept_high: Vec<u8> = Vec::new();
    for (idx, r) in selected.iter().enumerate() {
        let high = consumed.iter().filter(|(ri, _)| *ri == idx).map(|(_, b)| *b).max();
        if let Some(high) = high {
            kept.push(r.clone());
            kept_high.push(high);
        }
    }
    if let (Some(last), Some(&high)) = (kept.last_mut(), kept_high.last()) {
        if last.last > high {
            last.last = high;
            last.refresh();
        }
    }

    relocate_bracket_endpoints(&mut kept, &mut replacements, &mut text);

    if kept.len() > 1 && kept[0].first == b'^' {
        kept.swap(0, 1);
    }
    // a lone dash is literal only at the front of the class
    if let Some(pos) = kept.iter().position(|r| r.first == b'-' && r.last == b'-') {
        if pos > 0 {
            let dash = kept.remove(pos);
            kept.insert(0, dash);
        }
    }

    let mut char_class = String::new();
    for (i, r) in kept.iter().enumerate() {
        char_class.push_str(&range_text(r, i == 0 && char_class.is_empty()));
    }

    Ok(Allocation { text, replacements, char_class, ranges: kept, total_gain })
}

/// A `]` at a range endpoint costs an escape byte; move such tokens into
/// spare capacity at the end of the final range when possible.
fn relocate_bracket_endpoints(
    kept: &mut Vec<TokenRange>,
    replacements: &mut [Replacement],
    text: &mut String,
) {
    if kept.len() < 2 {
        return;
    }
    let final_idx = kept.len() - 1;
    for i in 0..final_idx {
        let at_start = kept[i].first == b']';
        let at_end = kept[i].last == b']';
        if !at_start && !at_end {
            continue;
        }
        if !replacements.iter().any(|r| r.token == "]") {
            continue;
        }
        // find a spare free byte beyond the final range's trimmed end
        let mut next = kept[final_idx].last.saturating_add(1);
        while next <= kept[final_idx].max_last && (next == CR || next == LF || next == b'\\') {
            next += 1;
        }
        if next > kept[final_idx].max_last {
            continue;
        }

        let replacement_char = char::from(next);
        *text = text.replace(']', &replacement_char.to_string());
        for r in replacements.iter_mut() {
            if r.token == "]" {
                r.token = replacement_char.to_string();
            }
        }
        if at_start {
            kept[i].first += 1;
        } else {
            kept[i].last -= 1;
        }
        if kept[i].first > kept[i].last {
            kept.remove(i);
        } else {
            kept[i].refresh();
        }
        let idx = final_idx.min(kept.len() - 1);
        kept[idx].last = next;
        let last = kept.len() - 1;
        kept[last].refresh();
        break;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crush::{crush, Heuristic};

    fn opts() -> PackerOptions {
        PackerOptions::default()
    }

    #[test]
    fn ranges_skip_present_bytes_and_newlines() {
        let ranges = discover_ranges("abc", '`');
        for r in &ranges {
            assert!(r.first != CR && r.first != LF);
            assert!(r.last != CR && r.last != LF);
            for b in r.first..=r.last {
                assert!(!"abc".as_bytes().contains(&b));
                assert_ne!(b, b'`');
            }
        }
    }

    #[test]
    fn saturated_input_has_no_ranges() {
        let every: String = (1u8..=126).map(char::from).collect();
        assert!(discover_ranges(&every, '`').is_empty());
        let err = allocate(&every, &[], &opts()).unwrap_err();
        assert!(matches!(err, TandemError::NoFreeTokens));
    }

    #[test]
    fn empty_replacement_list_allocates_nothing() {
        let alloc = allocate("hello hello", &[], &opts()).unwrap();
        assert_eq!(alloc.text, "hello hello");
        assert!(alloc.replacements.is_empty());
        assert!(alloc.char_class.is_empty());
    }

    #[test]
    fn class_never_starts_with_caret_or_ends_in_lone_backslash() {
        let text = "She sells seashells by the seashore, The shells she sells are seashells.";
        let search = crush(text, &opts(), Heuristic::Balanced).unwrap();
        let alloc = allocate(text, &search.replacements, &opts()).unwrap();
        assert!(!alloc.char_class.starts_with('^'));
        let trailing = alloc.char_class.chars().rev().take_while(|&c| c == '\\').count();
        assert_eq!(trailing % 2, 0, "class ends with an unescaped backslash");
    }

    #[test]
    fn bound_tokens_are_distinct_free_bytes_with_positive_gain() {
        let text = "a rose is a rose is a rose is a rose";
        let search = crush(text, &opts(), Heuristic::Balanced).unwrap();
        let alloc = allocate(text, &search.replacements, &opts()).unwrap();
        assert!(!alloc.replacements.is_empty());
        let mut seen = HashSet::new();
        for r in &alloc.replacements {
            assert!(r.gain > 0);
            assert!(seen.insert(r.token.clone()));
            assert!(!text.contains(&r.token));
        }
    }

    #[test]
    fn containers_bind_before_their_contents() {
        let text =
            "the quick brown fox jumps; the quick brown fox rests; the quick cat naps; the quick cat sits";
        let search = crush(text, &opts(), Heuristic::Balanced).unwrap();
        let alloc = allocate(text, &search.replacements, &opts()).unwrap();
        for (i, outer) in alloc.replacements.iter().enumerate() {
            for (j, inner) in alloc.replacements.iter().enumerate() {
                if i != j && outer.original.contains(&inner.original) {
                    assert!(
                        i < j,
                        "container {:?} bound after contained {:?}",
                        outer.original,
                        inner.original
                    );
                }
            }
        }
    }
}
