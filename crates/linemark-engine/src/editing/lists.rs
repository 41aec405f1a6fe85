//! List depth, marker normalization, and marker succession.
//!
//! Depth is derived from indentation relative to preceding list items: a
//! flat list is depth 1, and depth grows only where indentation strictly
//! decreases walking backward through the list. Successor markers increment
//! numerically or alphabetically (with carry) and end in a non-breaking
//! space so a freshly inserted marker survives host whitespace handling.

use std::sync::OnceLock;

use regex::Regex;

use crate::editing::document::{BlockKind, Document};

/// Deepest list nesting the engine will produce.
pub const MAX_LIST_DEPTH: usize = 6;

/// Appended after generated markers.
pub const MARKER_SPACE: char = '\u{a0}';

const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

fn marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(-|[0-9A-Za-z]+[.):])\s").expect("invalid list-marker regex")
    })
}

/// Leading whitespace of `text` as (char count, byte length).
pub fn leading_whitespace(text: &str) -> (usize, usize) {
    let mut chars = 0;
    let mut bytes = 0;
    for c in text.chars() {
        if !c.is_whitespace() {
            break;
        }
        chars += 1;
        bytes += c.len_utf8();
    }
    (chars, bytes)
}

/// Computes the nesting depth of the list item at `index`.
///
/// Walks preceding siblings while they are list items; each time a sibling
/// is indented less than anything seen so far, this item sits one level
/// deeper inside it.
pub fn depth_of(doc: &Document, index: usize) -> usize {
    let Some(block) = doc.line_at(index) else {
        return 1;
    };
    let (mut min_indent, _) = leading_whitespace(&block.raw_text);

    let mut depth = 1;
    for i in (0..index).rev() {
        let Some(sibling) = doc.line_at(i) else {
            break;
        };
        if !matches!(sibling.classification, BlockKind::ListItem { .. }) {
            break;
        }
        let (indent, _) = leading_whitespace(&sibling.raw_text);
        if indent < min_indent {
            depth += 1;
            min_indent = indent;
        }
    }
    depth
}

/// Replaces the leading whitespace run with exactly `depth` spaces.
pub fn fix_list_element_spaces(text: &str, depth: usize) -> String {
    let (_, bytes) = leading_whitespace(text);
    format!("{}{}", " ".repeat(depth), &text[bytes..])
}

/// Strips the leading whitespace and list marker, if any.
pub fn strip_marker(text: &str) -> &str {
    match marker_re().find(text) {
        Some(m) => &text[m.end()..],
        None => {
            let (_, bytes) = leading_whitespace(text);
            &text[bytes..]
        }
    }
}

/// Derives the marker that continues the list item in `text`.
///
/// Preserves leading whitespace. Numeric markers increment as integers;
/// alphabetic markers increment within their alphabet with wraparound and
/// carry (`z` → `aa`). Unordered markers repeat the bullet. The result ends
/// in a non-breaking space.
pub fn next_marker(text: &str) -> String {
    let (_, ws_bytes) = leading_whitespace(text);
    let spacing = &text[..ws_bytes];
    let rest = &text[ws_bytes..];

    let token_len = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .count();
    if token_len > 0 {
        let token = &rest[..token_len];
        let successor = marker_successor(token);
        let divider = rest[token_len..].chars().next().unwrap_or('.');
        return format!("{spacing}{successor}{divider}{MARKER_SPACE}");
    }

    // Unordered bullet: carry it over unchanged.
    let bullet = rest.chars().next().unwrap_or('-');
    format!("{spacing}{bullet}{MARKER_SPACE}")
}

fn marker_successor(token: &str) -> String {
    if token.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(n) = token.parse::<u64>() {
            return (n + 1).to_string();
        }
    }
    if token.chars().all(|c| c.is_ascii_lowercase()) {
        return increment_string(LOWER, token);
    }
    if token.chars().all(|c| c.is_ascii_uppercase()) {
        return increment_string(UPPER, token);
    }
    // Mixed-alphabet markers have no defined successor.
    "?".to_string()
}

/// Increments `s` within `alphabet`, carrying right-to-left; a full
/// overflow prepends the alphabet's first character (`zz` → `aaa`).
fn increment_string(alphabet: &str, s: &str) -> String {
    let letters: Vec<char> = alphabet.chars().collect();
    let last = *letters.last().expect("alphabet is non-empty");

    let mut chars: Vec<char> = s.chars().collect();
    for i in (0..chars.len()).rev() {
        if chars[i] == last {
            chars[i] = letters[0];
        } else {
            let pos = letters.iter().position(|c| *c == chars[i]).unwrap_or(0);
            chars[i] = letters[pos + 1];
            return chars.into_iter().collect();
        }
    }
    let mut out = String::new();
    out.push(letters[0]);
    out.extend(chars);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1. first", "2.\u{a0}")]
    #[case("12) x", "13)\u{a0}")]
    #[case("  3. x", "  4.\u{a0}")]
    #[case("a. x", "b.\u{a0}")]
    #[case("z: x", "aa:\u{a0}")]
    #[case("az. x", "ba.\u{a0}")]
    #[case("Z. x", "AA.\u{a0}")]
    #[case("- item", "-\u{a0}")]
    #[case("  - item", "  -\u{a0}")]
    fn marker_succession(#[case] line: &str, #[case] expected: &str) {
        assert_eq!(next_marker(line), expected);
    }

    #[rstest]
    #[case("- a", "a")]
    #[case("  - a", "a")]
    #[case("1. a", "a")]
    #[case("12) a", "a")]
    #[case("  plain", "plain")]
    #[case("- ", "")]
    fn marker_stripping(#[case] line: &str, #[case] expected: &str) {
        assert_eq!(strip_marker(line), expected);
    }

    #[rstest]
    #[case("- x", 2, "  - x")]
    #[case("   - x", 1, " - x")]
    #[case("- x", 0, "- x")]
    fn space_fixing(#[case] line: &str, #[case] depth: usize, #[case] expected: &str) {
        assert_eq!(fix_list_element_spaces(line, depth), expected);
    }

    #[test]
    fn increment_wraps_and_carries() {
        assert_eq!(increment_string(LOWER, "ab"), "ac");
        assert_eq!(increment_string(LOWER, "az"), "ba");
        assert_eq!(increment_string(LOWER, "zz"), "aaa");
    }

    #[test]
    fn leading_whitespace_counts_chars_and_bytes() {
        assert_eq!(leading_whitespace("  x"), (2, 2));
        assert_eq!(leading_whitespace("\u{a0}x"), (1, 2));
        assert_eq!(leading_whitespace("x"), (0, 0));
    }
}
