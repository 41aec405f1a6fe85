//! Line classification.
//!
//! Maps a line's raw text, plus limited context about its previous sibling,
//! to a block class. Classification is total: every string classifies, and
//! the rules are evaluated in strict priority order (first match wins).

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::fences::{CodeFence, FenceKind};

/// Maximum heading level; extra `#` characters do not deepen the heading.
pub const MAX_HEADING_LEVEL: u8 = 6;

/// Ordered vs unordered list marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ListKind {
    Ordered,
    Unordered,
}

/// The classifier's verdict for one line of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    Fence(FenceKind),
    IndentedCode,
    Heading(u8),
    Separator,
    List(ListKind),
    Paragraph,
}

/// What the classifier needs to know about the previous sibling line.
///
/// Only the indented-code rule consults context, so this stays minimal.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrevLine {
    /// Previous sibling is classified as an indented code block.
    pub indented_code: bool,
    /// Previous sibling's text is empty or all-whitespace.
    pub blank: bool,
}

fn unordered_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*-\s").expect("invalid unordered-list regex"))
}

fn ordered_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*[0-9A-Za-z]+[.):]\s").expect("invalid ordered-list regex"))
}

fn separator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^---").expect("invalid separator regex"))
}

fn indented_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s{4}").expect("invalid indented-code regex"))
}

/// Returns true for empty or all-whitespace text.
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Counts leading `#` characters, capped at [`MAX_HEADING_LEVEL`].
pub fn heading_level(text: &str) -> u8 {
    let mut level = 0u8;
    for c in text.chars() {
        if c != '#' || level == MAX_HEADING_LEVEL {
            break;
        }
        level += 1;
    }
    level
}

/// Classifies one line.
///
/// An indented line only counts as code when it continues an existing code
/// block or starts one after a blank (or absent) line. That guard keeps
/// ordinary 4-space-indented paragraphs out of code blocks.
pub fn classify(text: &str, prev: Option<PrevLine>) -> LineClass {
    if let Some(kind) = CodeFence::sig(text) {
        return LineClass::Fence(kind);
    }
    if indented_re().is_match(text) {
        let continues = match prev {
            None => true,
            Some(p) => p.indented_code || p.blank,
        };
        if continues {
            return LineClass::IndentedCode;
        }
    }
    if text.starts_with('#') {
        return LineClass::Heading(heading_level(text));
    }
    if separator_re().is_match(text) {
        return LineClass::Separator;
    }
    if unordered_re().is_match(text) {
        return LineClass::List(ListKind::Unordered);
    }
    if ordered_re().is_match(text) {
        return LineClass::List(ListKind::Ordered);
    }
    LineClass::Paragraph
}
