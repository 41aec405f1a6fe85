//! Pairwise delimiter extraction (code, bold, italic, underline).
//!
//! Splits text leaves on a literal delimiter string. Odd-position substrings
//! sit between a delimiter pair and get wrapped (delimiters included, so the
//! tree stays textually lossless); a trailing odd substring means the final
//! delimiter is unmatched, and its raw text is handed back to the previous
//! leaf untouched. First occurrence always opens, second always closes, so
//! same-delimiter spans never nest.

use crate::tree::{Container, Node, Tag};

/// One pairwise extraction pass.
#[derive(Debug, Clone, Copy)]
pub struct SpanRule {
    pub delim: &'static str,
    pub tag: Tag,
    /// Literal spans (code) are opaque to every later pass.
    pub literal: bool,
}

impl SpanRule {
    pub const CODE: SpanRule = SpanRule {
        delim: "`",
        tag: Tag::Code,
        literal: true,
    };
    pub const BOLD: SpanRule = SpanRule {
        delim: "**",
        tag: Tag::Bold,
        literal: false,
    };
    pub const ITALIC: SpanRule = SpanRule {
        delim: "*",
        tag: Tag::Italic,
        literal: false,
    };
    pub const UNDERLINE: SpanRule = SpanRule {
        delim: "_",
        tag: Tag::Underline,
        literal: false,
    };
}

/// Runs one pairwise pass over a child list, recursing into non-literal
/// containers. Children are taken out and rebuilt rather than mutated in
/// place while iterating.
pub fn extract_spans(children: &mut Vec<Node>, rule: SpanRule) {
    let old = std::mem::take(children);
    for node in old {
        match node {
            Node::Text(text) => split_leaf(children, &text, rule),
            Node::Container(mut c) => {
                if !c.literal {
                    extract_spans(&mut c.children, rule);
                }
                children.push(Node::Container(c));
            }
            other => children.push(other),
        }
    }
}

fn split_leaf(out: &mut Vec<Node>, text: &str, rule: SpanRule) {
    let parts: Vec<&str> = text.split(rule.delim).collect();
    if parts.len() == 1 {
        out.push(Node::Text(text.to_string()));
        return;
    }

    let last = parts.len() - 1;
    for (i, part) in parts.iter().enumerate() {
        if i % 2 == 1 && i != last {
            let mut span = Container::with_text(
                rule.tag,
                format!("{delim}{part}{delim}", delim = rule.delim),
            );
            span.literal = rule.literal;
            out.push(Node::Container(span));
        } else if i % 2 == 1 {
            // Unmatched trailing delimiter: restore it as plain text, merged
            // into the previous leaf when there is one.
            let tail = format!("{}{}", rule.delim, part);
            match out.last_mut() {
                Some(Node::Text(prev)) => prev.push_str(&tail),
                _ => out.push(Node::Text(tail)),
            }
        } else if !part.is_empty() {
            out.push(Node::Text(part.to_string()));
        }
    }
}
