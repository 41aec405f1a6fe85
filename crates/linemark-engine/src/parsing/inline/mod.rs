//! Inline extraction: ordered tree-rewriting passes over a line's nodes.
//!
//! Pass order is fixed and matters. The delimited constructs run first
//! because they mint literal containers (targets, delimiter markers) that
//! the later passes must not re-tokenize; code spans run before emphasis so
//! backticked text is opaque to `**`/`*`/`_`.

pub mod delimited;
pub mod span;

pub use delimited::{InlineEffects, LINK_RULES, LinkRule, LinkVariant, extract_delimited};
pub use span::{SpanRule, extract_spans};

use crate::editing::document::LineId;
use crate::editing::refs::ReferenceRegistry;
use crate::tree::Node;

/// Applies every inline pass to a line's children.
pub fn run_passes(
    children: &mut Vec<Node>,
    line: LineId,
    refs: &mut ReferenceRegistry,
    fx: &mut InlineEffects,
) {
    for rule in LINK_RULES {
        extract_delimited(children, rule, refs, line, fx);
    }
    for rule in [
        SpanRule::CODE,
        SpanRule::BOLD,
        SpanRule::ITALIC,
        SpanRule::UNDERLINE,
    ] {
        extract_spans(children, rule);
    }
}
