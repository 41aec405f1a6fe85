//! Delimited link/image/reference extraction.
//!
//! Generalizes over an ordered delimiter sequence: four tokens for links,
//! images, and reference usages (`![`/`[`, `]`, `(`/`[`, `)`/`]`), three for
//! reference definitions (`[`, `]`, `:`, with the target running to the end
//! of the line).
//!
//! Scanning is leaf-local and left-to-right. A full match emits plain text
//! before the first delimiter, literal delimiter marker nodes, a label
//! container, and a target container, then continues after the final
//! delimiter. Slack text between located delimiters stays in the tree as
//! plain leaves, and a partial match preserves the unconsumed tail verbatim
//! as a trailing leaf; extraction never drops text.
//!
//! Link targets become literal containers so later passes never re-tokenize
//! URLs; labels stay non-literal so emphasis still renders inside them.

use crate::editing::document::LineId;
use crate::editing::refs::ReferenceRegistry;
use crate::tree::{Container, Node, Tag};

/// Which of the delimited constructs a pass extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkVariant {
    /// `![label](src)`
    Image,
    /// `[label](href)`
    Link,
    /// `[name]: target`
    RefDef,
    /// `![label][name]`
    RefImage,
    /// `[label][name]`
    RefLink,
}

/// Delimiter sequence plus variant. Passes run in declaration order; the
/// inline-literal constructs must run before the pairwise emphasis passes.
#[derive(Debug, Clone, Copy)]
pub struct LinkRule {
    pub delims: &'static [&'static str],
    pub variant: LinkVariant,
}

/// All delimited passes, in the order the render pipeline applies them.
pub const LINK_RULES: [LinkRule; 5] = [
    LinkRule {
        delims: &["![", "]", "(", ")"],
        variant: LinkVariant::Image,
    },
    LinkRule {
        delims: &["[", "]", "(", ")"],
        variant: LinkVariant::Link,
    },
    LinkRule {
        delims: &["[", "]", ":"],
        variant: LinkVariant::RefDef,
    },
    LinkRule {
        delims: &["![", "]", "[", "]"],
        variant: LinkVariant::RefImage,
    },
    LinkRule {
        delims: &["[", "]", "[", "]"],
        variant: LinkVariant::RefLink,
    },
];

/// Side effects collected while extracting one line.
#[derive(Debug, Default)]
pub struct InlineEffects {
    /// Image sources to append as a trailing embed container.
    pub embeds: Vec<String>,
    /// Reference definitions found on the line, applied after the line's
    /// own tree is complete.
    pub defined: Vec<(String, String)>,
}

/// Runs one delimited pass over a child list, recursing into non-literal
/// containers.
pub fn extract_delimited(
    children: &mut Vec<Node>,
    rule: LinkRule,
    refs: &mut ReferenceRegistry,
    line: LineId,
    fx: &mut InlineEffects,
) {
    let old = std::mem::take(children);
    for node in old {
        match node {
            Node::Text(text) => scan_leaf(children, &text, rule, refs, line, fx),
            Node::Container(mut c) => {
                if !c.literal {
                    extract_delimited(&mut c.children, rule, refs, line, fx);
                }
                children.push(Node::Container(c));
            }
            other => children.push(other),
        }
    }
}

fn scan_leaf(
    out: &mut Vec<Node>,
    text: &str,
    rule: LinkRule,
    refs: &mut ReferenceRegistry,
    line: LineId,
    fx: &mut InlineEffects,
) {
    let mut start = 0;
    let mut emitted = false;

    while start < text.len() {
        let Some(positions) = locate(text, start, rule.delims) else {
            break;
        };

        let before = &text[start..positions[0]];
        if !before.is_empty() {
            out.push(Node::Text(before.to_string()));
        }

        let label_start = positions[0] + rule.delims[0].len();
        let label = &text[label_start..positions[1]];
        let target_start = positions[2] + rule.delims[2].len();

        out.push(delim_marker(rule.delims[0]));
        out.push(label_node(rule.variant, label, refs));
        out.push(delim_marker(rule.delims[1]));
        // Anything between the closing label delimiter and the target
        // opener (e.g. `[a] (b)`) stays in the tree.
        let gap = &text[positions[1] + rule.delims[1].len()..positions[2]];
        if !gap.is_empty() {
            out.push(Node::Text(gap.to_string()));
        }
        out.push(delim_marker(rule.delims[2]));

        if rule.delims.len() == 4 {
            let target = &text[target_start..positions[3]];
            out.push(target_node(rule.variant, label, target, refs, line, fx));
            out.push(delim_marker(rule.delims[3]));
            start = positions[3] + rule.delims[3].len();
        } else {
            let target = &text[target_start..];
            out.push(target_node(rule.variant, label, target, refs, line, fx));
            start = text.len();
        }
        emitted = true;
    }

    if !emitted {
        out.push(Node::Text(text.to_string()));
    } else if start < text.len() {
        // Partial later match (or plain trailing text): keep it verbatim.
        out.push(Node::Text(text[start..].to_string()));
    }
}

/// Finds each delimiter in order, every search starting after the end of the
/// previous hit. Returns byte positions, or `None` when any token is absent.
fn locate(text: &str, start: usize, delims: &[&str]) -> Option<Vec<usize>> {
    let mut positions = Vec::with_capacity(delims.len());
    let mut from = start;
    for delim in delims {
        let at = text[from..].find(delim)? + from;
        positions.push(at);
        from = at + delim.len();
    }
    Some(positions)
}

fn delim_marker(token: &str) -> Node {
    Node::Container(Container::with_text(Tag::LinkDelim, token).literal())
}

fn label_node(variant: LinkVariant, label: &str, refs: &mut ReferenceRegistry) -> Node {
    if variant == LinkVariant::RefDef {
        // First use or definition creates the entry, whichever comes first.
        refs.ensure(label);
    }
    Node::Container(Container::with_text(Tag::LinkText, label))
}

fn target_node(
    variant: LinkVariant,
    label: &str,
    target: &str,
    refs: &mut ReferenceRegistry,
    line: LineId,
    fx: &mut InlineEffects,
) -> Node {
    match variant {
        LinkVariant::Link | LinkVariant::Image => {
            let mut c = Container::with_text(Tag::LinkHref, target).literal();
            c.href = Some(target.to_string());
            if variant == LinkVariant::Image && !target.is_empty() {
                fx.embeds.push(target.to_string());
            }
            Node::Container(c)
        }
        LinkVariant::RefLink | LinkVariant::RefImage => {
            let resolved = refs.use_reference(target, line).map(str::to_string);
            let mut c = Container::with_text(Tag::LinkHref, target).literal();
            c.missing = resolved.is_none();
            if variant == LinkVariant::RefImage {
                if let Some(src) = &resolved {
                    fx.embeds.push(src.clone());
                }
            }
            c.href = resolved;
            Node::Container(c)
        }
        LinkVariant::RefDef => {
            // The raw text (leading space included) stays in the tree; the
            // stored target is trimmed. Definition takes effect after the
            // line finishes rendering.
            fx.defined
                .push((label.to_string(), target.trim().to_string()));
            Node::Container(Container::with_text(Tag::LinkText, target).literal())
        }
    }
}
