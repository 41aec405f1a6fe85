//! Serializable document snapshots.
//!
//! Hosts and tests read the rendered state through these plain data
//! structures instead of walking the live trees. Also home to the
//! round-trip check every rendered document must satisfy: a line's tree
//! text equals its raw text.

use serde::Serialize;

use crate::editing::document::{BlockKind, Document, LineId};
use crate::tree::{Node, Tag};

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct DocSnapshot {
    pub lines: Vec<LineSnapshot>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct LineSnapshot {
    pub id: LineId,
    pub text: String,
    pub kind: BlockKind,
    pub nodes: Vec<NodeSnapshot>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub enum NodeSnapshot {
    Text(String),
    Container {
        tag: Tag,
        literal: bool,
        href: Option<String>,
        missing: bool,
        children: Vec<NodeSnapshot>,
    },
    Image {
        src: String,
    },
}

pub fn snapshot(doc: &Document) -> DocSnapshot {
    DocSnapshot {
        lines: doc
            .iter()
            .map(|block| LineSnapshot {
                id: block.id,
                text: block.raw_text.clone(),
                kind: block.classification,
                nodes: block.tree.children.iter().map(node_snapshot).collect(),
            })
            .collect(),
    }
}

fn node_snapshot(node: &Node) -> NodeSnapshot {
    match node {
        Node::Text(t) => NodeSnapshot::Text(t.clone()),
        Node::Container(c) => NodeSnapshot::Container {
            tag: c.tag,
            literal: c.literal,
            href: c.href.clone(),
            missing: c.missing,
            children: c.children.iter().map(node_snapshot).collect(),
        },
        Node::Image { src } => NodeSnapshot::Image { src: src.clone() },
    }
}

/// Lines whose tree text no longer concatenates back to their raw text.
/// Empty for every correctly rendered document.
pub fn text_invariant_violations(doc: &Document) -> Vec<LineId> {
    doc.iter()
        .filter(|block| block.tree.text() != block.raw_text)
        .map(|block| block.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Session;
    use pretty_assertions::assert_eq;

    #[test]
    fn snapshot_mirrors_rendered_lines() {
        let mut doc = Document::from_text("# h\n`c`");
        Session::new().render_document(&mut doc).unwrap();

        let snap = snapshot(&doc);
        assert_eq!(snap.lines.len(), 2);
        assert_eq!(snap.lines[0].text, "# h");
        assert_eq!(snap.lines[0].kind, BlockKind::Heading { level: 1 });
        assert!(matches!(
            snap.lines[1].nodes.as_slice(),
            [NodeSnapshot::Container {
                tag: Tag::Code,
                literal: true,
                ..
            }]
        ));
    }

    #[test]
    fn rendered_documents_round_trip() {
        let mut doc = Document::from_text("# h\n- item\n[a](b) **x**\n```\nraw\n```");
        Session::new().render_document(&mut doc).unwrap();

        assert_eq!(text_invariant_violations(&doc), vec![]);
    }

    #[test]
    fn violations_catch_mismatched_trees() {
        let mut doc = Document::from_text("abc");
        let id = doc.line_at(0).unwrap().id;
        doc.line_at_mut(0).unwrap().raw_text = "changed".to_string();

        assert_eq!(text_invariant_violations(&doc), vec![id]);
    }
}
