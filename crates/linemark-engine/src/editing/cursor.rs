//! Cursor mapping between node-tree positions and flat text offsets.
//!
//! The engine rebuilds a line's tree on every render, so selections cannot
//! point at nodes across a render. Instead the orchestrator captures the
//! selection as a flat byte offset into the line's text before rewriting,
//! adjusts it for any normalization that changed leading content, and
//! restores it into the fresh tree afterwards.
//!
//! Selections are plain values; the engine never reads ambient state.

use crate::editing::document::{LineBlock, LineId};
use crate::tree::Node;

/// Child-index path from a line's root to a node.
pub type NodePath = Vec<usize>;

/// An explicit selection anchor: a node within one line plus an offset.
///
/// For a text-leaf anchor the offset is a byte offset into the leaf; for a
/// container anchor it counts children, matching host selection models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub line: LineId,
    pub path: NodePath,
    pub offset: usize,
}

/// Converts a selection into a flat byte offset within `block`'s text.
///
/// Returns `None` when the selection anchors outside this line or the path
/// no longer resolves.
pub fn capture_offset(block: &LineBlock, sel: &Selection) -> Option<usize> {
    if sel.line != block.id {
        return None;
    }

    if sel.path.is_empty() {
        // Anchor is the line root: offset counts root children.
        return Some(children_prefix_len(&block.tree.children, sel.offset));
    }

    let mut acc = 0;
    let mut children = &block.tree.children;
    for (depth, index) in sel.path.iter().enumerate() {
        for node in children.iter().take(*index) {
            acc += node.text_len();
        }
        let node = children.get(*index)?;
        let at_anchor = depth == sel.path.len() - 1;
        match node {
            Node::Text(t) => {
                if !at_anchor {
                    return None;
                }
                return Some(acc + sel.offset.min(t.len()));
            }
            Node::Container(c) => {
                if at_anchor {
                    // Container anchor: only the leaves under its first
                    // `offset` children count.
                    return Some(children_prefix_len(&c.children, sel.offset));
                }
                children = &c.children;
            }
            Node::Image { .. } => {
                if at_anchor {
                    return Some(acc);
                }
                return None;
            }
        }
    }
    None
}

/// Places a flat byte offset back into `block`'s tree.
///
/// Walks leaves depth-first, consuming their lengths until one can hold the
/// remaining offset. Returns `None` when no leaf accommodates it; callers
/// treat that as "leave the selection where it was".
pub fn restore_offset(block: &LineBlock, target: usize) -> Option<Selection> {
    let mut path = Vec::new();
    let mut remaining = target;
    if let Some(path) = descend(&block.tree.children, &mut path, &mut remaining) {
        return Some(Selection {
            line: block.id,
            path,
            offset: remaining,
        });
    }
    // A line with no text leaves still holds the cursor at its start.
    (target == 0).then(|| Selection {
        line: block.id,
        path: Vec::new(),
        offset: 0,
    })
}

fn descend(children: &[Node], path: &mut Vec<usize>, remaining: &mut usize) -> Option<NodePath> {
    for (i, node) in children.iter().enumerate() {
        match node {
            Node::Text(t) => {
                if t.len() >= *remaining {
                    path.push(i);
                    return Some(path.clone());
                }
                *remaining -= t.len();
            }
            Node::Container(c) => {
                path.push(i);
                if let Some(found) = descend(&c.children, path, remaining) {
                    return Some(found);
                }
                path.pop();
            }
            Node::Image { .. } => {}
        }
    }
    None
}

fn children_prefix_len(children: &[Node], count: usize) -> usize {
    children.iter().take(count).map(Node::text_len).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::document::Document;
    use crate::tree::{Container, LineTree, Tag};

    fn block_with(children: Vec<Node>) -> LineBlock {
        let doc = Document::from_text("x");
        let mut block = doc.line_at(0).unwrap().clone();
        block.tree = LineTree { children };
        block
    }

    #[test]
    fn capture_rejects_other_lines() {
        let block = block_with(vec![Node::Text("abc".to_string())]);
        let sel = Selection {
            line: LineId(999),
            path: vec![0],
            offset: 1,
        };
        assert_eq!(capture_offset(&block, &sel), None);
    }

    #[test]
    fn capture_sums_preceding_leaves() {
        let block = block_with(vec![
            Node::Text("ab".to_string()),
            Node::Container(Container::with_text(Tag::Bold, "**c**")),
            Node::Text("de".to_string()),
        ]);
        let sel = Selection {
            line: block.id,
            path: vec![2],
            offset: 1,
        };
        // "ab" (2) + "**c**" (5) + 1
        assert_eq!(capture_offset(&block, &sel), Some(8));
    }

    #[test]
    fn capture_inside_container_leaf() {
        let block = block_with(vec![
            Node::Text("x".to_string()),
            Node::Container(Container::with_text(Tag::Code, "`y`")),
        ]);
        let sel = Selection {
            line: block.id,
            path: vec![1, 0],
            offset: 2,
        };
        assert_eq!(capture_offset(&block, &sel), Some(3));
    }

    #[test]
    fn container_anchor_counts_child_prefix() {
        let block = block_with(vec![
            Node::Text("ab".to_string()),
            Node::Text("cd".to_string()),
        ]);
        let sel = Selection {
            line: block.id,
            path: vec![],
            offset: 1,
        };
        assert_eq!(capture_offset(&block, &sel), Some(2));
    }

    #[test]
    fn restore_walks_into_nested_leaves() {
        let block = block_with(vec![
            Node::Text("ab".to_string()),
            Node::Container(Container::with_text(Tag::Bold, "**c**")),
        ]);

        let sel = restore_offset(&block, 4).unwrap();
        assert_eq!(sel.path, vec![1, 0]);
        assert_eq!(sel.offset, 2);
        assert_eq!(capture_offset(&block, &sel), Some(4));
    }

    #[test]
    fn restore_prefers_first_leaf_on_boundary() {
        let block = block_with(vec![
            Node::Text("ab".to_string()),
            Node::Text("cd".to_string()),
        ]);
        let sel = restore_offset(&block, 2).unwrap();
        assert_eq!((sel.path, sel.offset), (vec![0], 2));
    }

    #[test]
    fn restore_beyond_text_is_none() {
        let block = block_with(vec![Node::Text("ab".to_string())]);
        assert!(restore_offset(&block, 5).is_none());
    }

    #[test]
    fn restore_into_empty_line_anchors_at_root() {
        let block = block_with(Vec::new());
        let sel = restore_offset(&block, 0).unwrap();
        assert_eq!((sel.path, sel.offset), (vec![], 0));
        assert!(restore_offset(&block, 1).is_none());
    }

    #[test]
    fn capture_restore_round_trip() {
        let block = block_with(vec![
            Node::Text("one ".to_string()),
            Node::Container(Container::with_text(Tag::Italic, "*two*")),
            Node::Text(" three".to_string()),
        ]);
        for target in 0..=block.tree.text_len() {
            let sel = restore_offset(&block, target).unwrap();
            assert_eq!(capture_offset(&block, &sel), Some(target));
        }
    }
}
