//! Owned node-tree model for a rendered line.
//!
//! Every [`LineBlock`](crate::editing::document::LineBlock) owns one
//! [`LineTree`]. Render passes rebuild the tree from the line's raw text on
//! every pass (arena-style: build fresh children, then swap), so nothing in
//! here needs interior mutability or live-list iteration.
//!
//! Invariant: the depth-first concatenation of all text leaves equals the
//! line's raw text. Delimiter and marker decoration nodes carry their
//! delimiter text as ordinary leaves, which is what makes the concatenation
//! lossless.

use serde::Serialize;

/// Semantic tag of a container node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Tag {
    /// Inline code span (always literal).
    Code,
    /// Bold emphasis (`**`).
    Bold,
    /// Italic emphasis (`*`).
    Italic,
    /// Underline emphasis (`_`).
    Underline,
    /// A link/image delimiter token such as `[` or `)`.
    LinkDelim,
    /// The label portion of a link, image, or reference.
    LinkText,
    /// The target portion of a link or reference usage.
    LinkHref,
    /// Trailing container holding embedded images for the line.
    Embed,
}

/// A node in a rendered line tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Container(Container),
    /// A text leaf. Immutable once built; passes replace rather than edit.
    Text(String),
    /// An embedded image. Contributes no text to the line.
    Image { src: String },
}

/// A container node: semantic tag, attributes, and ordered children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub tag: Tag,
    /// Literal containers are opaque: inline passes never recurse into them.
    pub literal: bool,
    /// Resolved target for `LinkHref` containers.
    pub href: Option<String>,
    /// Set on `LinkHref` containers whose reference name has no definition yet.
    pub missing: bool,
    pub children: Vec<Node>,
}

impl Container {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            literal: false,
            href: None,
            missing: false,
            children: Vec::new(),
        }
    }

    /// Builds a container holding a single text leaf.
    pub fn with_text(tag: Tag, text: impl Into<String>) -> Self {
        let mut c = Self::new(tag);
        c.children.push(Node::Text(text.into()));
        c
    }

    pub fn literal(mut self) -> Self {
        self.literal = true;
        self
    }
}

impl Node {
    /// Total text length (bytes) of the subtree rooted at this node.
    pub fn text_len(&self) -> usize {
        match self {
            Node::Text(t) => t.len(),
            Node::Container(c) => c.children.iter().map(Node::text_len).sum(),
            Node::Image { .. } => 0,
        }
    }

    /// Appends the depth-first text content of this subtree to `out`.
    pub fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(t) => out.push_str(t),
            Node::Container(c) => {
                for child in &c.children {
                    child.collect_text(out);
                }
            }
            Node::Image { .. } => {}
        }
    }
}

/// The rendered tree of one line. The line itself is the implicit root;
/// `children` are the root's ordered child nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineTree {
    pub children: Vec<Node>,
}

impl LineTree {
    /// A tree holding the raw line text as a single leaf. Empty lines get an
    /// empty child list rather than an empty leaf.
    pub fn from_text(text: &str) -> Self {
        if text.is_empty() {
            Self::default()
        } else {
            Self {
                children: vec![Node::Text(text.to_string())],
            }
        }
    }

    /// Depth-first concatenation of all text leaves.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            node.collect_text(&mut out);
        }
        out
    }

    pub fn text_len(&self) -> usize {
        self.children.iter().map(Node::text_len).sum()
    }

    /// Resolves a child-index path to a node, if it exists.
    pub fn node_at(&self, path: &[usize]) -> Option<&Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.children.get(*first)?;
        for idx in rest {
            match node {
                Node::Container(c) => node = c.children.get(*idx)?,
                _ => return None,
            }
        }
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_text_single_leaf() {
        let tree = LineTree::from_text("hello");
        assert_eq!(tree.children, vec![Node::Text("hello".to_string())]);
        assert_eq!(tree.text(), "hello");
    }

    #[test]
    fn empty_text_has_no_children() {
        assert!(LineTree::from_text("").children.is_empty());
    }

    #[test]
    fn nested_text_concatenation() {
        let tree = LineTree {
            children: vec![
                Node::Text("a ".to_string()),
                Node::Container(Container::with_text(Tag::Bold, "**b**")),
                Node::Text(" c".to_string()),
            ],
        };
        assert_eq!(tree.text(), "a **b** c");
        assert_eq!(tree.text_len(), 9);
    }

    #[test]
    fn images_contribute_no_text() {
        let tree = LineTree {
            children: vec![
                Node::Text("x".to_string()),
                Node::Image {
                    src: "pic.png".to_string(),
                },
            ],
        };
        assert_eq!(tree.text(), "x");
    }

    #[test]
    fn node_at_resolves_nested_paths() {
        let tree = LineTree {
            children: vec![
                Node::Text("a".to_string()),
                Node::Container(Container::with_text(Tag::Code, "`b`")),
            ],
        };
        assert!(matches!(tree.node_at(&[0]), Some(Node::Text(t)) if t == "a"));
        assert!(matches!(tree.node_at(&[1, 0]), Some(Node::Text(t)) if t == "`b`"));
        assert!(tree.node_at(&[2]).is_none());
        assert!(tree.node_at(&[0, 0]).is_none());
    }
}
