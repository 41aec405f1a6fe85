//! Document model: an ordered sequence of editable line blocks.
//!
//! The host owns the `Document` and drives edits; the engine only mutates
//! blocks within it. Lines carry stable [`LineId`]s so cross-line state
//! (fence tracker, reference registry, selections) survives insertions and
//! removals elsewhere in the document.

use serde::Serialize;

use crate::parsing::classify::ListKind;
use crate::parsing::fences::{FenceKind, FenceState};
use crate::tree::LineTree;

/// Stable identity of a line block, assigned at insertion and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LineId(pub u64);

/// Block-level classification of a line, including per-class payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BlockKind {
    Heading { level: u8 },
    Separator,
    ListItem { kind: ListKind, depth: usize },
    IndentedCode,
    FenceDelimiter { kind: FenceKind, state: FenceState },
    /// A line inside an active fenced region; rendered as literal text.
    FencedInterior,
    Paragraph,
}

/// One editable logical line of the document.
#[derive(Debug, Clone)]
pub struct LineBlock {
    pub id: LineId,
    pub raw_text: String,
    pub classification: BlockKind,
    pub tree: LineTree,
}

impl LineBlock {
    fn new(id: LineId, text: String) -> Self {
        let tree = LineTree::from_text(&text);
        Self {
            id,
            raw_text: text,
            classification: BlockKind::Paragraph,
            tree,
        }
    }
}

/// Ordered sequence of line blocks; insertion order is visual order.
#[derive(Debug, Default)]
pub struct Document {
    lines: Vec<LineBlock>,
    next_id: u64,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a document from text, one block per `\n`-separated line.
    pub fn from_text(text: &str) -> Self {
        let mut doc = Self::new();
        for line in text.split('\n') {
            let index = doc.lines.len();
            doc.insert_line(index, line);
        }
        doc
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LineBlock> {
        self.lines.iter()
    }

    pub fn index_of(&self, id: LineId) -> Option<usize> {
        self.lines.iter().position(|b| b.id == id)
    }

    pub fn line(&self, id: LineId) -> Option<&LineBlock> {
        self.lines.iter().find(|b| b.id == id)
    }

    pub fn line_mut(&mut self, id: LineId) -> Option<&mut LineBlock> {
        self.lines.iter_mut().find(|b| b.id == id)
    }

    pub fn line_at(&self, index: usize) -> Option<&LineBlock> {
        self.lines.get(index)
    }

    pub fn line_at_mut(&mut self, index: usize) -> Option<&mut LineBlock> {
        self.lines.get_mut(index)
    }

    /// Inserts a new line block at `index` (clamped to the end).
    pub fn insert_line(&mut self, index: usize, text: &str) -> LineId {
        let id = LineId(self.next_id);
        self.next_id += 1;
        let index = index.min(self.lines.len());
        self.lines.insert(index, LineBlock::new(id, text.to_string()));
        id
    }

    /// Removes and returns a line block. Cross-line state cleanup (fences,
    /// reference consumers) is the session's job; hosts should go through
    /// [`Session::remove_line`](crate::render::Session::remove_line).
    pub fn remove_line(&mut self, id: LineId) -> Option<LineBlock> {
        let index = self.index_of(id)?;
        Some(self.lines.remove(index))
    }

    /// Full document text, lines joined with `\n`.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for (i, block) in self.lines.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&block.raw_text);
        }
        out
    }
}
