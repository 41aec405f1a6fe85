//! Render orchestration.
//!
//! [`Session`] owns the cross-line state (fence tracker, reference registry)
//! and sequences the per-line pipeline: capture the cursor, classify, apply
//! class-specific text normalization, rebuild the node tree through the
//! inline passes, restore the cursor, then cascade to any other lines the
//! change affects (fence ranges, reference consumers, the next sibling).
//!
//! Everything runs synchronously to completion inside one `render_line`
//! call; cascades are direct recursive calls. The host must not re-enter
//! the session while a render is in flight.

use thiserror::Error;

use crate::editing::cursor::{self, Selection};
use crate::editing::document::{BlockKind, Document, LineBlock, LineId};
use crate::editing::lists;
use crate::editing::refs::ReferenceRegistry;
use crate::parsing::classify::{self, LineClass, PrevLine};
use crate::parsing::fences::{FenceKind, FenceTracker};
use crate::parsing::inline::{self, InlineEffects};
use crate::tree::{Container, LineTree, Node, Tag};

/// Canonical text of a separator line; overflow spills to a new sibling.
pub const SEPARATOR_TEXT: &str = "---";

/// The engine's only failure modes. Both indicate corrupted engine state
/// rather than bad input; rendering of the affected line halts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("fence line {0:?} is not tracked")]
    UnknownFence(LineId),
    #[error("line {0:?} is not part of the document")]
    UnknownLine(LineId),
}

/// Per-call render options supplied by editing commands.
#[derive(Debug, Clone, Default)]
pub struct RenderOpts {
    /// Byte offset to restore instead of capturing from the live selection.
    pub original_cursor: Option<usize>,
    /// The line's text as the current tree (and any captured selection)
    /// reflects it, when the caller edited `raw_text` before rendering.
    /// Length deltas against it adjust the restored cursor.
    pub original_text: Option<String>,
}

impl RenderOpts {
    pub fn at_offset(offset: usize) -> Self {
        Self {
            original_cursor: Some(offset),
            original_text: None,
        }
    }
}

/// Session-scoped engine state: one per open document.
#[derive(Debug, Default)]
pub struct Session {
    pub(crate) fences: FenceTracker,
    pub(crate) refs: ReferenceRegistry,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders every line in document order. Used at document open; also
    /// re-establishes all cross-line state from scratch.
    pub fn render_document(&mut self, doc: &mut Document) -> Result<(), EngineError> {
        let ids: Vec<LineId> = doc.iter().map(|b| b.id).collect();
        for id in ids {
            self.render_line(doc, id, RenderOpts::default(), None)?;
        }
        Ok(())
    }

    /// Renders one changed line and everything its change cascades to.
    ///
    /// `sel` is the host's current selection, if any; the returned selection
    /// is where the host should place it afterwards (unchanged when the
    /// render did not move it).
    pub fn render_line(
        &mut self,
        doc: &mut Document,
        id: LineId,
        opts: RenderOpts,
        sel: Option<Selection>,
    ) -> Result<Option<Selection>, EngineError> {
        let mut slot = sel;
        self.render_line_inner(doc, id, opts, &mut slot)?;
        Ok(slot)
    }

    /// Removes a line and repairs the cross-line state it participated in:
    /// reference consumer lists are pruned, and if the line was a tracked
    /// fence the affected range re-renders.
    pub fn remove_line(
        &mut self,
        doc: &mut Document,
        id: LineId,
        sel: Option<Selection>,
    ) -> Result<Option<Selection>, EngineError> {
        let index = doc.index_of(id).ok_or(EngineError::UnknownLine(id))?;
        self.refs.prune_consumer(id);

        let mut slot = sel;
        if self.fences.is_tracked(id) {
            let changed = self.fences.remove(id)?;
            doc.remove_line(id);
            self.render_fence_range(doc, &changed, index, None, &mut slot)?;
        } else {
            doc.remove_line(id);
        }
        Ok(slot)
    }

    fn render_line_inner(
        &mut self,
        doc: &mut Document,
        id: LineId,
        opts: RenderOpts,
        sel: &mut Option<Selection>,
    ) -> Result<(), EngineError> {
        let index = doc.index_of(id).ok_or(EngineError::UnknownLine(id))?;

        let prev = index
            .checked_sub(1)
            .and_then(|i| doc.line_at(i))
            .map(|p| PrevLine {
                indented_code: matches!(p.classification, BlockKind::IndentedCode),
                blank: classify::is_blank(&p.raw_text),
            });

        let (text, old_class, captured) = {
            let block = doc.line_at(index).ok_or(EngineError::UnknownLine(id))?;
            let captured = opts
                .original_cursor
                .or_else(|| sel.as_ref().and_then(|s| cursor::capture_offset(block, s)));
            (block.raw_text.clone(), block.classification, captured)
        };
        let original_len = opts.original_text.as_deref().map_or(text.len(), str::len);
        let blank_changed = opts
            .original_text
            .as_deref()
            .is_some_and(|old| classify::is_blank(old) != classify::is_blank(&text));

        // A re-render consumes no references until extraction re-registers
        // the ones still present.
        self.refs.prune_consumer(id);

        let was_fence = self.fences.is_tracked(id);
        let class = classify::classify(&text, prev);

        if let LineClass::Fence(kind) = class {
            return self.render_fence_line(doc, id, index, kind, was_fence, captured, sel);
        }

        if was_fence {
            // No longer a delimiter; the repaired states must be in place
            // for this line's own in-fence check and the range around it.
            let changed = self.fences.remove(id)?;
            self.render_fence_range(doc, &changed, index, Some(id), sel)?;
        }

        if self.fences.in_fence(doc, index) {
            let block = doc.line_at_mut(index).ok_or(EngineError::UnknownLine(id))?;
            block.classification = BlockKind::FencedInterior;
            block.tree = LineTree::from_text(&block.raw_text);
            restore(block, captured, delta(block.raw_text.len(), original_len), sel);
            return Ok(());
        }

        let new_class = match class {
            LineClass::Separator => {
                return self.render_separator(doc, id, index, &text, old_class, captured, sel);
            }
            LineClass::IndentedCode => {
                let block = doc.line_at_mut(index).ok_or(EngineError::UnknownLine(id))?;
                block.classification = BlockKind::IndentedCode;
                block.tree = LineTree::from_text(&block.raw_text);
                restore(block, captured, delta(block.raw_text.len(), original_len), sel);
                return self.eval_successor(
                    doc,
                    index,
                    old_class,
                    BlockKind::IndentedCode,
                    blank_changed,
                    sel,
                );
            }
            LineClass::Heading(level) => BlockKind::Heading { level },
            LineClass::List(kind) => {
                let depth = lists::depth_of(doc, index);
                let fixed = lists::fix_list_element_spaces(&text, depth);
                let block = doc.line_at_mut(index).ok_or(EngineError::UnknownLine(id))?;
                block.raw_text = fixed;
                BlockKind::ListItem { kind, depth }
            }
            LineClass::Paragraph => BlockKind::Paragraph,
            LineClass::Fence(_) => unreachable!("fence lines handled above"),
        };

        let mut fx = InlineEffects::default();
        {
            let block = doc.line_at_mut(index).ok_or(EngineError::UnknownLine(id))?;
            block.classification = new_class;
            let mut tree = LineTree::from_text(&block.raw_text);
            inline::run_passes(&mut tree.children, id, &mut self.refs, &mut fx);
            if !fx.embeds.is_empty() {
                let mut embed = Container::new(Tag::Embed).literal();
                embed.children = fx
                    .embeds
                    .iter()
                    .map(|src| Node::Image { src: src.clone() })
                    .collect();
                tree.children.push(Node::Container(embed));
            }
            block.tree = tree;
            restore(block, captured, delta(block.raw_text.len(), original_len), sel);
        }

        // Definitions take effect after the defining line's own tree is
        // complete; consumers elsewhere re-render to pick up the target.
        for (name, target) in fx.defined {
            for consumer in self.refs.define(&name, &target) {
                if consumer != id && doc.index_of(consumer).is_some() {
                    self.render_line_inner(doc, consumer, RenderOpts::default(), sel)?;
                }
            }
        }

        self.eval_successor(doc, index, old_class, new_class, blank_changed, sel)
    }

    /// Pipeline tail for a line classified as a fence delimiter: track it
    /// (or retrack under a new kind), then re-render the affected range.
    fn render_fence_line(
        &mut self,
        doc: &mut Document,
        id: LineId,
        index: usize,
        kind: FenceKind,
        was_fence: bool,
        captured: Option<usize>,
        sel: &mut Option<Selection>,
    ) -> Result<(), EngineError> {
        let changed = if was_fence {
            match self.fences.state_of(id) {
                Some((old_kind, _)) if old_kind == kind => Vec::new(),
                _ => {
                    // The delimiter kind flipped in place.
                    let mut changed = self.fences.remove(id)?;
                    for flip in self.fences.insert(doc, id, kind) {
                        if !changed.contains(&flip) {
                            changed.push(flip);
                        }
                    }
                    changed
                }
            }
        } else {
            self.fences.insert(doc, id, kind)
        };

        let (_, state) = self
            .fences
            .state_of(id)
            .ok_or(EngineError::UnknownFence(id))?;
        let block = doc.line_at_mut(index).ok_or(EngineError::UnknownLine(id))?;
        block.classification = BlockKind::FenceDelimiter { kind, state };
        block.tree = LineTree::from_text(&block.raw_text);
        restore(block, captured, 0, sel);

        if !changed.is_empty() {
            self.render_fence_range(doc, &changed, index, Some(id), sel)?;
        }
        Ok(())
    }

    /// Truncates a separator to `---` and spills the overflow into a fresh
    /// successor line. A cursor that was on the separator follows the spill
    /// to its end.
    fn render_separator(
        &mut self,
        doc: &mut Document,
        id: LineId,
        index: usize,
        text: &str,
        old_class: BlockKind,
        captured: Option<usize>,
        sel: &mut Option<Selection>,
    ) -> Result<(), EngineError> {
        let spill = text[SEPARATOR_TEXT.len()..].to_string();
        {
            let block = doc.line_at_mut(index).ok_or(EngineError::UnknownLine(id))?;
            block.raw_text = SEPARATOR_TEXT.to_string();
            block.classification = BlockKind::Separator;
            block.tree = LineTree::from_text(SEPARATOR_TEXT);
        }

        if spill.is_empty() {
            let block = doc.line_at(index).ok_or(EngineError::UnknownLine(id))?;
            restore(block, captured.map(|c| c.min(SEPARATOR_TEXT.len())), 0, sel);
        } else {
            let spill_id = doc.insert_line(index + 1, &spill);
            let opts = RenderOpts {
                original_cursor: captured.map(|_| spill.len()),
                original_text: None,
            };
            self.render_line_inner(doc, spill_id, opts, sel)?;
        }

        self.eval_successor(doc, index, old_class, BlockKind::Separator, false, sel)
    }

    /// Re-renders every line from the first state-changed fence (or the
    /// triggering line, whichever is earlier) up to the next tracked fence
    /// after the last change, so fence lines pick up their new states and
    /// interior lines flip between literal and rendered.
    fn render_fence_range(
        &mut self,
        doc: &mut Document,
        changed: &[LineId],
        start_index: usize,
        skip: Option<LineId>,
        sel: &mut Option<Selection>,
    ) -> Result<(), EngineError> {
        let mut lo = start_index;
        let mut hi = start_index;
        for id in changed {
            if let Some(i) = doc.index_of(*id) {
                lo = lo.min(i);
                hi = hi.max(i);
            }
        }
        let end = self
            .fences
            .next_fence_index_after(doc, hi)
            .unwrap_or(doc.len());

        let ids: Vec<LineId> = (lo..end)
            .filter_map(|i| doc.line_at(i))
            .map(|b| b.id)
            .filter(|line| Some(*line) != skip)
            .collect();
        for line in ids {
            // Cascades within the range (separator spill) can reorder
            // lines; render only the ones still present.
            if doc.index_of(line).is_some() {
                self.render_line_inner(doc, line, RenderOpts::default(), sel)?;
            }
        }
        Ok(())
    }

    /// Cascades to the next sibling when this render changed something its
    /// classification depends on: list membership, list depth, indented-code
    /// membership, or blankness. A successor currently classified as
    /// indented code is always re-checked, since its guard reads this line.
    fn eval_successor(
        &mut self,
        doc: &mut Document,
        index: usize,
        old: BlockKind,
        new: BlockKind,
        blank_changed: bool,
        sel: &mut Option<Selection>,
    ) -> Result<(), EngineError> {
        let Some((next, next_kind)) = doc.line_at(index + 1).map(|b| (b.id, b.classification))
        else {
            return Ok(());
        };

        let was_list = matches!(old, BlockKind::ListItem { .. });
        let is_list = matches!(new, BlockKind::ListItem { .. });
        let was_code = matches!(old, BlockKind::IndentedCode);
        let is_code = matches!(new, BlockKind::IndentedCode);
        let next_is_code = matches!(next_kind, BlockKind::IndentedCode);
        let depth_changed = match (old, new) {
            (BlockKind::ListItem { depth: a, .. }, BlockKind::ListItem { depth: b, .. }) => a != b,
            _ => false,
        };

        if was_list != is_list || was_code != is_code || depth_changed || blank_changed || next_is_code
        {
            self.render_line_inner(doc, next, RenderOpts::default(), sel)?;
        }
        Ok(())
    }
}

fn delta(new_len: usize, original_len: usize) -> isize {
    new_len as isize - original_len as isize
}

fn restore(block: &LineBlock, captured: Option<usize>, adj: isize, sel: &mut Option<Selection>) {
    if let Some(offset) = captured {
        let target = offset.saturating_add_signed(adj);
        if let Some(new_sel) = cursor::restore_offset(block, target) {
            *sel = Some(new_sel);
        }
    }
}
