//! Fenced-code-region tracking.
//!
//! A fence delimiter line (``` or ~~~) is tracked by the session-wide
//! [`FenceTracker`]. Each tracked line carries a [`FenceState`]; the states
//! of all fence lines together determine which ordinary lines are inside a
//! fenced region and must skip classification and inline extraction.
//!
//! A single insertion can flip the state of every later fence of the same
//! delimiter type (parity shift), so [`FenceTracker::insert`] and
//! [`FenceTracker::remove`] re-derive all states with one global walk over
//! the fence lines in document order. That walk is O(number of fences) and
//! returns exactly the fence lines whose state changed, which the render
//! orchestrator uses to bound the re-render range.

use std::collections::HashMap;

use serde::Serialize;

use crate::editing::document::{Document, LineId};
use crate::render::EngineError;

/// Which delimiter a fence line uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FenceKind {
    Backtick,
    Tilde,
}

/// Scan state of one fence delimiter line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FenceState {
    /// Opens an active fenced region.
    Enter,
    /// Closes the region opened by the nearest preceding opener of its kind.
    Exit,
    /// No matching closer exists anywhere later; does not open a region.
    Unpaired,
    /// Encountered inside an active region of the other kind; inert text.
    Ignored,
}

/// Fence delimiter token detection.
pub struct CodeFence;

impl CodeFence {
    pub const BACKTICKS: &'static str = "```";
    pub const TILDES: &'static str = "~~~";

    /// Returns the fence kind if `text` starts with a fence delimiter token.
    pub fn sig(text: &str) -> Option<FenceKind> {
        if text.starts_with(Self::BACKTICKS) {
            Some(FenceKind::Backtick)
        } else if text.starts_with(Self::TILDES) {
            Some(FenceKind::Tilde)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
struct FenceRecord {
    id: LineId,
    kind: FenceKind,
    state: FenceState,
}

/// Session-scoped registry of all fence delimiter lines, in document order.
#[derive(Debug, Default)]
pub struct FenceTracker {
    records: Vec<FenceRecord>,
    /// Most recently seen fence line per delimiter kind, in document order.
    last: HashMap<FenceKind, LineId>,
}

impl FenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `id` is a tracked fence line.
    pub fn is_tracked(&self, id: LineId) -> bool {
        self.records.iter().any(|r| r.id == id)
    }

    /// Kind and state of a tracked fence line.
    pub fn state_of(&self, id: LineId) -> Option<(FenceKind, FenceState)> {
        self.records
            .iter()
            .find(|r| r.id == id)
            .map(|r| (r.kind, r.state))
    }

    /// Starts tracking a new fence line and repairs all fence states.
    ///
    /// Returns the fence lines whose state changed (always including the new
    /// line itself).
    pub fn insert(&mut self, doc: &Document, id: LineId, kind: FenceKind) -> Vec<LineId> {
        let index = doc_index(doc, id);
        let pos = self
            .records
            .partition_point(|r| doc_index(doc, r.id) < index);
        self.records.insert(
            pos,
            FenceRecord {
                id,
                kind,
                state: FenceState::Unpaired,
            },
        );

        let holder_index = self.last.get(&kind).map(|held| doc_index(doc, *held));
        if holder_index.is_none_or(|held| held < index) {
            self.last.insert(kind, id);
        }

        let mut changed = self.repair();
        if !changed.contains(&id) {
            changed.push(id);
        }
        changed
    }

    /// Stops tracking a fence line and repairs the remaining states.
    ///
    /// Removing a line the tracker never saw means engine state is corrupt,
    /// so this fails rather than silently continuing.
    pub fn remove(&mut self, id: LineId) -> Result<Vec<LineId>, EngineError> {
        let pos = self
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or(EngineError::UnknownFence(id))?;
        let removed = self.records.remove(pos);

        if self.last.get(&removed.kind) == Some(&id) {
            // Scan backward for the previous fence of this kind.
            match self.records.iter().rev().find(|r| r.kind == removed.kind) {
                Some(prev) => {
                    self.last.insert(removed.kind, prev.id);
                }
                None => {
                    self.last.remove(&removed.kind);
                }
            }
        }

        Ok(self.repair())
    }

    /// True iff the line at `index` sits inside an active fenced region.
    ///
    /// Decided by the nearest preceding fence line: `Enter` and `Ignored`
    /// mean a region is open there; `Exit` and `Unpaired` mean it is not.
    pub fn in_fence(&self, doc: &Document, index: usize) -> bool {
        let preceding = self
            .records
            .iter()
            .rev()
            .find(|r| doc_index(doc, r.id) < index);
        matches!(
            preceding.map(|r| r.state),
            Some(FenceState::Enter) | Some(FenceState::Ignored)
        )
    }

    /// Document index of the first tracked fence line after `index`.
    pub fn next_fence_index_after(&self, doc: &Document, index: usize) -> Option<usize> {
        self.records
            .iter()
            .map(|r| doc_index(doc, r.id))
            .find(|i| *i > index)
    }

    /// Re-derives every fence state with one walk in document order.
    ///
    /// Walk rule: with no region open, the recorded last fence of a kind is
    /// `Unpaired` (it has no future partner yet) and anything earlier opens a
    /// region; with a region open, a matching kind closes it and the other
    /// kind is inert.
    fn repair(&mut self) -> Vec<LineId> {
        let mut open: Option<FenceKind> = None;
        let mut changed = Vec::new();

        for rec in &mut self.records {
            let next = match open {
                None => {
                    if self.last.get(&rec.kind) == Some(&rec.id) {
                        FenceState::Unpaired
                    } else {
                        open = Some(rec.kind);
                        FenceState::Enter
                    }
                }
                Some(kind) if kind == rec.kind => {
                    open = None;
                    FenceState::Exit
                }
                Some(_) => FenceState::Ignored,
            };

            if next != rec.state {
                rec.state = next;
                changed.push(rec.id);
            }
        }

        changed
    }
}

fn doc_index(doc: &Document, id: LineId) -> usize {
    // Tracked ids are removed before their lines are; a stale id would mean
    // the same corruption `remove` guards against, so sort it last.
    doc.index_of(id).unwrap_or(usize::MAX)
}
