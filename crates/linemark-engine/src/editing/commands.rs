//! Editing commands.
//!
//! The structural edits the engine performs on behalf of the host, as a
//! closed enum applied through [`Session::apply`]. Offsets are byte offsets
//! into the line's current text. Each command leaves the document fully
//! rendered and returns where the selection should land.

use crate::editing::cursor::{self, Selection};
use crate::editing::document::{BlockKind, Document, LineId};
use crate::editing::lists;
use crate::render::{EngineError, RenderOpts, Session};

/// A structural edit on one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    /// Split the line at `at`; the tail becomes a new line and takes the
    /// cursor.
    SplitLine { line: LineId, at: usize },
    /// Split a list item at `at`, seeding the new line with the successor
    /// marker; continuing an empty item terminates the list instead.
    ContinueListItem { line: LineId, at: usize },
    /// Change a list item's nesting by one level. Lowering out of depth 1
    /// strips the marker, demoting the line to a paragraph.
    ElevateListItem { line: LineId, raise: bool },
    /// Split an indented-code line, carrying the indentation onto the new
    /// line as non-breaking spaces.
    ContinueCodeBlock { line: LineId, at: usize },
    /// Strip the leading indentation of an indented-code line, but only
    /// when the cursor sits exactly after it.
    ClearCodeIndent { line: LineId },
}

impl Session {
    /// Applies one editing command. `sel` is the host's current selection.
    pub fn apply(
        &mut self,
        doc: &mut Document,
        cmd: Cmd,
        sel: Option<Selection>,
    ) -> Result<Option<Selection>, EngineError> {
        match cmd {
            Cmd::SplitLine { line, at } => self.split_line(doc, line, at),
            Cmd::ContinueListItem { line, at } => self.continue_list_item(doc, line, at),
            Cmd::ElevateListItem { line, raise } => self.elevate_list_item(doc, line, raise, sel),
            Cmd::ContinueCodeBlock { line, at } => self.continue_code_block(doc, line, at),
            Cmd::ClearCodeIndent { line } => self.clear_code_indent(doc, line, sel),
        }
    }

    fn split_line(
        &mut self,
        doc: &mut Document,
        line: LineId,
        at: usize,
    ) -> Result<Option<Selection>, EngineError> {
        let (index, text) = locate(doc, line)?;
        let at = at.min(text.len());
        let tail = text[at..].to_string();

        set_text(doc, line, text[..at].to_string())?;
        self.render_line(
            doc,
            line,
            RenderOpts {
                original_cursor: None,
                original_text: Some(text),
            },
            None,
        )?;

        let new_id = doc.insert_line(index + 1, &tail);
        self.render_line(doc, new_id, RenderOpts::at_offset(0), None)
    }

    fn continue_list_item(
        &mut self,
        doc: &mut Document,
        line: LineId,
        at: usize,
    ) -> Result<Option<Selection>, EngineError> {
        let (index, text) = locate(doc, line)?;

        if lists::strip_marker(&text).trim().is_empty() {
            // Continuing an empty item ends the list.
            set_text(doc, line, String::new())?;
            return self.render_line(
                doc,
                line,
                RenderOpts {
                    original_cursor: Some(0),
                    original_text: Some(text),
                },
                None,
            );
        }

        let at = at.min(text.len());
        let marker = lists::next_marker(&text);
        let new_text = format!("{marker}{}", &text[at..]);

        set_text(doc, line, text[..at].to_string())?;
        self.render_line(
            doc,
            line,
            RenderOpts {
                original_cursor: None,
                original_text: Some(text),
            },
            None,
        )?;

        let new_id = doc.insert_line(index + 1, &new_text);
        self.render_line(
            doc,
            new_id,
            RenderOpts {
                original_cursor: Some(marker.len()),
                original_text: Some(new_text),
            },
            None,
        )
    }

    fn elevate_list_item(
        &mut self,
        doc: &mut Document,
        line: LineId,
        raise: bool,
        sel: Option<Selection>,
    ) -> Result<Option<Selection>, EngineError> {
        let (index, text) = locate(doc, line)?;
        let depth = match doc.line(line).ok_or(EngineError::UnknownLine(line))?.classification {
            BlockKind::ListItem { depth, .. } => depth,
            _ => lists::depth_of(doc, index),
        };

        let new_depth = if raise {
            (depth + 1).min(lists::MAX_LIST_DEPTH)
        } else {
            depth.saturating_sub(1)
        };
        let new_text = if new_depth == 0 {
            lists::strip_marker(&text).to_string()
        } else {
            lists::fix_list_element_spaces(&text, new_depth)
        };

        set_text(doc, line, new_text)?;
        self.render_line(
            doc,
            line,
            RenderOpts {
                original_cursor: None,
                original_text: Some(text),
            },
            sel,
        )
    }

    fn continue_code_block(
        &mut self,
        doc: &mut Document,
        line: LineId,
        at: usize,
    ) -> Result<Option<Selection>, EngineError> {
        let (index, text) = locate(doc, line)?;
        let at = at.min(text.len());
        let (ws_chars, _) = lists::leading_whitespace(&text);
        // Non-breaking spaces survive host whitespace collapsing.
        let indent: String = "\u{a0}".repeat(ws_chars);
        let new_text = format!("{indent}{}", &text[at..]);

        set_text(doc, line, text[..at].to_string())?;
        self.render_line(
            doc,
            line,
            RenderOpts {
                original_cursor: None,
                original_text: Some(text),
            },
            None,
        )?;

        let new_id = doc.insert_line(index + 1, &new_text);
        self.render_line(
            doc,
            new_id,
            RenderOpts {
                original_cursor: Some(indent.len()),
                original_text: Some(new_text),
            },
            None,
        )
    }

    fn clear_code_indent(
        &mut self,
        doc: &mut Document,
        line: LineId,
        sel: Option<Selection>,
    ) -> Result<Option<Selection>, EngineError> {
        let (_, text) = locate(doc, line)?;
        let (_, ws_bytes) = lists::leading_whitespace(&text);

        let at_indent_end = ws_bytes > 0
            && sel.as_ref().is_some_and(|s| {
                doc.line(line)
                    .and_then(|block| cursor::capture_offset(block, s))
                    == Some(ws_bytes)
            });
        if !at_indent_end {
            return Ok(sel);
        }

        set_text(doc, line, text[ws_bytes..].to_string())?;
        self.render_line(
            doc,
            line,
            RenderOpts {
                original_cursor: Some(0),
                original_text: Some(text),
            },
            None,
        )
    }
}

fn locate(doc: &Document, line: LineId) -> Result<(usize, String), EngineError> {
    let index = doc.index_of(line).ok_or(EngineError::UnknownLine(line))?;
    let text = doc
        .line_at(index)
        .ok_or(EngineError::UnknownLine(line))?
        .raw_text
        .clone();
    Ok((index, text))
}

fn set_text(doc: &mut Document, line: LineId, text: String) -> Result<(), EngineError> {
    let block = doc.line_mut(line).ok_or(EngineError::UnknownLine(line))?;
    block.raw_text = text;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::classify::ListKind;
    use pretty_assertions::assert_eq;

    fn session_with(text: &str) -> (Session, Document) {
        let mut session = Session::new();
        let mut doc = Document::from_text(text);
        session.render_document(&mut doc).unwrap();
        (session, doc)
    }

    fn line_id(doc: &Document, index: usize) -> LineId {
        doc.line_at(index).unwrap().id
    }

    #[test]
    fn split_line_moves_cursor_to_new_line() {
        let (mut session, mut doc) = session_with("hello world");
        let line = line_id(&doc, 0);

        let sel = session
            .apply(&mut doc, Cmd::SplitLine { line, at: 5 }, None)
            .unwrap()
            .unwrap();

        assert_eq!(doc.line_at(0).unwrap().raw_text, "hello");
        assert_eq!(doc.line_at(1).unwrap().raw_text, " world");
        assert_eq!(sel.line, line_id(&doc, 1));
        assert_eq!(sel.offset, 0);
    }

    #[test]
    fn continue_ordered_item_creates_successor_marker() {
        let (mut session, mut doc) = session_with("1. first");
        let line = line_id(&doc, 0);
        let at = doc.line_at(0).unwrap().raw_text.len();

        let sel = session
            .apply(&mut doc, Cmd::ContinueListItem { line, at }, None)
            .unwrap()
            .unwrap();

        let new = doc.line_at(1).unwrap();
        assert_eq!(new.raw_text, " 2.\u{a0}");
        assert_eq!(
            new.classification,
            BlockKind::ListItem {
                kind: ListKind::Ordered,
                depth: 1
            }
        );
        // Cursor lands right after the generated marker.
        assert_eq!(sel.line, new.id);
        assert_eq!(cursor::capture_offset(new, &sel), Some(" 2.\u{a0}".len()));
    }

    #[test]
    fn continue_splits_item_text_at_cursor() {
        let (mut session, mut doc) = session_with("- one two");
        let line = line_id(&doc, 0);
        // After render the text is " - one two"; split before "two".
        let at = " - one ".len();

        session
            .apply(&mut doc, Cmd::ContinueListItem { line, at }, None)
            .unwrap();

        assert_eq!(doc.line_at(0).unwrap().raw_text, " - one ");
        assert_eq!(doc.line_at(1).unwrap().raw_text, " -\u{a0}two");
    }

    #[test]
    fn continuing_empty_item_terminates_list() {
        let (mut session, mut doc) = session_with("- ");
        let line = line_id(&doc, 0);
        let at = doc.line_at(0).unwrap().raw_text.len();

        session
            .apply(&mut doc, Cmd::ContinueListItem { line, at }, None)
            .unwrap();

        assert_eq!(doc.len(), 1);
        assert_eq!(doc.line_at(0).unwrap().raw_text, "");
        assert_eq!(doc.line_at(0).unwrap().classification, BlockKind::Paragraph);
    }

    #[test]
    fn elevate_deepens_under_shallower_predecessor() {
        let (mut session, mut doc) = session_with("- a\n- b");
        let line = line_id(&doc, 1);

        session
            .apply(&mut doc, Cmd::ElevateListItem { line, raise: true }, None)
            .unwrap();

        let block = doc.line_at(1).unwrap();
        assert_eq!(block.raw_text, "  - b");
        assert_eq!(
            block.classification,
            BlockKind::ListItem {
                kind: ListKind::Unordered,
                depth: 2
            }
        );
    }

    #[test]
    fn lowering_to_depth_zero_strips_marker() {
        let (mut session, mut doc) = session_with("- item");
        let line = line_id(&doc, 0);

        session
            .apply(&mut doc, Cmd::ElevateListItem { line, raise: false }, None)
            .unwrap();

        let block = doc.line_at(0).unwrap();
        assert_eq!(block.raw_text, "item");
        assert_eq!(block.classification, BlockKind::Paragraph);
    }

    #[test]
    fn continue_code_block_carries_indent_as_nbsp() {
        let (mut session, mut doc) = session_with("    let x = 1;");
        let line = line_id(&doc, 0);
        let at = doc.line_at(0).unwrap().raw_text.len();

        let sel = session
            .apply(&mut doc, Cmd::ContinueCodeBlock { line, at }, None)
            .unwrap()
            .unwrap();

        let new = doc.line_at(1).unwrap();
        assert_eq!(new.raw_text, "\u{a0}\u{a0}\u{a0}\u{a0}");
        assert_eq!(new.classification, BlockKind::IndentedCode);
        assert_eq!(cursor::capture_offset(new, &sel), Some(new.raw_text.len()));
    }

    #[test]
    fn clear_code_indent_requires_cursor_at_indent_end() {
        let (mut session, mut doc) = session_with("    code");
        let line = line_id(&doc, 0);

        // Cursor mid-indent: no-op.
        let sel = cursor::restore_offset(doc.line_at(0).unwrap(), 2);
        let out = session
            .apply(&mut doc, Cmd::ClearCodeIndent { line }, sel.clone())
            .unwrap();
        assert_eq!(out, sel);
        assert_eq!(doc.line_at(0).unwrap().raw_text, "    code");

        // Cursor exactly after the indent: strip it.
        let sel = cursor::restore_offset(doc.line_at(0).unwrap(), 4);
        let out = session
            .apply(&mut doc, Cmd::ClearCodeIndent { line }, sel)
            .unwrap()
            .unwrap();
        assert_eq!(doc.line_at(0).unwrap().raw_text, "code");
        assert_eq!(doc.line_at(0).unwrap().classification, BlockKind::Paragraph);
        assert_eq!(out.offset, 0);
    }
}
