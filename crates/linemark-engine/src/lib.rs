//! Incremental render engine for a live, structure-preserving markup editor.
//!
//! The host owns a [`Document`] of editable lines and a [`Session`] holding
//! the cross-line state (fence regions, reference links). After any text
//! change the host calls [`Session::render_line`]: the engine reclassifies
//! the line, rewrites its inline node tree, keeps the cursor where the user
//! left it, and re-renders exactly the other lines the change affects.
//! Structural edits (splitting lines, continuing lists, indenting) go
//! through [`Cmd`] and [`Session::apply`].

pub mod editing;
pub mod parsing;
pub mod render;
pub mod snapshot;
pub mod tree;

pub use editing::commands::Cmd;
pub use editing::cursor::{NodePath, Selection};
pub use editing::document::{BlockKind, Document, LineBlock, LineId};
pub use render::{EngineError, RenderOpts, Session};
