//! Document model and editing operations.

pub mod commands;
pub mod cursor;
pub mod document;
pub mod lists;
pub mod refs;
