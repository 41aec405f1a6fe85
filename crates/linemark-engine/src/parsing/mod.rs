//! Text analysis: line classification, fence tracking, inline extraction.

pub mod classify;
pub mod fences;
pub mod inline;
