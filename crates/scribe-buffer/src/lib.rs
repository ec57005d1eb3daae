//! # Scribe Buffer
//!
//! Text storage for editor sessions.
//!
//! - [`TextBuffer`] keeps the document in a rope and records every
//!   mutation twice: once in the undo [`History`], once as a [`LineChange`]
//!   so callers can re-highlight only the blocks that changed.
//! - [`Matcher`] implements literal find / replace-all, optionally
//!   case-insensitive.
//! - [`Position`] and [`Cursor`] describe where the caret and selection are.

mod buffer;
mod cursor;
mod history;
mod search;

pub use buffer::{LineChange, TextBuffer};
pub use cursor::{Cursor, Position};
pub use history::{Edit, EditKind, History};
pub use search::{Matcher, SearchMatch, replace_all};

/// Result type for buffer operations
pub type BufferResult<T> = Result<T, BufferError>;

/// Errors that can occur during buffer operations
#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    #[error("Position {line}:{column} is out of bounds")]
    PositionOutOfBounds { line: usize, column: usize },

    #[error("Invalid character index: {0}")]
    InvalidCharIndex(usize),

    #[error("Search pattern could not be built: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
