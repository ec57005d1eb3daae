//! Caret position and selection.

use serde::{Deserialize, Serialize};

/// A position in the text buffer.
///
/// Both line and column are 0-indexed; the column counts characters, not
/// bytes. `Display` renders the 1-indexed form used by the status bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    /// Line number (0-indexed)
    pub line: usize,
    /// Column number (0-indexed, in characters)
    pub column: usize,
}

impl Position {
    /// Position at the start of the document.
    pub const ZERO: Position = Position { line: 0, column: 0 };

    /// Creates a new position.
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.line
            .cmp(&other.line)
            .then(self.column.cmp(&other.column))
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ln {}, Col {}", self.line + 1, self.column + 1)
    }
}

/// The caret plus an optional selection anchor.
///
/// When `anchor` is set, the text between the anchor and `position` is
/// selected; `position` is always the end the user is moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    /// Current caret position
    pub position: Position,

    /// Selection anchor
    pub anchor: Option<Position>,
}

impl Cursor {
    /// Creates a cursor at a position with no selection.
    pub fn new(position: Position) -> Self {
        Self {
            position,
            anchor: None,
        }
    }

    /// Moves the caret, dropping any selection.
    pub fn move_to(&mut self, position: Position) {
        self.position = position;
        self.anchor = None;
    }

    /// Selects from `anchor` to `position`; the caret ends at `position`.
    pub fn select(&mut self, anchor: Position, position: Position) {
        self.anchor = (anchor != position).then_some(anchor);
        self.position = position;
    }

    /// Returns true if some text is selected.
    pub fn has_selection(&self) -> bool {
        self.anchor.is_some_and(|a| a != self.position)
    }

    /// Returns the selection as an ordered `(start, end)` pair.
    pub fn selection_range(&self) -> Option<(Position, Position)> {
        let anchor = self.anchor.filter(|a| *a != self.position)?;
        Some((anchor.min(self.position), anchor.max(self.position)))
    }

    /// Clears the selection, keeping the caret where it is.
    pub fn clear_selection(&mut self) {
        self.anchor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_ordering() {
        let a = Position::new(1, 5);
        let b = Position::new(2, 0);
        assert!(a < b);
        assert_eq!(a.max(b), b);
    }

    #[test]
    fn test_status_bar_display() {
        assert_eq!(Position::ZERO.to_string(), "Ln 1, Col 1");
        assert_eq!(Position::new(9, 3).to_string(), "Ln 10, Col 4");
    }

    #[test]
    fn test_backwards_selection_is_normalized() {
        let mut cursor = Cursor::default();
        cursor.select(Position::new(3, 2), Position::new(1, 0));
        assert_eq!(
            cursor.selection_range(),
            Some((Position::new(1, 0), Position::new(3, 2)))
        );

        cursor.move_to(Position::new(0, 1));
        assert!(!cursor.has_selection());
    }

    #[test]
    fn test_empty_selection_is_no_selection() {
        let mut cursor = Cursor::default();
        cursor.select(Position::new(2, 2), Position::new(2, 2));
        assert!(!cursor.has_selection());
        assert_eq!(cursor.selection_range(), None);
    }
}
