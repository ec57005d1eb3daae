//! Rope-backed text buffer.
//!
//! Every mutation goes through two private primitives, `apply_insert` and
//! `apply_remove`. They keep the rope, the undo history and the pending
//! [`LineChange`] list in step, so the highlighter only ever sees the
//! blocks an edit actually touched.

use ropey::Rope;
use std::borrow::Cow;
use std::ops::Range;
use std::path::Path;

use crate::history::{Edit, EditKind, History};
use crate::search::{Matcher, SearchMatch};
use crate::{BufferError, BufferResult, Position};

/// Undo steps kept per buffer
const HISTORY_LIMIT: usize = 1000;

/// Which blocks (lines) an edit replaced.
///
/// `old_lines` blocks starting at `first_line` were replaced by
/// `new_lines` blocks starting at the same line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineChange {
    pub first_line: usize,
    pub old_lines: usize,
    pub new_lines: usize,
}

impl LineChange {
    /// The block range to re-highlight after the change.
    pub fn new_range(&self) -> Range<usize> {
        self.first_line..self.first_line + self.new_lines
    }
}

/// A text buffer backed by a rope.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    rope: Rope,
    history: History,
    modified: bool,
    changes: Vec<LineChange>,
}

impl TextBuffer {
    /// Creates a new empty buffer.
    ///
    /// # Example
    /// ```
    /// use scribe_buffer::TextBuffer;
    ///
    /// let buffer = TextBuffer::new();
    /// assert!(buffer.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::from_rope(Rope::new())
    }

    fn from_rope(rope: Rope) -> Self {
        Self {
            rope,
            history: History::new(HISTORY_LIMIT),
            modified: false,
            changes: Vec::new(),
        }
    }

    /// Loads a buffer from a UTF-8 text file.
    ///
    /// Invalid UTF-8 surfaces as an `InvalidData` I/O error.
    pub fn from_file(path: impl AsRef<Path>) -> BufferResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(Self::from(content.as_str()))
    }

    /// Writes the buffer to `path`.
    ///
    /// The text goes to a sibling temporary file first and is then renamed
    /// over the target, so a failed write never truncates an existing file.
    /// The modified flag is cleared only on success.
    pub fn write_to(&mut self, path: impl AsRef<Path>) -> BufferResult<()> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp_path = path.with_file_name(format!(".{file_name}.scribe-tmp"));

        std::fs::write(&temp_path, self.text().as_bytes())?;
        if let Err(err) = std::fs::rename(&temp_path, path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(err.into());
        }

        self.modified = false;
        self.history.seal();
        Ok(())
    }

    // ==================== Text Access ====================

    /// Returns the entire text content.
    #[inline]
    pub fn text(&self) -> Cow<'_, str> {
        self.rope.slice(..).into()
    }

    /// Returns a line without its trailing line break: one highlight block.
    pub fn block(&self, line_idx: usize) -> BufferResult<String> {
        if line_idx >= self.len_lines() {
            return Err(BufferError::PositionOutOfBounds {
                line: line_idx,
                column: 0,
            });
        }
        let line: String = self.rope.line(line_idx).into();
        let body_len = line.trim_end_matches(is_line_break).len();
        Ok(line[..body_len].to_string())
    }

    /// Returns a slice of text by character range.
    pub fn slice(&self, range: Range<usize>) -> BufferResult<Cow<'_, str>> {
        if range.start > range.end || range.end > self.len_chars() {
            return Err(BufferError::InvalidCharIndex(range.end));
        }
        Ok(self.rope.slice(range).into())
    }

    // ==================== Measurements ====================

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    #[inline]
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Number of lines. An empty buffer has one line, and a trailing line
    /// break starts a new empty line.
    #[inline]
    pub fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    /// Length of a line in characters, excluding its line break.
    pub fn line_len(&self, line_idx: usize) -> BufferResult<usize> {
        Ok(self.block(line_idx)?.chars().count())
    }

    // ==================== Mutations ====================

    /// Inserts text at a character index.
    pub fn insert(&mut self, char_idx: usize, text: &str) -> BufferResult<()> {
        if char_idx > self.len_chars() {
            return Err(BufferError::InvalidCharIndex(char_idx));
        }
        if text.is_empty() {
            return Ok(());
        }
        self.history.push(Edit::insert(char_idx, text));
        self.apply_insert(char_idx, text);
        Ok(())
    }

    /// Deletes text in a character range and returns it.
    pub fn delete(&mut self, range: Range<usize>) -> BufferResult<String> {
        if range.start > range.end || range.end > self.len_chars() {
            return Err(BufferError::InvalidCharIndex(range.end));
        }
        if range.is_empty() {
            return Ok(String::new());
        }
        let deleted: String = self.rope.slice(range.clone()).into();
        self.history.push(Edit::delete(range.start, deleted.clone()));
        self.apply_remove(range);
        Ok(deleted)
    }

    /// Replaces a range with new text as one undo step.
    pub fn replace(&mut self, range: Range<usize>, text: &str) -> BufferResult<String> {
        self.history.begin_group();
        let result = self.delete(range.clone()).and_then(|deleted| {
            self.insert(range.start, text)?;
            Ok(deleted)
        });
        self.history.end_group();
        result
    }

    /// Replaces the whole content without recording history; used when a
    /// session is reset or reloaded.
    pub fn reset(&mut self, text: &str) {
        let old_lines = self.len_lines();
        self.rope = Rope::from_str(text);
        self.history.clear();
        self.modified = false;
        self.changes.push(LineChange {
            first_line: 0,
            old_lines,
            new_lines: self.len_lines(),
        });
    }

    fn apply_insert(&mut self, char_idx: usize, text: &str) {
        let first_line = self.rope.char_to_line(char_idx);
        let before = self.rope.len_lines();
        self.rope.insert(char_idx, text);
        self.modified = true;
        self.changes.push(LineChange {
            first_line,
            old_lines: 1,
            new_lines: 1 + self.rope.len_lines().saturating_sub(before),
        });
    }

    fn apply_remove(&mut self, range: Range<usize>) {
        let first_line = self.rope.char_to_line(range.start);
        let before = self.rope.len_lines();
        self.rope.remove(range);
        self.modified = true;
        self.changes.push(LineChange {
            first_line,
            old_lines: 1 + before.saturating_sub(self.rope.len_lines()),
            new_lines: 1,
        });
    }

    /// Drains the block changes recorded since the last call, oldest first.
    pub fn take_changes(&mut self) -> Vec<LineChange> {
        std::mem::take(&mut self.changes)
    }

    // ==================== Undo/Redo ====================

    /// Undoes the last step. Returns the character index where the caret
    /// should land.
    pub fn undo(&mut self) -> BufferResult<usize> {
        let group = self.history.undo().ok_or(BufferError::NothingToUndo)?;
        let mut caret = 0;
        for edit in group.iter().rev() {
            caret = self.apply_reverse(edit);
        }
        Ok(caret)
    }

    /// Redoes the last undone step. Returns the caret character index.
    pub fn redo(&mut self) -> BufferResult<usize> {
        let group = self.history.redo().ok_or(BufferError::NothingToRedo)?;
        let mut caret = 0;
        for edit in &group {
            caret = self.apply_reverse(&edit.inverse());
        }
        Ok(caret)
    }

    /// Applies the inverse of `edit` without recording it.
    fn apply_reverse(&mut self, edit: &Edit) -> usize {
        match edit.kind {
            EditKind::Insert => {
                self.apply_remove(edit.position..edit.position + edit.char_len());
                edit.position
            }
            EditKind::Delete => {
                self.apply_insert(edit.position, &edit.content);
                edit.position + edit.char_len()
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Ends the current typing run so the next edit starts a new undo step.
    pub fn seal_history(&mut self) {
        self.history.seal();
    }

    // ==================== Position Conversion ====================

    /// Converts a (line, column) position to a character index.
    ///
    /// The column may sit at the end of the line but not past it.
    pub fn position_to_char_idx(&self, pos: Position) -> BufferResult<usize> {
        let line_len = self
            .line_len(pos.line)
            .map_err(|_| BufferError::PositionOutOfBounds {
                line: pos.line,
                column: pos.column,
            })?;
        if pos.column > line_len {
            return Err(BufferError::PositionOutOfBounds {
                line: pos.line,
                column: pos.column,
            });
        }
        Ok(self.rope.line_to_char(pos.line) + pos.column)
    }

    /// Converts a character index to a (line, column) position.
    pub fn char_idx_to_position(&self, char_idx: usize) -> BufferResult<Position> {
        if char_idx > self.len_chars() {
            return Err(BufferError::InvalidCharIndex(char_idx));
        }
        let line = self.rope.char_to_line(char_idx);
        Ok(Position::new(line, char_idx - self.rope.line_to_char(line)))
    }

    // ==================== State Queries ====================

    /// Returns true if the buffer has unsaved changes.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    // ==================== Search ====================

    /// Finds `matcher` forward from character index `from`, wrapping to the
    /// top once. The returned range is in characters.
    pub fn find(&self, matcher: &Matcher, from: usize) -> Option<SearchMatch> {
        let text = self.text();
        let from = self.rope.char_to_byte(from.min(self.len_chars()));
        let found = matcher.find_wrapping(&text, from)?;
        Some(SearchMatch {
            range: self.byte_range_to_chars(found.range),
            wrapped: found.wrapped,
        })
    }

    /// Replaces every match of `matcher` as one undo step and returns the
    /// number of occurrences replaced.
    ///
    /// Matches are replaced back to front so only the lines that contain
    /// one produce a [`LineChange`].
    pub fn replace_all(&mut self, matcher: &Matcher, replacement: &str) -> BufferResult<usize> {
        let ranges: Vec<Range<usize>> = {
            let text = self.text();
            matcher
                .find_all(&text)
                .into_iter()
                .map(|range| self.byte_range_to_chars(range))
                .collect()
        };

        self.history.begin_group();
        let result = ranges.iter().rev().try_for_each(|range| {
            self.delete(range.clone())?;
            self.insert(range.start, replacement)
        });
        self.history.end_group();
        result.map(|()| ranges.len())
    }

    fn byte_range_to_chars(&self, range: Range<usize>) -> Range<usize> {
        self.rope.byte_to_char(range.start)..self.rope.byte_to_char(range.end)
    }
}

/// Characters ropey treats as line breaks.
fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}'
    )
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for TextBuffer {
    fn from(s: &str) -> Self {
        Self::from_rope(Rope::from_str(s))
    }
}

impl From<String> for TextBuffer {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_insert_reports_new_blocks() {
        let mut buffer = TextBuffer::from("one\ntwo\nthree");
        buffer.insert(4, "a\nb\n").unwrap();

        assert_eq!(buffer.text(), "one\na\nb\ntwo\nthree");
        assert_eq!(
            buffer.take_changes(),
            vec![LineChange {
                first_line: 1,
                old_lines: 1,
                new_lines: 3
            }]
        );
        assert!(buffer.take_changes().is_empty());
    }

    #[test]
    fn test_delete_reports_joined_blocks() {
        let mut buffer = TextBuffer::from("one\ntwo\nthree");
        let deleted = buffer.delete(2..9).unwrap();

        assert_eq!(deleted, "e\ntwo\nt");
        assert_eq!(buffer.text(), "onhree");
        assert_eq!(
            buffer.take_changes(),
            vec![LineChange {
                first_line: 0,
                old_lines: 3,
                new_lines: 1
            }]
        );
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut buffer = TextBuffer::new();
        buffer.insert(0, "Hello").unwrap();
        buffer.seal_history();
        buffer.insert(5, " World").unwrap();

        assert_eq!(buffer.undo().unwrap(), 5);
        assert_eq!(buffer.text(), "Hello");
        assert_eq!(buffer.redo().unwrap(), 11);
        assert_eq!(buffer.text(), "Hello World");
        assert!(matches!(
            TextBuffer::new().undo(),
            Err(BufferError::NothingToUndo)
        ));
    }

    #[test]
    fn test_replace_all_is_one_undo_step() {
        let mut buffer = TextBuffer::from("foo bar\nFOO baz\nqux");
        let matcher = Matcher::new("foo", false).unwrap();

        assert_eq!(buffer.replace_all(&matcher, "x").unwrap(), 2);
        assert_eq!(buffer.text(), "x bar\nx baz\nqux");
        assert!(buffer.take_changes().iter().all(|c| c.first_line < 2));

        buffer.undo().unwrap();
        assert_eq!(buffer.text(), "foo bar\nFOO baz\nqux");
    }

    #[test]
    fn test_find_uses_char_offsets() {
        let buffer = TextBuffer::from("héllo wörld héllo");
        let matcher = Matcher::new("héllo", true).unwrap();

        let first = buffer.find(&matcher, 1).unwrap();
        assert_eq!(first.range, 12..17);
        assert!(!first.wrapped);

        let wrapped = buffer.find(&matcher, 13).unwrap();
        assert_eq!(wrapped.range, 0..5);
        assert!(wrapped.wrapped);
    }

    #[test]
    fn test_position_round_trip() {
        let buffer = TextBuffer::from("ab\ncd");
        let idx = buffer.position_to_char_idx(Position::new(1, 2)).unwrap();
        assert_eq!(idx, 5);
        assert_eq!(buffer.char_idx_to_position(idx).unwrap(), Position::new(1, 2));
        assert!(buffer.position_to_char_idx(Position::new(0, 3)).is_err());
    }

    #[test]
    fn test_failed_write_keeps_modified_flag() {
        let dir = tempdir().unwrap();
        let mut buffer = TextBuffer::from("data");
        buffer.insert(0, "x").unwrap();

        let missing = dir.path().join("no/such/dir/file.txt");
        assert!(buffer.write_to(&missing).is_err());
        assert!(buffer.is_modified());

        let target = dir.path().join("file.txt");
        buffer.write_to(&target).unwrap();
        assert!(!buffer.is_modified());
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "xdata");
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bin.dat");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

        assert!(matches!(TextBuffer::from_file(&path), Err(BufferError::Io(_))));
    }
}
