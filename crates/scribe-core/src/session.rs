//! Editor sessions.
//!
//! An [`EditorSession`] is one open tab's worth of state: the text buffer,
//! the file it is bound to (if any), the language inferred from that file,
//! the caret, and a cache holding the highlighted spans of every block.
//!
//! The cache is kept in step with the buffer after every mutation. Only the
//! blocks named by the buffer's [`LineChange`] records are re-highlighted;
//! every other block keeps its cached spans.
//!
//! [`LineChange`]: scribe_buffer::LineChange

use scribe_buffer::{Cursor, Matcher, Position, SearchMatch, TextBuffer};
use scribe_syntax::{Highlighter, LanguageTag, StyledSpan, infer_language};
use std::borrow::Cow;
use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::{CoreError, CoreResult};

/// Title of a session with no backing file
pub const UNTITLED: &str = "Untitled";

/// One open document.
pub struct EditorSession {
    buffer: TextBuffer,
    path: Option<PathBuf>,
    language: LanguageTag,
    cursor: Cursor,
    highlighter: Highlighter,
    /// Highlighted spans, one entry per block
    spans: Vec<Vec<StyledSpan>>,
}

/// What [`EditorSession::replace_current`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceOutcome {
    /// True if the selection matched the needle and was replaced
    pub replaced: bool,
    /// The next occurrence, now selected
    pub next: Option<SearchMatch>,
}

impl EditorSession {
    /// Creates an empty untitled session.
    pub fn new() -> Self {
        let language = LanguageTag::default();
        let mut session = Self {
            buffer: TextBuffer::new(),
            path: None,
            language,
            cursor: Cursor::default(),
            highlighter: Highlighter::new(language),
            spans: Vec::new(),
        };
        session.rehighlight_all();
        session
    }

    /// Opens a session on a UTF-8 text file.
    pub fn from_file(path: impl AsRef<Path>) -> CoreResult<Self> {
        let mut session = Self::new();
        session.load(path)?;
        Ok(session)
    }

    // ==================== Getters ====================

    /// Returns the file path.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn language(&self) -> LanguageTag {
        self.language
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn text(&self) -> Cow<'_, str> {
        self.buffer.text()
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// Returns true if the session has unsaved changes.
    pub fn is_modified(&self) -> bool {
        self.buffer.is_modified()
    }

    /// File name, or "Untitled".
    pub fn title(&self) -> String {
        self.path
            .as_deref()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| UNTITLED.to_string())
    }

    /// Title with a trailing `*` while there are unsaved changes.
    pub fn display_title(&self) -> String {
        if self.is_modified() {
            format!("{}*", self.title())
        } else {
            self.title()
        }
    }

    /// Caret position in the status bar's form, e.g. "Ln 3, Col 7".
    pub fn cursor_status(&self) -> String {
        self.cursor.position.to_string()
    }

    /// Cached spans of one block; empty past the last block.
    pub fn block_spans(&self, line: usize) -> &[StyledSpan] {
        self.spans.get(line).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Cached spans of every block.
    pub fn all_spans(&self) -> &[Vec<StyledSpan>] {
        &self.spans
    }

    // ==================== File Operations ====================

    /// Replaces the content with the file at `path` and binds the session
    /// to it.
    ///
    /// On failure the session is left exactly as it was.
    pub fn load(&mut self, path: impl AsRef<Path>) -> CoreResult<()> {
        let path = path.as_ref();
        let buffer = TextBuffer::from_file(path).map_err(|err| CoreError::file_io(path, err))?;

        self.buffer = buffer;
        self.cursor = Cursor::default();
        self.bind_path(path);
        self.rehighlight_all();
        tracing::info!("Loaded {} as {}", path.display(), self.language);
        Ok(())
    }

    /// Writes the buffer to its bound path.
    pub fn save(&mut self) -> CoreResult<()> {
        let path = self.path.clone().ok_or(CoreError::NoFilePath)?;
        self.buffer
            .write_to(&path)
            .map_err(|err| CoreError::file_io(&path, err))?;
        tracing::info!("Saved {}", path.display());
        Ok(())
    }

    /// Writes the buffer to `path` and rebinds the session to it, which may
    /// change the language.
    ///
    /// On failure the path, language and modified flag are unchanged.
    pub fn save_as(&mut self, path: impl AsRef<Path>) -> CoreResult<()> {
        let path = path.as_ref();
        self.buffer
            .write_to(path)
            .map_err(|err| CoreError::file_io(path, err))?;

        let previous = self.language;
        self.bind_path(path);
        if self.language != previous {
            self.rehighlight_all();
        }
        tracing::info!("Saved {} as {}", path.display(), self.language);
        Ok(())
    }

    /// Empties the session and unbinds it from its file.
    pub fn reset(&mut self) {
        self.buffer.reset("");
        self.path = None;
        self.cursor = Cursor::default();
        self.language = LanguageTag::default();
        self.highlighter.configure(self.language);
        self.rehighlight_all();
    }

    fn bind_path(&mut self, path: &Path) {
        self.path = Some(path.to_path_buf());
        self.language = infer_language(path);
        self.highlighter.configure(self.language);
    }

    // ==================== Text Editing ====================

    /// Types `text` at the caret, replacing the selection if there is one.
    ///
    /// Returns the blocks that were re-highlighted.
    pub fn insert_text(&mut self, text: &str) -> CoreResult<Range<usize>> {
        let idx = match self.selection_chars()? {
            Some(range) => {
                let start = range.start;
                self.buffer.replace(range, text)?;
                start
            }
            None => {
                let idx = self.caret_idx()?;
                self.buffer.insert(idx, text)?;
                idx
            }
        };
        self.move_caret_to_idx(idx + text.chars().count())?;
        Ok(self.refresh_highlights())
    }

    /// Breaks the line at the caret. With `auto_indent`, the new line
    /// starts with the leading whitespace of the current one (up to the
    /// caret).
    pub fn insert_newline(&mut self, auto_indent: bool) -> CoreResult<Range<usize>> {
        let mut text = String::from("\n");
        if auto_indent {
            let position = self.cursor.position;
            let block = self.buffer.block(position.line)?;
            text.extend(
                block
                    .chars()
                    .take(position.column)
                    .take_while(|c| *c == ' ' || *c == '\t'),
            );
        }
        self.buffer.seal_history();
        self.insert_text(&text)
    }

    /// Inserts `tab_size` spaces.
    pub fn insert_tab(&mut self, tab_size: usize) -> CoreResult<Range<usize>> {
        self.insert_text(&" ".repeat(tab_size))
    }

    /// Deletes the selection, or the character before the caret.
    pub fn delete_backward(&mut self) -> CoreResult<Range<usize>> {
        if self.remove_selection()?.is_some() {
            return Ok(self.refresh_highlights());
        }
        let idx = self.caret_idx()?;
        if idx > 0 {
            self.buffer.delete(idx - 1..idx)?;
            self.move_caret_to_idx(idx - 1)?;
        }
        Ok(self.refresh_highlights())
    }

    /// Deletes the selection, or the character after the caret.
    pub fn delete_forward(&mut self) -> CoreResult<Range<usize>> {
        if self.remove_selection()?.is_some() {
            return Ok(self.refresh_highlights());
        }
        let idx = self.caret_idx()?;
        if idx < self.buffer.len_chars() {
            self.buffer.delete(idx..idx + 1)?;
        }
        Ok(self.refresh_highlights())
    }

    /// Removes the selected text and returns it.
    pub fn delete_selection(&mut self) -> CoreResult<Option<String>> {
        let deleted = self.remove_selection()?;
        self.refresh_highlights();
        Ok(deleted)
    }

    fn remove_selection(&mut self) -> CoreResult<Option<String>> {
        let Some(range) = self.selection_chars()? else {
            return Ok(None);
        };
        let start = range.start;
        let deleted = self.buffer.delete(range)?;
        self.move_caret_to_idx(start)?;
        Ok(Some(deleted))
    }

    /// Undoes the last step and puts the caret where it happened.
    pub fn undo(&mut self) -> CoreResult<Range<usize>> {
        let caret = self.buffer.undo()?;
        self.move_caret_to_idx(caret)?;
        Ok(self.refresh_highlights())
    }

    /// Redoes the last undone step.
    pub fn redo(&mut self) -> CoreResult<Range<usize>> {
        let caret = self.buffer.redo()?;
        self.move_caret_to_idx(caret)?;
        Ok(self.refresh_highlights())
    }

    // ==================== Cursor & Selection ====================

    /// Moves the caret, dropping the selection.
    pub fn move_to(&mut self, position: Position) -> CoreResult<()> {
        self.buffer.position_to_char_idx(position)?;
        self.buffer.seal_history();
        self.cursor.move_to(position);
        Ok(())
    }

    /// Selects from `anchor` to `position`.
    pub fn select(&mut self, anchor: Position, position: Position) -> CoreResult<()> {
        self.buffer.position_to_char_idx(anchor)?;
        self.buffer.position_to_char_idx(position)?;
        self.buffer.seal_history();
        self.cursor.select(anchor, position);
        Ok(())
    }

    /// Selects the whole buffer.
    pub fn select_all(&mut self) -> CoreResult<()> {
        let end = self.buffer.char_idx_to_position(self.buffer.len_chars())?;
        self.select(Position::ZERO, end)
    }

    /// Returns the selected text.
    pub fn selected_text(&self) -> Option<String> {
        let range = self.selection_chars().ok()??;
        self.buffer.slice(range).ok().map(Cow::into_owned)
    }

    // ==================== Find / Replace ====================

    /// Finds the next occurrence of `needle` after the caret, or after the
    /// selection when there is one, wrapping to the top once, and selects it.
    pub fn find_next(&mut self, needle: &str, case_sensitive: bool) -> CoreResult<Option<SearchMatch>> {
        let matcher = Matcher::new(needle, case_sensitive)?;
        let from = match self.selection_chars()? {
            Some(selection) => selection.end,
            None => self.caret_idx()?,
        };
        let Some(found) = self.buffer.find(&matcher, from) else {
            return Ok(None);
        };
        let start = self.buffer.char_idx_to_position(found.range.start)?;
        let end = self.buffer.char_idx_to_position(found.range.end)?;
        self.select(start, end)?;
        Ok(Some(found))
    }

    /// Replaces the selection if it is exactly one occurrence of `needle`,
    /// then selects the next occurrence.
    pub fn replace_current(
        &mut self,
        needle: &str,
        replacement: &str,
        case_sensitive: bool,
    ) -> CoreResult<ReplaceOutcome> {
        let matcher = Matcher::new(needle, case_sensitive)?;
        let replaced = match self.selected_text() {
            Some(selected) if matcher.matches_exactly(&selected) => {
                self.insert_text(replacement)?;
                true
            }
            _ => false,
        };
        let next = self.find_next(needle, case_sensitive)?;
        Ok(ReplaceOutcome { replaced, next })
    }

    /// Replaces every occurrence as one undo step and returns the count.
    pub fn replace_all(&mut self, needle: &str, replacement: &str, case_sensitive: bool) -> CoreResult<usize> {
        let matcher = Matcher::new(needle, case_sensitive)?;
        let caret = self.caret_idx()?;
        let count = self.buffer.replace_all(&matcher, replacement)?;
        if count > 0 {
            self.move_caret_to_idx(caret.min(self.buffer.len_chars()))?;
            self.refresh_highlights();
        }
        Ok(count)
    }

    // ==================== Highlighting ====================

    /// Re-highlights the blocks the buffer reports as changed and returns
    /// the range of blocks that got new spans.
    fn refresh_highlights(&mut self) -> Range<usize> {
        let changes = self.buffer.take_changes();
        if changes.is_empty() {
            return 0..0;
        }

        let line_count = self.buffer.len_lines();
        let mut slots: Vec<Option<Vec<StyledSpan>>> =
            std::mem::take(&mut self.spans).into_iter().map(Some).collect();
        for change in &changes {
            let end = change.first_line + change.old_lines;
            if end > slots.len() {
                tracing::warn!("Span cache out of step at block {}, rebuilding", end);
                slots = vec![None; line_count];
                break;
            }
            slots.splice(
                change.first_line..end,
                std::iter::repeat_n(None, change.new_lines),
            );
        }
        if slots.len() != line_count {
            slots = vec![None; line_count];
        }

        let dirty = slots
            .iter()
            .position(Option::is_none)
            .zip(slots.iter().rposition(Option::is_none))
            .map_or(0..0, |(first, last)| first..last + 1);

        self.spans = slots
            .into_iter()
            .enumerate()
            .map(|(line, cached)| cached.unwrap_or_else(|| self.highlight_block(line)))
            .collect();
        dirty
    }

    fn rehighlight_all(&mut self) {
        self.buffer.take_changes();
        self.spans = (0..self.buffer.len_lines())
            .map(|line| self.highlight_block(line))
            .collect();
    }

    fn highlight_block(&self, line: usize) -> Vec<StyledSpan> {
        self.buffer
            .block(line)
            .map(|block| self.highlighter.highlight(&block))
            .unwrap_or_default()
    }

    // ==================== Helpers ====================

    fn caret_idx(&self) -> CoreResult<usize> {
        Ok(self.buffer.position_to_char_idx(self.cursor.position)?)
    }

    fn move_caret_to_idx(&mut self, idx: usize) -> CoreResult<()> {
        let position = self.buffer.char_idx_to_position(idx)?;
        self.cursor.move_to(position);
        Ok(())
    }

    fn selection_chars(&self) -> CoreResult<Option<Range<usize>>> {
        let Some((start, end)) = self.cursor.selection_range() else {
            return Ok(None);
        };
        let start = self.buffer.position_to_char_idx(start)?;
        let end = self.buffer.position_to_char_idx(end)?;
        Ok(Some(start..end))
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("path", &self.path)
            .field("language", &self.language)
            .field("cursor", &self.cursor)
            .field("modified", &self.is_modified())
            .finish()
    }
}
