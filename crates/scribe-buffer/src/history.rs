//! Undo/redo history.
//!
//! Each undo step is a group of edits. A single keystroke is a group of
//! one; compound operations such as replace-all open a group so the whole
//! operation undoes in one step. Consecutive single-character typing is
//! merged into one step until the history is sealed (caret jump, save,
//! undo/redo).

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// The type of edit operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditKind {
    /// Text was inserted
    Insert,
    /// Text was deleted
    Delete,
}

/// A single primitive edit, in character offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    pub kind: EditKind,
    /// Character position where the edit occurred
    pub position: usize,
    /// The text that was inserted or deleted
    pub content: String,
}

impl Edit {
    /// Creates an insert edit.
    pub fn insert(position: usize, content: impl Into<String>) -> Self {
        Self {
            kind: EditKind::Insert,
            position,
            content: content.into(),
        }
    }

    /// Creates a delete edit.
    pub fn delete(position: usize, content: impl Into<String>) -> Self {
        Self {
            kind: EditKind::Delete,
            position,
            content: content.into(),
        }
    }

    /// Returns the edit that reverses this one.
    pub fn inverse(&self) -> Self {
        Self {
            kind: match self.kind {
                EditKind::Insert => EditKind::Delete,
                EditKind::Delete => EditKind::Insert,
            },
            position: self.position,
            content: self.content.clone(),
        }
    }

    /// Number of characters this edit covers.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    /// Two edits merge when they are the same kind, adjacent, and neither
    /// crosses a line break.
    fn can_merge(&self, next: &Edit) -> bool {
        if self.kind != next.kind || self.content.contains('\n') || next.content.contains('\n') {
            return false;
        }

        match self.kind {
            EditKind::Insert => self.position + self.char_len() == next.position,
            // backspace runs move left, forward-delete runs stay put
            EditKind::Delete => {
                next.position + next.char_len() == self.position || next.position == self.position
            }
        }
    }

    fn merge(&mut self, next: Edit) {
        match self.kind {
            EditKind::Insert => self.content.push_str(&next.content),
            EditKind::Delete if next.position < self.position => {
                self.content = next.content + &self.content;
                self.position = next.position;
            }
            EditKind::Delete => self.content.push_str(&next.content),
        }
    }
}

/// Bounded undo/redo stacks of edit groups.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: VecDeque<Vec<Edit>>,
    redo_stack: Vec<Vec<Edit>>,
    max_size: usize,
    open_group: Option<Vec<Edit>>,
    sealed: bool,
}

impl History {
    /// Creates a history keeping at most `max_size` undo steps.
    pub fn new(max_size: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_size: max_size.max(1),
            open_group: None,
            sealed: true,
        }
    }

    /// Records an edit. Clears the redo stack.
    pub fn push(&mut self, edit: Edit) {
        self.redo_stack.clear();

        if let Some(group) = self.open_group.as_mut() {
            group.push(edit);
            return;
        }

        if !self.sealed {
            if let Some([last]) = self.undo_stack.back_mut().map(Vec::as_mut_slice) {
                if last.can_merge(&edit) {
                    last.merge(edit);
                    return;
                }
            }
        }

        self.sealed = false;
        self.push_group(vec![edit]);
    }

    /// Starts a group: every edit until [`History::end_group`] undoes as
    /// one step.
    pub fn begin_group(&mut self) {
        if self.open_group.is_none() {
            self.open_group = Some(Vec::new());
        }
    }

    /// Closes the current group.
    pub fn end_group(&mut self) {
        if let Some(group) = self.open_group.take() {
            if !group.is_empty() {
                self.push_group(group);
            }
        }
        self.sealed = true;
    }

    /// Stops the next edit from merging into the previous step.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Pops the most recent step. The edits are returned in the order they
    /// were applied; undo them back to front.
    pub fn undo(&mut self) -> Option<Vec<Edit>> {
        let group = self.undo_stack.pop_back()?;
        self.redo_stack.push(group.clone());
        self.sealed = true;
        Some(group)
    }

    /// Pops the most recently undone step, to be re-applied front to back.
    pub fn redo(&mut self) -> Option<Vec<Edit>> {
        let group = self.redo_stack.pop()?;
        self.undo_stack.push_back(group.clone());
        self.sealed = true;
        Some(group)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Drops every step.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.open_group = None;
        self.sealed = true;
    }

    fn push_group(&mut self, group: Vec<Edit>) {
        self.undo_stack.push_back(group);
        while self.undo_stack.len() > self.max_size {
            self.undo_stack.pop_front();
        }
    }
}
