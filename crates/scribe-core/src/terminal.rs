//! Terminal panel state: the output log and the command history.

use serde::{Deserialize, Serialize};

/// Append-only text shown in the terminal panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputLog {
    lines: Vec<String>,
}

impl OutputLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message. Trailing line breaks are dropped and embedded
    /// ones split the message into several lines.
    pub fn append(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref().trim_end_matches(['\n', '\r']);
        self.lines.extend(text.lines().map(str::to_string));
        if text.is_empty() {
            self.lines.push(String::new());
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The whole log joined with line breaks.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Previously entered commands, navigated like a shell's history.
#[derive(Debug, Clone, Default)]
pub struct CommandHistory {
    entries: Vec<String>,
    /// Position while browsing; `entries.len()` means "past the newest"
    cursor: usize,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a command and stops browsing. Blank commands are ignored.
    pub fn push(&mut self, command: impl Into<String>) {
        let command = command.into();
        if !command.trim().is_empty() {
            self.entries.push(command);
        }
        self.cursor = self.entries.len();
    }

    /// Steps back to an older command; stays on the oldest.
    pub fn previous(&mut self) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        self.cursor = self.cursor.saturating_sub(1);
        self.entries.get(self.cursor).map(String::as_str)
    }

    /// Steps forward to a newer command. Past the newest, returns `None`
    /// so the input line can be cleared.
    pub fn next(&mut self) -> Option<&str> {
        if self.cursor < self.entries.len() {
            self.cursor += 1;
        }
        self.entries.get(self.cursor).map(String::as_str)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_splits_lines() {
        let mut log = OutputLog::new();
        log.append("> ls");
        log.append("a.py\nb.js\n");
        assert_eq!(log.lines(), ["> ls", "a.py", "b.js"]);
        assert_eq!(log.last(), Some("b.js"));

        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_history_navigation() {
        let mut history = CommandHistory::new();
        history.push("ls");
        history.push("  ");
        history.push("pwd");

        assert_eq!(history.previous(), Some("pwd"));
        assert_eq!(history.previous(), Some("ls"));
        assert_eq!(history.previous(), Some("ls"));
        assert_eq!(history.next(), Some("pwd"));
        assert_eq!(history.next(), None);
        assert_eq!(history.next(), None);
        assert_eq!(history.previous(), Some("pwd"));
    }

    #[test]
    fn test_empty_history() {
        let mut history = CommandHistory::new();
        assert_eq!(history.previous(), None);
        assert_eq!(history.next(), None);
    }
}
