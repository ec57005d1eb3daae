//! Event bus for editor notifications.
//!
//! Front ends never poll the editor for state changes; they subscribe to a
//! `tokio::sync::broadcast` channel and redraw what the events name.

use std::ops::Range;
use std::path::PathBuf;
use tokio::sync::broadcast;

use crate::config::Theme;
use crate::registry::TabId;
use scribe_runner::JobId;
use scribe_syntax::LanguageTag;

/// Events that can occur in the editor.
#[derive(Debug, Clone)]
pub enum EditorEvent {
    // Session events
    /// A session was opened in a new tab
    SessionOpened(TabId),
    /// A tab was closed
    SessionClosed(TabId),
    /// A session was written to disk
    SessionSaved { tab: TabId, path: PathBuf },
    /// A tab was brought to the front
    SessionFocused(TabId),
    /// Text changed and these blocks carry fresh spans
    SessionChanged { tab: TabId, blocks: Range<usize> },
    /// The session's language changed (open or save-as)
    LanguageChanged { tab: TabId, language: LanguageTag },

    // Cursor events
    /// Caret or selection moved; carries the status bar text
    CursorMoved { tab: TabId, status: String },

    // Settings events
    /// Configuration changed
    ConfigChanged,
    /// Theme changed
    ThemeChanged(Theme),
    /// Font family or size changed
    FontChanged { family: String, size: u32 },
    /// Recent files list changed
    RecentFilesChanged,

    // Feedback
    /// Transient status bar message
    StatusMessage(String),
    /// Something the user must acknowledge, such as a failed save
    Notification { title: String, message: String },
    /// A background run finished
    CommandFinished(JobId),

    /// Editor is quitting
    Quit,
}

/// Event bus for broadcasting editor events.
///
/// Lagging receivers lose old events rather than blocking the sender.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EditorEvent>,
}

impl EventBus {
    /// Creates a new event bus.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    /// Emits an event to all subscribers.
    pub fn emit(&self, event: EditorEvent) {
        // no receivers is fine
        let _ = self.sender.send(event);
    }

    /// Returns a receiver that will get all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Wraps a receiver and skips over lag.
pub struct EventHandler {
    receiver: broadcast::Receiver<EditorEvent>,
}

impl EventHandler {
    /// Creates a new event handler.
    pub fn new(receiver: broadcast::Receiver<EditorEvent>) -> Self {
        Self { receiver }
    }

    /// Waits for the next event.
    pub async fn next(&mut self) -> Option<EditorEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Event handler lagged, missed {} events", n);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Returns every event queued so far without waiting.
    pub fn drain(&mut self) -> Vec<EditorEvent> {
        let mut events = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(event) => events.push(event),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    tracing::warn!("Event handler lagged, missed {} events", n);
                }
                Err(_) => return events,
            }
        }
    }
}
