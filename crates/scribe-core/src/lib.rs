//! # Scribe Core
//!
//! Editor state and the operations a front end drives it with.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                         Editor                           │
//! │  ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────┐ │
//! │  │  Config  │ │  Keymap  │ │ Explorer │ │ CommandRunner│ │
//! │  └──────────┘ └──────────┘ └──────────┘ └──────────────┘ │
//! │  ┌────────────────────────────────────┐  ┌─────────────┐ │
//! │  │          SessionRegistry           │  │  OutputLog  │ │
//! │  │  ┌─────────┐ ┌─────────┐ ┌───────┐ │  │  + history  │ │
//! │  │  │ Session │ │ Session │ │  ...  │ │  └─────────────┘ │
//! │  │  └─────────┘ └─────────┘ └───────┘ │                  │
//! │  └────────────────────────────────────┘                  │
//! └──────────────────────────────────────────────────────────┘
//!          ▲ ActionTable::dispatch          │ EventBus
//!          │                                ▼
//!                        front end
//! ```
//!
//! The editor is owned by one thread. Child processes run on a tokio
//! runtime and report back over a channel; state changes go out over a
//! broadcast [`EventBus`].

pub mod action;
pub mod config;
pub mod editor;
pub mod event;
pub mod explorer;
pub mod keymap;
pub mod recent;
pub mod registry;
pub mod session;
pub mod terminal;

use std::path::{Path, PathBuf};

use scribe_buffer::BufferError;
use scribe_runner::ProcessError;

pub use action::{Action, ActionTable, SearchQuery};
pub use config::{Config, ConfigError, Theme};
pub use editor::Editor;
pub use event::{EditorEvent, EventBus, EventHandler};
pub use explorer::{FileNode, FileTree, NodeKind};
pub use keymap::{Key, KeyPress, Keymap, Modifiers, Shortcut};
pub use recent::RecentFiles;
pub use registry::{CloseOutcome, SessionRegistry, TabId};
pub use session::{EditorSession, ReplaceOutcome};
pub use terminal::{CommandHistory, OutputLog};

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{}: {source}", path.display())]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Tab not found: {0}")]
    SessionNotFound(TabId),

    #[error("No active session")]
    NoActiveSession,

    #[error("Session has no file path")]
    NoFilePath,

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Action {action} needs an argument: {expected}")]
    MissingArgument { action: String, expected: &'static str },

    #[error("Buffer error: {0}")]
    Buffer(#[from] BufferError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Process(#[from] ProcessError),
}

impl CoreError {
    /// Attaches `path` to an I/O failure from the buffer layer. Other
    /// buffer errors pass through unchanged.
    pub fn file_io(path: &Path, err: BufferError) -> Self {
        match err {
            BufferError::Io(source) => CoreError::FileIo {
                path: path.to_path_buf(),
                source,
            },
            other => CoreError::Buffer(other),
        }
    }

    /// True for failures reading or writing a document.
    pub fn is_file_io(&self) -> bool {
        matches!(self, CoreError::FileIo { .. })
    }
}
