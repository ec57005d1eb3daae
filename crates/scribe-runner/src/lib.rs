//! # Scribe Runner
//!
//! Runs shell commands and scripts for the terminal panel.
//!
//! - [`run_shell_command`] hands a command line to `sh -c` (`cmd /C` on
//!   Windows).
//! - [`run_file`] picks an interpreter from the file extension: `.py` runs
//!   with Python, `.js` with Node.
//! - [`CommandRunner`] does either in the background and reports back over
//!   a channel.
//!
//! Every run is bounded by a timeout (30 seconds unless configured), after
//! which the child is killed.

mod process;
mod runner;

use std::path::PathBuf;
use std::time::Duration;

pub use process::{
    DEFAULT_TIMEOUT, ProcessOutput, RunRequest, RunnerConfig, run_file, run_shell_command,
};
pub use runner::{CommandRunner, JobId, RunReport};

/// Result type for process runs
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Ways a run can fail.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Timed out after {}s", .0.as_secs_f32())]
    Timeout(Duration),

    #[error("Interpreter not found: {program}")]
    NotFound { program: String },

    #[error("Exited with code {}", code.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("Unsupported file type: .{0}")]
    UnsupportedFileType(String),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ProcessError::Timeout(DEFAULT_TIMEOUT).to_string(),
            "Timed out after 30s"
        );
        assert_eq!(
            ProcessError::UnsupportedFileType("rb".into()).to_string(),
            "Unsupported file type: .rb"
        );
        assert_eq!(
            ProcessError::NonZeroExit {
                code: Some(2),
                stderr: String::new()
            }
            .to_string(),
            "Exited with code 2"
        );
    }

    #[test]
    fn test_interpreter_dispatch() {
        let config = RunnerConfig::default();
        assert_eq!(
            config.interpreter_for(std::path::Path::new("a.PY")).unwrap(),
            config.python
        );
        assert_eq!(
            config.interpreter_for(std::path::Path::new("a.js")).unwrap(),
            "node"
        );
        assert!(config.interpreter_for(std::path::Path::new("a")).is_err());
    }
}
