//! One-shot child processes with a timeout.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::{ProcessError, ProcessResult};

/// Default limit for a single command or script run
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Which programs run scripts, and for how long.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerConfig {
    pub timeout: Duration,
    /// Interpreter for `.py` files
    pub python: String,
    /// Interpreter for `.js` files
    pub node: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            python: if cfg!(windows) { "python" } else { "python3" }.to_string(),
            node: "node".to_string(),
        }
    }
}

impl RunnerConfig {
    /// Picks the interpreter for a script, by lowercased extension.
    pub fn interpreter_for(&self, path: &Path) -> ProcessResult<&str> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "py" => Ok(&self.python),
            "js" => Ok(&self.node),
            _ => Err(ProcessError::UnsupportedFileType(ext)),
        }
    }
}

/// Captured output of a finished process.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was ended by a signal
    pub exit_code: Option<i32>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Turns a non-zero exit into [`ProcessError::NonZeroExit`].
    pub fn into_result(self) -> ProcessResult<ProcessOutput> {
        if self.success() {
            Ok(self)
        } else {
            Err(ProcessError::NonZeroExit {
                code: self.exit_code,
                stderr: self.stderr,
            })
        }
    }
}

/// Runs `command` through the platform shell and captures its output.
///
/// A non-zero exit is reported in [`ProcessOutput::exit_code`], not as an
/// error. The child is killed if `timeout` elapses first.
pub async fn run_shell_command(command: &str, timeout: Duration) -> ProcessResult<ProcessOutput> {
    let (shell, flag) = if cfg!(windows) {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    };
    let mut cmd = Command::new(shell);
    cmd.arg(flag).arg(command);
    execute(cmd, shell, timeout).await
}

/// Runs a script with the interpreter its extension selects.
///
/// The file must exist and have a `.py` or `.js` extension; otherwise
/// nothing is executed.
pub async fn run_file(path: &Path, config: &RunnerConfig) -> ProcessResult<ProcessOutput> {
    if !path.is_file() {
        return Err(ProcessError::FileNotFound(path.to_path_buf()));
    }
    let program = config.interpreter_for(path)?;

    let mut cmd = Command::new(program);
    cmd.arg(path);
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        cmd.current_dir(dir);
    }
    execute(cmd, program, config.timeout).await
}

async fn execute(mut cmd: Command, program: &str, timeout: Duration) -> ProcessResult<ProcessOutput> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn().map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => ProcessError::NotFound {
            program: program.to_string(),
        },
        _ => ProcessError::Io(err),
    })?;

    // dropping the wait future on timeout drops the child, which kills it
    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| ProcessError::Timeout(timeout))??;

    tracing::debug!("{} exited with {:?}", program, output.status.code());
    Ok(ProcessOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code: output.status.code(),
    })
}

/// What a job was asked to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunRequest {
    Shell(String),
    File(PathBuf),
}

impl std::fmt::Display for RunRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunRequest::Shell(command) => f.write_str(command),
            RunRequest::File(path) => write!(
                f,
                "{}",
                path.file_name().map(Path::new).unwrap_or(path.as_path()).display()
            ),
        }
    }
}
