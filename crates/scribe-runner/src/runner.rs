//! Background jobs.
//!
//! The editor never waits on a child process. [`CommandRunner`] spawns each
//! run onto a tokio runtime and the finished [`RunReport`] comes back over
//! an mpsc channel, drained with [`CommandRunner::poll`] or awaited with
//! [`CommandRunner::recv`].

use std::path::PathBuf;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::process::{RunRequest, RunnerConfig, run_file, run_shell_command};
use crate::{ProcessOutput, ProcessResult};

/// Identifies one spawned run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(u64);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The outcome of one run.
#[derive(Debug)]
pub struct RunReport {
    pub job: JobId,
    pub request: RunRequest,
    pub outcome: ProcessResult<ProcessOutput>,
}

/// Spawns runs in the background and collects their reports.
pub struct CommandRunner {
    handle: Handle,
    config: RunnerConfig,
    next_id: u64,
    reports_tx: mpsc::UnboundedSender<RunReport>,
    reports_rx: mpsc::UnboundedReceiver<RunReport>,
    in_flight: usize,
}

impl CommandRunner {
    /// Creates a runner that spawns onto `handle`.
    pub fn new(handle: Handle, config: RunnerConfig) -> Self {
        let (reports_tx, reports_rx) = mpsc::unbounded_channel();
        Self {
            handle,
            config,
            next_id: 1,
            reports_tx,
            reports_rx,
            in_flight: 0,
        }
    }

    /// Creates a runner on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn current(config: RunnerConfig) -> Self {
        Self::new(Handle::current(), config)
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Starts a shell command.
    pub fn spawn_shell(&mut self, command: impl Into<String>) -> JobId {
        self.spawn(RunRequest::Shell(command.into()))
    }

    /// Starts a script with its interpreter.
    pub fn spawn_file(&mut self, path: impl Into<PathBuf>) -> JobId {
        self.spawn(RunRequest::File(path.into()))
    }

    /// Starts a run and returns its id immediately.
    pub fn spawn(&mut self, request: RunRequest) -> JobId {
        let job = JobId(self.next_id);
        self.next_id += 1;
        let tx = self.reports_tx.clone();
        let config = self.config.clone();
        self.in_flight += 1;

        tracing::info!("Starting job {}: {}", job, request);
        self.handle.spawn(async move {
            let outcome = match &request {
                RunRequest::Shell(command) => run_shell_command(command, config.timeout).await,
                RunRequest::File(path) => run_file(path, &config).await,
            };
            if let Err(err) = &outcome {
                tracing::warn!("Job {} failed: {}", job, err);
            }
            // the runner may have been dropped; nobody is left to tell
            let _ = tx.send(RunReport {
                job,
                request,
                outcome,
            });
        });
        job
    }

    /// Returns a finished report without waiting, if there is one.
    pub fn poll(&mut self) -> Option<RunReport> {
        let report = self.reports_rx.try_recv().ok()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(report)
    }

    /// Waits for the next finished report.
    ///
    /// Returns `None` immediately when no job is running.
    pub async fn recv(&mut self) -> Option<RunReport> {
        if self.in_flight == 0 {
            return None;
        }
        let report = self.reports_rx.recv().await?;
        self.in_flight -= 1;
        Some(report)
    }

    /// Number of spawned jobs whose report has not been collected.
    pub fn pending(&self) -> usize {
        self.in_flight
    }
}

impl std::fmt::Debug for CommandRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRunner")
            .field("config", &self.config)
            .field("pending", &self.in_flight)
            .finish()
    }
}
