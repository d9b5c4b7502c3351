//! Remote shell port - Interface for running commands on remote hosts
//!
//! Every call opens its own session; nothing is pooled or shared between
//! operations.

use std::fmt;

use async_trait::async_trait;
use domain::RemoteTarget;
#[cfg(test)]
use mockall::automock;
use tokio::sync::{mpsc, oneshot};

use crate::error::ApplicationError;

/// Result of a command run to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Remote exit status
    pub exit_status: i32,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl CommandOutput {
    /// Create an output with the given exit status and no captured text
    #[must_use]
    pub const fn new(exit_status: i32) -> Self {
        Self {
            exit_status,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    /// Attach captured stdout
    #[must_use]
    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    /// Attach captured stderr
    #[must_use]
    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }

    /// Whether the command exited with status 0
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_status == 0
    }
}

type LineResult = Result<String, ApplicationError>;

/// Lines produced by a long-running remote command
///
/// Dropping the stream (or calling [`LineStream::interrupt`]) tells the
/// producer to interrupt the remote process and close its session.
pub struct LineStream {
    lines: mpsc::Receiver<LineResult>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl LineStream {
    /// Create a connected stream/sink pair
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, LineSink) {
        let (line_tx, line_rx) = mpsc::channel(capacity.max(1));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        (
            Self {
                lines: line_rx,
                shutdown: Some(shutdown_tx),
            },
            LineSink {
                lines: line_tx,
                shutdown: shutdown_rx,
                cancelled: false,
            },
        )
    }

    /// Next complete line, or `None` once the remote command has ended
    pub async fn next_line(&mut self) -> Option<LineResult> {
        self.lines.recv().await
    }

    /// Ask the producer to stop the remote command
    pub fn interrupt(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            // The producer may already be gone
            let _ = shutdown.send(());
        }
    }

    /// Whether [`LineStream::interrupt`] has been called
    pub fn is_interrupted(&self) -> bool {
        self.shutdown.is_none()
    }
}

impl Drop for LineStream {
    fn drop(&mut self) {
        self.interrupt();
    }
}

impl fmt::Debug for LineStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineStream")
            .field("interrupted", &self.is_interrupted())
            .finish_non_exhaustive()
    }
}

/// Producer side of a [`LineStream`]
pub struct LineSink {
    lines: mpsc::Sender<LineResult>,
    shutdown: oneshot::Receiver<()>,
    cancelled: bool,
}

impl LineSink {
    /// Deliver a line from async code; `false` once the consumer is gone
    pub async fn send(&self, line: LineResult) -> bool {
        self.lines.send(line).await.is_ok()
    }

    /// Deliver a line from a blocking thread; `false` once the consumer is gone
    pub fn blocking_send(&self, line: LineResult) -> bool {
        self.lines.blocking_send(line).is_ok()
    }

    /// Non-blocking check whether the consumer asked to stop or went away
    pub fn is_cancelled(&mut self) -> bool {
        if !self.cancelled {
            self.cancelled = !matches!(
                self.shutdown.try_recv(),
                Err(oneshot::error::TryRecvError::Empty)
            );
        }
        self.cancelled
    }

    /// Wait until the consumer asks to stop or goes away
    pub async fn cancelled(&mut self) {
        if !self.cancelled {
            let _ = (&mut self.shutdown).await;
            self.cancelled = true;
        }
    }
}

impl fmt::Debug for LineSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineSink")
            .field("cancelled", &self.cancelled)
            .finish_non_exhaustive()
    }
}

/// Port for remote-shell operations
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RemoteShellPort: Send + Sync {
    /// Open a session, run `command` to completion, close the session
    ///
    /// A non-zero exit status is a normal result; only failing to reach,
    /// authenticate or talk to the host is an error.
    async fn execute(
        &self,
        target: &RemoteTarget,
        command: &str,
    ) -> Result<CommandOutput, ApplicationError>;

    /// Open a session and start a long-running command, streaming its stdout
    ///
    /// The session stays open until the returned stream is interrupted or
    /// dropped, or the command ends on its own.
    async fn follow(
        &self,
        target: &RemoteTarget,
        command: &str,
    ) -> Result<LineStream, ApplicationError>;
}
