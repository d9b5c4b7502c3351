//! Log listener service
//!
//! Follows a remote log file over a fresh session and reports whether a
//! pattern shows up in a newly written line before a deadline.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use domain::{ListenerSpec, LogPath, LogPattern, RemoteTarget};
use parking_lot::Mutex;
use tokio::time::{Instant, sleep_until, timeout_at};
use tracing::{debug, info, instrument};

use crate::error::ApplicationError;
use crate::ports::{LineStream, RemoteShellPort};

/// Result of a single [`LogListener::tail`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailOutcome {
    /// A new line matched the pattern in time
    Matched,
    /// The deadline passed without a matching line
    TimedOut,
    /// The log was already watched by this listener; nothing was done
    AlreadyWatched,
}

/// Build the remote follow command for a log path
///
/// `-n 0` skips the existing tail of the file so only new lines count.
#[must_use]
pub fn tail_command(path: &LogPath) -> String {
    format!("tail -F -n 0 {}", shell_words::quote(path.as_str()))
}

/// Watches remote logs on the listener host of one scenario
///
/// Each log path is followed at most once per listener; the path is
/// remembered (case-insensitively) before the session is opened.
pub struct LogListener {
    target: RemoteTarget,
    shell: Arc<dyn RemoteShellPort>,
    watched: Mutex<HashSet<String>>,
}

impl fmt::Debug for LogListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogListener")
            .field("target", &self.target)
            .field("watched", &self.watched.lock().len())
            .finish_non_exhaustive()
    }
}

impl LogListener {
    /// Create a listener for the host named in `spec`
    pub fn new(spec: &ListenerSpec, shell: Arc<dyn RemoteShellPort>) -> Self {
        Self {
            target: spec.target.clone(),
            shell,
            watched: Mutex::new(HashSet::new()),
        }
    }

    /// Follow `log_path` until a new line matches `pattern` or `timeout` elapses
    ///
    /// The remote follower is interrupted and its session closed before this
    /// returns, whatever the outcome.
    #[instrument(skip_all, fields(host = %self.target, log = %log_path))]
    pub async fn tail(
        &self,
        log_path: &LogPath,
        pattern: &LogPattern,
        timeout: Duration,
    ) -> Result<TailOutcome, ApplicationError> {
        if !self.watched.lock().insert(log_path.watch_key()) {
            debug!("Log already watched by this listener");
            return Ok(TailOutcome::AlreadyWatched);
        }

        let command = tail_command(log_path);
        let mut stream = self.shell.follow(&self.target, &command).await?;
        let deadline = Instant::now() + timeout;
        info!(pattern = %pattern, timeout_secs = timeout.as_secs(), "Listening for pattern");

        let outcome = match timeout_at(deadline, first_match(&mut stream, pattern)).await {
            Ok(Ok(true)) => TailOutcome::Matched,
            Ok(Ok(false)) => {
                debug!("Remote follower ended early, waiting out the deadline");
                sleep_until(deadline).await;
                TailOutcome::TimedOut
            },
            Ok(Err(e)) => {
                stream.interrupt();
                return Err(e);
            },
            Err(_) => TailOutcome::TimedOut,
        };
        stream.interrupt();

        match outcome {
            TailOutcome::Matched => info!("Pattern found"),
            _ => info!("Pattern not found before timeout"),
        }
        Ok(outcome)
    }
}

/// Read lines until one matches; `false` if the stream ends first
async fn first_match(
    stream: &mut LineStream,
    pattern: &LogPattern,
) -> Result<bool, ApplicationError> {
    while let Some(line) = stream.next_line().await {
        let line = line?;
        if pattern.is_match(&line) {
            debug!(line = %line, "Found occurrence");
            return Ok(true);
        }
    }
    Ok(false)
}
