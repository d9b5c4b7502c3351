//! SSH adapter implementing [`RemoteShellPort`]
//!
//! Every call opens its own libssh2 session. All libssh2 I/O is blocking, so
//! it runs on tokio's blocking thread pool.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use application::error::ApplicationError;
use application::ports::{CommandOutput, LineSink, LineStream, RemoteShellPort};
use async_trait::async_trait;
use domain::RemoteTarget;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use ssh2::{CheckResult, KnownHostFileKind, Session};
use tracing::{debug, instrument, warn};

/// Byte sent to the remote process to interrupt it (Ctrl-C)
const INTERRUPT: &[u8] = b"\x03";

const TEARDOWN_TIMEOUT_MS: u32 = 2_000;

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 90;
const DEFAULT_POLL_INTERVAL_MS: u64 = 20;
const DEFAULT_STREAM_BUFFER: usize = 256;

/// SSH transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SshConfig {
    /// TCP connect and handshake timeout in seconds (default: 10)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Upper bound on a single blocking I/O call of an executed command
    /// in seconds (default: 90)
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,

    /// Private key file tried first for every session
    #[serde(default)]
    pub private_key_path: Option<PathBuf>,

    /// Passphrase for the private key
    #[serde(default, skip_serializing)]
    pub private_key_passphrase: Option<SecretString>,

    /// OpenSSH known_hosts file; host keys are not checked when unset
    #[serde(default)]
    pub known_hosts_path: Option<PathBuf>,

    /// Sleep between polls of an idle streaming channel (default: 20ms)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Lines buffered between the reader thread and the consumer (default: 256)
    #[serde(default = "default_stream_buffer")]
    pub stream_buffer: usize,
}

const fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

const fn default_command_timeout() -> u64 {
    DEFAULT_COMMAND_TIMEOUT_SECS
}

const fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

const fn default_stream_buffer() -> usize {
    DEFAULT_STREAM_BUFFER
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            command_timeout_secs: default_command_timeout(),
            private_key_path: None,
            private_key_passphrase: None,
            known_hosts_path: None,
            poll_interval_ms: default_poll_interval(),
            stream_buffer: default_stream_buffer(),
        }
    }
}

impl SshConfig {
    fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }

    fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs.max(1))
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// Splits a byte stream into text lines, carrying partial lines across reads
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    /// Create an empty splitter
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes; returns every line completed by them, without terminators
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    /// Flush a trailing line that never got its newline
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        Some(String::from_utf8_lossy(&rest).into_owned())
    }
}

/// [`RemoteShellPort`] over SSH
#[derive(Debug, Clone)]
pub struct SshShellAdapter {
    config: Arc<SshConfig>,
}

impl SshShellAdapter {
    /// Create an adapter with the given transport configuration
    pub fn new(config: SshConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

#[async_trait]
impl RemoteShellPort for SshShellAdapter {
    #[instrument(skip(self), fields(host = %target))]
    async fn execute(
        &self,
        target: &RemoteTarget,
        command: &str,
    ) -> Result<CommandOutput, ApplicationError> {
        let config = Arc::clone(&self.config);
        let target = target.clone();
        let command = command.to_string();
        tokio::task::spawn_blocking(move || {
            let session = open_session(&config, &target)?;
            session.set_timeout(timeout_millis(config.command_timeout()));
            let output = run_to_completion(&session, &target, &command);
            disconnect(&session);
            output
        })
        .await
        .map_err(|e| ApplicationError::Internal(format!("SSH worker failed: {e}")))?
    }

    #[instrument(skip(self), fields(host = %target))]
    async fn follow(
        &self,
        target: &RemoteTarget,
        command: &str,
    ) -> Result<LineStream, ApplicationError> {
        let config = Arc::clone(&self.config);
        let setup_target = target.clone();
        let setup_command = command.to_string();
        let (session, channel) = tokio::task::spawn_blocking(move || {
            let session = open_session(&config, &setup_target)?;
            let mut channel = session
                .channel_session()
                .map_err(|e| map_ssh_error(&setup_target, &e))?;
            // With a pty the interrupt byte sent at teardown reaches the
            // remote process as SIGINT instead of plain stdin
            channel
                .request_pty("xterm", None, None)
                .map_err(|e| map_ssh_error(&setup_target, &e))?;
            channel
                .exec(&setup_command)
                .map_err(|e| map_ssh_error(&setup_target, &e))?;
            Ok::<_, ApplicationError>((session, channel))
        })
        .await
        .map_err(|e| ApplicationError::Internal(format!("SSH worker failed: {e}")))??;

        let (stream, sink) = LineStream::channel(self.config.stream_buffer);
        let poll = self.config.poll_interval();
        let host = target.to_string();
        tokio::task::spawn_blocking(move || pump_lines(&session, channel, sink, poll, &host));
        debug!("Remote follower started");
        Ok(stream)
    }
}

/// Connect, verify the host key and authenticate
fn open_session(config: &SshConfig, target: &RemoteTarget) -> Result<Session, ApplicationError> {
    let tcp = connect_tcp(target, config.connect_timeout())?;

    let mut session = Session::new()
        .map_err(|e| ApplicationError::transport(target.to_string(), e.to_string()))?;
    session.set_timeout(timeout_millis(config.connect_timeout()));
    session.set_tcp_stream(tcp);
    session
        .handshake()
        .map_err(|e| map_ssh_error(target, &e))?;

    if let Some(known_hosts) = &config.known_hosts_path {
        verify_host_key(&session, target, known_hosts)?;
    }
    authenticate(&session, config, target)?;

    // Followers run unbounded; `execute` sets its own command timeout
    session.set_timeout(0);
    debug!(user = target.credentials().username(), "SSH session established");
    Ok(session)
}

fn timeout_millis(timeout: Duration) -> u32 {
    u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX)
}

fn connect_tcp(target: &RemoteTarget, timeout: Duration) -> Result<TcpStream, ApplicationError> {
    let addrs: Vec<SocketAddr> = (target.host(), target.port())
        .to_socket_addrs()
        .map_err(|e| {
            ApplicationError::transport(target.to_string(), format!("Cannot resolve host: {e}"))
        })?
        .collect();

    let mut last_error = None;
    for addr in &addrs {
        match TcpStream::connect_timeout(addr, timeout) {
            Ok(tcp) => return Ok(tcp),
            Err(e) => {
                debug!(%addr, error = %e, "TCP connect failed");
                last_error = Some(e);
            },
        }
    }
    let message = last_error.map_or_else(
        || "Host resolved to no addresses".to_string(),
        |e| format!("Failed to connect: {e}"),
    );
    Err(ApplicationError::transport(target.to_string(), message))
}

fn verify_host_key(
    session: &Session,
    target: &RemoteTarget,
    known_hosts: &Path,
) -> Result<(), ApplicationError> {
    let mut hosts = session
        .known_hosts()
        .map_err(|e| map_ssh_error(target, &e))?;
    hosts
        .read_file(known_hosts, KnownHostFileKind::OpenSSH)
        .map_err(|e| {
            ApplicationError::transport(
                target.to_string(),
                format!("Cannot read known hosts {}: {e}", known_hosts.display()),
            )
        })?;
    let (key, _) = session.host_key().ok_or_else(|| {
        ApplicationError::transport(target.to_string(), "Server sent no host key")
    })?;

    match hosts.check_port(target.host(), target.port(), key) {
        CheckResult::Match => Ok(()),
        CheckResult::NotFound => Err(ApplicationError::transport(
            target.to_string(),
            format!("Host key not found in {}", known_hosts.display()),
        )),
        CheckResult::Mismatch => Err(ApplicationError::transport(
            target.to_string(),
            "Host key mismatch",
        )),
        CheckResult::Failure => Err(ApplicationError::transport(
            target.to_string(),
            "Host key check failed",
        )),
    }
}

/// Try private key, then password, then the ssh-agent
fn authenticate(
    session: &Session,
    config: &SshConfig,
    target: &RemoteTarget,
) -> Result<(), ApplicationError> {
    let credentials = target.credentials();
    let user = credentials.username();
    let mut attempted = false;

    if let Some(key) = &config.private_key_path {
        attempted = true;
        let passphrase = config
            .private_key_passphrase
            .as_ref()
            .map(|p| p.expose_secret());
        if let Err(e) = session.userauth_pubkey_file(user, None, key, passphrase) {
            debug!(error = %e, key = %key.display(), "Public key authentication failed");
        }
    }

    if !session.authenticated() {
        if let Some(password) = credentials.password() {
            attempted = true;
            if let Err(e) = session.userauth_password(user, password) {
                debug!(error = %e, "Password authentication failed");
            }
        }
    }

    if !session.authenticated() && !attempted {
        if let Err(e) = session.userauth_agent(user) {
            debug!(error = %e, "Agent authentication failed");
        }
    }

    if session.authenticated() {
        Ok(())
    } else {
        Err(ApplicationError::transport(
            target.to_string(),
            format!("Authentication failed for user '{user}'"),
        ))
    }
}

fn run_to_completion(
    session: &Session,
    target: &RemoteTarget,
    command: &str,
) -> Result<CommandOutput, ApplicationError> {
    let mut channel = session
        .channel_session()
        .map_err(|e| map_ssh_error(target, &e))?;
    channel
        .exec(command)
        .map_err(|e| map_ssh_error(target, &e))?;

    let mut stdout = String::new();
    channel.read_to_string(&mut stdout).map_err(|e| {
        ApplicationError::transport(target.to_string(), format!("stdout read failed: {e}"))
    })?;
    let mut stderr = String::new();
    channel.stderr().read_to_string(&mut stderr).map_err(|e| {
        ApplicationError::transport(target.to_string(), format!("stderr read failed: {e}"))
    })?;

    channel
        .wait_close()
        .map_err(|e| map_ssh_error(target, &e))?;
    let exit_status = channel
        .exit_status()
        .map_err(|e| map_ssh_error(target, &e))?;
    debug!(command, exit_status, "Remote command finished");

    Ok(CommandOutput::new(exit_status)
        .with_stdout(stdout)
        .with_stderr(stderr))
}

/// Forward stdout lines until the command ends or the consumer stops listening
fn pump_lines(
    session: &Session,
    mut channel: ssh2::Channel,
    mut sink: LineSink,
    poll: Duration,
    host: &str,
) {
    session.set_blocking(false);
    let mut splitter = LineSplitter::new();
    let mut buf = [0u8; 8192];

    loop {
        if sink.is_cancelled() {
            debug!("Follower interrupted by consumer");
            break;
        }
        match channel.read(&mut buf) {
            Ok(0) if channel.eof() => {
                if let Some(rest) = splitter.finish() {
                    sink.blocking_send(Ok(rest));
                }
                debug!("Remote command ended");
                break;
            },
            Ok(0) => std::thread::sleep(poll),
            Ok(n) => {
                let delivered = splitter
                    .push(&buf[..n])
                    .into_iter()
                    .all(|line| sink.blocking_send(Ok(line)));
                if !delivered {
                    break;
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => std::thread::sleep(poll),
            Err(e) => {
                warn!(error = %e, "Remote stream read failed");
                sink.blocking_send(Err(ApplicationError::transport(
                    host,
                    format!("stream read failed: {e}"),
                )));
                break;
            },
        }
    }

    // Best-effort teardown, bounded so a dead peer cannot hang the worker
    session.set_blocking(true);
    session.set_timeout(TEARDOWN_TIMEOUT_MS);
    let _ = channel.write(INTERRUPT);
    let _ = channel.close();
    disconnect(session);
}

fn disconnect(session: &Session) {
    if let Err(e) = session.disconnect(None, "disruption-generator done", None) {
        debug!(error = %e, "SSH disconnect failed");
    }
}

fn map_ssh_error(target: &RemoteTarget, err: &ssh2::Error) -> ApplicationError {
    ApplicationError::transport(target.to_string(), format!("SSH error: {}", err.message()))
}
