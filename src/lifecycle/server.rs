use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::LifecycleError;

const SERVER_LOG_TARGET: &str = "gateprobe::server";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSpec {
    pub command: String,
    pub args: Vec<String>,
    /// Substring of an output line that means the server accepts requests.
    pub ready_pattern: String,
    pub ready_timeout: Duration,
    pub stop_grace: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Graceful(ExitStatus),
    Killed(ExitStatus),
    AlreadyExited(ExitStatus),
}

/// A running server child. Its stdout and stderr are drained for the whole
/// lifetime of the process; lines are forwarded for readiness detection
/// until the server is ready.
#[derive(Debug)]
pub struct ServerProcess {
    child: Child,
    lines: mpsc::UnboundedReceiver<String>,
}

fn drain<R>(stream: R, name: &'static str, lines: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream).lines();
        loop {
            match reader.next_line().await {
                Ok(Some(line)) => {
                    debug!(target: SERVER_LOG_TARGET, stream = name, "{}", line);
                    if !lines.is_closed() {
                        drop(lines.send(line));
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    debug!(target: SERVER_LOG_TARGET, stream = name, "read error: {}", err);
                    break;
                }
            }
        }
    });
}

impl ServerProcess {
    /// Spawns the server with both output streams piped.
    ///
    /// # Errors
    ///
    /// Returns `Spawn` when the command cannot be started.
    pub fn start(spec: &ServerSpec) -> Result<Self, LifecycleError> {
        let mut command = Command::new(&spec.command);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        let mut child = command.spawn().map_err(|source| LifecycleError::Spawn {
            command: spec.command.clone(),
            source,
        })?;
        info!(
            "Started server '{}' (pid {:?})",
            spec.command,
            child.id()
        );

        let (tx, lines) = mpsc::unbounded_channel();
        if let Some(stdout) = child.stdout.take() {
            drain(stdout, "stdout", tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            drain(stderr, "stderr", tx);
        }
        Ok(Self { child, lines })
    }

    /// Waits for an output line containing `pattern`.
    ///
    /// # Errors
    ///
    /// Returns `StartupTimeout` when `timeout` elapses first and
    /// `ExitedBeforeReady` when both streams close without a match.
    pub async fn await_ready(
        &mut self,
        pattern: &str,
        timeout: Duration,
    ) -> Result<(), LifecycleError> {
        let lines = &mut self.lines;
        let seen = async {
            while let Some(line) = lines.recv().await {
                if line.contains(pattern) {
                    return true;
                }
            }
            false
        };
        let outcome = tokio::time::timeout(timeout, seen).await;
        match outcome {
            Ok(true) => {
                // Readers keep logging; they just stop forwarding.
                self.lines.close();
                Ok(())
            }
            Ok(false) => Err(LifecycleError::ExitedBeforeReady {
                pattern: pattern.to_owned(),
            }),
            Err(_elapsed) => Err(LifecycleError::StartupTimeout {
                pattern: pattern.to_owned(),
                timeout,
            }),
        }
    }

    #[cfg(unix)]
    fn terminate(&mut self) -> Result<(), LifecycleError> {
        let Some(pid) = self.child.id() else {
            return Ok(());
        };
        let raw_pid = libc::pid_t::try_from(pid).map_err(|_err| LifecycleError::InvalidPid { pid })?;
        // SAFETY: `kill` has no memory-safety preconditions; the pid belongs
        // to a child we have not reaped yet.
        let rc = unsafe { libc::kill(raw_pid, libc::SIGTERM) };
        if rc == 0 {
            return Ok(());
        }
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::ESRCH) {
            return Ok(());
        }
        Err(LifecycleError::Signal { pid, source: err })
    }

    #[cfg(not(unix))]
    fn terminate(&mut self) -> Result<(), LifecycleError> {
        self.child
            .start_kill()
            .map_err(|source| LifecycleError::Kill { source })
    }

    /// Sends SIGTERM, waits up to `grace`, then kills.
    ///
    /// # Errors
    ///
    /// Returns an error when signalling or reaping the child fails.
    pub async fn stop(mut self, grace: Duration) -> Result<StopOutcome, LifecycleError> {
        if let Some(status) = self
            .child
            .try_wait()
            .map_err(|source| LifecycleError::Wait { source })?
        {
            info!("Server had already exited with {}", status);
            return Ok(StopOutcome::AlreadyExited(status));
        }

        self.terminate()?;
        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(status) => {
                let status = status.map_err(|source| LifecycleError::Wait { source })?;
                info!("Server stopped with {}", status);
                Ok(StopOutcome::Graceful(status))
            }
            Err(_elapsed) => {
                warn!("Server ignored SIGTERM for {:?}; killing it", grace);
                self.child
                    .start_kill()
                    .map_err(|source| LifecycleError::Kill { source })?;
                let status = self
                    .child
                    .wait()
                    .await
                    .map_err(|source| LifecycleError::Wait { source })?;
                Ok(StopOutcome::Killed(status))
            }
        }
    }
}
