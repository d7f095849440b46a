use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;
use tracing::{info, warn};

use crate::args::CheckArgs;
use crate::error::{AppResult, CheckError};
use crate::gateway::{
    CommandSpec, GatewayTransport, HttpGatewayTransport, PollSettings, TaskInfo, TaskPoller,
    TaskStatus, TaskSubmitter, check_health, is_healthy,
};
use crate::shutdown::{ShutdownReceiver, ShutdownSender};

use super::server::with_optional_server;

/// Files the check expects to see in the `ls -la` output.
pub(crate) const FIXTURE_FILES: [&str; 3] = ["file1.txt", "file2.txt", "file3.txt"];

/// Directory listed by the check. Holds the temp dir so it lives as long as
/// the check does.
pub(crate) struct Workspace {
    path: PathBuf,
    _temp: Option<TempDir>,
}

impl Workspace {
    pub(crate) fn prepare(requested: Option<&Path>) -> Result<Self, CheckError> {
        let (path, temp) = match requested {
            Some(path) => {
                std::fs::create_dir_all(path).map_err(|err| CheckError::Fixture {
                    path: path.to_path_buf(),
                    source: err,
                })?;
                (path.to_path_buf(), None)
            }
            None => {
                let temp = tempfile::Builder::new()
                    .prefix("gateprobe-check-")
                    .tempdir()
                    .map_err(|err| CheckError::Fixture {
                        path: std::env::temp_dir(),
                        source: err,
                    })?;
                (temp.path().to_path_buf(), Some(temp))
            }
        };

        for name in FIXTURE_FILES {
            let file = path.join(name);
            std::fs::write(&file, format!("Content of {}", name))
                .map_err(|err| CheckError::Fixture { path: file, source: err })?;
        }
        Ok(Self { path, _temp: temp })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

/// Completed with every fixture name in stdout, or the first mismatch.
pub(crate) fn verify_listing(info: &TaskInfo) -> Result<(), CheckError> {
    if info.status != TaskStatus::Completed {
        let (exit_code, stderr) = info
            .result
            .as_ref()
            .map_or_else(
                || (None, String::new()),
                |result| (result.exit_code, result.stderr.clone()),
            );
        return Err(CheckError::TaskNotCompleted {
            task_id: info.task_id.clone(),
            status: info.status,
            exit_code,
            stderr,
        });
    }
    let stdout = info.stdout();
    if let Some(missing) = FIXTURE_FILES.into_iter().find(|name| !stdout.contains(name)) {
        return Err(CheckError::MissingOutput {
            task_id: info.task_id.clone(),
            expected: missing.to_owned(),
        });
    }
    Ok(())
}

/// Runs the listing check until it finishes or a shutdown signal arrives.
pub(crate) async fn check_gateway(
    transport: &dyn GatewayTransport,
    workspace: &Path,
    poll: PollSettings,
    command_timeout: Duration,
    mut shutdown_rx: ShutdownReceiver,
) -> AppResult<TaskInfo> {
    tokio::select! {
        _ = shutdown_rx.recv() => {
            warn!("Check interrupted by shutdown signal");
            Err(CheckError::Interrupted.into())
        }
        result = list_workspace(transport, workspace, poll, command_timeout) => result,
    }
}

async fn list_workspace(
    transport: &dyn GatewayTransport,
    workspace: &Path,
    poll: PollSettings,
    command_timeout: Duration,
) -> AppResult<TaskInfo> {
    let status = check_health(transport).await?;
    if !is_healthy(&status) {
        return Err(CheckError::Unhealthy { status }.into());
    }
    info!("Health check passed ('{}')", status);

    let spec = CommandSpec::new(
        "ls",
        ["-la".to_owned(), workspace.display().to_string()],
        command_timeout,
    );
    let handle = TaskSubmitter::new(transport).submit(&spec).await?;
    info!("Submitted task {}", handle.task_id);

    let info = TaskPoller::new(transport, poll)
        .poll_until_terminal(&handle)
        .await?;
    verify_listing(&info)?;
    Ok(info)
}

/// Runs the `check` subcommand.
pub(crate) async fn run_check(args: &CheckArgs, shutdown_tx: &ShutdownSender) -> AppResult<()> {
    let transport = HttpGatewayTransport::new(&args.gateway.url, args.gateway.request_timeout)?;
    let workspace = Workspace::prepare(args.workspace.as_deref())?;
    let poll = PollSettings {
        interval: args.poll_interval,
        max_wait: args.poll_max_wait,
    };

    let gateway = &transport;
    let dir = workspace.path();
    let shutdown_rx = shutdown_tx.subscribe();
    let info = with_optional_server(&args.gateway, || async move {
        check_gateway(gateway, dir, poll, args.gateway.command_timeout, shutdown_rx).await
    })
    .await?;

    println!(
        "Check passed: task {} listed {} in {}",
        info.task_id,
        FIXTURE_FILES.join(", "),
        workspace.path().display()
    );
    Ok(())
}
