use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

use crate::error::GatewayError;
use crate::metrics::{LatencyAggregator, LatencySample};

use super::POLL_ENDPOINT;
use super::client::GatewayTransport;
use super::types::{TaskHandle, TaskInfo, TaskStatus};
use super::wire;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_wait: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            max_wait: Duration::from_secs(10),
        }
    }
}

/// Single status query.
///
/// # Errors
///
/// Returns an error when the call fails, the body is malformed, or the
/// status string is not recognized.
pub async fn fetch_status(
    transport: &dyn GatewayTransport,
    task_id: &str,
) -> Result<TaskInfo, GatewayError> {
    let body = transport.task_status(task_id).await?;
    wire::parse_task_info(task_id, &body)
}

/// Repeats status queries until the task reaches a terminal state or the
/// wait budget is spent.
pub struct TaskPoller<'poll> {
    transport: &'poll dyn GatewayTransport,
    settings: PollSettings,
    recorder: Option<&'poll LatencyAggregator>,
}

impl<'poll> TaskPoller<'poll> {
    #[must_use]
    pub const fn new(transport: &'poll dyn GatewayTransport, settings: PollSettings) -> Self {
        Self {
            transport,
            settings,
            recorder: None,
        }
    }

    /// Records one latency sample per status query.
    #[must_use]
    pub const fn with_recorder(mut self, recorder: &'poll LatencyAggregator) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Polls `handle` until its status is terminal.
    ///
    /// The wait budget is measured from the start of polling. A query that
    /// fails ends polling immediately with that error.
    ///
    /// # Errors
    ///
    /// Returns `PollTimeout` carrying the last observed status when
    /// `max_wait` elapses first, or the error of the failing query.
    pub async fn poll_until_terminal(&self, handle: &TaskHandle) -> Result<TaskInfo, GatewayError> {
        let started = Instant::now();
        let mut last_status: Option<TaskStatus> = None;
        loop {
            let query_started = Instant::now();
            let outcome = fetch_status(self.transport, &handle.task_id).await;
            if let Some(recorder) = self.recorder {
                recorder.record(LatencySample::new(
                    POLL_ENDPOINT,
                    query_started.elapsed(),
                    outcome.is_ok(),
                ));
            }
            let info = outcome?;

            if let Some(previous) = last_status
                && info.status.rank() < previous.rank()
            {
                warn!(
                    "Task {} status went backwards: {} -> {}",
                    handle.task_id, previous, info.status
                );
            }
            last_status = Some(info.status);

            if info.status.is_terminal() {
                debug!(
                    "Task {} reached {} after {:?}",
                    handle.task_id,
                    info.status,
                    handle.submitted_at.elapsed()
                );
                return Ok(info);
            }

            let elapsed = started.elapsed();
            let Some(remaining) = self.settings.max_wait.checked_sub(elapsed) else {
                return Err(self.timeout(handle, elapsed, info.status));
            };
            if remaining.is_zero() {
                return Err(self.timeout(handle, elapsed, info.status));
            }
            sleep(self.settings.interval.min(remaining)).await;
        }
    }

    fn timeout(&self, handle: &TaskHandle, elapsed: Duration, last_status: TaskStatus) -> GatewayError {
        GatewayError::PollTimeout {
            task_id: handle.task_id.clone(),
            elapsed,
            max_wait: self.settings.max_wait,
            last_status,
        }
    }
}
