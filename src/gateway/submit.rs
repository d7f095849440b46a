use tokio::time::Instant;
use tracing::debug;

use crate::error::GatewayError;

use super::client::GatewayTransport;
use super::types::{CommandSpec, TaskHandle};
use super::wire;

/// Sends execute requests. Submission only; completion is the poller's job.
#[derive(Clone, Copy)]
pub struct TaskSubmitter<'transport> {
    transport: &'transport dyn GatewayTransport,
}

impl<'transport> TaskSubmitter<'transport> {
    #[must_use]
    pub const fn new(transport: &'transport dyn GatewayTransport) -> Self {
        Self { transport }
    }

    /// Submits `spec` and returns the handle carrying the new task id.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails or the response carries no
    /// task id. Failed submissions are never retried.
    pub async fn submit(&self, spec: &CommandSpec) -> Result<TaskHandle, GatewayError> {
        let submitted_at = Instant::now();
        let body = self.transport.execute(spec).await?;
        let task_id = wire::parse_task_id(&body)?;
        debug!(
            "Submitted '{}' as task {} in {:?}",
            spec.command,
            task_id,
            submitted_at.elapsed()
        );
        Ok(TaskHandle {
            task_id,
            submitted_at,
        })
    }
}
