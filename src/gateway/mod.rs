//! Gateway request/response contract: task submission and completion polling.
mod client;
mod health;
mod poll;
mod submit;
mod types;
pub(crate) mod wire;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{GatewayTransport, HttpGatewayTransport};
pub use health::{check_health, is_healthy};
pub use poll::{PollSettings, TaskPoller, fetch_status};
pub use submit::TaskSubmitter;
pub use types::{CommandSpec, TaskHandle, TaskInfo, TaskResult, TaskStatus};

/// Bucket names used for latency samples, one per gateway call site.
pub const HEALTH_ENDPOINT: &str = "Health Check";
pub const EXECUTE_ENDPOINT: &str = "Execute";
pub const STATUS_ENDPOINT: &str = "Get Task Status";
pub const POLL_ENDPOINT: &str = "Poll Task Status";
/// End-to-end time from submission to an observed terminal status.
pub const COMPLETION_ENDPOINT: &str = "Task Completion";

#[must_use]
pub fn execute_endpoint_name(command: &str) -> String {
    format!("{} {}", EXECUTE_ENDPOINT, command)
}
