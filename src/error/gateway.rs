use std::time::Duration;

use thiserror::Error;

use crate::gateway::TaskStatus;

/// Client-side failures talking to the gateway. None of these are retried.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Transport failure calling {endpoint} after {elapsed:?}: {source}")]
    Transport {
        endpoint: &'static str,
        elapsed: Duration,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} returned HTTP {status} after {elapsed:?}: {body}")]
    UnexpectedStatus {
        endpoint: &'static str,
        status: u16,
        elapsed: Duration,
        body: String,
    },
    #[error("Malformed response from {endpoint}: {reason}")]
    MalformedResponse {
        endpoint: &'static str,
        reason: String,
    },
    #[error("Task {task_id} reported unknown status '{value}'")]
    UnknownStatus { task_id: String, value: String },
    #[error(
        "Task {task_id} not terminal after {elapsed:?} (max wait {max_wait:?}, last status {last_status})"
    )]
    PollTimeout {
        task_id: String,
        elapsed: Duration,
        max_wait: Duration,
        last_status: TaskStatus,
    },
}

impl GatewayError {
    pub(crate) fn malformed(endpoint: &'static str, reason: impl Into<String>) -> Self {
        GatewayError::MalformedResponse {
            endpoint,
            reason: reason.into(),
        }
    }
}
