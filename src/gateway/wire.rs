//! JSON bodies exchanged with the gateway and their normalization.
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

use super::types::{CommandSpec, TaskInfo, TaskResult, TaskStatus};
use super::{EXECUTE_ENDPOINT, HEALTH_ENDPOINT, STATUS_ENDPOINT};

#[derive(Debug, Serialize)]
pub(crate) struct ExecuteRequest<'spec> {
    pub command: &'spec str,
    pub args: &'spec [String],
    /// Whole seconds; the gateway rejects sub-second limits.
    pub timeout: u64,
}

impl<'spec> From<&'spec CommandSpec> for ExecuteRequest<'spec> {
    fn from(spec: &'spec CommandSpec) -> Self {
        Self {
            command: &spec.command,
            args: &spec.args,
            timeout: spec.timeout.as_secs().max(1),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExecuteBody {
    task_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HealthBody {
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TaskStatusBody {
    status: Option<String>,
    task_info: Option<TaskInfoBody>,
    result: Option<ResultBody>,
}

#[derive(Debug, Deserialize)]
struct TaskInfoBody {
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResultBody {
    stdout: Option<String>,
    stderr: Option<String>,
    exit_code: Option<i32>,
}

pub(crate) fn parse_task_id(body: &[u8]) -> Result<String, GatewayError> {
    let parsed: ExecuteBody = serde_json::from_slice(body)
        .map_err(|err| GatewayError::malformed(EXECUTE_ENDPOINT, format!("invalid JSON: {}", err)))?;
    match parsed.task_id {
        Some(task_id) if !task_id.trim().is_empty() => Ok(task_id),
        Some(_) => Err(GatewayError::malformed(EXECUTE_ENDPOINT, "empty task_id")),
        None => Err(GatewayError::malformed(EXECUTE_ENDPOINT, "missing task_id")),
    }
}

pub(crate) fn parse_health(body: &[u8]) -> Result<String, GatewayError> {
    let parsed: HealthBody = serde_json::from_slice(body)
        .map_err(|err| GatewayError::malformed(HEALTH_ENDPOINT, format!("invalid JSON: {}", err)))?;
    parsed
        .status
        .ok_or_else(|| GatewayError::malformed(HEALTH_ENDPOINT, "missing status"))
}

/// Accepts both the flat `{status, result}` body and the nested
/// `{task_info: {status}, result}` body.
pub(crate) fn parse_task_info(task_id: &str, body: &[u8]) -> Result<TaskInfo, GatewayError> {
    let parsed: TaskStatusBody = serde_json::from_slice(body).map_err(|err| {
        GatewayError::malformed(
            STATUS_ENDPOINT,
            format!("invalid JSON for task {}: {}", task_id, err),
        )
    })?;
    let raw_status = parsed
        .status
        .or_else(|| parsed.task_info.and_then(|info| info.status))
        .ok_or_else(|| {
            GatewayError::malformed(STATUS_ENDPOINT, format!("missing status for task {}", task_id))
        })?;
    let status = TaskStatus::from_wire(&raw_status).ok_or_else(|| GatewayError::UnknownStatus {
        task_id: task_id.to_owned(),
        value: raw_status.clone(),
    })?;
    let result = parsed.result.map(|result| TaskResult {
        stdout: result.stdout.unwrap_or_default(),
        stderr: result.stderr.unwrap_or_default(),
        exit_code: result.exit_code,
    });
    Ok(TaskInfo {
        task_id: task_id.to_owned(),
        status,
        result,
    })
}
