//! In-memory gateway used by unit tests.
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::error::GatewayError;

use super::client::GatewayTransport;
use super::types::CommandSpec;
use super::{EXECUTE_ENDPOINT, STATUS_ENDPOINT};

#[derive(Debug, Clone)]
pub(crate) struct TaskScript {
    /// Status queries answered with `RUNNING` before the terminal status.
    pub running_polls: u32,
    /// Terminal wire status, e.g. `COMPLETED` or `TASK_FAILED`.
    pub terminal: String,
    /// Wrap the status under `task_info` like the gRPC gateway does.
    pub nested: bool,
}

impl Default for TaskScript {
    fn default() -> Self {
        Self {
            running_polls: 1,
            terminal: "COMPLETED".to_owned(),
            nested: false,
        }
    }
}

#[derive(Debug)]
pub(crate) struct FakeTask {
    command: String,
    polls: u32,
}

#[derive(Debug, Default)]
pub(crate) struct FakeGateway {
    pub script: TaskScript,
    pub health_status: Option<String>,
    pub reject_execute: bool,
    pub omit_task_id: bool,
    /// Simulated latency added to every call.
    pub latency: Duration,
    pub next_id: AtomicU64,
    pub tasks: Mutex<HashMap<String, FakeTask>>,
    pub execute_calls: AtomicU64,
    pub status_calls: AtomicU64,
}

impl FakeGateway {
    pub(crate) fn with_script(script: TaskScript) -> Self {
        Self {
            script,
            ..Self::default()
        }
    }

    pub(crate) fn executed_commands(&self) -> Vec<String> {
        let tasks = self
            .tasks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        tasks.values().map(|task| task.command.clone()).collect()
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl GatewayTransport for FakeGateway {
    async fn health(&self) -> Result<Vec<u8>, GatewayError> {
        self.simulate_latency().await;
        let status = self.health_status.clone().unwrap_or_else(|| "ok".to_owned());
        Ok(json!({ "status": status }).to_string().into_bytes())
    }

    async fn execute(&self, spec: &CommandSpec) -> Result<Vec<u8>, GatewayError> {
        self.simulate_latency().await;
        self.execute_calls.fetch_add(1, Ordering::Relaxed);
        if self.reject_execute {
            return Err(GatewayError::UnexpectedStatus {
                endpoint: EXECUTE_ENDPOINT,
                status: 503,
                elapsed: self.latency,
                body: "unavailable".to_owned(),
            });
        }
        if self.omit_task_id {
            return Ok(b"{\"accepted\":true}".to_vec());
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let task_id = format!("task-{}", id);
        let mut tasks = self
            .tasks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        tasks.insert(
            task_id.clone(),
            FakeTask {
                command: spec.command.clone(),
                polls: 0,
            },
        );
        Ok(json!({ "task_id": task_id }).to_string().into_bytes())
    }

    async fn task_status(&self, task_id: &str) -> Result<Vec<u8>, GatewayError> {
        self.simulate_latency().await;
        self.status_calls.fetch_add(1, Ordering::Relaxed);
        let mut tasks = self
            .tasks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let Some(task) = tasks.get_mut(task_id) else {
            return Err(GatewayError::UnexpectedStatus {
                endpoint: STATUS_ENDPOINT,
                status: 404,
                elapsed: self.latency,
                body: format!("task {} not found", task_id),
            });
        };
        task.polls = task.polls.saturating_add(1);
        let status = if task.polls > self.script.running_polls {
            self.script.terminal.clone()
        } else {
            "RUNNING".to_owned()
        };
        let body = if self.script.nested {
            json!({
                "task_info": { "status": status },
                "result": { "stdout": format!("ran {}", task.command), "stderr": "", "exit_code": 0 },
            })
        } else {
            json!({
                "status": status,
                "result": { "stdout": format!("ran {}", task.command), "stderr": "", "exit_code": 0 },
            })
        };
        Ok(body.to_string().into_bytes())
    }
}
