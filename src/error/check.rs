use std::path::PathBuf;

use thiserror::Error;

use crate::gateway::TaskStatus;

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("Health check reported '{status}'")]
    Unhealthy { status: String },
    #[error(
        "Task {task_id} finished as {status} instead of COMPLETED (exit code {exit_code:?}, stderr: {stderr})"
    )]
    TaskNotCompleted {
        task_id: String,
        status: TaskStatus,
        exit_code: Option<i32>,
        stderr: String,
    },
    #[error("Task {task_id} stdout does not mention '{expected}'")]
    MissingOutput { task_id: String, expected: String },
    #[error("Check interrupted by shutdown signal")]
    Interrupted,
    #[error("Failed to prepare workspace fixture '{path}': {source}")]
    Fixture {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
