use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub command: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl CommandSpec {
    #[must_use]
    pub fn new<I, S>(command: impl Into<String>, args: I, timeout: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
            timeout,
        }
    }

    /// Built-in command mix used when none is configured.
    #[must_use]
    pub fn default_mix(timeout: Duration) -> Vec<Self> {
        vec![
            Self::new("ls", ["-la", "/workspace"], timeout),
            Self::new("cat", ["/etc/passwd"], timeout),
            Self::new("find", ["/workspace", "-type", "f", "-name", "*.txt"], timeout),
            Self::new("echo", ["Hello, World!"], timeout),
            Self::new("grep", ["-i", "root", "/etc/passwd"], timeout),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct TaskHandle {
    pub task_id: String,
    /// When the execute request was sent.
    pub submitted_at: Instant,
}

/// Canonical task state. Both wire vocabularies (`COMPLETED` and
/// `TASK_COMPLETED` style) map onto this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Error,
}

impl TaskStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Error
        )
    }

    /// Position in the forward-only state order. All terminal states share a rank.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            TaskStatus::Pending => 0,
            TaskStatus::Running => 1,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Error => 2,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Running => "RUNNING",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Failed => "FAILED",
            TaskStatus::Error => "ERROR",
        }
    }

    /// Maps a wire status string to the canonical state.
    ///
    /// Matching is case-insensitive and ignores an optional `TASK_` prefix.
    /// Returns `None` for strings with no mapping; callers surface those as
    /// `UnknownStatus` instead of treating them as non-terminal.
    #[must_use]
    pub fn from_wire(value: &str) -> Option<Self> {
        let upper = value.trim().to_ascii_uppercase();
        let name = upper.strip_prefix("TASK_").unwrap_or(&upper);
        match name {
            "PENDING" | "CREATED" | "QUEUED" => Some(TaskStatus::Pending),
            "RUNNING" => Some(TaskStatus::Running),
            "COMPLETED" => Some(TaskStatus::Completed),
            "FAILED" => Some(TaskStatus::Failed),
            "ERROR" | "CANCELLED" | "CANCELED" | "TIMED_OUT" | "TIMEDOUT" => {
                Some(TaskStatus::Error)
            }
            _ => None,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

/// Read-only snapshot of a task as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInfo {
    pub task_id: String,
    pub status: TaskStatus,
    pub result: Option<TaskResult>,
}

impl TaskInfo {
    #[must_use]
    pub fn stdout(&self) -> &str {
        self.result
            .as_ref()
            .map_or("", |result| result.stdout.as_str())
    }
}
