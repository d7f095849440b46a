use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::error::GatewayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    Malformed,
    UnknownStatus,
    PollTimeout,
    /// Terminal FAILED or ERROR state reported by the gateway.
    TaskFailed,
}

impl From<&GatewayError> for FailureKind {
    fn from(error: &GatewayError) -> Self {
        match error {
            GatewayError::Transport { .. } | GatewayError::UnexpectedStatus { .. } => {
                FailureKind::Transport
            }
            GatewayError::MalformedResponse { .. } => FailureKind::Malformed,
            GatewayError::UnknownStatus { .. } => FailureKind::UnknownStatus,
            GatewayError::PollTimeout { .. } => FailureKind::PollTimeout,
        }
    }
}

/// Failure counters shared by all virtual users.
#[derive(Debug, Default)]
pub struct ErrorTally {
    transport: AtomicU64,
    malformed: AtomicU64,
    unknown_status: AtomicU64,
    poll_timeout: AtomicU64,
    task_failed: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TallySnapshot {
    pub transport: u64,
    pub malformed: u64,
    pub unknown_status: u64,
    pub poll_timeout: u64,
    pub task_failed: u64,
}

impl TallySnapshot {
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.transport
            .saturating_add(self.malformed)
            .saturating_add(self.unknown_status)
            .saturating_add(self.poll_timeout)
            .saturating_add(self.task_failed)
    }
}

impl ErrorTally {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, kind: FailureKind) {
        let counter = match kind {
            FailureKind::Transport => &self.transport,
            FailureKind::Malformed => &self.malformed,
            FailureKind::UnknownStatus => &self.unknown_status,
            FailureKind::PollTimeout => &self.poll_timeout,
            FailureKind::TaskFailed => &self.task_failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self, error: &GatewayError) {
        self.record(FailureKind::from(error));
    }

    #[must_use]
    pub fn snapshot(&self) -> TallySnapshot {
        TallySnapshot {
            transport: self.transport.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            unknown_status: self.unknown_status.load(Ordering::Relaxed),
            poll_timeout: self.poll_timeout.load(Ordering::Relaxed),
            task_failed: self.task_failed.load(Ordering::Relaxed),
        }
    }
}
