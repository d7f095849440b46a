use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Readiness marker '{pattern}' not seen within {timeout:?}")]
    StartupTimeout { pattern: String, timeout: Duration },
    #[error("Server exited before printing readiness marker '{pattern}'")]
    ExitedBeforeReady { pattern: String },
    #[error("Server pid {pid} does not fit the platform pid type.")]
    InvalidPid { pid: u32 },
    #[error("Failed to signal server pid {pid}: {source}")]
    Signal {
        pid: u32,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed waiting for server exit: {source}")]
    Wait {
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to kill server: {source}")]
    Kill {
        #[source]
        source: std::io::Error,
    },
}
