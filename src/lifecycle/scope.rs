use std::future::Future;

use tracing::{info, warn};

use crate::error::AppResult;

use super::server::{ServerProcess, ServerSpec};

/// Start, wait for readiness, run `body`, stop. The server is stopped on
/// every path once spawned, including a failed readiness wait; the body's
/// error wins over a stop error.
///
/// # Errors
///
/// Returns the spawn, readiness, body, or stop error, in that order of
/// precedence.
pub async fn with_running_server<F, Fut, T>(spec: &ServerSpec, body: F) -> AppResult<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut server = ServerProcess::start(spec)?;
    if let Err(err) = server
        .await_ready(&spec.ready_pattern, spec.ready_timeout)
        .await
    {
        match server.stop(spec.stop_grace).await {
            Ok(outcome) => info!("Stopped server after failed start: {:?}", outcome),
            Err(stop_err) => warn!("Failed to stop server after failed start: {}", stop_err),
        }
        return Err(err.into());
    }
    info!("Server ready ('{}' seen)", spec.ready_pattern);

    let result = body().await;
    let stopped = server.stop(spec.stop_grace).await;
    match (result, stopped) {
        (Ok(value), Ok(_)) => Ok(value),
        (Ok(_), Err(stop_err)) => Err(stop_err.into()),
        (Err(err), Ok(_)) => Err(err),
        (Err(err), Err(stop_err)) => {
            warn!("Failed to stop server: {}", stop_err);
            Err(err)
        }
    }
}
