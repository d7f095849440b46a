use std::future::Future;

use crate::args::GatewayArgs;
use crate::error::AppResult;
use crate::lifecycle::{ServerSpec, with_running_server};

pub(crate) fn server_spec(gateway: &GatewayArgs) -> Option<ServerSpec> {
    gateway.server_cmd.as_ref().map(|command| ServerSpec {
        command: command.clone(),
        args: gateway.server_args.clone(),
        ready_pattern: gateway.ready_pattern.clone(),
        ready_timeout: gateway.ready_timeout,
        stop_grace: gateway.stop_grace,
    })
}

/// Runs `body` inside a server bracket when `--server-cmd` is set, or
/// directly against an already running gateway otherwise.
pub(crate) async fn with_optional_server<F, Fut, T>(gateway: &GatewayArgs, body: F) -> AppResult<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    match server_spec(gateway) {
        Some(spec) => with_running_server(&spec, body).await,
        None => body().await,
    }
}
