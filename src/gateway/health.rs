use tracing::debug;

use crate::error::GatewayError;

use super::client::GatewayTransport;
use super::wire;

/// Queries the health endpoint and returns the reported status string.
///
/// # Errors
///
/// Returns an error when the call fails or the body has no `status`.
pub async fn check_health(transport: &dyn GatewayTransport) -> Result<String, GatewayError> {
    let body = transport.health().await?;
    let status = wire::parse_health(&body)?;
    debug!("Gateway health status: {}", status);
    Ok(status)
}

/// The gateway reports `ok` (optionally with detail after it); the backing
/// server reports `healthy`.
#[must_use]
pub fn is_healthy(status: &str) -> bool {
    let normalized = status.trim().to_ascii_lowercase();
    normalized == "healthy" || normalized.starts_with("ok")
}
