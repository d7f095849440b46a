use std::time::Duration;

use tokio::time::Instant;

/// One completed request or poll cycle.
#[derive(Debug, Clone)]
pub struct LatencySample {
    pub endpoint_name: String,
    pub latency_ms: f64,
    pub success: bool,
    pub timestamp: Instant,
}

impl LatencySample {
    #[must_use]
    pub fn new(endpoint_name: impl Into<String>, elapsed: Duration, success: bool) -> Self {
        Self {
            endpoint_name: endpoint_name.into(),
            latency_ms: elapsed.as_secs_f64() * 1000.0,
            success,
            timestamp: Instant::now(),
        }
    }

    pub(crate) fn latency_us(&self) -> u64 {
        let micros = (self.latency_ms * 1000.0).round();
        if micros.is_sign_negative() {
            0
        } else {
            micros as u64
        }
    }
}
