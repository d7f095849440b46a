use std::time::Duration;

use serde::Serialize;

use super::histogram::LatencyHistogram;

/// Latency percentiles in milliseconds for one endpoint bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PercentileSet {
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
    pub count: u64,
    pub rps: f64,
    pub failures: u64,
}

impl PercentileSet {
    pub(crate) fn from_histogram(
        histogram: &LatencyHistogram,
        failures: u64,
        window: Duration,
    ) -> Option<Self> {
        let count = histogram.count();
        let seconds = window.as_secs_f64();
        let rps = if seconds > 0.0 {
            count as f64 / seconds
        } else {
            0.0
        };
        Some(Self {
            p50: histogram.quantile_ms(0.50)?,
            p90: histogram.quantile_ms(0.90)?,
            p95: histogram.quantile_ms(0.95)?,
            p99: histogram.quantile_ms(0.99)?,
            count,
            rps,
            failures,
        })
    }
}
