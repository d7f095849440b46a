use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::histogram::LatencyHistogram;
use super::percentiles::PercentileSet;

#[derive(Debug, Clone)]
pub struct EndpointReport {
    pub(crate) histogram: LatencyHistogram,
    pub failures: u64,
}

/// Frozen result of a run, produced by `LatencyAggregator::finish`.
#[derive(Debug, Clone)]
pub struct AggregateReport {
    pub started_at: DateTime<Utc>,
    pub window: Duration,
    pub endpoints: BTreeMap<String, EndpointReport>,
}

impl AggregateReport {
    #[must_use]
    pub fn percentiles(&self, endpoint_name: &str) -> Option<PercentileSet> {
        let endpoint = self.endpoints.get(endpoint_name)?;
        PercentileSet::from_histogram(&endpoint.histogram, endpoint.failures, self.window)
    }

    #[must_use]
    pub fn quantile_ms(&self, endpoint_name: &str, q: f64) -> Option<f64> {
        self.endpoints.get(endpoint_name)?.histogram.quantile_ms(q)
    }

    /// Every non-empty bucket with its percentiles, ordered by name.
    #[must_use]
    pub fn endpoint_percentiles(&self) -> Vec<(String, PercentileSet)> {
        self.endpoints
            .keys()
            .filter_map(|name| Some((name.clone(), self.percentiles(name)?)))
            .collect()
    }

    #[must_use]
    pub fn total_requests(&self) -> u64 {
        self.endpoints
            .values()
            .fold(0_u64, |total, endpoint| {
                total.saturating_add(endpoint.histogram.count())
            })
    }
}
