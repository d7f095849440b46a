use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::warn;

use super::histogram::LatencyHistogram;
use super::percentiles::PercentileSet;
use super::report::{AggregateReport, EndpointReport};
use super::sample::LatencySample;

#[derive(Debug)]
struct Bucket {
    histogram: LatencyHistogram,
    failures: u64,
}

/// Per-endpoint latency buckets shared by every virtual user.
///
/// The bucket map sits behind a read-mostly `RwLock`; each bucket has its
/// own mutex so users recording different endpoints do not contend.
#[derive(Debug)]
pub struct LatencyAggregator {
    started: Instant,
    started_at: DateTime<Utc>,
    finished: OnceLock<Instant>,
    buckets: RwLock<BTreeMap<String, Arc<Mutex<Bucket>>>>,
}

impl Default for LatencyAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl LatencyAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            started_at: Utc::now(),
            finished: OnceLock::new(),
            buckets: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn record(&self, sample: LatencySample) {
        let Some(bucket) = self.bucket(&sample.endpoint_name) else {
            return;
        };
        let mut bucket = bucket.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = bucket.histogram.record_us(sample.latency_us()) {
            warn!("Dropping {} sample: {}", sample.endpoint_name, err);
            return;
        }
        if !sample.success {
            bucket.failures = bucket.failures.saturating_add(1);
        }
    }

    fn bucket(&self, endpoint_name: &str) -> Option<Arc<Mutex<Bucket>>> {
        {
            let buckets = self.buckets.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(bucket) = buckets.get(endpoint_name) {
                return Some(Arc::clone(bucket));
            }
        }
        let mut buckets = self.buckets.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(bucket) = buckets.get(endpoint_name) {
            return Some(Arc::clone(bucket));
        }
        let histogram = match LatencyHistogram::new() {
            Ok(histogram) => histogram,
            Err(err) => {
                warn!("Cannot create bucket for {}: {}", endpoint_name, err);
                return None;
            }
        };
        let bucket = Arc::new(Mutex::new(Bucket {
            histogram,
            failures: 0,
        }));
        buckets.insert(endpoint_name.to_owned(), Arc::clone(&bucket));
        Some(bucket)
    }

    /// Elapsed window used for RPS: creation until `finish()`, or now.
    #[must_use]
    pub fn window(&self) -> Duration {
        let end = self.finished.get().copied().unwrap_or_else(Instant::now);
        end.saturating_duration_since(self.started)
    }

    #[must_use]
    pub fn percentiles(&self, endpoint_name: &str) -> Option<PercentileSet> {
        let bucket = {
            let buckets = self.buckets.read().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(buckets.get(endpoint_name)?)
        };
        let bucket = bucket.lock().unwrap_or_else(PoisonError::into_inner);
        PercentileSet::from_histogram(&bucket.histogram, bucket.failures, self.window())
    }

    /// Latency at quantile `q` for one bucket, in milliseconds.
    #[must_use]
    pub fn quantile_ms(&self, endpoint_name: &str, q: f64) -> Option<f64> {
        let bucket = {
            let buckets = self.buckets.read().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(buckets.get(endpoint_name)?)
        };
        let bucket = bucket.lock().unwrap_or_else(PoisonError::into_inner);
        bucket.histogram.quantile_ms(q)
    }

    #[must_use]
    pub fn endpoint_names(&self) -> Vec<String> {
        let buckets = self.buckets.read().unwrap_or_else(PoisonError::into_inner);
        buckets.keys().cloned().collect()
    }

    /// Freezes the RPS window and copies every bucket into a read-only report.
    /// Samples recorded afterwards do not appear in the report.
    #[must_use]
    pub fn finish(&self) -> AggregateReport {
        let frozen = *self.finished.get_or_init(Instant::now);
        let window = frozen.saturating_duration_since(self.started);
        let buckets = self.buckets.read().unwrap_or_else(PoisonError::into_inner);
        let endpoints = buckets
            .iter()
            .map(|(name, bucket)| {
                let bucket = bucket.lock().unwrap_or_else(PoisonError::into_inner);
                (
                    name.clone(),
                    EndpointReport {
                        histogram: bucket.histogram.clone(),
                        failures: bucket.failures,
                    },
                )
            })
            .collect();
        AggregateReport {
            started_at: self.started_at,
            window,
            endpoints,
        }
    }
}
