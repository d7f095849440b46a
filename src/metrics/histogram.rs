use hdrhistogram::Histogram;

use crate::error::MetricsError;

/// Microsecond-resolution latency histogram with 3 significant digits.
#[derive(Debug, Clone)]
pub struct LatencyHistogram {
    hist: Histogram<u64>,
    max_us: u64,
}

impl LatencyHistogram {
    /// Create a new latency histogram.
    ///
    /// # Errors
    ///
    /// Returns an error if the histogram cannot be created.
    pub fn new() -> Result<Self, MetricsError> {
        let hist = Histogram::<u64>::new(3).map_err(|err| MetricsError::Histogram {
            context: "create",
            source: Box::new(err),
        })?;
        Ok(Self { hist, max_us: 0 })
    }

    /// Record a latency value in microseconds. Zero is stored as one.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be recorded.
    pub fn record_us(&mut self, latency_us: u64) -> Result<(), MetricsError> {
        let value = latency_us.max(1);
        self.hist
            .record(value)
            .map_err(|err| MetricsError::Histogram {
                context: "record",
                source: Box::new(err),
            })?;
        self.max_us = self.max_us.max(value);
        Ok(())
    }

    /// Value at quantile `q` (0..=1) in milliseconds, or `None` when empty.
    ///
    /// The nearest-rank bucket reports its highest equivalent value, capped
    /// at the largest recorded sample. The result never undershoots the true
    /// nearest-rank sample and never exceeds the slowest sample seen.
    #[must_use]
    pub fn quantile_ms(&self, q: f64) -> Option<f64> {
        if self.hist.is_empty() {
            return None;
        }
        let micros = self
            .hist
            .value_at_quantile(q.clamp(0.0, 1.0))
            .min(self.max_us);
        Some(micros as f64 / 1000.0)
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.hist.len()
    }
}
