//! Latency samples, per-endpoint aggregation, and failure counters.
mod aggregator;
mod histogram;
mod percentiles;
mod report;
mod sample;
mod tally;


pub use aggregator::LatencyAggregator;
pub use histogram::LatencyHistogram;
pub use percentiles::PercentileSet;
pub use report::{AggregateReport, EndpointReport};
pub use sample::LatencySample;
pub use tally::{ErrorTally, FailureKind, TallySnapshot};
