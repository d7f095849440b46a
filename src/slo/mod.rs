//! Percentile SLO thresholds and their evaluation against a finished run.
mod evaluate;
mod threshold;


pub use evaluate::{PercentileSource, SloOutcome, SloVerdict, evaluate};
pub use threshold::{DEFAULT_MAX_MS, DEFAULT_PERCENTILE, SloThreshold, default_thresholds};
