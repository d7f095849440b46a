use serde::Serialize;

use crate::metrics::{AggregateReport, LatencyAggregator};

use super::threshold::SloThreshold;

/// Anything that can answer "latency at quantile q for this endpoint".
pub trait PercentileSource {
    fn quantile_ms(&self, endpoint_name: &str, q: f64) -> Option<f64>;
}

impl PercentileSource for AggregateReport {
    fn quantile_ms(&self, endpoint_name: &str, q: f64) -> Option<f64> {
        AggregateReport::quantile_ms(self, endpoint_name, q)
    }
}

impl PercentileSource for LatencyAggregator {
    fn quantile_ms(&self, endpoint_name: &str, q: f64) -> Option<f64> {
        LatencyAggregator::quantile_ms(self, endpoint_name, q)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SloVerdict {
    SloMet,
    SloViolated,
    NoData,
}

impl SloVerdict {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SloVerdict::SloMet => "SLO_MET",
            SloVerdict::SloViolated => "SLO_VIOLATED",
            SloVerdict::NoData => "NO_DATA",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SloOutcome {
    pub endpoint_name: String,
    pub percentile: f64,
    pub observed_ms: Option<f64>,
    pub max_ms: f64,
    pub verdict: SloVerdict,
}

impl SloOutcome {
    #[must_use]
    pub fn is_violation(&self) -> bool {
        self.verdict == SloVerdict::SloViolated
    }
}

/// One outcome per threshold, in threshold order. Missing data is reported
/// as `NO_DATA`, never as an error.
#[must_use]
pub fn evaluate<S>(source: &S, thresholds: &[SloThreshold]) -> Vec<SloOutcome>
where
    S: PercentileSource + ?Sized,
{
    thresholds
        .iter()
        .map(|threshold| {
            let observed_ms = source.quantile_ms(&threshold.endpoint_name, threshold.percentile);
            let verdict = match observed_ms {
                None => SloVerdict::NoData,
                Some(observed) if observed <= threshold.max_ms => SloVerdict::SloMet,
                Some(_) => SloVerdict::SloViolated,
            };
            SloOutcome {
                endpoint_name: threshold.endpoint_name.clone(),
                percentile: threshold.percentile,
                observed_ms,
                max_ms: threshold.max_ms,
                verdict,
            }
        })
        .collect()
}
