use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Baseline target applied when no thresholds are configured.
pub const DEFAULT_PERCENTILE: f64 = 0.95;
pub const DEFAULT_MAX_MS: f64 = 400.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SloThreshold {
    pub endpoint_name: String,
    /// Quantile in `(0, 1]`.
    pub percentile: f64,
    pub max_ms: f64,
}

impl SloThreshold {
    /// # Errors
    ///
    /// Returns an error if the endpoint name is blank, `percentile` is
    /// outside `(0, 1]`, or `max_ms` is not a positive finite number.
    pub fn new(
        endpoint_name: impl Into<String>,
        percentile: f64,
        max_ms: f64,
    ) -> Result<Self, ValidationError> {
        let endpoint_name = endpoint_name.into();
        if endpoint_name.trim().is_empty() {
            return Err(ValidationError::InvalidSloFormat {
                value: endpoint_name,
            });
        }
        if !(percentile > 0.0 && percentile <= 1.0) {
            return Err(ValidationError::InvalidSloPercentile {
                value: percentile.to_string(),
            });
        }
        if !(max_ms.is_finite() && max_ms > 0.0) {
            return Err(ValidationError::InvalidSloMaxMs {
                value: max_ms.to_string(),
            });
        }
        Ok(Self {
            endpoint_name,
            percentile,
            max_ms,
        })
    }

    /// `p95`-style label for summaries.
    #[must_use]
    pub fn percentile_label(&self) -> String {
        format!("p{}", (self.percentile * 1000.0).round() / 10.0)
    }
}

impl fmt::Display for SloThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} <= {}ms",
            self.endpoint_name,
            self.percentile_label(),
            self.max_ms
        )
    }
}

/// Accepts `p95`, `95`, `99.9` and `0.95`.
fn parse_percentile(value: &str) -> Result<f64, ValidationError> {
    let invalid = || ValidationError::InvalidSloPercentile {
        value: value.to_owned(),
    };
    let trimmed = value.trim();
    let digits = trimmed
        .strip_prefix('p')
        .or_else(|| trimmed.strip_prefix('P'))
        .unwrap_or(trimmed);
    let number: f64 = digits.parse().map_err(|_err| invalid())?;
    let quantile = if number > 1.0 || trimmed != digits {
        number / 100.0
    } else {
        number
    };
    if quantile > 0.0 && quantile <= 1.0 {
        Ok(quantile)
    } else {
        Err(invalid())
    }
}

/// Parses `<endpoint>:<percentile>:<max_ms>`. The endpoint name may itself
/// contain colons, so the last two fields are split off from the right.
impl FromStr for SloThreshold {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut parts = value.rsplitn(3, ':');
        let (Some(max_ms), Some(percentile), Some(endpoint)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(ValidationError::InvalidSloFormat {
                value: value.to_owned(),
            });
        };
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            return Err(ValidationError::InvalidSloFormat {
                value: value.to_owned(),
            });
        }
        let max_ms: f64 = max_ms
            .trim()
            .trim_end_matches("ms")
            .parse()
            .map_err(|_err| ValidationError::InvalidSloMaxMs {
                value: max_ms.to_owned(),
            })?;
        Self::new(endpoint, parse_percentile(percentile)?, max_ms)
    }
}

/// `p95 <= 400ms` for every endpoint that recorded samples.
#[must_use]
pub fn default_thresholds<I, S>(endpoints: I) -> Vec<SloThreshold>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    endpoints
        .into_iter()
        .map(|endpoint| SloThreshold {
            endpoint_name: endpoint.into(),
            percentile: DEFAULT_PERCENTILE,
            max_ms: DEFAULT_MAX_MS,
        })
        .collect()
}
