use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Duration must not be empty.")]
    DurationEmpty,
    #[error("Invalid duration '{value}'.")]
    InvalidDurationFormat { value: String },
    #[error("Invalid duration '{value}': {source}")]
    InvalidDurationNumber {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Duration overflow.")]
    DurationOverflow,
    #[error("Invalid duration unit '{unit}'.")]
    InvalidDurationUnit { unit: String },
    #[error("Duration must be > 0.")]
    DurationZero,
    #[error("Value must be >= {min}.")]
    ValueTooSmall { min: u64 },
    #[error("Invalid value: {source}")]
    InvalidNumber {
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Invalid rate '{value}'. Expected a positive number of iterations per second.")]
    InvalidRate { value: String },
    #[error("Invalid task weights '{value}'. Expected 'health=10,execute=60,status=30'.")]
    InvalidWeightsFormat { value: String },
    #[error("Unknown task type '{value}'. Use health, execute, or status.")]
    UnknownTaskKind { value: String },
    #[error("Invalid weight in '{value}': {source}")]
    InvalidWeight {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Task weights must not all be zero.")]
    WeightsAllZero,
    #[error("Invalid SLO '{value}'. Expected '<endpoint>:<percentile>:<max_ms>'.")]
    InvalidSloFormat { value: String },
    #[error("Invalid SLO percentile '{value}'. Use p95, 95, or 0.95.")]
    InvalidSloPercentile { value: String },
    #[error("Invalid SLO max_ms '{value}'. Expected a positive number of milliseconds.")]
    InvalidSloMaxMs { value: String },
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Unsupported gateway URL '{url}'. Use an http:// or https:// base URL.")]
    UnsupportedUrl { url: String },
    #[error("Command must not be empty.")]
    EmptyCommand,
    #[error("Load test needs at least one command to execute.")]
    EmptyCommandList,
    #[error("{violations} SLO threshold(s) violated.")]
    SloViolated { violations: usize },
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
