mod app;
mod check;
mod config;
mod gateway;
mod lifecycle;
mod metrics;
mod validation;

#[cfg(test)]
mod test_support;

pub use app::{AppError, AppResult};
pub use check::CheckError;
pub use config::ConfigError;
pub use gateway::GatewayError;
pub use lifecycle::LifecycleError;
pub use metrics::MetricsError;
pub use validation::ValidationError;
