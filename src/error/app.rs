use thiserror::Error;

use super::{
    CheckError, ConfigError, GatewayError, LifecycleError, MetricsError, ValidationError,
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("CLI error: {source}")]
    Clap {
        #[from]
        source: clap::Error,
    },
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
    #[error("HTTP client error: {source}")]
    Reqwest {
        #[from]
        source: reqwest::Error,
    },
    #[error("Join error: {source}")]
    Join {
        #[from]
        source: tokio::task::JoinError,
    },
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
    #[error("Server lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),
    #[error("Check failed: {0}")]
    Check(#[from] CheckError),
    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation<E>(error: E) -> Self
    where
        E: Into<ValidationError>,
    {
        error.into().into()
    }

    pub fn config<E>(error: E) -> Self
    where
        E: Into<ConfigError>,
    {
        error.into().into()
    }

    pub fn gateway<E>(error: E) -> Self
    where
        E: Into<GatewayError>,
    {
        error.into().into()
    }

    pub fn lifecycle<E>(error: E) -> Self
    where
        E: Into<LifecycleError>,
    {
        error.into().into()
    }

    pub fn check<E>(error: E) -> Self
    where
        E: Into<CheckError>,
    {
        error.into().into()
    }
}
