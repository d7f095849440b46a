use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::args::parse_duration;
use crate::error::ConfigError;

#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub url: Option<String>,
    pub request_timeout: Option<DurationValue>,
    pub command_timeout: Option<DurationValue>,
    pub server: Option<ServerConfig>,
    pub load: Option<LoadConfig>,
    pub check: Option<CheckConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServerConfig {
    pub command: Option<String>,
    pub args: Option<Vec<String>>,
    pub ready_pattern: Option<String>,
    pub ready_timeout: Option<DurationValue>,
    pub stop_grace: Option<DurationValue>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoadConfig {
    pub users: Option<usize>,
    pub user_rate: Option<f64>,
    pub duration: Option<DurationValue>,
    pub spawn_rate: Option<usize>,
    pub spawn_interval: Option<DurationValue>,
    pub poll_interval: Option<DurationValue>,
    pub poll_max_wait: Option<DurationValue>,
    /// `{ health = 10, execute = 60, status = 30 }`
    pub weights: Option<BTreeMap<String, u32>>,
    pub commands: Option<Vec<CommandConfig>>,
    pub slos: Option<Vec<SloConfig>>,
    pub export_json: Option<String>,
    pub fail_on_slo: Option<bool>,
    pub seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckConfig {
    pub workspace: Option<PathBuf>,
    pub poll_interval: Option<DurationValue>,
    pub poll_max_wait: Option<DurationValue>,
}

/// Either `"ls -la /workspace"` or `{ command = "ls", args = ["-la"], timeout = "5s" }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CommandConfig {
    Line(String),
    Spec {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        timeout: Option<DurationValue>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct SloConfig {
    pub endpoint: String,
    /// `0.95` or `95`.
    pub percentile: f64,
    pub max_ms: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self, field: &str) -> Result<Duration, ConfigError> {
        let parsed = match self {
            DurationValue::Seconds(secs) => parse_duration(&secs.to_string()),
            DurationValue::Text(text) => parse_duration(text),
        };
        parsed.map_err(|source| ConfigError::InvalidDuration {
            field: field.to_owned(),
            source,
        })
    }
}
