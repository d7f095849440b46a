use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::error::MetricsError;
use crate::load::LoadOutcome;
use crate::metrics::{PercentileSet, TallySnapshot};
use crate::slo::SloOutcome;

#[derive(Debug, Serialize)]
pub(crate) struct EndpointEntry {
    pub(crate) name: String,
    #[serde(flatten)]
    pub(crate) percentiles: PercentileSet,
}

#[derive(Debug, Serialize)]
pub(crate) struct RunReport<'run> {
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) window_secs: f64,
    pub(crate) users_started: usize,
    pub(crate) iterations: u64,
    pub(crate) idle_status_checks: u64,
    pub(crate) total_requests: u64,
    pub(crate) endpoints: Vec<EndpointEntry>,
    pub(crate) errors: TallySnapshot,
    pub(crate) slos: &'run [SloOutcome],
}

impl<'run> RunReport<'run> {
    pub(crate) fn new(outcome: &LoadOutcome, slos: &'run [SloOutcome]) -> Self {
        let report = &outcome.report;
        Self {
            started_at: report.started_at,
            window_secs: report.window.as_secs_f64(),
            users_started: outcome.users_started,
            iterations: outcome.iterations,
            idle_status_checks: outcome.idle_status_checks,
            total_requests: report.total_requests(),
            endpoints: report
                .endpoint_percentiles()
                .into_iter()
                .map(|(name, percentiles)| EndpointEntry { name, percentiles })
                .collect(),
            errors: outcome.tally,
            slos,
        }
    }
}

async fn write_pretty(path: &str, report: &RunReport<'_>) -> Result<(), std::io::Error> {
    let file = tokio::fs::File::create(path).await?;
    let mut writer = BufWriter::new(file);
    let json = serde_json::to_vec_pretty(report).map_err(std::io::Error::other)?;
    writer.write_all(&json).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

pub(crate) async fn export_json(path: &str, report: &RunReport<'_>) -> Result<(), MetricsError> {
    write_pretty(path, report)
        .await
        .map_err(|err| MetricsError::WriteReport {
            path: path.to_owned(),
            source: err,
        })
}
