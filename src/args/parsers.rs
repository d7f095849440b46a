use std::time::Duration;

use super::types::{CommandLine, PositiveUsize, TaskWeights};
use crate::error::{AppError, AppResult, ValidationError};
use crate::load::parse_weights;
use crate::slo::SloThreshold;

pub(super) fn parse_positive_usize(s: &str) -> AppResult<PositiveUsize> {
    s.parse::<PositiveUsize>().map_err(AppError::from)
}

pub(crate) fn parse_user_rate(s: &str) -> AppResult<f64> {
    let rate: f64 = s.trim().parse().map_err(|_err| {
        AppError::validation(ValidationError::InvalidRate {
            value: s.to_owned(),
        })
    })?;
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(AppError::validation(ValidationError::InvalidRate {
            value: s.to_owned(),
        }))
    }
}

pub(super) fn parse_task_weights(s: &str) -> AppResult<TaskWeights> {
    let weights = parse_weights(s)?;
    if weights.iter().all(|(_, weight)| *weight == 0) {
        return Err(AppError::validation(ValidationError::WeightsAllZero));
    }
    Ok(TaskWeights(weights))
}

pub(super) fn parse_slo(s: &str) -> AppResult<SloThreshold> {
    s.parse::<SloThreshold>().map_err(AppError::from)
}

pub(crate) fn parse_command(s: &str) -> AppResult<CommandLine> {
    s.parse::<CommandLine>().map_err(AppError::from)
}

pub(crate) fn parse_duration_arg(s: &str) -> AppResult<Duration> {
    parse_duration(s).map_err(AppError::from)
}

/// `<digits>[ms|s|m|h]`, seconds when the unit is omitted. Zero is rejected.
pub(crate) fn parse_duration(s: &str) -> Result<Duration, ValidationError> {
    let value = s.trim();
    if value.is_empty() {
        return Err(ValidationError::DurationEmpty);
    }

    let digits_len = value
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(value.len());
    if digits_len == 0 {
        return Err(ValidationError::InvalidDurationFormat {
            value: value.to_owned(),
        });
    }
    let (num_part, unit_part) = value.split_at(digits_len);
    let number: u64 = num_part
        .parse()
        .map_err(|err| ValidationError::InvalidDurationNumber {
            value: value.to_owned(),
            source: err,
        })?;

    let seconds_per_unit = |factor: u64| {
        number
            .checked_mul(factor)
            .map(Duration::from_secs)
            .ok_or(ValidationError::DurationOverflow)
    };
    let duration = match unit_part.trim() {
        "ms" => Duration::from_millis(number),
        "" | "s" => Duration::from_secs(number),
        "m" => seconds_per_unit(60)?,
        "h" => seconds_per_unit(3600)?,
        unit => {
            return Err(ValidationError::InvalidDurationUnit {
                unit: unit.to_owned(),
            });
        }
    };

    if duration.is_zero() {
        return Err(ValidationError::DurationZero);
    }
    Ok(duration)
}
