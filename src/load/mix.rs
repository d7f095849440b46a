use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskKind {
    HealthCheck,
    Execute,
    StatusCheck,
}

impl TaskKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            TaskKind::HealthCheck => "health",
            TaskKind::Execute => "execute",
            TaskKind::StatusCheck => "status",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "health" | "healthcheck" | "health_check" => Ok(TaskKind::HealthCheck),
            "execute" | "exec" => Ok(TaskKind::Execute),
            "status" | "statuscheck" | "status_check" => Ok(TaskKind::StatusCheck),
            _ => Err(ValidationError::UnknownTaskKind {
                value: value.to_owned(),
            }),
        }
    }
}

/// Health 10, execute 60, status 30.
pub const DEFAULT_WEIGHTS: [(TaskKind, u32); 3] = [
    (TaskKind::HealthCheck, 10),
    (TaskKind::Execute, 60),
    (TaskKind::StatusCheck, 30),
];

/// Parses `health=10,execute=60,status=30`. Kinds left out get weight zero;
/// a repeated kind keeps its last weight.
///
/// # Errors
///
/// Returns an error for malformed pairs, unknown kinds, or bad numbers.
pub fn parse_weights(value: &str) -> Result<Vec<(TaskKind, u32)>, ValidationError> {
    let mut weights: Vec<(TaskKind, u32)> = Vec::with_capacity(DEFAULT_WEIGHTS.len());
    for pair in value.split(',').map(str::trim).filter(|pair| !pair.is_empty()) {
        let Some((kind, weight)) = pair.split_once('=') else {
            return Err(ValidationError::InvalidWeightsFormat {
                value: value.to_owned(),
            });
        };
        let kind: TaskKind = kind.parse()?;
        let weight: u32 =
            weight
                .trim()
                .parse()
                .map_err(|source| ValidationError::InvalidWeight {
                    value: pair.to_owned(),
                    source,
                })?;
        weights.retain(|(existing, _)| *existing != kind);
        weights.push((kind, weight));
    }
    if weights.is_empty() {
        return Err(ValidationError::InvalidWeightsFormat {
            value: value.to_owned(),
        });
    }
    Ok(weights)
}

/// Weighted selector over task kinds.
#[derive(Debug, Clone)]
pub struct TaskMix {
    kinds: Vec<(TaskKind, u32)>,
    index: WeightedIndex<u32>,
}

impl TaskMix {
    /// # Errors
    ///
    /// Returns `WeightsAllZero` when the weights sum to zero.
    pub fn new(weights: &[(TaskKind, u32)]) -> Result<Self, ValidationError> {
        let kinds: Vec<(TaskKind, u32)> = weights.to_vec();
        if kinds.iter().all(|(_, weight)| *weight == 0) {
            return Err(ValidationError::WeightsAllZero);
        }
        let index = WeightedIndex::new(kinds.iter().map(|(_, weight)| *weight))
            .map_err(|_err| ValidationError::WeightsAllZero)?;
        Ok(Self { kinds, index })
    }

    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> TaskKind {
        let position = self.index.sample(rng);
        self.kinds
            .get(position)
            .map_or(TaskKind::HealthCheck, |(kind, _)| *kind)
    }
}
