use std::num::NonZeroUsize;
use std::time::Duration;

use crate::error::ValidationError;
use crate::gateway::CommandSpec;
use crate::load::{DEFAULT_WEIGHTS, TaskKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositiveUsize(NonZeroUsize);

impl PositiveUsize {
    #[must_use]
    pub const fn get(self) -> usize {
        self.0.get()
    }
}

impl TryFrom<usize> for PositiveUsize {
    type Error = ValidationError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        NonZeroUsize::new(value)
            .map(PositiveUsize)
            .ok_or(ValidationError::ValueTooSmall { min: 1 })
    }
}

impl std::str::FromStr for PositiveUsize {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: usize = s
            .parse()
            .map_err(|err| ValidationError::InvalidNumber { source: err })?;
        PositiveUsize::try_from(value)
    }
}

/// Parsed `--weights` value. A newtype so clap treats it as one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskWeights(pub Vec<(TaskKind, u32)>);

impl Default for TaskWeights {
    fn default() -> Self {
        Self(DEFAULT_WEIGHTS.to_vec())
    }
}

/// A command line for the gateway to execute. Parsed from the CLI by
/// splitting on whitespace, so quotes are kept literally and no argument can
/// contain a space. Config table entries carry explicit args and may also
/// carry their own timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Option<Duration>,
}

impl CommandLine {
    #[must_use]
    pub fn to_spec(&self, default_timeout: Duration) -> CommandSpec {
        CommandSpec::new(
            self.program.clone(),
            self.args.iter().cloned(),
            self.timeout.unwrap_or(default_timeout),
        )
    }
}

impl std::str::FromStr for CommandLine {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace().map(str::to_owned);
        let program = parts.next().ok_or(ValidationError::EmptyCommand)?;
        Ok(Self {
            program,
            args: parts.collect(),
            timeout: None,
        })
    }
}
