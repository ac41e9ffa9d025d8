//! Run parameters and their command-line parsing.

use std::time::Duration;

use crate::error::ConfigError;
use crate::types::WorkRange;

pub const DEFAULT_TASKS: u64 = 50;
pub const DEFAULT_CAPACITY: usize = 10;
pub const DEFAULT_MIN_WORK_MS: u64 = 500;
pub const DEFAULT_MAX_WORK_MS: u64 = 999;
pub const DEFAULT_POLL_MS: u64 = 1500;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunConfig {
    pub tasks: u64,
    pub capacity: usize,
    pub min_work_ms: u64,
    pub max_work_ms: u64,
    pub poll_ms: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            tasks: DEFAULT_TASKS,
            capacity: DEFAULT_CAPACITY,
            min_work_ms: DEFAULT_MIN_WORK_MS,
            max_work_ms: DEFAULT_MAX_WORK_MS,
            poll_ms: DEFAULT_POLL_MS,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.min_work_ms > self.max_work_ms {
            return Err(ConfigError::InvertedWorkRange {
                min: self.min_work_ms,
                max: self.max_work_ms,
            });
        }
        if self.poll_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }

    pub fn work_range(&self) -> WorkRange {
        WorkRange::new(self.min_work_ms, self.max_work_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }

    /// Parse positional `[tasks] [capacity] [min_ms] [max_ms] [poll_ms]`.
    /// Missing trailing values and `-` keep the defaults.
    pub fn from_args<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Self::default();
        let mut args = args.into_iter();
        if let Some(value) = parse_slot(args.next(), "tasks")? {
            config.tasks = value;
        }
        if let Some(value) = parse_slot(args.next(), "capacity")? {
            config.capacity = value;
        }
        if let Some(value) = parse_slot(args.next(), "min_ms")? {
            config.min_work_ms = value;
        }
        if let Some(value) = parse_slot(args.next(), "max_ms")? {
            config.max_work_ms = value;
        }
        if let Some(value) = parse_slot(args.next(), "poll_ms")? {
            config.poll_ms = value;
        }
        if let Some(extra) = args.next() {
            return Err(ConfigError::UnexpectedArgument(extra));
        }
        config.validate()?;
        Ok(config)
    }
}

fn parse_slot<T: std::str::FromStr>(
    arg: Option<String>,
    field: &'static str,
) -> Result<Option<T>, ConfigError> {
    match arg {
        None => Ok(None),
        Some(arg) if arg == "-" => Ok(None),
        Some(arg) => arg
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { field, value: arg }),
    }
}
