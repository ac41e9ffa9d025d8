//! Error types shared by the channel, the workers, and run setup.

use std::io;

use thiserror::Error;

/// A `put` that did not enqueue; the task is handed back to the caller.
#[derive(Debug, Error)]
pub enum PutError<T> {
    #[error("put interrupted while waiting for space")]
    Interrupted(T),
    #[error("channel closed")]
    Closed(T),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TakeError {
    #[error("take interrupted while waiting for a task")]
    Interrupted,
    #[error("channel closed and drained")]
    Closed,
}

/// Simulated work was cut short by an interrupt.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("execution interrupted")]
pub struct Interrupted;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("channel capacity must be > 0")]
    ZeroCapacity,
    #[error("min work duration {min}ms exceeds max {max}ms")]
    InvertedWorkRange { min: u64, max: u64 },
    #[error("collector poll interval must be > 0")]
    ZeroPollInterval,
    #[error("invalid {field} value: {value}")]
    InvalidValue { field: &'static str, value: String },
    #[error("unexpected argument: {0}")]
    UnexpectedArgument(String),
}

/// Failures that abort a run during setup or teardown.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to spawn {role} thread")]
    Spawn {
        role: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("{role} thread panicked")]
    Panicked { role: &'static str },
}
