//! Task model and the executable capability the consumer drives.

use std::time::{Duration, Instant, SystemTime};

use log::{error, info};
use rand::Rng;

use crate::error::Interrupted;
use crate::interrupt::Interrupt;

/// Monotonic task identifier assigned by the producer.
pub type TaskId = u64;

/// A unit of work the consumer can run to completion.
pub trait Executable: Send {
    fn id(&self) -> TaskId;

    /// Run the work on the calling thread. An interrupt aborts it and
    /// leaves `result()` unset.
    fn execute(&mut self, interrupt: &Interrupt) -> Result<u64, Interrupted>;

    /// Elapsed execution time in milliseconds, present only after success.
    fn result(&self) -> Option<u64>;
}

/// Inclusive bounds for simulated work, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl WorkRange {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        debug_assert!(min_ms <= max_ms, "work range inverted");
        Self { min_ms, max_ms }
    }

    fn sample(&self) -> Duration {
        let ms = rand::thread_rng().gen_range(self.min_ms..=self.max_ms);
        Duration::from_millis(ms)
    }
}

/// Synthetic task that sleeps for a random duration within its work range.
#[derive(Debug)]
pub struct Task {
    pub id: TaskId,
    pub created: SystemTime,
    started: Option<Instant>,
    finished: Option<Instant>,
    result: Option<u64>,
    work: WorkRange,
}

impl Task {
    pub fn new(id: TaskId, work: WorkRange) -> Self {
        Self {
            id,
            created: SystemTime::now(),
            started: None,
            finished: None,
            result: None,
            work,
        }
    }

    #[allow(dead_code)]
    pub fn started(&self) -> Option<Instant> {
        self.started
    }

    #[allow(dead_code)]
    pub fn finished(&self) -> Option<Instant> {
        self.finished
    }
}

impl Executable for Task {
    fn id(&self) -> TaskId {
        self.id
    }

    fn execute(&mut self, interrupt: &Interrupt) -> Result<u64, Interrupted> {
        let started = Instant::now();
        self.started = Some(started);
        info!("TASK {} -- started", self.id);
        if let Err(err) = interrupt.sleep(self.work.sample()) {
            error!("TASK {} -- failed: {err}", self.id);
            return Err(err);
        }
        let finished = Instant::now();
        self.finished = Some(finished);
        let elapsed = finished.duration_since(started).as_millis() as u64;
        self.result = Some(elapsed);
        Ok(elapsed)
    }

    fn result(&self) -> Option<u64> {
        self.result
    }
}
