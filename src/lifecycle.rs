//! One-shot worker lifecycle: NotStarted -> Running -> Terminated.

use std::sync::{Condvar, Mutex};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    Running,
    Terminated,
}

/// Shared view of a worker's phase, with a blocking wait for termination.
pub struct Lifecycle {
    phase: Mutex<Phase>,
    changed: Condvar,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            phase: Mutex::new(Phase::NotStarted),
            changed: Condvar::new(),
        }
    }

    /// Move to `Running`. Returns false if the worker was already started.
    pub fn start(&self) -> bool {
        self.advance(Phase::NotStarted, Phase::Running)
    }

    /// Move to `Terminated`. Returns false unless the worker was running.
    pub fn terminate(&self) -> bool {
        self.advance(Phase::Running, Phase::Terminated)
    }

    fn advance(&self, from: Phase, to: Phase) -> bool {
        let mut guard = self.phase.lock().expect("lifecycle mutex poisoned");
        if *guard != from {
            return false;
        }
        *guard = to;
        self.changed.notify_all();
        true
    }

    pub fn phase(&self) -> Phase {
        *self.phase.lock().expect("lifecycle mutex poisoned")
    }

    pub fn is_terminated(&self) -> bool {
        self.phase() == Phase::Terminated
    }

    /// Block up to `timeout` for termination; returns whether it happened.
    pub fn wait_terminated(&self, timeout: Duration) -> bool {
        let guard = self.phase.lock().expect("lifecycle mutex poisoned");
        let (guard, _) = self
            .changed
            .wait_timeout_while(guard, timeout, |phase| *phase != Phase::Terminated)
            .expect("lifecycle condvar wait failed");
        *guard == Phase::Terminated
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
