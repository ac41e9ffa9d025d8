//! Shared run statistics and the final summary.

use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters written by the producer and consumer, read by the collector.
pub struct Statistics {
    submitted: AtomicU64,
    processed: AtomicU64,
    failed: AtomicU64,
    durations: Mutex<Vec<u64>>,
}

impl Statistics {
    pub fn new() -> Self {
        Self {
            submitted: AtomicU64::new(0),
            processed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            durations: Mutex::new(Vec::new()),
        }
    }

    pub fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::SeqCst);
    }

    /// Count a consumed task; `None` marks an execution that was abandoned.
    pub fn record_processed(&self, duration_ms: Option<u64>) {
        match duration_ms {
            Some(ms) => self
                .durations
                .lock()
                .expect("durations mutex poisoned")
                .push(ms),
            None => {
                self.failed.fetch_add(1, Ordering::SeqCst);
            }
        }
        self.processed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::SeqCst)
    }

    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::SeqCst)
    }

    /// Snapshot the counters and reduce the recorded durations.
    pub fn summarize(&self) -> Summary {
        let durations = self.durations.lock().expect("durations mutex poisoned");
        let min_ms = durations.iter().copied().min();
        let max_ms = durations.iter().copied().max();
        let avg_ms = if durations.is_empty() {
            None
        } else {
            Some(durations.iter().sum::<u64>() as f64 / durations.len() as f64)
        };
        Summary {
            submitted: self.submitted(),
            processed: self.processed(),
            failed: self.failed.load(Ordering::SeqCst),
            min_ms,
            max_ms,
            avg_ms,
        }
    }
}

impl Default for Statistics {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregate figures for one run. Duration fields are `None` when no task
/// completed successfully.
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    pub submitted: u64,
    pub processed: u64,
    pub failed: u64,
    pub min_ms: Option<u64>,
    pub max_ms: Option<u64>,
    pub avg_ms: Option<f64>,
}

fn or_na<T: fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "n/a".to_string())
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "#".repeat(50);
        writeln!(f, "{rule}")?;
        writeln!(f, "Submitted          {}", self.submitted)?;
        writeln!(f, "Processed          {}", self.processed)?;
        writeln!(f, "Failed             {}", self.failed)?;
        writeln!(f, "Min execution time {}", or_na(self.min_ms))?;
        writeln!(f, "Max execution time {}", or_na(self.max_ms))?;
        writeln!(f, "Avg execution time {}", or_na(self.avg_ms.map(|v| format!("{v:.2}"))))?;
        write!(f, "{rule}")
    }
}

/// Best-effort CPU user/system time snapshot (seconds) on Unix platforms.
#[cfg(unix)]
pub fn cpu_times_seconds() -> Option<(f64, f64)> {
    // SAFETY: rusage is plain old data; getrusage fills it in place.
    let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut usage) };
    if rc != 0 {
        return None;
    }
    let user = usage.ru_utime.tv_sec as f64 + (usage.ru_utime.tv_usec as f64 / 1_000_000.0);
    let sys = usage.ru_stime.tv_sec as f64 + (usage.ru_stime.tv_usec as f64 / 1_000_000.0);
    Some((user, sys))
}

/// Stub on non-Unix platforms.
#[cfg(not(unix))]
pub fn cpu_times_seconds() -> Option<(f64, f64)> {
    None
}
