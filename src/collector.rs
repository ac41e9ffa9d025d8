//! Waits for both workers to finish, then reports run statistics.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, info};

use crate::error::PipelineError;
use crate::lifecycle::Lifecycle;
use crate::stats::{Statistics, Summary};

/// Block until both lifecycles are terminated, re-checking at most every
/// `poll`. Returns the number of intervals that elapsed without completion.
pub fn wait_for_workers(producer: &Lifecycle, consumer: &Lifecycle, poll: Duration) -> u64 {
    let mut idle_polls = 0;
    loop {
        let pending = if !producer.is_terminated() {
            producer
        } else if !consumer.is_terminated() {
            consumer
        } else {
            return idle_polls;
        };
        if !pending.wait_terminated(poll) {
            idle_polls += 1;
            debug!("COLLECTOR -- workers still running after {idle_polls} poll(s)");
        }
    }
}

/// Spawn the collector thread. Its summary is only produced after both the
/// producer and the consumer have terminated.
pub fn spawn_collector(
    stats: Arc<Statistics>,
    producer: Arc<Lifecycle>,
    consumer: Arc<Lifecycle>,
    poll: Duration,
) -> Result<thread::JoinHandle<Summary>, PipelineError> {
    thread::Builder::new()
        .name("collector-thread".to_string())
        .spawn(move || {
            wait_for_workers(&producer, &consumer, poll);
            let summary = stats.summarize();
            info!("COLLECTOR -- run statistics\n{summary}");
            summary
        })
        .map_err(|source| PipelineError::Spawn {
            role: "collector",
            source,
        })
}
