//! Producer and consumer threads.

use std::sync::Arc;
use std::thread;

use log::{info, warn};

use crate::channel::BoundedChannel;
use crate::error::{PipelineError, PutError, TakeError};
use crate::interrupt::Interrupt;
use crate::lifecycle::Lifecycle;
use crate::stats::Statistics;
use crate::types::{Executable, TaskId};

/// A running worker: its thread, its interrupt token, and its lifecycle.
pub struct WorkerHandle<R> {
    pub role: &'static str,
    #[allow(dead_code)]
    pub interrupt: Interrupt,
    pub lifecycle: Arc<Lifecycle>,
    thread: thread::JoinHandle<R>,
}

impl<R> WorkerHandle<R> {
    pub fn join(self) -> Result<R, PipelineError> {
        self.thread
            .join()
            .map_err(|_| PipelineError::Panicked { role: self.role })
    }
}

// Marks the worker terminated on every exit path, unwinding included.
struct TerminateOnExit<'a>(&'a Lifecycle);

impl Drop for TerminateOnExit<'_> {
    fn drop(&mut self) {
        self.0.terminate();
    }
}

fn spawn_worker<R, F>(role: &'static str, body: F) -> Result<WorkerHandle<R>, PipelineError>
where
    R: Send + 'static,
    F: FnOnce(Interrupt) -> R + Send + 'static,
{
    let interrupt = Interrupt::new();
    let lifecycle = Arc::new(Lifecycle::new());
    let thread = {
        let interrupt = interrupt.clone();
        let lifecycle = Arc::clone(&lifecycle);
        thread::Builder::new()
            .name(format!("{role}-thread"))
            .spawn(move || {
                lifecycle.start();
                let _exit = TerminateOnExit(lifecycle.as_ref());
                body(interrupt)
            })
            .map_err(|source| PipelineError::Spawn { role, source })?
    };
    Ok(WorkerHandle {
        role,
        interrupt,
        lifecycle,
        thread,
    })
}

/// Submit `target` tasks built by `make_task`, then exit. Yields the number
/// actually submitted, which is short of `target` only if the channel closed.
pub fn spawn_producer<T, F>(
    target: u64,
    channel: Arc<BoundedChannel<T>>,
    stats: Option<Arc<Statistics>>,
    mut make_task: F,
) -> Result<WorkerHandle<u64>, PipelineError>
where
    T: Executable + 'static,
    F: FnMut(TaskId) -> T + Send + 'static,
{
    spawn_worker("producer", move |interrupt| {
        let mut submitted: u64 = 0;
        // A task whose put was interrupted is retried as-is.
        let mut pending: Option<T> = None;
        while submitted < target {
            let task = pending.take().unwrap_or_else(|| make_task(submitted));
            let id = task.id();
            let outcome = channel.put_then(task, &interrupt, || {
                if let Some(stats) = stats.as_ref() {
                    stats.record_submitted();
                }
            });
            match outcome {
                Ok(()) => {
                    info!("PRODUCER -- submitted task {id}");
                    submitted += 1;
                }
                Err(PutError::Interrupted(task)) => {
                    warn!("PRODUCER -- interrupted while submitting task {id}, retrying");
                    pending = Some(task);
                }
                Err(PutError::Closed(_)) => {
                    warn!("PRODUCER -- channel closed after {submitted} tasks");
                    break;
                }
            }
        }
        info!("PRODUCER -- out");
        submitted
    })
}

/// Take and execute `target` tasks one at a time, in delivery order. Yields
/// the ids in the order they were processed.
pub fn spawn_consumer<T>(
    target: u64,
    channel: Arc<BoundedChannel<T>>,
    stats: Option<Arc<Statistics>>,
) -> Result<WorkerHandle<Vec<TaskId>>, PipelineError>
where
    T: Executable + 'static,
{
    spawn_worker("consumer", move |interrupt| {
        let mut processed = Vec::new();
        while (processed.len() as u64) < target {
            let mut task = match channel.take(&interrupt) {
                Ok(task) => task,
                Err(TakeError::Interrupted) => {
                    warn!("CONSUMER -- interrupted while waiting for a task, retrying");
                    continue;
                }
                Err(TakeError::Closed) => {
                    warn!("CONSUMER -- channel closed after {} tasks", processed.len());
                    break;
                }
            };
            match task.execute(&interrupt) {
                Ok(ms) => info!("CONSUMER -- task {} took {ms}ms", task.id()),
                Err(err) => warn!("CONSUMER -- task {} abandoned: {err}", task.id()),
            }
            if let Some(stats) = stats.as_ref() {
                stats.record_processed(task.result());
            }
            processed.push(task.id());
        }
        info!("CONSUMER -- out");
        processed
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Interrupted;
    use crate::lifecycle::Phase;
    use crate::types::{Task, WorkRange};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    #[test]
    fn consumer_sees_tasks_in_submission_order() {
        let channel = Arc::new(BoundedChannel::new(3));
        let stats = Arc::new(Statistics::new());
        let total = 20;

        let producer = spawn_producer(total, Arc::clone(&channel), Some(Arc::clone(&stats)), |id| {
            Task::new(id, WorkRange::new(0, 2))
        })
        .expect("spawn producer");
        let consumer = spawn_consumer(total, Arc::clone(&channel), Some(Arc::clone(&stats)))
            .expect("spawn consumer");

        assert_eq!(producer.join().expect("producer"), total);
        let order = consumer.join().expect("consumer");
        assert_eq!(order, (0..total).collect::<Vec<_>>());

        let summary = stats.summarize();
        assert_eq!(summary.submitted, total);
        assert_eq!(summary.processed, total);
        assert!(channel.peak_occupancy() <= 3);
    }

    #[test]
    fn zero_target_terminates_immediately() {
        let channel: Arc<BoundedChannel<Task>> = Arc::new(BoundedChannel::new(1));
        let producer = spawn_producer(0, Arc::clone(&channel), None, |id| {
            Task::new(id, WorkRange::new(0, 0))
        })
        .expect("spawn producer");
        let consumer = spawn_consumer(0, Arc::clone(&channel), None).expect("spawn consumer");

        assert!(producer.lifecycle.wait_terminated(Duration::from_secs(1)));
        assert!(consumer.lifecycle.wait_terminated(Duration::from_secs(1)));
        assert_eq!(producer.join().expect("producer"), 0);
        assert!(consumer.join().expect("consumer").is_empty());
    }

    // Flags a violation if it executes before its own submission was counted.
    struct Probe {
        id: TaskId,
        stats: Arc<Statistics>,
        violated: Arc<AtomicBool>,
        result: Option<u64>,
    }

    impl Executable for Probe {
        fn id(&self) -> TaskId {
            self.id
        }

        fn execute(&mut self, _interrupt: &Interrupt) -> Result<u64, Interrupted> {
            if self.stats.processed() >= self.stats.submitted() {
                self.violated.store(true, Ordering::SeqCst);
            }
            self.result = Some(0);
            Ok(0)
        }

        fn result(&self) -> Option<u64> {
            self.result
        }
    }

    #[test]
    fn processed_never_overtakes_submitted() {
        let channel = Arc::new(BoundedChannel::new(2));
        let stats = Arc::new(Statistics::new());
        let violated = Arc::new(AtomicBool::new(false));
        let total = 200;

        let producer = {
            let stats = Arc::clone(&stats);
            let violated = Arc::clone(&violated);
            spawn_producer(total, Arc::clone(&channel), Some(Arc::clone(&stats)), move |id| Probe {
                id,
                stats: Arc::clone(&stats),
                violated: Arc::clone(&violated),
                result: None,
            })
            .expect("spawn producer")
        };
        let consumer = spawn_consumer(total, Arc::clone(&channel), Some(Arc::clone(&stats)))
            .expect("spawn consumer");

        producer.join().expect("producer");
        consumer.join().expect("consumer");
        assert!(!violated.load(Ordering::SeqCst));
        assert_eq!(stats.processed(), stats.submitted());
    }

    #[test]
    fn interrupted_execution_is_counted_as_failed() {
        let channel = Arc::new(BoundedChannel::new(2));
        let stats = Arc::new(Statistics::new());
        let interrupt = Interrupt::new();
        for id in 0..2 {
            let work = if id == 0 { WorkRange::new(5_000, 5_000) } else { WorkRange::new(1, 1) };
            channel.put(Task::new(id, work), &interrupt).expect("put");
        }

        let consumer = spawn_consumer(2, Arc::clone(&channel), Some(Arc::clone(&stats)))
            .expect("spawn consumer");
        // Let the consumer enter the long sleep of task 0.
        thread::sleep(Duration::from_millis(100));
        consumer.interrupt.raise();

        assert_eq!(consumer.join().expect("consumer"), vec![0, 1]);
        let summary = stats.summarize();
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.min_ms, summary.max_ms);
    }

    #[test]
    fn interrupted_waits_are_retried_without_loss() {
        let channel = Arc::new(BoundedChannel::new(1));
        let stats = Arc::new(Statistics::new());
        let total = 5;

        let producer = spawn_producer(total, Arc::clone(&channel), Some(Arc::clone(&stats)), |id| {
            Task::new(id, WorkRange::new(0, 0))
        })
        .expect("spawn producer");
        // Producer blocks on the full channel; interrupt it mid-wait.
        thread::sleep(Duration::from_millis(60));
        producer.interrupt.raise();
        thread::sleep(Duration::from_millis(60));

        let consumer = spawn_consumer(total, Arc::clone(&channel), Some(Arc::clone(&stats)))
            .expect("spawn consumer");
        assert_eq!(producer.join().expect("producer"), total);
        assert_eq!(consumer.join().expect("consumer"), (0..total).collect::<Vec<_>>());
        assert_eq!(stats.submitted(), total);
    }

    #[test]
    fn closed_channel_releases_blocked_producer() {
        let channel = Arc::new(BoundedChannel::new(1));
        let producer = spawn_producer(10, Arc::clone(&channel), None, |id| {
            Task::new(id, WorkRange::new(0, 0))
        })
        .expect("spawn producer");
        thread::sleep(Duration::from_millis(50));
        assert_eq!(producer.lifecycle.phase(), Phase::Running);
        channel.close();
        assert_eq!(producer.join().expect("producer"), 1);
    }
}
