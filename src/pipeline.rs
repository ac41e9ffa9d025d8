//! Wires the channel, producer, consumer, and collector into one run.

use std::sync::Arc;
use std::time::Instant;

use log::{error, info, warn};

use crate::channel::BoundedChannel;
use crate::collector::spawn_collector;
use crate::config::RunConfig;
use crate::error::PipelineError;
use crate::stats::{Statistics, Summary, cpu_times_seconds};
use crate::types::{Task, TaskId};
use crate::workers::{spawn_consumer, spawn_producer};

/// Everything learned from a single run.
pub struct RunReport {
    pub summary: Summary,
    pub consumed_order: Vec<TaskId>,
    pub capacity: usize,
    pub peak_occupancy: usize,
    pub elapsed_ms: f64,
    pub throughput: f64,
    pub cpu_user_s: Option<f64>,
    pub cpu_sys_s: Option<f64>,
}

/// Run one producer/consumer session to completion.
pub fn run(config: &RunConfig) -> Result<RunReport, PipelineError> {
    config.validate()?;
    info!(
        "[PIPELINE] start tasks={} capacity={} work={}..={}ms poll={}ms",
        config.tasks, config.capacity, config.min_work_ms, config.max_work_ms, config.poll_ms
    );

    let channel = Arc::new(BoundedChannel::new(config.capacity));
    let stats = Arc::new(Statistics::new());
    let work = config.work_range();

    let cpu_start = cpu_times_seconds();
    let start = Instant::now();

    let producer = spawn_producer(
        config.tasks,
        Arc::clone(&channel),
        Some(Arc::clone(&stats)),
        move |id| Task::new(id, work),
    )?;
    let consumer = match spawn_consumer(config.tasks, Arc::clone(&channel), Some(Arc::clone(&stats))) {
        Ok(consumer) => consumer,
        Err(err) => {
            // Nobody will drain the channel; release the producer before bailing.
            error!("[PIPELINE] consumer startup failed: {err}");
            channel.close();
            let _ = producer.join();
            return Err(err);
        }
    };
    let collector = spawn_collector(
        Arc::clone(&stats),
        Arc::clone(&producer.lifecycle),
        Arc::clone(&consumer.lifecycle),
        config.poll_interval(),
    )?;

    producer.join()?;
    let consumed_order = consumer.join()?;
    let summary = collector
        .join()
        .map_err(|_| PipelineError::Panicked { role: "collector" })?;

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    let throughput = if elapsed_ms > 0.0 {
        summary.processed as f64 / (elapsed_ms / 1000.0)
    } else {
        0.0
    };
    let (cpu_user_s, cpu_sys_s) = match (cpu_start, cpu_times_seconds()) {
        (Some((user_start, sys_start)), Some((user_end, sys_end))) => {
            (Some(user_end - user_start), Some(sys_end - sys_start))
        }
        _ => (None, None),
    };
    let leftover = channel.len();
    if leftover > 0 {
        warn!("[PIPELINE] {leftover} task(s) left undelivered in the channel");
    }
    info!("[PIPELINE] finished in {elapsed_ms:.0}ms");

    Ok(RunReport {
        summary,
        consumed_order,
        capacity: channel.capacity(),
        peak_occupancy: channel.peak_occupancy(),
        elapsed_ms,
        throughput,
        cpu_user_s,
        cpu_sys_s,
    })
}

fn fmt_opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "n/a".to_string())
}

/// Print the stdout summary block.
pub fn print_report(report: &RunReport) {
    let summary = &report.summary;
    let cpu_user = report
        .cpu_user_s
        .map(|v| format!("{v:.4}"))
        .unwrap_or_else(|| "NA".to_string());
    let cpu_sys = report
        .cpu_sys_s
        .map(|v| format!("{v:.4}"))
        .unwrap_or_else(|| "NA".to_string());
    println!("RUN SUMMARY");
    println!("submitted={}", summary.submitted);
    println!("processed={}", summary.processed);
    println!("failed={}", summary.failed);
    println!("min_ms={}", fmt_opt(summary.min_ms));
    println!("max_ms={}", fmt_opt(summary.max_ms));
    println!("avg_ms={}", fmt_opt(summary.avg_ms.map(|v| format!("{v:.2}"))));
    println!("capacity={}", report.capacity);
    println!("peak_occupancy={}", report.peak_occupancy);
    println!("elapsed_ms={:.2}", report.elapsed_ms);
    println!("throughput_tasks_per_s={:.2}", report.throughput);
    println!("cpu_user_s={cpu_user}");
    println!("cpu_sys_s={cpu_sys}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    fn quick(tasks: u64, capacity: usize) -> RunConfig {
        RunConfig {
            tasks,
            capacity,
            min_work_ms: 2,
            max_work_ms: 6,
            poll_ms: 10,
        }
    }

    #[test]
    fn full_run_conserves_and_orders_tasks() {
        let report = run(&quick(30, 4)).expect("run failed");
        let summary = &report.summary;
        assert_eq!(summary.submitted, 30);
        assert_eq!(summary.processed, 30);
        assert_eq!(summary.failed, 0);
        assert_eq!(report.consumed_order, (0..30).collect::<Vec<_>>());
        assert!(report.peak_occupancy <= 4);
        assert!(summary.min_ms.expect("min") >= 2);
        let avg = summary.avg_ms.expect("avg");
        assert!(avg >= 2.0);
        assert!(summary.max_ms.expect("max") as f64 >= avg);
    }

    #[test]
    fn serial_consumer_takes_at_least_sum_of_minimums() {
        let report = run(&quick(10, 10)).expect("run failed");
        // Ten tasks of at least 2ms each, executed one after another.
        assert!(report.elapsed_ms >= 20.0);
    }

    #[test]
    fn zero_tasks_reports_sentinels() {
        let report = run(&quick(0, 1)).expect("run failed");
        assert_eq!(report.summary.submitted, 0);
        assert_eq!(report.summary.processed, 0);
        assert_eq!(report.summary.min_ms, None);
        assert_eq!(report.summary.max_ms, None);
        assert_eq!(report.summary.avg_ms, None);
        assert!(report.consumed_order.is_empty());
        assert_eq!(report.peak_occupancy, 0);
    }

    #[test]
    fn invalid_config_aborts_before_spawning() {
        let mut config = quick(5, 1);
        config.capacity = 0;
        match run(&config) {
            Err(PipelineError::Config(ConfigError::ZeroCapacity)) => {}
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("zero capacity should be rejected"),
        }
    }
}
