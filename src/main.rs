mod channel;
mod collector;
mod config;
mod error;
mod interrupt;
mod lifecycle;
mod logging;
mod pipeline;
mod stats;
mod types;
mod workers;

use config::{
    DEFAULT_CAPACITY, DEFAULT_MAX_WORK_MS, DEFAULT_MIN_WORK_MS, DEFAULT_POLL_MS, DEFAULT_TASKS,
    RunConfig,
};

fn print_usage(program: &str) {
    println!("Task Pipeline CLI");
    println!("Usage:");
    println!("  {program} [tasks] [capacity] [min_ms] [max_ms] [poll_ms]");
    println!("  {program} --help");
    println!();
    println!("All arguments are positional and optional. Use \"-\" to keep a default.");
    println!("Defaults:");
    println!(
        "  tasks={DEFAULT_TASKS} capacity={DEFAULT_CAPACITY} min_ms={DEFAULT_MIN_WORK_MS} max_ms={DEFAULT_MAX_WORK_MS} poll_ms={DEFAULT_POLL_MS}"
    );
    println!("Logging goes to stderr; set RUST_LOG to change the level.");
}

fn exit_with_usage(program: &str, message: &str) -> ! {
    eprintln!("{message}");
    print_usage(program);
    std::process::exit(2);
}

fn main() {
    let program = std::env::args()
        .next()
        .unwrap_or_else(|| "task_pipeline".to_string());
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Some("--help" | "-h" | "help") = args.first().map(String::as_str) {
        print_usage(&program);
        return;
    }

    let config = match RunConfig::from_args(args) {
        Ok(config) => config,
        Err(err) => exit_with_usage(&program, &format!("invalid arguments: {err}")),
    };

    logging::init();
    match pipeline::run(&config) {
        Ok(report) => pipeline::print_report(&report),
        Err(err) => {
            eprintln!("run failed: {err}");
            std::process::exit(1);
        }
    }
}
