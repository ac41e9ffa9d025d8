use std::io::Write;
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use env_logger::Env;

/// Install the process logger. Defaults to `info`; `RUST_LOG` overrides.
/// Records carry a millisecond timestamp and the emitting thread's name.
pub fn init() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0);
            let current = thread::current();
            let thread_name = current.name().unwrap_or("unnamed");
            writeln!(buf, "[{ts}ms][{thread_name}] {} {}", record.level(), record.args())
        })
        .try_init();
}
