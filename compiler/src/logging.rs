//! Logging setup for the analyses and the `uniqpass` driver
//!
//! The library only emits through the `log` facade; binaries and tests pick
//! a backend here (`env_logger`).
//!
//! ```rust,ignore
//! use compiler::logging;
//!
//! logging::init();                                  // warn and above
//! logging::init_from_env();                         // honour RUST_LOG
//! logging::init_with_level(log::LevelFilter::Debug);
//! ```
//!
//! # Levels
//!
//! - `warn!` - malformed IR skipped during a walk
//! - `info!` - one line per pass invocation
//! - `debug!` - per-task summaries and every decision that marks a node not unique
//! - `trace!` - per-task classification counts
//!
//! Per-module filters work as usual:
//!
//! ```bash
//! RUST_LOG=compiler::analysis::bit_struct=debug uniqpass analyze program.json
//! ```

use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize at `Warn`. Later calls are no-ops.
pub fn init() {
    init_with_level(LevelFilter::Warn);
}

/// Initialize at `level`. Later calls are no-ops.
pub fn init_with_level(level: LevelFilter) {
    INIT.call_once(|| {
        Builder::new()
            .filter_level(level)
            .format(|buf, record| {
                writeln!(
                    buf,
                    "[{:5}] {} - {}",
                    record.level(),
                    record.module_path().unwrap_or("uniqpass"),
                    record.args()
                )
            })
            .init();
    });
}

/// Initialize from `RUST_LOG`, defaulting to `warn`.
pub fn init_from_env() {
    INIT.call_once(|| {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    });
}

/// Test logger: captured output, safe to call from every test.
pub fn init_test() {
    let _ = env_logger::builder()
        .filter_level(LevelFilter::Warn)
        .is_test(true)
        .try_init();
}

/// Whether one of the `init*` functions ran (`init_test` excluded).
pub fn is_initialized() -> bool {
    INIT.is_completed()
}
