//! Logger initialization.

use std::io::Write;

use log::LevelFilter;

/// Initializes `env_logger`.
///
/// `RUST_LOG` is honoured when set; otherwise this crate logs at `info`
/// and the HTTP stack at `warn`. Safe to call more than once: later calls
/// are ignored.
pub fn init_logger() {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(LevelFilter::Warn)
        .filter_module("rate_limit_optimizer", LevelFilter::Info);

    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }

    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} {:<5} {}",
            chrono::Local::now().format("%H:%M:%S%.3f"),
            record.level(),
            record.args()
        )
    });

    // env_logger can only be initialized once per process
    let _ = builder.try_init();
}
