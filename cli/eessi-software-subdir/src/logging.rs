//! stderr logging with `WARNING:`-style prefixes.

use std::io::Write;

use log::Level;

/// Default filter for a given `-v` count.
pub fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Prefix printed before a message of the given level.
pub fn level_label(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARNING",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}

/// Install the logger. `RUST_LOG` takes precedence over `-v`.
pub fn init(verbose: u8) {
    let env = env_logger::Env::default().default_filter_or(default_filter(verbose));
    let _ = env_logger::Builder::from_env(env)
        .format(|buf, record| writeln!(buf, "{}: {}", level_label(record.level()), record.args()))
        .target(env_logger::Target::Stderr)
        .try_init();
}
