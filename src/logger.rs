// src/logger.rs

//! Stderr backend for the `log` facade
//!
//! Diagnostics never share stdout with the interactive console; everything
//! goes to stderr so snapshot and report files stay machine-readable.

use log::{Level, LevelFilter, Log, Metadata, Record};

/// Minimal stderr logger
///
/// Level filtering is done by the facade via [`log::set_max_level`].
struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        let tag = match record.level() {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        };
        eprintln!("[{tag}] {}", record.args());
    }

    fn flush(&self) {}
}

/// Installs the stderr logger at the given level.
///
/// Calling it twice is harmless; the second install is ignored.
pub fn init(max_level: LevelFilter) {
    static LOGGER: StderrLogger = StderrLogger;
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(max_level);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_init_is_harmless() {
        init(LevelFilter::Warn);
        init(LevelFilter::Info);
        log::info!("logger smoke test");
    }
}
