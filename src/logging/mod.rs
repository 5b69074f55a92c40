//! `log` backend for the widget.
//!
//! # Invariants
//! - Initialization is idempotent; the first level wins.
//! - Initialization never panics.
//! - Messages are metadata only (`event=... module=...`); note content is never logged.

use log::{Level, LevelFilter, Log, Metadata, Record};
use once_cell::sync::OnceCell;

static LOGGER: ConsoleLogger = ConsoleLogger;
static INIT_LEVEL: OnceCell<LevelFilter> = OnceCell::new();

struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!("[notes] {} {}", record.level(), record.args());
        write_line(record.level(), &line);
    }

    fn flush(&self) {}
}

#[cfg(target_arch = "wasm32")]
fn write_line(level: Level, line: &str) {
    let msg = wasm_bindgen::JsValue::from_str(line);
    match level {
        Level::Error => web_sys::console::error_1(&msg),
        Level::Warn => web_sys::console::warn_1(&msg),
        Level::Info => web_sys::console::info_1(&msg),
        Level::Debug | Level::Trace => web_sys::console::debug_1(&msg),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn write_line(_level: Level, line: &str) {
    eprintln!("{line}");
}

/// Parse a level name; unknown names fall back to `info`.
pub fn parse_level(level: &str) -> LevelFilter {
    match level.trim().to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" | "warning" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Install the console logger once. Returns the active level.
pub fn init_logging(level: &str) -> LevelFilter {
    *INIT_LEVEL.get_or_init(|| {
        let filter = parse_level(level);
        match log::set_logger(&LOGGER) {
            Ok(()) => {
                log::set_max_level(filter);
                log::info!(
                    "event=logging_init module=logging status=ok level={} version={}",
                    filter,
                    env!("CARGO_PKG_VERSION")
                );
            }
            // Another logger (e.g. a host test harness) is already installed.
            Err(_) => log::set_max_level(filter),
        }
        filter
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level_names() {
        assert_eq!(parse_level("DEBUG"), LevelFilter::Debug);
        assert_eq!(parse_level(" warning "), LevelFilter::Warn);
        assert_eq!(parse_level("off"), LevelFilter::Off);
        assert_eq!(parse_level("verbose"), LevelFilter::Info);
    }

    #[test]
    fn test_init_is_idempotent_first_level_wins() {
        let first = init_logging("warn");
        let second = init_logging("trace");
        assert_eq!(first, second);
    }
}
