// src/log.rs
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Instant;

use env_logger::{Builder, Target};
use ::log::LevelFilter;

static START: OnceLock<Instant> = OnceLock::new();

fn start() -> Instant {
    *START.get_or_init(Instant::now)
}

fn fmt_elapsed(ms: u128) -> String {
    let total_ms = ms as u64;
    let h = total_ms / 3_600_000;
    let m = (total_ms % 3_600_000) / 60_000;
    let s = (total_ms % 60_000) / 1_000;
    let ms = total_ms % 1_000;
    format!("{h:02}:{m:02}:{s:02}.{ms:03}")
}

/// Install the process-wide logger.
///
/// Lines look like `[00:00:01.234][INFO] msg`. `RUST_LOG` wins over `verbose`;
/// with `file` set, lines are appended there instead of stderr.
/// Calling this twice is harmless (the second install is ignored).
pub fn init(verbose: bool, file: Option<&Path>) {
    start();

    let filters = std::env::var("RUST_LOG").ok().filter(|f| !f.trim().is_empty());
    let mut builder = builder(verbose, filters.as_deref());

    if let Some(path) = file {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => { builder.target(Target::Pipe(Box::new(f))); }
            Err(e) => eprintln!("Warning: cannot open log file {}: {e}", path.display()),
        }
    }

    let _ = builder.try_init();
}

/// Logger setup minus the output target. `filters` is a `RUST_LOG`-style
/// directive list; without one the HTTP stack is held at warn.
fn builder(verbose: bool, filters: Option<&str>) -> Builder {
    let mut builder = Builder::new();
    match filters {
        Some(spec) => { builder.parse_filters(spec); }
        None => {
            builder.filter_level(if verbose { LevelFilter::Debug } else { LevelFilter::Info });
            builder.filter_module("reqwest", LevelFilter::Warn);
            builder.filter_module("hyper_util", LevelFilter::Warn);
        }
    }
    builder.format(|buf, record| {
        let elapsed = fmt_elapsed(start().elapsed().as_millis());
        writeln!(buf, "[{elapsed}][{}] {}", record.level(), record.args())
    });
    builder
}

/// Info-level logging
#[macro_export]
macro_rules! logf {
    ($($arg:tt)*) => {
        ::log::info!($($arg)*)
    };
}

/// Warn-level logging
#[macro_export]
macro_rules! logw {
    ($($arg:tt)*) => {
        ::log::warn!($($arg)*)
    };
}

/// Debug-level logging
#[macro_export]
macro_rules! logd {
    ($($arg:tt)*) => {
        ::log::debug!($($arg)*)
    };
}

/// Error-level logging
#[macro_export]
macro_rules! loge {
    ($($arg:tt)*) => {
        ::log::error!($($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::log::{Level, Log, Metadata};

    fn enabled(logger: &env_logger::Logger, target: &str, level: Level) -> bool {
        logger.enabled(&Metadata::builder().target(target).level(level).build())
    }

    #[test]
    fn http_stack_is_quiet_by_default() {
        let logger = builder(true, None).build();
        assert!(enabled(&logger, "carnabot_poller::fetch", Level::Debug));
        assert!(!enabled(&logger, "reqwest::connect", Level::Info));
        assert!(enabled(&logger, "reqwest::connect", Level::Warn));
    }

    #[test]
    fn explicit_filters_win() {
        let logger = builder(false, Some("warn,reqwest=debug,carnabot_poller::store=debug")).build();
        assert!(enabled(&logger, "reqwest::connect", Level::Debug));
        assert!(enabled(&logger, "carnabot_poller::store", Level::Debug));
        assert!(!enabled(&logger, "carnabot_poller::fetch", Level::Info));
    }

    #[test]
    fn elapsed_is_zero_padded() {
        assert_eq!(fmt_elapsed(0), "00:00:00.000");
        assert_eq!(fmt_elapsed(3_723_004), "01:02:03.004");
    }
}
