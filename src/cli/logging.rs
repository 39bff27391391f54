//! Tracing subscriber setup for the `frame-navigator` binary.
//!
//! Filter priority: `FRAME_NAVIGATOR_LOG`, then `RUST_LOG`, then the `-v`
//! count (none: warn, `-v`: info, `-vv`: debug, `-vvv`: trace).

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

pub const LOG_ENV: &str = "FRAME_NAVIGATOR_LOG";

pub fn level_for(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install the global subscriber. Later calls are ignored.
pub fn init_subscriber(verbose: u8) {
    let filter = build_env_filter(verbose);

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose > 1)
        .with_level(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer.without_time().compact())
        .try_init();
}

pub fn build_env_filter(verbose: u8) -> EnvFilter {
    if let Ok(directives) = std::env::var(LOG_ENV)
        && let Ok(filter) = EnvFilter::try_new(&directives)
    {
        return filter;
    }

    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    let level = level_for(verbose);
    EnvFilter::new(format!("warn,frame_navigator={}", level.to_string().to_lowercase()))
}
