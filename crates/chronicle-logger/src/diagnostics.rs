//! Process-wide subscriber for the `tracing` diagnostics emitted by the
//! toolkit's own crates.

use std::error::Error;

use tracing_subscriber::EnvFilter;

use crate::level::LogLevel;
use crate::options::LoggerOptions;

/// Installs the global `tracing` subscriber. `RUST_LOG` wins when set;
/// otherwise the filter follows `options.level`.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(options: &LoggerOptions) -> Result<(), Box<dyn Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(options.level)));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if options.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    }
}

fn default_directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Debug => "debug",
        LogLevel::Warn => "warn",
        LogLevel::Error | LogLevel::Fatal => "error",
        LogLevel::Info | LogLevel::Undefined => "info",
    }
}
