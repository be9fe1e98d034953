//! Tracing subscriber setup, mapping the configured `log_level` to a
//! `tracing::Level`. Tracing has no STATUS level; `status` maps to `INFO`.

use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::settings::LogLevel;

fn tracing_level(level: LogLevel) -> Level {
    match level {
        LogLevel::Error => Level::ERROR,
        LogLevel::Warning => Level::WARN,
        LogLevel::Status => Level::INFO,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
    }
}

/// Initializes the global tracing subscriber. Safe to call once per process;
/// a second call is a caller error and panics, matching
/// `tracing_subscriber`'s own global-registration contract.
pub fn init_logging(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(tracing_level(level).to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
