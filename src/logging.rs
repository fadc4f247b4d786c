// src/logging.rs

//! Diagnostics for a muddle run.
//!
//! Child processes inherit stdout, and `--just-print` and `query` write
//! their answers there, so everything muddle itself has to say goes to
//! stderr through `tracing`. Labels are attached as fields
//! (`label = %label`) rather than baked into messages.
//!
//! The level comes from `--log-level`, then `MUDDLE_LOG`, then `info`.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Consulted when `--log-level` is absent. Read per invocation, so a
/// wrapper script can turn on `debug` for one build without touching the
/// command lines it runs.
pub const LOG_ENV: &str = "MUDDLE_LOG";

/// Install the global subscriber. Call once, before the engine loads.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = resolve_level(cli_level, std::env::var(LOG_ENV).ok().as_deref());

    fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Flag beats environment; an unreadable environment value falls back to
/// `info` instead of failing the build.
fn resolve_level(cli_level: Option<LogLevel>, env_value: Option<&str>) -> Level {
    match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None => env_value.and_then(parse_level_str).unwrap_or(Level::INFO),
    }
}

fn level_from_log_level(lvl: LogLevel) -> Level {
    match lvl {
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}
