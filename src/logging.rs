//! Log subscriber setup.

use anyhow::{anyhow, Result};
use tracing::level_filters::LevelFilter;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Parse a configured log level, ignoring case.
///
/// Returns `None` for names that are not recognised.
pub fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Some(LevelFilter::TRACE),
        "debug" => Some(LevelFilter::DEBUG),
        "info" | "" => Some(LevelFilter::INFO),
        "warn" | "warning" => Some(LevelFilter::WARN),
        "err" | "error" => Some(LevelFilter::ERROR),
        _ => None,
    }
}

/// Install the global fmt subscriber.
///
/// `RUST_LOG` takes precedence when set. Otherwise `level` applies, with
/// unrecognised names treated as info.
pub fn init(level: &str) -> Result<()> {
    let parsed = parse_level(level);
    let filter = EnvFilter::builder()
        .with_default_directive(parsed.unwrap_or(LevelFilter::INFO).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow!("failed to initialise logging: {}", e))?;

    if parsed.is_none() {
        warn!(level = %level, "unknown log level, using info");
    }
    Ok(())
}
