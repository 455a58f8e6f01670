//! Tracing subscriber setup for hosts that do not install their own.

use tracing_subscriber::EnvFilter;

use crate::config::GeneralConfig;
use crate::error::{FlockError, Result};

/// Install a global `fmt` subscriber filtered at `general.log_level`.
/// `RUST_LOG`, when set, takes precedence.
///
/// # Errors
/// Returns `FlockError::Config` if the level does not parse or a global
/// subscriber is already installed.
pub fn init_tracing(general: &GeneralConfig) -> Result<()> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives),
        _ => EnvFilter::try_new(&general.log_level),
    }
    .map_err(|e| FlockError::Config(format!("invalid log level: {e}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| FlockError::Config(format!("tracing already initialised: {e}")))
}
