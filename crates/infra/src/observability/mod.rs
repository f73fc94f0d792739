//! Structured logging setup
//!
//! `RUST_LOG` takes precedence over the configured level so operators can
//! raise verbosity for a single run without touching config files.

use questlog_domain::{LoggingConfig, QuestlogError, Result};
use tracing_subscriber::EnvFilter;

/// Build the filter: `RUST_LOG` if set and valid, else `config.level`.
///
/// # Errors
/// `Config` when the configured level is not a valid filter directive.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level)
        .map_err(|e| QuestlogError::Config(format!("Invalid log level '{}': {e}", config.level)))
}

/// Install the global tracing subscriber.
///
/// Returns `false` when a subscriber was already installed (e.g. by a test
/// harness); the existing one is kept.
///
/// # Errors
/// See [`env_filter`].
pub fn init_tracing(config: &LoggingConfig) -> Result<bool> {
    let filter = env_filter(config)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let installed = if config.json {
        builder.json().with_current_span(false).try_init().is_ok()
    } else {
        builder.compact().try_init().is_ok()
    };
    Ok(installed)
}
