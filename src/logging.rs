//! Tracing subscriber setup for the server binary.

use anyhow::{anyhow, Result};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Builds the filter from `RUST_LOG` when set, else from `directive`.
pub fn build_env_filter(directive: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(directive)
            .map_err(|err| anyhow!("invalid log filter '{directive}': {err}")),
    }
}

/// Installs the global subscriber. Call once at startup.
pub fn init_logging(directive: &str) -> Result<()> {
    let filter = build_env_filter(directive)?;
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()
        .map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))
}
