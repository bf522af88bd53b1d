//! Structured logging

use tracing_subscriber::EnvFilter;

use crate::{config::Config, error::Result};

/// Install the JSON log subscriber.
///
/// `service.log_level` is read as an `EnvFilter` directive, so both `debug`
/// and `bookstore=debug,tower_http=info` work. An unparseable value falls
/// back to `info`. Calling this twice is harmless; the second call logs a
/// warning and keeps the first subscriber.
pub fn init_tracing(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_new(&config.service.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .try_init();

    if let Err(e) = installed {
        tracing::warn!("Tracing already initialized: {}", e);
        return Ok(());
    }

    tracing::info!(
        environment = %config.service.environment,
        "Tracing initialized for service: {}",
        config.service.name
    );

    Ok(())
}
