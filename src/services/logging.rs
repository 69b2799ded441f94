//! Structured logging for termdeck.
//!
//! Installs a `tracing` subscriber writing to stderr (stdout belongs to the
//! control protocol). `RUST_LOG` overrides the configured level.
//!
//! Field names used across the crate: `window_id`, `workspace_id`,
//! `surface_id`, `handle`.

use std::sync::OnceLock;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::types::errors::LogError;
use crate::types::settings::LogSettings;

static LOGGING_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Installs the global subscriber. Returns `Ok(false)` if logging was
/// already set up by an earlier call.
pub fn init_logging(settings: &LogSettings) -> Result<bool, LogError> {
    if LOGGING_INITIALIZED.get().is_some() {
        return Ok(false);
    }

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.level)
            .map_err(|_| LogError::InvalidLevel(settings.level.clone()))?,
    };

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false);

    let result = if settings.compact {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer.compact().with_ansi(false))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer.with_ansi(true))
            .try_init()
    };
    result.map_err(|e| LogError::SetSubscriber(e.to_string()))?;

    let _ = LOGGING_INITIALIZED.set(());
    Ok(true)
}
