//! Diagnostics log: an append-only file receiving `tracing` events.

use anyhow::{Context, Result};
use std::{fs::OpenOptions, path::Path, sync::Mutex};
use tracing::Subscriber;
use tracing_subscriber::EnvFilter;

/// Build a subscriber that appends events at or above `directive` to `path`.
pub fn file_subscriber(
    path: &Path,
    directive: &str,
) -> Result<Box<dyn Subscriber + Send + Sync>> {
    let filter = EnvFilter::try_new(directive)
        .with_context(|| format!("Invalid log level directive: {directive}"))?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    Ok(Box::new(
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(false)
            .finish(),
    ))
}

/// Install the file subscriber for the whole process. Call once at startup.
pub fn init(path: &Path, directive: &str) -> Result<()> {
    let subscriber = file_subscriber(path, directive)?;
    tracing::subscriber::set_global_default(subscriber)
        .context("A global tracing subscriber is already installed")?;
    Ok(())
}
