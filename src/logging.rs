//! Tracing setup driven by [`EnvConfig`].
//!
//! The crate only emits `tracing` events. Hosts that already install a subscriber should
//! skip [`init`]; it never replaces an existing global subscriber.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::EnvConfig;
use crate::error::OverlayError;

/// Where [`init`] sent the crate's events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    /// Nothing requested; no subscriber installed.
    Disabled,
    Stderr,
    File(String),
}

/// Installs a global subscriber according to `config`.
///
/// `write_log` wins over `debug`: when both are set, events go to the file only.
pub fn init(config: &EnvConfig) -> Result<LogSink, OverlayError> {
    if let Some(path) = config.write_log.as_deref() {
        let file = open_append(path)?;
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(true);
        tracing_subscriber::registry()
            .with(filter(config))
            .with(layer)
            .try_init()
            .map_err(|_| OverlayError::SubscriberInit)?;
        tracing::debug!(path, "overlay tracing initialized");
        return Ok(LogSink::File(path.to_owned()));
    }

    if config.debug {
        tracing_subscriber::fmt()
            .with_env_filter(filter(config))
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|_| OverlayError::SubscriberInit)?;
        return Ok(LogSink::Stderr);
    }

    Ok(LogSink::Disabled)
}

fn filter(config: &EnvConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config.debug {
            EnvFilter::new("region_overlay=trace,debug")
        } else {
            EnvFilter::new("region_overlay=debug,info")
        }
    })
}

fn open_append(path: &str) -> Result<std::fs::File, OverlayError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(Path::new(path))
        .map_err(|source| OverlayError::log_sink(path, source))
}
