//! Errors for the ambient layer (runtime capture, configuration, logging).
//!
//! Presentation operations themselves are total and never return these.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("no tokio runtime is available on this thread; construct inside a runtime or pass a handle")]
    NoRuntime(#[source] tokio::runtime::TryCurrentError),

    #[error("environment variable {key} has invalid value {value:?}: expected {expected}")]
    InvalidEnv {
        key: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("failed to open log sink at {path}: {source}")]
    LogSink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("a global tracing subscriber is already installed")]
    SubscriberInit,
}

impl OverlayError {
    #[must_use]
    pub fn invalid_env(key: &'static str, value: impl Into<String>, expected: &'static str) -> Self {
        Self::InvalidEnv {
            key,
            value: value.into(),
            expected,
        }
    }

    #[must_use]
    pub fn log_sink(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::LogSink {
            path: path.into(),
            source,
        }
    }
}
