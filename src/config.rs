//! Environment configuration.

use std::env;
use std::time::Duration;

use crate::error::OverlayError;

pub const DEBUG_ENV: &str = "REGION_OVERLAY_DEBUG";
pub const WRITE_LOG_ENV: &str = "REGION_OVERLAY_WRITE_LOG";
pub const PRUNE_THRESHOLD_ENV: &str = "REGION_OVERLAY_PRUNE_THRESHOLD";
pub const DISMISS_FLOOR_ENV: &str = "REGION_OVERLAY_DISMISS_FLOOR_MS";

/// Directory size past which detached regions are pruned.
pub const DEFAULT_PRUNE_THRESHOLD: usize = 30;
/// Smallest delay a queue waits before auto-dismissing its active item.
pub const DEFAULT_DISMISS_FLOOR: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq)]
pub struct EnvConfig {
    pub debug: bool,
    pub write_log: Option<String>,
    pub prune_threshold: usize,
    pub dismiss_floor: Duration,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            debug: false,
            write_log: None,
            prune_threshold: DEFAULT_PRUNE_THRESHOLD,
            dismiss_floor: DEFAULT_DISMISS_FLOOR,
        }
    }
}

impl EnvConfig {
    /// Reads the environment, falling back to defaults for malformed numbers.
    pub fn from_env() -> Self {
        match Self::try_from_env() {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(%err, "ignoring malformed overlay configuration");
                let defaults = Self::default();
                Self {
                    debug: env_flag(DEBUG_ENV),
                    write_log: env_string_opt(WRITE_LOG_ENV),
                    prune_threshold: env_parse_opt::<usize>(PRUNE_THRESHOLD_ENV, "an integer")
                        .ok()
                        .flatten()
                        .unwrap_or(defaults.prune_threshold),
                    dismiss_floor: env_parse_opt::<u64>(DISMISS_FLOOR_ENV, "milliseconds")
                        .ok()
                        .flatten()
                        .map_or(defaults.dismiss_floor, Duration::from_millis),
                }
            }
        }
    }

    /// Reads the environment, reporting the first malformed numeric value.
    pub fn try_from_env() -> Result<Self, OverlayError> {
        let defaults = Self::default();
        let prune_threshold = env_parse_opt::<usize>(PRUNE_THRESHOLD_ENV, "an integer")?
            .unwrap_or(defaults.prune_threshold);
        let dismiss_floor = env_parse_opt::<u64>(DISMISS_FLOOR_ENV, "milliseconds")?
            .map_or(defaults.dismiss_floor, Duration::from_millis);
        Ok(Self {
            debug: env_flag(DEBUG_ENV),
            write_log: env_string_opt(WRITE_LOG_ENV),
            prune_threshold,
            dismiss_floor,
        })
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|value| value == "1").unwrap_or(false)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

fn env_parse_opt<T: std::str::FromStr>(
    key: &'static str,
    expected: &'static str,
) -> Result<Option<T>, OverlayError> {
    match env_string_opt(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| OverlayError::invalid_env(key, value, expected)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    struct EnvGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = &self.previous {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_env_guard(key: &'static str, value: Option<&str>) -> EnvGuard {
        let previous = env::var(key).ok();
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
        EnvGuard { key, previous }
    }

    #[test]
    fn env_defaults() {
        let _lock = env_lock();
        let _g1 = set_env_guard(DEBUG_ENV, None);
        let _g2 = set_env_guard(WRITE_LOG_ENV, None);
        let _g3 = set_env_guard(PRUNE_THRESHOLD_ENV, None);
        let _g4 = set_env_guard(DISMISS_FLOOR_ENV, None);

        let config = EnvConfig::from_env();
        assert_eq!(config, EnvConfig::default());
        assert_eq!(config.prune_threshold, 30);
        assert_eq!(config.dismiss_floor, Duration::from_millis(50));
    }

    #[test]
    fn env_values_are_read() {
        let _lock = env_lock();
        let _g1 = set_env_guard(DEBUG_ENV, Some("1"));
        let _g2 = set_env_guard(WRITE_LOG_ENV, Some("/tmp/overlay.log"));
        let _g3 = set_env_guard(PRUNE_THRESHOLD_ENV, Some("8"));
        let _g4 = set_env_guard(DISMISS_FLOOR_ENV, Some(" 120 "));

        let config = EnvConfig::try_from_env().expect("valid env");
        assert!(config.debug);
        assert_eq!(config.write_log.as_deref(), Some("/tmp/overlay.log"));
        assert_eq!(config.prune_threshold, 8);
        assert_eq!(config.dismiss_floor, Duration::from_millis(120));
    }

    #[test]
    fn empty_write_log_is_ignored() {
        let _lock = env_lock();
        let _g1 = set_env_guard(WRITE_LOG_ENV, Some("  "));
        let config = EnvConfig::from_env();
        assert!(config.write_log.is_none());
    }

    #[test]
    fn malformed_numbers_are_reported_then_defaulted() {
        let _lock = env_lock();
        let _g1 = set_env_guard(PRUNE_THRESHOLD_ENV, Some("lots"));
        let _g2 = set_env_guard(DISMISS_FLOOR_ENV, Some("75"));

        let err = EnvConfig::try_from_env().expect_err("malformed threshold");
        assert!(matches!(
            err,
            OverlayError::InvalidEnv {
                key: PRUNE_THRESHOLD_ENV,
                ..
            }
        ));

        let config = EnvConfig::from_env();
        assert_eq!(config.prune_threshold, DEFAULT_PRUNE_THRESHOLD);
        assert_eq!(config.dismiss_floor, Duration::from_millis(75));
    }
}
