//! Engine configuration.
//!
//! # Responsibility
//! - Hold the knobs the engine is built from, with working defaults.
//! - Read overrides from `MEDREMIND_*` environment variables.
//!
//! # Invariants
//! - Invalid environment values are rejected, never silently replaced.

use crate::service::reminder_clock::DEFAULT_SCAN_INTERVAL;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const DB_PATH_ENV: &str = "MEDREMIND_DB_PATH";
pub const SCAN_INTERVAL_ENV: &str = "MEDREMIND_SCAN_INTERVAL_SECS";
pub const PAST_ADD_POLICY_ENV: &str = "MEDREMIND_PAST_ADD_POLICY";

const DEFAULT_DB_FILE_NAME: &str = "medremind.sqlite3";

/// What add/update do when the reminder instant has already passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PastAddPolicy {
    /// Hand it to the scheduler, which delivers immediately.
    #[default]
    DeliverNow,
    /// Persist only; log and send nothing.
    Skip,
}

impl PastAddPolicy {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "deliver_now" => Some(Self::DeliverNow),
            "skip" => Some(Self::Skip),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value } => {
                write!(f, "invalid value `{value}` for `{key}`")
            }
        }
    }
}

impl Error for ConfigError {}

/// Settings used to assemble a `ReminderEngine`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// SQLite file backing the key-value store.
    pub db_path: PathBuf,
    pub scan_interval: Duration,
    pub past_add_policy: PastAddPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            scan_interval: DEFAULT_SCAN_INTERVAL,
            past_add_policy: PastAddPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(path) = read(DB_PATH_ENV) {
            config.db_path = PathBuf::from(path);
        }

        if let Some(raw) = read(SCAN_INTERVAL_ENV) {
            let seconds = raw
                .parse::<u64>()
                .ok()
                .filter(|seconds| *seconds > 0)
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: SCAN_INTERVAL_ENV,
                    value: raw.clone(),
                })?;
            config.scan_interval = Duration::from_secs(seconds);
        }

        if let Some(raw) = read(PAST_ADD_POLICY_ENV) {
            config.past_add_policy =
                PastAddPolicy::parse(&raw).ok_or(ConfigError::InvalidValue {
                    key: PAST_ADD_POLICY_ENV,
                    value: raw,
                })?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ConfigError, EngineConfig, PastAddPolicy, DB_PATH_ENV, PAST_ADD_POLICY_ENV,
        SCAN_INTERVAL_ENV,
    };
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = EngineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.scan_interval, Duration::from_secs(60));
        assert_eq!(config.past_add_policy, PastAddPolicy::DeliverNow);
    }

    #[test]
    fn overrides_are_applied() {
        let config = EngineConfig::from_lookup(lookup(&[
            (DB_PATH_ENV, " /data/reminders.db "),
            (SCAN_INTERVAL_ENV, "30"),
            (PAST_ADD_POLICY_ENV, "SKIP"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/data/reminders.db"));
        assert_eq!(config.scan_interval, Duration::from_secs(30));
        assert_eq!(config.past_add_policy, PastAddPolicy::Skip);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = EngineConfig::from_lookup(lookup(&[(SCAN_INTERVAL_ENV, "0")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: SCAN_INTERVAL_ENV,
                value: "0".to_string()
            }
        );

        let err =
            EngineConfig::from_lookup(lookup(&[(PAST_ADD_POLICY_ENV, "sometimes")])).unwrap_err();
        assert!(err.to_string().contains(PAST_ADD_POLICY_ENV));
    }
}
