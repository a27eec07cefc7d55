//! Crate-wide settings loaded from the environment

use crate::{ConfigError, LogLevels, RetryPolicy, WireOptions};
use tracing::Level;

/// Emit stack traces in serialized exception errors (`true`/`false`)
pub const ENV_STACK_TRACES: &str = "OUTCOME_RAIL_STACK_TRACES";
/// Log level for successful outcomes
pub const ENV_SUCCESS_LEVEL: &str = "OUTCOME_RAIL_SUCCESS_LEVEL";
/// Log level for failed outcomes
pub const ENV_FAILURE_LEVEL: &str = "OUTCOME_RAIL_FAILURE_LEVEL";
/// Total attempts made by `retry`
pub const ENV_RETRY_ATTEMPTS: &str = "OUTCOME_RAIL_RETRY_ATTEMPTS";

/// Serialization, logging, and retry defaults
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RailConfig {
    /// Serialization settings
    pub wire: WireOptions,
    /// Severity per track for `log`
    pub log_levels: LogLevels,
    /// Default retry policy
    pub retry: RetryPolicy,
}

impl RailConfig {
    /// Defaults overridden by any `OUTCOME_RAIL_*` variables that are set
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each key
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_STACK_TRACES) {
            config.wire.include_stack_traces = parse_bool(ENV_STACK_TRACES, value)?;
        }
        if let Some(value) = lookup(ENV_SUCCESS_LEVEL) {
            config.log_levels.success = parse_level(ENV_SUCCESS_LEVEL, value)?;
        }
        if let Some(value) = lookup(ENV_FAILURE_LEVEL) {
            config.log_levels.failure = parse_level(ENV_FAILURE_LEVEL, value)?;
        }
        if let Some(value) = lookup(ENV_RETRY_ATTEMPTS) {
            config.retry.max_attempts = match value.trim().parse::<u32>() {
                Ok(0) => return Err(invalid(ENV_RETRY_ATTEMPTS, value, "must be at least 1")),
                Ok(attempts) => attempts,
                Err(e) => return Err(invalid(ENV_RETRY_ATTEMPTS, value, e.to_string())),
            };
        }

        tracing::debug!(?config, "Loaded outcome rail config");
        Ok(config)
    }
}

fn parse_bool(key: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value, "expected true or false")),
    }
}

fn parse_level(key: &'static str, value: String) -> Result<Level, ConfigError> {
    value
        .trim()
        .parse::<Level>()
        .map_err(|e| invalid(key, value.clone(), e.to_string()))
}

fn invalid(key: &'static str, value: String, reason: impl Into<Box<str>>) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<RailConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RailConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert!(!config.wire.include_stack_traces);
        assert_eq!(config.log_levels, LogLevels::default());
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            (ENV_STACK_TRACES, "true"),
            (ENV_SUCCESS_LEVEL, "info"),
            (ENV_FAILURE_LEVEL, "ERROR"),
            (ENV_RETRY_ATTEMPTS, "5"),
        ])
        .unwrap();
        assert!(config.wire.include_stack_traces);
        assert_eq!(config.log_levels.success, Level::INFO);
        assert_eq!(config.log_levels.failure, Level::ERROR);
        assert_eq!(config.retry.max_attempts, 5);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[(ENV_STACK_TRACES, "maybe")]),
            Err(ConfigError::InvalidValue { key: ENV_STACK_TRACES, .. })
        ));
        assert!(load(&[(ENV_FAILURE_LEVEL, "loud")]).is_err());
        assert!(load(&[(ENV_RETRY_ATTEMPTS, "0")]).is_err());
        assert!(load(&[(ENV_RETRY_ATTEMPTS, "-2")]).is_err());
    }
}
