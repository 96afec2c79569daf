//! Configuration for the component loader

use crate::error::{LoaderError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long a loaded component stays fresh
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Consecutive failures tolerated before retries are refused
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Interval between background sweeps of stale entries
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

const ENV_TTL_SECS: &str = "GAME_LOADER_TTL_SECS";
const ENV_MAX_RETRIES: &str = "GAME_LOADER_MAX_RETRIES";
const ENV_CLEANUP_INTERVAL_SECS: &str = "GAME_LOADER_CLEANUP_INTERVAL_SECS";
const ENV_AUTO_CLEANUP: &str = "GAME_LOADER_AUTO_CLEANUP";

/// Configuration for the component loader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Time-to-live of a cached component
    pub ttl: Duration,

    /// Retry ceiling per game identifier
    pub max_retries: u32,

    /// Run a background task that sweeps stale entries
    pub enable_auto_cleanup: bool,

    /// Interval for automatic cleanup checks
    pub cleanup_interval: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            max_retries: DEFAULT_MAX_RETRIES,
            enable_auto_cleanup: false,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
        }
    }
}

impl LoaderConfig {
    /// Create a new builder for loader configuration
    pub fn builder() -> LoaderConfigBuilder {
        LoaderConfigBuilder::default()
    }

    /// Build a configuration from the process environment.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    /// Unset variables fall back to the defaults.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();

        if let Some(secs) = parse_var::<u64>(&lookup, ENV_TTL_SECS)? {
            builder = builder.ttl(Duration::from_secs(secs));
        }
        if let Some(max) = parse_var::<u32>(&lookup, ENV_MAX_RETRIES)? {
            builder = builder.max_retries(max);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, ENV_CLEANUP_INTERVAL_SECS)? {
            builder = builder.cleanup_interval(Duration::from_secs(secs));
        }
        if let Some(enable) = parse_var::<bool>(&lookup, ENV_AUTO_CLEANUP)? {
            builder = builder.enable_auto_cleanup(enable);
        }

        let config = builder.build();
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.ttl.is_zero() {
            return Err(LoaderError::ConfigError(
                "ttl must be greater than 0".to_string(),
            ));
        }

        if self.max_retries == 0 {
            return Err(LoaderError::ConfigError(
                "max_retries must be greater than 0".to_string(),
            ));
        }

        if self.enable_auto_cleanup && self.cleanup_interval.is_zero() {
            return Err(LoaderError::ConfigError(
                "cleanup_interval must be greater than 0 when auto cleanup is enabled".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| LoaderError::ConfigError(format!("invalid {}={:?}: {}", key, raw, e))),
    }
}

/// Builder for loader configuration
#[derive(Debug, Default)]
pub struct LoaderConfigBuilder {
    ttl: Option<Duration>,
    max_retries: Option<u32>,
    enable_auto_cleanup: Option<bool>,
    cleanup_interval: Option<Duration>,
}

impl LoaderConfigBuilder {
    /// Set the time-to-live for cached components
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Set the retry ceiling
    pub fn max_retries(mut self, max: u32) -> Self {
        self.max_retries = Some(max);
        self
    }

    /// Enable or disable automatic cleanup
    pub fn enable_auto_cleanup(mut self, enable: bool) -> Self {
        self.enable_auto_cleanup = Some(enable);
        self
    }

    /// Set cleanup interval
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = Some(interval);
        self
    }

    /// Build the loader configuration
    pub fn build(self) -> LoaderConfig {
        let defaults = LoaderConfig::default();

        LoaderConfig {
            ttl: self.ttl.unwrap_or(defaults.ttl),
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            enable_auto_cleanup: self
                .enable_auto_cleanup
                .unwrap_or(defaults.enable_auto_cleanup),
            cleanup_interval: self.cleanup_interval.unwrap_or(defaults.cleanup_interval),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = LoaderConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(300));
        assert_eq!(config.max_retries, 3);
        assert!(!config.enable_auto_cleanup);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut invalid = LoaderConfig::default();
        invalid.ttl = Duration::ZERO;
        assert!(invalid.validate().is_err());

        let mut invalid = LoaderConfig::default();
        invalid.max_retries = 0;
        assert!(invalid.validate().is_err());

        let invalid = LoaderConfig::builder()
            .enable_auto_cleanup(true)
            .cleanup_interval(Duration::ZERO)
            .build();
        assert!(matches!(invalid.validate(), Err(LoaderError::ConfigError(_))));
    }

    #[test]
    fn test_config_builder() {
        let config = LoaderConfig::builder()
            .ttl(Duration::from_secs(30))
            .max_retries(5)
            .build();

        assert_eq!(config.ttl, Duration::from_secs(30));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.cleanup_interval, DEFAULT_CLEANUP_INTERVAL);
    }

    #[test]
    fn test_env_overrides() {
        let config = LoaderConfig::from_lookup(lookup_from(&[
            (ENV_TTL_SECS, "120"),
            (ENV_MAX_RETRIES, " 5 "),
            (ENV_AUTO_CLEANUP, "true"),
            (ENV_CLEANUP_INTERVAL_SECS, "30"),
        ]))
        .unwrap();

        assert_eq!(config.ttl, Duration::from_secs(120));
        assert_eq!(config.max_retries, 5);
        assert!(config.enable_auto_cleanup);
        assert_eq!(config.cleanup_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_env_defaults_when_unset() {
        let config = LoaderConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, LoaderConfig::default());
    }

    #[test]
    fn test_env_rejects_garbage() {
        let err = LoaderConfig::from_lookup(lookup_from(&[(ENV_MAX_RETRIES, "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_MAX_RETRIES));

        let err = LoaderConfig::from_lookup(lookup_from(&[(ENV_TTL_SECS, "0")])).unwrap_err();
        assert!(matches!(err, LoaderError::ConfigError(_)));

        let err = LoaderConfig::from_lookup(lookup_from(&[
            (ENV_AUTO_CLEANUP, "true"),
            (ENV_CLEANUP_INTERVAL_SECS, "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, LoaderError::ConfigError(_)));
    }

    #[test]
    fn test_config_serde() {
        let config = LoaderConfig::builder().max_retries(4).build();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: LoaderConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.max_retries, 4);
    }
}
