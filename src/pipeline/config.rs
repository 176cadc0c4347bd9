//! Configuration of a generation run.
//!
//! A run is sized by three counts and a deadline: `iterations` passes over
//! `max_files` shards, executed by `max_workers` workers, abandoned after
//! `timeout`.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::scheduler::MAX_QUEUE_CAPACITY;

/// Default directory for shard outputs.
pub const DEFAULT_OUTPUT_DIR: &str = "./generated-shards";

/// Configuration for one `process` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Passes over the full set of shards.
    pub iterations: usize,
    /// Number of concurrent workers.
    pub max_workers: usize,
    /// Number of shard files.
    pub max_files: usize,
    /// Deadline for the whole run. Zero expires immediately.
    pub timeout: Duration,
    /// Directory the shard files are written to.
    pub output_dir: PathBuf,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            iterations: 1,
            max_workers: 4,
            max_files: 10,
            timeout: Duration::from_secs(30),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl GenerationConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SHARDGEN_ITERATIONS`: Passes over all shards (default: 1)
    /// - `SHARDGEN_MAX_WORKERS`: Concurrent workers (default: 4)
    /// - `SHARDGEN_MAX_FILES`: Shard file count (default: 10)
    /// - `SHARDGEN_TIMEOUT_SECS`: Run deadline in seconds (default: 30)
    /// - `SHARDGEN_OUTPUT_DIR`: Output directory (default: ./generated-shards)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable cannot be parsed or the result
    /// fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates configuration from any key lookup, using the same keys as
    /// [`GenerationConfig::from_env`]. Missing keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(val) = lookup("SHARDGEN_ITERATIONS") {
            config.iterations = parse_env_value(&val, "SHARDGEN_ITERATIONS")?;
        }

        if let Some(val) = lookup("SHARDGEN_MAX_WORKERS") {
            config.max_workers = parse_env_value(&val, "SHARDGEN_MAX_WORKERS")?;
        }

        if let Some(val) = lookup("SHARDGEN_MAX_FILES") {
            config.max_files = parse_env_value(&val, "SHARDGEN_MAX_FILES")?;
        }

        if let Some(val) = lookup("SHARDGEN_TIMEOUT_SECS") {
            let secs: u64 = parse_env_value(&val, "SHARDGEN_TIMEOUT_SECS")?;
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(val) = lookup("SHARDGEN_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(val);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any count is zero or the
    /// total task count overflows.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iterations == 0 {
            return Err(ConfigError::ValidationFailed(
                "iterations must be greater than 0".to_string(),
            ));
        }

        if self.max_workers == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_workers must be greater than 0".to_string(),
            ));
        }

        if self.max_files == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_files must be greater than 0".to_string(),
            ));
        }

        if self.iterations.checked_mul(self.max_files).is_none() {
            return Err(ConfigError::ValidationFailed(format!(
                "iterations * max_files overflows ({} * {})",
                self.iterations, self.max_files
            )));
        }

        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "output_dir cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Total number of tasks in the run.
    pub fn total_tasks(&self) -> u64 {
        self.iterations as u64 * self.max_files as u64
    }

    /// Capacity of the task queue: `min(10000, total)`.
    pub fn queue_capacity(&self) -> usize {
        (self.total_tasks().min(MAX_QUEUE_CAPACITY as u64) as usize).max(1)
    }

    /// Builder method to set iterations.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Builder method to set the worker count.
    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = workers;
        self
    }

    /// Builder method to set the shard count.
    pub fn with_max_files(mut self, files: usize) -> Self {
        self.max_files = files;
        self
    }

    /// Builder method to set the run deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder method to set the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }
}

/// Parse an environment variable value into a type.
fn parse_env_value<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("could not parse '{}'", value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = GenerationConfig::default();

        assert_eq!(config.iterations, 1);
        assert_eq!(config.max_workers, 4);
        assert_eq!(config.max_files, 10);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.output_dir, PathBuf::from("./generated-shards"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = GenerationConfig::new()
            .with_iterations(2)
            .with_max_workers(8)
            .with_max_files(3)
            .with_timeout(Duration::ZERO)
            .with_output_dir("/tmp/shards");

        assert_eq!(config.iterations, 2);
        assert_eq!(config.max_workers, 8);
        assert_eq!(config.max_files, 3);
        assert_eq!(config.timeout, Duration::ZERO);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/shards"));
        assert_eq!(config.total_tasks(), 6);
        assert!(config.validate().is_ok(), "a zero timeout is allowed");
    }

    #[test]
    fn test_validation_rejects_zero_counts() {
        for config in [
            GenerationConfig::new().with_iterations(0),
            GenerationConfig::new().with_max_workers(0),
            GenerationConfig::new().with_max_files(0),
            GenerationConfig::new().with_output_dir(""),
        ] {
            assert!(matches!(
                config.validate(),
                Err(ConfigError::ValidationFailed(_))
            ));
        }
    }

    #[test]
    fn test_validation_rejects_overflow() {
        let config = GenerationConfig::new()
            .with_iterations(usize::MAX)
            .with_max_files(2);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_queue_capacity() {
        let small = GenerationConfig::new().with_iterations(3).with_max_files(4);
        assert_eq!(small.queue_capacity(), 12);

        let large = GenerationConfig::new()
            .with_iterations(1000)
            .with_max_files(100);
        assert_eq!(large.queue_capacity(), MAX_QUEUE_CAPACITY);
    }

    #[test]
    fn test_parse_env_value() {
        let parsed: usize = parse_env_value(" 12 ", "KEY").unwrap();
        assert_eq!(parsed, 12);

        let err = parse_env_value::<usize>("twelve", "KEY").unwrap_err();
        assert!(err.to_string().contains("KEY"));
    }

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_reads_every_key() {
        let config = GenerationConfig::from_lookup(lookup_from(&[
            ("SHARDGEN_ITERATIONS", "5"),
            ("SHARDGEN_MAX_WORKERS", "3"),
            ("SHARDGEN_MAX_FILES", "7"),
            ("SHARDGEN_TIMEOUT_SECS", "0"),
            ("SHARDGEN_OUTPUT_DIR", "/tmp/env-shards"),
        ]))
        .unwrap();

        assert_eq!(config.iterations, 5);
        assert_eq!(config.max_workers, 3);
        assert_eq!(config.max_files, 7);
        assert_eq!(config.timeout, Duration::ZERO);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/env-shards"));
    }

    #[test]
    fn test_from_lookup_keeps_defaults_for_missing_keys() {
        let config =
            GenerationConfig::from_lookup(lookup_from(&[("SHARDGEN_MAX_FILES", "2")])).unwrap();

        assert_eq!(config.max_files, 2);
        assert_eq!(config.iterations, 1);
        assert_eq!(config.max_workers, 4);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_from_lookup_invalid_value() {
        let err =
            GenerationConfig::from_lookup(lookup_from(&[("SHARDGEN_MAX_WORKERS", "many")]))
                .unwrap_err();

        match err {
            ConfigError::InvalidValue { key, .. } => assert_eq!(key, "SHARDGEN_MAX_WORKERS"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_lookup_validates() {
        let err = GenerationConfig::from_lookup(lookup_from(&[("SHARDGEN_ITERATIONS", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationFailed(_)));
    }

    #[test]
    fn test_from_env() {
        // No other test touches SHARDGEN_TIMEOUT_SECS.
        std::env::set_var("SHARDGEN_TIMEOUT_SECS", "9");
        let config = GenerationConfig::from_env();
        std::env::remove_var("SHARDGEN_TIMEOUT_SECS");

        assert_eq!(config.unwrap().timeout, Duration::from_secs(9));
    }
}
