//! Configuration module for cuhash.
//!
//! This module provides the configuration system for the command-line driver.
//! Settings are loaded from files (TOML, YAML, JSON) and overridden with
//! environment variables. All configuration values are validated for
//! correctness before use.

use std::path::{Path, PathBuf};

use crate::data_structures::cuckoo_table::CuckooTableConfig;
use crate::error::config::ConfigError;
use config::{Config, ConfigError as ExternalConfigError, Environment, File};
use serde::{Deserialize, Serialize};

pub mod table;
pub mod workload;

pub use workload::WorkloadConfig;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Default environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "CUHASH";

/// A trait for types that can be validated.
pub trait Validate {
    /// Validates that the configuration is correct.
    ///
    /// # Returns
    ///
    /// * `Ok(())` if the configuration is valid
    /// * `Err(ConfigError)` if the configuration is invalid
    fn validate(&self) -> ConfigResult<()>;
}

/// Main configuration for cuhash.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct CuHashConfig {
    /// Hash table configuration
    pub table: CuckooTableConfig,

    /// Synthetic workload configuration
    pub workload: WorkloadConfig,

    /// Log configuration
    pub log: LogConfig,
}

impl Validate for CuHashConfig {
    fn validate(&self) -> ConfigResult<()> {
        Validate::validate(&self.table)?;
        self.workload.validate()?;
        self.log.validate()?;

        if self.workload.num_keys > self.table.max_input_size {
            return Err(ConfigError::ValueOutOfRange {
                key: "workload.num_keys".to_string(),
                message: format!(
                    "{} keys do not fit a table sized for {}",
                    self.workload.num_keys, self.table.max_input_size
                ),
            });
        }

        Ok(())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Whether to log in JSON format
    pub json: bool,

    /// Whether to include source code locations in logs
    pub source_location: bool,

    /// Whether to include thread names in logs
    pub thread_names: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            source_location: false,
            thread_names: false,
        }
    }
}

impl Validate for LogConfig {
    fn validate(&self) -> ConfigResult<()> {
        match self.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            _ => Err(ConfigError::ValidationError(format!(
                "Invalid log level: {}",
                self.level
            ))),
        }
    }
}

/// Configuration loader for cuhash.
#[derive(Debug)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    env_prefix: String,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Optional path to the configuration file
    /// * `env_prefix` - Prefix for environment variables that override configuration values
    pub fn new<P: AsRef<Path>>(config_path: Option<P>, env_prefix: &str) -> Self {
        Self {
            config_path: config_path.map(|p| p.as_ref().to_path_buf()),
            env_prefix: env_prefix.to_string(),
        }
    }

    /// Loads the configuration from defaults, an optional file, and
    /// environment variables, in increasing order of precedence.
    ///
    /// # Returns
    ///
    /// * `Ok(CuHashConfig)` if the configuration was loaded and validated
    /// * `Err(ConfigError)` if there was an error loading the configuration
    pub fn load(&self) -> ConfigResult<CuHashConfig> {
        let mut builder = Config::builder().add_source(
            Config::try_from(&CuHashConfig::default())
                .map_err(|e| ConfigError::ParseError(e.to_string()))?,
        );

        if let Some(path) = &self.config_path {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }

            let format = match path.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => config::FileFormat::Toml,
                Some("json") => config::FileFormat::Json,
                Some("yaml" | "yml") => config::FileFormat::Yaml,
                _ => {
                    return Err(ConfigError::ParseError(format!(
                        "Unsupported file extension for: {path:?}"
                    )))
                }
            };
            builder = builder.add_source(File::from(path.as_path()).format(format));
        }

        builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(|e| match e {
            ExternalConfigError::NotFound(path) => ConfigError::FileNotFound(PathBuf::from(path)),
            ExternalConfigError::Message(msg) => ConfigError::ParseError(msg),
            other => ConfigError::ParseError(other.to_string()),
        })?;

        let cuhash_config: CuHashConfig = config
            .try_deserialize()
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        cuhash_config.validate()?;
        tracing::debug!(?cuhash_config, "Configuration loaded");

        Ok(cuhash_config)
    }
}
