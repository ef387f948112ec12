//! Synthetic workload configuration.
//!
//! Describes the batch of keys the driver builds and the batch of queries it
//! runs against the finished table.

use super::{ConfigResult, Validate};
use crate::error::config::ConfigError;
use serde::{Deserialize, Serialize};

/// Workload configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkloadConfig {
    /// Number of distinct keys inserted
    pub num_keys: usize,

    /// Number of queries issued after the build
    pub num_queries: usize,

    /// Share of queries asking for keys that were never inserted, in `[0, 1]`
    pub absent_fraction: f64,

    /// Seed for key, value, and query generation
    pub seed: u64,

    /// Whether to check every retrieved value against the expected one
    pub verify: bool,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            num_keys: 1_000_000,
            num_queries: 1_000_000,
            absent_fraction: 0.5,
            seed: 0x5eed,
            verify: true,
        }
    }
}

impl Validate for WorkloadConfig {
    fn validate(&self) -> ConfigResult<()> {
        if !(0.0..=1.0).contains(&self.absent_fraction) {
            return Err(ConfigError::ValueOutOfRange {
                key: "workload.absent_fraction".to_string(),
                message: format!("{} is not within [0, 1]", self.absent_fraction),
            });
        }

        if self.num_keys > u32::MAX as usize {
            return Err(ConfigError::ValueOutOfRange {
                key: "workload.num_keys".to_string(),
                message: format!("{} exceeds the 32-bit index range", self.num_keys),
            });
        }

        if self.num_keys == 0 && self.absent_fraction < 1.0 && self.num_queries > 0 {
            return Err(ConfigError::ValidationError(
                "Queries for present keys need at least one key".to_string(),
            ));
        }

        Ok(())
    }
}
