// Copyright (c) 2025 cuhash Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Configuration options for the cuckoo hash table.

use serde::{Deserialize, Serialize};

use crate::data_structures::cuckoo_table::entry::{
    minimum_space_usage, MAX_HASH_FUNCTIONS, MIN_HASH_FUNCTIONS,
};
use crate::data_structures::cuckoo_table::error::{CuckooTableError, Result};

/// Configuration for the cuckoo hash table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CuckooTableConfig {
    /// Largest number of keys a single build may supply.
    pub max_input_size: usize,

    /// Ratio of primary table slots to `max_input_size`.
    /// Must be at least the minimum for the chosen function count.
    pub space_usage: f32,

    /// Number of hash functions, between 2 and 5.
    /// More functions allow fuller tables but cost more probes per lookup.
    pub num_hash_functions: usize,

    /// Seed for hash constant generation. `None` seeds from system entropy.
    pub seed: Option<u64>,

    /// Number of worker threads. `None` uses one per logical CPU.
    pub worker_threads: Option<usize>,
}

impl CuckooTableConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the largest number of keys a build may supply.
    pub fn with_max_input_size(mut self, max_input_size: usize) -> Self {
        self.max_input_size = max_input_size;
        self
    }

    /// Sets the ratio of table slots to input keys.
    pub fn with_space_usage(mut self, space_usage: f32) -> Self {
        self.space_usage = space_usage;
        self
    }

    /// Sets the number of hash functions.
    pub fn with_hash_functions(mut self, num_hash_functions: usize) -> Self {
        self.num_hash_functions = num_hash_functions;
        self
    }

    /// Fixes the seed used for hash constant generation.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the number of worker threads.
    pub fn with_worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = Some(worker_threads);
        self
    }

    /// Checks the function count, space usage and resulting table size.
    pub fn validate(&self) -> Result<()> {
        let minimum = minimum_space_usage(self.num_hash_functions).ok_or_else(|| {
            CuckooTableError::InvalidConfiguration(format!(
                "number of hash functions must be between {MIN_HASH_FUNCTIONS} and {MAX_HASH_FUNCTIONS}, got {}",
                self.num_hash_functions
            ))
        })?;

        if !self.space_usage.is_finite() || self.space_usage < minimum {
            return Err(CuckooTableError::InvalidConfiguration(format!(
                "space usage {} is below the minimum of {minimum} for {} hash functions",
                self.space_usage, self.num_hash_functions
            )));
        }

        // Slot indices are 32-bit, with u32::MAX reserved.
        if self.max_input_size >= u32::MAX as usize || self.table_size() >= u32::MAX as usize {
            return Err(CuckooTableError::InvalidConfiguration(format!(
                "table of {} slots for {} keys exceeds the 32-bit index range",
                self.table_size(),
                self.max_input_size
            )));
        }

        if self.worker_threads == Some(0) {
            return Err(CuckooTableError::InvalidConfiguration(
                "worker_threads must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Number of primary slots: `max_input_size * space_usage`, rounded up, at least one.
    pub fn table_size(&self) -> usize {
        let slots = (self.max_input_size as f64 * f64::from(self.space_usage)).ceil();
        (slots as usize).max(1)
    }

    /// Worker thread count after applying the default.
    pub fn effective_worker_threads(&self) -> usize {
        self.worker_threads.unwrap_or_else(num_cpus::get)
    }
}

impl Default for CuckooTableConfig {
    fn default() -> Self {
        Self {
            max_input_size: 1_000_000,
            space_usage: 1.25,
            num_hash_functions: 4,
            seed: None,
            worker_threads: None,
        }
    }
}
