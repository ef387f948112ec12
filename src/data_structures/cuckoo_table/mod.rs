// Copyright (c) 2025 cuhash Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Bulk-built cuckoo hash table.
//!
//! A fixed-capacity table from 64-bit keys to 32-bit values, built all at
//! once from a batch of pairs and queried in batches. Construction runs one
//! worker per key; workers only ever meet through atomic swaps on individual
//! slots. Lookups examine at most `num_hash_functions + 1` slots no matter how
//! full the table is.
//!
//! # Features
//!
//! - Two to five hash functions per key, with a minimum space usage per count
//! - A 101-slot stash for keys whose eviction chains run out of budget
//! - Whole-build restarts with fresh hash constants, at most ten per build
//! - Pluggable [`CollisionOracle`] for the parallel duplicate checks
//! - Reproducible hash constants from a fixed seed
//!
//! # Example
//!
//! ```
//! use cuhash_lib::data_structures::cuckoo_table::{CuckooTableConfig, HashTable, NOT_FOUND};
//!
//! let config = CuckooTableConfig::new()
//!     .with_max_input_size(1_000)
//!     .with_space_usage(1.25)
//!     .with_hash_functions(4)
//!     .with_seed(42);
//! let mut table = HashTable::with_config(&config).unwrap();
//!
//! let keys: Vec<u64> = (0..1_000u64).map(|k| k.wrapping_mul(0x9e37_79b9_7f4a_7c15)).collect();
//! let values: Vec<u32> = (0..1_000).collect();
//! let stats = table.build(&keys, &values).unwrap();
//! assert!(stats.stash_count as usize <= cuhash_lib::data_structures::cuckoo_table::STASH_SIZE);
//!
//! let results = table.retrieve_vec(&keys).unwrap();
//! assert_eq!(results, values);
//! assert_eq!(table.get(3).unwrap(), None);
//! assert_eq!(table.retrieve_vec(&[3]).unwrap(), vec![NOT_FOUND]);
//! ```
//!
//! # Layout
//!
//! Storage is one contiguous buffer of `table_size + STASH_SIZE` entries. The
//! accessors on [`HashTable`] expose the buffer, the function set and the stash
//! constants, so a [`RetrievalEngine`] can be built over the same buffer
//! wherever it ends up living.

// Module declarations
mod builder;
mod config;
mod entry;
mod error;
mod generator;
mod hash;
mod retrieve;
mod stash;
mod table;

// Re-exports
pub use builder::{compute_max_iterations, BuildOutcome, CuckooBuilder, MIN_ITERATIONS};
pub use config::CuckooTableConfig;
pub use entry::{
    minimum_space_usage, Entry, ENTRY_EMPTY, ENTRY_NOT_FOUND, KEY_EMPTY, MAX_HASH_FUNCTIONS,
    MAX_RESTART_ATTEMPTS, MINIMUM_SPACE_USAGES, MIN_HASH_FUNCTIONS, NOT_FOUND, STASH_SIZE,
};
pub use error::{CuckooTableError, Result};
pub use generator::{CollisionOracle, ConstantGenerator, SortingOracle, MAX_GENERATE_ATTEMPTS};
#[cfg(test)]
pub(crate) use generator::MockCollisionOracle;
pub use hash::{stash_slot, FunctionSet, Functions, HashConstants, StashConstants, PRIME_DIVISOR};
pub use retrieve::{Lookup, RetrievalEngine};
pub use stash::StashManager;
pub use table::{BuildStats, BulkTable, HashTable};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() {
        let mut table = HashTable::new().with_seed(11);
        table.initialize(16, 1.25, 4).unwrap();

        table.build(&[10, 20, 30], &[1, 2, 3]).unwrap();
        assert_eq!(table.retrieve_vec(&[30, 10, 20]).unwrap(), vec![3, 1, 2]);
        assert_eq!(table.retrieve_vec(&[40]).unwrap(), vec![NOT_FOUND]);
    }

    #[test]
    fn test_external_engine_over_accessors() {
        let mut table = HashTable::new().with_seed(12);
        table.initialize(64, 1.5, 3).unwrap();
        let keys: Vec<u64> = (100..164).collect();
        let values: Vec<u32> = (0..64).collect();
        table.build(&keys, &values).unwrap();

        // Rebuild the lookup path from the raw parts, as an embedding structure would.
        let contents = table.contents().to_vec();
        let functions = *table.function_set().unwrap();
        let engine = RetrievalEngine::new(
            &contents,
            table.table_size(),
            &functions,
            table.stash_constants(),
            table.stash_count(),
        );
        for (key, value) in keys.iter().zip(values.iter()) {
            assert_eq!(engine.retrieve_one(*key), *value);
        }
    }

    #[test]
    fn test_custom_configuration() {
        let config = CuckooTableConfig::new()
            .with_max_input_size(500)
            .with_space_usage(1.25)
            .with_hash_functions(5)
            .with_seed(5);
        let mut table = HashTable::with_config(&config).unwrap();
        assert_eq!(table.table_size(), 625);

        let keys: Vec<u64> = (1..=500u64).map(|k| k.wrapping_mul(0xd6e8_feb8_6659_fd93)).collect();
        let values: Vec<u32> = (0..500).collect();
        table.build(&keys, &values).unwrap();
        assert_eq!(table.retrieve_vec(&keys).unwrap(), values);
    }
}
