//! Test utilities and fixtures for cuhash.
//!
//! This module provides reusable key generators, proptest strategies, and a
//! filesystem fixture shared by the test modules.

use fnv::FnvHashSet;
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use std::path::PathBuf;
use tempfile::TempDir;

use crate::data_structures::cuckoo_table::{CuckooTableConfig, HashTable, KEY_EMPTY};

/// Odd multiplier spreading sequential integers over the key space.
const SCRAMBLE: u64 = 0x9e37_79b9_7f4a_7c15;

/// Create a temporary directory for test files.
pub fn create_test_dir() -> std::io::Result<TempDir> {
    tempfile::tempdir()
}

/// `n` distinct keys, none equal to `KEY_EMPTY`.
///
/// Multiplying by an odd constant is a bijection on `u64`, so distinct
/// inputs stay distinct.
pub fn scrambled_keys(n: usize) -> Vec<u64> {
    (1..=n as u64)
        .map(|k| k.wrapping_mul(SCRAMBLE))
        .filter(|&k| k != KEY_EMPTY)
        .collect()
}

/// Deduplicates `raw` in order and drops `KEY_EMPTY`.
pub fn distinct_keys(raw: Vec<u64>) -> Vec<u64> {
    let mut seen = FnvHashSet::default();
    raw.into_iter()
        .filter(|&k| k != KEY_EMPTY && seen.insert(k))
        .collect()
}

/// Strategy producing up to `max_len` distinct, non-reserved keys.
pub fn distinct_keys_strategy(max_len: usize) -> BoxedStrategy<Vec<u64>> {
    proptest::collection::vec(any::<u64>(), 0..max_len)
        .prop_map(distinct_keys)
        .boxed()
}

/// A table initialized for `max_input_size` keys with a fixed seed.
pub fn seeded_table(
    max_input_size: usize,
    space_usage: f32,
    num_hash_functions: usize,
) -> HashTable {
    let config = CuckooTableConfig::new()
        .with_max_input_size(max_input_size)
        .with_space_usage(space_usage)
        .with_hash_functions(num_hash_functions)
        .with_seed(0xc0ffee)
        .with_worker_threads(4);
    HashTable::with_config(&config).expect("valid test configuration")
}

/// Test fixture for tests that touch files or the environment.
pub struct TestFixture {
    /// Temporary directory for test files
    pub temp_dir: TempDir,
    /// Environment variables to clean up after the test
    env_vars: Vec<String>,
}

impl TestFixture {
    /// Create a new test fixture.
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            temp_dir: create_test_dir()?,
            env_vars: Vec::new(),
        })
    }

    /// Set an environment variable for this test.
    ///
    /// The variable is removed when the fixture is dropped.
    pub fn set_env<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        let key = key.into();
        std::env::set_var(&key, value.into());
        self.env_vars.push(key);
    }

    /// Write `contents` to `name` inside the fixture directory.
    pub fn create_file<C: AsRef<[u8]>>(&self, name: &str, contents: C) -> std::io::Result<PathBuf> {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, contents)?;
        Ok(path)
    }
}

impl Drop for TestFixture {
    fn drop(&mut self) {
        for key in &self.env_vars {
            std::env::remove_var(key);
        }
    }
}
