// Copyright (c) 2025 cuhash Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! The hash table façade.
//!
//! [`HashTable`] owns the table storage and the worker pool, runs the build
//! retry loop and hands lookups to a [`RetrievalEngine`] over the state of the
//! last successful build.

use std::sync::Arc;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::data_structures::cuckoo_table::builder::{compute_max_iterations, CuckooBuilder};
use crate::data_structures::cuckoo_table::config::CuckooTableConfig;
use crate::data_structures::cuckoo_table::entry::{
    Entry, ENTRY_EMPTY, KEY_EMPTY, MAX_RESTART_ATTEMPTS, STASH_SIZE,
};
use crate::data_structures::cuckoo_table::error::{CuckooTableError, Result};
use crate::data_structures::cuckoo_table::generator::{
    CollisionOracle, ConstantGenerator, SortingOracle,
};
use crate::data_structures::cuckoo_table::hash::{FunctionSet, Functions, StashConstants};
use crate::data_structures::cuckoo_table::retrieve::{Lookup, RetrievalEngine};

/// Bulk build and bulk lookup over a fixed-capacity table.
pub trait BulkTable {
    /// Sizes and allocates the table.
    fn initialize(&mut self, max_input_size: usize, space_usage: f32, num_functions: usize)
        -> Result<()>;

    /// Replaces the table contents with `keys` mapped to `values`.
    fn build(&mut self, keys: &[u64], values: &[u32]) -> Result<BuildStats>;

    /// Writes the value of each query key, or `NOT_FOUND`, into `results`.
    fn retrieve(&self, queries: &[u64], results: &mut [u32]) -> Result<()>;

    /// Frees all storage. Safe to call more than once.
    fn release(&mut self);
}

/// Summary of a successful build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    /// Number of keys built
    pub input_size: usize,
    /// Attempts used, including the successful one
    pub attempts: u32,
    /// Keys resident in the stash
    pub stash_count: u32,
    /// Per-key eviction budget
    pub max_iterations: u32,
    /// Most swaps any single key's chain needed
    pub longest_chain: u32,
    /// Primary slots in the table
    pub table_size: usize,
    /// Hash functions in use
    pub num_hash_functions: usize,
}

/// A cuckoo hash table mapping 64-bit keys to 32-bit values.
///
/// # Examples
///
/// ```
/// use cuhash_lib::data_structures::cuckoo_table::{HashTable, NOT_FOUND};
///
/// let mut table = HashTable::new().with_seed(7);
/// table.initialize(1_000, 1.25, 4).unwrap();
///
/// let keys: Vec<u64> = (0..1_000).map(|k| k * 31 + 5).collect();
/// let values: Vec<u32> = (0..1_000).collect();
/// table.build(&keys, &values).unwrap();
///
/// assert_eq!(table.retrieve_vec(&keys).unwrap(), values);
/// assert_eq!(table.retrieve_vec(&[2]).unwrap(), vec![NOT_FOUND]);
/// ```
pub struct HashTable {
    oracle: Arc<dyn CollisionOracle>,
    seed: Option<u64>,
    worker_threads: Option<usize>,
    pool: Option<ThreadPool>,
    generator: Option<ConstantGenerator>,
    max_input_size: usize,
    table_size: usize,
    num_hash_functions: usize,
    functions: Option<FunctionSet>,
    stash_constants: StashConstants,
    stash_count: u32,
    contents: Vec<Entry>,
    last_build: Option<BuildStats>,
}

impl std::fmt::Debug for HashTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashTable")
            .field("max_input_size", &self.max_input_size)
            .field("table_size", &self.table_size)
            .field("num_hash_functions", &self.num_hash_functions)
            .field("functions", &self.functions)
            .field("stash_constants", &self.stash_constants)
            .field("stash_count", &self.stash_count)
            .field("built", &self.is_built())
            .finish_non_exhaustive()
    }
}

impl Default for HashTable {
    fn default() -> Self {
        Self::new()
    }
}

impl HashTable {
    /// Creates an uninitialized table using the default [`SortingOracle`].
    pub fn new() -> Self {
        Self::with_oracle(Arc::new(SortingOracle))
    }

    /// Creates an uninitialized table that validates through `oracle`.
    pub fn with_oracle(oracle: Arc<dyn CollisionOracle>) -> Self {
        Self {
            oracle,
            seed: None,
            worker_threads: None,
            pool: None,
            generator: None,
            max_input_size: 0,
            table_size: 0,
            num_hash_functions: 0,
            functions: None,
            stash_constants: StashConstants::default(),
            stash_count: 0,
            contents: Vec::new(),
            last_build: None,
        }
    }

    /// Creates and initializes a table from `config`.
    pub fn with_config(config: &CuckooTableConfig) -> Result<Self> {
        let mut table = Self::new();
        table.initialize_with(config)?;
        Ok(table)
    }

    /// Fixes the seed used by later calls to [`HashTable::initialize`].
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Fixes the worker count used by later calls to [`HashTable::initialize`].
    pub fn with_worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = Some(worker_threads);
        self
    }

    /// Sizes the table for up to `max_input_size` keys and allocates storage.
    ///
    /// Fails if `num_functions` is outside `2..=5` or `space_usage` is below
    /// the minimum for that many functions. Nothing is allocated on failure.
    pub fn initialize(
        &mut self,
        max_input_size: usize,
        space_usage: f32,
        num_functions: usize,
    ) -> Result<()> {
        let config = CuckooTableConfig {
            max_input_size,
            space_usage,
            num_hash_functions: num_functions,
            seed: self.seed,
            worker_threads: self.worker_threads,
        };
        self.initialize_with(&config)
    }

    /// Sizes the table according to `config` and allocates storage.
    pub fn initialize_with(&mut self, config: &CuckooTableConfig) -> Result<()> {
        config.validate()?;
        self.release();

        let threads = config.effective_worker_threads();
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("cuhash-worker-{index}"))
            .build()
            .map_err(|e| CuckooTableError::WorkerPool(e.to_string()))?;

        self.seed = config.seed;
        self.worker_threads = config.worker_threads;
        self.max_input_size = config.max_input_size;
        self.table_size = config.table_size();
        self.num_hash_functions = config.num_hash_functions;
        self.contents = vec![ENTRY_EMPTY; self.table_size + STASH_SIZE];
        self.generator = Some(ConstantGenerator::new(Arc::clone(&self.oracle), config.seed));
        self.pool = Some(pool);

        debug!(
            max_input_size = self.max_input_size,
            table_size = self.table_size,
            num_hash_functions = self.num_hash_functions,
            threads,
            "Hash table initialized"
        );
        Ok(())
    }

    /// Builds the table from `keys[i] -> values[i]`, discarding any previous contents.
    ///
    /// Each attempt draws fresh hash constants. After
    /// [`MAX_RESTART_ATTEMPTS`] failed attempts the build fails and the table
    /// stays empty until the next successful build.
    pub fn build(&mut self, keys: &[u64], values: &[u32]) -> Result<BuildStats> {
        let (Some(pool), Some(generator)) = (self.pool.as_ref(), self.generator.as_mut()) else {
            return Err(CuckooTableError::NotInitialized);
        };

        // Whatever happens below, the previous generation is gone.
        self.functions = None;
        self.stash_count = 0;
        self.last_build = None;

        if keys.len() != values.len() {
            return Err(CuckooTableError::LengthMismatch {
                keys: keys.len(),
                values: values.len(),
            });
        }
        if keys.len() > self.max_input_size {
            return Err(CuckooTableError::InputTooLarge {
                input_size: keys.len(),
                max_input_size: self.max_input_size,
            });
        }

        let table_size = self.table_size;
        let num_functions = self.num_hash_functions;
        let contents = &mut self.contents;
        let oracle = &self.oracle;
        let max_iterations = compute_max_iterations(keys.len(), table_size, num_functions);

        let result = pool.install(|| {
            if keys.par_iter().any(|&key| key == KEY_EMPTY) {
                return Err(CuckooTableError::ReservedKey(KEY_EMPTY));
            }
            if oracle.max_multiplicity(keys.to_vec()) > 1 {
                return Err(CuckooTableError::DuplicateKeys);
            }

            for attempt in 1..=MAX_RESTART_ATTEMPTS {
                debug!(attempt, max_iterations, "Starting build attempt");
                let functions = generator.generate(num_functions, keys, table_size)?;
                let stash_constants = generator.generate_stash_constants();
                let builder =
                    CuckooBuilder::new(table_size, &functions, stash_constants, max_iterations);

                match builder.build(keys, values, contents) {
                    Ok(outcome) => return Ok((attempt, functions, stash_constants, outcome)),
                    Err(CuckooTableError::PlacementFailed {
                        failures,
                        stash_count,
                    }) => {
                        warn!(
                            attempt,
                            failures, stash_count, "Build attempt failed, drawing new hash functions"
                        );
                    }
                    Err(e) => return Err(e),
                }
            }

            Err(CuckooTableError::BuildFailed {
                attempts: MAX_RESTART_ATTEMPTS,
            })
        });

        match result {
            Ok((attempts, functions, stash_constants, outcome)) => {
                let stats = BuildStats {
                    input_size: keys.len(),
                    attempts,
                    stash_count: outcome.stash_count,
                    max_iterations,
                    longest_chain: outcome.longest_chain,
                    table_size,
                    num_hash_functions: num_functions,
                };
                self.functions = Some(functions);
                self.stash_constants = stash_constants;
                self.stash_count = outcome.stash_count;
                self.last_build = Some(stats);
                info!(
                    input_size = stats.input_size,
                    attempts,
                    stash_count = stats.stash_count,
                    longest_chain = stats.longest_chain,
                    "Hash table built"
                );
                Ok(stats)
            }
            Err(e) => {
                if matches!(e, CuckooTableError::BuildFailed { .. }) {
                    error!(input_size = keys.len(), table_size, error = %e, "Hash table build failed");
                }
                self.contents.fill(ENTRY_EMPTY);
                Err(e)
            }
        }
    }

    /// Looks up every query key in parallel, writing values or `NOT_FOUND` into `results`.
    pub fn retrieve(&self, queries: &[u64], results: &mut [u32]) -> Result<()> {
        if queries.len() != results.len() {
            return Err(CuckooTableError::ResultLengthMismatch {
                queries: queries.len(),
                results: results.len(),
            });
        }
        let engine = self.engine()?;
        match &self.pool {
            Some(pool) => pool.install(|| engine.retrieve(queries, results)),
            None => engine.retrieve(queries, results),
        }
        Ok(())
    }

    /// Like [`HashTable::retrieve`], allocating the result buffer.
    pub fn retrieve_vec(&self, queries: &[u64]) -> Result<Vec<u32>> {
        let mut results = vec![0u32; queries.len()];
        self.retrieve(queries, &mut results)?;
        Ok(results)
    }

    /// Value stored for `key`, distinguishing a stored `NOT_FOUND` from a miss.
    pub fn get(&self, key: u64) -> Result<Option<u32>> {
        Ok(self.engine()?.lookup(key).value)
    }

    /// Looks up `key` and reports the number of slots examined.
    pub fn lookup(&self, key: u64) -> Result<Lookup> {
        Ok(self.engine()?.lookup(key))
    }

    /// A retrieval view over the last successful build.
    pub fn engine(&self) -> Result<RetrievalEngine<'_>> {
        let functions = self.functions.as_ref().ok_or(CuckooTableError::NotBuilt)?;
        Ok(RetrievalEngine::new(
            &self.contents,
            self.table_size,
            functions,
            self.stash_constants,
            self.stash_count,
        ))
    }

    /// Frees all storage and forgets the last build.
    pub fn release(&mut self) {
        self.contents = Vec::new();
        self.functions = None;
        self.generator = None;
        self.pool = None;
        self.stash_count = 0;
        self.stash_constants = StashConstants::default();
        self.table_size = 0;
        self.max_input_size = 0;
        self.num_hash_functions = 0;
        self.last_build = None;
    }

    /// Whether a build has succeeded since the last initialize or failed build.
    pub fn is_built(&self) -> bool {
        self.functions.is_some()
    }

    /// Largest input accepted by [`HashTable::build`].
    pub fn max_input_size(&self) -> usize {
        self.max_input_size
    }

    /// Number of primary slots.
    pub fn table_size(&self) -> usize {
        self.table_size
    }

    /// Number of keys resident in the stash.
    pub fn stash_count(&self) -> u32 {
        self.stash_count
    }

    /// Constants of the stash hash function.
    pub fn stash_constants(&self) -> StashConstants {
        self.stash_constants
    }

    /// Raw storage: `table_size` primary slots followed by the stash.
    pub fn contents(&self) -> &[Entry] {
        &self.contents
    }

    /// Number of hash functions configured.
    pub fn num_hash_functions(&self) -> usize {
        self.num_hash_functions
    }

    /// Hash functions of the last successful build.
    pub fn function_set(&self) -> Option<&FunctionSet> {
        self.functions.as_ref()
    }

    /// Two-function constants, if the table was built with two functions.
    pub fn constants_2(&self) -> Option<Functions<2>> {
        self.functions.as_ref().and_then(FunctionSet::as_two).copied()
    }

    /// Three-function constants, if the table was built with three functions.
    pub fn constants_3(&self) -> Option<Functions<3>> {
        self.functions.as_ref().and_then(FunctionSet::as_three).copied()
    }

    /// Four-function constants, if the table was built with four functions.
    pub fn constants_4(&self) -> Option<Functions<4>> {
        self.functions.as_ref().and_then(FunctionSet::as_four).copied()
    }

    /// Five-function constants, if the table was built with five functions.
    pub fn constants_5(&self) -> Option<Functions<5>> {
        self.functions.as_ref().and_then(FunctionSet::as_five).copied()
    }

    /// Statistics of the last successful build.
    pub fn last_build(&self) -> Option<&BuildStats> {
        self.last_build.as_ref()
    }
}

impl BulkTable for HashTable {
    fn initialize(
        &mut self,
        max_input_size: usize,
        space_usage: f32,
        num_functions: usize,
    ) -> Result<()> {
        HashTable::initialize(self, max_input_size, space_usage, num_functions)
    }

    fn build(&mut self, keys: &[u64], values: &[u32]) -> Result<BuildStats> {
        HashTable::build(self, keys, values)
    }

    fn retrieve(&self, queries: &[u64], results: &mut [u32]) -> Result<()> {
        HashTable::retrieve(self, queries, results)
    }

    fn release(&mut self) {
        HashTable::release(self)
    }
}

impl Drop for HashTable {
    fn drop(&mut self) {
        self.release();
    }
}
