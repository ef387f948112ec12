//! Synthetic workloads for exercising a table end to end.
//!
//! A [`Workload`] is a batch of distinct keys with values, plus a batch of
//! queries mixing inserted keys with keys that were never inserted. [`run`]
//! builds a table from the batch, answers the queries, and reports timings.

use std::fmt::{Display, Formatter};
use std::time::Instant;

use fnv::FnvHashSet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, info_span};

use crate::config::{CuHashConfig, WorkloadConfig};
use crate::data_structures::cuckoo_table::{BuildStats, HashTable, KEY_EMPTY, NOT_FOUND};
use crate::error::{CuHashError, CuHashResult};

/// A generated batch of keys, values and queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workload {
    /// Distinct keys, none equal to `KEY_EMPTY`
    pub keys: Vec<u64>,
    /// Value of each key: its position in `keys`
    pub values: Vec<u32>,
    /// Query keys
    pub queries: Vec<u64>,
    /// Expected answer per query
    pub expected: Vec<u32>,
}

impl Workload {
    /// Generates a workload deterministically from `config.seed`.
    pub fn generate(config: &WorkloadConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut seen = FnvHashSet::with_capacity_and_hasher(config.num_keys, Default::default());

        let mut keys = Vec::with_capacity(config.num_keys);
        while keys.len() < config.num_keys {
            let key: u64 = rng.gen();
            if key != KEY_EMPTY && seen.insert(key) {
                keys.push(key);
            }
        }
        // Indices stay below NOT_FOUND since num_keys fits the 32-bit range.
        let values: Vec<u32> = (0..keys.len() as u32).collect();

        let mut queries = Vec::with_capacity(config.num_queries);
        let mut expected = Vec::with_capacity(config.num_queries);
        for _ in 0..config.num_queries {
            if keys.is_empty() || rng.gen_bool(config.absent_fraction) {
                let absent = loop {
                    let key: u64 = rng.gen();
                    if key != KEY_EMPTY && !seen.contains(&key) {
                        break key;
                    }
                };
                queries.push(absent);
                expected.push(NOT_FOUND);
            } else {
                let index = rng.gen_range(0..keys.len());
                queries.push(keys[index]);
                expected.push(values[index]);
            }
        }

        debug!(
            keys = keys.len(),
            queries = queries.len(),
            "Generated workload"
        );
        Self {
            keys,
            values,
            queries,
            expected,
        }
    }
}

/// Outcome of one build-and-query run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Crate version that produced the report
    pub version: String,
    /// Statistics of the successful build
    pub build: BuildStats,
    /// Wall-clock build time in milliseconds
    pub build_millis: f64,
    /// Wall-clock retrieval time in milliseconds
    pub retrieve_millis: f64,
    /// Number of queries answered
    pub queries: usize,
    /// Queries that found a value
    pub hits: usize,
    /// Queries answered with the wrong value, when verification ran
    pub mismatches: Option<usize>,
}

impl RunReport {
    /// Keys placed per second during the build.
    pub fn build_rate(&self) -> f64 {
        rate(self.build.input_size, self.build_millis)
    }

    /// Queries answered per second.
    pub fn retrieve_rate(&self) -> f64 {
        rate(self.queries, self.retrieve_millis)
    }
}

fn rate(count: usize, millis: f64) -> f64 {
    if millis > 0.0 {
        count as f64 / (millis / 1_000.0)
    } else {
        0.0
    }
}

impl Display for RunReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "cuhash {}", self.version)?;
        writeln!(
            f,
            "build:    {} keys into {} slots with {} functions",
            self.build.input_size, self.build.table_size, self.build.num_hash_functions
        )?;
        writeln!(
            f,
            "          {} attempt(s), {} stashed, longest chain {} of {}",
            self.build.attempts,
            self.build.stash_count,
            self.build.longest_chain,
            self.build.max_iterations
        )?;
        writeln!(
            f,
            "          {:.3} ms ({:.0} keys/s)",
            self.build_millis,
            self.build_rate()
        )?;
        writeln!(
            f,
            "retrieve: {} queries, {} hits, {:.3} ms ({:.0} queries/s)",
            self.queries,
            self.hits,
            self.retrieve_millis,
            self.retrieve_rate()
        )?;
        match self.mismatches {
            Some(mismatches) => write!(f, "verify:   {mismatches} mismatches"),
            None => write!(f, "verify:   skipped"),
        }
    }
}

/// Builds a table from a generated workload and answers its queries.
///
/// # Errors
///
/// Fails if the table cannot be initialized or built, or if verification is
/// enabled and any query returns the wrong value.
pub fn run(config: &CuHashConfig) -> CuHashResult<RunReport> {
    let span = info_span!("run", keys = config.workload.num_keys);
    let _guard = span.enter();

    let mut table = HashTable::with_config(&config.table)?;
    let workload = Workload::generate(&config.workload);

    let start = Instant::now();
    let build = table.build(&workload.keys, &workload.values)?;
    let build_millis = start.elapsed().as_secs_f64() * 1_000.0;

    let mut results = vec![NOT_FOUND; workload.queries.len()];
    let start = Instant::now();
    table.retrieve(&workload.queries, &mut results)?;
    let retrieve_millis = start.elapsed().as_secs_f64() * 1_000.0;

    let hits = results.par_iter().filter(|&&v| v != NOT_FOUND).count();
    let mismatches = config.workload.verify.then(|| {
        results
            .par_iter()
            .zip(workload.expected.par_iter())
            .filter(|(got, want)| got != want)
            .count()
    });

    let report = RunReport {
        version: crate::VERSION.to_string(),
        build,
        build_millis,
        retrieve_millis,
        queries: workload.queries.len(),
        hits,
        mismatches,
    };
    info!(
        build_millis = report.build_millis,
        retrieve_millis = report.retrieve_millis,
        hits = report.hits,
        "Run complete"
    );

    match report.mismatches {
        Some(mismatches) if mismatches > 0 => Err(CuHashError::Custom(format!(
            "{mismatches} of {} queries returned the wrong value",
            report.queries
        ))),
        _ => Ok(report),
    }
}
