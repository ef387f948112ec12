// Copyright (c) 2025 cuhash Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Parallel cuckoo construction.
//!
//! Every input key gets its own worker. A worker writes its key into the key's
//! first candidate slot with an atomic swap and picks up whatever was there.
//! An evicted key moves on to its next candidate slot, skipping the one it was
//! just pushed out of, and the chain continues until it hits an empty slot or
//! runs out of iterations. Keys that run out go to the stash.
//!
//! While a build runs, slots hold the input index of their key rather than the
//! key itself. Indices fit in a 32-bit atomic, so take-and-evict is a single
//! `swap`; entries are only materialized once all workers have finished.

use std::sync::atomic::{AtomicU32, Ordering};

use rayon::prelude::*;
use tracing::trace;

use crate::data_structures::cuckoo_table::entry::{Entry, ENTRY_EMPTY, STASH_SIZE};
use crate::data_structures::cuckoo_table::error::{CuckooTableError, Result};
use crate::data_structures::cuckoo_table::hash::{
    dispatch_functions, FunctionSet, Functions, StashConstants,
};
use crate::data_structures::cuckoo_table::stash::StashManager;

/// Slot marker used during construction for "no key here".
pub(crate) const EMPTY_INDEX: u32 = u32::MAX;

/// Lower bound on the per-key iteration budget.
pub const MIN_ITERATIONS: u32 = 16;

/// Computes the eviction budget of one key.
///
/// Grows with the logarithm of the key count and with the load factor, and
/// shrinks as hash functions are added. The load-factor term is an empirical
/// fit, clamped so that load factors near one still yield a finite budget.
pub fn compute_max_iterations(num_keys: usize, table_size: usize, num_functions: usize) -> u32 {
    if num_keys == 0 || table_size == 0 {
        return MIN_ITERATIONS;
    }

    let lg_input_size = (num_keys as f64).log2().max(1.0);
    let load_factor = (num_keys as f64 / table_size as f64).min(1.0);
    let denominator = (0.028_255 + 1.159_477_2 * load_factor.ln()).min(-0.01);
    let base = (-lg_input_size / denominator).ceil();

    // Four functions get four times the base; fewer functions get more.
    let scale = 16.0 / num_functions.clamp(2, 5) as f64;
    let iterations = (base * scale).ceil() as u32;
    iterations.max(MIN_ITERATIONS)
}

/// Final state of a worker.
enum Placement {
    /// The chain ended in an empty slot after this many swaps.
    Placed { iterations: u32 },
    /// The budget ran out while holding the key at `index`.
    Homeless { index: u32, iterations: u32 },
}

/// Result of a successful construction attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOutcome {
    /// Keys resident in the stash
    pub stash_count: u32,
    /// Most swaps any single worker performed
    pub longest_chain: u32,
}

/// One construction attempt over a fixed function set.
#[derive(Debug)]
pub struct CuckooBuilder<'a> {
    table_size: usize,
    functions: &'a FunctionSet,
    stash_constants: StashConstants,
    max_iterations: u32,
}

impl<'a> CuckooBuilder<'a> {
    /// Prepares an attempt over `table_size` primary slots.
    pub fn new(
        table_size: usize,
        functions: &'a FunctionSet,
        stash_constants: StashConstants,
        max_iterations: u32,
    ) -> Self {
        Self {
            table_size,
            functions,
            stash_constants,
            max_iterations,
        }
    }

    /// Places every key, running one worker per key on the current rayon pool,
    /// and writes the final layout into `contents`: `table_size` primary slots
    /// followed by [`STASH_SIZE`] stash slots.
    ///
    /// Fails with [`CuckooTableError::PlacementFailed`] if any key found
    /// neither a table slot nor a free stash slot. `contents` is left
    /// untouched in that case.
    pub fn build(&self, keys: &[u64], values: &[u32], contents: &mut [Entry]) -> Result<BuildOutcome> {
        debug_assert_eq!(keys.len(), values.len());
        debug_assert_eq!(contents.len(), self.table_size + STASH_SIZE);

        let slots: Vec<AtomicU32> = (0..self.table_size)
            .into_par_iter()
            .map(|_| AtomicU32::new(EMPTY_INDEX))
            .collect();
        let stash = StashManager::new(self.stash_constants);
        let failures = AtomicU32::new(0);
        let longest_chain = AtomicU32::new(0);

        dispatch_functions!(self.functions, functions => {
            (0..keys.len()).into_par_iter().for_each(|start| {
                match self.place(functions, &slots, keys, start as u32) {
                    Placement::Placed { iterations } => {
                        longest_chain.fetch_max(iterations, Ordering::Relaxed);
                    }
                    Placement::Homeless { index, iterations } => {
                        longest_chain.fetch_max(iterations, Ordering::Relaxed);
                        if !stash.try_insert(keys[index as usize], index) {
                            failures.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            })
        });

        let failures = failures.into_inner();
        let stash_count = stash.count();
        if failures > 0 {
            return Err(CuckooTableError::PlacementFailed {
                failures,
                stash_count,
            });
        }

        let occupied = slots
            .par_iter()
            .filter(|slot| slot.load(Ordering::Relaxed) != EMPTY_INDEX)
            .count();
        if occupied + stash_count as usize != keys.len() {
            let missing = keys.len().saturating_sub(occupied + stash_count as usize);
            return Err(CuckooTableError::PlacementFailed {
                failures: missing as u32,
                stash_count,
            });
        }

        let (primary, stash_region) = contents.split_at_mut(self.table_size);
        primary
            .par_iter_mut()
            .zip(slots.par_iter())
            .for_each(|(entry, slot)| {
                let index = slot.load(Ordering::Relaxed);
                *entry = if index == EMPTY_INDEX {
                    ENTRY_EMPTY
                } else {
                    Entry::new(keys[index as usize], values[index as usize])
                };
            });
        stash.resolve(keys, values, stash_region);

        Ok(BuildOutcome {
            stash_count,
            longest_chain: longest_chain.into_inner(),
        })
    }

    /// Runs the eviction chain started by the key at input `start`.
    fn place<const N: usize>(
        &self,
        functions: &Functions<N>,
        slots: &[AtomicU32],
        keys: &[u64],
        start: u32,
    ) -> Placement {
        let mut index = start;
        let mut location = functions.slot(0, keys[index as usize], self.table_size);

        for iteration in 1..=self.max_iterations {
            let evicted = slots[location].swap(index, Ordering::AcqRel);
            if evicted == EMPTY_INDEX {
                return Placement::Placed { iterations: iteration };
            }
            index = evicted;
            location = next_location(functions, keys[index as usize], location, self.table_size);
        }

        trace!(index, location, "Eviction chain exhausted its budget");
        Placement::Homeless {
            index,
            iterations: self.max_iterations,
        }
    }
}

/// Picks the slot an evicted key moves to after leaving `previous`.
///
/// Cycles through the key's candidates in function order, starting after the
/// function that maps it to `previous` and skipping any candidate equal to
/// `previous`.
fn next_location<const N: usize>(
    functions: &Functions<N>,
    key: u64,
    previous: usize,
    table_size: usize,
) -> usize {
    let candidates = functions.slots(key, table_size);
    let current = candidates
        .iter()
        .position(|&slot| slot == previous)
        .unwrap_or(N - 1);
    (1..=N)
        .map(|step| candidates[(current + step) % N])
        .find(|&slot| slot != previous)
        .unwrap_or(previous)
}
