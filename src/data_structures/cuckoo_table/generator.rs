// Copyright (c) 2025 cuhash Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Random hash constant generation.
//!
//! Constants are drawn from a seeded `StdRng`, so successive build attempts
//! always explore different placements. Before a function set is handed to the
//! builder, a [`CollisionOracle`] checks that no group of more than `N` keys
//! shares the exact same candidate slots, which would leave the primary table
//! unable to hold all of them.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::data_structures::cuckoo_table::entry::{MAX_HASH_FUNCTIONS, MIN_HASH_FUNCTIONS};
use crate::data_structures::cuckoo_table::error::{CuckooTableError, Result};
use crate::data_structures::cuckoo_table::hash::{
    FunctionSet, Functions, HashConstants, StashConstants, PRIME_DIVISOR,
};

/// Number of function sets drawn per build attempt before the oracle is overruled.
pub const MAX_GENERATE_ATTEMPTS: u32 = 16;

/// Answers "how often does the most common value occur" over a batch of values.
///
/// This is the only parallel primitive the table needs from the outside. It is
/// used both to detect duplicate input keys and to reject function sets that
/// map too many keys onto identical candidate slots.
#[cfg_attr(test, mockall::automock)]
pub trait CollisionOracle: Send + Sync {
    /// Returns the number of occurrences of the most frequent value in `items`,
    /// or zero for an empty batch.
    fn max_multiplicity(&self, items: Vec<u64>) -> usize;
}

/// Default oracle: parallel unstable sort followed by a run-length scan.
#[derive(Debug, Default, Clone, Copy)]
pub struct SortingOracle;

impl CollisionOracle for SortingOracle {
    fn max_multiplicity(&self, mut items: Vec<u64>) -> usize {
        if items.is_empty() {
            return 0;
        }
        items.par_sort_unstable();

        let mut longest = 1;
        let mut run = 1;
        for pair in items.windows(2) {
            if pair[0] == pair[1] {
                run += 1;
                longest = longest.max(run);
            } else {
                run = 1;
            }
        }
        longest
    }
}

/// Folds the candidate slots of one key into an order-independent signature.
fn slot_signature<const N: usize>(functions: &Functions<N>, key: u64, table_size: usize) -> u64 {
    let mut slots = functions.slots(key, table_size);
    slots.sort_unstable();
    if N == 2 {
        // Slots fit in 32 bits, so two of them pack exactly.
        return ((slots[0] as u64) << 32) | slots[1] as u64;
    }
    slots.iter().fold(0xcbf2_9ce4_8422_2325_u64, |acc, &slot| {
        (acc ^ slot as u64).wrapping_mul(0x0000_0100_0000_01b3).rotate_left(17)
    })
}

/// Produces random function sets and stash constants.
pub struct ConstantGenerator {
    rng: StdRng,
    oracle: Arc<dyn CollisionOracle>,
}

impl std::fmt::Debug for ConstantGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstantGenerator").finish_non_exhaustive()
    }
}

impl ConstantGenerator {
    /// Creates a generator. A `seed` makes every draw reproducible; without one
    /// the generator seeds itself from system entropy.
    pub fn new(oracle: Arc<dyn CollisionOracle>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng, oracle }
    }

    /// The oracle this generator validates with.
    pub fn oracle(&self) -> &Arc<dyn CollisionOracle> {
        &self.oracle
    }

    /// Draws one constant pair with a nonzero `a`, both below the prime divisor.
    fn draw(&mut self) -> HashConstants {
        let limit = PRIME_DIVISOR as u32;
        HashConstants::new(self.rng.gen_range(1..limit), self.rng.gen_range(0..limit))
    }

    fn draw_functions<const N: usize>(&mut self) -> Functions<N> {
        let mut constants = [HashConstants::default(); N];
        for pair in constants.iter_mut() {
            *pair = self.draw();
        }
        Functions::new(constants)
    }

    /// Draws the constants of the stash hash function.
    pub fn generate_stash_constants(&mut self) -> StashConstants {
        self.draw()
    }

    /// Draws a set of `num_functions` hash functions for `keys` over a table of
    /// `table_size` slots.
    ///
    /// Sets that the oracle rejects are redrawn up to [`MAX_GENERATE_ATTEMPTS`]
    /// times; after that the last draw is returned and the builder's own
    /// retry loop takes over.
    pub fn generate(
        &mut self,
        num_functions: usize,
        keys: &[u64],
        table_size: usize,
    ) -> Result<FunctionSet> {
        match num_functions {
            2 => Ok(FunctionSet::Two(self.generate_validated(keys, table_size))),
            3 => Ok(FunctionSet::Three(self.generate_validated(keys, table_size))),
            4 => Ok(FunctionSet::Four(self.generate_validated(keys, table_size))),
            5 => Ok(FunctionSet::Five(self.generate_validated(keys, table_size))),
            n => Err(CuckooTableError::InvalidConfiguration(format!(
                "number of hash functions must be between {MIN_HASH_FUNCTIONS} and {MAX_HASH_FUNCTIONS}, got {n}"
            ))),
        }
    }

    fn generate_validated<const N: usize>(&mut self, keys: &[u64], table_size: usize) -> Functions<N> {
        let mut functions = self.draw_functions::<N>();
        if keys.len() <= N {
            return functions;
        }

        for draw in 1..=MAX_GENERATE_ATTEMPTS {
            let signatures: Vec<u64> = keys
                .par_iter()
                .map(|&key| slot_signature(&functions, key, table_size))
                .collect();
            let multiplicity = self.oracle.max_multiplicity(signatures);
            if multiplicity <= N {
                return functions;
            }
            debug!(draw, multiplicity, num_functions = N, "Rejected hash function set");
            if draw < MAX_GENERATE_ATTEMPTS {
                functions = self.draw_functions::<N>();
            }
        }

        warn!(
            attempts = MAX_GENERATE_ATTEMPTS,
            num_functions = N,
            "No collision-free hash function set found, using last draw"
        );
        functions
    }
}
