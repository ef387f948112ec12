// Copyright (c) 2025 cuhash Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Bounded-probe lookups against a built table.
//!
//! A query examines its candidate slots in function order and then, if the
//! table has anything stashed, its single stash slot. No query ever looks at
//! more than `num_hash_functions + 1` slots.

use rayon::prelude::*;

use crate::data_structures::cuckoo_table::entry::{Entry, KEY_EMPTY, NOT_FOUND};
use crate::data_structures::cuckoo_table::hash::{
    dispatch_functions, stash_slot, FunctionSet, Functions, StashConstants,
};

/// Outcome of a single lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup {
    /// Stored value, if the key was found
    pub value: Option<u32>,
    /// Number of slots examined
    pub probes: usize,
}

/// Read-only view over table contents captured at the last successful build.
///
/// Holds nothing but borrowed state, so it can be built over any contents
/// buffer laid out as `table_size` primary slots followed by the stash.
#[derive(Debug, Clone, Copy)]
pub struct RetrievalEngine<'a> {
    contents: &'a [Entry],
    table_size: usize,
    functions: &'a FunctionSet,
    stash_constants: StashConstants,
    stash_count: u32,
}

impl<'a> RetrievalEngine<'a> {
    /// Creates a view over `contents`.
    pub fn new(
        contents: &'a [Entry],
        table_size: usize,
        functions: &'a FunctionSet,
        stash_constants: StashConstants,
        stash_count: u32,
    ) -> Self {
        Self {
            contents,
            table_size,
            functions,
            stash_constants,
            stash_count,
        }
    }

    /// Looks up one key and reports how many slots it took.
    pub fn lookup(&self, key: u64) -> Lookup {
        dispatch_functions!(self.functions, functions => self.lookup_with(functions, key))
    }

    /// Value stored for `key`, or [`NOT_FOUND`].
    pub fn retrieve_one(&self, key: u64) -> u32 {
        self.lookup(key).value.unwrap_or(NOT_FOUND)
    }

    /// Resolves every query in parallel. `results` must be as long as `queries`.
    pub fn retrieve(&self, queries: &[u64], results: &mut [u32]) {
        debug_assert_eq!(queries.len(), results.len());
        dispatch_functions!(self.functions, functions => {
            results
                .par_iter_mut()
                .zip(queries.par_iter())
                .for_each(|(result, &key)| {
                    *result = self.lookup_with(functions, key).value.unwrap_or(NOT_FOUND);
                })
        });
    }

    #[inline]
    fn lookup_with<const N: usize>(&self, functions: &Functions<N>, key: u64) -> Lookup {
        // The empty sentinel would otherwise match unused slots.
        if key == KEY_EMPTY {
            return Lookup {
                value: None,
                probes: 0,
            };
        }

        let mut probes = 0;
        for which in 0..N {
            probes += 1;
            let entry = &self.contents[functions.slot(which, key, self.table_size)];
            if entry.key == key {
                return Lookup {
                    value: Some(entry.value),
                    probes,
                };
            }
        }

        if self.stash_count > 0 {
            probes += 1;
            let entry = &self.contents[self.table_size + stash_slot(&self.stash_constants, key)];
            if entry.key == key {
                return Lookup {
                    value: Some(entry.value),
                    probes,
                };
            }
        }

        Lookup {
            value: None,
            probes,
        }
    }
}
