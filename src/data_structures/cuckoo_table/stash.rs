// Copyright (c) 2025 cuhash Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Overflow stash for keys the primary table could not place.
//!
//! The stash has [`STASH_SIZE`] slots and a single hash function, so it never
//! chains evictions: a key either claims its empty stash slot or fails.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::data_structures::cuckoo_table::builder::EMPTY_INDEX;
use crate::data_structures::cuckoo_table::entry::{Entry, ENTRY_EMPTY, STASH_SIZE};
use crate::data_structures::cuckoo_table::hash::{stash_slot, StashConstants};

/// Stash region used while a build attempt runs.
///
/// Slots hold indices into the build input, like the primary table does,
/// until [`StashManager::resolve`] turns them into entries.
#[derive(Debug)]
pub struct StashManager {
    slots: Box<[AtomicU32]>,
    constants: StashConstants,
    count: AtomicU32,
}

impl StashManager {
    /// Creates an empty stash using `constants` for its hash function.
    pub fn new(constants: StashConstants) -> Self {
        let slots = (0..STASH_SIZE)
            .map(|_| AtomicU32::new(EMPTY_INDEX))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            slots,
            constants,
            count: AtomicU32::new(0),
        }
    }

    /// Tries to claim the stash slot of `key` for input `index`.
    ///
    /// Returns `false` if the slot is already taken; the caller's build
    /// attempt has then failed.
    pub fn try_insert(&self, key: u64, index: u32) -> bool {
        let slot = stash_slot(&self.constants, key);
        let claimed = self.slots[slot]
            .compare_exchange(EMPTY_INDEX, index, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if claimed {
            self.count.fetch_add(1, Ordering::AcqRel);
        }
        claimed
    }

    /// Number of keys resident in the stash.
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Acquire)
    }

    /// Constants of the stash hash function.
    pub fn constants(&self) -> StashConstants {
        self.constants
    }

    /// Writes the stash contents into `out`, which must hold [`STASH_SIZE`] entries.
    pub fn resolve(&self, keys: &[u64], values: &[u32], out: &mut [Entry]) {
        debug_assert_eq!(out.len(), STASH_SIZE);
        for (entry, slot) in out.iter_mut().zip(self.slots.iter()) {
            let index = slot.load(Ordering::Acquire);
            *entry = if index == EMPTY_INDEX {
                ENTRY_EMPTY
            } else {
                Entry::new(keys[index as usize], values[index as usize])
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::cuckoo_table::hash::HashConstants;

    #[test]
    fn test_insert_and_resolve() {
        let stash = StashManager::new(HashConstants::new(3, 5));
        let keys = [100u64, 200];
        let values = [1u32, 2];

        assert!(stash.try_insert(keys[0], 0));
        assert_eq!(stash.count(), 1);

        let mut out = vec![ENTRY_EMPTY; STASH_SIZE];
        stash.resolve(&keys, &values, &mut out);
        let slot = stash_slot(&stash.constants(), keys[0]);
        assert_eq!(out[slot], Entry::new(100, 1));
        assert_eq!(out.iter().filter(|e| !e.is_empty()).count(), 1);
    }

    #[test]
    fn test_collision_is_rejected() {
        let constants = HashConstants::new(0, 0);
        let stash = StashManager::new(constants);
        // Keys congruent modulo the stash size share a slot under a zero function.
        let first = 7u64;
        let second = 7 + STASH_SIZE as u64;
        assert_eq!(stash_slot(&constants, first), stash_slot(&constants, second));

        assert!(stash.try_insert(first, 0));
        assert!(!stash.try_insert(second, 1));
        assert_eq!(stash.count(), 1);
    }

    #[test]
    fn test_count_never_exceeds_size() {
        let stash = StashManager::new(HashConstants::new(11, 13));
        for key in 0..1_000u64 {
            stash.try_insert(key, key as u32);
        }
        assert_eq!(stash.count() as usize, STASH_SIZE);
    }
}
