// Copyright (c) 2025 cuhash Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Slot layout and reserved values shared by construction and retrieval.

/// Number of whole-table build attempts before a build is abandoned.
pub const MAX_RESTART_ATTEMPTS: u32 = 10;

/// Key value marking an unused slot. Never accepted as an input key.
pub const KEY_EMPTY: u64 = u64::MAX;

/// Value returned for a query key that is not in the table.
pub const NOT_FOUND: u32 = u32::MAX;

/// Largest supported number of hash functions.
pub const MAX_HASH_FUNCTIONS: usize = 5;

/// Smallest supported number of hash functions.
pub const MIN_HASH_FUNCTIONS: usize = 2;

/// Number of slots in the overflow stash appended after the primary table.
pub const STASH_SIZE: usize = 101;

/// Minimum ratio of table slots to input keys, indexed by function count.
/// Counts below two are unsupported and carry an unreachable bound.
pub const MINIMUM_SPACE_USAGES: [f32; MAX_HASH_FUNCTIONS + 1] =
    [f32::MAX, f32::MAX, 2.01, 1.1, 1.03, 1.02];

/// A key and its value as laid out in table storage.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entry {
    /// Stored key, or [`KEY_EMPTY`] for an unused slot
    pub key: u64,
    /// Value associated with `key`
    pub value: u32,
}

/// Contents of a slot nobody has written to.
pub const ENTRY_EMPTY: Entry = Entry {
    key: KEY_EMPTY,
    value: 0,
};

/// Result pair for a key that could not be found.
pub const ENTRY_NOT_FOUND: Entry = Entry {
    key: KEY_EMPTY,
    value: NOT_FOUND,
};

impl Entry {
    /// Creates an entry for a real key.
    pub const fn new(key: u64, value: u32) -> Self {
        Self { key, value }
    }

    /// Returns `true` if this slot holds no key.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.key == KEY_EMPTY
    }
}

impl Default for Entry {
    fn default() -> Self {
        ENTRY_EMPTY
    }
}

/// Returns the minimum space usage accepted for `num_functions` hash functions,
/// or `None` when the count is outside the supported range.
pub fn minimum_space_usage(num_functions: usize) -> Option<f32> {
    if (MIN_HASH_FUNCTIONS..=MAX_HASH_FUNCTIONS).contains(&num_functions) {
        Some(MINIMUM_SPACE_USAGES[num_functions])
    } else {
        None
    }
}
