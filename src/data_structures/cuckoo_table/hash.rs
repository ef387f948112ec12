// Copyright (c) 2025 cuhash Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Hash functions for the cuckoo hash table.
//!
//! Every function has the form `h(key) = ((a ^ key) + b) mod P` with
//! `P = 4294967291`, the largest prime below 2^32, and is then reduced into
//! the table's index range. A build generation uses one [`FunctionSet`] of two
//! to five such functions plus one extra pair of constants for the stash.
//! All of these are pure so that any number of workers may evaluate them
//! concurrently.

use crate::data_structures::cuckoo_table::entry::STASH_SIZE;

/// Prime divisor applied before reducing into the table range.
pub const PRIME_DIVISOR: u64 = 4_294_967_291;

/// A pair of constants defining one hash function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HashConstants {
    /// XOR constant, never zero for generated functions
    pub a: u32,
    /// Additive constant
    pub b: u32,
}

impl HashConstants {
    /// Creates a constant pair.
    pub const fn new(a: u32, b: u32) -> Self {
        Self { a, b }
    }

    /// Evaluates `((a ^ key) + b) mod P`.
    #[inline]
    pub fn hash(&self, key: u64) -> u32 {
        ((u64::from(self.a) ^ key).wrapping_add(u64::from(self.b)) % PRIME_DIVISOR) as u32
    }
}

/// Constants of the hash function that maps keys into the stash.
pub type StashConstants = HashConstants;

/// Returns the stash slot of `key`, in `0..STASH_SIZE`.
#[inline]
pub fn stash_slot(constants: &StashConstants, key: u64) -> usize {
    ((u64::from(constants.a) ^ key).wrapping_add(u64::from(constants.b)) % STASH_SIZE as u64)
        as usize
}

/// A fixed-size bundle of `N` hash functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Functions<const N: usize> {
    constants: [HashConstants; N],
}

impl<const N: usize> Functions<N> {
    /// Bundles `N` constant pairs.
    pub const fn new(constants: [HashConstants; N]) -> Self {
        Self { constants }
    }

    /// The constant pairs, in function order.
    pub fn constants(&self) -> &[HashConstants; N] {
        &self.constants
    }

    /// Index of `key` under function `which`, in `0..table_size`.
    #[inline]
    pub fn slot(&self, which: usize, key: u64, table_size: usize) -> usize {
        self.constants[which].hash(key) as usize % table_size
    }

    /// All candidate slots of `key`, in function order.
    #[inline]
    pub fn slots(&self, key: u64, table_size: usize) -> [usize; N] {
        let mut slots = [0usize; N];
        for (which, slot) in slots.iter_mut().enumerate() {
            *slot = self.slot(which, key, table_size);
        }
        slots
    }
}

/// The hash functions of one build generation.
///
/// A tagged variant over the supported function counts so that the hot
/// construction and retrieval loops are monomorphized for each count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionSet {
    /// Two hash functions
    Two(Functions<2>),
    /// Three hash functions
    Three(Functions<3>),
    /// Four hash functions
    Four(Functions<4>),
    /// Five hash functions
    Five(Functions<5>),
}

/// Runs `$body` with `$functions` bound to the concrete `Functions<N>` inside a set.
macro_rules! dispatch_functions {
    ($set:expr, $functions:ident => $body:expr) => {
        match $set {
            $crate::data_structures::cuckoo_table::hash::FunctionSet::Two($functions) => $body,
            $crate::data_structures::cuckoo_table::hash::FunctionSet::Three($functions) => $body,
            $crate::data_structures::cuckoo_table::hash::FunctionSet::Four($functions) => $body,
            $crate::data_structures::cuckoo_table::hash::FunctionSet::Five($functions) => $body,
        }
    };
}
pub(crate) use dispatch_functions;

impl FunctionSet {
    /// Builds a set from a slice of two to five constant pairs.
    pub fn from_constants(constants: &[HashConstants]) -> Option<Self> {
        let set = match constants.len() {
            2 => Self::Two(Functions::new(constants.try_into().ok()?)),
            3 => Self::Three(Functions::new(constants.try_into().ok()?)),
            4 => Self::Four(Functions::new(constants.try_into().ok()?)),
            5 => Self::Five(Functions::new(constants.try_into().ok()?)),
            _ => return None,
        };
        Some(set)
    }

    /// Number of hash functions in the set.
    pub fn len(&self) -> usize {
        self.constants().len()
    }

    /// Always `false`; a set holds at least two functions.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The constant pairs, in function order.
    pub fn constants(&self) -> &[HashConstants] {
        dispatch_functions!(self, f => f.constants().as_slice())
    }

    /// Index of `key` under function `which`, in `0..table_size`.
    #[inline]
    pub fn slot(&self, which: usize, key: u64, table_size: usize) -> usize {
        dispatch_functions!(self, f => f.slot(which, key, table_size))
    }

    /// The two-function bundle, if this set has two functions.
    pub fn as_two(&self) -> Option<&Functions<2>> {
        match self {
            Self::Two(f) => Some(f),
            _ => None,
        }
    }

    /// The three-function bundle, if this set has three functions.
    pub fn as_three(&self) -> Option<&Functions<3>> {
        match self {
            Self::Three(f) => Some(f),
            _ => None,
        }
    }

    /// The four-function bundle, if this set has four functions.
    pub fn as_four(&self) -> Option<&Functions<4>> {
        match self {
            Self::Four(f) => Some(f),
            _ => None,
        }
    }

    /// The five-function bundle, if this set has five functions.
    pub fn as_five(&self) -> Option<&Functions<5>> {
        match self {
            Self::Five(f) => Some(f),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_matches_formula() {
        let c = HashConstants::new(0x1234_5678, 0x9abc_def0);
        let key = 0xdead_beef_cafe_babe_u64;
        let expected = ((0x1234_5678_u64 ^ key).wrapping_add(0x9abc_def0) % PRIME_DIVISOR) as u32;
        assert_eq!(c.hash(key), expected);
        assert!(u64::from(c.hash(key)) < PRIME_DIVISOR);
    }

    #[test]
    fn test_hash_wraps_near_u64_max() {
        let c = HashConstants::new(0, u32::MAX);
        // Wrapping add keeps the function total over the whole key space.
        let h = c.hash(u64::MAX - 1);
        assert!(u64::from(h) < PRIME_DIVISOR);
    }

    #[test]
    fn test_stash_slot_in_range() {
        let c = HashConstants::new(17, 23);
        for key in 0..10_000u64 {
            assert!(stash_slot(&c, key) < STASH_SIZE);
        }
        assert_eq!(stash_slot(&c, 0), ((17u64 + 23) % STASH_SIZE as u64) as usize);
    }

    #[test]
    fn test_slots_in_range() {
        let f = Functions::new([
            HashConstants::new(1, 2),
            HashConstants::new(3, 4),
            HashConstants::new(5, 6),
        ]);
        for key in 0..1_000u64 {
            let slots = f.slots(key, 97);
            assert_eq!(slots.len(), 3);
            assert!(slots.iter().all(|&s| s < 97));
            assert_eq!(slots[1], f.slot(1, key, 97));
        }
    }

    #[test]
    fn test_function_set_from_constants() {
        let pairs = [HashConstants::new(1, 1); 5];
        assert!(FunctionSet::from_constants(&pairs[..1]).is_none());
        assert_eq!(FunctionSet::from_constants(&pairs[..2]).map(|s| s.len()), Some(2));
        assert_eq!(FunctionSet::from_constants(&pairs[..4]).map(|s| s.len()), Some(4));
        assert!(FunctionSet::from_constants(&pairs[..4])
            .and_then(|s| s.as_four().copied())
            .is_some());
        assert_eq!(FunctionSet::from_constants(&pairs).map(|s| s.len()), Some(5));
    }

    #[test]
    fn test_function_set_slot_agrees_with_bundle() {
        let bundle = Functions::new([HashConstants::new(9, 8), HashConstants::new(7, 6)]);
        let set = FunctionSet::Two(bundle);
        for key in [0u64, 1, 42, u64::MAX - 1] {
            assert_eq!(set.slot(0, key, 1_000), bundle.slot(0, key, 1_000));
            assert_eq!(set.slot(1, key, 1_000), bundle.slot(1, key, 1_000));
        }
        assert!(set.as_three().is_none());
    }
}
