//! Cross-module tests for the cuckoo hash table.
//!
//! Unit tests next to each submodule cover the individual pieces; these
//! exercise whole builds through the public surface.

use std::sync::Arc;

use proptest::prelude::*;
use test_case::test_case;

use super::{distinct_keys_strategy, scrambled_keys, seeded_table};
use crate::data_structures::cuckoo_table::{
    BulkTable, CuckooTableError, HashTable, MockCollisionOracle, ENTRY_EMPTY, KEY_EMPTY,
    MAX_RESTART_ATTEMPTS, NOT_FOUND, STASH_SIZE,
};
use crate::run_proptest;

fn build_and_check(keys: Vec<u64>) -> Result<(), TestCaseError> {
    let mut table = seeded_table(512, 1.25, 4);
    let values: Vec<u32> = (0..keys.len() as u32).collect();

    let stats = table
        .build(&keys, &values)
        .map_err(|e| TestCaseError::fail(e.to_string()))?;
    prop_assert!(stats.stash_count as usize <= STASH_SIZE);
    prop_assert_eq!(table.retrieve_vec(&keys).map_err(|e| TestCaseError::fail(e.to_string()))?, values);
    Ok(())
}

run_proptest!(
    prop_every_built_key_is_retrievable,
    distinct_keys_strategy(512),
    build_and_check
);

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_absent_keys_are_not_found(
        keys in distinct_keys_strategy(256),
        probes in proptest::collection::vec(any::<u64>(), 1..256),
    ) {
        let mut table = seeded_table(256, 1.5, 3);
        let values: Vec<u32> = keys.iter().map(|&k| (k >> 32) as u32 ^ 0x5a5a).collect();
        table.build(&keys, &values).unwrap();

        for probe in probes {
            let expected = keys
                .iter()
                .position(|&k| k == probe)
                .map(|i| values[i])
                .unwrap_or(NOT_FOUND);
            prop_assert_eq!(table.retrieve_vec(&[probe]).unwrap(), vec![expected]);
        }
    }

    #[test]
    fn prop_probes_are_bounded(keys in distinct_keys_strategy(256), num_functions in 2usize..=5) {
        let space_usage = match num_functions {
            2 => 2.5,
            3 => 1.5,
            _ => 1.25,
        };
        let mut table = seeded_table(256, space_usage, num_functions);
        let values = vec![7u32; keys.len()];
        table.build(&keys, &values).unwrap();

        for &key in &keys {
            let lookup = table.lookup(key).unwrap();
            prop_assert_eq!(lookup.value, Some(7));
            prop_assert!(lookup.probes >= 1);
            prop_assert!(lookup.probes <= num_functions + 1);
        }
    }
}

#[test_case(2, 2.5 ; "two functions")]
#[test_case(3, 1.5 ; "three functions")]
#[test_case(4, 1.25 ; "four functions")]
#[test_case(5, 1.25 ; "five functions")]
fn test_build_with_each_function_count(num_functions: usize, space_usage: f32) {
    let keys = scrambled_keys(5_000);
    let values: Vec<u32> = keys.iter().map(|&k| k as u32 & 0x7fff_ffff).collect();
    let mut table = seeded_table(5_000, space_usage, num_functions);

    let stats = table.build(&keys, &values).unwrap();
    assert_eq!(stats.num_hash_functions, num_functions);
    assert!(stats.attempts >= 1 && stats.attempts <= MAX_RESTART_ATTEMPTS);
    assert!(stats.longest_chain <= stats.max_iterations);
    assert!(stats.stash_count as usize <= STASH_SIZE);
    assert_eq!(table.retrieve_vec(&keys).unwrap(), values);

    // Every key sits in exactly one place.
    let occupied = table
        .contents()
        .iter()
        .filter(|entry| !entry.is_empty())
        .count();
    assert_eq!(occupied, keys.len());
}

#[test_case(2, 2.0 => false ; "two functions need more than double")]
#[test_case(2, 2.01 => true ; "two functions at the minimum")]
#[test_case(3, 1.05 => false ; "three functions below minimum")]
#[test_case(4, 1.03 => true ; "four functions at the minimum")]
#[test_case(5, 1.0 => false ; "five functions below minimum")]
#[test_case(1, 4.0 => false ; "too few functions")]
#[test_case(6, 4.0 => false ; "too many functions")]
fn test_initialize_space_usage(num_functions: usize, space_usage: f32) -> bool {
    let mut table = HashTable::new();
    BulkTable::initialize(&mut table, 100, space_usage, num_functions).is_ok()
}

#[test]
fn test_rebuild_replaces_previous_contents() {
    let mut table = seeded_table(1_000, 1.25, 4);
    let first = scrambled_keys(1_000);
    table.build(&first, &vec![1; first.len()]).unwrap();

    let second: Vec<u64> = first.iter().map(|k| k ^ 0xffff).take(300).collect();
    table.build(&second, &vec![2; second.len()]).unwrap();

    assert!(table.retrieve_vec(&second).unwrap().iter().all(|&v| v == 2));
    let stale: Vec<u64> = first
        .iter()
        .copied()
        .filter(|k| !second.contains(k))
        .collect();
    assert!(table.retrieve_vec(&stale).unwrap().iter().all(|&v| v == NOT_FOUND));
}

#[test]
fn test_stored_not_found_value_is_distinguishable() {
    let mut table = seeded_table(10, 1.25, 4);
    table.build(&[11, 12], &[NOT_FOUND, 0]).unwrap();

    assert_eq!(table.get(11).unwrap(), Some(NOT_FOUND));
    assert_eq!(table.get(12).unwrap(), Some(0));
    assert_eq!(table.get(13).unwrap(), None);
    assert_eq!(table.retrieve_vec(&[11, 13]).unwrap(), vec![NOT_FOUND, NOT_FOUND]);
}

#[test]
fn test_reserved_key_rejected_and_never_found() {
    let mut table = seeded_table(10, 1.25, 4);
    assert_eq!(
        table.build(&[1, KEY_EMPTY], &[1, 2]),
        Err(CuckooTableError::ReservedKey(KEY_EMPTY))
    );

    table.build(&[], &[]).unwrap();
    let lookup = table.lookup(KEY_EMPTY).unwrap();
    assert_eq!(lookup.value, None);
    assert_eq!(lookup.probes, 0);
}

#[test]
fn test_duplicate_keys_rejected() {
    let mut table = seeded_table(10, 1.25, 4);
    assert_eq!(
        table.build(&[5, 6, 5], &[1, 2, 3]),
        Err(CuckooTableError::DuplicateKeys)
    );
    assert!(!table.is_built());
    assert!(table.contents().iter().all(|entry| *entry == ENTRY_EMPTY));
}

#[test]
fn test_injected_oracle_sees_every_key() {
    let keys = scrambled_keys(50);
    let mut sorted_keys = keys.clone();
    sorted_keys.sort_unstable();
    let is_key_batch = move |items: &Vec<u64>| {
        let mut sorted = items.clone();
        sorted.sort_unstable();
        sorted == sorted_keys
    };
    let is_other_batch = {
        let is_key_batch = is_key_batch.clone();
        move |items: &Vec<u64>| !is_key_batch(items)
    };

    let mut oracle = MockCollisionOracle::new();
    oracle
        .expect_max_multiplicity()
        .withf(is_key_batch)
        .times(1)
        .return_const(1usize);
    // Slot signature checks.
    oracle
        .expect_max_multiplicity()
        .withf(is_other_batch)
        .return_const(1usize);

    let mut table = HashTable::with_oracle(Arc::new(oracle)).with_seed(9);
    table.initialize(50, 1.25, 4).unwrap();
    table.build(&keys, &vec![3; keys.len()]).unwrap();
    assert!(table.retrieve_vec(&keys).unwrap().iter().all(|&v| v == 3));
}

#[test]
fn test_concurrent_readers() {
    let keys = scrambled_keys(4_000);
    let values: Vec<u32> = (0..keys.len() as u32).collect();
    let mut table = seeded_table(4_000, 1.25, 4);
    table.build(&keys, &values).unwrap();

    let table = &table;
    std::thread::scope(|scope| {
        for chunk in keys.chunks(1_000).zip(values.chunks(1_000)) {
            scope.spawn(move || {
                let (chunk_keys, chunk_values) = chunk;
                assert_eq!(table.retrieve_vec(chunk_keys).unwrap(), chunk_values);
            });
        }
    });
}

#[test]
fn test_release_is_idempotent() {
    let mut table = seeded_table(100, 1.25, 4);
    table.build(&scrambled_keys(100), &[0; 100]).unwrap();

    table.release();
    table.release();
    assert!(!table.is_built());
    assert_eq!(table.retrieve_vec(&[1]), Err(CuckooTableError::NotBuilt));
    assert_eq!(table.build(&[1], &[1]), Err(CuckooTableError::NotInitialized));
}

#[test]
fn test_same_seed_same_constants() {
    let keys = scrambled_keys(2_000);
    let values: Vec<u32> = (0..keys.len() as u32).collect();

    let mut first = seeded_table(2_000, 1.25, 4);
    let mut second = seeded_table(2_000, 1.25, 4);
    first.build(&keys, &values).unwrap();
    second.build(&keys, &values).unwrap();

    assert_eq!(first.constants_4(), second.constants_4());
    assert_eq!(first.stash_constants(), second.stash_constants());
    // Slot layout depends on which worker wins each exchange; answers do not.
    assert_eq!(first.retrieve_vec(&keys).unwrap(), values);
    assert_eq!(second.retrieve_vec(&keys).unwrap(), values);
}
