//! Data structures for cuhash.
//!
//! This module contains the bulk-built cuckoo hash table and its supporting
//! pieces. Construction is data-parallel and lock-free: workers coordinate
//! only through atomic operations on individual slots.

pub mod cuckoo_table;

// Re-export common data structures
pub use cuckoo_table::{
    BuildStats, BulkTable, CuckooTableConfig, CuckooTableError, HashTable, KEY_EMPTY, NOT_FOUND,
};
