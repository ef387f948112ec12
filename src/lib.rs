//! cuhash library
//!
//! This library contains a bulk-built cuckoo hash table from 64-bit keys to
//! 32-bit values, together with the configuration, error handling, and
//! workload tooling used by the `cuhash` binary.
//!
//! # Architecture
//!
//! - Construction places every key in parallel through atomic slot exchanges
//! - Lookups examine a bounded number of slots regardless of load
//! - Failed builds restart with fresh hash constants, up to a fixed limit
//! - Collision detection is injected so it can be mocked in tests

pub mod config;
pub mod data_structures;
pub mod error;
pub mod workload;

// Internal modules that are not part of the public API
#[cfg(test)]
pub(crate) mod tests;

/// Version information for cuhash.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
