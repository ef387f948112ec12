// Copyright (c) 2025 cuhash Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Error types for the cuckoo hash table.

/// Errors that can occur while configuring, building or querying a table.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum CuckooTableError {
    /// Function count or space usage rejected by `initialize`
    #[error("Invalid table configuration: {0}")]
    InvalidConfiguration(String),

    /// `build` was called before a successful `initialize`
    #[error("Hash table has not been initialized")]
    NotInitialized,

    /// `retrieve` was called before a successful `build`
    #[error("Hash table has not been built")]
    NotBuilt,

    /// Keys and values passed to `build` differ in length
    #[error("Got {keys} keys but {values} values")]
    LengthMismatch {
        /// Number of keys supplied
        keys: usize,
        /// Number of values supplied
        values: usize,
    },

    /// Query and result buffers passed to `retrieve` differ in length
    #[error("Got {queries} queries but room for {results} results")]
    ResultLengthMismatch {
        /// Number of query keys
        queries: usize,
        /// Length of the result buffer
        results: usize,
    },

    /// More keys than the table was sized for
    #[error("Input of {input_size} keys exceeds the initialized maximum of {max_input_size}")]
    InputTooLarge {
        /// Number of keys supplied
        input_size: usize,
        /// Maximum given to `initialize`
        max_input_size: usize,
    },

    /// An input key equals the empty-slot sentinel
    #[error("Key {0:#x} is reserved for empty slots")]
    ReservedKey(u64),

    /// The same key appears more than once in the input
    #[error("Input contains duplicate keys")]
    DuplicateKeys,

    /// A single attempt could not place every key, even with the stash
    #[error("Placement failed: {failures} keys left unplaced with {stash_count} stash slots used")]
    PlacementFailed {
        /// Keys that found neither a table slot nor a free stash slot
        failures: u32,
        /// Stash occupancy when the attempt ended
        stash_count: u32,
    },

    /// Every restart attempt failed
    #[error("Build failed after {attempts} attempts")]
    BuildFailed {
        /// Number of attempts made
        attempts: u32,
    },

    /// The worker pool could not be created
    #[error("Worker pool error: {0}")]
    WorkerPool(String),
}

/// Result type for cuckoo hash table operations
pub type Result<T> = std::result::Result<T, CuckooTableError>;
