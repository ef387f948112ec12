//! Test modules for cuhash.
//!
//! This module contains the cross-component testing infrastructure:
//! - Property-based tests for the hash table using proptest
//! - Configuration loading against real files and environment variables
//! - Error formatting and reporting
//! - End-to-end workload runs

pub mod cuckoo_table_tests;
pub mod test_utils;

// Re-export commonly used testing tools to simplify imports in test modules
pub use test_utils::{distinct_keys_strategy, scrambled_keys, seeded_table, TestFixture};

/// Run a property-based test over `$strategy` with a reduced case count.
///
/// Table builds are comparatively heavy, so the default of 256 cases is
/// lowered to keep the suite fast.
#[macro_export]
macro_rules! run_proptest {
    ($name:ident, $strategy:expr, $test_fn:expr) => {
        proptest::proptest! {
            #![proptest_config(proptest::test_runner::Config::with_cases(32))]
            #[test]
            fn $name(value in $strategy) {
                $test_fn(value)?;
            }
        }
    };
}
