//! Hash table configuration validation.
//!
//! The table validates its own parameters; this bridges those checks into the
//! configuration error type so a loaded file fails early with a clear key.

use super::{ConfigResult, Validate};
use crate::data_structures::cuckoo_table::{CuckooTableConfig, CuckooTableError};
use crate::error::config::ConfigError;

impl Validate for CuckooTableConfig {
    fn validate(&self) -> ConfigResult<()> {
        CuckooTableConfig::validate(self).map_err(|e| match e {
            CuckooTableError::InvalidConfiguration(message) => ConfigError::ValueOutOfRange {
                key: "table".to_string(),
                message,
            },
            other => ConfigError::ValidationError(other.to_string()),
        })
    }
}
