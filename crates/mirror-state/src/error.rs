//! Error types for mirror-state operations.

use std::fmt;
use thiserror::Error;

/// Result type alias for mirror-state operations.
pub type MirrorResult<T> = Result<T, MirrorError>;

/// Errors that can occur while managing mirrors.
///
/// Most misuse is deliberately not an error: mutating an unmapped field and
/// removing an absent key are silent no-ops. The only fatal condition is a
/// configuration error at mirror-creation time — a mirror cannot exist
/// without its mapping contract.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// The contract resolver produced no field mappings for a key.
    #[error("no field mappings resolved for mirror key {key}")]
    MappingsUnresolved {
        /// Debug rendering of the offending key.
        key: String,
    },

    /// Internal handler state was poisoned by an earlier panic.
    #[error("source handler state poisoned by an earlier panic")]
    HandlerPoisoned,
}

impl MirrorError {
    /// Create a mappings-unresolved error for a key.
    pub fn mappings_unresolved(key: &impl fmt::Debug) -> Self {
        MirrorError::MappingsUnresolved {
            key: format!("{key:?}"),
        }
    }
}
