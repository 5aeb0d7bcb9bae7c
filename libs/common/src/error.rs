//! Custom error types for the share registry
//!
//! `NotFound` and `Expired` are kept apart so the web layer can answer
//! unknown links and stale links differently.

use thiserror::Error;

/// Custom error type for registry operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The identifier was never issued or has already been swept
    #[error("Share not found")]
    NotFound,

    /// The identifier exists but its time-to-live has elapsed
    #[error("Share has expired")]
    Expired,

    /// The upload does not satisfy the bundle invariants
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The encoded payloads exceed the per-bundle limit
    #[error("Payload too large: {size} bytes exceeds limit of {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },

    /// The registry holds the maximum number of live entries
    #[error("Registry is full ({0} entries)")]
    CapacityExceeded(usize),
}

/// Type alias for Result with RegistryError
pub type RegistryResult<T> = Result<T, RegistryError>;
