//! Store error types

use thiserror::Error;

/// Store error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Commit was requested on a store that opted out of persistence.
    #[error("store does not support commit")]
    CommitUnsupported,

    /// Backing-engine failure
    #[error("store error: {0}")]
    Internal(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
