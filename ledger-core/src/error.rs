//! Transaction error taxonomy

use thiserror::Error;

/// Errors produced while decoding, validating, or executing transactions.
///
/// Every variant carries a human-readable log; layers add their own
/// context with [`TxError::context`], so a failure deep in the pipeline
/// surfaces with the full trail. Validation failures are always returned,
/// never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TxError {
    /// Malformed or oversize wire bytes, unknown tx variant
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Missing account or unregistered plugin
    #[error("unknown address: {0}")]
    UnknownAddress(String),

    /// Address repeated within one transaction's inputs or outputs
    #[error("duplicate address: {0}")]
    DuplicateAddress(String),

    /// Structurally invalid input (coins, sequence, key material)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Structurally invalid output, or conservation mismatch
    #[error("invalid output: {0}")]
    InvalidOutput(String),

    /// Asserted sequence does not follow the account sequence
    #[error("invalid sequence: {0}")]
    InvalidSequence(String),

    /// Balance or fee shortfall
    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// Backing-store or serialization failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl TxError {
    /// Prepend a layer context to the log, keeping the error kind.
    pub fn context(self, ctx: &str) -> Self {
        use TxError::*;
        let pre = |log: String| format!("{ctx}: {log}");
        match self {
            Encoding(log) => Encoding(pre(log)),
            UnknownAddress(log) => UnknownAddress(pre(log)),
            DuplicateAddress(log) => DuplicateAddress(pre(log)),
            InvalidInput(log) => InvalidInput(pre(log)),
            InvalidOutput(log) => InvalidOutput(pre(log)),
            InvalidSequence(log) => InvalidSequence(pre(log)),
            InsufficientFunds(log) => InsufficientFunds(pre(log)),
            InvalidSignature(log) => InvalidSignature(pre(log)),
            Internal(log) => Internal(pre(log)),
        }
    }
}

/// Result type for transaction operations
pub type TxResult<T> = Result<T, TxError>;
