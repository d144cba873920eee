//! Core ledger data structures and wire format
//!
//! This crate provides the fundamental building blocks for the ledger:
//! - Basic types (Hash, Address)
//! - Multi-denomination coin arithmetic and accounts
//! - Transaction kinds, structural validation, sign-bytes, and codec
//! - Key and signature wrappers

pub mod account;
pub mod coins;
pub mod crypto;
pub mod error;
pub mod transaction;
pub mod types;

// Re-export commonly used types
pub use account::*;
pub use coins::*;
pub use crypto::*;
pub use error::*;
pub use transaction::*;
pub use types::*;
