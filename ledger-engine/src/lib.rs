//! Ledger state-transition engine
//!
//! This crate turns consensus-ordered transactions into deterministic
//! ledger mutations: chain state over a layered store, the execution
//! pipelines for transfers and plugin calls, and the plugin protocol
//! with its isolation guarantee.

pub mod execution;
pub mod ibc;
pub mod plugin;
pub mod state;

pub use execution::{exec_tx, Receipt};
pub use plugin::{BlockHeader, CallContext, EndBlock, Plugin, Plugins, Validator};
pub use state::{account_key, get_account, set_account, State, ACCOUNT_PREFIX, CHAIN_ID_KEY};
