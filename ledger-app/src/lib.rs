//! Consensus-facing application layer
//!
//! Maps the consensus engine's sequential call surface (check, deliver,
//! commit, query, and the block hooks) onto the ledger engine: a
//! committed state for block delivery and a discardable check snapshot
//! for pre-consensus validation, swapped fresh at every commit.

pub mod app;
pub mod genesis;
pub mod query;
pub mod shared;

pub use app::{App, AppInfo, BASE_COMPONENT};
pub use genesis::GenesisAccount;
pub use query::QueryResult;
pub use shared::SharedApp;
