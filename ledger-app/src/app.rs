//! Application lifecycle orchestration

use crate::genesis::GenesisAccount;
use crate::query::{self, QueryResult};
use ledger_core::{Hash, Tx, TxError, TxResult, MAX_TX_SIZE};
use ledger_engine::{exec_tx, BlockHeader, EndBlock, Plugin, Plugins, Receipt, State, Validator};
use ledger_store::{CommitId, CommitKVStore, Overlay, WriteCache};
use tracing::info;

/// Component name that routes `set_option` keys to the base application.
pub const BASE_COMPONENT: &str = "base";

/// Application metadata reported to the consensus engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppInfo {
    pub data: String,
    pub last_block_height: u64,
    pub last_block_app_hash: Option<Hash>,
}

/// The consensus-facing application.
///
/// Owns exactly two state handles: `committed`, a root state over the
/// backing engine used for delivery and lifecycle hooks, and `check`,
/// the write buffer of a scratch snapshot used only for pre-consensus
/// validation. Commit swaps in a fresh check buffer, discarding every
/// speculative write of the closed block.
///
/// The consensus engine calls strictly sequentially; see
/// [`crate::SharedApp`] for hosts that do not.
pub struct App<S: CommitKVStore> {
    committed: State<S>,
    check: WriteCache,
    plugins: Plugins,
    last_commit: Option<CommitId>,
}

impl<S: CommitKVStore> App<S> {
    pub fn new(store: S) -> Self {
        Self {
            committed: State::new(store),
            check: WriteCache::new(),
            plugins: Plugins::new(),
            last_commit: None,
        }
    }

    pub fn register_plugin(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.register(plugin);
    }

    pub fn info(&self) -> AppInfo {
        AppInfo {
            data: format!("ledgerchain v{}", env!("CARGO_PKG_VERSION")),
            last_block_height: self.last_commit.map_or(0, |commit| commit.version),
            last_block_app_hash: self.last_commit.map(|commit| commit.hash),
        }
    }

    /// Handle a namespaced `"<component>/<key>"` configuration option.
    ///
    /// The `base` component covers chain id and bootstrap accounts;
    /// anything else routes to the plugin of that name. Returns a log
    /// string either way, as configuration is advisory to the engine.
    pub fn set_option(&mut self, key: &str, value: &str) -> String {
        let (component, key) = split_key(key);
        if component != BASE_COMPONENT {
            let Some(plugin) = self.plugins.get_by_name_mut(component) else {
                return format!("invalid plugin name: {component}");
            };
            info!(plugin = component, key, "set_option on plugin");
            return plugin.set_option(&mut self.committed, key, value);
        }
        match key {
            "chain_id" => {
                self.committed.set_chain_id(value);
                "success".to_string()
            }
            "account" => {
                let account = GenesisAccount::from_json(value).and_then(GenesisAccount::into_account);
                match account {
                    Ok((address, account)) => {
                        self.committed.set_account(&address, &account);
                        info!(%address, "genesis account set");
                        "success".to_string()
                    }
                    Err(err) => format!("error decoding genesis account: {err}"),
                }
            }
            _ => format!("unrecognized option key {key}"),
        }
    }

    /// Decode and execute a transaction against the committed state.
    pub fn deliver_tx(&mut self, tx_bytes: &[u8]) -> TxResult<Receipt> {
        let tx = decode_tx(tx_bytes)?;
        exec_tx(&mut self.committed, &mut self.plugins, &tx, false)
            .map_err(|e| e.context("in deliver_tx"))
    }

    /// Decode and validate a transaction against the check snapshot.
    ///
    /// Runs the identical validation path as delivery but never leaves
    /// durable side effects; receipt data is discarded because only
    /// validity matters before consensus.
    pub fn check_tx(&mut self, tx_bytes: &[u8]) -> TxResult<()> {
        let tx = decode_tx(tx_bytes)?;
        let chain_id = self.committed.chain_id().ok();
        let overlay = Overlay::new(&self.committed, &mut self.check);
        let mut check_state = State::layered(overlay, chain_id);
        exec_tx(&mut check_state, &mut self.plugins, &tx, true)
            .map(|_| ())
            .map_err(|e| e.context("in check_tx"))
    }

    /// Commit the committed state to the backing engine and publish a
    /// fresh check snapshot over the result.
    pub fn commit(&mut self) -> TxResult<CommitId> {
        let commit = self
            .committed
            .commit()
            .map_err(|e| TxError::Internal(format!("commit failed: {e}")))?;
        // Speculative writes from the closed block are no longer
        // guaranteed valid; drop them with the old snapshot.
        self.check = WriteCache::new();
        self.last_commit = Some(commit);
        info!(version = commit.version, hash = %commit.hash, "committed");
        Ok(commit)
    }

    /// Query the backing store; see [`crate::QueryResult`].
    pub fn query(&self, path: &str, data: &[u8]) -> TxResult<QueryResult> {
        query::run_query(self.committed.store(), path, data)
    }

    pub fn init_chain(&mut self, validators: &[Validator]) {
        for plugin in self.plugins.iter_mut() {
            plugin.init_chain(&mut self.committed, validators);
        }
    }

    pub fn begin_block(&mut self, hash: Hash, header: &BlockHeader) {
        for plugin in self.plugins.iter_mut() {
            plugin.begin_block(&mut self.committed, hash, header);
        }
    }

    /// Fan out to plugins in registration order, concatenating their
    /// validator diffs in that order.
    pub fn end_block(&mut self, height: u64) -> EndBlock {
        let mut response = EndBlock::default();
        for plugin in self.plugins.iter_mut() {
            let mut result = plugin.end_block(&mut self.committed, height);
            response.diffs.append(&mut result.diffs);
        }
        response
    }
}

/// Decode wire bytes, rejecting oversize payloads before any state access.
fn decode_tx(tx_bytes: &[u8]) -> TxResult<Tx> {
    if tx_bytes.len() > MAX_TX_SIZE {
        return Err(TxError::Encoding(format!(
            "tx size {} exceeds maximum {MAX_TX_SIZE}",
            tx_bytes.len()
        )));
    }
    Tx::decode(tx_bytes)
}

/// Split `"<component>/<key>"` at the first slash.
fn split_key(key: &str) -> (&str, &str) {
    match key.split_once('/') {
        Some((component, rest)) => (component, rest),
        None => (key, ""),
    }
}
