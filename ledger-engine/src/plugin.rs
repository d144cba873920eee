//! Plugin protocol

use ledger_core::{Account, Address, Coins, Hash, TxResult};
use ledger_store::KVStore;

/// Call context handed to a plugin invocation.
#[derive(Debug, Clone)]
pub struct CallContext {
    pub caller: Address,
    /// Caller account after the input debit was applied.
    pub caller_account: Account,
    /// Coins forwarded to the plugin, net of fee.
    pub coins: Coins,
}

impl CallContext {
    pub fn new(caller: Address, caller_account: Account, coins: Coins) -> Self {
        Self {
            caller,
            caller_account,
            coins,
        }
    }
}

/// A consensus validator, as surfaced to lifecycle hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validator {
    pub pub_key: Vec<u8>,
    pub power: u64,
}

/// Block metadata for begin-block notifications.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockHeader {
    pub chain_id: String,
    pub height: u64,
    pub time: u64,
}

/// Validator-set changes emitted at end of block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndBlock {
    pub diffs: Vec<Validator>,
}

/// Named business logic invoked by an app transaction.
///
/// The engine guarantees isolation around `run_tx`: writes go to a
/// scratch layer and become durable only when the call returns `Ok`.
/// An error discards all of the plugin's writes but never reverses the
/// fee debit. Lifecycle hooks receive the durable state directly and
/// their outcomes are aggregated, not validated.
pub trait Plugin {
    fn name(&self) -> &str;

    /// Key prefix of this plugin's records, for query routing.
    fn state_key(&self) -> Vec<u8>;

    /// Handle a named call with the coins forwarded net of fee.
    fn run_tx(
        &mut self,
        store: &mut dyn KVStore,
        ctx: CallContext,
        data: &[u8],
    ) -> TxResult<Vec<u8>>;

    fn set_option(&mut self, _store: &mut dyn KVStore, key: &str, _value: &str) -> String {
        format!("unrecognized option key {key}")
    }

    fn init_chain(&mut self, _store: &mut dyn KVStore, _validators: &[Validator]) {}

    fn begin_block(&mut self, _store: &mut dyn KVStore, _hash: Hash, _header: &BlockHeader) {}

    fn end_block(&mut self, _store: &mut dyn KVStore, _height: u64) -> EndBlock {
        EndBlock::default()
    }
}

/// Name-keyed plugin registry. Registration order is preserved so
/// lifecycle fan-out stays deterministic.
#[derive(Default)]
pub struct Plugins {
    list: Vec<Box<dyn Plugin>>,
}

impl Plugins {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, plugin: Box<dyn Plugin>) {
        self.list.push(plugin);
    }

    pub fn get_by_name(&self, name: &str) -> Option<&dyn Plugin> {
        self.list
            .iter()
            .find(|plugin| plugin.name() == name)
            .map(|plugin| plugin.as_ref())
    }

    pub fn get_by_name_mut(&mut self, name: &str) -> Option<&mut (dyn Plugin + 'static)> {
        self.list
            .iter_mut()
            .find(|plugin| plugin.name() == name)
            .map(|plugin| plugin.as_mut())
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Box<dyn Plugin>> {
        self.list.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}
