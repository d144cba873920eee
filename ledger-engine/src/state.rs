//! Chain state over a layered store

use ledger_core::{Account, Address, TxError, TxResult};
use ledger_store::{CommitId, CommitKVStore, KVStore, Scratch, StoreResult};
use std::collections::HashMap;

/// Store key holding the chain id.
pub const CHAIN_ID_KEY: &[u8] = b"base/chain_id";
/// Prefix of account records.
pub const ACCOUNT_PREFIX: &[u8] = b"base/a/";

/// Store key of the account record for `address`.
pub fn account_key(address: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(ACCOUNT_PREFIX.len() + 20);
    key.extend_from_slice(ACCOUNT_PREFIX);
    key.extend_from_slice(address.as_ref());
    key
}

/// Read an account from any store.
///
/// A record that no longer decodes means the ledger itself is corrupt;
/// that halts the process rather than continue on inconsistent state.
pub fn get_account(store: &dyn KVStore, address: &Address) -> Option<Account> {
    let bytes = store.get(&account_key(address))?;
    let (account, _) = bincode::decode_from_slice(&bytes, bincode::config::standard())
        .unwrap_or_else(|e| panic!("corrupt account record for {address}: {e}"));
    Some(account)
}

/// Write an account record.
pub fn set_account(store: &mut dyn KVStore, address: &Address, account: &Account) {
    let bytes = bincode::encode_to_vec(account, bincode::config::standard())
        .unwrap_or_else(|e| panic!("account encoding failed for {address}: {e}"));
    store.set(&account_key(address), bytes);
}

/// Chain state: chain-id caching and account access over a store.
///
/// The root state (over the backing engine) keeps a write-through read
/// cache that is dropped on commit, since the engine is the source of
/// truth afterwards. [`State::scratch`] derives a child state whose
/// writes stay buffered until flushed; states over an already-layered
/// store are built with [`State::layered`]. Cheap to derive, never
/// copies backing data.
pub struct State<S: KVStore> {
    store: S,
    chain_id: Option<String>,
    read_cache: Option<HashMap<Vec<u8>, Vec<u8>>>,
}

impl<S: KVStore> State<S> {
    /// Root state over a backing store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            chain_id: None,
            read_cache: Some(HashMap::new()),
        }
    }

    /// State over an already-layered store; no root read cache.
    pub fn layered(store: S, chain_id: Option<String>) -> Self {
        Self {
            store,
            chain_id,
            read_cache: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Set the chain id; immutable for the life of the process once set.
    pub fn set_chain_id(&mut self, chain_id: &str) {
        self.chain_id = Some(chain_id.to_string());
        self.set(CHAIN_ID_KEY, chain_id.as_bytes().to_vec());
    }

    /// Chain id, cached after the first lookup.
    pub fn chain_id(&mut self) -> TxResult<String> {
        if let Some(chain_id) = &self.chain_id {
            return Ok(chain_id.clone());
        }
        let bytes = self
            .get(CHAIN_ID_KEY)
            .ok_or_else(|| TxError::Internal("chain id is not set".to_string()))?;
        let chain_id = String::from_utf8(bytes)
            .map_err(|_| TxError::Internal("chain id is not valid utf-8".to_string()))?;
        self.chain_id = Some(chain_id.clone());
        Ok(chain_id)
    }

    pub fn get_account(&self, address: &Address) -> Option<Account> {
        get_account(self, address)
    }

    pub fn set_account(&mut self, address: &Address, account: &Account) {
        set_account(self, address, account)
    }

    /// Derive an isolated scratch state over this one. Writes become
    /// visible to `self` only through [`State::flush`]; dropping the
    /// scratch state discards them.
    pub fn scratch(&mut self) -> State<Scratch<'_>> {
        let chain_id = self.chain_id.clone();
        State {
            store: Scratch::new(self),
            chain_id,
            read_cache: None,
        }
    }
}

impl<S: KVStore> KVStore for State<S> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        if let Some(cache) = &self.read_cache {
            if let Some(value) = cache.get(key) {
                return Some(value.clone());
            }
        }
        self.store.get(key)
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>) {
        if let Some(cache) = &mut self.read_cache {
            cache.insert(key.to_vec(), value.clone());
        }
        self.store.set(key, value);
    }
}

impl<'a> State<Scratch<'a>> {
    /// Apply every buffered write to the parent state, in write order.
    pub fn flush(self) {
        self.store.flush();
    }
}

impl<S: CommitKVStore> State<S> {
    /// Commit to the backing engine and drop the read cache: the engine
    /// is the source of truth after a commit.
    pub fn commit(&mut self) -> StoreResult<CommitId> {
        if let Some(cache) = &mut self.read_cache {
            cache.clear();
        }
        self.store.commit()
    }
}
