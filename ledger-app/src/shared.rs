//! Thread-safe application wrapper

use crate::app::{App, AppInfo};
use crate::query::QueryResult;
use ledger_core::{Hash, TxResult};
use ledger_engine::{BlockHeader, EndBlock, Plugin, Receipt, Validator};
use ledger_store::{CommitId, CommitKVStore};
use parking_lot::Mutex;
use std::sync::Arc;

/// Shares an [`App`] across threads.
///
/// The engine itself needs no locking under the consensus engine's
/// sequential call contract; this wrapper exists for hosts that may
/// call check concurrently with commit, where the check-snapshot swap
/// must be atomic.
pub struct SharedApp<S: CommitKVStore> {
    inner: Arc<Mutex<App<S>>>,
}

impl<S: CommitKVStore> SharedApp<S> {
    pub fn new(app: App<S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(app)),
        }
    }

    pub fn register_plugin(&self, plugin: Box<dyn Plugin>) {
        self.inner.lock().register_plugin(plugin);
    }

    pub fn info(&self) -> AppInfo {
        self.inner.lock().info()
    }

    pub fn set_option(&self, key: &str, value: &str) -> String {
        self.inner.lock().set_option(key, value)
    }

    pub fn check_tx(&self, tx_bytes: &[u8]) -> TxResult<()> {
        self.inner.lock().check_tx(tx_bytes)
    }

    pub fn deliver_tx(&self, tx_bytes: &[u8]) -> TxResult<Receipt> {
        self.inner.lock().deliver_tx(tx_bytes)
    }

    pub fn commit(&self) -> TxResult<CommitId> {
        self.inner.lock().commit()
    }

    pub fn query(&self, path: &str, data: &[u8]) -> TxResult<QueryResult> {
        self.inner.lock().query(path, data)
    }

    pub fn init_chain(&self, validators: &[Validator]) {
        self.inner.lock().init_chain(validators);
    }

    pub fn begin_block(&self, hash: Hash, header: &BlockHeader) {
        self.inner.lock().begin_block(hash, header);
    }

    pub fn end_block(&self, height: u64) -> EndBlock {
        self.inner.lock().end_block(height)
    }
}

impl<S: CommitKVStore> Clone for SharedApp<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
