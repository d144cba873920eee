//! In-memory store

use crate::{CommitId, CommitKVStore, KVStore, StoreError, StoreResult};
use ledger_core::Hash;
use std::collections::BTreeMap;

/// In-memory key/value store standing in for the backing engine.
///
/// [`MemStore::new`] behaves like a persistent engine: each commit
/// bumps the version and produces a content hash that is deterministic
/// for identical key/value histories. [`MemStore::ephemeral`] opts out
/// of persistence and fails any commit request, for callers that want
/// a scratch double to reject commits loudly.
#[derive(Debug, Default, Clone)]
pub struct MemStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    version: u64,
    ephemeral: bool,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ephemeral() -> Self {
        Self {
            ephemeral: true,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn content_hash(&self) -> Hash {
        let mut hasher = blake3::Hasher::new();
        for (key, value) in &self.data {
            hasher.update(&(key.len() as u64).to_le_bytes());
            hasher.update(key);
            hasher.update(&(value.len() as u64).to_le_bytes());
            hasher.update(value);
        }
        Hash::new(*hasher.finalize().as_bytes())
    }
}

impl KVStore for MemStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.data.get(key).cloned()
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>) {
        self.data.insert(key.to_vec(), value);
    }
}

impl CommitKVStore for MemStore {
    fn commit(&mut self) -> StoreResult<CommitId> {
        if self.ephemeral {
            return Err(StoreError::CommitUnsupported);
        }
        self.version += 1;
        Ok(CommitId {
            version: self.version,
            hash: self.content_hash(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set() {
        let mut store = MemStore::new();
        assert!(store.get(b"k").is_none());
        store.set(b"k", b"v".to_vec());
        assert_eq!(store.get(b"k"), Some(b"v".to_vec()));
        store.set(b"k", b"v2".to_vec());
        assert_eq!(store.get(b"k"), Some(b"v2".to_vec()));
    }

    #[test]
    fn test_commit_is_deterministic() {
        let mut a = MemStore::new();
        let mut b = MemStore::new();
        for store in [&mut a, &mut b] {
            store.set(b"x", b"1".to_vec());
            store.set(b"y", b"2".to_vec());
        }
        let ca = a.commit().unwrap();
        let cb = b.commit().unwrap();
        assert_eq!(ca.hash, cb.hash);
        assert_eq!(ca.version, 1);

        a.set(b"x", b"3".to_vec());
        let ca2 = a.commit().unwrap();
        assert_eq!(ca2.version, 2);
        assert_ne!(ca2.hash, ca.hash);
    }

    #[test]
    fn test_ephemeral_store_rejects_commit() {
        let mut store = MemStore::ephemeral();
        store.set(b"k", b"v".to_vec());
        assert_eq!(store.commit().unwrap_err(), StoreError::CommitUnsupported);
        // Reads still work; only persistence is disabled.
        assert_eq!(store.get(b"k"), Some(b"v".to_vec()));
    }

    #[test]
    fn test_get_with_proof_defaults_to_no_proof() {
        let mut store = MemStore::new();
        store.set(b"k", b"v".to_vec());
        let (value, proof) = store.get_with_proof(b"k");
        assert_eq!(value, Some(b"v".to_vec()));
        assert!(proof.is_none());
    }
}
