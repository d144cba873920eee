//! Key/value store traits

use crate::StoreResult;
use ledger_core::Hash;

/// Minimal key/value contract the ledger runs against.
///
/// Object-safe on purpose: plugins and generic layers receive
/// `&mut dyn KVStore` without caring what backs it.
pub trait KVStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    fn set(&mut self, key: &[u8], value: Vec<u8>);
}

impl<T: KVStore + ?Sized> KVStore for &mut T {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>) {
        (**self).set(key, value)
    }
}

/// Identifier of a committed store version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitId {
    pub version: u64,
    pub hash: Hash,
}

/// Capability trait for stores that can persist accumulated writes.
///
/// Backing engines opt in by implementing this; scratch layers and
/// read-only doubles simply do not, so commit never reaches them. A
/// store may still implement the trait and refuse at runtime with
/// [`crate::StoreError::CommitUnsupported`] when persistence was
/// explicitly disabled in its configuration.
pub trait CommitKVStore: KVStore {
    /// Persist accumulated writes; the store is the source of truth
    /// for every key afterwards.
    fn commit(&mut self) -> StoreResult<CommitId>;

    /// Value for `key`, with a proof when the engine produces one.
    fn get_with_proof(&self, key: &[u8]) -> (Option<Vec<u8>>, Option<Vec<u8>>) {
        (self.get(key), None)
    }
}
