//! Buffered write layers

use crate::KVStore;
use std::collections::HashMap;

/// An ordered buffer of writes over some parent key space.
///
/// Reads resolve to the most recent buffered value; [`WriteCache::write_into`]
/// replays the log in the order the writes were made. Dropping the
/// buffer without replaying discards every write. Creating one is O(1)
/// and never copies backing data.
#[derive(Debug, Default, Clone)]
pub struct WriteCache {
    log: Vec<(Vec<u8>, Vec<u8>)>,
    latest: HashMap<Vec<u8>, usize>,
}

impl WriteCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.latest.get(key).map(|&i| self.log[i].1.as_slice())
    }

    pub fn set(&mut self, key: &[u8], value: Vec<u8>) {
        self.latest.insert(key.to_vec(), self.log.len());
        self.log.push((key.to_vec(), value));
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn clear(&mut self) {
        self.log.clear();
        self.latest.clear();
    }

    /// Replay every buffered write into `parent`, in write order.
    pub fn write_into(&self, parent: &mut dyn KVStore) {
        for (key, value) in &self.log {
            parent.set(key, value.clone());
        }
    }
}

/// A scratch layer: buffered writes over a mutably borrowed parent.
///
/// Implements [`KVStore`] with read-through to the parent and writes
/// into the buffer, invisible to anything else until [`Scratch::flush`]
/// replays them into the parent. Dropping without flushing aborts the
/// layer.
pub struct Scratch<'a> {
    parent: &'a mut dyn KVStore,
    cache: WriteCache,
}

impl<'a> Scratch<'a> {
    pub fn new(parent: &'a mut dyn KVStore) -> Self {
        Self {
            parent,
            cache: WriteCache::new(),
        }
    }

    /// Apply the buffered writes to the parent, in order.
    pub fn flush(self) {
        self.cache.write_into(self.parent);
    }
}

impl KVStore for Scratch<'_> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.cache.get(key) {
            Some(value) => Some(value.to_vec()),
            None => self.parent.get(key),
        }
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>) {
        self.cache.set(key, value);
    }
}

/// A view pairing a long-lived write buffer with a read-only parent.
///
/// Unlike [`Scratch`], the buffer outlives the view, so speculative
/// writes accumulate across many short borrows of the parent. Used for
/// the check snapshot, whose writes survive between calls until the
/// buffer is swapped out at commit.
pub struct Overlay<'a> {
    parent: &'a dyn KVStore,
    cache: &'a mut WriteCache,
}

impl<'a> Overlay<'a> {
    pub fn new(parent: &'a dyn KVStore, cache: &'a mut WriteCache) -> Self {
        Self { parent, cache }
    }
}

impl KVStore for Overlay<'_> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.cache.get(key) {
            Some(value) => Some(value.to_vec()),
            None => self.parent.get(key),
        }
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>) {
        self.cache.set(key, value);
    }
}
