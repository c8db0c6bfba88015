//! Append-only, deduplicated host key table
//!
//! Pieces store a table index instead of the full key. An index, once
//! handed out, always refers to the same host: entries are never removed
//! or reordered.

use super::HostPublicKey;

#[derive(Debug, Clone, Default)]
pub struct HostKeyTable {
    keys: Vec<HostPublicKey>,
}

impl HostKeyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `key`, if the table knows it
    pub fn position(&self, key: &HostPublicKey) -> Option<u32> {
        self.keys.iter().position(|k| k == key).map(compact_index)
    }

    /// Index of `key`, appending it if it is new.
    ///
    /// # Panics
    ///
    /// Panics if the table already holds `u32::MAX + 1` hosts.
    pub fn intern(&mut self, key: &HostPublicKey) -> u32 {
        if let Some(index) = self.position(key) {
            return index;
        }
        let index = compact_index(self.keys.len());
        self.keys.push(key.clone());
        tracing::debug!(host = %key.short(), index, "added host to key table");
        index
    }

    pub fn get(&self, index: u32) -> Option<&HostPublicKey> {
        self.keys.get(index as usize)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Entries in index order
    pub fn iter(&self) -> impl Iterator<Item = &HostPublicKey> {
        self.keys.iter()
    }

    pub fn to_vec(&self) -> Vec<HostPublicKey> {
        self.keys.clone()
    }
}

fn compact_index(index: usize) -> u32 {
    match u32::try_from(index) {
        Ok(index) => index,
        Err(_) => panic!("host key table index {} does not fit in u32", index),
    }
}
