//! The shared partial-signature pool.
//!
//! A keyed multimap from message hash to the `(pubkey, signature)` pairs
//! gossiped for it. Insertions are idempotent; writers serialize behind
//! the lock while readers run concurrently. The core keeps everything —
//! eviction, if any, is the embedding service's concern.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct PoolEntry {
    pubkey: Vec<u8>,
    signature: Vec<u8>,
}

#[derive(Default)]
pub struct SignaturePool {
    signatures: RwLock<HashMap<Vec<u8>, HashSet<PoolEntry>>>,
}

impl SignaturePool {
    pub fn new() -> Self {
        SignaturePool {
            signatures: RwLock::new(HashMap::new()),
        }
    }

    /// Stores the pair under the message hash. Storing the same pair twice
    /// is a no-op.
    pub fn add_signature(&self, message_hash: &[u8], pubkey: Vec<u8>, signature: Vec<u8>) {
        let mut pool = self
            .signatures
            .write()
            .expect("signature pool lock poisoned");
        pool.entry(message_hash.to_vec())
            .or_insert_with(HashSet::new)
            .insert(PoolEntry { pubkey, signature });
    }

    /// The pairs collected for the message hash, as parallel lists. No
    /// ordering is promised.
    pub fn signatures(&self, message_hash: &[u8]) -> (Vec<Vec<u8>>, Vec<Vec<u8>>) {
        let pool = self
            .signatures
            .read()
            .expect("signature pool lock poisoned");
        match pool.get(message_hash) {
            Some(entries) => entries
                .iter()
                .map(|entry| (entry.pubkey.clone(), entry.signature.clone()))
                .unzip(),
            None => (vec![], vec![]),
        }
    }
}
