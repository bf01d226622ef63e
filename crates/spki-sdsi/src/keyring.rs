//! In-memory key ring.
//!
//! Maps every registered hash of a public key back to the key, so that
//! signatures naming their principal by hash can be resolved. Thread-safe
//! via RwLock.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use spki_core::{digest, Hash, KeyLookup, PublicKey};

use crate::error::Result;

pub struct KeyRing {
    inner: RwLock<Inner>,
}

/// Each distinct key is stored once; `index` maps every hash to its slot.
#[derive(Default)]
struct Inner {
    keys: Vec<PublicKey>,
    index: HashMap<Hash, usize>,
}

impl KeyRing {
    /// Create an empty key ring.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Add a key under its hash for every registered digest algorithm.
    ///
    /// The stored key carries those hashes in its cache. Registering a key
    /// that is already held refreshes its slot. Returns the number of
    /// hashes it is reachable by.
    pub fn register(&self, key: &PublicKey) -> Result<usize> {
        let registry = digest::registry()?;
        let cached = PublicKey::new(key.curve, key.x.clone(), key.y.clone());
        let hashes = registry
            .names()
            .map(|algorithm| cached.hash_expr(algorithm))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let slot = match hashes.iter().find_map(|hash| inner.index.get(hash).copied()) {
            Some(slot) => {
                inner.keys[slot] = cached;
                slot
            }
            None => {
                inner.keys.push(cached);
                inner.keys.len() - 1
            }
        };
        for hash in &hashes {
            inner.index.insert(hash.clone(), slot);
        }
        tracing::debug!(curve = %key.curve, hashes = hashes.len(), slot, "registered key");
        Ok(hashes.len())
    }

    pub fn get(&self, hash: &Hash) -> Option<PublicKey> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .index
            .get(hash)
            .and_then(|&slot| inner.keys.get(slot))
            .cloned()
    }

    pub fn contains(&self, key: &PublicKey) -> bool {
        key.natural_hash()
            .map(|hash| self.get(&hash).is_some())
            .unwrap_or(false)
    }

    /// Number of distinct keys held.
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for KeyRing {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyLookup for KeyRing {
    fn lookup(&self, hash: &Hash) -> Option<PublicKey> {
        let found = self.get(hash);
        if found.is_none() {
            tracing::trace!(algorithm = %hash.algorithm, digest = %hash.to_hex(), "hash not in key ring");
        }
        found
    }
}
