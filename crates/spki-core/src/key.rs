//! The key capability model.
//!
//! A [`Key`] is one of three mutually exclusive variants:
//!
//! - [`HashKey`] knows only digests of some key
//! - [`PublicKey`] holds an ECDSA public point
//! - [`PrivateKey`] additionally owns the secret scalar
//!
//! Every variant answers the same questions (hashes, algorithms, equality,
//! subject expression); [`Key`] dispatches to whichever it holds.

use spki_sexp::Sexp;
use std::sync::{PoisonError, RwLock};

use crate::error::{Result, SpkiError};
use crate::hash::Hash;
use crate::private_key::PrivateKey;
use crate::public_key::PublicKey;

#[derive(Debug, Clone)]
pub enum Key {
    Hash(HashKey),
    Public(PublicKey),
    Private(PrivateKey),
}

impl Key {
    /// Decode a `hash`, `public-key` or `private-key` expression.
    pub fn decode(sexp: &Sexp) -> Result<Self> {
        match sexp.head() {
            Some(b"hash") => Hash::decode(sexp).map(|hash| Key::Hash(HashKey::new(vec![hash]))),
            Some(b"public-key") => PublicKey::decode(sexp).map(Key::Public),
            Some(b"private-key") => PrivateKey::decode(sexp).map(Key::Private),
            _ => Err(SpkiError::MalformedKeyExpression(format!(
                "expected hash, public-key or private-key, got {}",
                sexp
            ))),
        }
    }

    /// A hash key encodes as its first hash.
    pub fn encode(&self) -> Result<Sexp> {
        match self {
            Key::Hash(key) => key.first().map(Hash::encode),
            Key::Public(key) => Ok(key.encode()),
            Key::Private(key) => Ok(key.encode()),
        }
    }

    pub fn is_hash(&self) -> bool {
        matches!(self, Key::Hash(_))
    }

    /// The public half, if this key has one.
    pub fn public_key(&self) -> Option<PublicKey> {
        match self {
            Key::Hash(_) => None,
            Key::Public(key) => Some(key.clone()),
            Key::Private(key) => Some(key.public_key()),
        }
    }

    pub fn hashed(&self, algorithm: &str) -> Result<Vec<u8>> {
        self.hash_expr(algorithm).map(|hash| hash.digest)
    }

    pub fn hash_expr(&self, algorithm: &str) -> Result<Hash> {
        match self {
            Key::Hash(key) => key.hash_expr(algorithm),
            Key::Public(key) => key.hash_expr(algorithm),
            Key::Private(key) => key.hash_expr(algorithm),
        }
    }

    /// Empty when unknown.
    pub fn signature_algorithm(&self) -> &'static str {
        match self {
            Key::Hash(_) => "",
            Key::Public(key) => key.signature_algorithm(),
            Key::Private(key) => key.signature_algorithm(),
        }
    }

    /// Empty when unknown.
    pub fn hash_algorithm(&self) -> &'static str {
        match self {
            Key::Hash(_) => "",
            Key::Public(key) => key.hash_algorithm(),
            Key::Private(key) => key.hash_algorithm(),
        }
    }

    pub fn equal(&self, other: &Key) -> bool {
        match self {
            Key::Hash(key) => key.equal(other),
            Key::Public(key) => key.equal(other),
            Key::Private(key) => key.equal(other),
        }
    }

    pub fn subject(&self) -> Result<Sexp> {
        match self {
            Key::Hash(key) => key.subject(),
            Key::Public(key) => key.subject(),
            Key::Private(key) => key.subject(),
        }
    }
}

impl From<HashKey> for Key {
    fn from(key: HashKey) -> Self {
        Key::Hash(key)
    }
}

impl From<Hash> for Key {
    fn from(hash: Hash) -> Self {
        Key::Hash(HashKey::new(vec![hash]))
    }
}

impl From<PublicKey> for Key {
    fn from(key: PublicKey) -> Self {
        Key::Public(key)
    }
}

impl From<PrivateKey> for Key {
    fn from(key: PrivateKey) -> Self {
        Key::Private(key)
    }
}

/// A key known only by its digests, at most one per algorithm.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashKey {
    pub hashes: Vec<Hash>,
}

impl HashKey {
    pub fn new(hashes: Vec<Hash>) -> Self {
        let mut key = Self::default();
        for hash in hashes {
            key.insert(hash);
        }
        key
    }

    /// Add a hash unless one under the same algorithm is already held.
    pub fn insert(&mut self, hash: Hash) {
        if !self.hashes.iter().any(|h| h.algorithm == hash.algorithm) {
            self.hashes.push(hash);
        }
    }

    pub fn hashed(&self, algorithm: &str) -> Result<Vec<u8>> {
        self.hash_expr(algorithm).map(|hash| hash.digest)
    }

    pub fn hash_expr(&self, algorithm: &str) -> Result<Hash> {
        self.hashes
            .iter()
            .find(|hash| hash.algorithm == algorithm)
            .cloned()
            .ok_or_else(|| SpkiError::NoHashForAlgorithm(algorithm.to_string()))
    }

    /// True if `other` hashes to any one of the stored digests.
    ///
    /// Agreement under a single algorithm suffices; the other stored
    /// hashes are not consulted once one matches.
    pub fn equal(&self, other: &Key) -> bool {
        self.hashes.iter().any(|hash| {
            other
                .hash_expr(&hash.algorithm)
                .map_or(false, |theirs| theirs == *hash)
        })
    }

    /// The first stored hash.
    pub fn subject(&self) -> Result<Sexp> {
        self.first().map(Hash::encode)
    }

    fn first(&self) -> Result<&Hash> {
        self.hashes
            .first()
            .ok_or_else(|| SpkiError::NoHashForAlgorithm("any".to_string()))
    }
}

/// Memoized hashes of a key's canonical bytes, fillable through `&self`.
#[derive(Debug, Default)]
pub(crate) struct HashCache(RwLock<HashKey>);

impl HashCache {
    pub(crate) fn get(&self, algorithm: &str) -> Option<Hash> {
        let hashes = self.0.read().unwrap_or_else(PoisonError::into_inner);
        hashes.hash_expr(algorithm).ok()
    }

    /// Keeps the first hash seen per algorithm.
    pub(crate) fn insert(&self, hash: Hash) {
        self.0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(hash);
    }

    pub(crate) fn snapshot(&self) -> Vec<Hash> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .hashes
            .clone()
    }

    /// Return the cached hash or compute, store and return it.
    pub(crate) fn get_or_compute<F>(&self, algorithm: &str, compute: F) -> Result<Hash>
    where
        F: FnOnce() -> Result<Hash>,
    {
        if let Some(hash) = self.get(algorithm) {
            return Ok(hash);
        }
        let hash = compute()?;
        self.insert(hash.clone());
        Ok(hash)
    }
}

impl Clone for HashCache {
    fn clone(&self) -> Self {
        let hashes = self.0.read().unwrap_or_else(PoisonError::into_inner);
        Self(RwLock::new(hashes.clone()))
    }
}
